pub mod config;
pub mod fs;

use std::sync::Arc;

/// Build the shared HTTP client used by every remote collaborator.
pub fn http_client(config: &config::Config) -> crate::types::Result<Arc<reqwest::Client>> {
    reqwest::Client::builder()
        .timeout(config.http.timeout())
        .user_agent(concat!("docent/", env!("CARGO_PKG_VERSION")))
        .build()
        .map(Arc::new)
        .map_err(|e| crate::types::AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}
