//! Ordered retry across completion services.

use crate::llm::client::CompletionService;
use crate::types::{AppError, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Completion services tried in order, each at most once per request.
#[derive(Clone)]
pub struct FallbackChain {
    services: Vec<Arc<dyn CompletionService>>,
}

impl FallbackChain {
    pub fn new(primary: Arc<dyn CompletionService>, fallback: Arc<dyn CompletionService>) -> Self {
        Self {
            services: vec![primary, fallback],
        }
    }

    pub fn from_services(services: Vec<Arc<dyn CompletionService>>) -> Self {
        Self { services }
    }

    /// Run `attempt` against each service until one succeeds.
    ///
    /// Every error moves on to the next service. The last service's error
    /// is returned when all of them fail.
    pub async fn try_in_order<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut(Arc<dyn CompletionService>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for (i, service) in self.services.iter().enumerate() {
            let provider = service.provider_name();
            match attempt(Arc::clone(service)).await {
                Ok(value) => {
                    if i > 0 {
                        info!(provider, "Fallback service answered");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!(provider, error = %e, "Completion attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::UpstreamUnavailable("no completion service configured".to_string())
        }))
    }
}
