//! Completion service clients
//!
//! # Architecture
//!
//! - [`CompletionService`] - The trait every provider implements
//! - [`Provider`] - Runtime provider selection built from [`Config`](crate::utils::config::Config)
//! - [`FallbackChain`] - Tries the primary service, then the fallback
//!
//! # Example
//!
//! ```ignore
//! use docent::llm::{FallbackChain, Provider};
//!
//! let primary = Provider::primary(&config)?.create_client(http.clone());
//! let fallback = Provider::fallback(&config)?.create_client(http);
//! let chain = FallbackChain::new(primary, fallback);
//! let answer = chain
//!     .try_in_order(|service| async move { service.complete(system, &history).await })
//!     .await?;
//! ```

pub mod client;
pub mod fallback;
pub mod gemini;
pub mod openrouter;

pub use client::{CompletionService, Provider};
pub use fallback::FallbackChain;
