//! Retrieval-augmented answering.
//!
//! - [`DirectAnswerer`]: stateless Q&A, retrieve then answer once
//! - [`SessionOrchestrator`]: persisted conversations where the model asks for
//!   retrievals with a `RETRIEVE` directive (see [`CompletionOutcome`])
//!
//! Both flows run every completion through a [`FallbackChain`](crate::llm::FallbackChain).

pub mod direct;
pub mod outcome;
pub mod prompts;
pub mod session;

pub use direct::DirectAnswerer;
pub use outcome::CompletionOutcome;
pub use prompts::PromptProfile;
pub use session::{IntakeDetails, SessionOrchestrator, TurnResult};

use crate::types::RetrievedPassage;
use std::collections::HashSet;

/// Join passage contents with newlines, skipping repeated contents.
pub(crate) fn join_unique_content(passages: &[RetrievedPassage]) -> String {
    let mut seen = HashSet::new();
    passages
        .iter()
        .filter(|p| seen.insert(p.content.as_str()))
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Document ids in order of first appearance.
pub(crate) fn unique_sources(passages: &[RetrievedPassage]) -> Vec<String> {
    let mut seen = HashSet::new();
    passages
        .iter()
        .filter(|p| seen.insert(p.doc_id.as_str()))
        .map(|p| p.doc_id.clone())
        .collect()
}
