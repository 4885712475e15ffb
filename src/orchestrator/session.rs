use super::outcome::CompletionOutcome;
use super::prompts::PromptProfile;
use super::{join_unique_content, unique_sources};
use crate::llm::{CompletionService, FallbackChain};
use crate::memory::SessionStore;
use crate::rag::RetrievalStore;
use crate::types::{AppError, Message, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of one conversational turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    pub answer: String,
    /// Document ids retrieved during the turn, first appearance order
    pub sources: Vec<String>,
    /// Provider that produced the answer
    pub provider: &'static str,
    /// False when the history could not be written to disk
    pub persisted: bool,
}

/// Everything produced by one attempt of a turn.
struct Attempt {
    answer: String,
    messages: Vec<Message>,
    sources: Vec<String>,
    provider: &'static str,
}

/// Ordered `(label, value)` pairs describing the user, recorded at intake.
#[derive(Debug, Clone, Default)]
pub struct IntakeDetails {
    pub fields: Vec<(String, String)>,
}

impl IntakeDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((label.into(), value.into()));
        self
    }

    fn render(&self, preamble: &str) -> String {
        let mut out = preamble.to_string();
        for (label, value) in &self.fields {
            let value = value.trim();
            out.push_str(&format!(
                "\n- {}: {}",
                label,
                if value.is_empty() { "None" } else { value }
            ));
        }
        out
    }
}

/// Multi-turn conversations where the model may request retrievals.
pub struct SessionOrchestrator {
    store: Arc<RetrievalStore>,
    sessions: Arc<SessionStore>,
    chain: FallbackChain,
    top_k: usize,
}

impl SessionOrchestrator {
    pub fn new(
        store: Arc<RetrievalStore>,
        sessions: Arc<SessionStore>,
        chain: FallbackChain,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            sessions,
            chain,
            top_k,
        }
    }

    /// Run one user turn.
    ///
    /// The primary service gets the whole turn; on any error the turn restarts
    /// against the fallback from the same history. The session file is written
    /// once, after an attempt succeeds, so a failed turn leaves it untouched.
    #[instrument(skip(self, profile, user_message), fields(profile = %profile.name))]
    pub async fn converse(
        &self,
        profile: &PromptProfile,
        session_id: &str,
        user_message: &str,
    ) -> Result<TurnResult> {
        let user_message = user_message.trim();
        if user_message.is_empty() {
            return Err(AppError::BadRequest("message must not be empty".to_string()));
        }

        let mut session = self.sessions.open(&profile.name, session_id).await?;
        let mut history = session.messages().to_vec();
        history.push(Message::user(user_message));

        let base = history.as_slice();
        let attempt = self
            .chain
            .try_in_order(move |service| self.attempt(service, profile, base))
            .await?;

        session.push(Message::user(user_message));
        session.extend(attempt.messages);
        let persisted = match session.save().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Turn answered but session history was not saved");
                false
            }
        };

        info!(provider = attempt.provider, sources = attempt.sources.len(), "Turn complete");
        Ok(TurnResult {
            answer: attempt.answer,
            sources: attempt.sources,
            provider: attempt.provider,
            persisted,
        })
    }

    async fn attempt(
        &self,
        service: Arc<dyn CompletionService>,
        profile: &PromptProfile,
        history: &[Message],
    ) -> Result<Attempt> {
        let first = service.complete(&profile.system_prompt, history).await?;
        let mut produced = vec![Message::assistant(first.clone())];

        let query = match CompletionOutcome::parse(&first) {
            CompletionOutcome::FinalAnswer(answer) => {
                return Ok(Attempt {
                    answer,
                    messages: produced,
                    sources: Vec::new(),
                    provider: service.provider_name(),
                });
            }
            CompletionOutcome::ToolRequest(query) => query,
        };

        let passages = if query.is_empty() {
            debug!("Retrieval directive without a query");
            Vec::new()
        } else {
            self.store.search(&query, self.top_k).await?
        };
        debug!(query = %query, results = passages.len(), "Retrieved context for turn");
        produced.push(Message::tool(join_unique_content(&passages)));

        let verdict_history: Vec<Message> = history.iter().chain(&produced).cloned().collect();
        let verdict = service
            .complete(&profile.verdict_prompt, &verdict_history)
            .await?;
        produced.push(Message::assistant(verdict.clone()));

        Ok(Attempt {
            answer: verdict,
            messages: produced,
            sources: unique_sources(&passages),
            provider: service.provider_name(),
        })
    }

    /// Record profile details as a user message, without a model call.
    #[instrument(skip(self, profile, details), fields(profile = %profile.name))]
    pub async fn record_intake(
        &self,
        profile: &PromptProfile,
        session_id: &str,
        details: &IntakeDetails,
    ) -> Result<()> {
        if details.fields.is_empty() {
            return Err(AppError::BadRequest("intake details must not be empty".to_string()));
        }

        let mut session = self.sessions.open(&profile.name, session_id).await?;
        session.push(Message::user(details.render(&profile.intake_preamble)));
        session.save().await?;
        info!("Recorded intake details");
        Ok(())
    }
}
