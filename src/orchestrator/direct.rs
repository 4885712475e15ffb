use super::prompts::{direct_answer_prompt, question_message};
use super::{join_unique_content, unique_sources};
use crate::llm::FallbackChain;
use crate::rag::RetrievalStore;
use crate::types::{AnswerWithSources, AppError, Message, Result};
use std::sync::Arc;
use tracing::{info, instrument};

/// Stateless question answering: one retrieval, one completion.
pub struct DirectAnswerer {
    store: Arc<RetrievalStore>,
    chain: FallbackChain,
    top_k: usize,
}

impl DirectAnswerer {
    pub fn new(store: Arc<RetrievalStore>, chain: FallbackChain, top_k: usize) -> Self {
        Self {
            store,
            chain,
            top_k,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<AnswerWithSources> {
        self.answer_with_k(query, self.top_k).await
    }

    #[instrument(skip(self))]
    pub async fn answer_with_k(&self, query: &str, k: usize) -> Result<AnswerWithSources> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::BadRequest("query must not be empty".to_string()));
        }

        let passages = self.store.search(query, k).await?;
        let system_prompt = direct_answer_prompt(&join_unique_content(&passages));
        let history = [Message::user(question_message(query))];

        let (system_prompt, history) = (system_prompt.as_str(), &history[..]);
        let answer = self
            .chain
            .try_in_order(move |service| async move {
                service.complete(system_prompt, history).await
            })
            .await?;

        let sources = unique_sources(&passages);
        info!(sources = sources.len(), "Answered query");
        Ok(AnswerWithSources { answer, sources })
    }
}
