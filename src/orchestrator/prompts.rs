//! Fixed prompts of the guided conversations and the stateless Q&A flow.

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Prompts driving one kind of guided conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptProfile {
    /// Also the sub-directory holding this profile's sessions
    pub name: String,
    /// Prompt for the first completion of a turn
    pub system_prompt: String,
    /// Prompt for the completion that follows a retrieval
    pub verdict_prompt: String,
    /// First line of the message written by an intake
    pub intake_preamble: String,
}

const RETRIEVAL_RULES: &str = "\
You have a retrieval tool over the reference library. Passages it returned earlier appear in \
messages from the 'tool' role.
- If the question can be answered from what you know or from earlier tool messages, answer directly.
- If you are unsure or need specifics, do not guess. Reply with a single line:
RETRIEVE: <a clear, self-contained search query>
Do not include <think></think> tags in your output.";

impl PromptProfile {
    pub fn relationships() -> Self {
        Self {
            name: "relationships".to_string(),
            system_prompt: format!(
                "You are a thoughtful relationship advisor grounded in the Enneagram. You help people \
understand the dynamics between their type and another person's type in romantic, family, \
friendship and work relationships. Treat the reference library as your source of truth and never \
invent insights about a type pairing.\n\n{}",
                RETRIEVAL_RULES
            ),
            verdict_prompt: "You are a thoughtful relationship advisor grounded in the Enneagram. \
Passages from the reference library are given under the 'tool' role. Use them faithfully, tailor \
the advice to the two types and the relationship described, and make clear which insights come \
from the library and which are your own synthesis. Be warm, specific and practical."
                .to_string(),
            intake_preamble: "Here are the details the user gave about their Enneagram types and \
relationship:"
                .to_string(),
        }
    }

    pub fn personality() -> Self {
        Self {
            name: "personality".to_string(),
            system_prompt: format!(
                "You are guiding a person toward discovering their Enneagram type. Ask one \
reflective question at a time about motivations, fears and habitual reactions, and build on \
their previous answers. When you have enough to decide, look up the type descriptions before \
giving a verdict.\n\n{}",
                RETRIEVAL_RULES
            ),
            verdict_prompt: "You are concluding an Enneagram discovery conversation. Using the \
passages under the 'tool' role and the person's answers, name the most likely type and wing, \
explain the evidence from their answers, and suggest one area of growth."
                .to_string(),
            intake_preamble: "Here is some background the user shared about themselves:"
                .to_string(),
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::relationships(), Self::personality()]
    }

    pub fn by_name(name: &str) -> Result<Self> {
        Self::builtin()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AppError::NotFound(format!("prompt profile '{}'", name)))
    }
}

/// System prompt of the stateless Q&A flow, with the retrieved context embedded.
pub fn direct_answer_prompt(context: &str) -> String {
    format!(
        "You are a helpful assistant answering questions about the Enneagram using the reference \
library. Explain types and the dynamics between them clearly, and favour the retrieved context \
over general knowledge when they differ.\nHere is the retrieved context: Context : {}",
        context
    )
}

pub fn question_message(query: &str) -> String {
    format!("Question: {}\nAnswer:", query)
}
