//! Conversation memory: persisted per-session message histories.

pub mod session_store;

pub use session_store::{ConversationSession, SessionStore};
