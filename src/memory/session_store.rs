//! Persisted conversation sessions.
//!
//! One JSON array of `{role, content}` per session at
//! `<root>/<namespace>/<session id>.json`. Opening a session takes that
//! session's lock for as long as the [`ConversationSession`] lives, so turns
//! on the same session never interleave while different sessions proceed
//! independently.

use crate::types::{AppError, Message, Result};
use crate::utils::fs::{read_json_opt, write_json_atomic};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

const MAX_SESSION_ID_LEN: usize = 128;

pub struct SessionStore {
    root: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a session, creating it empty if it has never been seen.
    ///
    /// Waits while another holder has the same session open.
    pub async fn open(&self, namespace: &str, session_id: &str) -> Result<ConversationSession> {
        validate_segment("session id", session_id)?;
        validate_segment("namespace", namespace)?;

        let path = self.root.join(namespace).join(format!("{}.json", session_id));
        let lock = {
            let mut locks = self.locks.lock();
            // Entries referenced only by the map belong to no open or waiting session
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(path.clone()).or_default())
        };
        let guard = lock.lock_owned().await;

        let messages: Vec<Message> = read_json_opt(&path).await?.unwrap_or_default();
        debug!(session_id, messages = messages.len(), "Opened session");

        Ok(ConversationSession {
            id: session_id.to_string(),
            path,
            messages,
            _guard: guard,
        })
    }
}

/// Ids become file names: only ASCII alphanumerics, `-`, `_` and `.`
/// (not leading) are allowed.
fn validate_segment(what: &str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value.len() <= MAX_SESSION_ID_LEN
        && !value.starts_with('.')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("invalid {} '{}'", what, value)))
    }
}

/// An open session holding its lock. Changes are in memory until
/// [`ConversationSession::save`].
pub struct ConversationSession {
    id: String,
    path: PathBuf,
    messages: Vec<Message>,
    _guard: OwnedMutexGuard<()>,
}

impl ConversationSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// Write the full history, replacing the previous file.
    pub async fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.messages).await?;
        debug!(session_id = %self.id, messages = self.messages.len(), "Saved session");
        Ok(())
    }
}
