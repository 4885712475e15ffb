use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored full text of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub content: String,
}

/// Document id to full content; serialized as `{ "<id>": { "content": ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentStore {
    entries: BTreeMap<String, DocumentEntry>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, doc_id: &str) -> Option<&DocumentEntry> {
        self.entries.get(doc_id)
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.entries.contains_key(doc_id)
    }

    /// Insert or overwrite, returning the previous entry.
    pub fn insert(&mut self, doc_id: impl Into<String>, content: impl Into<String>) -> Option<DocumentEntry> {
        self.entries.insert(
            doc_id.into(),
            DocumentEntry {
                content: content.into(),
            },
        )
    }

    pub fn remove(&mut self, doc_id: &str) -> Option<DocumentEntry> {
        self.entries.remove(doc_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
