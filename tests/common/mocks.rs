//! Mock implementations for testing.
//!
//! In-process stand-ins for the embedding service, the completion services
//! and the repository host, shared by the integration test files.

use async_trait::async_trait;
use docent::ingest::github::{ChangeSet, RepositoryHost, RepositoryRef};
use docent::llm::CompletionService;
use docent::rag::EmbeddingService;
use docent::types::{AppError, Message, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Deterministic bag-of-words embedder.
///
/// Each lowercase word adds 1.0 to a bucket chosen by hashing the word and
/// the result is scaled to unit length, so identical texts embed identically
/// and texts sharing words land close.
pub struct HashEmbedder {
    dimensions: usize,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every following call fail with `EmbeddingUnavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            let bucket = word
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
                    (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
                })
                % self.dimensions as u64;
            vector[bucket as usize] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::EmbeddingUnavailable("mock embedder is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingService for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.check()?;
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.check()?;
        Ok(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub history: Vec<Message>,
}

/// Completion service that replays a script of responses.
///
/// Once the script is exhausted every call fails with `UpstreamUnavailable`.
pub struct ScriptedCompletion {
    name: &'static str,
    script: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    pub fn new(name: &'static str, responses: Vec<Result<String>>) -> Self {
        Self {
            name,
            script: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A service answering with `responses` in order.
    pub fn replies(name: &'static str, responses: &[&str]) -> Self {
        Self::new(name, responses.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// A service whose every call fails.
    pub fn failing(name: &'static str) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, system_prompt: &str, history: &[Message]) -> Result<String> {
        self.calls.lock().push(RecordedCall {
            system_prompt: system_prompt.to_string(),
            history: history.to_vec(),
        });
        self.script.lock().pop_front().unwrap_or_else(|| {
            Err(AppError::UpstreamUnavailable(format!(
                "{} has no scripted response",
                self.name
            )))
        })
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct HostState {
    head: Option<String>,
    snapshots: HashMap<String, BTreeMap<String, Vec<u8>>>,
    failing_paths: HashSet<String>,
    fetched: Vec<(String, String)>,
}

/// Repository host backed by in-memory commit snapshots.
///
/// Diffs are computed by comparing two snapshots.
#[derive(Default)]
pub struct InMemoryRepositoryHost {
    state: Mutex<HostState>,
    fail_head: AtomicBool,
    fail_diff: AtomicBool,
    fail_tree: AtomicBool,
}

impl InMemoryRepositoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit with the given files and make it the branch head.
    pub fn commit(&self, sha: &str, files: &[(&str, &str)]) {
        let snapshot = files
            .iter()
            .map(|(path, content)| (path.to_string(), content.as_bytes().to_vec()))
            .collect();
        let mut state = self.state.lock();
        state.snapshots.insert(sha.to_string(), snapshot);
        state.head = Some(sha.to_string());
    }

    pub fn fail_path(&self, path: &str) {
        self.state.lock().failing_paths.insert(path.to_string());
    }

    pub fn set_fail_head(&self, failing: bool) {
        self.fail_head.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_diff(&self, failing: bool) {
        self.fail_diff.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_tree(&self, failing: bool) {
        self.fail_tree.store(failing, Ordering::SeqCst);
    }

    /// `(reference, path)` of every content fetch so far.
    pub fn fetched(&self) -> Vec<(String, String)> {
        self.state.lock().fetched.clone()
    }

    fn snapshot(&self, reference: &str) -> Result<BTreeMap<String, Vec<u8>>> {
        self.state
            .lock()
            .snapshots
            .get(reference)
            .cloned()
            .ok_or_else(|| AppError::UpstreamUnavailable(format!("unknown commit {}", reference)))
    }
}

fn unavailable(what: &str) -> AppError {
    AppError::UpstreamUnavailable(format!("mock host: {} failed", what))
}

#[async_trait]
impl RepositoryHost for InMemoryRepositoryHost {
    async fn latest_commit(&self, _repo: &RepositoryRef, _branch: &str) -> Result<String> {
        if self.fail_head.load(Ordering::SeqCst) {
            return Err(unavailable("latest commit"));
        }
        self.state
            .lock()
            .head
            .clone()
            .ok_or_else(|| AppError::NotFound("branch has no commits".to_string()))
    }

    async fn diff(&self, _repo: &RepositoryRef, base: &str, head: &str) -> Result<ChangeSet> {
        if self.fail_diff.load(Ordering::SeqCst) {
            return Err(unavailable("diff"));
        }
        let (before, after) = (self.snapshot(base)?, self.snapshot(head)?);
        Ok(ChangeSet {
            changed: after
                .iter()
                .filter(|(path, content)| before.get(*path) != Some(*content))
                .map(|(path, _)| path.clone())
                .collect(),
            removed: before
                .keys()
                .filter(|path| !after.contains_key(*path))
                .cloned()
                .collect(),
        })
    }

    async fn fetch_file_content(
        &self,
        _repo: &RepositoryRef,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>> {
        {
            let mut state = self.state.lock();
            state.fetched.push((reference.to_string(), path.to_string()));
            if state.failing_paths.contains(path) {
                return Err(unavailable(path));
            }
        }
        self.snapshot(reference)?
            .remove(path)
            .ok_or_else(|| AppError::NotFound(path.to_string()))
    }

    async fn fetch_full_tree(&self, _repo: &RepositoryRef, reference: &str) -> Result<Vec<String>> {
        if self.fail_tree.load(Ordering::SeqCst) {
            return Err(unavailable("tree listing"));
        }
        Ok(self.snapshot(reference)?.into_keys().collect())
    }
}
