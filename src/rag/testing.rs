//! Deterministic collaborators for tests.

use crate::embedding::Embedder;
use crate::error::{CineragError, Result};
use crate::llm::{ChatTurn, LanguageModel};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Embedder returning canned vectors per exact question text.
pub struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Option<Vec<f32>>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    /// Every question embeds to `vector`.
    pub fn constant(vector: Vec<f32>) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback: Some(vector),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with a retrieval fault.
    pub fn failing(message: &str) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback: None,
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Map a specific question to a vector.
    pub fn with(mut self, question: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(question.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(CineragError::Retrieval(message.clone()));
        }
        self.vectors
            .get(text)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| CineragError::Retrieval(format!("no vector for {:?}", text)))
    }

    fn model(&self) -> &str {
        "fake-embedder"
    }
}

/// Language model with a fixed reply that records what it was sent.
pub struct FakeLanguageModel {
    reply: std::result::Result<String, String>,
    calls: AtomicUsize,
    last_turns: Mutex<Vec<ChatTurn>>,
}

impl FakeLanguageModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            last_turns: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_turns: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_turns(&self) -> Vec<ChatTurn> {
        self.last_turns.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeLanguageModel {
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_turns.lock().unwrap() = turns.to_vec();
        self.reply
            .clone()
            .map_err(CineragError::Generation)
    }

    fn model(&self) -> &str {
        "fake-llm"
    }
}
