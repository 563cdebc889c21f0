//! Scripted model client for testing

use super::ModelClient;
use crate::errors::ProviderError;
use crate::schema::OutputSchema;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the mock does when a rule matches
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this raw body
    Respond(String),
    /// Fail with a provider error
    Fail(String),
    /// Never complete (exercises timeouts and cancellation)
    Hang,
}

/// Mock client answering by prompt content.
///
/// Rules are checked in insertion order; the first rule whose needle occurs
/// in the prompt wins. Matching on content rather than call order keeps
/// results stable when chunks are extracted concurrently.
#[derive(Debug, Default)]
pub struct MockModelClient {
    rules: Vec<(String, MockReply)>,
    fallback: Option<MockReply>,
    calls: AtomicUsize,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_when(self, needle: impl Into<String>, body: impl Into<String>) -> Self {
        self.reply_when(needle, MockReply::Respond(body.into()))
    }

    pub fn fail_when(self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        self.reply_when(needle, MockReply::Fail(message.into()))
    }

    pub fn reply_when(mut self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// Reply used when no rule matches (default: `ProviderError::Unscripted`)
    pub fn otherwise(mut self, reply: MockReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Number of completions requested so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(&self, prompt: &str, _schema: &OutputSchema) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .or(self.fallback.as_ref());

        match reply {
            Some(MockReply::Respond(body)) => Ok(body.clone()),
            Some(MockReply::Fail(message)) => Err(ProviderError::Other {
                message: message.clone(),
            }),
            Some(MockReply::Hang) => std::future::pending().await,
            None => Err(ProviderError::Unscripted),
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
