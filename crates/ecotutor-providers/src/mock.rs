//! Mock dialogue backend for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use ecotutor_core::error::DialogueError;
use ecotutor_core::traits::{clean_reply, DialogueModel, ReplyRequest, ReplyResponse};

/// A scripted dialogue model for running sessions without a model server.
///
/// Cycles through its replies in order; a mock with no replies fails every
/// call.
pub struct MockDialogue {
    replies: Vec<String>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<ReplyRequest>>,
}

impl MockDialogue {
    /// Create a mock that returns `replies` in turn, wrapping around.
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same reply.
    pub fn with_fixed_reply(reply: &str) -> Self {
        Self::new(vec![reply.to_string()])
    }

    /// Create a mock whose every call fails.
    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    /// Get the number of calls made to this backend.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this backend.
    pub fn last_request(&self) -> Option<ReplyRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl DialogueModel for MockDialogue {
    fn name(&self) -> &str {
        "mock"
    }

    async fn reply(&self, request: &ReplyRequest) -> anyhow::Result<ReplyResponse> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if self.replies.is_empty() {
            return Err(DialogueError::NetworkError("mock dialogue has no replies".into()).into());
        }

        let raw = &self.replies[call as usize % self.replies.len()];
        let text = clean_reply(raw, &request.end_of_turn);
        if text.is_empty() {
            return Err(DialogueError::EmptyReply.into());
        }

        Ok(ReplyResponse {
            generated_tokens: Some(text.split_whitespace().count() as u32),
            text,
            model: request.model.clone(),
            latency_ms: 1,
        })
    }
}
