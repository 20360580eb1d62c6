//! In-process backend that replays queued replies.
//!
//! Used by the test suites of the crates above this one and by the CLI's
//! offline demo mode. Requests are recorded so callers can assert on the
//! prompt that would have been sent; a long-running server turns recording
//! off with [`ScriptedBackend::without_recording`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::CompletionBackend;
use crate::error::CompletionError;
use crate::types::ChatRequest;
use crate::Result;

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicUsize,
    skip_recording: bool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that answers every request with `text` once the queue is empty.
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Self::default()
        }
    }

    /// Stop keeping received requests. [`requests`](Self::requests) stays
    /// empty while [`call_count`](Self::call_count) keeps counting.
    pub fn without_recording(mut self) -> Self {
        self.skip_recording = true;
        self
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    pub fn fail(self, error: CompletionError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, reply: Result<String>) {
        if let Ok(mut queue) = self.replies.lock() {
            queue.push_back(reply);
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.skip_recording {
            if let Ok(mut seen) = self.requests.lock() {
                seen.push(request.clone());
            }
        }
        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(reply) => reply,
            None => self.fallback.clone().ok_or(CompletionError::Exhausted),
        }
    }
}
