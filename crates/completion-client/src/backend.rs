use async_trait::async_trait;

use crate::types::ChatRequest;
use crate::Result;

/// Anything that can turn a [`ChatRequest`] into completion text.
///
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}
