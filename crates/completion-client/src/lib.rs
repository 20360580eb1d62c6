//! `completion-client`: chat-completion client for drafting outreach messages.
//!
//! Speaks the OpenAI-compatible `POST /chat/completions` protocol: one
//! non-streaming request, one response, the text read from
//! `choices[0].message.content`. Nothing here retries; callers decide what a
//! failure means.
//!
//! # Architecture
//!
//! ```text
//! ChatRequest ─▶ CompletionBackend::complete ─▶ String
//!                    │
//!                    ├── CompletionClient   (reqwest, real provider)
//!                    └── ScriptedBackend    (queued replies, tests and demos)
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use completion_client::{ChatMessage, ChatRequest, ClientConfig, CompletionBackend, CompletionClient};
//!
//! let client = CompletionClient::new(ClientConfig::with_api_key("sk-..."))?;
//! let request = ChatRequest::new(
//!     "gpt-3.5-turbo",
//!     vec![ChatMessage::user("Escreva uma saudação curta.")],
//! );
//! let text = client.complete(&request).await?;
//! ```

pub mod backend;
pub mod client;
pub mod error;
pub mod scripted;
pub mod types;

pub use backend::CompletionBackend;
pub use client::{ClientConfig, CompletionClient, DEFAULT_BASE_URL};
pub use error::CompletionError;
pub use scripted::ScriptedBackend;
pub use types::{ChatMessage, ChatRequest, ChatResponse, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, CompletionError>;
