//! Chat provider abstraction — the external language model behind each
//! conversation.
//!
//! A [`ChatProvider`] opens conversations; a [`Conversation`] carries its own
//! prior turns and forwards one message at a time.
//!
//! # Providers
//!
//! - [`gemini::GeminiProvider`] — Google Gemini `generateContent` API
//! - [`unconfigured::UnconfiguredProvider`] — degraded mode, every send fails

pub mod config;
pub mod gemini;
pub mod unconfigured;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::ConfigError;
use self::config::LlmConfig;

/// Shared handle to one ongoing conversation.
pub type ConversationHandle = Arc<dyn Conversation>;

/// Errors reported by the upstream model provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Provider not configured: {0}")]
    MissingConfiguration(String),

    #[error("Upstream request failed: {0}")]
    Request(String),

    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    #[error("Upstream returned no text (finish reason: {})", finish_reason.as_deref().unwrap_or("unknown"))]
    EmptyReply { finish_reason: Option<String> },
}

impl LlmError {
    /// True when the failure is caused by local configuration rather than
    /// the upstream service.
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::MissingConfiguration(_))
    }
}

/// One ongoing exchange with the model. Prior turns are kept implicitly.
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Send a user message and return the model's text reply.
    async fn send(&self, text: &str) -> Result<String, LlmError>;

    /// Model identifier this conversation talks to.
    fn model(&self) -> &str;
}

/// Factory for conversations.
///
/// `create_conversation` does no I/O; the first network call happens on
/// [`Conversation::send`].
pub trait ChatProvider: Send + Sync {
    fn create_conversation(&self, system_instruction: &str, model: &str) -> ConversationHandle;

    /// Provider identifier for logging.
    fn name(&self) -> &str;

    /// False when running in degraded mode.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Build the provider for a resolved config.
///
/// A missing API key yields an [`unconfigured::UnconfiguredProvider`] rather
/// than an error so the server can still start.
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn ChatProvider>, ConfigError> {
    match config.api_key.as_deref() {
        Some(key) => Ok(Arc::new(gemini::GeminiProvider::new(
            key,
            &config.base_url,
            config.timeout,
        )?)),
        None => {
            info!("no provider API key; using unconfigured provider");
            Ok(Arc::new(unconfigured::UnconfiguredProvider::new(
                "GEMINI_API_KEY is not set",
            )))
        }
    }
}
