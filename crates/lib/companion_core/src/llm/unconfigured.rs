//! Degraded-mode provider used when no API key is configured.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ChatProvider, Conversation, ConversationHandle, LlmError};

/// Provider whose conversations always fail with
/// [`LlmError::MissingConfiguration`].
pub struct UnconfiguredProvider {
    reason: Arc<str>,
}

impl UnconfiguredProvider {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: Arc::from(reason),
        }
    }
}

impl ChatProvider for UnconfiguredProvider {
    fn create_conversation(&self, _system_instruction: &str, model: &str) -> ConversationHandle {
        Arc::new(UnconfiguredConversation {
            reason: Arc::clone(&self.reason),
            model: model.to_string(),
        })
    }

    fn name(&self) -> &str {
        "unconfigured"
    }

    fn is_configured(&self) -> bool {
        false
    }
}

struct UnconfiguredConversation {
    reason: Arc<str>,
    model: String,
}

#[async_trait]
impl Conversation for UnconfiguredConversation {
    async fn send(&self, _text: &str) -> Result<String, LlmError> {
        Err(LlmError::MissingConfiguration(self.reason.to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
