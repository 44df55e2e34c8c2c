//! Chat boundary — turns an upstream call into a reply or the fallback.
//!
//! Upstream failures never escape this module. They are logged for
//! operators and replaced by [`FALLBACK_REPLY`].

use tracing::error;

use crate::llm::LlmError;
use crate::session::{self, SessionStore};

/// Reply shown to the user whenever the upstream call fails.
pub const FALLBACK_REPLY: &str = "我現在有點累了，可以稍後再跟我說話嗎？😊";

/// Result of one chat turn.
#[derive(Debug)]
pub enum ChatOutcome {
    /// Text produced by the model.
    Reply(String),
    /// Upstream failed; the user sees [`FALLBACK_REPLY`].
    Fallback(LlmError),
}

impl ChatOutcome {
    /// Text to send back to the client.
    pub fn reply_text(&self) -> &str {
        match self {
            ChatOutcome::Reply(text) => text,
            ChatOutcome::Fallback(_) => FALLBACK_REPLY,
        }
    }

    pub fn into_reply(self) -> String {
        match self {
            ChatOutcome::Reply(text) => text,
            ChatOutcome::Fallback(_) => FALLBACK_REPLY.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ChatOutcome::Fallback(_))
    }
}

/// Run one chat turn for `token`.
///
/// The store is only touched to obtain the handle; the upstream call runs
/// without holding any store lock.
pub async fn respond(store: &dyn SessionStore, token: &str, message: &str) -> ChatOutcome {
    let handle = store.get_or_create(token);

    match session::send_message(&handle, message).await {
        Ok(reply) => ChatOutcome::Reply(reply),
        Err(e) => {
            if e.is_configuration() {
                error!(error = %e, "chat provider is not configured; returning fallback reply");
            } else {
                error!(error = %e, model = handle.model(), "upstream chat call failed; returning fallback reply");
            }
            ChatOutcome::Fallback(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::unconfigured::UnconfiguredProvider;
    use crate::llm::{ChatProvider, Conversation, ConversationHandle};
    use crate::session::InMemorySessionStore;

    struct FixedProvider(Result<&'static str, u16>);

    struct FixedConversation(Result<&'static str, u16>);

    #[async_trait]
    impl Conversation for FixedConversation {
        async fn send(&self, _text: &str) -> Result<String, LlmError> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(LlmError::Status {
                    status,
                    body: "boom".into(),
                }),
            }
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    impl ChatProvider for FixedProvider {
        fn create_conversation(&self, _system: &str, _model: &str) -> ConversationHandle {
            Arc::new(FixedConversation(self.0))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn success_yields_reply() {
        let store = InMemorySessionStore::new(Arc::new(FixedProvider(Ok("hi there"))), "p", "m");
        let outcome = respond(&store, "token_a", "hello").await;
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.reply_text(), "hi there");
        assert_eq!(outcome.into_reply(), "hi there");
    }

    #[tokio::test]
    async fn upstream_error_yields_fallback() {
        let store = InMemorySessionStore::new(Arc::new(FixedProvider(Err(503))), "p", "m");
        let outcome = respond(&store, "token_a", "hello").await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.reply_text(), FALLBACK_REPLY);
        match outcome {
            ChatOutcome::Fallback(LlmError::Status { status, .. }) => assert_eq!(status, 503),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn degraded_mode_yields_fallback() {
        let store =
            InMemorySessionStore::new(Arc::new(UnconfiguredProvider::new("no key")), "p", "m");
        let outcome = respond(&store, "token_a", "hello").await;
        assert_eq!(outcome.into_reply(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn failure_still_keeps_the_session() {
        let store = InMemorySessionStore::new(Arc::new(FixedProvider(Err(500))), "p", "m");
        respond(&store, "token_a", "hello").await;
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn fallback_is_not_empty() {
        assert!(!FALLBACK_REPLY.is_empty());
    }
}
