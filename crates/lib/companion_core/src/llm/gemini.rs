//! Google Gemini chat provider.
//!
//! Calls `POST {base}/models/{model}:generateContent`. The API is stateless,
//! so each conversation keeps its own turn history and replays it with the
//! persona as `systemInstruction` on every call. Turns are only recorded
//! after a successful reply. No retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{ChatProvider, Conversation, ConversationHandle, LlmError};
use crate::config::ConfigError;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }

    pub fn user(text: &str) -> Self {
        Self::text(Some("user"), text)
    }

    pub fn model(text: &str) -> Self {
        Self::text(Some("model"), text)
    }

    fn system(text: &str) -> Self {
        Self::text(None, text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: &'a Content,
    contents: &'a [Content],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Pull the reply text out of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, LlmError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(LlmError::EmptyReply {
            finish_reason: response.prompt_feedback.and_then(|f| f.block_reason),
        });
    };

    let text: String = candidate
        .content
        .into_iter()
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        return Err(LlmError::EmptyReply {
            finish_reason: candidate.finish_reason,
        });
    }
    Ok(text)
}

/// Map a transport error, keeping timeouts distinct.
fn transport_error(e: reqwest::Error, timeout: Duration) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(timeout)
    } else if e.is_decode() {
        LlmError::Malformed(e.to_string())
    } else {
        LlmError::Request(e.to_string())
    }
}

/// Gemini provider: one shared HTTP client for every conversation.
pub struct GeminiProvider {
    client: Client,
    api_key: Arc<str>,
    base_url: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        url::Url::parse(base_url).map_err(|_| ConfigError::InvalidBaseUrl(base_url.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            api_key: Arc::from(api_key),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

impl ChatProvider for GeminiProvider {
    fn create_conversation(&self, system_instruction: &str, model: &str) -> ConversationHandle {
        Arc::new(GeminiConversation {
            client: self.client.clone(),
            api_key: Arc::clone(&self.api_key),
            endpoint: self.endpoint(model),
            model: model.to_string(),
            timeout: self.timeout,
            system_instruction: Content::system(system_instruction),
            history: Mutex::new(Vec::new()),
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// One Gemini chat thread.
pub struct GeminiConversation {
    client: Client,
    api_key: Arc<str>,
    endpoint: String,
    model: String,
    timeout: Duration,
    system_instruction: Content,
    /// Alternating user/model turns. Held across the upstream call so turns
    /// of one conversation stay ordered.
    history: Mutex<Vec<Content>>,
}

impl GeminiConversation {
    /// Number of recorded turns (user and model).
    pub async fn turn_count(&self) -> usize {
        self.history.lock().await.len()
    }
}

#[async_trait]
impl Conversation for GeminiConversation {
    async fn send(&self, text: &str) -> Result<String, LlmError> {
        let mut history = self.history.lock().await;

        let user_turn = Content::user(text);
        let mut contents = Vec::with_capacity(history.len() + 1);
        contents.extend(history.iter().cloned());
        contents.push(user_turn.clone());

        debug!(model = %self.model, turns = contents.len(), "sending generateContent");

        let resp = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &*self.api_key)
            .json(&GenerateContentRequest {
                system_instruction: &self.system_instruction,
                contents: &contents,
            })
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        let reply = extract_text(parsed)?;

        history.push(user_turn);
        history.push(Content::model(&reply));
        Ok(reply)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("valid response json")
    }

    #[test]
    fn request_uses_camel_case_and_omits_system_role() {
        let system = Content::system("persona");
        let contents = vec![Content::user("hi"), Content::model("hello")];
        let body = serde_json::to_value(GenerateContentRequest {
            system_instruction: &system,
            contents: &contents,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "systemInstruction": { "parts": [{ "text": "persona" }] },
                "contents": [
                    { "role": "user", "parts": [{ "text": "hi" }] },
                    { "role": "model", "parts": [{ "text": "hello" }] }
                ]
            })
        );
    }

    #[test]
    fn extract_joins_text_parts() {
        let resp = parse(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "hi " }, { "text": "there" }] },
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(extract_text(resp).unwrap(), "hi there");
    }

    #[test]
    fn extract_without_candidates_reports_block_reason() {
        let resp = parse(json!({ "promptFeedback": { "blockReason": "SAFETY" } }));
        match extract_text(resp) {
            Err(LlmError::EmptyReply { finish_reason }) => {
                assert_eq!(finish_reason.as_deref(), Some("SAFETY"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn extract_candidate_without_text_is_empty_reply() {
        let resp = parse(json!({
            "candidates": [{ "finishReason": "MAX_TOKENS" }]
        }));
        match extract_text(resp) {
            Err(LlmError::EmptyReply { finish_reason }) => {
                assert_eq!(finish_reason.as_deref(), Some("MAX_TOKENS"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn endpoint_includes_model() {
        let provider =
            GeminiProvider::new("k", "https://example.com/v1beta/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            provider.endpoint("gemini-1.5-flash"),
            "https://example.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(matches!(
            GeminiProvider::new("k", "not a url", Duration::from_secs(1)),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn conversation_reports_model() {
        let provider =
            GeminiProvider::new("k", "https://example.com", Duration::from_secs(1)).unwrap();
        let conv = provider.create_conversation("persona", "gemini-1.5-flash");
        assert_eq!(conv.model(), "gemini-1.5-flash");
    }
}
