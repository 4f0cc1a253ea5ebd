//! OpenRouter chat completions client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MlError, MlResult};

/// Sampling temperature used for every request.
pub const CHAT_TEMPERATURE: f32 = 0.2;

/// Chat request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

/// User message content: plain text or a list of parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One part of a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat completions client.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> MlResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(MlError::config("OPENROUTER_API_KEY not set"));
        }
        let http = Client::builder().build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Send one user message and return the assistant's text.
    pub async fn complete(
        &self,
        model: &str,
        content: MessageContent,
        timeout: Duration,
    ) -> MlResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            temperature: CHAT_TEMPERATURE,
        };

        debug!(model, "Sending chat completion request to {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::request_failed(format!(
                "chat completion returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| MlError::invalid_response("no content in chat completion"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_content_serialization() {
        let content = MessageContent::Parts(vec![
            ContentPart::text("Frame 1 (0.0s):"),
            ContentPart::image("data:image/jpeg;base64,AAAA"),
        ]);
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json[0]["type"], "text");
        assert_eq!(json[1]["type"], "image_url");
        assert_eq!(json[1]["image_url"]["url"], "data:image/jpeg;base64,AAAA");

        let json = serde_json::to_value(MessageContent::Text("hi".into())).unwrap();
        assert_eq!(json, "hi");
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(matches!(
            OpenRouterClient::new("http://localhost", ""),
            Err(MlError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_returns_message_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "test/model",
                "temperature": 0.2,
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(server.uri(), "test-key").unwrap();
        let text = client
            .complete("test/model", MessageContent::Text("hello".into()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(text, "{\"ok\": true}");
    }

    #[tokio::test]
    async fn test_complete_maps_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(server.uri(), "k").unwrap();
        let err = client
            .complete("m", MessageContent::Text("x".into()), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, MlError::RequestFailed(ref msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(server.uri(), "k").unwrap();
        let err = client
            .complete("m", MessageContent::Text("x".into()), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, MlError::InvalidResponse(_)));
    }
}
