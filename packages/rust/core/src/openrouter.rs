//! Minimal OpenRouter chat-completions client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use speakerscout_shared::{Result, ScoutError};
use tracing::{debug, instrument};
use url::Url;

const USER_AGENT: &str = concat!("speakerscout/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
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
    #[serde(default)]
    content: Option<String>,
}

/// Client for one model on an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    /// `base_url` is the API root (e.g. `https://openrouter.ai/api/v1`).
    pub fn new(base_url: &str, api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let endpoint = Url::parse(&format!(
            "{}/chat/completions",
            base_url.trim_end_matches('/')
        ))
        .map_err(|e| ScoutError::config(format!("invalid OpenRouter base URL '{base_url}': {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ScoutError::config(format!(
                "OpenRouter base URL must be http or https, got '{base_url}'"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScoutError::Llm(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one user prompt (with an optional system prompt) and return the
    /// trimmed completion text.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .header("X-Title", "SpeakerScout")
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoutError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ScoutError::Llm(format!("HTTP {status}: {}", text.trim())));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScoutError::Llm(format!("invalid completion body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ScoutError::Llm("empty completion".into()))?;

        debug!(chars = content.len(), "completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(OpenRouterClient::new("ftp://example.com", "k", "m").is_err());
        assert!(OpenRouterClient::new("not a url", "k", "m").is_err());
    }

    #[tokio::test]
    async fn posts_chat_completion_and_trims_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Great fit.  ")))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            OpenRouterClient::new(&format!("{}/api/v1/", server.uri()), "test-key", "test/model")
                .unwrap();
        let reply = client.complete(Some("be brief"), "why?").await.unwrap();
        assert_eq!(reply, "Great fit.");
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&server.uri(), "k", "m").unwrap();
        let err = client.complete(None, "hi").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("429"), "{msg}");
        assert!(msg.contains("rate limited"), "{msg}");
    }

    #[tokio::test]
    async fn empty_choices_are_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&server.uri(), "k", "m").unwrap();
        assert!(client.complete(None, "hi").await.is_err());
    }
}
