// OpenAI-compatible chat client shared by the planner, searcher and writer.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{AgentError, AgentResult};

static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(\{.*\}|\[.*\])").expect("static regex"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

const JSON_ONLY: &str = "\n\nReturn a valid JSON object. Output ONLY json.";
const STRICT_JSON: &str = "\n\nIMPORTANT: Output ONLY a single valid JSON object matching the expected schema. No prose, no extra text.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl LlmClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> AgentResult<Self> {
        Self::with_timeout(base_url, api_key, REQUEST_TIMEOUT)
    }

    /// Every call fails with a timeout error once `timeout` elapses.
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AgentResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent("brief-orchestrator/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.into(),
        })
    }

    /// Plain completion; `json_mode` asks the provider for a JSON object.
    pub async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
        temperature: f32,
        json_mode: bool,
    ) -> AgentResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AgentError::Configuration("LLM_API_KEY is not set".to_string()))?;

        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        debug!(model, "Chat completion request");
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Upstream { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| AgentError::MalformedOutput("empty completion".to_string()))
    }

    /// Completion parsed into `T`. Retries once with a stricter prompt when
    /// the first reply carries no JSON at all.
    pub async fn structured<T: DeserializeOwned>(
        &self,
        model: &str,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> AgentResult<T> {
        let system = if system.to_lowercase().contains("json") {
            system.to_string()
        } else {
            format!("{system}{JSON_ONLY}")
        };

        let text = self
            .complete(model, &system, user, temperature.min(0.5), true)
            .await?;
        let value = match extract_json(&text) {
            Ok(value) => value,
            Err(_) => {
                warn!(model, "Reply was not JSON; retrying with strict prompt");
                let strict = format!("{system}{STRICT_JSON}");
                let retry = self
                    .complete(model, &strict, user, temperature.min(0.3), true)
                    .await?;
                extract_json(&retry)?
            }
        };

        serde_json::from_value(value).map_err(|e| AgentError::MalformedOutput(e.to_string()))
    }
}

/// Pull a JSON value out of a model reply, tolerating code fences and prose.
pub fn extract_json(text: &str) -> AgentResult<Value> {
    let stripped = strip_code_blocks(text);
    if let Ok(value) = serde_json::from_str(stripped) {
        return Ok(value);
    }
    JSON_SPAN
        .find_iter(stripped)
        .find_map(|m| serde_json::from_str(m.as_str()).ok())
        .ok_or_else(|| AgentError::MalformedOutput("could not parse JSON from model output".to_string()))
}

fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json() {
        assert_eq!(extract_json(r#"{"a":1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn fenced_json() {
        let text = "```json\n{\"markdown\": \"# Hi\"}\n```";
        assert_eq!(extract_json(text).unwrap(), json!({"markdown": "# Hi"}));
    }

    #[test]
    fn json_embedded_in_prose() {
        let text = "Sure! Here is the plan:\n{\"scope\": \"Company\"}\nHope that helps.";
        assert_eq!(extract_json(text).unwrap(), json!({"scope": "Company"}));
    }

    #[test]
    fn no_json_is_malformed() {
        assert!(matches!(
            extract_json("no structure here"),
            Err(AgentError::MalformedOutput(_))
        ));
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let client = LlmClient::new("http://localhost:1", None).unwrap();
        let err = client.complete("m", "s", "u", 0.2, false).await.unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[tokio::test]
    async fn silent_provider_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold connections without ever answering.
        let server = tokio::spawn(async move {
            let mut held = vec![];
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = LlmClient::with_timeout(
            format!("http://{addr}"),
            Some("key".to_string()),
            Duration::from_millis(100),
        )
        .unwrap();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.complete("m", "s", "u", 0.2, false),
        )
        .await
        .expect("client timeout should fire first");

        match result {
            Err(AgentError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("expected a timeout, got {other:?}"),
        }
        server.abort();
    }
}
