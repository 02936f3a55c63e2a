use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "groq/compound-mini";
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);

/// A hosted language model that turns one rendered prompt into one reply.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone)]
pub struct ChatModelConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl ChatModelConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout: DEFAULT_LLM_TIMEOUT,
        }
    }
}

/// Client for any OpenAI-style `/chat/completions` endpoint (Groq by default).
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleChatModel {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleChatModel {
    pub fn new(config: ChatModelConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)?.join("chat/completions")?;

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model: config.model,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleChatModel {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(classify_failure(status, details));
        }

        let parsed: ChatResponse = response.json().await?;
        first_message(parsed)
    }
}

fn classify_failure(status: StatusCode, body: String) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::Authentication(status.to_string())
        }
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(status.to_string()),
        _ => LlmError::Upstream {
            status: status.as_u16(),
            body,
        },
    }
}

fn first_message(response: ChatResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .ok_or(LlmError::EmptyResponse)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}/v1")
    }

    fn config_for(base_url: String) -> ChatModelConfig {
        ChatModelConfig {
            api_key: "test-key".to_string(),
            base_url,
            model: "stub-model".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let result = OpenAiCompatibleChatModel::new(ChatModelConfig::new("   "));
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn endpoint_joins_base_url() {
        let model = OpenAiCompatibleChatModel::new(ChatModelConfig::new("key")).unwrap();
        assert_eq!(
            model.endpoint().as_str(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(model.model(), DEFAULT_LLM_MODEL);
    }

    #[test]
    fn response_without_choices_is_empty() {
        let parsed: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(first_message(parsed), Err(LlmError::EmptyResponse)));
    }

    #[tokio::test]
    async fn sends_prompt_with_bearer_auth() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|value| value.to_str().ok())
                    == Some("Bearer test-key");
                let prompt = body
                    .pointer("/messages/0/content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let model = body.pointer("/model").and_then(Value::as_str).unwrap_or_default();
                Json(json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": format!("auth={authorized} model={model} prompt={prompt}")
                        }
                    }]
                }))
            }),
        );
        let base_url = spawn_stub(router).await;

        let model = OpenAiCompatibleChatModel::new(config_for(base_url)).unwrap();
        let reply = model.complete("what is the leave policy?").await.unwrap();

        assert_eq!(reply, "auth=true model=stub-model prompt=what is the leave policy?");
    }

    #[tokio::test]
    async fn rate_limit_and_auth_failures_are_classified() {
        let router = Router::new()
            .route(
                "/limited/chat/completions",
                post(|| async { (AxumStatus::TOO_MANY_REQUESTS, "slow down") }),
            )
            .route(
                "/denied/chat/completions",
                post(|| async { (AxumStatus::UNAUTHORIZED, "bad key") }),
            )
            .route(
                "/broken/chat/completions",
                post(|| async { (AxumStatus::BAD_GATEWAY, "upstream down") }),
            );
        let base_url = spawn_stub(router).await;
        let root = base_url.trim_end_matches("/v1").to_string();

        let limited = OpenAiCompatibleChatModel::new(config_for(format!("{root}/limited"))).unwrap();
        assert!(matches!(
            limited.complete("hi").await,
            Err(LlmError::RateLimited(_))
        ));

        let denied = OpenAiCompatibleChatModel::new(config_for(format!("{root}/denied"))).unwrap();
        assert!(matches!(
            denied.complete("hi").await,
            Err(LlmError::Authentication(_))
        ));

        let broken = OpenAiCompatibleChatModel::new(config_for(format!("{root}/broken"))).unwrap();
        match broken.complete("hi").await {
            Err(LlmError::Upstream { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "too late"
            }),
        );
        let base_url = spawn_stub(router).await;

        let mut config = config_for(base_url);
        config.timeout = Duration::from_millis(200);
        let model = OpenAiCompatibleChatModel::new(config).unwrap();

        assert!(matches!(model.complete("hi").await, Err(LlmError::Timeout)));
    }
}
