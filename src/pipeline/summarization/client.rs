use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::prompt::SYSTEM_PROMPT;
use super::types::LlmProvider;
use super::SummaryError;
use crate::config::ProviderConfig;

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// The timeout race lives in the orchestrator, so the HTTP client itself
/// carries only a connect timeout.
pub struct HttpLlmProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl HttpLlmProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, SummaryError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SummaryError::Provider(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            client,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    async fn complete(&self, prompt: &str) -> Result<String, SummaryError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SummaryError::Provider(format!("Cannot connect to {}", self.base_url))
                } else {
                    SummaryError::Provider(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::ProviderStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummaryError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SummaryError::MalformedResponse("response has no content".into()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Scripted reply for [`MockLlmProvider`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Fails with `SummaryError::Provider` carrying the message.
    Error(String),
    /// Never resolves.
    Hang,
}

/// In-process provider for tests and offline runs. Replies are taken from a
/// queue in order; once it is empty the fallback reply repeats.
pub struct MockLlmProvider {
    replies: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmProvider {
    pub fn new(response: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: MockReply::Text(response.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose every call never completes.
    pub fn hanging() -> Self {
        let mut mock = Self::new("");
        mock.fallback = MockReply::Hang;
        mock
    }

    pub fn with_replies(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        *self.replies.lock().unwrap_or_else(|p| p.into_inner()) = replies.into_iter().collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, prompt: &str) -> Result<String, SummaryError> {
        self.prompts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(message) => Err(SummaryError::Provider(message)),
            MockReply::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
