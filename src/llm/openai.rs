//! OpenAI-chat-completions-compatible client (also fits Groq, DeepSeek,
//! and other OpenAI-shaped endpoints), adapted from the teacher's
//! `OpenAiProvider`: same request/response shapes, generalized to return
//! raw generation text instead of a parsed `LlmPatch`.

use crate::error::LmError;
use crate::llm::LmClient;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(base_url: String, model: String, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            model,
            api_key,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResp {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResp {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[async_trait]
impl LmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let req = ChatReq {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
        };
        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&req)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LmError::RateLimited);
        }
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<ErrorResp>(&body_text) {
                if err.error.code.as_deref() == Some("context_length_exceeded") {
                    return Err(LmError::ContextExceeded);
                }
                return Err(LmError::Unknown(err.error.message));
            }
            return Err(LmError::Unavailable);
        }

        let body: ChatResp = resp
            .json()
            .await
            .map_err(|e| LmError::InvalidResponse(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LmError::InvalidResponse("no choices in response".to_string()))
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.base_url.trim_end_matches('/'));
        let result = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await;
        matches!(result, Ok(resp) if resp.status().is_success())
    }
}

fn map_transport_error(e: reqwest::Error) -> LmError {
    if e.is_timeout() {
        LmError::Timeout
    } else if e.is_connect() {
        LmError::Unavailable
    } else {
        LmError::Unknown(e.to_string())
    }
}
