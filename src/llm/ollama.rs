//! Ollama client: the default, local-first provider. No API key.

use crate::error::LmError;
use crate::llm::LmClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url, model })
    }
}

#[derive(Debug, Serialize)]
struct GenerateReq<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResp {
    response: String,
}

#[async_trait]
impl LmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, LmError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let req = GenerateReq {
            model: &self.model,
            prompt,
            stream: false,
        };
        let resp = self.client.post(&url).json(&req).send().await.map_err(map_transport_error)?;
        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LmError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(LmError::Unavailable);
        }
        let body: GenerateResp = resp
            .json()
            .await
            .map_err(|e| LmError::InvalidResponse(e.to_string()))?;
        Ok(body.response)
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));
        matches!(self.client.get(&url).send().await, Ok(resp) if resp.status().is_success())
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
