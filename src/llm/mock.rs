//! Deterministic LM client for tests and dry runs, grounded in the
//! teacher's `MockProvider`: a fixed, queued script of responses rather
//! than a live endpoint.

use crate::error::LmError;
use crate::llm::LmClient;
use async_trait::async_trait;
use std::sync::Mutex;

pub struct MockLmClient {
    script: Mutex<Vec<Result<String, LmError>>>,
    available: bool,
}

impl MockLmClient {
    /// Responses are returned in order, one per `generate` call; the last
    /// scripted response repeats once the script is exhausted, so tests
    /// don't need to pad it out to the exact retry count.
    pub fn new(script: Vec<Result<String, LmError>>) -> Self {
        Self {
            script: Mutex::new(script),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            available: false,
        }
    }

    pub fn always(response: impl Into<String>) -> Self {
        Self::new(vec![Ok(response.into())])
    }
}

#[async_trait]
impl LmClient for MockLmClient {
    async fn generate(&self, _prompt: &str) -> Result<String, LmError> {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.remove(0)
        } else {
            script
                .first()
                .cloned()
                .unwrap_or_else(|| Err(LmError::Unknown("mock script exhausted".to_string())))
        }
    }

    async fn is_available(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_scripted_responses_in_order() {
        let client = MockLmClient::new(vec![Ok("return 0;".to_string()), Ok("return a + b;".to_string())]);
        assert_eq!(client.generate("").await.unwrap(), "return 0;");
        assert_eq!(client.generate("").await.unwrap(), "return a + b;");
        // exhausted: repeats the last entry
        assert_eq!(client.generate("").await.unwrap(), "return a + b;");
    }

    #[tokio::test]
    async fn unavailable_reports_false_probe() {
        let client = MockLmClient::unavailable();
        assert!(!client.is_available().await);
    }
}
