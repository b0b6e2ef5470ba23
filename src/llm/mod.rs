//! LM client contract: request/response to a generation endpoint, with a
//! lightweight availability probe and a closed error taxonomy.
//!
//! Generalizes the teacher's `providers` module (which returns a
//! structured `LlmPatch`) down to this spec's narrower contract: a single
//! prompt in, raw generation text out.

pub mod mock;
pub mod ollama;
pub mod openai;

use crate::error::LmError;
use async_trait::async_trait;

#[async_trait]
pub trait LmClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LmError>;

    /// Must not raise: transport failures during the probe are folded
    /// into `false`.
    async fn is_available(&self) -> bool;
}

/// Extracts code from an LM response: if the response contains a fenced
/// block (backtick-fence, optionally tagged with a language identifier),
/// takes the first fenced block's inner text; otherwise the full trimmed
/// response. First-block-wins when multiple fences are present.
pub fn extract_code(response: &str) -> String {
    let mut lines = response.lines();
    let mut collecting = false;
    let mut out = Vec::new();
    for line in &mut lines {
        let trimmed = line.trim_start();
        if !collecting {
            if trimmed.starts_with("```") {
                collecting = true;
            }
            continue;
        }
        if trimmed.starts_with("```") {
            break;
        }
        out.push(line);
    }
    if out.is_empty() && !collecting {
        response.trim().to_string()
    } else {
        out.join("\n").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_fenced_block() {
        let response = "Here you go:\n```java\nreturn a + b;\n```\nAnd also:\n```java\nreturn a - b;\n```";
        assert_eq!(extract_code(response), "return a + b;");
    }

    #[test]
    fn takes_full_trimmed_response_when_no_fence() {
        let response = "  return a + b;  \n";
        assert_eq!(extract_code(response), "return a + b;");
    }

    #[test]
    fn strips_language_tag_from_fence() {
        let response = "```java\nreturn 1;\n```";
        assert_eq!(extract_code(response), "return 1;");
    }
}
