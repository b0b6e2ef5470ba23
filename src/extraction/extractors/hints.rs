//! Order 400 (hints): reads `@Hint("...")` annotations (single-value,
//! `value=` form, and repeating container) attached to the test method.

use crate::extraction::chain::Extractor;
use crate::extraction::javalike;
use crate::extraction::{ExtractionContextBuilder, ExtractionRequest};
use regex::Regex;
use std::sync::OnceLock;

fn hint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"@Hint\s*\(\s*(?:value\s*=\s*)?"([^"]*)"\s*\)"#).unwrap())
}

pub struct HintExtractor;

impl Extractor for HintExtractor {
    fn id(&self) -> &'static str {
        "hints"
    }

    fn order(&self) -> i32 {
        400
    }

    fn supports(&self, request: &ExtractionRequest) -> bool {
        request.test_path.extension().and_then(|e| e.to_str()) == Some("java")
    }

    fn extract(&self, request: &ExtractionRequest, builder: &mut ExtractionContextBuilder) {
        let Ok(source) = std::fs::read_to_string(&request.test_path) else {
            return;
        };
        let Some(method) = javalike::find_method(&source, &request.test_method_name) else {
            return;
        };
        // The annotation block directly preceding the method: everything
        // since the previous method's closing brace (or the class opening
        // brace if this is the first method).
        let preceding_end = method.full_start;
        let preceding_start = source[..preceding_end].rfind('}').map(|i| i + 1).unwrap_or(0);
        let region = &source[preceding_start..preceding_end];
        for caps in hint_re().captures_iter(region) {
            builder.push_hint(caps.get(1).unwrap().as_str().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_single_value_and_value_equals_forms() {
        let src = r#"
public class Test {
    @Hint("use a loop")
    @Hint(value = "handle negatives")
    public void testAdd() { assertTrue(true); }
}
"#;
        let mut file = tempfile::Builder::new().suffix(".java").tempfile().unwrap();
        std::io::Write::write_all(&mut file, src.as_bytes()).unwrap();
        let request = ExtractionRequest {
            test_path: file.path().to_path_buf(),
            test_method_name: "testAdd".into(),
            ..Default::default()
        };
        let mut builder = ExtractionContextBuilder::new();
        HintExtractor.extract(&request, &mut builder);
        let ctx = builder.build();
        assert_eq!(ctx.hints, vec!["use a loop", "handle negatives"]);
    }
}
