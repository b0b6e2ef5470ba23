//! Order 100 (test structure): locates the test method by name and copies
//! its class name, method name, and verbatim body text into the context.

use crate::extraction::chain::{warn_extractor_failure, Extractor};
use crate::extraction::javalike;
use crate::extraction::{ExtractionContextBuilder, ExtractionRequest};

pub struct TestMethodExtractor;

impl Extractor for TestMethodExtractor {
    fn id(&self) -> &'static str {
        "test_method"
    }

    fn order(&self) -> i32 {
        100
    }

    fn supports(&self, request: &ExtractionRequest) -> bool {
        request.test_path.extension().and_then(|e| e.to_str()) == Some("java")
    }

    fn extract(&self, request: &ExtractionRequest, builder: &mut ExtractionContextBuilder) {
        let Ok(source) = std::fs::read_to_string(&request.test_path) else {
            warn_extractor_failure(self.id(), "could not read test source file");
            return;
        };
        let class_name = javalike::find_class_name(&source).unwrap_or_else(|| request.test_class_name.clone());
        let Some(method) = javalike::find_method(&source, &request.test_method_name) else {
            warn_extractor_failure(self.id(), "test method not found in source");
            return;
        };
        builder.set_test_identity(
            class_name,
            request.test_method_name.clone(),
            method.body_text(&source).trim().to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn copies_class_method_and_body() {
        let mut file = tempfile::Builder::new().suffix(".java").tempfile().unwrap();
        write!(
            file,
            "public class CalculatorTest {{\n  public void testAdd() {{ assertEquals(5, calc.add(2, 3)); }}\n}}\n"
        )
        .unwrap();
        let request = ExtractionRequest {
            test_path: file.path().to_path_buf(),
            test_class_name: "CalculatorTest".into(),
            test_method_name: "testAdd".into(),
            ..Default::default()
        };
        let mut builder = ExtractionContextBuilder::new();
        TestMethodExtractor.extract(&request, &mut builder);
        let ctx = builder.build();
        assert_eq!(ctx.test_class_name, "CalculatorTest");
        assert_eq!(ctx.test_method_name, "testAdd");
        assert!(ctx.test_method_body.contains("assertEquals"));
    }
}
