//! Order 200 (assertions): walks the test body for JUnit-style assertion
//! calls and the `assertThat` fluent entry point.

use crate::extraction::chain::Extractor;
use crate::extraction::javalike;
use crate::extraction::{Assertion, ExtractionContextBuilder, ExtractionRequest};

const POSITIONAL_KINDS: &[&str] = &[
    "assertEquals",
    "assertNotEquals",
    "assertSame",
    "assertNotSame",
    "assertArrayEquals",
];

const SINGLE_ACTUAL_KINDS: &[&str] = &["assertTrue", "assertFalse", "assertNull", "assertNotNull"];

pub struct AssertionExtractor;

impl Extractor for AssertionExtractor {
    fn id(&self) -> &'static str {
        "assertions"
    }

    fn order(&self) -> i32 {
        200
    }

    fn supports(&self, request: &ExtractionRequest) -> bool {
        request.test_path.extension().and_then(|e| e.to_str()) == Some("java")
    }

    fn extract(&self, request: &ExtractionRequest, builder: &mut ExtractionContextBuilder) {
        let Ok(source) = std::fs::read_to_string(&request.test_path) else {
            return;
        };
        for kind in POSITIONAL_KINDS.iter().chain(SINGLE_ACTUAL_KINDS) {
            for (open, close) in javalike::find_calls(&source, kind) {
                let args = javalike::split_top_level(&source[open + 1..close], ',');
                let args: Vec<String> = args.iter().map(|a| a.trim().to_string()).collect();
                builder.push_assertion(build_positional(kind, &args));
            }
        }
        for (open, close) in javalike::find_calls(&source, "assertThrows") {
            let args = javalike::split_top_level(&source[open + 1..close], ',');
            let args: Vec<String> = args.iter().map(|a| a.trim().to_string()).collect();
            builder.push_assertion(Assertion {
                kind: "assertThrows".to_string(),
                expected: args.first().cloned(),
                actual: args.get(1).cloned(),
                message: args.get(2).cloned(),
            });
        }
        for (open, close) in javalike::find_calls(&source, "assertThat") {
            let actual = source[open + 1..close].trim().to_string();
            let mut chain_parts = Vec::new();
            let mut cursor = close + 1;
            while let Some((name, copen, cclose)) = javalike::chained_call(&source, cursor) {
                let args = source[copen + 1..cclose].trim();
                if args.is_empty() {
                    chain_parts.push(format!("{name}()"));
                } else {
                    chain_parts.push(format!("{name}({args})"));
                }
                cursor = cclose + 1;
            }
            builder.push_assertion(Assertion {
                kind: "assertThat".to_string(),
                expected: Some(chain_parts.join(".")),
                actual: Some(actual),
                message: None,
            });
        }
    }
}

fn build_positional(kind: &str, args: &[String]) -> Assertion {
    let is_pair_kind = POSITIONAL_KINDS.contains(&kind);
    match args.len() {
        0 => Assertion {
            kind: kind.to_string(),
            expected: None,
            actual: None,
            message: None,
        },
        1 => Assertion {
            kind: kind.to_string(),
            expected: None,
            actual: Some(args[0].clone()),
            message: None,
        },
        2 if is_pair_kind => Assertion {
            kind: kind.to_string(),
            expected: Some(args[0].clone()),
            actual: Some(args[1].clone()),
            message: None,
        },
        2 => Assertion {
            kind: kind.to_string(),
            expected: None,
            actual: Some(args[0].clone()),
            message: Some(args[1].clone()),
        },
        _ if is_pair_kind => Assertion {
            kind: kind.to_string(),
            expected: Some(args[0].clone()),
            actual: Some(args[1].clone()),
            message: Some(args[2].clone()),
        },
        _ => Assertion {
            kind: kind.to_string(),
            expected: None,
            actual: Some(args[0].clone()),
            message: Some(args[1].clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(body: &str) -> Vec<Assertion> {
        let mut file = tempfile::Builder::new().suffix(".java").tempfile().unwrap();
        std::io::Write::write_all(&mut file, body.as_bytes()).unwrap();
        let request = ExtractionRequest {
            test_path: file.path().to_path_buf(),
            ..Default::default()
        };
        let mut builder = ExtractionContextBuilder::new();
        AssertionExtractor.extract(&request, &mut builder);
        builder.build().assertions
    }

    #[test]
    fn two_arg_assert_equals_is_expected_then_actual() {
        let found = extract("void t() { assertEquals(5, calc.add(2, 3)); }");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].expected.as_deref(), Some("5"));
        assert_eq!(found[0].actual.as_deref(), Some("calc.add(2, 3)"));
    }

    #[test]
    fn single_arg_assert_true_populates_only_actual() {
        let found = extract("void t() { assertTrue(ok); }");
        assert_eq!(found[0].expected, None);
        assert_eq!(found[0].actual.as_deref(), Some("ok"));
    }

    #[test]
    fn fluent_assert_that_records_actual_and_chain() {
        let found = extract("void t() { assertThat(result).isEqualTo(5).isPositive(); }");
        assert_eq!(found[0].kind, "assertThat");
        assert_eq!(found[0].actual.as_deref(), Some("result"));
        assert_eq!(found[0].expected.as_deref(), Some("isEqualTo(5).isPositive()"));
    }
}
