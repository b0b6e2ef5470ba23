//! Order 300 (mocks): recognizes `when(mock.method(args)).thenReturn(value)`
//! and `verify(mock[, times]).method(args)` patterns.

use crate::extraction::chain::Extractor;
use crate::extraction::javalike;
use crate::extraction::{ExtractionContextBuilder, ExtractionRequest, MockSetup, VerifyStatement};

pub struct MockExtractor;

impl Extractor for MockExtractor {
    fn id(&self) -> &'static str {
        "mocks"
    }

    fn order(&self) -> i32 {
        300
    }

    fn supports(&self, request: &ExtractionRequest) -> bool {
        request.test_path.extension().and_then(|e| e.to_str()) == Some("java")
    }

    fn extract(&self, request: &ExtractionRequest, builder: &mut ExtractionContextBuilder) {
        let Ok(source) = std::fs::read_to_string(&request.test_path) else {
            return;
        };
        for (open, close) in javalike::find_calls(&source, "when") {
            let inner = source[open + 1..close].trim();
            let Some((mock_object, method_call)) = split_receiver_call(inner) else {
                continue;
            };
            let Some((name, _ropen, rclose)) = javalike::chained_call(&source, close + 1) else {
                continue;
            };
            if name != "thenReturn" {
                continue;
            }
            let ropen = source[close + 1..].find('(').map(|i| close + 1 + i).unwrap_or(rclose);
            let return_value = source[ropen + 1..rclose].trim().to_string();
            builder.push_mock_setup(MockSetup {
                mock_object,
                method_call,
                return_value,
            });
        }

        for (open, close) in javalike::find_calls(&source, "verify") {
            let inner_args = javalike::split_top_level(&source[open + 1..close], ',');
            let inner_args: Vec<String> = inner_args.iter().map(|a| a.trim().to_string()).collect();
            let Some(mock_object) = inner_args.first().cloned() else {
                continue;
            };
            let times = inner_args.get(1).cloned().unwrap_or_else(|| "1".to_string());
            let Some((method_name, mopen, mclose)) = javalike::chained_call(&source, close + 1) else {
                continue;
            };
            let args = source[mopen + 1..mclose].trim();
            let method_call = format!("{method_name}({args})");
            builder.push_verify_statement(VerifyStatement {
                mock_object,
                method_call,
                times,
            });
        }
    }
}

/// Splits `mock.method(args)` into `(mock, "method(args)")`.
fn split_receiver_call(inner: &str) -> Option<(String, String)> {
    let open = inner.find('(')?;
    let head = &inner[..open];
    let dot = head.rfind('.')?;
    let receiver = head[..dot].trim().to_string();
    let method_call = inner[dot + 1..].trim().to_string();
    Some((receiver, method_call))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(body: &str) -> (Vec<MockSetup>, Vec<VerifyStatement>) {
        let mut file = tempfile::Builder::new().suffix(".java").tempfile().unwrap();
        std::io::Write::write_all(&mut file, body.as_bytes()).unwrap();
        let request = ExtractionRequest {
            test_path: file.path().to_path_buf(),
            ..Default::default()
        };
        let mut builder = ExtractionContextBuilder::new();
        MockExtractor.extract(&request, &mut builder);
        let ctx = builder.build();
        (ctx.mock_setups, ctx.verify_statements)
    }

    #[test]
    fn extracts_when_then_return() {
        let (setups, _) = extract("void t() { when(repo.findById(1L)).thenReturn(expectedUser); }");
        assert_eq!(setups.len(), 1);
        assert_eq!(setups[0].mock_object, "repo");
        assert_eq!(setups[0].method_call, "findById(1L)");
        assert_eq!(setups[0].return_value, "expectedUser");
    }

    #[test]
    fn extracts_verify_with_times() {
        let (_, verifies) =
            extract("void t() { verify(repo, times(1)).findById(1L); }");
        assert_eq!(verifies.len(), 1);
        assert_eq!(verifies[0].mock_object, "repo");
        assert_eq!(verifies[0].times, "times(1)");
        assert_eq!(verifies[0].method_call, "findById(1L)");
    }

    #[test]
    fn verify_without_times_defaults_to_one() {
        let (_, verifies) = extract("void t() { verify(repo).findById(1L); }");
        assert_eq!(verifies[0].times, "1");
    }
}
