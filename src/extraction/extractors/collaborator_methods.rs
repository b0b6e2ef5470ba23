//! Order 700 (collaborator methods): for each variable whose type
//! resolves to a sibling source file, records its public method
//! signatures under that type name.

use crate::extraction::chain::Extractor;
use crate::extraction::javalike;
use crate::extraction::{ExtractionContextBuilder, ExtractionRequest};

pub struct CollaboratorMethodExtractor;

impl Extractor for CollaboratorMethodExtractor {
    fn id(&self) -> &'static str {
        "collaborator_methods"
    }

    fn order(&self) -> i32 {
        700
    }

    fn supports(&self, request: &ExtractionRequest) -> bool {
        request.source_root.is_some()
    }

    fn extract(&self, request: &ExtractionRequest, builder: &mut ExtractionContextBuilder) {
        let Ok(test_source) = std::fs::read_to_string(&request.test_path) else {
            return;
        };
        let body = javalike::find_method(&test_source, &request.test_method_name)
            .map(|m| m.body_text(&test_source).to_string())
            .unwrap_or(test_source);
        let source_root = request.source_root.as_ref().unwrap();

        let mut seen = std::collections::HashSet::new();
        for (type_name, _var) in javalike::find_variable_declarations(&body) {
            let base = type_name.split('<').next().unwrap_or(&type_name).trim().to_string();
            if !seen.insert(base.clone()) {
                continue;
            }
            let Some(path) = javalike::find_sibling_file(source_root, &base) else {
                continue;
            };
            let Ok(source) = std::fs::read_to_string(&path) else {
                continue;
            };
            let methods = javalike::find_public_methods(&source)
                .into_iter()
                .map(|m| m.signature)
                .collect::<Vec<_>>();
            if !methods.is_empty() {
                builder.set_available_methods(base, methods);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn records_public_methods_of_resolved_collaborator() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("UserRepository.java"),
            "public class UserRepository {\n  public User findById(long id) { return null; }\n  private void helper() {}\n}\n",
        )
        .unwrap();
        let mut test_file = tempfile::Builder::new().suffix(".java").tempfile().unwrap();
        write!(
            test_file,
            "public class T {{\n  public void t() {{ UserRepository repo = new UserRepository(); }}\n}}\n"
        )
        .unwrap();
        let request = ExtractionRequest {
            test_path: test_file.path().to_path_buf(),
            test_method_name: "t".into(),
            source_root: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let mut builder = ExtractionContextBuilder::new();
        CollaboratorMethodExtractor.extract(&request, &mut builder);
        let ctx = builder.build();
        let methods = ctx.available_methods.get("UserRepository").unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "findById");
    }
}
