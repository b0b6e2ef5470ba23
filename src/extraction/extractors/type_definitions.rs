//! Order 600 (type definitions): resolves non-primitive types referenced
//! in the test's variable declarations to sibling files under the source
//! root, skipping primitives and anything that doesn't resolve.

use crate::extraction::chain::Extractor;
use crate::extraction::javalike;
use crate::extraction::{ExtractionContextBuilder, ExtractionRequest, TypeDefinition};

const PRIMITIVES: &[&str] = &[
    "int", "long", "double", "float", "boolean", "char", "byte", "short", "void", "var",
];

pub struct TypeDefinitionExtractor;

impl Extractor for TypeDefinitionExtractor {
    fn id(&self) -> &'static str {
        "type_definitions"
    }

    fn order(&self) -> i32 {
        600
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
            let base = base_type_name(&type_name);
            if PRIMITIVES.contains(&base.as_str()) || !seen.insert(base.clone()) {
                continue;
            }
            let Some(path) = javalike::find_sibling_file(source_root, &base) else {
                continue;
            };
            let Ok(source) = std::fs::read_to_string(&path) else {
                continue;
            };
            let Some(name) = javalike::find_class_name(&source) else {
                continue;
            };
            builder.push_type_definition(TypeDefinition {
                name,
                fields: javalike::find_fields(&source),
                methods: javalike::find_all_methods(&source).into_iter().map(|m| m.signature).collect(),
            });
        }
    }
}

fn base_type_name(type_name: &str) -> String {
    type_name.split('<').next().unwrap_or(type_name).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolves_sibling_type_and_skips_primitives() {
        let dir = tempfile::tempdir().unwrap();
        let repo_path = dir.path().join("UserRepository.java");
        std::fs::write(
            &repo_path,
            "public class UserRepository {\n  public User findById(long id) { return null; }\n}\n",
        )
        .unwrap();
        let mut test_file = tempfile::Builder::new().suffix(".java").tempfile().unwrap();
        write!(
            test_file,
            "public class T {{\n  public void t() {{ int x = 1; UserRepository repo = new UserRepository(); }}\n}}\n"
        )
        .unwrap();
        let request = ExtractionRequest {
            test_path: test_file.path().to_path_buf(),
            test_method_name: "t".into(),
            source_root: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let mut builder = ExtractionContextBuilder::new();
        TypeDefinitionExtractor.extract(&request, &mut builder);
        let ctx = builder.build();
        assert_eq!(ctx.type_definitions.len(), 1);
        assert_eq!(ctx.type_definitions[0].name, "UserRepository");
    }
}
