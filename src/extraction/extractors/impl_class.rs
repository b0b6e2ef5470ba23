//! Order 510 (implementation analysis): records the implementation class
//! itself as a `TypeDefinition` -- all fields and all method signatures.

use crate::extraction::chain::Extractor;
use crate::extraction::javalike;
use crate::extraction::{ExtractionContextBuilder, ExtractionRequest, TypeDefinition};

pub struct ImplClassExtractor;

impl Extractor for ImplClassExtractor {
    fn id(&self) -> &'static str {
        "impl_class"
    }

    fn order(&self) -> i32 {
        510
    }

    fn supports(&self, request: &ExtractionRequest) -> bool {
        request.impl_path.is_some()
    }

    fn extract(&self, request: &ExtractionRequest, builder: &mut ExtractionContextBuilder) {
        let impl_path = request.impl_path.as_ref().unwrap();
        let Ok(source) = std::fs::read_to_string(impl_path) else {
            return;
        };
        let Some(name) = javalike::find_class_name(&source) else {
            return;
        };
        let fields = javalike::find_fields(&source);
        let methods = javalike::find_all_methods(&source)
            .into_iter()
            .map(|m| m.signature)
            .collect();
        builder.push_type_definition(TypeDefinition {
            name,
            fields,
            methods,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_fields_and_methods() {
        let mut file = tempfile::Builder::new().suffix(".java").tempfile().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"public class Calculator {\n  private int total;\n  public int add(int a, int b) { return a + b; }\n}\n",
        )
        .unwrap();
        let request = ExtractionRequest {
            impl_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let mut builder = ExtractionContextBuilder::new();
        ImplClassExtractor.extract(&request, &mut builder);
        let ctx = builder.build();
        assert_eq!(ctx.type_definitions.len(), 1);
        assert_eq!(ctx.type_definitions[0].name, "Calculator");
        assert_eq!(ctx.type_definitions[0].fields, vec!["int total".to_string()]);
        assert_eq!(ctx.type_definitions[0].methods[0].name, "add");
    }
}
