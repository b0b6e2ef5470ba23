//! Extraction data model: the immutable request/context pair the rest of
//! the pipeline builds prompts and writes from.

pub mod chain;
pub mod extractors;
pub mod javalike;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Input to the extractor chain. `test_path` must exist; every other field
/// may be left unset for partial uses (e.g. extractor unit tests).
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    pub test_path: PathBuf,
    pub test_class_name: String,
    pub test_method_name: String,
    pub impl_path: Option<PathBuf>,
    pub target_method_name: Option<String>,
    pub source_root: Option<PathBuf>,
}

/// One assertion call found in the test body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assertion {
    pub kind: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub message: Option<String>,
}

/// A `when(mock.method(args)).thenReturn(value)` pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MockSetup {
    pub mock_object: String,
    pub method_call: String,
    pub return_value: String,
}

/// A `verify(mock[, times]).method(args)` pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyStatement {
    pub mock_object: String,
    pub method_call: String,
    pub times: String,
}

/// `returnType name(type1, type2, ...)`, stripped of bodies and modifiers
/// beyond the signature itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
}

impl MethodSignature {
    /// Rendered as `returnType name(type a, type b)`, the form the
    /// templates embed directly.
    pub fn display(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.type_name, p.name))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} {}({})", self.return_type, self.name, params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub type_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: String,
    pub fields: Vec<String>,
    pub methods: Vec<MethodSignature>,
}

/// Immutable, shared-read aggregate built once by the extractor chain.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    pub test_class_name: String,
    pub test_method_name: String,
    pub test_method_body: String,
    pub assertions: Vec<Assertion>,
    pub mock_setups: Vec<MockSetup>,
    pub verify_statements: Vec<VerifyStatement>,
    pub hints: Vec<String>,
    pub target_signature: Option<MethodSignature>,
    pub current_implementation: Option<String>,
    pub type_definitions: Vec<TypeDefinition>,
    pub available_methods: BTreeMap<String, Vec<MethodSignature>>,
    /// Resolved by the target-method extractor; the implement task writes
    /// into this file and the build-tool adapter compiles it.
    pub impl_path: Option<PathBuf>,
    pub impl_class_name: Option<String>,
}

/// Accumulates fragments pushed by extractors, then freezes into a context.
/// Each extractor method is additive; nothing here ever removes a fragment
/// another extractor already contributed.
#[derive(Debug, Default)]
pub struct ExtractionContextBuilder {
    ctx: ExtractionContext,
}

impl ExtractionContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_test_identity(&mut self, class_name: String, method_name: String, body: String) {
        self.ctx.test_class_name = class_name;
        self.ctx.test_method_name = method_name;
        self.ctx.test_method_body = body;
    }

    pub fn push_assertion(&mut self, assertion: Assertion) {
        self.ctx.assertions.push(assertion);
    }

    pub fn push_mock_setup(&mut self, setup: MockSetup) {
        self.ctx.mock_setups.push(setup);
    }

    pub fn push_verify_statement(&mut self, verify: VerifyStatement) {
        self.ctx.verify_statements.push(verify);
    }

    pub fn push_hint(&mut self, hint: String) {
        self.ctx.hints.push(hint);
    }

    pub fn set_target_signature(&mut self, sig: MethodSignature) {
        self.ctx.target_signature = Some(sig);
    }

    pub fn set_current_implementation(&mut self, body: String) {
        self.ctx.current_implementation = Some(body);
    }

    pub fn push_type_definition(&mut self, def: TypeDefinition) {
        self.ctx.type_definitions.push(def);
    }

    pub fn set_available_methods(&mut self, type_name: String, methods: Vec<MethodSignature>) {
        self.ctx.available_methods.insert(type_name, methods);
    }

    pub fn set_impl_path(&mut self, path: PathBuf) {
        self.ctx.impl_path = Some(path);
    }

    pub fn set_impl_class_name(&mut self, name: String) {
        self.ctx.impl_class_name = Some(name);
    }

    /// Consumes the builder, producing the frozen context.
    pub fn build(self) -> ExtractionContext {
        self.ctx
    }
}
