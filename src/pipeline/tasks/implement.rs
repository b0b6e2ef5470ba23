//! Order 100, required: drives the LM to fill in the method under test,
//! injects the result, and validates it by compiling and running the
//! single targeted test.

use crate::build::{format_compile_errors, format_test_failures};
use crate::extraction::ExtractionContext;
use crate::llm::extract_code;
use crate::pipeline::{PipelineState, Task, TaskDeps, TaskExecution};
use crate::writer::{WriteMode, WriteRequest};
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct ImplementTask;

#[async_trait]
impl Task for ImplementTask {
    fn id(&self) -> &'static str {
        "implement"
    }

    fn order(&self) -> i32 {
        100
    }

    fn required(&self) -> bool {
        true
    }

    fn should_run(&self, context: &ExtractionContext, _state: &PipelineState) -> bool {
        context.impl_path.is_some() && context.target_signature.is_some()
    }

    async fn execute(&self, context: &ExtractionContext, deps: &TaskDeps, state: &mut PipelineState) -> TaskExecution {
        let vars = template_vars(context, state);
        let prompt = match deps.template_engine.render("implement", &vars) {
            Ok(p) => p,
            Err(e) => return TaskExecution::failed(format!("rendering implement template: {e}")),
        };

        let response = match deps.lm_client.generate(&prompt).await {
            Ok(r) => r,
            Err(e) => return TaskExecution::failed(format!("language model request failed: {e}")),
        };

        let code = extract_code(&response);
        state.generated_code = Some(code.clone());

        if deps.dry_run {
            return TaskExecution::success("dry-run: generated code not written");
        }

        let impl_path = context.impl_path.clone().expect("should_run guarantees impl_path");
        let write_request = WriteRequest {
            path: impl_path.clone(),
            mode: WriteMode::Inject,
            method_name: context.target_signature.as_ref().unwrap().name.clone(),
            new_body: code.clone(),
            class_name: None,
            method_signature: None,
        };
        let write_result = deps.code_writer.write(&write_request);
        if !write_result.success {
            return TaskExecution::failed(write_result.error_message.unwrap_or_else(|| "write failed".to_string()));
        }

        let compile_result = deps.build_tool.compile(&deps.project_dir).await;
        if !compile_result.success {
            let message = format_compile_errors(&compile_result.errors);
            return match compile_result.errors.into_iter().next() {
                Some(err) => TaskExecution::failed_compile(message, err),
                None => TaskExecution::failed(if message.is_empty() { compile_result.raw_output } else { message }),
            };
        }

        let test_run = deps
            .build_tool
            .run_single_test(&deps.project_dir, &context.test_class_name, &context.test_method_name)
            .await;
        if !test_run.success {
            let message = format_test_failures(&test_run.failures);
            return match test_run.failures.into_iter().next() {
                Some(failure) => TaskExecution::failed_test(message, failure),
                None => TaskExecution::failed(if message.is_empty() { test_run.raw_output } else { message }),
            };
        }

        TaskExecution::success("test passed")
    }
}

pub(crate) fn template_vars(context: &ExtractionContext, state: &PipelineState) -> Value {
    let signature = context.target_signature.as_ref();
    let target_parameters = signature
        .map(|s| {
            s.parameters
                .iter()
                .map(|p| format!("{} {}", p.type_name, p.name))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    json!({
        "test_class_name": context.test_class_name,
        "test_method_name": context.test_method_name,
        "test_method_body": context.test_method_body,
        "target_method_name": signature.map(|s| s.name.as_str()).unwrap_or_default(),
        "target_return_type": signature.map(|s| s.return_type.as_str()).unwrap_or_default(),
        "target_parameters": target_parameters,
        "has_assertions": !context.assertions.is_empty(),
        "assertions": context.assertions,
        "has_mock_setups": !context.mock_setups.is_empty(),
        "mock_setups": context.mock_setups,
        "has_verify_statements": !context.verify_statements.is_empty(),
        "verify_statements": context.verify_statements,
        "has_hints": !context.hints.is_empty(),
        "hints": context.hints,
        "has_current_implementation": context.current_implementation.is_some(),
        "current_implementation": context.current_implementation.clone().unwrap_or_default(),
        "has_type_definitions": !context.type_definitions.is_empty(),
        "type_definitions": context.type_definitions.iter().map(|t| json!({
            "name": t.name,
            "fields": t.fields,
            "methods": t.methods.iter().map(|m| json!({"signature": m.display()})).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
        "has_available_methods": !context.available_methods.is_empty(),
        "available_methods": context.available_methods.iter().map(|(type_name, methods)| json!({
            "type_name": type_name,
            "methods": methods.iter().map(|m| json!({"signature": m.display()})).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
        "has_failed_attempts": !state.failed_attempts.is_empty(),
        "failed_attempts": state.failed_attempts.iter().map(|a| json!({
            "attempt_number": a.attempt_number,
            "generated_code": a.generated_code,
            "error_message": a.error_message,
            "compilation_errors": a.compilation_error.iter().map(|e| format_compile_errors(std::slice::from_ref(e))).collect::<Vec<_>>(),
            "test_failures": a.test_failure.iter().map(|f| format_test_failures(std::slice::from_ref(f))).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
    })
}
