//! Order 200, optional: a single, non-retried attempt to improve a method
//! that the implement task already got passing, without changing its
//! observable behavior.

use crate::extraction::ExtractionContext;
use crate::llm::extract_code;
use crate::pipeline::tasks::implement::template_vars;
use crate::pipeline::{PipelineState, Task, TaskDeps, TaskExecution, TaskStatus};
use crate::writer::{WriteMode, WriteRequest};
use async_trait::async_trait;

pub struct RefactorTask;

#[async_trait]
impl Task for RefactorTask {
    fn id(&self) -> &'static str {
        "refactor"
    }

    fn order(&self) -> i32 {
        200
    }

    fn required(&self) -> bool {
        false
    }

    fn should_run(&self, context: &ExtractionContext, state: &PipelineState) -> bool {
        state.last_task_status == Some(TaskStatus::Success)
            && state.generated_code.is_some()
            && context.impl_path.is_some()
            && context.target_signature.is_some()
    }

    async fn execute(&self, context: &ExtractionContext, deps: &TaskDeps, state: &mut PipelineState) -> TaskExecution {
        let vars = template_vars(context, state);
        let prompt = match deps.template_engine.render("refactor", &vars) {
            Ok(p) => p,
            Err(e) => return TaskExecution::failed(format!("rendering refactor template: {e}")),
        };

        let response = match deps.lm_client.generate(&prompt).await {
            Ok(r) => r,
            Err(e) => return TaskExecution::failed(format!("language model request failed: {e}")),
        };

        let code = extract_code(&response);

        if deps.dry_run {
            state.generated_code = Some(code);
            return TaskExecution::success("dry-run: refactor not written");
        }

        let impl_path = context.impl_path.clone().expect("should_run guarantees impl_path");
        let write_request = WriteRequest {
            path: impl_path,
            mode: WriteMode::Replace,
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
            return TaskExecution::failed(crate::build::format_compile_errors(&compile_result.errors));
        }

        let test_run = deps
            .build_tool
            .run_single_test(&deps.project_dir, &context.test_class_name, &context.test_method_name)
            .await;
        if !test_run.success {
            return TaskExecution::failed(crate::build::format_test_failures(&test_run.failures));
        }

        state.generated_code = Some(code);
        TaskExecution::success("refactor preserved passing test")
    }
}
