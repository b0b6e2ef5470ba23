//! The task pipeline: resolves a build tool, builds an extraction
//! context, then runs each registered task in ascending `order`, with
//! inline retry for required tasks and snapshot/revert around each one.

use crate::backup::BackupStore;
use crate::build::BuildToolResolver;
use crate::error::JwrightError;
use crate::extraction::chain::ExtractorChain;
use crate::extraction::ExtractionRequest;
use crate::llm::LmClient;
use crate::pipeline::tasks::{implement::ImplementTask, refactor::RefactorTask};
use crate::pipeline::{FailedAttempt, PipelineResult, PipelineState, Task, TaskDeps, TaskResult, TaskStatus};
use crate::template::TemplateEngine;
use crate::writer::CodeWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub struct PipelineRequest {
    pub project_dir: PathBuf,
    pub extraction_request: ExtractionRequest,
    pub max_retries: u32,
    pub dry_run: bool,
}

pub struct Pipeline {
    tasks: Vec<Box<dyn Task>>,
    extractor_chain: ExtractorChain,
    build_resolver: BuildToolResolver,
    template_engine: Arc<TemplateEngine>,
    lm_client: Arc<dyn LmClient>,
    code_writer: Arc<CodeWriter>,
}

impl Pipeline {
    pub fn new(
        mut tasks: Vec<Box<dyn Task>>,
        extractor_chain: ExtractorChain,
        build_resolver: BuildToolResolver,
        template_engine: Arc<TemplateEngine>,
        lm_client: Arc<dyn LmClient>,
        code_writer: Arc<CodeWriter>,
    ) -> Self {
        tasks.sort_by_key(|t| t.order());
        Self {
            tasks,
            extractor_chain,
            build_resolver,
            template_engine,
            lm_client,
            code_writer,
        }
    }

    pub fn default_registry(
        template_engine: Arc<TemplateEngine>,
        lm_client: Arc<dyn LmClient>,
        code_writer: Arc<CodeWriter>,
    ) -> Self {
        Self::new(
            vec![Box::new(ImplementTask), Box::new(RefactorTask)],
            ExtractorChain::default_registry(),
            BuildToolResolver::default_registry(),
            template_engine,
            lm_client,
            code_writer,
        )
    }

    /// Runs the named test class through the resolved build tool without
    /// touching any implementation file, for the watch subsystem's
    /// failing-test finder.
    pub async fn run_tests_only(
        &self,
        project_dir: &std::path::Path,
        test_class_name: &str,
    ) -> Result<crate::build::TestRunResult, JwrightError> {
        let build_tool = self
            .build_resolver
            .resolve(project_dir)
            .ok_or_else(|| JwrightError::NoBuildTool(project_dir.display().to_string()))?;
        Ok(build_tool.run_tests(project_dir, test_class_name).await)
    }

    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineResult, JwrightError> {
        let build_tool = self.build_resolver.resolve(&request.project_dir).ok_or_else(|| {
            JwrightError::NoBuildTool(request.project_dir.display().to_string())
        })?;

        let context = self.extractor_chain.build(&request.extraction_request);
        let Some(impl_path) = context.impl_path.clone() else {
            return Err(JwrightError::NoImplFound(
                request
                    .extraction_request
                    .target_method_name
                    .clone()
                    .unwrap_or_else(|| request.extraction_request.test_method_name.clone()),
            ));
        };

        let deps = TaskDeps {
            template_engine: self.template_engine.clone(),
            lm_client: self.lm_client.clone(),
            code_writer: self.code_writer.clone(),
            build_tool,
            project_dir: request.project_dir.clone(),
            dry_run: request.dry_run,
        };

        let mut state = PipelineState::new(request.max_retries);
        let mut backup = BackupStore::new();
        let mut task_results = Vec::new();

        for task in &self.tasks {
            if !task.should_run(&context, &state) {
                task_results.push(TaskResult {
                    task_id: task.id().to_string(),
                    status: TaskStatus::Skipped,
                    message: "should_run returned false".to_string(),
                    attempts: 0,
                });
                continue;
            }

            backup.snapshot(&impl_path).map_err(JwrightError::Io)?;
            state.begin_task(task.id());

            loop {
                let execution = task.execute(&context, &deps, &mut state).await;
                match execution.status {
                    TaskStatus::Success => {
                        task_results.push(TaskResult {
                            task_id: task.id().to_string(),
                            status: TaskStatus::Success,
                            message: execution.message,
                            attempts: state.attempt,
                        });
                        state.last_task_status = Some(TaskStatus::Success);
                        break;
                    }
                    TaskStatus::Failed => {
                        if task.required() && state.can_retry() {
                            info!(task = task.id(), attempt = state.attempt, "attempt failed, retrying");
                            state.record_failure(FailedAttempt {
                                attempt_number: state.attempt,
                                generated_code: state.generated_code.clone().unwrap_or_default(),
                                error_message: execution.message,
                                compilation_error: execution.compilation_error,
                                test_failure: execution.test_failure,
                            });
                            continue;
                        }
                        if task.required() {
                            task_results.push(TaskResult {
                                task_id: task.id().to_string(),
                                status: TaskStatus::Failed,
                                message: execution.message,
                                attempts: state.attempt,
                            });
                            backup.revert_all().map_err(JwrightError::Io)?;
                            return Ok(PipelineResult {
                                success: false,
                                task_results,
                                modified_file: Some(impl_path.clone()),
                                final_code: state.generated_code,
                            });
                        }
                        warn!(task = task.id(), "optional task failed, reverting its changes");
                        backup.revert_last().map_err(JwrightError::Io)?;
                        task_results.push(TaskResult {
                            task_id: task.id().to_string(),
                            status: TaskStatus::Reverted,
                            message: execution.message,
                            attempts: state.attempt,
                        });
                        state.last_task_status = Some(TaskStatus::Reverted);
                        break;
                    }
                    // Tasks never hand back Skipped/Reverted directly; those
                    // transitions are the engine's to make.
                    TaskStatus::Skipped | TaskStatus::Reverted => unreachable!("task.execute must return Success or Failed"),
                }
            }
        }

        backup.commit();
        Ok(PipelineResult {
            success: true,
            task_results,
            modified_file: Some(impl_path),
            final_code: state.generated_code,
        })
    }
}
