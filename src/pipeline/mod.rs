//! Pipeline data model: the mutable per-run state tasks read from, the
//! immutable handles they're given, and the result shapes the engine
//! produces.
//!
//! Split per the REDESIGN FLAG in SPEC_FULL.md: `TaskDeps` carries shared
//! infrastructure handles (immutable, `Arc`-shared); `PipelineState`
//! carries only per-run mutation. Only the pipeline engine writes to
//! `PipelineState`; tasks read it (and hand back a `TaskExecution` for the
//! engine to apply).

pub mod engine;
pub mod tasks;

use crate::build::{BuildToolAdapter, CompilationError, TestFailure};
use crate::llm::LmClient;
use crate::template::TemplateEngine;
use crate::writer::CodeWriter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    Failed,
    Skipped,
    Reverted,
}

/// One recorded failure of the current task's current attempt, appended
/// in order so later attempts can reference all prior ones.
#[derive(Debug, Clone)]
pub struct FailedAttempt {
    pub attempt_number: u32,
    pub generated_code: String,
    pub error_message: String,
    pub compilation_error: Option<CompilationError>,
    pub test_failure: Option<TestFailure>,
}

#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineResult {
    pub success: bool,
    pub task_results: Vec<TaskResult>,
    pub modified_file: Option<PathBuf>,
    pub final_code: Option<String>,
}

impl PipelineResult {
    pub fn has_warnings(&self) -> bool {
        self.task_results.iter().any(|r| r.status == TaskStatus::Reverted)
    }
}

/// Per-run mutable state. Only the pipeline engine mutates this; tasks
/// read it and return a `TaskExecution` describing what happened.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub attempt: u32,
    pub max_retries: u32,
    pub failed_attempts: Vec<FailedAttempt>,
    pub generated_code: Option<String>,
    pub current_task: Option<String>,
    pub last_task_status: Option<TaskStatus>,
}

impl PipelineState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            attempt: 1,
            max_retries,
            failed_attempts: Vec::new(),
            generated_code: None,
            current_task: None,
            last_task_status: None,
        }
    }

    /// "Retry budget" is `max_retries` additional attempts beyond the
    /// first, so a task may execute up to `max_retries + 1` times.
    pub fn can_retry(&self) -> bool {
        self.attempt <= self.max_retries
    }

    pub(crate) fn begin_task(&mut self, task_id: &str) {
        self.current_task = Some(task_id.to_string());
        self.attempt = 1;
        self.failed_attempts.clear();
    }

    pub(crate) fn record_failure(&mut self, failure: FailedAttempt) {
        self.failed_attempts.push(failure);
        self.attempt += 1;
    }
}

/// Immutable, shared handles every task needs. Built once per pipeline run
/// from configuration; never mutated after construction.
pub struct TaskDeps {
    pub template_engine: Arc<TemplateEngine>,
    pub lm_client: Arc<dyn LmClient>,
    pub code_writer: Arc<CodeWriter>,
    pub build_tool: Arc<dyn BuildToolAdapter>,
    pub project_dir: PathBuf,
    pub dry_run: bool,
}

/// What a task's `execute` hands back for the engine to apply. Structured
/// compile/test detail is carried alongside the human-readable message so
/// the engine can build a `FailedAttempt` without knowing task internals.
pub struct TaskExecution {
    pub status: TaskStatus,
    pub message: String,
    pub compilation_error: Option<CompilationError>,
    pub test_failure: Option<TestFailure>,
}

impl TaskExecution {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Success,
            message: message.into(),
            compilation_error: None,
            test_failure: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            message: message.into(),
            compilation_error: None,
            test_failure: None,
        }
    }

    pub fn failed_compile(message: impl Into<String>, error: CompilationError) -> Self {
        Self {
            status: TaskStatus::Failed,
            message: message.into(),
            compilation_error: Some(error),
            test_failure: None,
        }
    }

    pub fn failed_test(message: impl Into<String>, failure: TestFailure) -> Self {
        Self {
            status: TaskStatus::Failed,
            message: message.into(),
            compilation_error: None,
            test_failure: Some(failure),
        }
    }
}

/// A unit of pipeline work: an `order`, a `should_run` predicate, a
/// required/optional flag, and an `execute` operation.
#[async_trait::async_trait]
pub trait Task: Send + Sync {
    fn id(&self) -> &'static str;
    fn order(&self) -> i32;
    fn required(&self) -> bool;
    fn should_run(
        &self,
        context: &crate::extraction::ExtractionContext,
        state: &PipelineState,
    ) -> bool;
    async fn execute(
        &self,
        context: &crate::extraction::ExtractionContext,
        deps: &TaskDeps,
        state: &mut PipelineState,
    ) -> TaskExecution;
}
