//! Error taxonomy for adapter boundaries.
//!
//! Everything below the CLI speaks in these closed, typed errors. `main.rs`
//! is the only place that collapses a `JwrightError` into a process exit
//! code.

use thiserror::Error;

/// Top-level error surfaced by the pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum JwrightError {
    #[error("no build tool recognizes project at {0}")]
    NoBuildTool(String),

    #[error("test not found: {0}")]
    NoTestFound(String),

    #[error("implementation target not found: {0}")]
    NoImplFound(String),

    #[error("context extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("code generation failed: {0}")]
    GenerationFailed(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl JwrightError {
    /// Maps this error to the exit code documented for the `implement`
    /// command. Exit 4 ("LM unavailable") is not reachable through this
    /// mapping -- it's a pre-flight check the CLI makes before the pipeline
    /// ever runs, since once the pipeline starts, task failures always
    /// surface as a `TaskResult`, never an `Err`.
    pub fn exit_code(&self) -> i32 {
        match self {
            JwrightError::ConfigInvalid(_) => 2,
            JwrightError::NoBuildTool(_) => 3,
            _ => 1,
        }
    }
}

/// Closed set of LM transport failure modes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LmError {
    #[error("request to language model timed out")]
    Timeout,
    #[error("language model endpoint unavailable")]
    Unavailable,
    #[error("language model rate-limited the request")]
    RateLimited,
    #[error("prompt exceeded the model's context window")]
    ContextExceeded,
    #[error("language model returned an unparseable response: {0}")]
    InvalidResponse(String),
    #[error("unclassified language model error: {0}")]
    Unknown(String),
}

impl From<LmError> for JwrightError {
    fn from(e: LmError) -> Self {
        let msg = match &e {
            LmError::Unavailable => format!("unavailable: {e}"),
            other => other.to_string(),
        };
        JwrightError::GenerationFailed(msg)
    }
}
