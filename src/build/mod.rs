//! Build tool adapters: recognize a project, launch its compile/test
//! tasks, and parse the resulting output into structured records.

pub mod gradle;
pub mod maven;

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationError {
    pub path: String,
    pub line: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFailure {
    pub class_name: String,
    pub method_name: String,
    pub message: Option<String>,
    pub stack_trace: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CompileResult {
    pub success: bool,
    pub errors: Vec<CompilationError>,
    pub raw_output: String,
}

#[derive(Debug, Clone, Default)]
pub struct TestRunResult {
    pub success: bool,
    pub failures: Vec<TestFailure>,
    pub raw_output: String,
}

/// Default per-operation timeout; process is killed on expiry.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

#[async_trait]
pub trait BuildToolAdapter: Send + Sync {
    fn id(&self) -> &'static str;
    /// Lower wins when more than one adapter claims support.
    fn order(&self) -> i32;
    fn supports(&self, project_dir: &Path) -> bool;
    /// The wrapper script path when present, else the system command.
    fn command(&self, project_dir: &Path) -> String;

    async fn compile(&self, project_dir: &Path) -> CompileResult;
    async fn run_tests(&self, project_dir: &Path, test_class: &str) -> TestRunResult;
    async fn run_single_test(&self, project_dir: &Path, test_class: &str, method: &str) -> TestRunResult;
}

/// Picks the first adapter whose `supports(project_dir)` holds, preferring
/// the lowest `order` on ties.
pub struct BuildToolResolver {
    adapters: Vec<Arc<dyn BuildToolAdapter>>,
}

impl BuildToolResolver {
    pub fn new(mut adapters: Vec<Arc<dyn BuildToolAdapter>>) -> Self {
        adapters.sort_by_key(|a| a.order());
        Self { adapters }
    }

    pub fn default_registry() -> Self {
        Self::new(vec![Arc::new(gradle::GradleAdapter), Arc::new(maven::MavenAdapter)])
    }

    /// Picks the first supporting adapter and hands back a shared handle,
    /// cheap to clone into a pipeline run's `TaskDeps`.
    pub fn resolve(&self, project_dir: &Path) -> Option<Arc<dyn BuildToolAdapter>> {
        self.adapters.iter().find(|a| a.supports(project_dir)).cloned()
    }
}

/// Runs `command arg0 arg1 ...` in `project_dir`, capturing stdout/stderr
/// line-by-line into one buffer, under a timeout that kills the child on
/// expiry.
pub(crate) async fn run_with_timeout(
    project_dir: &Path,
    command: &str,
    args: &[&str],
    timeout: Duration,
) -> (bool, String) {
    let mut cmd = Command::new(command);
    cmd.args(args)
        .current_dir(project_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => return (false, format!("failed to launch {command}: {e}")),
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let mut buf = String::new();

    let collect = async {
        if let Some(out) = stdout {
            let mut lines = BufReader::new(out).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                buf.push_str(&line);
                buf.push('\n');
            }
        }
        buf
    };

    let run = async {
        let mut out_buf = collect.await;
        if let Some(err) = stderr {
            let mut lines = BufReader::new(err).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                out_buf.push_str(&line);
                out_buf.push('\n');
            }
        }
        let status = child.wait().await;
        (status.map(|s| s.success()).unwrap_or(false), out_buf)
    };

    match tokio::time::timeout(timeout, run).await {
        Ok((ok, out)) => (ok, out),
        Err(_) => {
            warn!(command, "build tool operation timed out, killing child");
            (false, format!("timed out after {timeout:?}"))
        }
    }
}

/// Parses compile-error lines with the given regex, each capture group
/// ordered `(path, line, message)`.
pub(crate) fn parse_compile_errors(output: &str, re: &Regex) -> Vec<CompilationError> {
    re.captures_iter(output)
        .filter_map(|c| {
            let path = c.get(1)?.as_str().to_string();
            let line: u32 = c.get(2)?.as_str().parse().ok()?;
            let message = c.get(3)?.as_str().trim().to_string();
            Some(CompilationError { path, line, message })
        })
        .collect()
}

/// Parses JUnit-standard XML test reports from `reports_dir` into test
/// failures. Directory absence or unparseable files are treated as "no
/// failures found here" rather than raised.
pub(crate) fn parse_junit_reports(reports_dir: &Path) -> Vec<TestFailure> {
    let mut failures = Vec::new();
    let Ok(entries) = std::fs::read_dir(reports_dir) else {
        return failures;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("xml") {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Ok(doc) = roxmltree::Document::parse(&content) else {
            continue;
        };
        for testcase in doc.descendants().filter(|n| n.has_tag_name("testcase")) {
            let classname = testcase.attribute("classname").unwrap_or_default().to_string();
            let name = testcase.attribute("name").unwrap_or_default().to_string();
            let failure_node = testcase
                .children()
                .find(|n| n.has_tag_name("failure") || n.has_tag_name("error"));
            if let Some(node) = failure_node {
                failures.push(TestFailure {
                    class_name: classname,
                    method_name: name,
                    message: node.attribute("message").map(|s| s.to_string()),
                    stack_trace: node.text().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
                });
            }
        }
    }
    failures
}

/// Formats compile errors as `"path:line: message; path:line: message"`,
/// the shape the Implement task stores as the failed-attempt error.
pub fn format_compile_errors(errors: &[CompilationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}:{}: {}", e.path, e.line, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Formats test failures the same way.
pub fn format_test_failures(failures: &[TestFailure]) -> String {
    failures
        .iter()
        .map(|f| {
            format!(
                "{}#{}: {}",
                f.class_name,
                f.method_name,
                f.message.as_deref().unwrap_or("failed")
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) fn wrapper_or_system(project_dir: &Path, wrapper_name: &str, system_name: &str) -> String {
    let wrapper = project_dir.join(wrapper_name);
    if wrapper.is_file() {
        wrapper.to_string_lossy().to_string()
    } else {
        system_name.to_string()
    }
}

pub(crate) fn reports_glob(project_dir: &Path, rel: &str) -> PathBuf {
    project_dir.join(rel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_junit_report_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("TEST-CalculatorTest.xml"),
            r#"<testsuite tests="1" failures="1" errors="0">
                <testcase classname="CalculatorTest" name="testAdd">
                    <failure message="expected: &lt;5&gt; but was: &lt;0&gt;">stack trace here</failure>
                </testcase>
            </testsuite>"#,
        )
        .unwrap();
        let failures = parse_junit_reports(dir.path());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].class_name, "CalculatorTest");
        assert_eq!(failures[0].method_name, "testAdd");
        assert!(failures[0].message.as_deref().unwrap().contains("expected"));
    }

    #[test]
    fn passing_testcase_produces_no_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("TEST-CalculatorTest.xml"),
            r#"<testsuite tests="1" failures="0" errors="0">
                <testcase classname="CalculatorTest" name="testAdd"/>
            </testsuite>"#,
        )
        .unwrap();
        assert!(parse_junit_reports(dir.path()).is_empty());
    }
}
