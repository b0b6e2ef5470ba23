//! Gradle adapter: recognizes `build.gradle`/`build.gradle.kts`, prefers
//! the `./gradlew` wrapper, and understands both javac and kotlinc
//! compile-error dialects.

use super::{
    parse_compile_errors, parse_junit_reports, reports_glob, run_with_timeout, wrapper_or_system,
    BuildToolAdapter, CompileResult, TestRunResult, DEFAULT_TIMEOUT,
};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn javac_error_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(.+\.java):(\d+):\s*error:\s*(.+)$").unwrap())
}

fn kotlinc_error_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(.+\.kt):\s*\((\d+),\s*\d+\):\s*error:\s*(.+)$").unwrap())
}

pub struct GradleAdapter;

#[async_trait]
impl BuildToolAdapter for GradleAdapter {
    fn id(&self) -> &'static str {
        "gradle"
    }

    fn order(&self) -> i32 {
        0
    }

    fn supports(&self, project_dir: &Path) -> bool {
        project_dir.join("build.gradle").is_file() || project_dir.join("build.gradle.kts").is_file()
    }

    fn command(&self, project_dir: &Path) -> String {
        wrapper_or_system(project_dir, "gradlew", "gradle")
    }

    async fn compile(&self, project_dir: &Path) -> CompileResult {
        let command = self.command(project_dir);
        let (success, output) =
            run_with_timeout(project_dir, &command, &["compileJava", "compileTestJava"], DEFAULT_TIMEOUT).await;
        let mut errors = parse_compile_errors(&output, javac_error_re());
        errors.extend(parse_compile_errors(&output, kotlinc_error_re()));
        CompileResult {
            success: success && errors.is_empty(),
            errors,
            raw_output: output,
        }
    }

    async fn run_tests(&self, project_dir: &Path, test_class: &str) -> TestRunResult {
        let command = self.command(project_dir);
        let filter = format!("--tests={test_class}");
        let (success, output) = run_with_timeout(project_dir, &command, &["test", &filter], DEFAULT_TIMEOUT).await;
        self.collect_result(project_dir, success, output)
    }

    async fn run_single_test(&self, project_dir: &Path, test_class: &str, method: &str) -> TestRunResult {
        let command = self.command(project_dir);
        let filter = format!("--tests={test_class}.{method}");
        let (success, output) = run_with_timeout(project_dir, &command, &["test", &filter], DEFAULT_TIMEOUT).await;
        self.collect_result(project_dir, success, output)
    }
}

impl GradleAdapter {
    fn collect_result(&self, project_dir: &Path, exit_success: bool, output: String) -> TestRunResult {
        let reports_dir = reports_glob(project_dir, "build/test-results/test");
        let failures = parse_junit_reports(&reports_dir);
        TestRunResult {
            success: exit_success && failures.is_empty(),
            failures,
            raw_output: output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_build_gradle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("build.gradle"), "").unwrap();
        assert!(GradleAdapter.supports(dir.path()));
    }

    #[test]
    fn supports_kotlin_dsl() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("build.gradle.kts"), "").unwrap();
        assert!(GradleAdapter.supports(dir.path()));
    }

    #[test]
    fn prefers_wrapper_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gradlew"), "#!/bin/sh\n").unwrap();
        assert!(GradleAdapter.command(dir.path()).ends_with("gradlew"));
    }

    #[test]
    fn falls_back_to_system_gradle() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(GradleAdapter.command(dir.path()), "gradle");
    }
}
