//! Maven adapter: recognizes `pom.xml`, prefers the `./mvnw` wrapper,
//! surefire reports under `target/surefire-reports`.

use super::{
    parse_compile_errors, parse_junit_reports, reports_glob, run_with_timeout, wrapper_or_system,
    BuildToolAdapter, CompileResult, TestRunResult, DEFAULT_TIMEOUT,
};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// The compiler-plugin dialect: `[ERROR] /path/File.java:[12,5] message`.
fn plugin_error_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\[ERROR\]\s+(.+\.java):\[(\d+),\d+\]\s*(.+)$").unwrap())
}

/// The bare javac dialect some Maven setups emit directly:
/// `/path/File.java:12: error: message`.
fn javac_error_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(.+\.java):(\d+):\s*error:\s*(.+)$").unwrap())
}

pub struct MavenAdapter;

#[async_trait]
impl BuildToolAdapter for MavenAdapter {
    fn id(&self) -> &'static str {
        "maven"
    }

    fn order(&self) -> i32 {
        10
    }

    fn supports(&self, project_dir: &Path) -> bool {
        project_dir.join("pom.xml").is_file()
    }

    fn command(&self, project_dir: &Path) -> String {
        wrapper_or_system(project_dir, "mvnw", "mvn")
    }

    async fn compile(&self, project_dir: &Path) -> CompileResult {
        let command = self.command(project_dir);
        let (success, output) =
            run_with_timeout(project_dir, &command, &["compile", "test-compile"], DEFAULT_TIMEOUT).await;
        let mut errors = parse_compile_errors(&output, plugin_error_re());
        errors.extend(parse_compile_errors(&output, javac_error_re()));
        CompileResult {
            success: success && errors.is_empty(),
            errors,
            raw_output: output,
        }
    }

    async fn run_tests(&self, project_dir: &Path, test_class: &str) -> TestRunResult {
        let command = self.command(project_dir);
        let dtest = format!("-Dtest={test_class}");
        let (success, output) = run_with_timeout(project_dir, &command, &["test", &dtest], DEFAULT_TIMEOUT).await;
        self.collect_result(project_dir, success, output)
    }

    async fn run_single_test(&self, project_dir: &Path, test_class: &str, method: &str) -> TestRunResult {
        let command = self.command(project_dir);
        let dtest = format!("-Dtest={test_class}#{method}");
        let (success, output) = run_with_timeout(project_dir, &command, &["test", &dtest], DEFAULT_TIMEOUT).await;
        self.collect_result(project_dir, success, output)
    }
}

impl MavenAdapter {
    fn collect_result(&self, project_dir: &Path, exit_success: bool, output: String) -> TestRunResult {
        let reports_dir = reports_glob(project_dir, "target/surefire-reports");
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
    fn supports_pom_xml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        assert!(MavenAdapter.supports(dir.path()));
    }

    #[test]
    fn does_not_support_gradle_project() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("build.gradle"), "").unwrap();
        assert!(!MavenAdapter.supports(dir.path()));
    }

    #[test]
    fn parses_plugin_style_compile_errors() {
        let output = "[ERROR] /src/main/java/Calculator.java:[3,24] ';' expected";
        let errors = parse_compile_errors(output, plugin_error_re());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
        assert!(errors[0].message.contains("expected"));
    }
}
