//! YAML configuration, grounded in the teacher's `OrchestratorConfig`:
//! a `serde`-derived tree with per-field defaults, an `example()` for
//! `jwright init`, and a loader that falls back to defaults when no file
//! is present.

use crate::error::JwrightError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jwright: JwrightConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JwrightConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Default for JwrightConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            tasks: TasksConfig::default(),
            watch: WatchConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub ollama: ProviderSettings,
    #[serde(default)]
    pub openai: ProviderSettings,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            ollama: ProviderSettings {
                url: Some("http://localhost:11434".to_string()),
                model: Some("codellama".to_string()),
                timeout: Some(120),
                api_key_env: None,
            },
            openai: ProviderSettings {
                url: Some("https://api.openai.com/v1".to_string()),
                model: Some("gpt-4o-mini".to_string()),
                timeout: Some(120),
                api_key_env: Some("OPENAI_API_KEY".to_string()),
            },
        }
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderSettings {
    pub url: Option<String>,
    pub model: Option<String>,
    pub timeout: Option<u64>,
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TasksConfig {
    #[serde(default)]
    pub implement: ImplementTaskConfig,
    #[serde(default)]
    pub refactor: RefactorTaskConfig,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            implement: ImplementTaskConfig::default(),
            refactor: RefactorTaskConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImplementTaskConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_task_timeout")]
    pub timeout: u64,
}

impl Default for ImplementTaskConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout: default_task_timeout(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_task_timeout() -> u64 {
    180
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RefactorTaskConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RefactorTaskConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WatchConfig {
    #[serde(default = "default_watch_paths")]
    pub paths: Vec<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default = "default_debounce")]
    pub debounce: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            paths: default_watch_paths(),
            ignore: vec!["target".to_string(), "build".to_string(), ".git".to_string()],
            debounce: default_debounce(),
        }
    }
}

fn default_watch_paths() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_debounce() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathsConfig {
    #[serde(default = "default_source_path")]
    pub source: String,
    #[serde(default = "default_test_path")]
    pub test: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source_path(),
            test: default_test_path(),
        }
    }
}

fn default_source_path() -> String {
    "src/main/java".to_string()
}

fn default_test_path() -> String {
    "src/test/java".to_string()
}

impl Config {
    /// Canonical sample config, written out by `jwright init`.
    pub fn example() -> Self {
        Self {
            jwright: JwrightConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::example()
    }
}

/// Loads configuration from `path` if given, else
/// `<project_dir>/.jwright/config.yaml`, else falls back to `Config::default()`.
pub fn load_config(project_dir: &Path, path: Option<&Path>) -> Result<Config, JwrightError> {
    let resolved = match path {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let candidate = project_dir.join(".jwright").join("config.yaml");
            candidate.is_file().then_some(candidate)
        }
    };
    let Some(path) = resolved else {
        return Ok(Config::default());
    };
    let raw = std::fs::read_to_string(&path).map_err(JwrightError::Io)?;
    serde_yaml::from_str(&raw).map_err(|e| JwrightError::ConfigInvalid(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_defaults_when_no_file_present() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(dir.path(), None).unwrap();
        assert_eq!(cfg.jwright.llm.provider, "ollama");
        assert_eq!(cfg.jwright.tasks.implement.max_retries, 3);
        assert!(cfg.jwright.tasks.refactor.enabled);
    }

    #[test]
    fn loads_explicit_path_and_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        std::fs::write(
            &path,
            r#"
jwright:
  llm:
    provider: openai
  tasks:
    implement:
      max-retries: 5
"#,
        )
        .unwrap();
        let cfg = load_config(dir.path(), Some(&path)).unwrap();
        assert_eq!(cfg.jwright.llm.provider, "openai");
        assert_eq!(cfg.jwright.tasks.implement.max_retries, 5);
        // untouched fields keep their defaults
        assert_eq!(cfg.jwright.tasks.implement.timeout, 180);
    }

    #[test]
    fn discovers_config_under_dot_jwright_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".jwright")).unwrap();
        std::fs::write(
            dir.path().join(".jwright").join("config.yaml"),
            "jwright:\n  watch:\n    debounce: 750\n",
        )
        .unwrap();
        let cfg = load_config(dir.path(), None).unwrap();
        assert_eq!(cfg.jwright.watch.debounce, 750);
    }

    #[test]
    fn malformed_config_reports_config_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yml");
        std::fs::write(&path, "not: [valid yaml for this schema: :::").unwrap();
        let err = load_config(dir.path(), Some(&path)).unwrap_err();
        assert!(matches!(err, JwrightError::ConfigInvalid(_)));
    }
}
