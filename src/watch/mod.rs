//! Filesystem watch session: a `notify` watcher bridged into an async
//! channel, one independent debounce timer per changed path, a test-file
//! detector, a failing-test finder, and a dispatch into the pipeline.
//!
//! The bridge (`RecommendedWatcher` callback doing
//! `futures::executor::block_on` to push onto an unbounded channel rather
//! than notify's built-in debouncer) is the pattern the reference watcher
//! in this pack uses; it's kept here because this spec wants per-path, not
//! global, debounce timers.

use crate::pipeline::engine::{Pipeline, PipelineRequest};
use crate::pipeline::PipelineResult;
use crate::extraction::ExtractionRequest;
use futures::channel::mpsc::unbounded;
use futures::{SinkExt, StreamExt};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Callbacks a watch session reports lifecycle events through. All methods
/// have no-op defaults; implement only the ones you care about.
pub trait WatchCallbacks: Send + Sync {
    fn on_test_detected(&self, _target: &str) {}
    fn on_generation_started(&self, _target: &str) {}
    fn on_generation_complete(&self, _target: &str, _result: &PipelineResult) {}
    fn on_error(&self, _message: &str) {}
}

pub struct WatchRequest {
    pub project_dir: PathBuf,
    /// Directories to monitor; the session watches only the first (per
    /// "one session monitors exactly one directory").
    pub watch_paths: Vec<PathBuf>,
    pub ignore: Vec<String>,
    pub debounce: Duration,
    pub test_source_root: PathBuf,
    pub source_root: PathBuf,
    pub test_suffix: String,
    pub max_retries: u32,
    pub pipeline: Arc<Pipeline>,
    pub callbacks: Arc<dyn WatchCallbacks>,
}

/// A running watch session's handle.
pub struct WatchHandle {
    watched_directory: PathBuf,
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl WatchHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn watched_directory(&self) -> &Path {
        &self.watched_directory
    }

    /// Idempotent: halts the monitor and cancels pending debounced
    /// emissions. In-flight pipeline runs are allowed to finish.
    pub fn stop(&self) {
        self.cancel.cancel();
        self.running.store(false, Ordering::SeqCst);
    }
}

pub struct WatchSession;

impl WatchSession {
    pub fn start(request: WatchRequest) -> anyhow::Result<WatchHandle> {
        let watched_directory = request
            .watch_paths
            .first()
            .cloned()
            .unwrap_or_else(|| request.project_dir.clone());

        let running = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();

        let ignore_patterns: Vec<glob::Pattern> = request
            .ignore
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();

        let (mut tx, mut rx) = unbounded();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                futures::executor::block_on(async {
                    let _ = tx.send(res).await;
                });
            },
            Config::default(),
        )?;
        watcher.watch(&watched_directory, RecursiveMode::Recursive)?;
        info!(directory = %watched_directory.display(), "watch session started");

        let task_cancel = cancel.clone();
        let task_running = running.clone();
        let monitored_directory = watched_directory.clone();
        tokio::spawn(async move {
            // Keep the watcher alive for the duration of the session; it is
            // dropped (and stops watching) when this task exits.
            let _watcher = watcher;
            let pending: Arc<Mutex<HashMap<PathBuf, CancellationToken>>> = Arc::new(Mutex::new(HashMap::new()));

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    event = rx.next() => {
                        let Some(event) = event else { break };
                        let Ok(event) = event else { continue };
                        for path in event.paths {
                            if is_ignored(&path, &monitored_directory, &ignore_patterns) {
                                continue;
                            }
                            schedule_debounced(
                                path,
                                pending.clone(),
                                request.debounce,
                                task_cancel.clone(),
                                request.project_dir.clone(),
                                request.test_source_root.clone(),
                                request.source_root.clone(),
                                request.test_suffix.clone(),
                                request.max_retries,
                                request.pipeline.clone(),
                                request.callbacks.clone(),
                            );
                        }
                    }
                }
            }
            task_running.store(false, Ordering::SeqCst);
        });

        Ok(WatchHandle {
            watched_directory,
            running,
            cancel,
        })
    }
}

fn is_ignored(path: &Path, root: &Path, patterns: &[glob::Pattern]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    patterns.iter().any(|p| p.matches_path(relative))
}

#[allow(clippy::too_many_arguments)]
fn schedule_debounced(
    path: PathBuf,
    pending: Arc<Mutex<HashMap<PathBuf, CancellationToken>>>,
    debounce: Duration,
    session_cancel: CancellationToken,
    project_dir: PathBuf,
    test_source_root: PathBuf,
    source_root: PathBuf,
    test_suffix: String,
    max_retries: u32,
    pipeline: Arc<Pipeline>,
    callbacks: Arc<dyn WatchCallbacks>,
) {
    tokio::spawn(async move {
        let my_cancel = {
            let mut guard = pending.lock().await;
            if let Some(previous) = guard.insert(path.clone(), CancellationToken::new()) {
                previous.cancel();
            }
            guard.get(&path).unwrap().clone()
        };

        tokio::select! {
            _ = session_cancel.cancelled() => return,
            _ = my_cancel.cancelled() => return,
            _ = tokio::time::sleep(debounce) => {}
        }

        pending.lock().await.remove(&path);

        if !is_test_file(&path, &test_source_root, &test_suffix) {
            return;
        }

        on_test_file_settled(
            &path,
            &project_dir,
            &test_source_root,
            &source_root,
            max_retries,
            &pipeline,
            callbacks.as_ref(),
        )
        .await;
    });
}

fn is_test_file(path: &Path, test_source_root: &Path, test_suffix: &str) -> bool {
    path.starts_with(test_source_root)
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(test_suffix))
}

#[allow(clippy::too_many_arguments)]
async fn on_test_file_settled(
    path: &Path,
    project_dir: &Path,
    test_source_root: &Path,
    source_root: &Path,
    max_retries: u32,
    pipeline: &Pipeline,
    callbacks: &dyn WatchCallbacks,
) {
    let Some(test_class_name) = class_name_from_path(path, test_source_root) else {
        callbacks.on_error(&format!("could not derive class name from {}", path.display()));
        return;
    };

    info!(test_class = %test_class_name, "test file settled, looking for failing targets");
    let failing = match find_failing_targets(pipeline, project_dir, &test_class_name).await {
        Ok(targets) => targets,
        Err(e) => {
            warn!(test_class = %test_class_name, error = %e, "failing-test finder errored");
            callbacks.on_error(&format!("running {test_class_name}: {e}"));
            return;
        }
    };

    for (class_name, method_name) in failing {
        let target = format!("{class_name}#{method_name}");
        callbacks.on_test_detected(&target);
        callbacks.on_generation_started(&target);

        let impl_path = resolve_impl_path(path, test_source_root, source_root, &class_name);
        let request = PipelineRequest {
            project_dir: project_dir.to_path_buf(),
            extraction_request: ExtractionRequest {
                test_path: path.to_path_buf(),
                test_class_name: class_name.clone(),
                test_method_name: method_name,
                impl_path,
                target_method_name: None,
                source_root: Some(source_root.to_path_buf()),
            },
            max_retries,
            dry_run: false,
        };

        match pipeline.run(request).await {
            Ok(result) => callbacks.on_generation_complete(&target, &result),
            Err(e) => callbacks.on_error(&format!("pipeline run for {target}: {e}")),
        }
    }
}

/// Runs the test class through the build tool and returns its failing
/// `(class, method)` targets, without running the implement/refactor flow.
async fn find_failing_targets(
    pipeline: &Pipeline,
    project_dir: &Path,
    test_class_name: &str,
) -> anyhow::Result<Vec<(String, String)>> {
    let result = pipeline.run_tests_only(project_dir, test_class_name).await?;
    Ok(result
        .failures
        .into_iter()
        .map(|f| (f.class_name, f.method_name))
        .collect())
}

/// Best-effort: the test source root's relative path, dots for separators,
/// minus the file extension -- the conventional fully-qualified class name
/// for a file under a Java/Kotlin-style source tree.
fn class_name_from_path(path: &Path, source_root: &Path) -> Option<String> {
    let relative = path.strip_prefix(source_root).ok()?;
    let without_ext = relative.with_extension("");
    let parts: Vec<String> = without_ext.components().map(|c| c.as_os_str().to_string_lossy().to_string()).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

/// Heuristic: `<SourceRoot>/<same package path>/<ClassName minus "Test">.java`.
fn resolve_impl_path(test_path: &Path, test_source_root: &Path, source_root: &Path, test_class_name: &str) -> Option<PathBuf> {
    let relative = test_path.strip_prefix(test_source_root).ok()?;
    let impl_name = test_class_name.strip_suffix("Test")?;
    let extension = relative.extension()?.to_str()?.to_string();
    let mut impl_relative = relative.parent().map(PathBuf::from).unwrap_or_default();
    impl_relative.push(format!("{impl_name}.{extension}"));
    Some(source_root.join(impl_relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_fully_qualified_class_name_from_path() {
        let root = Path::new("/proj/src/test/java");
        let path = Path::new("/proj/src/test/java/com/example/CalculatorTest.java");
        assert_eq!(class_name_from_path(path, root).unwrap(), "com.example.CalculatorTest");
    }

    #[test]
    fn resolves_impl_path_by_stripping_test_suffix() {
        let test_root = Path::new("/proj/src/test/java");
        let source_root = Path::new("/proj/src/main/java");
        let test_path = Path::new("/proj/src/test/java/com/example/CalculatorTest.java");
        let resolved = resolve_impl_path(test_path, test_root, source_root, "com.example.CalculatorTest");
        assert_eq!(resolved, Some(PathBuf::from("/proj/src/main/java/com/example/Calculator.java")));
    }

    #[test]
    fn ignores_paths_matching_glob_patterns() {
        let patterns = vec![glob::Pattern::new("target/**").unwrap()];
        let root = Path::new("/proj");
        assert!(is_ignored(Path::new("/proj/target/classes/Foo.class"), root, &patterns));
        assert!(!is_ignored(Path::new("/proj/src/Foo.java"), root, &patterns));
    }
}
