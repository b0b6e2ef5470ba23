use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod backup;
mod build;
mod config;
mod error;
mod extraction;
mod llm;
mod pipeline;
mod template;
mod watch;
mod writer;

use config::Config;
use error::JwrightError;
use extraction::javalike;
use extraction::ExtractionRequest;
use llm::mock::MockLmClient;
use llm::ollama::OllamaClient;
use llm::openai::OpenAiClient;
use llm::LmClient;
use pipeline::engine::{Pipeline, PipelineRequest};
use template::TemplateEngine;
use watch::{WatchCallbacks, WatchRequest, WatchSession};
use writer::CodeWriter;

#[derive(Parser, Debug)]
#[command(
    name = "jwright",
    version,
    about = "AI-assisted TDD engine: extracts test context, drives an LLM to implement the method under test, compiles and runs it, and retries with feedback."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scaffold .jwright/config.yaml and .jwright/templates/ with bundled defaults
    Init {
        #[arg(long = "dir", default_value = ".")]
        dir: PathBuf,
    },
    /// Implement the method exercised by TestClass#testMethod
    Implement {
        /// e.g. CalculatorTest#testAdd
        target: String,
        #[arg(long = "dir", default_value = ".")]
        dir: PathBuf,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        no_refactor: bool,
        #[arg(short, long)]
        verbose: bool,
        #[arg(short, long)]
        quiet: bool,
        #[arg(long)]
        trace: bool,
    },
    /// Watch test sources and implement failing tests as they settle
    Watch {
        #[arg(long = "dir", default_value = ".")]
        dir: PathBuf,
        #[arg(long, value_delimiter = ',')]
        path: Vec<PathBuf>,
        #[arg(long)]
        debounce: Option<u64>,
        #[arg(short, long)]
        verbose: bool,
        #[arg(short, long)]
        quiet: bool,
    },
}

fn init_tracing(verbose: bool, quiet: bool, trace: bool) {
    let level = if trace {
        "trace"
    } else if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt().with_env_filter(filter).without_time().try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Init { dir } => cmd_init(&dir),
        Commands::Implement {
            target,
            dir,
            dry_run,
            no_refactor,
            verbose,
            quiet,
            trace,
        } => {
            init_tracing(verbose, quiet, trace);
            cmd_implement(&dir, &target, dry_run, no_refactor).await
        }
        Commands::Watch {
            dir,
            path,
            debounce,
            verbose,
            quiet,
        } => {
            init_tracing(verbose, quiet, false);
            cmd_watch(&dir, path, debounce).await
        }
    }
}

fn cmd_init(dir: &Path) -> Result<i32> {
    let jwright_dir = dir.join(".jwright");
    std::fs::create_dir_all(&jwright_dir)?;
    let config_path = jwright_dir.join("config.yaml");
    let yaml = serde_yaml::to_string(&Config::example())?;
    std::fs::write(&config_path, yaml)?;
    template::write_bundled_templates(&jwright_dir.join("templates"))?;
    println!("Wrote {}", config_path.display());
    println!("Wrote {}", jwright_dir.join("templates").display());
    Ok(0)
}

async fn cmd_implement(dir: &Path, target: &str, dry_run: bool, no_refactor: bool) -> Result<i32> {
    let (test_class_name, test_method_name) = target
        .split_once('#')
        .map(|(c, m)| (c.to_string(), m.to_string()))
        .ok_or_else(|| anyhow!("target must be of the form TestClass#testMethod, got '{target}'"))?;

    let cfg = match config::load_config(dir, None) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            return Ok(e.exit_code());
        }
    };

    let source_root = dir.join(&cfg.jwright.paths.source);
    let test_source_root = dir.join(&cfg.jwright.paths.test);

    let simple_test_name = test_class_name.rsplit('.').next().unwrap_or(&test_class_name);
    let Some(test_path) = javalike::find_sibling_file(&test_source_root, simple_test_name) else {
        error!("test class {simple_test_name} not found under {}", test_source_root.display());
        return Ok(JwrightError::NoTestFound(test_class_name.clone()).exit_code());
    };

    let impl_simple_name = simple_test_name.strip_suffix("Test").unwrap_or(simple_test_name);
    let impl_path = javalike::find_sibling_file(&source_root, impl_simple_name);

    let lm_client = match build_lm_client(&cfg) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return Ok(JwrightError::from(e).exit_code());
        }
    };

    if !lm_client.is_available().await {
        error!(provider = %cfg.jwright.llm.provider, "language model endpoint is not reachable");
        return Ok(4);
    }

    let template_engine = Arc::new(TemplateEngine::new(dir.to_path_buf()));
    let code_writer = Arc::new(CodeWriter::new());

    let mut tasks: Vec<Box<dyn pipeline::Task>> = vec![Box::new(pipeline::tasks::implement::ImplementTask)];
    if !no_refactor && cfg.jwright.tasks.refactor.enabled {
        tasks.push(Box::new(pipeline::tasks::refactor::RefactorTask));
    }
    let pipeline = Pipeline::new(
        tasks,
        extraction::chain::ExtractorChain::default_registry(),
        build::BuildToolResolver::default_registry(),
        template_engine,
        lm_client,
        code_writer,
    );

    let request = PipelineRequest {
        project_dir: dir.to_path_buf(),
        extraction_request: ExtractionRequest {
            test_path,
            test_class_name,
            test_method_name,
            impl_path,
            target_method_name: None,
            source_root: Some(source_root),
        },
        max_retries: cfg.jwright.tasks.implement.max_retries,
        dry_run,
    };

    match pipeline.run(request).await {
        Ok(result) => {
            for task in &result.task_results {
                info!(task = %task.task_id, status = ?task.status, attempts = task.attempts, "{}", task.message);
            }
            if result.success {
                println!("implement succeeded");
                Ok(0)
            } else {
                println!("implement failed");
                Ok(1)
            }
        }
        Err(e) => {
            error!("{e}");
            Ok(e.exit_code())
        }
    }
}

async fn cmd_watch(dir: &Path, extra_paths: Vec<PathBuf>, debounce_override: Option<u64>) -> Result<i32> {
    let cfg = config::load_config(dir, None).map_err(|e| anyhow!("{e}"))?;

    let watch_paths = if extra_paths.is_empty() {
        cfg.jwright.watch.paths.iter().map(|p| dir.join(p)).collect()
    } else {
        extra_paths
    };
    let debounce = Duration::from_millis(debounce_override.unwrap_or(cfg.jwright.watch.debounce));

    let lm_client = build_lm_client(&cfg).context("building LM client")?;
    let template_engine = Arc::new(TemplateEngine::new(dir.to_path_buf()));
    let code_writer = Arc::new(CodeWriter::new());
    let pipeline = Arc::new(Pipeline::default_registry(template_engine, lm_client, code_writer));

    let request = WatchRequest {
        project_dir: dir.to_path_buf(),
        watch_paths,
        ignore: cfg.jwright.watch.ignore.clone(),
        debounce,
        test_source_root: dir.join(&cfg.jwright.paths.test),
        source_root: dir.join(&cfg.jwright.paths.source),
        test_suffix: "Test.java".to_string(),
        max_retries: cfg.jwright.tasks.implement.max_retries,
        pipeline,
        callbacks: Arc::new(LoggingCallbacks),
    };

    let handle = WatchSession::start(request)?;
    info!(directory = %handle.watched_directory().display(), "watching for changes; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    handle.stop();
    Ok(0)
}

struct LoggingCallbacks;

impl WatchCallbacks for LoggingCallbacks {
    fn on_test_detected(&self, target: &str) {
        info!(target, "failing test detected");
    }
    fn on_generation_started(&self, target: &str) {
        info!(target, "generation started");
    }
    fn on_generation_complete(&self, target: &str, result: &pipeline::PipelineResult) {
        info!(target, success = result.success, "generation complete");
    }
    fn on_error(&self, message: &str) {
        error!("{message}");
    }
}

fn build_lm_client(cfg: &Config) -> std::result::Result<Arc<dyn LmClient>, error::LmError> {
    match cfg.jwright.llm.provider.as_str() {
        "mock" => Ok(Arc::new(MockLmClient::always("return 0;"))),
        "openai" => {
            let settings = &cfg.jwright.llm.openai;
            let url = settings.url.clone().unwrap_or_else(|| "https://api.openai.com/v1".to_string());
            let model = settings.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string());
            let timeout = Duration::from_secs(settings.timeout.unwrap_or(120));
            let api_key_env = settings.api_key_env.clone().unwrap_or_else(|| "OPENAI_API_KEY".to_string());
            let api_key = std::env::var(&api_key_env).unwrap_or_default();
            let client = OpenAiClient::new(url, model, api_key, timeout)
                .map_err(|e| error::LmError::Unknown(e.to_string()))?;
            Ok(Arc::new(client))
        }
        _ => {
            let settings = &cfg.jwright.llm.ollama;
            let url = settings.url.clone().unwrap_or_else(|| "http://localhost:11434".to_string());
            let model = settings.model.clone().unwrap_or_else(|| "codellama".to_string());
            let timeout = Duration::from_secs(settings.timeout.unwrap_or(120));
            let client = OllamaClient::new(url, model, timeout).map_err(|e| error::LmError::Unknown(e.to_string()))?;
            Ok(Arc::new(client))
        }
    }
}
