#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use meandra_catalog::{CatalogConfig, DataCatalog};
use meandra_checkpoint::{CheckpointStore, FileCheckpointStore};
use meandra_core::{NodeRegistry, RunId, WorkflowSpec};
use meandra_runtime::{
    FailurePolicy, Orchestrator, OrchestratorConfig, RunContext, TracingReporter,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// Tracing target constants
const TRACING_TARGET_STARTUP: &str = "meandra_cli::startup";
const TRACING_TARGET_RUN: &str = "meandra_cli::run";

/// Exit status for runs aborted by an invalid workflow description or an
/// unsatisfiable dependency graph, before any node ran.
const EXIT_STRUCTURAL: i32 = 2;

/// Runs an already-built Meandra workflow.
#[derive(Debug, Parser)]
#[command(name = "meandra", version, about)]
struct Cli {
    /// Path to a serialized workflow description (JSON).
    workflow: PathBuf,

    /// Run identifier; a fresh one is generated when omitted.
    #[arg(long, env = "MEANDRA_RUN_ID")]
    run_id: Option<String>,

    /// Resume the run, reusing completed nodes from its checkpoints.
    /// Requires --run-id.
    #[arg(long, requires = "run_id")]
    resume: bool,

    /// Path to a catalog configuration (JSON). Defaults to a filesystem
    /// catalog rooted at ./data with no persistent keys.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory for checkpoint records.
    #[arg(long, default_value = "checkpoints")]
    checkpoints: PathBuf,

    /// Condition flag, as `name` or `name=true|false`. Repeatable.
    #[arg(long = "flag", value_name = "NAME[=BOOL]")]
    flags: Vec<String>,

    /// Maximum nodes executing concurrently within a level.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Stop dispatching a level's remaining nodes after a failure.
    #[arg(long)]
    fail_fast: bool,
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(error) => {
            if tracing::enabled!(tracing::Level::ERROR) {
                tracing::error!(
                    target: TRACING_TARGET_RUN,
                    error = %error,
                    "run aborted with error"
                );
            } else {
                eprintln!("Error: {error:#}");
            }
            1
        }
    };
    process::exit(code);
}

/// Main application entry point.
async fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    init_tracing();
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        workflow = %cli.workflow.display(),
        "starting meandra"
    );

    let workflow = load_workflow(&cli.workflow)?;
    let catalog = Arc::new(DataCatalog::new(load_catalog_config(cli.catalog.as_deref())?)?);
    let checkpoints = Arc::new(FileCheckpointStore::new(&cli.checkpoints));
    let registry = Arc::new(NodeRegistry::with_builtins());

    let run_id = match &cli.run_id {
        Some(id) => RunId::new(id),
        None => RunId::generate(),
    };
    if !cli.resume {
        let prior = checkpoints.load(&run_id).await?;
        anyhow::ensure!(
            prior.is_empty(),
            "run {run_id} already has checkpoint records; pass --resume to continue it \
             or pick a different --run-id"
        );
    }
    let mut ctx = RunContext::new(run_id.clone());
    for flag in &cli.flags {
        let (name, value) = parse_flag(flag)?;
        ctx = ctx.with_flag(name, value);
    }

    let config = OrchestratorConfig {
        max_workers: cli.workers,
        failure_policy: if cli.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::BestEffort
        },
    };

    let cancel_token = CancellationToken::new();
    spawn_signal_handler(cancel_token.clone());

    let orchestrator = Orchestrator::new(registry, catalog, checkpoints)
        .with_config(config)
        .with_reporter(Arc::new(TracingReporter))
        .with_cancel_token(cancel_token);

    tracing::info!(
        target: TRACING_TARGET_RUN,
        run_id = %run_id,
        resume = cli.resume,
        workers = cli.workers,
        "dispatching run"
    );

    match orchestrator.run(&workflow, &ctx).await {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(if summary.succeeded() { 0 } else { 1 })
        }
        Err(error) if error.is_structural() => {
            tracing::error!(
                target: TRACING_TARGET_RUN,
                run_id = %run_id,
                error = %error,
                "workflow rejected before execution"
            );
            Ok(EXIT_STRUCTURAL)
        }
        Err(error) => Err(error.into()),
    }
}

/// Loads a serialized workflow description.
fn load_workflow(path: &Path) -> anyhow::Result<WorkflowSpec> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read workflow {}", path.display()))?;
    let workflow: WorkflowSpec = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse workflow {}", path.display()))?;
    Ok(workflow)
}

/// Loads the catalog configuration, or builds the default filesystem one.
fn load_catalog_config(path: Option<&Path>) -> anyhow::Result<CatalogConfig> {
    let Some(path) = path else {
        return Ok(CatalogConfig::fs("data"));
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog config {}", path.display()))?;
    let config: CatalogConfig = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse catalog config {}", path.display()))?;
    Ok(config)
}

/// Parses a condition flag: `name` means true, `name=bool` is explicit.
fn parse_flag(flag: &str) -> anyhow::Result<(String, bool)> {
    match flag.split_once('=') {
        None => Ok((flag.to_owned(), true)),
        Some((name, value)) => {
            let value = value
                .parse::<bool>()
                .with_context(|| format!("invalid flag value in {flag:?}"))?;
            Ok((name.to_owned(), value))
        }
    }
}

/// Cancels the run on Ctrl-C; in-flight nodes finish and checkpoint.
fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(
                target: TRACING_TARGET_RUN,
                "interrupt received, letting in-flight nodes finish"
            );
            token.cancel();
        }
    });
}

/// Initializes tracing with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
