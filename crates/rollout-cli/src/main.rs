//! Rollout - release deployment orchestrator
//!
//! Usage:
//!   rollout deploy --target qa --artifact-dir artifacts
//!   rollout plan --target prod --skip-if-installed
//!   rollout validate --manifest project.json

mod confirm;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollout_core::config::{DeploySection, RolloutConfig};
use rollout_core::context::AppContext;
use rollout_core::deploy::{DeployOrchestrator, LogGroupMarkers};
use rollout_core::error::DeployError;
use rollout_core::manifest::{Manifest, validate_build_numbers};
use rollout_core::types::DeploymentMode;

use crate::confirm::confirm_deployment;

#[derive(Parser)]
#[command(name = "rollout")]
#[command(about = "Deploy built package artifacts into a target environment", long_about = None)]
struct Cli {
    /// Config file used instead of ./rollout.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install all queued packages into the target
    Deploy(DeployArgs),

    /// Show what a deployment would install, without installing
    Plan(PlanArgs),

    /// Validate a release manifest
    Validate {
        /// Manifest file to check
        #[arg(long)]
        manifest: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Only show failures
    Quiet,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogGroupStyle {
    /// `::group::` / `::endgroup::`
    Github,
    /// No markers
    None,
}

/// Options shared by `deploy` and `plan`. Flags override config values.
#[derive(Args)]
struct RunArgs {
    /// Target environment
    #[arg(short, long)]
    target: Option<String>,
    /// Directory holding artifacts
    #[arg(short, long)]
    artifact_dir: Option<PathBuf>,
    /// Deployment mode (normal, source-packages-only)
    #[arg(long)]
    mode: Option<String>,
    /// Trigger tests after installing packages with executable logic
    #[arg(long)]
    run_tests: bool,
    /// Skip packages already installed in the baseline
    #[arg(long)]
    skip_if_installed: bool,
    /// Minimum package coverage percentage
    #[arg(long)]
    coverage_threshold: Option<f64>,
    /// Wait time handed to install routines, in minutes
    #[arg(long, value_name = "MINUTES")]
    wait: Option<u64>,
    /// Current pipeline stage
    #[arg(long)]
    stage: Option<String>,
    /// Environment consulted for installed state (defaults to the target)
    #[arg(long)]
    baseline: Option<String>,
    /// Require promoted artifacts on non-sandbox targets
    #[arg(long)]
    check_promoted: bool,
    /// Retry a failed installation once
    #[arg(long)]
    retry_on_failure: bool,
    /// Delay before the retry, in seconds
    #[arg(long, value_name = "SECONDS")]
    retry_delay: Option<u64>,
    /// Project manifest used when no artifact carries one
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Log group markers around each package
    #[arg(long)]
    log_groups: Option<LogGroupStyle>,
}

#[derive(Args)]
struct DeployArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Skip the confirmation prompt for non-sandbox targets (for CI/CD)
    #[arg(short = 'y', long)]
    yes: bool,
    /// Output format
    #[arg(short = 'o', long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Args)]
struct PlanArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Output format
    #[arg(short = 'o', long, default_value = "table")]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::from_current_dir()?;
    let config = load_config(&ctx, cli.config)?;

    match cli.command {
        Commands::Deploy(args) => run_deploy(&ctx, config, args).await,
        Commands::Plan(args) => run_plan(&ctx, config, args).await,
        Commands::Validate { manifest } => run_validate(manifest),
    }
}

fn load_config(ctx: &AppContext, explicit: Option<PathBuf>) -> Result<RolloutConfig> {
    let mut store = ctx.config_store();
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        store = store.with_project_file(path);
    }
    store.load()
}

fn apply_args(section: &mut DeploySection, args: RunArgs) -> Result<()> {
    if let Some(target) = args.target {
        section.target = Some(target);
    }
    if let Some(dir) = args.artifact_dir {
        section.artifact_dir = Some(dir);
    }
    if let Some(mode) = args.mode {
        section.mode = Some(mode.parse::<DeploymentMode>()?);
    }
    if args.run_tests {
        section.run_tests = Some(true);
    }
    if args.skip_if_installed {
        section.skip_if_installed = Some(true);
    }
    if let Some(threshold) = args.coverage_threshold {
        if !(0.0..=100.0).contains(&threshold) {
            anyhow::bail!("Coverage threshold must be between 0 and 100, got {}", threshold);
        }
        section.coverage_threshold = Some(threshold);
    }
    if let Some(wait) = args.wait {
        section.wait_minutes = Some(wait);
    }
    if let Some(stage) = args.stage {
        section.stage = Some(stage);
    }
    if let Some(baseline) = args.baseline {
        section.baseline = Some(baseline);
    }
    if args.check_promoted {
        section.check_promoted = Some(true);
    }
    if args.retry_on_failure {
        section.retry_on_failure = Some(true);
    }
    if let Some(delay) = args.retry_delay {
        section.retry_delay_secs = Some(delay);
    }
    if let Some(manifest) = args.manifest {
        section.project_manifest = Some(manifest);
    }
    match args.log_groups {
        Some(LogGroupStyle::Github) => section.log_groups = Some(LogGroupMarkers::github()),
        Some(LogGroupStyle::None) => section.log_groups = None,
        None => {}
    }
    Ok(())
}

fn orchestrator_for(
    ctx: &AppContext,
    mut config: RolloutConfig,
    args: RunArgs,
) -> Result<DeployOrchestrator> {
    apply_args(&mut config.deploy, args)?;
    let options = ctx.deploy_options(&config)?;
    tracing::debug!(
        "Deploying {} into {} (retry delay {:?})",
        options.artifact_dir.display(),
        options.target,
        options.retry_delay
    );
    let collaborators = ctx.collaborators(&config.commands);
    Ok(DeployOrchestrator::new(options, collaborators))
}

/// Process exit code for a failed deployment: 2 for bad input, 1 otherwise.
fn exit_code_for(error: &DeployError) -> i32 {
    if error.is_configuration_error() { 2 } else { 1 }
}

async fn run_deploy(ctx: &AppContext, config: RolloutConfig, args: DeployArgs) -> Result<()> {
    let mut orchestrator = orchestrator_for(ctx, config, args.run)?;
    let target = orchestrator.options().target.clone();

    if !args.yes {
        let is_sandbox = orchestrator
            .inspector()
            .is_sandbox(&target)
            .await
            .with_context(|| format!("Failed to inspect target {}", target))?;
        if !is_sandbox && !confirm_deployment(&target)? {
            println!("Deployment cancelled.");
            return Ok(());
        }
    }

    let result = orchestrator.exec().await;

    match args.format {
        OutputFormat::Table => output::print_result_table(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Quiet => output::print_result_quiet(&result),
    }

    if let Some(err) = &result.error {
        eprintln!("Deployment to {} failed: {}", target, err);
        std::process::exit(exit_code_for(err));
    }
    Ok(())
}

async fn run_plan(ctx: &AppContext, config: RolloutConfig, args: PlanArgs) -> Result<()> {
    let mut orchestrator = orchestrator_for(ctx, config, args.run)?;
    let plan = orchestrator.plan().await?;

    match args.format {
        OutputFormat::Table => output::print_plan_table(&plan),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&output::plan_json(&plan))?
        ),
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn run_validate(path: PathBuf) -> Result<()> {
    let manifest = Manifest::from_path(&path)?;
    validate_build_numbers(&manifest)
        .with_context(|| format!("Manifest {} is invalid", path.display()))?;

    println!(
        "✓ Manifest {} is valid ({} packages)",
        path.display(),
        manifest.package_directories.len()
    );
    Ok(())
}
