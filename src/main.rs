//! magicpod-run CLI - Start and watch Magic Pod batch runs.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use magicpod_run::client::MagicPodClient;
use magicpod_run::config::{self, Settings};
use magicpod_run::normalize::{ParamTables, normalize};
use magicpod_run::orchestrator::{Orchestrator, PollPolicy};
use magicpod_run::report::{ConsoleReporter, summary_message};
use magicpod_run::run_config::RunConfiguration;
use magicpod_run::sink::sink_for;

#[derive(Parser)]
#[command(name = "magicpod-run")]
#[command(about = "Start and watch Magic Pod batch runs", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path; settings are read from the environment when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a batch run and, unless disabled, wait for its result
    Run,

    /// Validate settings without contacting Magic Pod
    Validate,

    /// Fetch an existing batch run and export its state
    Status {
        /// Batch run number
        run_number: u64,

        /// Keep polling until the run finishes
        #[arg(short, long)]
        wait: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries exported results.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => run_batch(settings, cli.verbose).await,
        Commands::Validate => validate_settings(&settings),
        Commands::Status { run_number, wait } => {
            check_status(settings, run_number, wait, cli.verbose).await
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => config::load_config_env().context("Failed to load settings from environment"),
    }
}

/// Normalizes settings, logging every rejected field and exiting on failure.
fn normalized_or_exit(settings: &Settings) -> RunConfiguration {
    let tables = ParamTables::for_profile(settings.table_profile);
    match normalize(settings, &tables) {
        Ok(run_config) => run_config,
        Err(errors) => {
            error!("{} invalid setting(s):", errors.len());
            for field_error in errors.iter() {
                error!("- {}", field_error);
            }
            std::process::exit(1);
        }
    }
}

fn build_client(settings: &Settings) -> Result<MagicPodClient> {
    MagicPodClient::new(
        &settings.base_url,
        &settings.magic_pod_api_token,
        &settings.organization_name,
        &settings.project_name,
        Duration::from_secs(settings.request_timeout_secs),
    )
    .context("Failed to create Magic Pod client")
}

async fn run_batch(settings: Settings, verbose: bool) -> Result<()> {
    let run_config = normalized_or_exit(&settings);

    info!("Settings:");
    for line in settings.summary() {
        info!("  {}", line);
    }

    let client = build_client(&settings)?;
    let orchestrator = Orchestrator::new(
        client,
        sink_for(&settings.export),
        ConsoleReporter::new(verbose),
    )
    .with_poll_policy(PollPolicy::from(&settings))
    .wait_for_result(settings.wait_for_result);

    let outcome = orchestrator.run(&run_config).await?;
    info!("{}", summary_message(&outcome));
    std::process::exit(outcome.exit_code());
}

fn validate_settings(settings: &Settings) -> Result<()> {
    let run_config = normalized_or_exit(settings);

    println!("Configuration is valid!");
    println!();
    println!("Run: {}", run_config);
    println!();
    println!("Settings:");
    for line in settings.summary() {
        println!("  {}", line);
    }

    Ok(())
}

async fn check_status(settings: Settings, run_number: u64, wait: bool, verbose: bool) -> Result<()> {
    let client = build_client(&settings)?;
    let orchestrator = Orchestrator::new(
        client,
        sink_for(&settings.export),
        ConsoleReporter::new(verbose),
    )
    .with_poll_policy(PollPolicy::from(&settings));

    let outcome = if wait {
        orchestrator.watch(run_number).await?
    } else {
        orchestrator.check(run_number).await?
    };
    info!("{}", summary_message(&outcome));
    std::process::exit(outcome.exit_code());
}
