//! magicpod-run: Start and watch Magic Pod batch runs from CI.
//!
//! This crate turns a flat set of pipeline settings into a Magic Pod batch
//! run, optionally waits for it to finish, and exports the result as
//! `KEY=VALUE` pairs for later pipeline steps.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Config**: Load raw settings from a TOML file or the environment
//! - **Normalize**: Validate settings against lookup tables into a [`RunConfiguration`]
//! - **Payload**: Build the batch-run request body
//! - **Client**: Talk to the Magic Pod API (upload, start, status)
//! - **Orchestrator**: Sequence upload, start, polling and export
//! - **Sink**: Publish results (stdout, envman, env file)
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use magicpod_run::client::MagicPodClient;
//! use magicpod_run::config::load_config;
//! use magicpod_run::normalize::{ParamTables, normalize};
//! use magicpod_run::orchestrator::{Orchestrator, PollPolicy};
//! use magicpod_run::report::NullReporter;
//! use magicpod_run::sink::StdoutSink;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = load_config(std::path::Path::new("magicpod.toml"))?;
//!     let tables = ParamTables::for_profile(settings.table_profile);
//!     let run_config = normalize(&settings, &tables)?;
//!     let client = MagicPodClient::new(
//!         &settings.base_url,
//!         &settings.magic_pod_api_token,
//!         &settings.organization_name,
//!         &settings.project_name,
//!         Duration::from_secs(settings.request_timeout_secs),
//!     )?;
//!     let outcome = Orchestrator::new(client, StdoutSink, NullReporter)
//!         .with_poll_policy(PollPolicy::from(&settings))
//!         .run(&run_config)
//!         .await?;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

pub mod archive;
pub mod batch_run;
pub mod client;
pub mod config;
pub mod normalize;
pub mod orchestrator;
pub mod payload;
pub mod report;
pub mod run_config;
pub mod sink;

// Re-export commonly used types
pub use batch_run::{BatchRun, RunStatus, TestCases, UploadedArtifact};
pub use client::{ApiError, BatchRunApi, MagicPodClient};
pub use config::{Settings, load_config, load_config_env};
pub use normalize::{ParamTables, ValidationErrors, normalize};
pub use orchestrator::{Orchestrator, Outcome, PollPolicy};
pub use payload::{BatchRunRequest, build_batch_run_request};
pub use report::Reporter;
pub use run_config::RunConfiguration;
pub use sink::ResultSink;
