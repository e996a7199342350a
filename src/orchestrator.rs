//! Batch-run orchestration.
//!
//! The orchestrator drives one run from a validated [`RunConfiguration`] to a
//! terminal [`Outcome`]:
//!
//! ```text
//!   RunConfiguration
//!          │
//!          │ app source is an uploaded file?
//!          ▼
//!   ┌──────────────────┐  directory → zip_dir_async()
//!   │ UploadingArtifact│  api.upload()
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐  build_batch_run_request()
//!   │   StartingRun    │  api.start_batch_run()
//!   └────────┬─────────┘  export URL + run number
//!            │
//!            │ wait_for_result = false ──────────► Outcome::Started
//!            ▼
//!   ┌──────────────────┐  api.get_batch_run() every interval
//!   │     Polling      │  while status == running
//!   └────────┬─────────┘  (deadline reached ─────► Outcome::TimedOut)
//!            ▼
//!   Outcome::Succeeded | Outcome::Failed
//!            │
//!            ▼
//!   export status + tallies
//! ```
//!
//! Validation happens before an orchestrator is built: a
//! [`RunConfiguration`] only exists once every setting has been accepted.
//! Each step is fatal on error; nothing is retried.
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Run succeeded, or was started without waiting |
//! | 1 | Run finished in any other state, or the wait timed out |

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::archive::zip_dir_async;
use crate::batch_run::{BatchRun, RunStatus, UploadedArtifact};
use crate::client::BatchRunApi;
use crate::config::Settings;
use crate::payload::build_batch_run_request;
use crate::report::Reporter;
use crate::run_config::{AppSource, RunConfiguration};
use crate::sink::{ResultSink, keys};

/// Status token exported when the wait deadline expires.
pub const TIMED_OUT_STATUS: &str = "failed";

/// When to stop polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay between two status checks. No backoff.
    pub interval: Duration,
    /// Upper bound on the total wait; `None` polls until the run finishes.
    pub deadline: Option<Duration>,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn with_deadline(interval: Duration, deadline: Duration) -> Self {
        Self {
            interval,
            deadline: Some(deadline),
        }
    }

    /// Maximum number of status checks, `ceil(deadline / interval)` but at
    /// least one. `None` when unbounded. Slow responses can end the wait
    /// earlier: polling also stops once the deadline has elapsed.
    pub fn max_polls(&self) -> Option<u64> {
        self.deadline.map(|deadline| {
            let interval = self.interval.as_millis().max(1);
            let polls = deadline.as_millis().div_ceil(interval).max(1);
            u64::try_from(polls).unwrap_or(u64::MAX)
        })
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::unbounded(Self::DEFAULT_INTERVAL)
    }
}

impl From<&Settings> for PollPolicy {
    fn from(settings: &Settings) -> Self {
        let interval = Duration::from_secs(settings.poll_interval_secs.max(1));
        match settings.max_wait_secs {
            Some(max_wait) => Self::with_deadline(interval, Duration::from_secs(max_wait)),
            None => Self::unbounded(interval),
        }
    }
}

/// Terminal state of one invocation. Each variant carries the last observed
/// snapshot of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Started without waiting for the result.
    Started(BatchRun),
    Succeeded(BatchRun),
    /// Finished in any state other than `succeeded`.
    Failed(BatchRun),
    /// Still running when the wait deadline expired.
    TimedOut(BatchRun),
}

impl Outcome {
    fn classify(run: BatchRun) -> Self {
        match run.status {
            RunStatus::Succeeded => Self::Succeeded(run),
            _ => Self::Failed(run),
        }
    }

    pub fn batch_run(&self) -> &BatchRun {
        match self {
            Self::Started(run) | Self::Succeeded(run) | Self::Failed(run) | Self::TimedOut(run) => {
                run
            }
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, Self::Started(_) | Self::Succeeded(_))
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { 1 }
    }

    /// Status token exported for this outcome. A timed-out run reports
    /// [`TIMED_OUT_STATUS`] whatever the service last said.
    pub fn reported_status(&self) -> &str {
        match self {
            Self::TimedOut(_) => TIMED_OUT_STATUS,
            other => other.batch_run().status.as_str(),
        }
    }
}

/// Sequences upload, start, poll and export for one batch run.
pub struct Orchestrator<A, S, R> {
    api: A,
    sink: S,
    reporter: R,
    policy: PollPolicy,
    wait_for_result: bool,
}

impl<A, S, R> Orchestrator<A, S, R>
where
    A: BatchRunApi,
    S: ResultSink,
    R: Reporter,
{
    /// Creates an orchestrator that waits for the result with the default
    /// 15 second interval and no deadline.
    pub fn new(api: A, sink: S, reporter: R) -> Self {
        Self {
            api,
            sink,
            reporter,
            policy: PollPolicy::default(),
            wait_for_result: true,
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// When false, [`run`](Self::run) returns right after the run starts.
    pub fn wait_for_result(mut self, wait: bool) -> Self {
        self.wait_for_result = wait;
        self
    }

    /// Runs the whole workflow and exports the result.
    ///
    /// # Errors
    ///
    /// Archive, upload, start, poll and export failures are returned as-is
    /// with context; a run that finishes unsuccessfully is an `Ok` outcome.
    pub async fn run(&self, config: &RunConfiguration) -> Result<Outcome> {
        info!("Starting Magic Pod batch run for {}", config);

        let artifact = match &config.app_source {
            AppSource::UploadedFile { path, .. } => Some(self.upload_artifact(path).await?),
            _ => None,
        };

        let request = build_batch_run_request(config, artifact.as_ref())?;

        info!("Start batch run");
        let started = self
            .api
            .start_batch_run(&request)
            .await
            .context("Failed to start batch run")?;
        info!(
            "Batch run #{} has started. You can check detail progress on {}",
            started.batch_run_number, started.url
        );
        self.reporter.on_run_started(&started).await;

        self.sink.export(keys::TEST_URL, &started.url).await?;
        self.sink
            .export(keys::RUN_NUMBER, &started.batch_run_number.to_string())
            .await?;

        if !self.wait_for_result {
            info!("Not waiting for the result because wait_for_result is false");
            let outcome = Outcome::Started(started);
            self.reporter.on_run_complete(&outcome).await;
            return Ok(outcome);
        }

        self.watch(started.batch_run_number).await
    }

    /// Polls an already started run to a terminal outcome and exports it.
    pub async fn watch(&self, batch_run_number: u64) -> Result<Outcome> {
        let outcome = self.poll(batch_run_number).await?;
        self.export_result(&outcome).await?;
        self.reporter.on_run_complete(&outcome).await;
        Ok(outcome)
    }

    /// Fetches a run once and exports whatever state it is in. A run that is
    /// still going is not a success.
    pub async fn check(&self, batch_run_number: u64) -> Result<Outcome> {
        let run = self
            .api
            .get_batch_run(batch_run_number)
            .await
            .with_context(|| format!("Failed to fetch batch run #{}", batch_run_number))?;
        let outcome = Outcome::classify(run);
        self.export_result(&outcome).await?;
        self.reporter.on_run_complete(&outcome).await;
        Ok(outcome)
    }

    async fn upload_artifact(&self, path: &Path) -> Result<UploadedArtifact> {
        let upload_path = if path.is_dir() {
            zip_dir_async(path.to_path_buf())
                .await
                .with_context(|| format!("Failed to archive app directory {}", path.display()))?
        } else {
            path.to_path_buf()
        };

        info!(
            "Upload app file {} to Magic Pod cloud",
            upload_path.display()
        );
        let artifact = self
            .api
            .upload(&upload_path)
            .await
            .with_context(|| format!("Failed to upload app file {}", upload_path.display()))?;
        info!("Done. File number = {}", artifact.file_no);
        self.reporter.on_upload_complete(&artifact).await;

        Ok(artifact)
    }

    async fn poll(&self, batch_run_number: u64) -> Result<Outcome> {
        info!("Waiting for the test result ...");
        let max_polls = self.policy.max_polls();
        let started = tokio::time::Instant::now();
        let mut polls: u64 = 0;

        loop {
            let run = self
                .api
                .get_batch_run(batch_run_number)
                .await
                .with_context(|| format!("Failed to fetch batch run #{}", batch_run_number))?;
            polls += 1;
            self.reporter.on_poll(&run).await;

            if !run.status.is_running() {
                return Ok(Outcome::classify(run));
            }

            let deadline_passed = self
                .policy
                .deadline
                .is_some_and(|deadline| started.elapsed() >= deadline);
            if deadline_passed || max_polls.is_some_and(|max| polls >= max) {
                warn!(
                    "Batch run #{} is still running after {} status checks; giving up",
                    batch_run_number, polls
                );
                return Ok(Outcome::TimedOut(run));
            }

            tokio::time::sleep(self.policy.interval).await;
        }
    }

    async fn export_result(&self, outcome: &Outcome) -> Result<()> {
        let tallies = outcome.batch_run().test_cases;
        self.sink
            .export(keys::STATUS, outcome.reported_status())
            .await?;
        self.sink
            .export(keys::SUCCEEDED_COUNT, &tallies.succeeded.to_string())
            .await?;
        self.sink
            .export(keys::FAILED_COUNT, &tallies.failed.to_string())
            .await?;
        self.sink
            .export(keys::TOTAL_COUNT, &tallies.total.to_string())
            .await?;
        Ok(())
    }
}
