//! Progress reporting and console output.
//!
//! Reporters write to stderr; stdout belongs to the `stdout` result sink.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::batch_run::{BatchRun, UploadedArtifact};
use crate::orchestrator::Outcome;

/// A reporter receives events while a batch run is driven.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Called when the app file has been uploaded.
    async fn on_upload_complete(&self, artifact: &UploadedArtifact);

    /// Called once the service has accepted the batch run.
    async fn on_run_started(&self, run: &BatchRun);

    /// Called after every status check.
    async fn on_poll(&self, run: &BatchRun);

    /// Called when the run reached a terminal outcome.
    async fn on_run_complete(&self, outcome: &Outcome);
}

/// A reporter that does nothing (for testing or when output is not needed).
pub struct NullReporter;

#[async_trait]
impl Reporter for NullReporter {
    async fn on_upload_complete(&self, _artifact: &UploadedArtifact) {}
    async fn on_run_started(&self, _run: &BatchRun) {}
    async fn on_poll(&self, _run: &BatchRun) {}
    async fn on_run_complete(&self, _outcome: &Outcome) {}
}

/// Console reporter with a progress bar over the run's test cases.
pub struct ConsoleReporter {
    progress: Mutex<Option<indicatif::ProgressBar>>,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            progress: Mutex::new(None),
            verbose,
        }
    }

    fn finish_progress(&self) {
        if let Some(pb) = self.progress.lock().ok().and_then(|mut p| p.take()) {
            pb.finish_and_clear();
        }
    }
}

#[async_trait]
impl Reporter for ConsoleReporter {
    async fn on_upload_complete(&self, artifact: &UploadedArtifact) {
        if self.verbose {
            eprintln!(
                "Uploaded {} (file number {})",
                artifact.file_name, artifact.file_no
            );
        }
    }

    async fn on_run_started(&self, run: &BatchRun) {
        eprintln!(
            "Batch run #{}: {}",
            run.batch_run_number,
            console::style(&run.url).underlined()
        );

        let pb = indicatif::ProgressBar::new(u64::from(run.test_cases.total));
        if let Ok(style) = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(run.status.to_string());

        if let Ok(mut progress) = self.progress.lock() {
            *progress = Some(pb);
        }
    }

    async fn on_poll(&self, run: &BatchRun) {
        let finished = run.test_cases.succeeded + run.test_cases.failed;
        let Ok(progress) = self.progress.lock() else {
            return;
        };
        if let Some(pb) = progress.as_ref() {
            pb.set_length(u64::from(run.test_cases.total.max(finished)));
            pb.set_position(u64::from(finished));
            pb.set_message(run.status.to_string());
        }
    }

    async fn on_run_complete(&self, outcome: &Outcome) {
        self.finish_progress();
        print_summary(outcome);
    }
}

/// One-line description of an outcome, used in logs and the summary.
pub fn summary_message(outcome: &Outcome) -> String {
    let run = outcome.batch_run();
    match outcome {
        Outcome::Started(_) => format!("Batch run #{} started", run.batch_run_number),
        Outcome::Succeeded(_) => format!("Batch run #{} succeeded", run.batch_run_number),
        Outcome::Failed(_) => format!(
            "Batch run #{} finished with status '{}'",
            run.batch_run_number, run.status
        ),
        Outcome::TimedOut(_) => format!(
            "Batch run #{} did not finish before the wait deadline",
            run.batch_run_number
        ),
    }
}

/// Prints the test-case tallies and a verdict to stderr.
pub fn print_summary(outcome: &Outcome) {
    let tallies = outcome.batch_run().test_cases;

    eprintln!();
    eprintln!("Test Results:");
    eprintln!("  Total:     {}", tallies.total);
    eprintln!("  Succeeded: {}", console::style(tallies.succeeded).green());
    eprintln!("  Failed:    {}", console::style(tallies.failed).red());
    eprintln!("  URL:       {}", outcome.batch_run().url);
    eprintln!();

    let message = summary_message(outcome);
    if outcome.success() {
        eprintln!("{}", console::style(message).green().bold());
    } else {
        eprintln!("{}", console::style(message).red().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch_run::{RunStatus, TestCases};

    fn run(status: RunStatus) -> BatchRun {
        BatchRun {
            organization_name: "acme".to_string(),
            project_name: "shop".to_string(),
            batch_run_number: 4,
            status,
            test_cases: TestCases {
                succeeded: 1,
                failed: 2,
                total: 3,
            },
            url: "https://app.magicpod.com/acme/shop/batch-run/4/".to_string(),
        }
    }

    #[test]
    fn test_summary_message() {
        assert_eq!(
            summary_message(&Outcome::Succeeded(run(RunStatus::Succeeded))),
            "Batch run #4 succeeded"
        );
        assert_eq!(
            summary_message(&Outcome::Failed(run(RunStatus::Aborted))),
            "Batch run #4 finished with status 'aborted'"
        );
        assert!(
            summary_message(&Outcome::TimedOut(run(RunStatus::Running))).contains("deadline")
        );
    }

    #[tokio::test]
    async fn test_console_reporter_tracks_progress() {
        let reporter = ConsoleReporter::new(false);
        reporter.on_run_started(&run(RunStatus::Running)).await;
        reporter.on_poll(&run(RunStatus::Running)).await;

        {
            let progress = reporter.progress.lock().unwrap();
            let pb = progress.as_ref().unwrap();
            assert_eq!(pb.position(), 3);
            assert_eq!(pb.length(), Some(3));
        }

        reporter
            .on_run_complete(&Outcome::Failed(run(RunStatus::Failed)))
            .await;
        assert!(reporter.progress.lock().unwrap().is_none());
    }
}
