//! Export of result key/value pairs for downstream pipeline steps.
//!
//! Values handed to a sink are always safe to publish: secrets never reach
//! this module.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::ExportTarget;

/// Exported keys.
pub mod keys {
    /// Detail page of the batch run, exported as soon as the run has started.
    pub const TEST_URL: &str = "MAGIC_POD_TEST_URL";
    /// Batch run number, for re-polling a run this process stopped watching.
    pub const RUN_NUMBER: &str = "MAGIC_POD_TEST_RUN_NUMBER";
    pub const STATUS: &str = "MAGIC_POD_TEST_STATUS";
    pub const SUCCEEDED_COUNT: &str = "MAGIC_POD_TEST_SUCCEEDED_COUNT";
    pub const FAILED_COUNT: &str = "MAGIC_POD_TEST_FAILED_COUNT";
    pub const TOTAL_COUNT: &str = "MAGIC_POD_TEST_TOTAL_COUNT";
}

/// Errors raised while exporting a value.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to run envman: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("envman exited with {status} while exporting {key}")]
    Command {
        key: String,
        status: std::process::ExitStatus,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for exported results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn export(&self, key: &str, value: &str) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: ResultSink + ?Sized> ResultSink for Box<T> {
    async fn export(&self, key: &str, value: &str) -> Result<(), SinkError> {
        (**self).export(key, value).await
    }
}

/// Creates the sink selected by the `export` setting.
pub fn sink_for(target: &ExportTarget) -> Box<dyn ResultSink> {
    match target {
        ExportTarget::Stdout => Box::new(StdoutSink),
        ExportTarget::Envman => Box::new(EnvmanSink::new()),
        ExportTarget::File(path) => Box::new(EnvFileSink::new(path.clone())),
    }
}

/// Prints `KEY=VALUE` lines.
pub struct StdoutSink;

#[async_trait]
impl ResultSink for StdoutSink {
    async fn export(&self, key: &str, value: &str) -> Result<(), SinkError> {
        println!("{}={}", key, value);
        Ok(())
    }
}

/// Exports through `envman add`, the Bitrise environment manager.
pub struct EnvmanSink {
    program: String,
}

impl EnvmanSink {
    pub fn new() -> Self {
        Self {
            program: "envman".to_string(),
        }
    }

    /// Uses a different executable, e.g. a wrapper script.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for EnvmanSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultSink for EnvmanSink {
    async fn export(&self, key: &str, value: &str) -> Result<(), SinkError> {
        debug!("envman add --key {}", key);
        let status = tokio::process::Command::new(&self.program)
            .args(["add", "--key", key, "--value", value])
            .status()
            .await
            .map_err(SinkError::Spawn)?;

        if !status.success() {
            return Err(SinkError::Command {
                key: key.to_string(),
                status,
            });
        }
        Ok(())
    }
}

/// Appends `KEY=VALUE` lines to a file, e.g. a CI-provided env file.
pub struct EnvFileSink {
    path: PathBuf,
}

impl EnvFileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ResultSink for EnvFileSink {
    async fn export(&self, key: &str, value: &str) -> Result<(), SinkError> {
        let write_err = |source| SinkError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_err)?;
        file.write_all(format!("{}={}\n", key, value).as_bytes())
            .await
            .map_err(write_err)?;
        file.flush().await.map_err(write_err)
    }
}

/// Keeps exported pairs in memory. Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<(String, String)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All exported pairs in export order.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// The most recent value exported under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn export(&self, key: &str, value: &str) -> Result<(), SinkError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((key.to_string(), value.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_env_file_sink_appends_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results.env");
        std::fs::write(&path, "EXISTING=1\n").unwrap();

        let sink = EnvFileSink::new(path.clone());
        sink.export(keys::STATUS, "succeeded").await.unwrap();
        sink.export(keys::TOTAL_COUNT, "2").await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "EXISTING=1\nMAGIC_POD_TEST_STATUS=succeeded\nMAGIC_POD_TEST_TOTAL_COUNT=2\n"
        );
    }

    #[tokio::test]
    async fn test_env_file_sink_reports_unwritable_path() {
        let temp = TempDir::new().unwrap();
        let sink = EnvFileSink::new(temp.path().join("missing").join("results.env"));

        let err = sink.export(keys::STATUS, "failed").await.unwrap_err();
        assert!(matches!(err, SinkError::Write { .. }));
    }

    #[tokio::test]
    async fn test_memory_sink_clones_share_entries() {
        let sink = MemorySink::new();
        let observer = sink.clone();

        sink.export(keys::STATUS, "running").await.unwrap();
        sink.export(keys::STATUS, "succeeded").await.unwrap();

        assert_eq!(observer.entries().len(), 2);
        assert_eq!(observer.get(keys::STATUS).as_deref(), Some("succeeded"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_envman_sink_fails_on_nonzero_exit() {
        let sink = EnvmanSink::with_program("false");
        let err = sink.export(keys::STATUS, "failed").await.unwrap_err();
        assert!(matches!(err, SinkError::Command { .. }));

        let sink = EnvmanSink::with_program("true");
        sink.export(keys::STATUS, "failed").await.unwrap();
    }

    #[tokio::test]
    async fn test_boxed_sink_forwards() {
        let memory = MemorySink::new();
        let boxed: Box<dyn ResultSink> = Box::new(memory.clone());

        boxed.export(keys::TEST_URL, "https://example.com").await.unwrap();

        assert_eq!(
            memory.get(keys::TEST_URL).as_deref(),
            Some("https://example.com")
        );
    }
}
