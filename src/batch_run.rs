//! Response types returned by the Magic Pod API.

use std::fmt;

use serde::Deserialize;

/// Result of a successful `upload-file` call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedArtifact {
    pub file_name: String,
    pub file_no: u64,
}

/// Test-case tallies of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TestCases {
    #[serde(default)]
    pub succeeded: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub total: u32,
}

/// Status token of a batch run.
///
/// Tokens the service may add later are kept verbatim in [`RunStatus::Other`]
/// so they can still be exported unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    Aborted,
    Unresolved,
    Other(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
            Self::Unresolved => "unresolved",
            Self::Other(token) => token,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl From<String> for RunStatus {
    fn from(token: String) -> Self {
        match token.as_str() {
            "running" => Self::Running,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "aborted" => Self::Aborted,
            "unresolved" => Self::Unresolved,
            _ => Self::Other(token),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a batch run. Each poll replaces the previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchRun {
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub project_name: String,
    pub batch_run_number: u64,
    pub status: RunStatus,
    #[serde(default)]
    pub test_cases: TestCases,
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_run_deserializes_full_response() {
        let run: BatchRun = serde_json::from_str(
            r#"{
                "organization_name": "acme",
                "project_name": "shop",
                "batch_run_number": 42,
                "status": "succeeded",
                "test_cases": {"succeeded": 2, "failed": 0, "total": 2},
                "url": "https://app.magicpod.com/acme/shop/batch-run/42/"
            }"#,
        )
        .unwrap();

        assert_eq!(run.batch_run_number, 42);
        assert_eq!(run.status, RunStatus::Succeeded);
        assert_eq!(
            run.test_cases,
            TestCases {
                succeeded: 2,
                failed: 0,
                total: 2
            }
        );
    }

    #[test]
    fn test_start_response_without_tallies() {
        let run: BatchRun =
            serde_json::from_str(r#"{"batch_run_number": 7, "status": "running", "url": "u"}"#)
                .unwrap();

        assert!(run.status.is_running());
        assert_eq!(run.test_cases, TestCases::default());
    }

    #[test]
    fn test_unknown_status_token_is_preserved() {
        let status: RunStatus = serde_json::from_str(r#""paused""#).unwrap();
        assert_eq!(status, RunStatus::Other("paused".to_string()));
        assert_eq!(status.as_str(), "paused");
        assert!(!status.is_running());
    }
}
