//! HTTP transport for the Magic Pod API.
//!
//! [`MagicPodClient`] is a request template: base URL, `Authorization: Token
//! <secret>` header and the organization/project path segments are fixed at
//! construction, and each call only adds its own path tail. The client holds
//! no per-call state, so one instance serves the whole run.
//!
//! The orchestrator talks to the service through the [`BatchRunApi`] trait,
//! which keeps it testable without a network.
//!
//! # Error bodies
//!
//! Non-2xx responses are decoded in layers, most specific first:
//!
//! | Body | Error |
//! |------|-------|
//! | `{"detail": "..."}` | [`ApiError::Status`] |
//! | `{"title": "...", "code": ...}` | [`ApiError::Status`] with `title (code)` |
//! | `{"field": ["msg", ...], ...}` | [`ApiError::FieldErrors`] |
//! | anything else (e.g. an HTML error page) | [`ApiError::UndecodableBody`] |

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::batch_run::{BatchRun, UploadedArtifact};
use crate::config::Secret;
use crate::payload::BatchRunRequest;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by [`BatchRunApi`] operations. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response carrying a readable message.
    #[error("{status}: {detail}")]
    Status { status: StatusCode, detail: String },

    /// Non-2xx response carrying per-field validation messages.
    #[error("{status}: {}", render_field_errors(.fields))]
    FieldErrors {
        status: StatusCode,
        fields: Vec<(String, String)>,
    },

    /// Non-2xx response whose body is not a recognizable error document.
    #[error("{status}: unexpected error response from Magic Pod")]
    UndecodableBody { status: StatusCode },

    /// The request never produced a response.
    #[error("request to Magic Pod failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose body does not match the expected shape.
    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The file to upload could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("API token contains characters that are not valid in an HTTP header")]
    InvalidToken,
}

impl ApiError {
    /// HTTP status of an error response, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. }
            | Self::FieldErrors { status, .. }
            | Self::UndecodableBody { status } => Some(*status),
            _ => None,
        }
    }
}

fn render_field_errors(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{field}: {messages}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The three remote operations a batch run needs.
#[async_trait]
pub trait BatchRunApi: Send + Sync {
    /// Uploads an app file and returns its file number.
    async fn upload(&self, path: &Path) -> ApiResult<UploadedArtifact>;

    /// Starts a batch run.
    async fn start_batch_run(&self, request: &BatchRunRequest) -> ApiResult<BatchRun>;

    /// Fetches the current state of a batch run.
    async fn get_batch_run(&self, batch_run_number: u64) -> ApiResult<BatchRun>;
}

/// reqwest-backed [`BatchRunApi`] implementation.
#[derive(Clone)]
pub struct MagicPodClient {
    http: reqwest::Client,
    base_url: Url,
    organization: String,
    project: String,
}

impl MagicPodClient {
    /// Creates a client scoped to one organization and project.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed or cannot carry a
    /// path, or if the token is not a valid header value.
    pub fn new(
        base_url: &str,
        token: &Secret,
        organization: &str,
        project: &str,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::InvalidBaseUrl(base_url.to_string()))?;

        let mut auth = HeaderValue::from_str(&format!("Token {}", token.expose().trim()))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("magicpod-run/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            organization: organization.to_string(),
            project: project.to_string(),
        })
    }

    /// Builds `{base}/{organization}/{project}/{tail...}/`.
    pub fn endpoint(&self, tail: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(&self.organization)
            .push(&self.project)
            .extend(tail)
            .push("");
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> ApiResult<T> {
        let response = request.send().await?;
        decode_response(operation, response).await
    }
}

#[async_trait]
impl BatchRunApi for MagicPodClient {
    async fn upload(&self, path: &Path) -> ApiResult<UploadedArtifact> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string());
        debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let url = self.endpoint(&["upload-file"])?;
        self.send("upload-file", self.http.post(url).multipart(form))
            .await
    }

    async fn start_batch_run(&self, request: &BatchRunRequest) -> ApiResult<BatchRun> {
        let url = self.endpoint(&["batch-run"])?;
        self.send("batch-run", self.http.post(url).json(request))
            .await
    }

    async fn get_batch_run(&self, batch_run_number: u64) -> ApiResult<BatchRun> {
        let number = batch_run_number.to_string();
        let url = self.endpoint(&["batch-run", number.as_str()])?;
        self.send("batch-run", self.http.get(url)).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await?;
    debug!("{} responded {}", operation, status);

    if !status.is_success() {
        return Err(decode_error_body(status, &body));
    }

    serde_json::from_str(&body).map_err(|source| ApiError::Decode { operation, source })
}

/// Turns a non-2xx response body into the most specific [`ApiError`].
pub fn decode_error_body(status: StatusCode, body: &str) -> ApiError {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(body) else {
        return ApiError::UndecodableBody { status };
    };

    if let Some(detail) = object
        .get("detail")
        .and_then(Value::as_str)
        .filter(|detail| !detail.is_empty())
    {
        return ApiError::Status {
            status,
            detail: detail.to_string(),
        };
    }

    if let Some(title) = object.get("title").and_then(Value::as_str) {
        let detail = match object.get("code") {
            Some(Value::String(code)) => format!("{title} ({code})"),
            Some(Value::Number(code)) => format!("{title} ({code})"),
            _ => title.to_string(),
        };
        return ApiError::Status { status, detail };
    }

    let fields: Vec<(String, String)> = object
        .iter()
        .filter_map(|(field, value)| {
            let messages = match value {
                Value::String(message) => message.clone(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
                _ => return None,
            };
            (!messages.is_empty()).then(|| (field.clone(), messages))
        })
        .collect();

    if fields.is_empty() {
        ApiError::UndecodableBody { status }
    } else {
        ApiError::FieldErrors { status, fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> MagicPodClient {
        MagicPodClient::new(
            base,
            &Secret::new("token"),
            "acme corp",
            "shop",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = client("https://app.magicpod.com/api/v1.0")
            .endpoint(&["batch-run", "12"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://app.magicpod.com/api/v1.0/acme%20corp/shop/batch-run/12/"
        );

        let url = client("https://app.magicpod.com/api/v1.0/")
            .endpoint(&["upload-file"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://app.magicpod.com/api/v1.0/acme%20corp/shop/upload-file/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = MagicPodClient::new(
            "not a url",
            &Secret::new("token"),
            "acme",
            "shop",
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_detail_body() {
        let err = decode_error_body(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": "invalid file"}"#,
        );
        assert!(matches!(err, ApiError::Status { .. }));
        assert_eq!(err.to_string(), "422 Unprocessable Entity: invalid file");
    }

    #[test]
    fn test_titled_body() {
        let err = decode_error_body(
            StatusCode::BAD_REQUEST,
            r#"{"title": "Quota exceeded", "code": "E1001"}"#,
        );
        assert_eq!(err.to_string(), "400 Bad Request: Quota exceeded (E1001)");
    }

    #[test]
    fn test_field_error_body() {
        let err = decode_error_body(
            StatusCode::BAD_REQUEST,
            r#"{"model": ["Unknown model", "Try again"], "os": "Unsupported"}"#,
        );
        match &err {
            ApiError::FieldErrors { fields, .. } => {
                assert!(fields.contains(&(
                    "model".to_string(),
                    "Unknown model,Try again".to_string()
                )));
                assert!(fields.contains(&("os".to_string(), "Unsupported".to_string())));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("model: Unknown model,Try again"));
    }

    #[test]
    fn test_html_body_is_undecodable() {
        let err = decode_error_body(
            StatusCode::BAD_GATEWAY,
            "<html><body>Bad gateway</body></html>",
        );
        assert!(matches!(err, ApiError::UndecodableBody { .. }));
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn test_empty_detail_falls_through() {
        let err = decode_error_body(StatusCode::FORBIDDEN, r#"{"detail": ""}"#);
        assert!(matches!(err, ApiError::UndecodableBody { .. }));

        let err = decode_error_body(StatusCode::FORBIDDEN, r#"{"detail": null}"#);
        assert!(matches!(err, ApiError::UndecodableBody { .. }));
    }
}
