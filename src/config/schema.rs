//! Configuration schema definitions for magicpod-run.
//!
//! Settings form one flat table whose keys match the input names a CI step
//! exposes (`organization_name`, `capture_type`, ...). The same keys are read
//! from a TOML file or from the process environment.
//!
//! # Schema Overview
//!
//! ```text
//! Settings (flat)
//! ├── connection      - base_url, magic_pod_api_token, organization_name, project_name
//! ├── environment     - environment + external_service_* credentials
//! ├── device          - os, device_type, version, model, device_language, device_region
//! ├── app source      - app_type + app_path | app_url | bundle_id | app_package/app_activity
//! ├── run options     - capture_type, retry_count, send_mail, multi_lang_data
//! └── orchestration   - wait_for_result, poll_interval_secs, max_wait_secs,
//!                       table_profile, export, request_timeout_secs
//! ```
//!
//! Display values such as `"Every UI transit"` are kept verbatim here; they
//! are only translated to wire tokens by [`crate::normalize`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// A secret setting value.
///
/// The plain text is only reachable through [`Secret::expose`]. `Debug` and
/// `Display` always render a redaction marker, so a `Secret` can sit inside
/// structs that get logged.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the plain-text value. Only the transport layer should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(\"[REDACTED]\")")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Serializes the plain text. Used only for outbound request bodies.
impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Root configuration structure for magicpod-run.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `base_url` | `https://app.magicpod.com/api/v1.0` |
/// | `wait_for_result` | true |
/// | `retry_count` | 0 |
/// | `device_language` | `"Default"` |
/// | `device_region` | `"Default"` |
/// | `poll_interval_secs` | 15 |
/// | `max_wait_secs` | None (wait until the run finishes) |
/// | `table_profile` | `full` |
/// | `export` | `stdout` |
/// | `request_timeout_secs` | 300 |
///
/// # Example
///
/// ```
/// use magicpod_run::config::load_config_str;
///
/// let settings = load_config_str(r#"
///     magic_pod_api_token = "secret"
///     organization_name = "acme"
///     project_name = "shop"
///     environment = "Magic Pod"
///     os = "Android"
///     device_type = "Emulator"
///     version = "13"
///     model = "Pixel 7"
///     app_type = "App file (URL)"
///     app_url = "https://example.com/app.apk"
///     capture_type = "Every step"
/// "#)?;
///
/// assert!(settings.wait_for_result);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root of the Magic Pod REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API token sent as `Authorization: Token <value>`.
    pub magic_pod_api_token: Secret,

    pub organization_name: String,

    pub project_name: String,

    /// Display name of the device environment, e.g. `"Magic Pod"`.
    #[serde(default)]
    pub environment: String,

    /// Remote TestKit API token.
    #[serde(default)]
    pub external_service_token: Option<Secret>,

    /// Remote TestKit on-premise server.
    #[serde(default)]
    pub external_service_server_url: Option<String>,

    #[serde(default)]
    pub external_service_user_name: Option<String>,

    #[serde(default)]
    pub external_service_password: Option<Secret>,

    /// Free-text OS name, folded to snake case (`"iOS"` → `ios`).
    #[serde(default)]
    pub os: String,

    /// Free-text device type, folded to snake case (`"Real device"` → `real_device`).
    #[serde(default)]
    pub device_type: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub model: String,

    /// Display name of the app source, e.g. `"App file (cloud upload)"`.
    #[serde(default)]
    pub app_type: String,

    /// Local app file, or a directory bundle that is zipped before upload.
    #[serde(default)]
    pub app_path: Option<String>,

    #[serde(default)]
    pub app_url: Option<String>,

    #[serde(default)]
    pub bundle_id: Option<String>,

    #[serde(default)]
    pub app_package: Option<String>,

    #[serde(default)]
    pub app_activity: Option<String>,

    /// Poll until the run finishes. When false the process exits right
    /// after the run has started.
    ///
    /// Default: true
    #[serde(default = "default_wait_for_result")]
    pub wait_for_result: bool,

    /// Ask the service to send a result mail. Omitted from the request when unset.
    #[serde(default)]
    pub send_mail: Option<bool>,

    /// Number of times the service retries failed test cases.
    ///
    /// Default: 0
    #[serde(default)]
    pub retry_count: u32,

    /// Display name of the capture mode, e.g. `"Every UI transit"`.
    #[serde(default)]
    pub capture_type: String,

    /// Default: `"Default"`
    #[serde(default = "default_device_language")]
    pub device_language: String,

    /// Ignored when the active table profile has no region table.
    ///
    /// Default: `"Default"`
    #[serde(default = "default_device_region")]
    pub device_region: String,

    /// Localized-data table forwarded as `shared_data_pattern.multi_lang_data`.
    #[serde(default)]
    pub multi_lang_data: Option<String>,

    /// Seconds between two status checks.
    ///
    /// Default: 15
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Upper bound on the total wait. Polling stops after
    /// `ceil(max_wait_secs / poll_interval_secs)` status checks or once this
    /// much time has elapsed, whichever comes first. A status check already in
    /// flight is not cut short. Unset means wait until the run leaves the
    /// `running` state.
    #[serde(default)]
    pub max_wait_secs: Option<u64>,

    /// Which set of accepted display values to validate against.
    ///
    /// Default: `full`
    #[serde(default)]
    pub table_profile: TableProfile,

    /// Where result key/value pairs are exported.
    ///
    /// Default: `stdout`
    #[serde(default)]
    pub export: ExportTarget,

    /// Timeout for a single HTTP request in seconds.
    ///
    /// Default: 300 (5 minutes, large uploads included)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://app.magicpod.com/api/v1.0".to_string()
}

fn default_wait_for_result() -> bool {
    true
}

fn default_device_language() -> String {
    "Default".to_string()
}

fn default_device_region() -> String {
    "Default".to_string()
}

fn default_poll_interval() -> u64 {
    15
}

fn default_request_timeout() -> u64 {
    300
}

impl Settings {
    /// Renders every setting as `key: value` with secret values redacted.
    pub fn summary(&self) -> Vec<String> {
        fn opt<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "<unset>".to_string())
        }

        vec![
            format!("base_url: {}", self.base_url),
            format!("magic_pod_api_token: {}", self.magic_pod_api_token),
            format!("organization_name: {}", self.organization_name),
            format!("project_name: {}", self.project_name),
            format!("environment: {}", self.environment),
            format!(
                "external_service_token: {}",
                opt(&self.external_service_token)
            ),
            format!(
                "external_service_server_url: {}",
                opt(&self.external_service_server_url)
            ),
            format!(
                "external_service_user_name: {}",
                opt(&self.external_service_user_name)
            ),
            format!(
                "external_service_password: {}",
                opt(&self.external_service_password)
            ),
            format!("os: {}", self.os),
            format!("device_type: {}", self.device_type),
            format!("version: {}", self.version),
            format!("model: {}", self.model),
            format!("app_type: {}", self.app_type),
            format!("app_path: {}", opt(&self.app_path)),
            format!("app_url: {}", opt(&self.app_url)),
            format!("bundle_id: {}", opt(&self.bundle_id)),
            format!("app_package: {}", opt(&self.app_package)),
            format!("app_activity: {}", opt(&self.app_activity)),
            format!("wait_for_result: {}", self.wait_for_result),
            format!("send_mail: {}", opt(&self.send_mail)),
            format!("retry_count: {}", self.retry_count),
            format!("capture_type: {}", self.capture_type),
            format!("device_language: {}", self.device_language),
            format!("device_region: {}", self.device_region),
            format!("multi_lang_data: {}", opt(&self.multi_lang_data)),
            format!("poll_interval_secs: {}", self.poll_interval_secs),
            format!("max_wait_secs: {}", opt(&self.max_wait_secs)),
            format!("table_profile: {}", self.table_profile),
            format!("export: {}", self.export),
            format!("request_timeout_secs: {}", self.request_timeout_secs),
        ]
    }
}

/// Versioned sets of accepted display values.
///
/// Deployments of the service have accepted different enumerations over
/// time; the profile picks which one input is validated against.
///
/// | Profile | Environments | Languages | Regions |
/// |---------|--------------|-----------|---------|
/// | `basic` | Magic Pod | English, Japanese | - |
/// | `remote-testkit` | + Remote TestKit | English, Japanese | - |
/// | `full` | + Remote TestKit Onpremise | + Default | 21 + Default |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableProfile {
    Basic,
    RemoteTestkit,
    #[default]
    Full,
}

impl fmt::Display for TableProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Basic => "basic",
            Self::RemoteTestkit => "remote-testkit",
            Self::Full => "full",
        })
    }
}

/// Destination for exported result key/value pairs.
///
/// Written as a single string: `stdout`, `envman`, or `file:<path>`.
///
/// ```toml
/// export = "file:~/ci-results.env"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ExportTarget {
    /// Print `KEY=VALUE` lines to stdout.
    #[default]
    Stdout,
    /// Call `envman add --key KEY --value VALUE` for each pair.
    Envman,
    /// Append `KEY=VALUE` lines to a file.
    File(PathBuf),
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Envman => f.write_str("envman"),
            Self::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

impl FromStr for ExportTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(Self::Stdout),
            "envman" => Ok(Self::Envman),
            other => match other.strip_prefix("file:") {
                Some(path) if !path.is_empty() => {
                    Ok(Self::File(PathBuf::from(shellexpand::tilde(path).as_ref())))
                }
                _ => Err(format!(
                    "unknown export target '{other}', expected stdout, envman or file:<path>"
                )),
            },
        }
    }
}

impl TryFrom<String> for ExportTarget {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
