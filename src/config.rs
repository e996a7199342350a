//! Configuration loading for magicpod-run.
//!
//! Settings come from exactly one source: a TOML file passed with `--config`,
//! or the process environment using the same lowercase keys. The latter is
//! how CI steps hand their inputs over.
//!
//! Secret-bearing keys are deserialized into [`Secret`] so that nothing
//! downstream can log or export them by accident.

pub mod schema;

pub use schema::*;

use std::ffi::OsString;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Every key read from the environment by [`load_config_env`].
pub const SETTING_KEYS: &[&str] = &[
    "base_url",
    "magic_pod_api_token",
    "organization_name",
    "project_name",
    "environment",
    "external_service_token",
    "external_service_server_url",
    "external_service_user_name",
    "external_service_password",
    "os",
    "device_type",
    "version",
    "model",
    "app_type",
    "app_path",
    "app_url",
    "bundle_id",
    "app_package",
    "app_activity",
    "wait_for_result",
    "send_mail",
    "retry_count",
    "capture_type",
    "device_language",
    "device_region",
    "multi_lang_data",
    "poll_interval_secs",
    "max_wait_secs",
    "table_profile",
    "export",
    "request_timeout_secs",
];

/// Keys holding secrets. Their values must never reach logs or exports.
pub const SECRET_KEYS: &[&str] = &[
    "magic_pod_api_token",
    "external_service_token",
    "external_service_password",
];

const BOOL_KEYS: &[&str] = &["wait_for_result", "send_mail"];

const INTEGER_KEYS: &[&str] = &[
    "retry_count",
    "poll_interval_secs",
    "max_wait_secs",
    "request_timeout_secs",
];

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read (e.g., doesn't exist or permission denied)
/// - The file contains invalid TOML syntax
/// - A required key is missing or a value has the wrong type
///
/// # Example
///
/// ```no_run
/// use magicpod_run::config::load_config;
/// use std::path::Path;
///
/// let settings = load_config(Path::new("magicpod.toml"))?;
/// println!("Project: {}", settings.project_name);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let settings: Settings = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(settings)
}

/// Loads settings from a TOML string.
pub fn load_config_str(content: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(content).context("Failed to parse config")?;

    Ok(settings)
}

/// Loads settings from the process environment.
pub fn load_config_env() -> Result<Settings> {
    settings_from_os_vars(std::env::vars_os())
}

/// Like [`settings_from_vars`], for raw OS strings.
///
/// Variables outside [`SETTING_KEYS`] are skipped whatever their encoding;
/// a known key holding non-UTF-8 data is an error.
pub fn settings_from_os_vars<I>(vars: I) -> Result<Settings>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut known = Vec::new();
    for (key, value) in vars {
        let Some(key) = key.to_str().filter(|key| SETTING_KEYS.contains(key)) else {
            continue;
        };
        let Some(value) = value.to_str() else {
            bail!("Setting '{key}' is not valid UTF-8");
        };
        known.push((key.to_string(), value.to_string()));
    }
    settings_from_vars(known)
}

/// Builds settings from `(key, value)` pairs such as environment variables.
///
/// Unknown keys are ignored and empty values count as unset, since CI
/// systems export every declared input whether or not it was filled in.
/// Boolean keys accept `true/false`, `yes/no` and `1/0`.
pub fn settings_from_vars<I, K, V>(vars: I) -> Result<Settings>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut table = toml::Table::new();

    for (key, value) in vars {
        let key = key.as_ref();
        let value = value.as_ref();
        if !SETTING_KEYS.contains(&key) || value.trim().is_empty() {
            continue;
        }

        let parsed = if BOOL_KEYS.contains(&key) {
            toml::Value::Boolean(parse_bool(key, value)?)
        } else if INTEGER_KEYS.contains(&key) {
            let number: i64 = value
                .trim()
                .parse()
                .with_context(|| format!("Setting '{key}' must be an integer, got '{value}'"))?;
            toml::Value::Integer(number)
        } else {
            toml::Value::String(value.to_string())
        };
        table.insert(key.to_string(), parsed);
    }

    toml::Value::Table(table)
        .try_into()
        .context("Failed to read settings from environment")
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => bail!("Setting '{key}' must be true or false, got '{value}'"),
    }
}
