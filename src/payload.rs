//! Batch-run request body.
//!
//! [`build_batch_run_request`] is a total function over the environment and
//! app-source variants of a [`RunConfiguration`]. Optional fields are simply
//! left out of the JSON body when the variant does not call for them.

use serde::Serialize;

use crate::batch_run::UploadedArtifact;
use crate::config::Secret;
use crate::run_config::{AppSource, Environment, InstalledApp, RunConfiguration};

/// Errors raised while assembling a request body.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The configuration names an uploaded file but no upload result was given.
    #[error("app source is an uploaded file but no upload result is available")]
    MissingArtifact,
}

/// Localized-data wrapper. The service reads the table from
/// `shared_data_pattern.multi_lang_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedDataPattern {
    pub multi_lang_data: String,
}

/// JSON body of `POST {org}/{project}/batch-run/`.
///
/// Secret fields serialize as plain text but print redacted through `Debug`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRunRequest {
    pub environment: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_service_token: Option<Secret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_service_server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_service_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_service_password: Option<Secret>,
    pub os: String,
    pub device_type: String,
    pub version: String,
    pub model: String,
    pub app_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_file_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_mail: Option<bool>,
    pub retry_count: u32,
    pub capture_type: &'static str,
    pub device_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_data_pattern: Option<SharedDataPattern>,
}

/// Builds the start-run body for `config`.
///
/// `artifact` must be the upload result when the app source is an uploaded
/// file; it is ignored otherwise.
pub fn build_batch_run_request(
    config: &RunConfiguration,
    artifact: Option<&UploadedArtifact>,
) -> Result<BatchRunRequest, BuildError> {
    let mut request = BatchRunRequest {
        environment: config.environment.kind().wire(),
        external_service_token: None,
        external_service_server_url: None,
        external_service_user_name: None,
        external_service_password: None,
        os: config.os.clone(),
        device_type: config.device_type.clone(),
        version: config.version.clone(),
        model: config.model.clone(),
        app_type: config.app_source.kind().wire(),
        app_file_number: None,
        app_url: None,
        bundle_id: None,
        app_package: None,
        app_activity: None,
        send_mail: config.send_mail,
        retry_count: config.retry_count,
        capture_type: config.capture_mode.wire(),
        device_language: config.device_language.clone(),
        device_region: config.device_region.clone(),
        shared_data_pattern: config
            .multi_lang_data
            .as_ref()
            .filter(|data| !data.is_empty())
            .map(|data| SharedDataPattern {
                multi_lang_data: data.clone(),
            }),
    };

    match &config.environment {
        Environment::MagicPod => {}
        Environment::RemoteTestKit { token } => {
            request.external_service_token = Some(token.clone());
        }
        Environment::RemoteTestKitOnpremise {
            server_url,
            user_name,
            password,
        } => {
            request.external_service_server_url = Some(server_url.clone());
            request.external_service_user_name = Some(user_name.clone());
            request.external_service_password = Some(password.clone());
        }
    }

    // External device services cannot read the bundle id out of an iOS app
    // file, so it travels alongside the file or URL.
    let external_ios_bundle = |bundle_id: &Option<String>| {
        if config.is_ios() && config.environment.is_external() {
            bundle_id.clone()
        } else {
            None
        }
    };

    match &config.app_source {
        AppSource::UploadedFile { bundle_id, .. } => {
            let artifact = artifact.ok_or(BuildError::MissingArtifact)?;
            request.app_file_number = Some(artifact.file_no);
            request.bundle_id = external_ios_bundle(bundle_id);
        }
        AppSource::RemoteUrl { url, bundle_id } => {
            request.app_url = Some(url.clone());
            request.bundle_id = external_ios_bundle(bundle_id);
        }
        AppSource::Installed(InstalledApp::Bundle { bundle_id }) => {
            request.bundle_id = Some(bundle_id.clone());
        }
        AppSource::Installed(InstalledApp::Activity { package, activity }) => {
            request.app_package = Some(package.clone());
            request.app_activity = Some(activity.clone());
        }
    }

    Ok(request)
}
