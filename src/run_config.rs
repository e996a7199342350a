//! Normalized run configuration.
//!
//! [`RunConfiguration`] is the immutable snapshot produced by
//! [`normalize`](crate::normalize::normalize). Every field already carries the
//! wire vocabulary the Magic Pod API expects, and the app source is a tagged
//! variant so the request builder never has to guess which optional fields
//! belong together.

use std::fmt;
use std::path::PathBuf;

use crate::config::Secret;

/// OS name (after snake-case folding) that selects iOS-specific fields.
pub const IOS: &str = "ios";

/// Where the remote devices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentKind {
    /// Devices hosted by Magic Pod itself.
    MagicPod,
    /// Devices rented through Remote TestKit.
    RemoteTestKit,
    /// An on-premise Remote TestKit server.
    RemoteTestKitOnpremise,
}

impl EnvironmentKind {
    /// Wire token sent as `environment`.
    pub fn wire(self) -> &'static str {
        match self {
            Self::MagicPod => "magic_pod",
            Self::RemoteTestKit => "remote_testkit",
            Self::RemoteTestKitOnpremise => "remote_testkit_onpremise",
        }
    }
}

/// Environment together with the external-service credentials it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    MagicPod,
    RemoteTestKit {
        token: Secret,
    },
    RemoteTestKitOnpremise {
        server_url: String,
        user_name: String,
        password: Secret,
    },
}

impl Environment {
    pub fn kind(&self) -> EnvironmentKind {
        match self {
            Self::MagicPod => EnvironmentKind::MagicPod,
            Self::RemoteTestKit { .. } => EnvironmentKind::RemoteTestKit,
            Self::RemoteTestKitOnpremise { .. } => EnvironmentKind::RemoteTestKitOnpremise,
        }
    }

    /// True for environments backed by an external device service.
    pub fn is_external(&self) -> bool {
        !matches!(self, Self::MagicPod)
    }
}

/// Declared kind of app source, as selected by the `app_type` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppSourceKind {
    AppFile,
    AppUrl,
    Installed,
}

impl AppSourceKind {
    pub fn wire(self) -> &'static str {
        match self {
            Self::AppFile => "app_file",
            Self::AppUrl => "app_url",
            Self::Installed => "installed",
        }
    }
}

/// How often the service records screenshots during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    EveryStep,
    EveryUiTransit,
    FailureOnly,
}

impl CaptureMode {
    pub fn wire(self) -> &'static str {
        match self {
            Self::EveryStep => "on_each_step",
            Self::EveryUiTransit => "on_ui_transit",
            Self::FailureOnly => "on_error",
        }
    }
}

/// An app that is already present on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstalledApp {
    /// iOS apps are addressed by bundle identifier.
    Bundle { bundle_id: String },
    /// Everything else is addressed by package and launch activity.
    Activity { package: String, activity: String },
}

/// The app under test. Exactly one variant is ever populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppSource {
    /// A local file or directory bundle uploaded before the run starts.
    UploadedFile {
        path: PathBuf,
        bundle_id: Option<String>,
    },
    /// An app file the service downloads itself.
    RemoteUrl {
        url: String,
        bundle_id: Option<String>,
    },
    Installed(InstalledApp),
}

impl AppSource {
    pub fn kind(&self) -> AppSourceKind {
        match self {
            Self::UploadedFile { .. } => AppSourceKind::AppFile,
            Self::RemoteUrl { .. } => AppSourceKind::AppUrl,
            Self::Installed(_) => AppSourceKind::Installed,
        }
    }
}

/// Everything needed to start one batch run, already in wire vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    pub organization: String,
    pub project: String,
    pub environment: Environment,
    /// Snake-cased OS name, e.g. `ios` or `android`.
    pub os: String,
    /// Snake-cased device type, e.g. `simulator` or `real_device`.
    pub device_type: String,
    pub version: String,
    pub model: String,
    pub app_source: AppSource,
    pub capture_mode: CaptureMode,
    pub device_language: String,
    /// `None` when the active parameter tables have no region support.
    pub device_region: Option<String>,
    pub retry_count: u32,
    pub send_mail: Option<bool>,
    /// Raw localized-data table, forwarded only when non-empty.
    pub multi_lang_data: Option<String>,
}

impl RunConfiguration {
    pub fn is_ios(&self) -> bool {
        self.os == IOS
    }
}

impl fmt::Display for RunConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} on {} {} {} {} ({})",
            self.organization,
            self.project,
            self.environment.kind().wire(),
            self.os,
            self.device_type,
            self.model,
            self.version
        )
    }
}
