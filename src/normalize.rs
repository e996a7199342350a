//! Parameter normalization and validation.
//!
//! Turns raw [`Settings`] into a [`RunConfiguration`] in the service's wire
//! vocabulary. Enumerated settings are looked up in [`EnumTable`]s grouped by
//! [`ParamTables`]; the tables are passed in rather than baked into the
//! lookup so that a new service deployment only needs a new profile.
//!
//! Every field is checked before anything is returned. A caller either gets
//! a complete configuration or the full list of problems, never the first
//! problem alone.
//!
//! # Example
//!
//! ```
//! use magicpod_run::config::{TableProfile, load_config_str};
//! use magicpod_run::normalize::{ParamTables, normalize};
//!
//! let settings = load_config_str(r#"
//!     magic_pod_api_token = "t"
//!     organization_name = "acme"
//!     project_name = "shop"
//!     environment = "Magic Pod"
//!     os = "Android"
//!     device_type = "Real device"
//!     version = "13"
//!     model = "Pixel 7"
//!     app_type = "Installed app"
//!     app_package = "com.example.shop"
//!     app_activity = ".MainActivity"
//!     capture_type = "Every UI transit"
//! "#)?;
//!
//! let config = normalize(&settings, &ParamTables::for_profile(TableProfile::Full)).unwrap();
//! assert_eq!(config.device_type, "real_device");
//! assert_eq!(config.capture_mode.wire(), "on_ui_transit");
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::path::PathBuf;

use crate::config::{Secret, Settings, TableProfile};
use crate::run_config::{
    AppSource, AppSourceKind, CaptureMode, Environment, EnvironmentKind, InstalledApp, IOS,
    RunConfiguration,
};

/// A single rejected setting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    /// Setting key, e.g. `capture_type`.
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every problem found while normalizing one set of settings.
///
/// Only ever returned non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} invalid setting(s):{}", .0.len(), render_field_errors(.0))]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Field keys in the order they were rejected.
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }

    fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Keeps the value, or records the error and yields `None`.
    fn collect<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(error);
                None
            }
        }
    }
}

fn render_field_errors(errors: &[FieldError]) -> String {
    errors.iter().map(|error| format!("\n- {error}")).collect()
}

/// Closed mapping from display values to wire values for one setting.
#[derive(Debug, Clone)]
pub struct EnumTable<T> {
    field: &'static str,
    label: &'static str,
    entries: Vec<(&'static str, T)>,
}

impl<T: Clone> EnumTable<T> {
    pub fn new(field: &'static str, label: &'static str, entries: Vec<(&'static str, T)>) -> Self {
        Self {
            field,
            label,
            entries,
        }
    }

    /// Exact-match lookup. The error names every accepted display value.
    pub fn lookup(&self, input: &str) -> Result<T, FieldError> {
        self.entries
            .iter()
            .find(|(display, _)| *display == input)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                FieldError::new(
                    self.field,
                    format!(
                        "{} should be one of {} (got '{}')",
                        self.label,
                        self.accepted()
                            .iter()
                            .map(|d| format!("'{d}'"))
                            .collect::<Vec<_>>()
                            .join(", "),
                        input
                    ),
                )
            })
    }

    pub fn accepted(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(display, _)| *display).collect()
    }
}

/// The enumerations one service deployment accepts.
#[derive(Debug, Clone)]
pub struct ParamTables {
    pub environment: EnumTable<EnvironmentKind>,
    pub app_type: EnumTable<AppSourceKind>,
    pub capture_type: EnumTable<CaptureMode>,
    pub device_language: EnumTable<&'static str>,
    /// Deployments without region support leave this out; the
    /// `device_region` setting is then ignored.
    pub device_region: Option<EnumTable<&'static str>>,
}

impl ParamTables {
    pub fn for_profile(profile: TableProfile) -> Self {
        match profile {
            TableProfile::Basic => Self::basic(),
            TableProfile::RemoteTestkit => Self::remote_testkit(),
            TableProfile::Full => Self::full(),
        }
    }

    /// Magic Pod devices only, English/Japanese, no regions.
    pub fn basic() -> Self {
        Self {
            environment: environment_table(vec![("Magic Pod", EnvironmentKind::MagicPod)]),
            app_type: app_type_table(),
            capture_type: capture_type_table(),
            device_language: EnumTable::new(
                "device_language",
                "Device language",
                vec![("English", "en"), ("Japanese", "ja")],
            ),
            device_region: None,
        }
    }

    /// Adds Remote TestKit devices to [`ParamTables::basic`].
    pub fn remote_testkit() -> Self {
        Self {
            environment: environment_table(vec![
                ("Magic Pod", EnvironmentKind::MagicPod),
                ("Remote TestKit", EnvironmentKind::RemoteTestKit),
            ]),
            ..Self::basic()
        }
    }

    /// All environments, a `Default` language and the region table.
    pub fn full() -> Self {
        Self {
            environment: environment_table(vec![
                ("Magic Pod", EnvironmentKind::MagicPod),
                ("Remote TestKit", EnvironmentKind::RemoteTestKit),
                (
                    "Remote TestKit Onpremise",
                    EnvironmentKind::RemoteTestKitOnpremise,
                ),
            ]),
            app_type: app_type_table(),
            capture_type: capture_type_table(),
            device_language: EnumTable::new(
                "device_language",
                "Device language",
                vec![("Default", "default"), ("English", "en"), ("Japanese", "ja")],
            ),
            device_region: Some(region_table()),
        }
    }
}

impl Default for ParamTables {
    fn default() -> Self {
        Self::full()
    }
}

fn environment_table(entries: Vec<(&'static str, EnvironmentKind)>) -> EnumTable<EnvironmentKind> {
    EnumTable::new("environment", "Environment", entries)
}

fn app_type_table() -> EnumTable<AppSourceKind> {
    EnumTable::new(
        "app_type",
        "App type",
        vec![
            ("App file (cloud upload)", AppSourceKind::AppFile),
            ("App file (URL)", AppSourceKind::AppUrl),
            ("Installed app", AppSourceKind::Installed),
        ],
    )
}

fn capture_type_table() -> EnumTable<CaptureMode> {
    EnumTable::new(
        "capture_type",
        "Capture type",
        vec![
            ("Every step", CaptureMode::EveryStep),
            ("Every UI transit", CaptureMode::EveryUiTransit),
            ("Failure capture only", CaptureMode::FailureOnly),
        ],
    )
}

fn region_table() -> EnumTable<&'static str> {
    EnumTable::new(
        "device_region",
        "Device region",
        vec![
            ("Default", "Default"),
            ("Australia", "AU"),
            ("Brazil", "BR"),
            ("Canada", "CA"),
            ("China mainland", "CN"),
            ("France", "FR"),
            ("Germany", "DE"),
            ("India", "IN"),
            ("Indonesia", "ID"),
            ("Italy", "IT"),
            ("Japan", "JP"),
            ("Mexico", "MX"),
            ("Netherlands", "NL"),
            ("Russia", "RU"),
            ("Saudi Arabia", "SA"),
            ("South Korea", "KR"),
            ("Spain", "ES"),
            ("Switzerland", "CH"),
            ("Taiwan", "TW"),
            ("Turkey", "TR"),
            ("United Kingdom", "GB"),
            ("United States", "US"),
        ],
    )
}

/// Lowercases and replaces spaces with underscores: `"Real device"` → `real_device`.
pub fn to_snake_case(input: &str) -> String {
    input.trim().to_lowercase().replace(' ', "_")
}

/// Normalizes and validates settings against `tables`.
///
/// # Errors
///
/// Returns every rejected setting at once: unmatched enumerations, empty
/// device descriptors, and credentials or app-source fields that the
/// selected environment or app type requires but that are missing.
pub fn normalize(
    settings: &Settings,
    tables: &ParamTables,
) -> Result<RunConfiguration, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let os = errors.collect(required("os", "OS", Some(&settings.os)).map(|s| to_snake_case(&s)));
    let device_type = errors.collect(
        required("device_type", "Device type", Some(&settings.device_type))
            .map(|s| to_snake_case(&s)),
    );
    let version = errors.collect(required("version", "Version", Some(&settings.version)));
    let model = errors.collect(required("model", "Model", Some(&settings.model)));

    let environment_kind = errors.collect(tables.environment.lookup(&settings.environment));
    let app_kind = errors.collect(tables.app_type.lookup(&settings.app_type));
    let capture_mode = errors.collect(tables.capture_type.lookup(&settings.capture_type));
    let device_language = errors.collect(tables.device_language.lookup(&settings.device_language));
    let device_region = tables
        .device_region
        .as_ref()
        .and_then(|table| errors.collect(table.lookup(&settings.device_region)));

    let environment =
        environment_kind.and_then(|kind| resolve_environment(kind, settings, &mut errors));
    // The installed-app shape depends on the OS, so an unknown OS skips this check.
    let app_source = match (app_kind, os.as_deref()) {
        (Some(kind), Some(os)) => {
            let external = environment_kind.map(|kind| kind != EnvironmentKind::MagicPod);
            resolve_app_source(kind, os, external, settings, &mut errors)
        }
        _ => None,
    };

    match (
        os,
        device_type,
        version,
        model,
        environment,
        app_source,
        capture_mode,
        device_language,
    ) {
        (
            Some(os),
            Some(device_type),
            Some(version),
            Some(model),
            Some(environment),
            Some(app_source),
            Some(capture_mode),
            Some(device_language),
        ) if errors.is_empty() => Ok(RunConfiguration {
            organization: settings.organization_name.clone(),
            project: settings.project_name.clone(),
            environment,
            os,
            device_type,
            version,
            model,
            app_source,
            capture_mode,
            device_language: device_language.to_string(),
            device_region: device_region.map(str::to_string),
            retry_count: settings.retry_count,
            send_mail: settings.send_mail,
            multi_lang_data: settings
                .multi_lang_data
                .clone()
                .filter(|data| !data.trim().is_empty()),
        }),
        _ => Err(errors),
    }
}

fn required(
    field: &'static str,
    label: &str,
    value: Option<&String>,
) -> Result<String, FieldError> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(FieldError::new(field, format!("{label} is required"))),
    }
}

fn required_secret(
    field: &'static str,
    label: &str,
    value: Option<&Secret>,
) -> Result<Secret, FieldError> {
    match value {
        Some(secret) if !secret.is_empty() => Ok(secret.clone()),
        _ => Err(FieldError::new(field, format!("{label} is required"))),
    }
}

fn resolve_environment(
    kind: EnvironmentKind,
    settings: &Settings,
    errors: &mut ValidationErrors,
) -> Option<Environment> {
    match kind {
        EnvironmentKind::MagicPod => Some(Environment::MagicPod),
        EnvironmentKind::RemoteTestKit => errors
            .collect(required_secret(
                "external_service_token",
                "External service token for Remote TestKit",
                settings.external_service_token.as_ref(),
            ))
            .map(|token| Environment::RemoteTestKit { token }),
        EnvironmentKind::RemoteTestKitOnpremise => {
            let server_url = errors.collect(required(
                "external_service_server_url",
                "External service server URL",
                settings.external_service_server_url.as_ref(),
            ));
            let user_name = errors.collect(required(
                "external_service_user_name",
                "External service user name",
                settings.external_service_user_name.as_ref(),
            ));
            let password = errors.collect(required_secret(
                "external_service_password",
                "External service password",
                settings.external_service_password.as_ref(),
            ));
            Some(Environment::RemoteTestKitOnpremise {
                server_url: server_url?,
                user_name: user_name?,
                password: password?,
            })
        }
    }
}

/// `external` is `None` when the environment itself was rejected.
fn resolve_app_source(
    kind: AppSourceKind,
    os: &str,
    external: Option<bool>,
    settings: &Settings,
    errors: &mut ValidationErrors,
) -> Option<AppSource> {
    let bundle_id = settings
        .bundle_id
        .as_ref()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());

    // External device services need the bundle id next to an iOS file or URL.
    let file_bundle_id = |errors: &mut ValidationErrors| {
        if os == IOS && external == Some(true) && bundle_id.is_none() {
            errors.push(FieldError::new(
                "bundle_id",
                "Bundle ID is required for iOS apps on Remote TestKit",
            ));
        }
        bundle_id.clone()
    };

    match kind {
        AppSourceKind::AppFile => {
            let path = errors.collect(required(
                "app_path",
                "App path for 'App file (cloud upload)'",
                settings.app_path.as_ref(),
            ));
            let bundle_id = file_bundle_id(errors);
            path.map(|path| AppSource::UploadedFile {
                path: PathBuf::from(shellexpand::tilde(&path).as_ref()),
                bundle_id,
            })
        }
        AppSourceKind::AppUrl => {
            let url = errors.collect(required(
                "app_url",
                "App URL for 'App file (URL)'",
                settings.app_url.as_ref(),
            ));
            let bundle_id = file_bundle_id(errors);
            url.map(|url| AppSource::RemoteUrl { url, bundle_id })
        }
        AppSourceKind::Installed if os == IOS => errors
            .collect(required(
                "bundle_id",
                "Bundle ID for an installed iOS app",
                settings.bundle_id.as_ref(),
            ))
            .map(|bundle_id| AppSource::Installed(InstalledApp::Bundle { bundle_id })),
        AppSourceKind::Installed => {
            let package = errors.collect(required(
                "app_package",
                "App package for an installed app",
                settings.app_package.as_ref(),
            ));
            let activity = errors.collect(required(
                "app_activity",
                "App activity for an installed app",
                settings.app_activity.as_ref(),
            ));
            Some(AppSource::Installed(InstalledApp::Activity {
                package: package?,
                activity: activity?,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings_from_vars;

    fn settings(overrides: &[(&'static str, &'static str)]) -> Settings {
        let mut vars = vec![
            ("magic_pod_api_token", "t"),
            ("organization_name", "acme"),
            ("project_name", "shop"),
            ("environment", "Magic Pod"),
            ("os", "Android"),
            ("device_type", "Emulator"),
            ("version", "13"),
            ("model", "Pixel 7"),
            ("app_type", "App file (URL)"),
            ("app_url", "https://example.com/app.apk"),
            ("capture_type", "Every step"),
        ];
        for &(key, value) in overrides {
            vars.retain(|(k, _)| *k != key);
            vars.push((key, value));
        }
        settings_from_vars(vars).unwrap()
    }

    #[test]
    fn test_every_display_value_maps_to_its_wire_token() {
        let tables = ParamTables::full();
        let cases: Vec<(&str, &str)> = vec![
            ("Magic Pod", "magic_pod"),
            ("Remote TestKit", "remote_testkit"),
            ("Remote TestKit Onpremise", "remote_testkit_onpremise"),
        ];
        for (display, wire) in cases {
            assert_eq!(tables.environment.lookup(display).unwrap().wire(), wire);
        }

        let cases = [
            ("App file (cloud upload)", "app_file"),
            ("App file (URL)", "app_url"),
            ("Installed app", "installed"),
        ];
        for (display, wire) in cases {
            assert_eq!(tables.app_type.lookup(display).unwrap().wire(), wire);
        }

        let cases = [
            ("Every step", "on_each_step"),
            ("Every UI transit", "on_ui_transit"),
            ("Failure capture only", "on_error"),
        ];
        for (display, wire) in cases {
            assert_eq!(tables.capture_type.lookup(display).unwrap().wire(), wire);
        }

        assert_eq!(tables.device_language.lookup("Default").unwrap(), "default");
        assert_eq!(tables.device_language.lookup("English").unwrap(), "en");
        assert_eq!(tables.device_language.lookup("Japanese").unwrap(), "ja");

        let regions = tables.device_region.as_ref().unwrap();
        assert_eq!(regions.lookup("Default").unwrap(), "Default");
        assert_eq!(regions.lookup("China mainland").unwrap(), "CN");
        assert_eq!(regions.lookup("United Kingdom").unwrap(), "GB");
        assert_eq!(regions.accepted().len(), 22);
    }

    #[test]
    fn test_lookup_error_names_accepted_set() {
        let err = ParamTables::full()
            .capture_type
            .lookup("Every pixel")
            .unwrap_err();

        assert_eq!(err.field, "capture_type");
        assert!(err.message.contains("'Every step'"));
        assert!(err.message.contains("'Every UI transit'"));
        assert!(err.message.contains("'Failure capture only'"));
        assert!(err.message.contains("Every pixel"));
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let tables = ParamTables::full();
        assert!(tables.environment.lookup("magic pod").is_err());
        assert!(tables.capture_type.lookup("Every step ").is_err());
    }

    #[test]
    fn test_profiles_restrict_environments() {
        assert!(ParamTables::basic().environment.lookup("Remote TestKit").is_err());
        assert!(
            ParamTables::remote_testkit()
                .environment
                .lookup("Remote TestKit")
                .is_ok()
        );
        assert!(
            ParamTables::remote_testkit()
                .environment
                .lookup("Remote TestKit Onpremise")
                .is_err()
        );
        assert!(ParamTables::basic().device_language.lookup("Default").is_err());
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("iOS"), "ios");
        assert_eq!(to_snake_case("Real device"), "real_device");
        assert_eq!(to_snake_case("Android TV Box"), "android_tv_box");
    }

    #[test]
    fn test_normalize_valid_settings() {
        let config = normalize(&settings(&[]), &ParamTables::full()).unwrap();

        assert_eq!(config.environment, Environment::MagicPod);
        assert_eq!(config.os, "android");
        assert_eq!(config.device_type, "emulator");
        assert_eq!(config.device_language, "default");
        assert_eq!(config.device_region.as_deref(), Some("Default"));
        assert_eq!(
            config.app_source,
            AppSource::RemoteUrl {
                url: "https://example.com/app.apk".to_string(),
                bundle_id: None
            }
        );
    }

    #[test]
    fn test_independent_errors_are_all_collected() {
        let errors = normalize(
            &settings(&[("environment", "Sauce Labs"), ("capture_type", "Always")]),
            &ParamTables::full(),
        )
        .unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.fields(), vec!["environment", "capture_type"]);
    }

    #[test]
    fn test_every_invalid_enum_is_reported() {
        let errors = normalize(
            &settings(&[
                ("environment", "x"),
                ("app_type", "x"),
                ("capture_type", "x"),
                ("device_language", "Klingon"),
                ("device_region", "Atlantis"),
            ]),
            &ParamTables::full(),
        )
        .unwrap_err();

        assert_eq!(
            errors.fields(),
            vec![
                "environment",
                "app_type",
                "capture_type",
                "device_language",
                "device_region"
            ]
        );
    }

    #[test]
    fn test_region_ignored_without_region_table() {
        let config = normalize(
            &settings(&[("device_language", "English"), ("device_region", "Atlantis")]),
            &ParamTables::basic(),
        )
        .unwrap();

        assert_eq!(config.device_region, None);
        assert_eq!(config.device_language, "en");
    }

    #[test]
    fn test_missing_descriptors_are_reported() {
        let errors = normalize(
            &settings(&[("os", " "), ("model", "")]),
            &ParamTables::full(),
        )
        .unwrap_err();

        assert_eq!(errors.fields(), vec!["os", "model"]);
    }

    #[test]
    fn test_remote_testkit_requires_token() {
        let errors = normalize(
            &settings(&[("environment", "Remote TestKit")]),
            &ParamTables::full(),
        )
        .unwrap_err();
        assert_eq!(errors.fields(), vec!["external_service_token"]);

        let config = normalize(
            &settings(&[
                ("environment", "Remote TestKit"),
                ("external_service_token", "rtk"),
            ]),
            &ParamTables::full(),
        )
        .unwrap();
        assert_eq!(
            config.environment,
            Environment::RemoteTestKit {
                token: Secret::new("rtk")
            }
        );
    }

    #[test]
    fn test_onpremise_reports_every_missing_credential() {
        let errors = normalize(
            &settings(&[("environment", "Remote TestKit Onpremise")]),
            &ParamTables::full(),
        )
        .unwrap_err();
        assert_eq!(
            errors.fields(),
            vec![
                "external_service_server_url",
                "external_service_user_name",
                "external_service_password"
            ]
        );

        let errors = normalize(
            &settings(&[
                ("environment", "Remote TestKit Onpremise"),
                ("external_service_user_name", "qa"),
            ]),
            &ParamTables::full(),
        )
        .unwrap_err();
        assert_eq!(
            errors.fields(),
            vec!["external_service_server_url", "external_service_password"]
        );
    }

    #[test]
    fn test_installed_app_reports_package_and_activity() {
        let errors = normalize(
            &settings(&[("app_type", "Installed app")]),
            &ParamTables::full(),
        )
        .unwrap_err();
        assert_eq!(errors.fields(), vec!["app_package", "app_activity"]);
    }

    #[test]
    fn test_external_ios_file_requires_bundle_id() {
        let ios_url = [
            ("environment", "Remote TestKit"),
            ("external_service_token", "rtk"),
            ("os", "iOS"),
            ("app_type", "App file (URL)"),
        ];
        let errors = normalize(&settings(&ios_url), &ParamTables::full()).unwrap_err();
        assert_eq!(errors.fields(), vec!["bundle_id"]);

        let mut with_bundle = ios_url.to_vec();
        with_bundle.push(("bundle_id", "com.example.shop"));
        let config = normalize(&settings(&with_bundle), &ParamTables::full()).unwrap();
        assert_eq!(
            config.app_source,
            AppSource::RemoteUrl {
                url: "https://example.com/app.apk".to_string(),
                bundle_id: Some("com.example.shop".to_string())
            }
        );

        // Magic Pod devices read the bundle id from the app itself.
        let config = normalize(
            &settings(&[("os", "iOS"), ("app_type", "App file (URL)")]),
            &ParamTables::full(),
        )
        .unwrap();
        assert!(matches!(
            config.app_source,
            AppSource::RemoteUrl { bundle_id: None, .. }
        ));
    }

    #[test]
    fn test_installed_app_shape_depends_on_os() {
        let config = normalize(
            &settings(&[
                ("os", "iOS"),
                ("app_type", "Installed app"),
                ("bundle_id", "com.example.shop"),
            ]),
            &ParamTables::full(),
        )
        .unwrap();
        assert_eq!(
            config.app_source,
            AppSource::Installed(InstalledApp::Bundle {
                bundle_id: "com.example.shop".to_string()
            })
        );

        let errors = normalize(
            &settings(&[("app_type", "Installed app"), ("app_package", "com.example")]),
            &ParamTables::full(),
        )
        .unwrap_err();
        assert_eq!(errors.fields(), vec!["app_activity"]);
    }

    #[test]
    fn test_app_file_requires_path() {
        let errors = normalize(
            &settings(&[("app_type", "App file (cloud upload)")]),
            &ParamTables::full(),
        )
        .unwrap_err();
        assert_eq!(errors.fields(), vec!["app_path"]);
    }

    #[test]
    fn test_validation_errors_display_lists_every_error() {
        let errors = normalize(
            &settings(&[("environment", "x"), ("capture_type", "y")]),
            &ParamTables::full(),
        )
        .unwrap_err();

        let rendered = errors.to_string();
        assert!(rendered.starts_with("2 invalid setting(s):"));
        assert!(rendered.contains("\n- Environment should be one of"));
        assert!(rendered.contains("\n- Capture type should be one of"));
    }
}
