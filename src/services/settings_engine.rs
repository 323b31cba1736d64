//! Settings loading for Privacy Guard.
//!
//! `GuardSettings` is a JSON document at the platform config path, or at an
//! override path. The collector reads it once at startup; the file is edited
//! by hand or by the host, never by the collector.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reqwest::Url;
use tracing::{debug, warn};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::GuardSettings;

pub struct SettingsEngine {
    config_path: PathBuf,
}

impl SettingsEngine {
    /// Uses `path_override` when given, else `settings.json` in the platform
    /// config directory.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path =
            path_override.unwrap_or_else(|| platform::get_config_dir().join("settings.json"));
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Read and validate the settings file.
    ///
    /// A missing file yields defaults, and fields absent from the file keep
    /// their default. Malformed JSON and out-of-range values are errors.
    pub fn load(&self) -> Result<GuardSettings, SettingsError> {
        let content = match fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.config_path.display(), "no settings file, using defaults");
                return Ok(GuardSettings::default());
            }
            Err(e) => {
                return Err(SettingsError::IoError(format!(
                    "{}: {}",
                    self.config_path.display(),
                    e
                )))
            }
        };

        let settings: GuardSettings = serde_json::from_str(&content)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
        validate(&settings)?;
        Ok(settings)
    }

    /// [`load`](Self::load), falling back to defaults with a warning.
    pub fn load_or_default(&self) -> GuardSettings {
        self.load().unwrap_or_else(|e| {
            warn!(path = %self.config_path.display(), error = %e, "using default settings");
            GuardSettings::default()
        })
    }
}

fn validate(settings: &GuardSettings) -> Result<(), SettingsError> {
    let api = Url::parse(&settings.api_base_url)
        .map_err(|e| SettingsError::InvalidValue(format!("api_base_url: {}", e)))?;
    if !matches!(api.scheme(), "http" | "https") {
        return Err(SettingsError::InvalidValue(format!(
            "api_base_url: unsupported scheme '{}'",
            api.scheme()
        )));
    }
    if settings.session_header.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "session_header: must not be empty".to_string(),
        ));
    }
    Ok(())
}
