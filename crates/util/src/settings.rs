//! Loading of [`DynamicFormSettings`] from disk.
//!
//! Settings live in the standard configuration directory
//! (`~/.config/dynaform/settings.json` on most platforms) unless
//! `DYNAFORM_SETTINGS_PATH` points elsewhere. Every key is optional; a missing
//! file means defaults.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use dirs_next::config_dir;
use dynaform_types::DynamicFormSettings;
use thiserror::Error;
use tracing::{debug, warn};

use crate::expand_tilde;

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "DYNAFORM_SETTINGS_PATH";

/// Default filename for the JSON payload.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Error surfaced when reading settings fails.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O failure other than a missing file (for example, permissions).
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization failure.
    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Resolves the settings path from the environment override or the config directory.
pub fn default_settings_path() -> PathBuf {
    if let Ok(path) = env::var(SETTINGS_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dynaform")
        .join(SETTINGS_FILE_NAME)
}

/// Loads settings from [`default_settings_path`].
pub fn load_settings() -> Result<DynamicFormSettings, SettingsError> {
    load_settings_from(&default_settings_path())
}

/// Loads settings from `path`. Missing files and unparsable documents yield defaults.
pub fn load_settings_from(path: &Path) -> Result<DynamicFormSettings, SettingsError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(settings) => {
                debug!(path = %path.display(), "loaded dynamic form settings");
                Ok(settings)
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse settings file; using defaults"
                );
                Ok(DynamicFormSettings::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(DynamicFormSettings::default()),
        Err(error) => Err(SettingsError::Io(error)),
    }
}

/// Writes `settings` as pretty JSON, creating parent directories.
pub fn save_settings_to(path: &Path, settings: &DynamicFormSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(settings)?;
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings_from(&dir.path().join("absent.json")).expect("load settings");
        assert_eq!(settings, DynamicFormSettings::default());
    }

    #[test]
    fn partial_file_overrides_selected_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{"error_field_name": "_invalid_dependents", "cleanup_listener_priority": -10}"#)
            .expect("write settings");

        let settings = load_settings_from(&path).expect("load settings");
        assert_eq!(settings.error_field_name, "_invalid_dependents");
        assert_eq!(settings.cleanup_listener_priority, -10);
        assert_eq!(settings.error_message, DynamicFormSettings::default().error_message);
    }

    #[test]
    fn unparsable_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "{not json").expect("write settings");

        assert_eq!(load_settings_from(&path).expect("load settings"), DynamicFormSettings::default());
    }

    #[test]
    fn directories_are_io_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = load_settings_from(dir.path()).expect_err("directory is not a file");
        assert!(matches!(error, SettingsError::Io(_)));
    }

    #[test]
    fn environment_override_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("custom.json");
        let settings = DynamicFormSettings {
            error_message: "Please review your choices.".into(),
            ..DynamicFormSettings::default()
        };
        save_settings_to(&path, &settings).expect("save settings");

        temp_env::with_var(SETTINGS_PATH_ENV, Some(path.as_os_str()), || {
            assert_eq!(default_settings_path(), path);
            assert_eq!(load_settings().expect("load settings"), settings);
        });
    }

    #[test]
    fn blank_override_falls_back_to_config_dir() {
        temp_env::with_var(SETTINGS_PATH_ENV, Some("  "), || {
            let path = default_settings_path();
            assert!(path.ends_with(Path::new("dynaform").join(SETTINGS_FILE_NAME)));
        });
    }
}
