//! Helpers shared by the dynaform binaries: settings loading and path handling.

pub mod path_processing;
pub mod settings;

pub use path_processing::expand_tilde;
pub use settings::{
    SETTINGS_PATH_ENV, SettingsError, default_settings_path, load_settings, load_settings_from, save_settings_to,
};
