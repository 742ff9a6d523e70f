// Pcheckers — Config Module
//
// Per-user settings, read from the home directory.

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::{safe_string, ConfigValue, Settings, CONFIG_REL_PATH, DEFAULT_CONFIG, KEY_ABS_PATH};
