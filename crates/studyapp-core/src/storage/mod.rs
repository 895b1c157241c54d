mod config;
pub mod database;

pub use config::{Config, GoalsConfig, NotificationsConfig, TimerConfig};
pub use database::{Database, NewStudySession, StudySession};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/studyapp[-dev]/` based on STUDYAPP_ENV.
///
/// Set STUDYAPP_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYAPP_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studyapp-dev")
    } else {
        base_dir.join("studyapp")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
