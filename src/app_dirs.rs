use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "splitz").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Log file and attempt history live here
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("splitz"))
        } else {
            ProjectDirs::from("", "", "splitz").map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn history_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.csv"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("splitz.log"))
    }
}
