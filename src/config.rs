use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the preferences file location.
pub const PREFERENCES_ENV: &str = "EDITOR_HOST_PREFS";

#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Window title when no project is open; prefixes the project path otherwise.
    pub app_title: String,
    pub recent_projects_limit: usize,
    /// How long a drain may wait on one editor before the user is told about it.
    pub drain_stall_after: Duration,
    pub preferences_path: PathBuf,
}

impl HostConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            app_title: "Editor Host".into(),
            recent_projects_limit: 10,
            drain_stall_after: Duration::from_secs(3),
            preferences_path: resolve_preferences_path(std::env::var_os(PREFERENCES_ENV))?,
        })
    }
}

fn resolve_preferences_path(env_override: Option<OsString>) -> Result<PathBuf> {
    match env_override {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => dirs::config_dir()
            .map(|dir| dir.join("editor-host").join("preferences.json"))
            .context("no configuration directory on this platform; set EDITOR_HOST_PREFS"),
    }
}
