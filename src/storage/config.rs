use std::path::{Path, PathBuf};

use anyhow::Context;

use domestika_core::models::settings::Settings;

const CONFIG_ENV: &str = "DOMESTIKA_DL_CONFIG";
const CONFIG_FILE: &str = "settings.json";

/// `DOMESTIKA_DL_CONFIG`, else `./settings.json` when present, else the
/// per-user config directory.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return local;
    }

    dirs::config_dir()
        .map(|d| d.join("domestika-dl").join(CONFIG_FILE))
        .unwrap_or(local)
}

/// A missing file yields defaults; an unreadable or invalid one is an error.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        tracing::warn!("No settings file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let settings = serde_json::from_str::<Settings>(&raw)
        .with_context(|| format!("Invalid settings file {}", path.display()))?;

    tracing::debug!("Settings loaded from {}", path.display());
    Ok(settings)
}
