use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::ui::settings::UiSettings;

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("mars_chronica");
    path.push("ui_settings.json");
    path
}

pub fn load_settings() -> UiSettings {
    load_settings_from(&settings_path())
}

pub fn save_settings(settings: &UiSettings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

/// Missing or unreadable files fall back to defaults.
pub fn load_settings_from(path: &Path) -> UiSettings {
    let Ok(text) = fs::read_to_string(path) else {
        debug!(path = %path.display(), "no ui settings, using defaults");
        return UiSettings::default();
    };

    match serde_json::from_str::<UiSettings>(&text) {
        Ok(settings) => settings.clamped(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupt ui settings");
            UiSettings::default()
        }
    }
}

pub fn save_settings_to(path: &Path, settings: &UiSettings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
