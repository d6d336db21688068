use anyhow::Result;
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;

const APP_NAME: &str = "ProjectDocumenter";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "projectdocumenter", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Resolves the directory to use, preferring an explicit override.
pub(crate) fn resolve_directory(config_dir: Option<&Path>) -> Result<PathBuf> {
    match config_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => get_config_directory()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the application configuration.
///
/// A missing file is created with defaults. A file that cannot be parsed is
/// replaced with defaults as well; the user is not asked. Extension keys are
/// normalised the same way interactive edits are.
pub fn load_config(config_dir: Option<&Path>) -> Result<AppConfig> {
    let config_path = resolve_directory(config_dir)?.join(CONFIG_FILE);
    let mut config: AppConfig = load_or_heal(&config_path)?;
    config.normalize_extension_keys();
    Ok(config)
}

/// Saves the provided configuration to the config file.
pub fn save_config(config: &AppConfig, config_dir: Option<&Path>) -> Result<()> {
    let config_path = resolve_directory(config_dir)?.join(CONFIG_FILE);
    write_json(&config_path, config)
}

/// Reads a JSON document, writing `T::default()` in its place when it is
/// missing or malformed.
pub(crate) fn load_or_heal<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Serialize + Default,
{
    if !path.exists() {
        tracing::info!("{:?} not found, writing defaults", path);
        let defaults = T::default();
        write_json(path, &defaults)?;
        return Ok(defaults);
    }

    let content = fs::read_to_string(path)?;
    match serde_json::from_str::<T>(&content) {
        Ok(value) => {
            tracing::info!("Loaded {:?}", path);
            Ok(value)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse {:?}: {}. Replacing it with defaults.",
                path,
                e
            );
            let defaults = T::default();
            write_json(path, &defaults)?;
            Ok(defaults)
        }
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            tracing::info!("Created config directory: {:?}", dir);
        }
    }

    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    tracing::debug!("Saved {:?}", path);
    Ok(())
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.projectdocumenter.ProjectDocumenter/
// Linux:   ~/.config/projectdocumenter/
// Windows: %APPDATA%/projectdocumenter/ProjectDocumenter/config/
