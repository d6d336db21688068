pub mod session;
pub mod settings;

use crate::core::{CoreError, ScanOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The persisted per-installation configuration.
///
/// Fields missing from a stored file take their default value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Dotted file extension (e.g. `.py`) to Markdown fence language.
    pub extension_map: BTreeMap<String, String>,
    /// File and folder names that never appear in the tree.
    pub exclude_list: Vec<String>,
    pub exclude_dotfiles: bool,
    pub show_project_structure: bool,
    pub remember_project_path: bool,
    pub restore_tree_selection: bool,
}

impl AppConfig {
    /// Brings keys of a stored extension map into the form lookups expect.
    /// Empty keys are dropped.
    pub fn normalize_extension_keys(&mut self) {
        let raw = std::mem::take(&mut self.extension_map);
        for (ext, language) in raw {
            match normalize_extension_key(&ext) {
                Some(key) => {
                    self.extension_map.insert(key, language);
                }
                None => tracing::warn!("Ignoring empty extension key in stored config."),
            }
        }
    }

    /// The exclusion rules handed to the scanner.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            exclude_names: self.exclude_list.iter().cloned().collect(),
            exclude_dotfiles: self.exclude_dotfiles,
            extensions: self.extension_map.keys().cloned().collect(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let extension_map = [
            (".py", "python"),
            (".sql", "sql"),
            (".js", "javascript"),
            (".html", "html"),
            (".css", "css"),
            (".json", "json"),
            (".md", "markdown"),
            (".txt", "text"),
            (".yml", "yaml"),
            (".yaml", "yaml"),
            (".toml", "toml"),
            (".ini", "ini"),
            (".sh", "bash"),
            (".bat", "batch"),
            (".dockerfile", "dockerfile"),
        ]
        .iter()
        .map(|(ext, lang)| (ext.to_string(), lang.to_string()))
        .collect();

        let exclude_list = [
            "__pycache__",
            ".git",
            ".vscode",
            "node_modules",
            "venv",
            ".env",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect();

        Self {
            extension_map,
            exclude_list,
            exclude_dotfiles: true,
            show_project_structure: true,
            remember_project_path: true,
            restore_tree_selection: true,
        }
    }
}

/// Parses an interactively edited extension map.
///
/// The text must be a JSON object of strings. Keys are lowercased and get a
/// leading `.` if it is missing.
pub fn parse_extension_map(text: &str) -> Result<BTreeMap<String, String>, CoreError> {
    let raw: BTreeMap<String, String> = serde_json::from_str(text).map_err(|e| {
        CoreError::SettingsParse(format!("extension map must be a JSON object of strings: {e}"))
    })?;

    let mut map = BTreeMap::new();
    for (ext, language) in raw {
        let ext = normalize_extension_key(&ext).ok_or_else(|| {
            CoreError::SettingsParse("extension map contains an empty extension".to_string())
        })?;
        map.insert(ext, language.trim().to_string());
    }
    Ok(map)
}

/// Lowercases an extension and adds the leading `.`; `None` for an empty one.
fn normalize_extension_key(ext: &str) -> Option<String> {
    let ext = ext.trim().to_lowercase();
    match ext.as_str() {
        "" | "." => None,
        _ if ext.starts_with('.') => Some(ext),
        _ => Some(format!(".{ext}")),
    }
}

/// Parses an exclude list with one name per line, dropping blank lines.
pub fn parse_exclude_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
