//! Reads file contents for token estimation and document assembly.

use super::error::CoreError;
use std::fs;
use std::path::Path;

pub struct FileHandler;

impl FileHandler {
    /// Reads a file as UTF-8, replacing invalid sequences.
    pub fn read_file_content(file_path: &Path) -> Result<String, CoreError> {
        let bytes = fs::read(file_path).map_err(|e| CoreError::Io(e, file_path.to_path_buf()))?;
        match String::from_utf8(bytes) {
            Ok(content) => Ok(content),
            Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }

    /// Reads a file, returning an empty string if it cannot be read.
    pub fn read_text_best_effort(file_path: &Path) -> String {
        Self::read_file_content(file_path).unwrap_or_else(|e| {
            tracing::debug!("Treating unreadable file as empty: {}", e);
            String::new()
        })
    }

    /// Reads a file for embedding in a document; failures become an inline placeholder.
    pub fn read_for_export(file_path: &Path) -> String {
        match Self::read_file_content(file_path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read {} for export: {}", file_path.display(), e);
                match e {
                    CoreError::Io(source, _) => format!("Error reading file: {source}"),
                    other => format!("Error reading file: {other}"),
                }
            }
        }
    }
}
