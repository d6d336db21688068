//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

use super::selection::TriState;

/// The primary error type for the `core` module.
///
/// Most read failures in the core degrade to empty or placeholder results and
/// never reach this type. What remains are caller mistakes (illegal state
/// requests, unknown entries) and failures the user has to hear about.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A toggle asked for a state that cannot be set explicitly.
    #[error("Cannot explicitly set an entry to {0:?}; only Checked or Unchecked are allowed")]
    InvalidState(TriState),

    /// The referenced entry does not exist in the current tree.
    #[error("Unknown entry: {0}")]
    UnknownEntry(String),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// Represents an error that occurred when a Tokio task was joined.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Represents a user-initiated cancellation of an operation.
    #[error("Operation was cancelled by the user")]
    Cancelled,

    /// A background scan stopped with an error reported as text.
    #[error("Scan failed: {0}")]
    ScanFailed(String),

    /// An interactively edited setting could not be parsed.
    #[error("Invalid settings value: {0}")]
    SettingsParse(String),

    /// An export was requested with no checked files and no prompt.
    #[error("No files selected and no prompt provided")]
    NothingToExport,

    /// The export destination could not be opened or written.
    #[error("Cannot write export to {1}: {0}")]
    ExportTarget(#[source] std::io::Error, PathBuf),
}
