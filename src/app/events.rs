//! Defines the messages sent from background tasks to the control flow that owns the `AppState`.

use crate::core::{ScanBatch, ScanProgress};

/// Events sent from background tasks (and commands) to the owning control flow.
#[derive(Debug)]
pub enum UserEvent {
    /// A progress update during a directory scan.
    ScanProgress { generation: u64, progress: ScanProgress },
    /// A scan finished; the batch is applied only if `generation` is still current.
    ScanCompleted { generation: u64, batch: ScanBatch },
    /// A scan stopped with an error other than cancellation.
    ScanFailed { generation: u64, message: String },
    /// A new approximate token count for the current selection and prompt.
    TokenEstimate(usize),
    /// An error message to be displayed to the user.
    ShowError(String),
    /// The result of an export: success flag and destination or error message.
    ExportComplete(bool, String),
}
