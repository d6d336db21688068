//! The application layer: owned state, commands, and the background scan plumbing.
//!
//! `AppState` is owned by one control flow. Background scans report through
//! `UserEvent`s, which the owner feeds back into `handle_user_event`.

pub mod commands;
pub mod events;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;

use crate::core::CoreError;
use events::UserEvent;
use proxy::EventProxy;
use state::AppState;
use tokio::sync::mpsc::UnboundedReceiver;

/// What the owner should know after an event was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// State changed (or nothing happened) and the flow may continue.
    Handled,
    /// The current scan finished and its tree is now in place.
    ScanApplied,
    /// The current scan failed with the given message.
    ScanFailed(String),
}

/// Applies one event to the state.
pub fn handle_user_event<P: EventProxy>(
    event: UserEvent,
    proxy: &P,
    state: &mut AppState,
) -> EventOutcome {
    match event {
        UserEvent::ScanProgress { generation, progress } => {
            if generation == state.scan_generation {
                state.scan_progress = progress;
            }
            EventOutcome::Handled
        }
        UserEvent::ScanCompleted { generation, batch } => {
            if commands::apply_scan_result(generation, batch, proxy, state) {
                EventOutcome::ScanApplied
            } else {
                EventOutcome::Handled
            }
        }
        UserEvent::ScanFailed { generation, message } => {
            if generation != state.scan_generation {
                return EventOutcome::Handled;
            }
            state.is_scanning = false;
            state.scan_task = None;
            state.scan_progress.current_scanning_path = format!("Scan failed: {message}");
            EventOutcome::ScanFailed(message)
        }
        UserEvent::TokenEstimate(tokens) => {
            tracing::debug!("Token estimate: {}", tokens);
            EventOutcome::Handled
        }
        UserEvent::ShowError(message) => {
            tracing::error!("{}", message);
            EventOutcome::Handled
        }
        UserEvent::ExportComplete(success, detail) => {
            if success {
                tracing::info!("Exported document to {}", detail);
            } else {
                tracing::warn!("Export failed: {}", detail);
            }
            EventOutcome::Handled
        }
    }
}

/// Drains events until the current scan has been applied or has failed.
pub async fn wait_for_scan<P: EventProxy>(
    events: &mut UnboundedReceiver<UserEvent>,
    proxy: &P,
    state: &mut AppState,
) -> Result<(), CoreError> {
    while let Some(event) = events.recv().await {
        match handle_user_event(event, proxy, state) {
            EventOutcome::Handled => {}
            EventOutcome::ScanApplied => return Ok(()),
            EventOutcome::ScanFailed(message) => return Err(CoreError::ScanFailed(message)),
        }
    }
    Err(CoreError::Cancelled)
}
