//! Contains helper functions to reduce boilerplate code in other `app` modules.

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::AppState;
use crate::core::{CoreError, TokenEstimator};

/// Runs a selection mutation, then persists the selection and sends a fresh
/// token estimate. Nothing is persisted or sent if the mutation fails.
pub fn with_selection_and_notify<F, P: EventProxy>(
    state: &mut AppState,
    proxy: &P,
    update_fn: F,
) -> Result<(), CoreError>
where
    F: FnOnce(&mut AppState) -> Result<(), CoreError>,
{
    update_fn(state)?;

    state.remember_selection();
    let estimate = TokenEstimator::estimate(&state.prompt_text, &state.checked_files());
    proxy.send_event(UserEvent::TokenEstimate(estimate));
    Ok(())
}
