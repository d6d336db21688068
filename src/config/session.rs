//! Persisted per-project session state: the last opened project and the
//! selection each project was left in.

use super::settings::{load_or_heal, resolve_directory, write_json};
use crate::core::SelectionSnapshot;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionState {
    pub last_project_path: String,
    /// Keyed by absolute project path.
    pub tree_states: BTreeMap<String, SelectionSnapshot>,
}

impl SessionState {
    pub fn tree_state(&self, project_path: &Path) -> Option<&SelectionSnapshot> {
        self.tree_states.get(&project_path.to_string_lossy().into_owned())
    }

    pub fn store_tree_state(&mut self, project_path: &Path, snapshot: SelectionSnapshot) {
        self.tree_states
            .insert(project_path.to_string_lossy().into_owned(), snapshot);
    }
}

/// Loads the session; a missing or malformed file yields an empty session.
pub fn load_session(config_dir: Option<&Path>) -> Result<SessionState> {
    load_or_heal(&resolve_directory(config_dir)?.join(SESSION_FILE))
}

pub fn save_session(session: &SessionState, config_dir: Option<&Path>) -> Result<()> {
    write_json(&resolve_directory(config_dir)?.join(SESSION_FILE), session)
}
