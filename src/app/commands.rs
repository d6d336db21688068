//! Command handlers invoked by the presentation layer.
//!
//! Each handler operates on the `AppState` owned by the caller's control
//! flow and reports asynchronous outcomes through an `EventProxy`.

use super::events::UserEvent;
use super::helpers::with_selection_and_notify;
use super::proxy::EventProxy;
use super::state::AppState;
use super::tasks::start_scan_on_path;
use crate::config::{self, parse_exclude_list, parse_extension_map};
use crate::core::{CoreError, DocumentAssembler, SelectionTree, TokenEstimator, TriState};
use std::path::{Path, PathBuf};

/// Interactive edits from a settings dialog. Text fields are validated strictly.
#[derive(Debug, Clone)]
pub struct SettingsEdit {
    pub extension_map_text: String,
    pub exclude_list_text: String,
    pub exclude_dotfiles: bool,
    pub show_project_structure: bool,
    pub remember_project_path: bool,
    pub restore_tree_selection: bool,
}

/// Opens a project directory and starts scanning it.
pub async fn load_project<P: EventProxy>(
    path: PathBuf,
    proxy: P,
    state: &mut AppState,
) -> Result<(), CoreError> {
    state.remember_selection();
    start_scan_on_path(path, proxy, state).await
}

/// Re-scans the currently loaded project, keeping its selection.
pub async fn rescan_project<P: EventProxy>(proxy: P, state: &mut AppState) -> Result<(), CoreError> {
    let Some(path) = state.project_path.clone() else {
        return Ok(());
    };
    state.remember_selection();
    start_scan_on_path(path, proxy, state).await
}

/// Cancels the ongoing directory scan.
pub async fn cancel_scan(state: &mut AppState) {
    state.cancel_current_scan().await;
}

/// Replaces the tree with a completed scan and restores the remembered selection.
///
/// Returns `false` if the batch belongs to an outdated scan and was discarded.
pub fn apply_scan_result<P: EventProxy>(
    generation: u64,
    batch: crate::core::ScanBatch,
    proxy: &P,
    state: &mut AppState,
) -> bool {
    if generation != state.scan_generation {
        tracing::warn!(
            "Discarding results of stale scan #{} (current is #{}).",
            generation,
            state.scan_generation
        );
        return false;
    }

    let mut tree = SelectionTree::from_batch(&batch);
    if state.config.restore_tree_selection {
        if let Some(snapshot) = state.session.tree_state(&batch.root) {
            tree.restore_state(&snapshot.checked, &snapshot.expanded);
            tracing::info!("Restored {} checked files from the session.", tree.checked_file_count());
        }
    }

    state.tree = tree;
    state.is_scanning = false;
    state.scan_task = None;
    state.scan_progress.entries_found = batch.entries.len();
    state.scan_progress.current_scanning_path =
        format!("Scan complete. Found {} items.", batch.entries.len());

    let estimate = TokenEstimator::estimate(&state.prompt_text, &state.checked_files());
    proxy.send_event(UserEvent::TokenEstimate(estimate));
    true
}

/// Toggles the entry at `relative_path`, flipping it when `explicit_state` is `None`.
pub fn toggle_entry<P: EventProxy>(
    relative_path: &Path,
    explicit_state: Option<TriState>,
    proxy: &P,
    state: &mut AppState,
) -> Result<(), CoreError> {
    with_selection_and_notify(state, proxy, |s| {
        let id = s
            .tree
            .find(relative_path)
            .ok_or_else(|| CoreError::UnknownEntry(relative_path.display().to_string()))?;
        s.tree.toggle(id, explicit_state)
    })
}

/// Checks or unchecks every entry.
pub fn toggle_all<P: EventProxy>(
    new_state: TriState,
    proxy: &P,
    state: &mut AppState,
) -> Result<(), CoreError> {
    with_selection_and_notify(state, proxy, |s| s.tree.toggle_all(new_state))
}

/// Records whether a directory is expanded in the presentation layer.
pub fn set_expanded(relative_path: &Path, expanded: bool, state: &mut AppState) -> Result<(), CoreError> {
    let id = state
        .tree
        .find(relative_path)
        .ok_or_else(|| CoreError::UnknownEntry(relative_path.display().to_string()))?;
    state.tree.set_expanded(id, expanded);
    state.remember_selection();
    Ok(())
}

/// Replaces the prompt text and sends a fresh token estimate.
pub fn update_prompt<P: EventProxy>(text: String, proxy: &P, state: &mut AppState) {
    state.prompt_text = text;
    proxy.send_event(UserEvent::TokenEstimate(estimate_tokens(state)));
}

/// Approximate token count of the prompt plus all checked files.
pub fn estimate_tokens(state: &AppState) -> usize {
    TokenEstimator::estimate(&state.prompt_text, &state.checked_files())
}

/// Renders the document for the current selection.
pub fn generate_document(state: &AppState) -> String {
    DocumentAssembler::assemble(&state.export_request())
}

/// Validates and applies a settings edit, then re-scans the loaded project.
///
/// Invalid text is reported to the user and leaves the current settings untouched.
pub async fn update_config<P: EventProxy>(
    edit: SettingsEdit,
    proxy: P,
    state: &mut AppState,
) -> Result<(), CoreError> {
    let extension_map = match parse_extension_map(&edit.extension_map_text) {
        Ok(map) => map,
        Err(e) => {
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return Err(e);
        }
    };

    state.remember_selection();
    state.config.extension_map = extension_map;
    state.config.exclude_list = parse_exclude_list(&edit.exclude_list_text);
    state.config.exclude_dotfiles = edit.exclude_dotfiles;
    state.config.show_project_structure = edit.show_project_structure;
    state.config.remember_project_path = edit.remember_project_path;
    state.config.restore_tree_selection = edit.restore_tree_selection;

    if let Err(e) = config::settings::save_config(&state.config, state.config_dir.as_deref()) {
        tracing::warn!("Failed to save config after update: {}", e);
    }

    rescan_project(proxy, state).await
}

/// Assembles the document and writes it to `destination`.
///
/// Nothing is written when no destination was chosen or there is nothing to export.
pub fn export_document<P: EventProxy>(
    destination: Option<&Path>,
    proxy: &P,
    state: &AppState,
) -> Result<PathBuf, CoreError> {
    let result = export_to(destination, state);
    match &result {
        Ok(path) => proxy.send_event(UserEvent::ExportComplete(true, path.display().to_string())),
        Err(e) => {
            tracing::error!("Export failed: {}", e);
            proxy.send_event(UserEvent::ExportComplete(false, e.to_string()));
        }
    }
    result
}

fn export_to(destination: Option<&Path>, state: &AppState) -> Result<PathBuf, CoreError> {
    let request = state.export_request();
    if request.checked_file_paths.is_empty() && request.prompt_text.trim().is_empty() {
        return Err(CoreError::NothingToExport);
    }

    let destination = destination.ok_or_else(|| {
        CoreError::ExportTarget(
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "no destination selected"),
            PathBuf::new(),
        )
    })?;

    let document = DocumentAssembler::assemble(&request);
    DocumentAssembler::write_to(destination, &document)?;
    Ok(destination.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::session::SessionState;
    use crate::config::AppConfig;
    use crate::core::{ProjectScanner, ScanBatch};
    use crate::utils::test_helpers::setup_test_logging;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::mpsc;

    struct TestHarness {
        state: AppState,
        proxy: mpsc::UnboundedSender<UserEvent>,
        event_rx: mpsc::UnboundedReceiver<UserEvent>,
        root_path: PathBuf,
        _project_dir: TempDir,
        _config_dir: TempDir,
    }

    impl TestHarness {
        fn new() -> Self {
            setup_test_logging();
            let project_dir = tempdir().unwrap();
            let config_dir = tempdir().unwrap();
            let (tx, rx) = mpsc::unbounded_channel();
            let state = AppState::new(
                AppConfig::default(),
                SessionState::default(),
                Some(config_dir.path().to_path_buf()),
            );

            Self {
                state,
                proxy: tx,
                event_rx: rx,
                root_path: project_dir.path().to_path_buf(),
                _project_dir: project_dir,
                _config_dir: config_dir,
            }
        }

        fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
            let path = self.root_path.join(relative_path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        /// Scans synchronously and applies the batch as the current generation.
        fn load_synchronously(&mut self) {
            let batch: ScanBatch = ProjectScanner::new(self.state.config.scan_options())
                .scan(&self.root_path)
                .unwrap();
            self.state.project_path = Some(self.root_path.clone());
            self.state.scan_generation += 1;
            let generation = self.state.scan_generation;
            assert!(apply_scan_result(generation, batch, &self.proxy, &mut self.state));
        }

        fn last_token_estimate(&mut self) -> Option<usize> {
            let mut last = None;
            while let Ok(event) = self.event_rx.try_recv() {
                if let UserEvent::TokenEstimate(tokens) = event {
                    last = Some(tokens);
                }
            }
            last
        }
    }

    #[test]
    fn test_toggle_entry_updates_estimate_and_session() {
        let mut harness = TestHarness::new();
        harness.create_file("a.py", "12345678");
        harness.create_file("b/c.py", "1234");
        harness.load_synchronously();

        toggle_entry(Path::new("a.py"), None, &harness.proxy, &mut harness.state).unwrap();

        assert_eq!(harness.last_token_estimate(), Some(2));
        let stored = harness.state.session.tree_state(&harness.root_path).unwrap();
        assert_eq!(stored.checked, vec!["a.py"]);
        let b = harness.state.tree.find(Path::new("b")).unwrap();
        assert_eq!(harness.state.tree.state(b), TriState::Unchecked);
    }

    #[test]
    fn test_toggle_unknown_entry_is_an_error() {
        let mut harness = TestHarness::new();
        harness.create_file("a.py", "");
        harness.load_synchronously();

        let result = toggle_entry(Path::new("nope.py"), None, &harness.proxy, &mut harness.state);

        assert!(matches!(result, Err(CoreError::UnknownEntry(_))));
        assert_eq!(harness.last_token_estimate(), None);
    }

    #[test]
    fn test_selection_survives_rescan() {
        let mut harness = TestHarness::new();
        harness.create_file("src/main.py", "main");
        harness.create_file("src/util.py", "util");
        harness.load_synchronously();
        toggle_entry(Path::new("src/util.py"), None, &harness.proxy, &mut harness.state).unwrap();
        set_expanded(Path::new("src"), true, &mut harness.state).unwrap();

        harness.create_file("src/new.py", "new");
        harness.load_synchronously();

        let tree = &harness.state.tree;
        let src = tree.find(Path::new("src")).unwrap();
        assert_eq!(tree.state(src), TriState::Partial);
        assert!(tree.is_expanded(src));
        assert_eq!(harness.state.checked_files(), vec![harness.root_path.join("src/util.py")]);
    }

    #[test]
    fn test_stale_scan_result_is_discarded() {
        let mut harness = TestHarness::new();
        harness.create_file("a.py", "");
        harness.state.scan_generation = 5;

        let applied = apply_scan_result(4, ScanBatch::default(), &harness.proxy, &mut harness.state);

        assert!(!applied);
        assert!(harness.state.tree.is_empty());
    }

    #[test]
    fn test_prompt_only_document() {
        let mut harness = TestHarness::new();
        harness.create_file("a.py", "");
        harness.load_synchronously();

        update_prompt("Fix the bug".to_string(), &harness.proxy, &mut harness.state);

        assert_eq!(generate_document(&harness.state), "# 🎯 Objective\n\nFix the bug\n\n---\n\n");
        assert_eq!(harness.last_token_estimate(), Some(2));
    }

    #[test]
    fn test_export_requires_content_and_destination() {
        let mut harness = TestHarness::new();
        harness.create_file("a.py", "x");
        harness.load_synchronously();
        let out = harness.root_path.join("out.md");

        assert!(matches!(
            export_document(Some(&out), &harness.proxy, &harness.state),
            Err(CoreError::NothingToExport)
        ));

        toggle_all(TriState::Checked, &harness.proxy, &mut harness.state).unwrap();
        assert!(matches!(
            export_document(None, &harness.proxy, &harness.state),
            Err(CoreError::ExportTarget(_, _))
        ));

        let written = export_document(Some(&out), &harness.proxy, &harness.state).unwrap();
        assert_eq!(written, out);
        assert!(fs::read_to_string(&out).unwrap().contains("```python\nx\n```"));
    }

    #[tokio::test]
    async fn test_invalid_settings_edit_is_reported_and_ignored() {
        let mut harness = TestHarness::new();
        let before = harness.state.config.clone();
        let edit = SettingsEdit {
            extension_map_text: "not a map".to_string(),
            exclude_list_text: "target".to_string(),
            exclude_dotfiles: false,
            show_project_structure: false,
            remember_project_path: true,
            restore_tree_selection: true,
        };

        let result = update_config(edit, harness.proxy.clone(), &mut harness.state).await;

        assert!(matches!(result, Err(CoreError::SettingsParse(_))));
        assert_eq!(harness.state.config, before);
        assert!(matches!(
            harness.event_rx.try_recv(),
            Ok(UserEvent::ShowError(_))
        ));
    }
}
