//! Defines the central, mutable state of the application.

use crate::config::session::{self, SessionState};
use crate::config::AppConfig;
use crate::core::{ExportRequest, ScanProgress, SelectionTree};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Holds the complete, mutable state of the application.
///
/// Owned by a single control flow. Background scans never touch it; they
/// report through `UserEvent`s and the owner applies the results.
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Overrides the platform config directory for config and session files.
    pub config_dir: Option<PathBuf>,
    /// Remembered project path and per-project selections.
    pub session: SessionState,
    /// The absolute path of the currently loaded project, if any.
    pub project_path: Option<PathBuf>,
    /// The selection tree of the last completed scan.
    pub tree: SelectionTree,
    /// Free-text objective placed at the top of the document.
    pub prompt_text: String,
    /// `true` if a directory scan is currently in progress.
    pub is_scanning: bool,
    /// The current progress of the directory scan.
    pub scan_progress: ScanProgress,
    /// Incremented for every scan; results tagged with an older value are stale.
    pub scan_generation: u64,
    /// A handle to the currently running scan task.
    pub scan_task: Option<JoinHandle<()>>,
    /// A flag used to signal cancellation to the scan task.
    pub scan_cancellation_flag: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: AppConfig, session: SessionState, config_dir: Option<PathBuf>) -> Self {
        Self {
            config,
            config_dir,
            session,
            project_path: None,
            tree: SelectionTree::default(),
            prompt_text: String::new(),
            is_scanning: false,
            scan_progress: ScanProgress::default(),
            scan_generation: 0,
            scan_task: None,
            scan_cancellation_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stops the running scan, if any, and waits until its task has ended.
    pub async fn cancel_current_scan(&mut self) {
        self.scan_cancellation_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.scan_task.take() {
            tracing::info!("Cancelling active scan task and waiting for it to finish.");
            if let Err(e) = handle.await {
                tracing::warn!("Scan task ended abnormally: {}", e);
            }
        }
        if self.is_scanning {
            self.is_scanning = false;
            self.scan_progress = ScanProgress {
                entries_found: 0,
                current_scanning_path: "Scan cancelled.".to_string(),
            };
        }
    }

    /// Checked file paths, sorted for reproducible output.
    pub fn checked_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.tree.checked_file_paths().map(PathBuf::from).collect();
        files.sort_by_key(|path| path.to_string_lossy().into_owned());
        files
    }

    /// Builds a fresh export request from the current selection and settings.
    pub fn export_request(&self) -> ExportRequest {
        ExportRequest {
            prompt_text: self.prompt_text.clone(),
            checked_file_paths: self.checked_files(),
            project_root: self.tree.root().to_path_buf(),
            extension_map: self.config.extension_map.clone(),
            show_structure: self.config.show_project_structure,
        }
    }

    /// Stores the current selection in the session and persists it.
    pub fn remember_selection(&mut self) {
        if !self.config.restore_tree_selection {
            return;
        }
        let Some(project_path) = self.project_path.clone() else {
            return;
        };
        if self.tree.is_empty() || self.tree.root() != project_path {
            return;
        }
        self.session
            .store_tree_state(&project_path, self.tree.snapshot_state());
        self.save_session();
    }

    pub fn save_session(&self) {
        if let Err(e) = session::save_session(&self.session, self.config_dir.as_deref()) {
            tracing::warn!("Failed to save session state: {}", e);
        }
    }
}
