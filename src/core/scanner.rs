//! Walks a project directory and produces the ordered entry list the selection tree is built from.

use super::error::CoreError;
use super::{ScanBatch, ScanEntry, ScanOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanProgress {
    pub entries_found: usize,
    pub current_scanning_path: String,
}

const PROGRESS_UPDATE_INTERVAL: usize = 50;

/// Scans a root directory according to a fixed set of [`ScanOptions`].
///
/// Entries are emitted in pre-order with siblings sorted by file name, so a
/// parent always precedes its children. Directories that cannot be listed are
/// kept as empty subtrees.
pub struct ProjectScanner {
    options: ScanOptions,
}

impl ProjectScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Runs a scan without progress reporting or cancellation.
    pub fn scan(&self, root_path: &Path) -> Result<ScanBatch, CoreError> {
        self.scan_with_progress(root_path, &AtomicBool::new(false), |_| {})
    }

    /// Runs the scan on the blocking thread pool so the caller's runtime stays responsive.
    pub async fn scan_in_background<F>(
        self,
        root_path: PathBuf,
        cancel_flag: Arc<AtomicBool>,
        progress_callback: F,
    ) -> Result<ScanBatch, CoreError>
    where
        F: Fn(ScanProgress) + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            self.scan_with_progress(&root_path, &cancel_flag, progress_callback)
        })
        .await?
    }

    /// Scans `root_path`, checking `cancel_flag` before every visited entry.
    pub fn scan_with_progress<F>(
        &self,
        root_path: &Path,
        cancel_flag: &AtomicBool,
        progress_callback: F,
    ) -> Result<ScanBatch, CoreError>
    where
        F: Fn(ScanProgress),
    {
        if !root_path.is_dir() {
            return Err(CoreError::NotADirectory(root_path.to_path_buf()));
        }

        progress_callback(ScanProgress {
            entries_found: 0,
            current_scanning_path: "Starting directory scan...".to_string(),
        });

        let options = &self.options;
        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !options.is_excluded_name(&entry.file_name().to_string_lossy())
            });

        let mut entries = Vec::new();
        for entry in walker {
            if cancel_flag.load(Ordering::Relaxed) {
                tracing::info!("🛑 Scan cancelled after {} entries", entries.len());
                return Err(CoreError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Unreadable directories stay in the tree as empty subtrees.
                    tracing::debug!("Skipping unreadable path during scan: {}", e);
                    continue;
                }
            };

            let is_directory = entry.file_type().is_dir();
            if !is_directory && !options.accepts_file(entry.path()) {
                continue;
            }

            let relative_path = match entry.path().strip_prefix(root_path) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };
            let parent = relative_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf);

            entries.push(ScanEntry {
                path: entry.path().to_path_buf(),
                relative_path,
                is_directory,
                depth: entry.depth(),
                parent,
            });

            if entries.len() % PROGRESS_UPDATE_INTERVAL == 0 {
                progress_callback(ScanProgress {
                    entries_found: entries.len(),
                    current_scanning_path: format!(
                        "Scanning: {}",
                        entry.file_name().to_string_lossy()
                    ),
                });
            }
        }

        tracing::info!(
            "✅ Scan of {} completed: {} entries",
            root_path.display(),
            entries.len()
        );

        progress_callback(ScanProgress {
            entries_found: entries.len(),
            current_scanning_path: format!("Scan completed! {} entries found", entries.len()),
        });

        Ok(ScanBatch {
            root: root_path.to_path_buf(),
            entries,
        })
    }
}
