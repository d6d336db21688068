pub mod assembler;
pub mod error;
pub mod file_handler;
pub mod scanner;
pub mod selection;
pub mod tokens;
pub mod tree_generator;

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// One file-system item discovered during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// Absolute path, unique within a scan.
    pub path: PathBuf,
    /// Path relative to the scanned root; the stable identity for persisted selection.
    pub relative_path: PathBuf,
    pub is_directory: bool,
    pub depth: usize,
    /// Relative path of the containing directory, `None` for top-level entries.
    pub parent: Option<PathBuf>,
}

/// The immutable result of one completed scan, handed across the task boundary.
#[derive(Debug, Clone, Default)]
pub struct ScanBatch {
    pub root: PathBuf,
    pub entries: Vec<ScanEntry>,
}

/// Exclusion rules applied while scanning.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub exclude_names: HashSet<String>,
    pub exclude_dotfiles: bool,
    /// Accepted file extensions, lowercase and including the leading dot (e.g. `.py`).
    pub extensions: HashSet<String>,
}

impl ScanOptions {
    /// Returns `true` if an entry with this name must not appear in the tree at all.
    pub fn is_excluded_name(&self, name: &str) -> bool {
        self.exclude_names.contains(name) || (self.exclude_dotfiles && name.starts_with('.'))
    }

    /// Returns `true` if a file's extension is one of the accepted ones.
    pub fn accepts_file(&self, path: &Path) -> bool {
        self.extensions.contains(&dotted_extension(path))
    }
}

/// Returns the lowercase extension of `path` including its leading dot, or an
/// empty string when the file has none. `.bashrc` has no extension.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Renders a relative path with `/` separators regardless of platform.
/// `.` components are dropped, so `./src` and `src` render the same.
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub use assembler::{DocumentAssembler, ExportRequest};
pub use error::CoreError;
pub use file_handler::FileHandler;
pub use scanner::{ProjectScanner, ScanProgress};
pub use selection::{EntryId, SelectionSnapshot, SelectionTree, TriState};
pub use tokens::TokenEstimator;
pub use tree_generator::TreeGenerator;
