//! The tri-state selection tree.
//!
//! Entries are stored in an arena and addressed by [`EntryId`]. Parent and
//! child links are indices, so the tree holds no reference cycles. Every
//! mutation runs in two phases: the new binary state is pushed down to all
//! descendants, then ancestors are re-derived from their immediate children
//! until one of them comes out unchanged.

use super::error::CoreError;
use super::{to_slash_path, ScanBatch};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Selection status of one entry. Files are only ever `Checked` or `Unchecked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriState {
    Unchecked,
    Checked,
    Partial,
}

/// Stable index of an entry within one [`SelectionTree`].
///
/// Ids are only meaningful for the tree that issued them. A tree is replaced
/// after every scan, so ids must be looked up again (see [`SelectionTree::find`])
/// instead of being kept across scans. Accessors panic on a foreign id;
/// [`SelectionTree::contains`] checks one first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

/// The persisted part of a selection, keyed by `/`-separated relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub checked: Vec<String>,
    pub expanded: Vec<String>,
}

#[derive(Debug, Clone)]
struct Node {
    path: PathBuf,
    relative_key: String,
    is_directory: bool,
    /// `true` if the entry is a file or has a file somewhere below it.
    has_files: bool,
    parent: Option<EntryId>,
    children: Vec<EntryId>,
    state: TriState,
    expanded: bool,
}

/// Holds one node per scanned entry together with its selection state.
///
/// Not synchronized: the tree is owned by a single control flow and replaced
/// wholesale after every scan.
#[derive(Debug, Clone, Default)]
pub struct SelectionTree {
    root: PathBuf,
    nodes: Vec<Node>,
    roots: Vec<EntryId>,
    by_key: HashMap<String, EntryId>,
}

impl SelectionTree {
    /// Builds a fresh, fully unchecked tree from a scan result.
    ///
    /// The batch must list parents before their children, which is what the
    /// scanner produces.
    pub fn from_batch(batch: &ScanBatch) -> Self {
        let mut tree = Self {
            root: batch.root.clone(),
            nodes: Vec::with_capacity(batch.entries.len()),
            roots: Vec::new(),
            by_key: HashMap::with_capacity(batch.entries.len()),
        };

        for entry in &batch.entries {
            let id = EntryId(tree.nodes.len());
            let relative_key = to_slash_path(&entry.relative_path);
            let parent = entry
                .parent
                .as_deref()
                .and_then(|p| tree.by_key.get(&to_slash_path(p)).copied());

            match parent {
                Some(parent_id) => tree.nodes[parent_id.0].children.push(id),
                None => tree.roots.push(id),
            }

            tree.by_key.insert(relative_key.clone(), id);
            tree.nodes.push(Node {
                path: entry.path.clone(),
                relative_key,
                is_directory: entry.is_directory,
                has_files: !entry.is_directory,
                parent,
                children: Vec::new(),
                state: TriState::Unchecked,
                expanded: false,
            });
        }

        // Children always come after their parent, so one reverse pass suffices.
        for index in (0..tree.nodes.len()).rev() {
            if tree.nodes[index].has_files {
                if let Some(parent) = tree.nodes[index].parent {
                    tree.nodes[parent.0].has_files = true;
                }
            }
        }

        tree
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level entries in scan order.
    pub fn roots(&self) -> &[EntryId] {
        &self.roots
    }

    /// Returns `true` if `id` was issued by this tree.
    pub fn contains(&self, id: EntryId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn children(&self, id: EntryId) -> &[EntryId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.nodes[id.0].parent
    }

    pub fn state(&self, id: EntryId) -> TriState {
        self.nodes[id.0].state
    }

    pub fn is_directory(&self, id: EntryId) -> bool {
        self.nodes[id.0].is_directory
    }

    pub fn is_expanded(&self, id: EntryId) -> bool {
        self.nodes[id.0].expanded
    }

    /// Absolute path of the entry.
    pub fn path(&self, id: EntryId) -> &Path {
        &self.nodes[id.0].path
    }

    /// `/`-separated path relative to the project root.
    pub fn relative_key(&self, id: EntryId) -> &str {
        &self.nodes[id.0].relative_key
    }

    /// Looks up an entry by its relative path.
    pub fn find(&self, relative_path: &Path) -> Option<EntryId> {
        self.by_key.get(&to_slash_path(relative_path)).copied()
    }

    /// All entry ids in scan order.
    pub fn ids(&self) -> impl Iterator<Item = EntryId> {
        (0..self.nodes.len()).map(EntryId)
    }

    /// Sets an entry to `Checked` or `Unchecked` and propagates the change.
    ///
    /// With `explicit_state == None` the entry flips: `Checked` becomes
    /// `Unchecked`, anything else becomes `Checked`.
    pub fn toggle(&mut self, id: EntryId, explicit_state: Option<TriState>) -> Result<(), CoreError> {
        let node = self
            .nodes
            .get(id.0)
            .ok_or_else(|| CoreError::UnknownEntry(format!("#{}", id.0)))?;

        let new_state = match explicit_state {
            Some(TriState::Partial) => return Err(CoreError::InvalidState(TriState::Partial)),
            Some(state) => state,
            None if node.state == TriState::Checked => TriState::Unchecked,
            None => TriState::Checked,
        };

        self.nodes[id.0].state = new_state;
        self.propagate_down(id, new_state);
        self.propagate_up(id);
        Ok(())
    }

    /// Applies `toggle` to every top-level entry.
    pub fn toggle_all(&mut self, state: TriState) -> Result<(), CoreError> {
        if state == TriState::Partial {
            return Err(CoreError::InvalidState(state));
        }
        for id in self.roots.clone() {
            self.toggle(id, Some(state))?;
        }
        Ok(())
    }

    pub fn set_expanded(&mut self, id: EntryId, expanded: bool) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.expanded = expanded;
        }
    }

    /// Absolute paths of every checked file, in scan order.
    ///
    /// The iterator is lazy; calling this again restarts the traversal.
    pub fn checked_file_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.nodes
            .iter()
            .filter(|node| !node.is_directory && node.state == TriState::Checked)
            .map(|node| node.path.as_path())
    }

    pub fn checked_file_count(&self) -> usize {
        self.checked_file_paths().count()
    }

    /// Captures the checked files and expanded directories by relative path.
    pub fn snapshot_state(&self) -> SelectionSnapshot {
        let mut checked: Vec<String> = self
            .nodes
            .iter()
            .filter(|node| !node.is_directory && node.state == TriState::Checked)
            .map(|node| node.relative_key.clone())
            .collect();
        let mut expanded: Vec<String> = self
            .nodes
            .iter()
            .filter(|node| node.is_directory && node.expanded)
            .map(|node| node.relative_key.clone())
            .collect();
        checked.sort();
        expanded.sort();
        SelectionSnapshot { checked, expanded }
    }

    /// Replaces the current selection with a previously captured one.
    ///
    /// Paths that no longer exist in the tree are ignored. A checked directory
    /// checks its whole subtree. Ancestor states are re-derived afterwards, so
    /// only leaf-level state is taken from the snapshot.
    pub fn restore_state<C, E>(&mut self, checked: C, expanded: E)
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        for node in &mut self.nodes {
            node.state = TriState::Unchecked;
            node.expanded = false;
        }

        let checked_ids: Vec<EntryId> = checked
            .into_iter()
            .filter_map(|key| self.by_key.get(key.as_ref()).copied())
            .collect();
        for id in checked_ids {
            self.nodes[id.0].state = TriState::Checked;
            self.propagate_down(id, TriState::Checked);
            self.propagate_up(id);
        }

        let expanded_ids: HashSet<EntryId> = expanded
            .into_iter()
            .filter_map(|key| self.by_key.get(key.as_ref()).copied())
            .collect();
        for id in expanded_ids {
            self.nodes[id.0].expanded = true;
        }
    }

    fn propagate_down(&mut self, id: EntryId, state: TriState) {
        let mut stack: Vec<EntryId> = self.nodes[id.0].children.clone();
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.0];
            node.state = state;
            stack.extend(node.children.iter().copied());
        }
    }

    fn propagate_up(&mut self, id: EntryId) {
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            let derived = self.derive_state(parent);
            if derived == self.nodes[parent.0].state {
                break;
            }
            self.nodes[parent.0].state = derived;
            current = self.nodes[parent.0].parent;
        }
    }

    /// Aggregates a directory's state from those immediate children that hold
    /// files. Directories without any file below them do not count, and a
    /// directory with no such children keeps whatever state it was given.
    fn derive_state(&self, id: EntryId) -> TriState {
        let node = &self.nodes[id.0];
        let mut children = node
            .children
            .iter()
            .map(|child| &self.nodes[child.0])
            .filter(|child| child.has_files)
            .map(|child| child.state);
        let Some(first) = children.next() else {
            return node.state;
        };
        if first != TriState::Partial && children.all(|state| state == first) {
            first
        } else {
            TriState::Partial
        }
    }
}
