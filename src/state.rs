//! State Store: the single source of truth for the workspace.
//!
//! `WorkspaceState` is a thin ledger: it holds the file and folder maps and
//! the scalar session fields behind controlled accessors, but validates
//! nothing beyond protecting the root folder. Business rules (collisions,
//! reachability, buffer lifecycles) live in the workspace engine, which is
//! the only structural writer. Misuse is reported with `tracing::warn!` and
//! otherwise ignored, matching the store's ledger-not-validator role.

use std::collections::{BTreeSet, HashMap};

use crate::editor::{BufferId, ViewState};
use crate::path::{FileId, FolderPath};

/// Per-file record. The location is the map key ([`FileId`]), so the entry
/// only carries what the key does not.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Handle of the buffer owned by the editor component.
    pub buffer: BufferId,
    /// Semantic label derived from the file name.
    pub language: String,
    /// Editor-owned cursor/scroll snapshot. Never persisted.
    pub view_state: Option<ViewState>,
}

/// A named container in the workspace tree.
#[derive(Debug, Clone)]
pub struct Folder {
    pub path: FolderPath,
    /// Names of files directly in this folder. Sorted for display.
    pub files: BTreeSet<String>,
    /// Paths of direct child folders. Sorted for display.
    pub subfolders: BTreeSet<FolderPath>,
}

impl Folder {
    pub fn new(path: FolderPath) -> Self {
        Folder {
            path,
            files: BTreeSet::new(),
            subfolders: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }
}

/// All mutable workspace data.
#[derive(Debug)]
pub struct WorkspaceState {
    files: HashMap<FileId, FileEntry>,
    folders: HashMap<FolderPath, Folder>,
    current_file: Option<FileId>,
    last_used_folder: FolderPath,
    sidebar_visible: bool,
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceState {
    /// An empty workspace: just the root folder, sidebar shown.
    pub fn new() -> Self {
        let root = FolderPath::root();
        let mut folders = HashMap::new();
        folders.insert(root.clone(), Folder::new(root.clone()));
        WorkspaceState {
            files: HashMap::new(),
            folders,
            current_file: None,
            last_used_folder: root,
            sidebar_visible: true,
        }
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    pub fn file(&self, id: &FileId) -> Option<&FileEntry> {
        self.files.get(id)
    }

    pub fn file_mut(&mut self, id: &FileId) -> Option<&mut FileEntry> {
        self.files.get_mut(id)
    }

    pub fn has_file(&self, id: &FileId) -> bool {
        self.files.contains_key(id)
    }

    pub fn files(&self) -> impl Iterator<Item = (&FileId, &FileEntry)> {
        self.files.iter()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Insert or replace a file entry.
    pub fn insert_file(&mut self, id: FileId, entry: FileEntry) {
        self.files.insert(id, entry);
    }

    pub fn remove_file(&mut self, id: &FileId) -> Option<FileEntry> {
        let removed = self.files.remove(id);
        if removed.is_some() && self.current_file.as_ref() == Some(id) {
            self.current_file = None;
        }
        removed
    }

    /// Move a file entry to a new key, keeping the entry itself intact.
    ///
    /// Replaces the original's separate name→path index maintenance: with
    /// full-location keys, a path change is a re-key.
    pub fn relocate_file(&mut self, from: &FileId, to: FileId) {
        match self.files.remove(from) {
            Some(entry) => {
                if self.current_file.as_ref() == Some(from) {
                    self.current_file = Some(to.clone());
                }
                self.files.insert(to, entry);
            }
            None => {
                tracing::warn!(from = %from, "relocate_file: no such file entry");
            }
        }
    }

    // ------------------------------------------------------------------
    // Folders
    // ------------------------------------------------------------------

    pub fn folder(&self, path: &FolderPath) -> Option<&Folder> {
        self.folders.get(path)
    }

    pub fn folder_mut(&mut self, path: &FolderPath) -> Option<&mut Folder> {
        self.folders.get_mut(path)
    }

    pub fn has_folder(&self, path: &FolderPath) -> bool {
        self.folders.contains_key(path)
    }

    pub fn folders(&self) -> impl Iterator<Item = (&FolderPath, &Folder)> {
        self.folders.iter()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn insert_folder(&mut self, folder: Folder) {
        self.folders.insert(folder.path.clone(), folder);
    }

    /// Remove a folder entry. The root folder is never removed.
    pub fn remove_folder(&mut self, path: &FolderPath) -> Option<Folder> {
        if path.is_root() {
            tracing::warn!("remove_folder: refusing to remove the root folder");
            return None;
        }
        self.folders.remove(path)
    }

    // ------------------------------------------------------------------
    // Bulk replacement (persistence restore/reset only)
    // ------------------------------------------------------------------

    /// Replace the whole file map.
    pub fn set_files(&mut self, files: HashMap<FileId, FileEntry>) {
        self.files = files;
        if let Some(current) = &self.current_file {
            if !self.files.contains_key(current) {
                self.current_file = None;
            }
        }
    }

    /// Replace the whole folder map, re-establishing root if absent.
    pub fn set_folders(&mut self, folders: HashMap<FolderPath, Folder>) {
        self.folders = folders;
        let root = FolderPath::root();
        if !self.folders.contains_key(&root) {
            tracing::warn!("set_folders: root folder missing, re-adding it");
            self.folders.insert(root.clone(), Folder::new(root.clone()));
        }
        if !self.folders.contains_key(&self.last_used_folder) {
            self.last_used_folder = root;
        }
    }

    /// Drop everything back to the empty-workspace shape.
    pub fn reset(&mut self) {
        *self = WorkspaceState::new();
    }

    // ------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------

    pub fn current_file(&self) -> Option<&FileId> {
        self.current_file.as_ref()
    }

    pub fn set_current_file(&mut self, id: Option<FileId>) {
        if let Some(id) = &id {
            if !self.files.contains_key(id) {
                tracing::warn!(file = %id, "set_current_file: no such file entry");
            }
        }
        self.current_file = id;
    }

    pub fn last_used_folder(&self) -> &FolderPath {
        &self.last_used_folder
    }

    pub fn set_last_used_folder(&mut self, path: FolderPath) {
        if !self.folders.contains_key(&path) {
            tracing::warn!(folder = %path, "set_last_used_folder: no such folder, keeping previous");
            return;
        }
        self.last_used_folder = path;
    }

    pub fn sidebar_visible(&self) -> bool {
        self.sidebar_visible
    }

    pub fn set_sidebar_visible(&mut self, visible: bool) {
        self.sidebar_visible = visible;
    }

    /// True when the workspace holds no files and no folders besides root.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.len() == 1
    }
}
