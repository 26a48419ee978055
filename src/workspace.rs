//! Workspace engine: every structural operation on the virtual file tree.
//!
//! The engine is the only structural writer of [`WorkspaceState`]. It
//! enforces the tree invariants (root always present, every folder reachable
//! exactly once, folder membership consistent with file entries) and keeps
//! the editor component's active buffer synchronized with the current file.
//!
//! All operations are synchronous and return `Result`; expected failures
//! (bad names, missing targets, collisions) come back as
//! [`WorkspaceError::Validation`] / [`WorkspaceError::NotFound`] with a
//! message the presentation layer can show directly.

use std::collections::BTreeSet;

use crate::editor::{BufferId, EditorHost};
use crate::error::WorkspaceError;
use crate::language::language_for;
use crate::path::{validate_folder_name, validate_name, FileId, FolderPath};
use crate::state::{FileEntry, Folder, WorkspaceState};

/// Buffer shown when the workspace is empty or a restore falls through.
pub const WELCOME_TEXT: &str = "\
// Welcome to Pagepad
//
// Create a file from the sidebar, drop a folder here,
// or import a project from a URL or archive.
";

/// Pending copy/cut record. At most one exists at a time.
#[derive(Debug, Clone)]
pub struct ClipboardEntry {
    pub op: ClipboardOp,
    /// Folder that contained the item when it was copied/cut.
    pub source: FolderPath,
    pub item: ClipboardItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardOp {
    Copy,
    Cut,
}

#[derive(Debug, Clone)]
pub enum ClipboardItem {
    File(FileSnapshot),
    Folder(FolderSnapshot),
}

impl ClipboardItem {
    fn name(&self) -> &str {
        match self {
            ClipboardItem::File(f) => &f.name,
            ClipboardItem::Folder(f) => &f.name,
        }
    }
}

/// Content snapshot of a single file, detached from any buffer.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    pub name: String,
    pub content: String,
    pub language: String,
}

/// Recursive content snapshot of a folder subtree.
#[derive(Debug, Clone)]
pub struct FolderSnapshot {
    pub name: String,
    pub files: Vec<FileSnapshot>,
    pub subfolders: Vec<FolderSnapshot>,
}

/// Caller's answer to a paste name collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteResolution {
    /// Replace the existing item of the same name.
    Overwrite,
    /// Paste under a different name.
    Rename(String),
    /// Abort the paste; the clipboard is kept.
    Cancel,
}

/// What a paste ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    PastedFile(FileId),
    PastedFolder(FolderPath),
    /// Cut pasted back into its source folder: nothing to do, clipboard cleared.
    CutIntoSameFolder,
    /// The collision resolver cancelled; workspace and clipboard unchanged.
    Cancelled,
}

/// The workspace engine. Owns the state store, the editor collaborator and
/// the single-slot clipboard.
#[derive(Debug)]
pub struct Workspace<E: EditorHost> {
    state: WorkspaceState,
    editor: E,
    clipboard: Option<ClipboardEntry>,
    welcome_buffer: Option<BufferId>,
}

impl<E: EditorHost> Workspace<E> {
    pub fn new(editor: E) -> Self {
        Workspace {
            state: WorkspaceState::new(),
            editor,
            clipboard: None,
            welcome_buffer: None,
        }
    }

    /// Read access for rendering and persistence.
    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    /// Write access for the persistence manager's bulk restore path.
    /// Everything else goes through engine operations.
    pub(crate) fn state_mut(&mut self) -> &mut WorkspaceState {
        &mut self.state
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Direct editor access, for host adapters and tests.
    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn clipboard(&self) -> Option<&ClipboardEntry> {
        self.clipboard.as_ref()
    }

    pub fn set_sidebar_visible(&mut self, visible: bool) {
        self.state.set_sidebar_visible(visible);
    }

    /// Drop every file, folder and buffer; back to the empty workspace.
    pub fn reset(&mut self) {
        let buffers: Vec<_> = self.state.files().map(|(_, e)| e.buffer).collect();
        for buffer in buffers {
            self.editor.dispose(buffer);
        }
        if let Some(welcome) = self.welcome_buffer.take() {
            self.editor.dispose(welcome);
        }
        self.editor.set_active_buffer(None);
        self.state.reset();
        self.clipboard = None;
    }

    /// Show the welcome buffer; no file is current afterwards.
    pub fn open_welcome(&mut self) -> Result<(), WorkspaceError> {
        if let Some(previous) = self.welcome_buffer.take() {
            self.editor.dispose(previous);
        }
        let buffer = self.editor.create_buffer(WELCOME_TEXT, "javascript")?;
        self.welcome_buffer = Some(buffer);
        self.editor.set_active_buffer(Some(buffer));
        self.state.set_current_file(None);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Folders
    // ------------------------------------------------------------------

    /// Create one folder under an existing parent.
    pub fn create_folder(
        &mut self,
        parent: &FolderPath,
        name: &str,
    ) -> Result<FolderPath, WorkspaceError> {
        validate_folder_name(name)?;
        if !self.state.has_folder(parent) {
            return Err(WorkspaceError::validation(format!(
                "folder '{parent}' does not exist"
            )));
        }
        let path = parent.join(name);
        if self.state.has_folder(&path) {
            return Err(WorkspaceError::validation(format!(
                "a folder named '{name}' already exists here"
            )));
        }
        self.state.insert_folder(Folder::new(path.clone()));
        if let Some(parent_folder) = self.state.folder_mut(parent) {
            parent_folder.subfolders.insert(path.clone());
        }
        self.state.set_last_used_folder(path.clone());
        Ok(path)
    }

    /// Idempotent check-then-create of a folder and all missing ancestors.
    ///
    /// Import batches race on shared intermediate folders; this must yield
    /// exactly one entry per path no matter how often it runs.
    pub fn ensure_folder(&mut self, path: &FolderPath) -> Result<(), WorkspaceError> {
        if self.state.has_folder(path) {
            return Ok(());
        }
        // Every segment is checked before anything is created, so a bad path
        // never leaves a partial chain behind.
        for segment in path.segments() {
            validate_folder_name(segment)?;
        }
        let mut current = FolderPath::root();
        for segment in path.segments() {
            let child = current.join(segment);
            if !self.state.has_folder(&child) {
                self.state.insert_folder(Folder::new(child.clone()));
                if let Some(parent_folder) = self.state.folder_mut(&current) {
                    parent_folder.subfolders.insert(child.clone());
                }
            }
            current = child;
        }
        Ok(())
    }

    /// Rename a folder, rewriting the path of every descendant.
    pub fn rename_folder(
        &mut self,
        path: &FolderPath,
        new_name: &str,
    ) -> Result<FolderPath, WorkspaceError> {
        if path.is_root() {
            return Err(WorkspaceError::validation("the root folder cannot be renamed"));
        }
        validate_folder_name(new_name)?;
        if !self.state.has_folder(path) {
            return Err(WorkspaceError::not_found(format!(
                "folder '{path}' does not exist"
            )));
        }
        if path.name() == new_name {
            return Ok(path.clone());
        }
        let parent = path
            .parent()
            .ok_or_else(|| WorkspaceError::validation("the root folder cannot be renamed"))?;
        let new_path = parent.join(new_name);
        if self.state.has_folder(&new_path) {
            return Err(WorkspaceError::validation(format!(
                "a folder named '{new_name}' already exists here"
            )));
        }
        self.relocate_subtree(path, &new_path);
        Ok(new_path)
    }

    /// Delete a folder and everything below it, releasing all buffers.
    pub fn delete_folder(&mut self, path: &FolderPath) -> Result<(), WorkspaceError> {
        if path.is_root() {
            return Err(WorkspaceError::validation("the root folder cannot be deleted"));
        }
        if !self.state.has_folder(path) {
            return Err(WorkspaceError::not_found(format!(
                "folder '{path}' does not exist"
            )));
        }
        let (folders, files) = self.collect_subtree(path);

        for id in &files {
            if let Some(entry) = self.state.remove_file(id) {
                if self.editor.active_buffer() == Some(entry.buffer) {
                    self.editor.set_active_buffer(None);
                }
                self.editor.dispose(entry.buffer);
            }
        }
        // Children before parents, so no folder ever dangles.
        for folder_path in folders.iter().rev() {
            self.state.remove_folder(folder_path);
        }
        if let Some(parent) = path.parent() {
            if let Some(parent_folder) = self.state.folder_mut(&parent) {
                parent_folder.subfolders.remove(path);
            }
            let last_used = self.state.last_used_folder().clone();
            if last_used == *path || path.is_ancestor_of(&last_used) {
                self.state.set_last_used_folder(parent);
            }
        }
        Ok(())
    }

    /// Move a folder under a different parent, keeping its name.
    pub fn move_folder(
        &mut self,
        path: &FolderPath,
        target: &FolderPath,
    ) -> Result<FolderPath, WorkspaceError> {
        if path.is_root() {
            return Err(WorkspaceError::validation("the root folder cannot be moved"));
        }
        if !self.state.has_folder(path) {
            return Err(WorkspaceError::not_found(format!(
                "folder '{path}' does not exist"
            )));
        }
        if !self.state.has_folder(target) {
            return Err(WorkspaceError::validation(format!(
                "folder '{target}' does not exist"
            )));
        }
        if path == target || path.is_ancestor_of(target) {
            return Err(WorkspaceError::validation(
                "a folder cannot be moved into itself or its own subfolder",
            ));
        }
        if path.parent().as_ref() == Some(target) {
            return Ok(path.clone());
        }
        let new_path = target.join(path.name());
        if self.state.has_folder(&new_path) {
            return Err(WorkspaceError::validation(format!(
                "a folder named '{}' already exists in '{target}'",
                path.name()
            )));
        }
        self.relocate_subtree(path, &new_path);
        Ok(new_path)
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Create a file, or overwrite the buffer of an existing file at the
    /// same location (the single allowed "create" collision resolution).
    ///
    /// A file with the same name in a *different* folder is unrelated.
    pub fn create_file(
        &mut self,
        folder: &FolderPath,
        name: &str,
        content: &str,
        language: Option<&str>,
    ) -> Result<FileId, WorkspaceError> {
        validate_name(name)?;
        if !self.state.has_folder(folder) {
            return Err(WorkspaceError::validation(format!(
                "folder '{folder}' does not exist"
            )));
        }
        let id = FileId::new(folder.clone(), name);
        if let Some(entry) = self.state.file(&id) {
            let buffer = entry.buffer;
            if self.editor.set_buffer_text(buffer, content) {
                self.state.set_last_used_folder(folder.clone());
                return Ok(id);
            }
            // Dead handle: drop the stale entry and fall through to recreate.
            tracing::warn!(file = %id, "create_file: replacing entry with dead buffer handle");
            self.state.remove_file(&id);
        }
        let language = language
            .map(str::to_string)
            .unwrap_or_else(|| language_for(name).to_string());
        let buffer = self.editor.create_buffer(content, &language)?;
        self.state.insert_file(
            id.clone(),
            FileEntry {
                buffer,
                language,
                view_state: None,
            },
        );
        if let Some(folder_entry) = self.state.folder_mut(folder) {
            folder_entry.files.insert(name.to_string());
        }
        self.state.set_last_used_folder(folder.clone());
        Ok(id)
    }

    /// Make a file the open one, saving the outgoing file's view state and
    /// restoring the incoming file's.
    ///
    /// A dangling entry (buffer disposed underneath us) self-heals: the
    /// entry is removed and `NotFound` reported.
    pub fn open_file(&mut self, id: &FileId) -> Result<(), WorkspaceError> {
        let Some(entry) = self.state.file(id) else {
            return Err(WorkspaceError::not_found(format!(
                "file '{id}' does not exist"
            )));
        };
        let buffer = entry.buffer;
        if self.editor.buffer_text(buffer).is_none() {
            self.drop_dangling_entry(id);
            return Err(WorkspaceError::not_found(format!(
                "file '{id}' had no buffer and was removed"
            )));
        }
        if self.state.current_file() == Some(id) {
            // Already open; keep everything as is.
            self.editor.set_active_buffer(Some(buffer));
            return Ok(());
        }
        self.save_current_view_state();
        if let Some(welcome) = self.welcome_buffer.take() {
            self.editor.dispose(welcome);
        }
        self.editor.set_active_buffer(Some(buffer));
        if let Some(view) = self.state.file(id).and_then(|e| e.view_state.clone()) {
            self.editor.restore_view_state(buffer, &view);
        }
        self.state.set_current_file(Some(id.clone()));
        self.state.set_last_used_folder(id.folder.clone());
        Ok(())
    }

    /// Rename a file in place. The language is re-derived from the new name
    /// and the buffer recreated, preserving content and view state; an open
    /// file stays open under its new name.
    pub fn rename_file(
        &mut self,
        id: &FileId,
        new_name: &str,
    ) -> Result<FileId, WorkspaceError> {
        validate_name(new_name)?;
        let Some(entry) = self.state.file(id) else {
            return Err(WorkspaceError::not_found(format!(
                "file '{id}' does not exist"
            )));
        };
        if id.name == new_name {
            return Ok(id.clone());
        }
        let new_id = FileId::new(id.folder.clone(), new_name);
        if self.state.has_file(&new_id) {
            return Err(WorkspaceError::validation(format!(
                "a file named '{new_name}' already exists here"
            )));
        }
        let old_buffer = entry.buffer;
        let stored_view = entry.view_state.clone();
        let Some(content) = self.editor.buffer_text(old_buffer) else {
            self.drop_dangling_entry(id);
            return Err(WorkspaceError::not_found(format!(
                "file '{id}' had no buffer and was removed"
            )));
        };
        let was_open = self.state.current_file() == Some(id);
        let view = self.editor.save_view_state(old_buffer).or(stored_view);

        let language = language_for(new_name).to_string();
        let new_buffer = self.editor.create_buffer(&content, &language)?;
        self.editor.dispose(old_buffer);

        self.state.remove_file(id);
        self.state.insert_file(
            new_id.clone(),
            FileEntry {
                buffer: new_buffer,
                language,
                view_state: view.clone(),
            },
        );
        if let Some(folder) = self.state.folder_mut(&id.folder) {
            folder.files.remove(&id.name);
            folder.files.insert(new_name.to_string());
        }
        if was_open {
            self.editor.set_active_buffer(Some(new_buffer));
            if let Some(view) = &view {
                self.editor.restore_view_state(new_buffer, view);
            }
            self.state.set_current_file(Some(new_id.clone()));
        }
        Ok(new_id)
    }

    /// Delete a file and release its buffer. Deleting the open file clears
    /// the editor.
    pub fn delete_file(&mut self, id: &FileId) -> Result<(), WorkspaceError> {
        let Some(entry) = self.state.remove_file(id) else {
            return Err(WorkspaceError::not_found(format!(
                "file '{id}' does not exist"
            )));
        };
        if let Some(folder) = self.state.folder_mut(&id.folder) {
            folder.files.remove(&id.name);
        }
        if self.editor.active_buffer() == Some(entry.buffer) {
            self.editor.set_active_buffer(None);
        }
        self.editor.dispose(entry.buffer);
        Ok(())
    }

    /// Move a file to another folder, keeping its buffer.
    pub fn move_file(
        &mut self,
        id: &FileId,
        target: &FolderPath,
    ) -> Result<FileId, WorkspaceError> {
        if !self.state.has_file(id) {
            return Err(WorkspaceError::not_found(format!(
                "file '{id}' does not exist"
            )));
        }
        if !self.state.has_folder(target) {
            return Err(WorkspaceError::validation(format!(
                "folder '{target}' does not exist"
            )));
        }
        if id.folder == *target {
            return Ok(id.clone());
        }
        let new_id = FileId::new(target.clone(), id.name.clone());
        if self.state.has_file(&new_id) {
            return Err(WorkspaceError::validation(format!(
                "a file named '{}' already exists in '{target}'",
                id.name
            )));
        }
        self.state.relocate_file(id, new_id.clone());
        if let Some(folder) = self.state.folder_mut(&id.folder) {
            folder.files.remove(&id.name);
        }
        if let Some(folder) = self.state.folder_mut(target) {
            folder.files.insert(id.name.clone());
        }
        self.state.set_last_used_folder(target.clone());
        Ok(new_id)
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    /// Snapshot a file's current content into the clipboard.
    pub fn copy_file(&mut self, id: &FileId) -> Result<(), WorkspaceError> {
        let snapshot = self.snapshot_file(id)?;
        self.clipboard = Some(ClipboardEntry {
            op: ClipboardOp::Copy,
            source: id.folder.clone(),
            item: ClipboardItem::File(snapshot),
        });
        Ok(())
    }

    /// Like [`Workspace::copy_file`], but the source is deleted when the
    /// paste succeeds. Until then the source stays intact.
    pub fn cut_file(&mut self, id: &FileId) -> Result<(), WorkspaceError> {
        let snapshot = self.snapshot_file(id)?;
        self.clipboard = Some(ClipboardEntry {
            op: ClipboardOp::Cut,
            source: id.folder.clone(),
            item: ClipboardItem::File(snapshot),
        });
        Ok(())
    }

    /// Snapshot a whole folder subtree into the clipboard.
    pub fn copy_folder(&mut self, path: &FolderPath) -> Result<(), WorkspaceError> {
        let (source, snapshot) = self.snapshot_folder(path)?;
        self.clipboard = Some(ClipboardEntry {
            op: ClipboardOp::Copy,
            source,
            item: ClipboardItem::Folder(snapshot),
        });
        Ok(())
    }

    pub fn cut_folder(&mut self, path: &FolderPath) -> Result<(), WorkspaceError> {
        let (source, snapshot) = self.snapshot_folder(path)?;
        self.clipboard = Some(ClipboardEntry {
            op: ClipboardOp::Cut,
            source,
            item: ClipboardItem::Folder(snapshot),
        });
        Ok(())
    }

    /// Paste the clipboard into `target`, resolving name collisions with a
    /// generated `_copy` suffix.
    pub fn paste(&mut self, target: &FolderPath) -> Result<PasteOutcome, WorkspaceError> {
        self.paste_with(target, &mut |_| PasteResolution::Rename(String::new()))
    }

    /// Paste the clipboard into `target`. On a name collision `resolve` is
    /// asked once; `Rename` with an empty string requests a generated name.
    ///
    /// A cut is all-or-nothing: the source is deleted only after the new
    /// entry fully exists, and any failure leaves source and clipboard
    /// untouched.
    pub fn paste_with(
        &mut self,
        target: &FolderPath,
        resolve: &mut dyn FnMut(&str) -> PasteResolution,
    ) -> Result<PasteOutcome, WorkspaceError> {
        let Some(clip) = self.clipboard.clone() else {
            return Err(WorkspaceError::validation("the clipboard is empty"));
        };
        if !self.state.has_folder(target) {
            return Err(WorkspaceError::validation(format!(
                "folder '{target}' does not exist"
            )));
        }
        if clip.op == ClipboardOp::Cut && clip.source == *target {
            self.clipboard = None;
            return Ok(PasteOutcome::CutIntoSameFolder);
        }
        // Cutting a folder into its own subtree would delete the paste result
        // along with the original.
        if let ClipboardItem::Folder(folder) = &clip.item {
            let original = clip.source.join(&folder.name);
            if clip.op == ClipboardOp::Cut
                && (original == *target || original.is_ancestor_of(target))
            {
                return Err(WorkspaceError::validation(
                    "a cut folder cannot be pasted into itself or its own subfolder",
                ));
            }
        }

        let desired = clip.item.name().to_string();
        let mut overwrite = false;
        let final_name = if self.paste_name_taken(&clip.item, target, &desired) {
            match resolve(&desired) {
                PasteResolution::Cancel => return Ok(PasteOutcome::Cancelled),
                PasteResolution::Overwrite => {
                    overwrite = true;
                    desired.clone()
                }
                PasteResolution::Rename(name) => {
                    let name = if name.is_empty() {
                        self.generated_paste_name(&clip.item, target, &desired)
                    } else {
                        name
                    };
                    validate_name(&name)?;
                    if self.paste_name_taken(&clip.item, target, &name) {
                        return Err(WorkspaceError::validation(format!(
                            "'{name}' also already exists in '{target}'"
                        )));
                    }
                    name
                }
            }
        } else {
            desired.clone()
        };

        let outcome = match &clip.item {
            ClipboardItem::File(file) => {
                // Overwrite and plain create are the same call: create_file
                // replaces content in place on an exact location match.
                let id =
                    self.create_file(target, &final_name, &file.content, Some(&file.language))?;
                PasteOutcome::PastedFile(id)
            }
            ClipboardItem::Folder(folder) => {
                let path = if overwrite {
                    // Keep a snapshot of the folder being replaced so a
                    // failed materialize can put it back.
                    let doomed = target.join(&final_name);
                    let saved = self.snapshot_folder_rec(&doomed)?;
                    self.delete_folder(&doomed)?;
                    match self.materialize_folder(target, &final_name, folder) {
                        Ok(path) => path,
                        Err(err) => {
                            if let Err(undo) =
                                self.materialize_folder(target, &final_name, &saved)
                            {
                                tracing::warn!(%undo, "overwrite-paste: could not restore replaced folder");
                            }
                            return Err(err);
                        }
                    }
                } else {
                    self.materialize_folder(target, &final_name, folder)?
                };
                PasteOutcome::PastedFolder(path)
            }
        };

        if clip.op == ClipboardOp::Cut {
            match &clip.item {
                ClipboardItem::File(file) => {
                    let original = FileId::new(clip.source.clone(), file.name.clone());
                    if let Err(err) = self.delete_file(&original) {
                        tracing::warn!(%err, "cut-paste: source file already gone");
                    }
                }
                ClipboardItem::Folder(folder) => {
                    let original = clip.source.join(&folder.name);
                    if let Err(err) = self.delete_folder(&original) {
                        tracing::warn!(%err, "cut-paste: source folder already gone");
                    }
                }
            }
        }
        self.clipboard = None;
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn snapshot_file(&mut self, id: &FileId) -> Result<FileSnapshot, WorkspaceError> {
        let Some(entry) = self.state.file(id) else {
            return Err(WorkspaceError::not_found(format!(
                "file '{id}' does not exist"
            )));
        };
        let language = entry.language.clone();
        let Some(content) = self.editor.buffer_text(entry.buffer) else {
            self.drop_dangling_entry(id);
            return Err(WorkspaceError::not_found(format!(
                "file '{id}' had no buffer and was removed"
            )));
        };
        Ok(FileSnapshot {
            name: id.name.clone(),
            content,
            language,
        })
    }

    fn snapshot_folder(
        &mut self,
        path: &FolderPath,
    ) -> Result<(FolderPath, FolderSnapshot), WorkspaceError> {
        if path.is_root() {
            return Err(WorkspaceError::validation(
                "the root folder cannot be copied or cut",
            ));
        }
        if !self.state.has_folder(path) {
            return Err(WorkspaceError::not_found(format!(
                "folder '{path}' does not exist"
            )));
        }
        let parent = path.parent().unwrap_or_else(FolderPath::root);
        let snapshot = self.snapshot_folder_rec(path)?;
        Ok((parent, snapshot))
    }

    fn snapshot_folder_rec(
        &mut self,
        path: &FolderPath,
    ) -> Result<FolderSnapshot, WorkspaceError> {
        let (file_names, child_paths): (Vec<String>, Vec<FolderPath>) = {
            let folder = self.state.folder(path).ok_or_else(|| {
                WorkspaceError::not_found(format!("folder '{path}' does not exist"))
            })?;
            (
                folder.files.iter().cloned().collect(),
                folder.subfolders.iter().cloned().collect(),
            )
        };
        let mut files = Vec::with_capacity(file_names.len());
        for name in file_names {
            let id = FileId::new(path.clone(), name);
            match self.snapshot_file(&id) {
                Ok(snapshot) => files.push(snapshot),
                Err(err) => {
                    tracing::warn!(%err, "snapshot_folder: skipping unreadable file");
                }
            }
        }
        let mut subfolders = Vec::with_capacity(child_paths.len());
        for child in child_paths {
            subfolders.push(self.snapshot_folder_rec(&child)?);
        }
        Ok(FolderSnapshot {
            name: path.name().to_string(),
            files,
            subfolders,
        })
    }

    /// Create a folder named `name` under `target` and fill it from a
    /// snapshot. On failure the partially built subtree is rolled back.
    fn materialize_folder(
        &mut self,
        target: &FolderPath,
        name: &str,
        snapshot: &FolderSnapshot,
    ) -> Result<FolderPath, WorkspaceError> {
        let top = self.create_folder(target, name)?;
        if let Err(err) = self.fill_folder(&top, snapshot) {
            if let Err(rollback) = self.delete_folder(&top) {
                tracing::warn!(%rollback, "paste rollback failed");
            }
            return Err(err);
        }
        Ok(top)
    }

    fn fill_folder(
        &mut self,
        path: &FolderPath,
        snapshot: &FolderSnapshot,
    ) -> Result<(), WorkspaceError> {
        for file in &snapshot.files {
            self.create_file(path, &file.name, &file.content, Some(&file.language))?;
        }
        for child in &snapshot.subfolders {
            let child_path = self.create_folder(path, &child.name)?;
            self.fill_folder(&child_path, child)?;
        }
        Ok(())
    }

    fn paste_name_taken(&self, item: &ClipboardItem, target: &FolderPath, name: &str) -> bool {
        match item {
            ClipboardItem::File(_) => self.state.has_file(&FileId::new(target.clone(), name)),
            ClipboardItem::Folder(_) => self.state.has_folder(&target.join(name)),
        }
    }

    fn generated_paste_name(
        &self,
        item: &ClipboardItem,
        target: &FolderPath,
        base: &str,
    ) -> String {
        let (stem, ext) = match base.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (base, None),
        };
        let mut counter = 0u32;
        loop {
            let candidate = match (counter, ext) {
                (0, Some(ext)) => format!("{stem}_copy.{ext}"),
                (0, None) => format!("{stem}_copy"),
                (n, Some(ext)) => format!("{stem}_copy{}.{ext}", n + 1),
                (n, None) => format!("{stem}_copy{}", n + 1),
            };
            if !self.paste_name_taken(item, target, &candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Pre-order subtree listing: `path` first, children after parents.
    fn collect_subtree(&self, path: &FolderPath) -> (Vec<FolderPath>, Vec<FileId>) {
        let mut folders = Vec::new();
        let mut files = Vec::new();
        let mut stack = vec![path.clone()];
        while let Some(current) = stack.pop() {
            if let Some(folder) = self.state.folder(&current) {
                for name in &folder.files {
                    files.push(FileId::new(current.clone(), name.clone()));
                }
                for child in &folder.subfolders {
                    stack.push(child.clone());
                }
                folders.push(current);
            }
        }
        folders.sort();
        (folders, files)
    }

    /// Move/rename a whole subtree from `old_path` to `new_path`.
    ///
    /// The complete old→new mapping is computed before anything is touched,
    /// then applied from that fixed mapping, so no entry is ever rewritten
    /// from a half-updated neighbor.
    fn relocate_subtree(&mut self, old_path: &FolderPath, new_path: &FolderPath) {
        let (folder_paths, file_ids) = self.collect_subtree(old_path);

        let folder_moves: Vec<(FolderPath, FolderPath)> = folder_paths
            .iter()
            .filter_map(|p| p.rebase(old_path, new_path).map(|n| (p.clone(), n)))
            .collect();
        let file_moves: Vec<(FileId, FileId)> = file_ids
            .iter()
            .filter_map(|id| {
                id.folder
                    .rebase(old_path, new_path)
                    .map(|folder| (id.clone(), FileId::new(folder, id.name.clone())))
            })
            .collect();

        for (old, new) in &folder_moves {
            if let Some(mut folder) = self.state.remove_folder(old) {
                folder.path = new.clone();
                folder.subfolders = folder
                    .subfolders
                    .iter()
                    .map(|child| child.rebase(old_path, new_path).unwrap_or_else(|| child.clone()))
                    .collect::<BTreeSet<_>>();
                self.state.insert_folder(folder);
            }
        }
        for (old, new) in &file_moves {
            self.state.relocate_file(old, new.clone());
        }

        if let Some(old_parent) = old_path.parent() {
            if let Some(folder) = self.state.folder_mut(&old_parent) {
                folder.subfolders.remove(old_path);
            }
        }
        if let Some(new_parent) = new_path.parent() {
            if let Some(folder) = self.state.folder_mut(&new_parent) {
                folder.subfolders.insert(new_path.clone());
            }
        }

        let last_used = self.state.last_used_folder().clone();
        if let Some(rebased) = last_used.rebase(old_path, new_path) {
            self.state.set_last_used_folder(rebased);
        }
    }

    fn drop_dangling_entry(&mut self, id: &FileId) {
        self.state.remove_file(id);
        if let Some(folder) = self.state.folder_mut(&id.folder) {
            folder.files.remove(&id.name);
        }
    }

    fn save_current_view_state(&mut self) {
        let Some(current) = self.state.current_file().cloned() else {
            return;
        };
        let Some(buffer) = self.state.file(&current).map(|e| e.buffer) else {
            return;
        };
        if let Some(view) = self.editor.save_view_state(buffer) {
            if let Some(entry) = self.state.file_mut(&current) {
                entry.view_state = Some(view);
            }
        }
    }
}
