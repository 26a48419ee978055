//! Persistence manager: durable save/restore of the workspace session.
//!
//! The observable workspace (folders, file contents and languages, the open
//! file, the last used folder, sidebar visibility) is projected into a
//! [`SessionSnapshot`] and written as one JSON blob to a single-slot
//! key-value store behind [`SessionSlot`]. Buffer handles and view states
//! are never serialized; only extracted text is.
//!
//! Saving is driven by the host loop calling [`SessionManager::note_change`]
//! on edits and [`SessionManager::tick`] periodically: a short debounce
//! coalesces bursts of edits, a longer interval bounds unsaved-work loss
//! while edits keep arriving.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::editor::EditorHost;
use crate::error::WorkspaceError;
use crate::path::{validate_name, FileId, FolderPath};
use crate::state::Folder;
use crate::time::SharedTimeSource;
use crate::workspace::Workspace;

/// Serializable projection of one file: live buffer text plus the metadata
/// needed to recreate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub content: String,
    pub language: String,
    /// Owning folder's path.
    pub path: String,
}

/// Serializable projection of one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub name: String,
    pub files: Vec<String>,
    pub subfolders: Vec<String>,
    pub path: String,
}

/// The whole persisted session. One snapshot slot exists at a time; a new
/// save replaces the previous blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Keyed by the file's full root-relative path.
    pub file_contents: BTreeMap<String, FileRecord>,
    /// Keyed by folder path.
    pub folders: BTreeMap<String, FolderRecord>,
    pub current_file: Option<String>,
    pub last_used_folder: String,
    pub sidebar_visible: bool,
    /// RFC 3339 save time; informational only.
    pub timestamp: String,
}

impl SessionSnapshot {
    /// A snapshot worth offering for recovery: at least one file or one
    /// non-root folder.
    pub fn is_meaningful(&self) -> bool {
        !self.file_contents.is_empty()
            || self.folders.keys().any(|path| path != crate::path::ROOT_PATH)
    }
}

/// Single-slot durable key-value store for the session blob.
pub trait SessionSlot {
    fn read(&self) -> Result<Option<String>, WorkspaceError>;
    fn write(&mut self, blob: &str) -> Result<(), WorkspaceError>;
    fn clear(&mut self) -> Result<(), WorkspaceError>;
}

/// In-memory slot for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySlot {
    blob: Option<String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl SessionSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>, WorkspaceError> {
        Ok(self.blob.clone())
    }

    fn write(&mut self, blob: &str) -> Result<(), WorkspaceError> {
        self.blob = Some(blob.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), WorkspaceError> {
        self.blob = None;
        Ok(())
    }
}

/// File-backed slot: one JSON file, replaced atomically on every write
/// (write to a temp sibling, then rename) so a crash mid-save never leaves
/// a truncated blob.
#[derive(Debug)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSlot { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionSlot for FileSlot {
    fn read(&self) -> Result<Option<String>, WorkspaceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|e| WorkspaceError::Storage(format!("{}: {e}", self.path.display())))
    }

    fn write(&mut self, blob: &str) -> Result<(), WorkspaceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WorkspaceError::Storage(format!("{}: {e}", parent.display())))?;
        }
        let temp = self.temp_path();
        std::fs::write(&temp, blob)
            .map_err(|e| WorkspaceError::Storage(format!("{}: {e}", temp.display())))?;
        std::fs::rename(&temp, &self.path)
            .map_err(|e| WorkspaceError::Storage(format!("{}: {e}", self.path.display())))
    }

    fn clear(&mut self) -> Result<(), WorkspaceError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| WorkspaceError::Storage(format!("{}: {e}", self.path.display())))?;
        }
        Ok(())
    }
}

/// Autosave timing knobs.
#[derive(Debug, Clone, Copy)]
pub struct AutosavePolicy {
    /// Quiet period after the last change before a save fires.
    pub debounce: Duration,
    /// Upper bound between saves while changes keep arriving.
    pub interval: Duration,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        AutosavePolicy {
            debounce: Duration::from_secs(2),
            interval: Duration::from_secs(30),
        }
    }
}

/// Owns the session slot and the autosave schedule.
#[derive(Debug)]
pub struct SessionManager<S: SessionSlot> {
    slot: S,
    time: SharedTimeSource,
    policy: AutosavePolicy,
    last_change: Option<Instant>,
    last_save: Instant,
    dirty: bool,
}

impl<S: SessionSlot> SessionManager<S> {
    pub fn new(slot: S, time: SharedTimeSource) -> Self {
        Self::with_policy(slot, time, AutosavePolicy::default())
    }

    pub fn with_policy(slot: S, time: SharedTimeSource, policy: AutosavePolicy) -> Self {
        let now = time.now();
        SessionManager {
            slot,
            time,
            policy,
            last_change: None,
            last_save: now,
            dirty: false,
        }
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Project the observable workspace state into a snapshot.
    ///
    /// Files whose buffer has died underneath us are skipped with a warning
    /// rather than failing the whole save.
    pub fn snapshot<E: EditorHost>(workspace: &Workspace<E>) -> SessionSnapshot {
        let state = workspace.state();
        let mut file_contents = BTreeMap::new();
        for (id, entry) in state.files() {
            let Some(content) = workspace.editor().buffer_text(entry.buffer) else {
                tracing::warn!(file = %id, "snapshot: skipping file with dead buffer");
                continue;
            };
            file_contents.insert(
                id.full_path(),
                FileRecord {
                    content,
                    language: entry.language.clone(),
                    path: id.folder.as_str().to_string(),
                },
            );
        }
        let mut folders = BTreeMap::new();
        for (path, folder) in state.folders() {
            folders.insert(
                path.as_str().to_string(),
                FolderRecord {
                    name: folder.name().to_string(),
                    files: folder.files.iter().cloned().collect(),
                    subfolders: folder
                        .subfolders
                        .iter()
                        .map(|p| p.as_str().to_string())
                        .collect(),
                    path: path.as_str().to_string(),
                },
            );
        }
        SessionSnapshot {
            file_contents,
            folders,
            current_file: state.current_file().map(FileId::full_path),
            last_used_folder: state.last_used_folder().as_str().to_string(),
            sidebar_visible: state.sidebar_visible(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Serialize and write the session. Returns `Ok(false)` when nothing was
    /// written because the workspace is empty (an empty workspace must not
    /// clobber a meaningful previous snapshot).
    pub fn save<E: EditorHost>(
        &mut self,
        workspace: &Workspace<E>,
    ) -> Result<bool, WorkspaceError> {
        if workspace.state().is_empty() {
            tracing::debug!("save: workspace is empty, keeping previous snapshot");
            return Ok(false);
        }
        let snapshot = Self::snapshot(workspace);
        let blob = serde_json::to_string(&snapshot)
            .map_err(|e| WorkspaceError::Storage(format!("serialize session: {e}")))?;
        self.slot.write(&blob)?;
        self.dirty = false;
        self.last_change = None;
        self.last_save = self.time.now();
        tracing::debug!(
            files = snapshot.file_contents.len(),
            folders = snapshot.folders.len(),
            "session saved"
        );
        Ok(true)
    }

    /// Startup check: is there a meaningful previous session to offer for
    /// recovery? A malformed blob is discarded here (logged, slot cleared)
    /// and reported as "nothing to recover".
    pub fn check_for_previous_session(
        &mut self,
    ) -> Result<Option<SessionSnapshot>, WorkspaceError> {
        let Some(blob) = self.slot.read()? else {
            return Ok(None);
        };
        let snapshot: SessionSnapshot = match serde_json::from_str(&blob) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(%err, "previous session blob is malformed, discarding");
                self.slot.clear()?;
                return Ok(None);
            }
        };
        if !snapshot.is_meaningful() {
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    /// Rebuild the workspace from a snapshot.
    ///
    /// Never leaves a half-applied workspace: on any failure the slot is
    /// cleared and the workspace falls back to empty plus the welcome
    /// buffer, and the error is reported as [`WorkspaceError::CorruptData`].
    pub fn restore<E: EditorHost>(
        &mut self,
        workspace: &mut Workspace<E>,
        snapshot: &SessionSnapshot,
    ) -> Result<(), WorkspaceError> {
        match Self::apply_snapshot(workspace, snapshot) {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(%err, "restore failed, falling back to empty workspace");
                if let Err(clear_err) = self.slot.clear() {
                    tracing::warn!(%clear_err, "could not clear corrupt session slot");
                }
                workspace.reset();
                workspace.open_welcome()?;
                Err(WorkspaceError::CorruptData(err.message().to_string()))
            }
        }
    }

    fn apply_snapshot<E: EditorHost>(
        workspace: &mut Workspace<E>,
        snapshot: &SessionSnapshot,
    ) -> Result<(), WorkspaceError> {
        workspace.reset();

        // Folders verbatim, through the store's bulk path (root re-added if
        // the blob lost it).
        let mut folders: HashMap<FolderPath, Folder> = HashMap::new();
        for key in snapshot.folders.keys() {
            let path = FolderPath::parse(key)?;
            let folder = Folder::new(path.clone());
            folders.insert(path, folder);
        }
        workspace.state_mut().set_folders(folders);

        // Re-link parents from the paths themselves; the persisted
        // `subfolders` arrays are derivable and may have drifted.
        let folder_paths: Vec<FolderPath> = workspace
            .state()
            .folders()
            .map(|(path, _)| path.clone())
            .collect();
        for path in &folder_paths {
            if path.is_root() {
                continue;
            }
            let parent = path.parent().unwrap_or_else(FolderPath::root);
            workspace.ensure_folder(&parent)?;
            if let Some(folder) = workspace.state_mut().folder_mut(&parent) {
                folder.subfolders.insert(path.clone());
            }
        }

        // Files through the engine's create path, for consistency checks and
        // membership maintenance for free.
        for (key, record) in &snapshot.file_contents {
            let name = match key.rsplit_once(crate::path::SEPARATOR) {
                Some((_, name)) => name.to_string(),
                None => key.clone(),
            };
            validate_name(&name)?;
            let folder = FolderPath::parse(&record.path)?;
            workspace.ensure_folder(&folder)?;
            workspace.create_file(&folder, &name, &record.content, Some(&record.language))?;
        }

        // Reconcile membership drift: folder `files` lists must match the
        // actual file entries.
        for path in &folder_paths {
            let listed: Vec<String> = match workspace.state().folder(path) {
                Some(folder) => folder.files.iter().cloned().collect(),
                None => continue,
            };
            for name in listed {
                let id = FileId::new(path.clone(), name.clone());
                if !workspace.state().has_file(&id) {
                    tracing::warn!(file = %id, "restore: dropping dangling folder entry");
                    if let Some(folder) = workspace.state_mut().folder_mut(path) {
                        folder.files.remove(&name);
                    }
                }
            }
        }

        workspace
            .state_mut()
            .set_sidebar_visible(snapshot.sidebar_visible);
        if let Ok(last_used) = FolderPath::parse(&snapshot.last_used_folder) {
            workspace.state_mut().set_last_used_folder(last_used);
        }

        let previous = snapshot
            .current_file
            .as_deref()
            .and_then(|key| FileId::parse(key).ok())
            .filter(|id| workspace.state().has_file(id));
        match previous {
            Some(id) => workspace.open_file(&id)?,
            None => {
                let first = workspace
                    .state()
                    .files()
                    .map(|(id, _)| id.clone())
                    .min_by_key(FileId::full_path);
                match first {
                    Some(id) => workspace.open_file(&id)?,
                    None => workspace.open_welcome()?,
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Autosave scheduling
    // ------------------------------------------------------------------

    /// Record a content change; (re)arms the debounce timer.
    pub fn note_change(&mut self) {
        self.dirty = true;
        self.last_change = Some(self.time.now());
    }

    /// Periodic driver: saves when the debounce has expired, or when the
    /// interval bound is hit while changes keep arriving.
    pub fn tick<E: EditorHost>(
        &mut self,
        workspace: &Workspace<E>,
    ) -> Result<bool, WorkspaceError> {
        if !self.dirty {
            return Ok(false);
        }
        let debounce_expired = self
            .last_change
            .is_some_and(|at| self.time.elapsed_since(at) >= self.policy.debounce);
        let interval_expired = self.time.elapsed_since(self.last_save) >= self.policy.interval;
        if debounce_expired || interval_expired {
            return self.save(workspace);
        }
        Ok(false)
    }

    /// Best-effort save on session teardown; storage failures are logged,
    /// not propagated.
    pub fn flush<E: EditorHost>(&mut self, workspace: &Workspace<E>) {
        if !self.dirty {
            return;
        }
        if let Err(err) = self.save(workspace) {
            tracing::warn!(%err, "teardown save failed");
        }
    }
}
