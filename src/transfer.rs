//! Import/export adapters: bridge external byte sources and sinks to
//! workspace engine calls.
//!
//! The adapters own no filesystem semantics; they derive target folder
//! paths, create missing intermediates through [`Workspace::ensure_folder`]
//! and call [`Workspace::create_file`] per entry. Batch imports never abort
//! for one bad entry: failures are logged and skipped, and the caller gets
//! an [`ImportReport`] saying how many of N made it.
//!
//! The external collaborators (archive codec, remote fetch, byte sink) are
//! consumed through traits only; the real implementations live at the
//! application's composition root.

use crate::editor::EditorHost;
use crate::error::WorkspaceError;
use crate::path::{validate_folder_name, validate_name, FileId, FolderPath};
use crate::workspace::Workspace;

/// Remote listing entry, e.g. one row of a repository directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: RemoteEntryKind,
    /// Content URL for files, listing URL for directories.
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteEntryKind {
    File,
    Directory,
}

/// Remote fetch collaborator. Implementations must bound each request with
/// a timeout and report it as a normal [`WorkspaceError::Network`] failure.
pub trait RemoteSource {
    fn fetch_text(&self, url: &str) -> Result<String, WorkspaceError>;
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, WorkspaceError>;
    /// List one directory level of `reference` (e.g. a `owner/repo` pair).
    fn list_directory(
        &self,
        reference: &str,
        path: &str,
    ) -> Result<Vec<RemoteEntry>, WorkspaceError>;
}

/// Archive encode/decode collaborator. Entries are (relative path, text).
pub trait ArchiveCodec {
    fn unpack(&self, bytes: &[u8]) -> Result<Vec<(String, String)>, WorkspaceError>;
    fn pack(&self, entries: &[(String, String)]) -> Result<Vec<u8>, WorkspaceError>;
}

/// Byte sink collaborator (browser download, test capture).
pub trait ByteSink {
    fn deliver(&mut self, filename: &str, bytes: &[u8]) -> Result<(), WorkspaceError>;
}

/// Outcome of a batch import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub attempted: usize,
    pub imported: usize,
}

impl ImportReport {
    fn count(&mut self, result: Result<(), WorkspaceError>) {
        self.attempted += 1;
        match result {
            Ok(()) => self.imported += 1,
            Err(err) => {
                tracing::warn!(%err, "import: skipping entry");
            }
        }
    }
}

/// Import (relative path, content) pairs below `base` — the shared shape of
/// file-picker uploads, dropped directories and unpacked archives.
///
/// The first file created while no file is open becomes the open file.
pub fn import_entries<E, I>(
    workspace: &mut Workspace<E>,
    base: &FolderPath,
    entries: I,
) -> Result<ImportReport, WorkspaceError>
where
    E: EditorHost,
    I: IntoIterator<Item = (String, String)>,
{
    if !workspace.state().has_folder(base) {
        return Err(WorkspaceError::validation(format!(
            "folder '{base}' does not exist"
        )));
    }
    let mut report = ImportReport::default();
    for (relative_path, content) in entries {
        report.count(import_one(workspace, base, &relative_path, &content));
    }
    Ok(report)
}

fn import_one<E: EditorHost>(
    workspace: &mut Workspace<E>,
    base: &FolderPath,
    relative_path: &str,
    content: &str,
) -> Result<(), WorkspaceError> {
    let mut components: Vec<&str> = relative_path
        .split(crate::path::SEPARATOR)
        .filter(|c| !c.is_empty())
        .collect();
    let Some(file_name) = components.pop() else {
        return Err(WorkspaceError::validation(format!(
            "'{relative_path}' has no file name"
        )));
    };
    validate_name(file_name)?;
    let mut folder = base.clone();
    for component in components {
        // Also catches the reserved root name, which would otherwise alias
        // the workspace root or produce an unparseable persisted path.
        validate_folder_name(component)?;
        folder = folder.join(component);
    }
    workspace.ensure_folder(&folder)?;
    let id = workspace.create_file(&folder, file_name, content, None)?;
    open_if_nothing_open(workspace, &id);
    Ok(())
}

/// Import a single remote resource; the file is named after the URL's last
/// path segment.
pub fn import_url<E: EditorHost>(
    workspace: &mut Workspace<E>,
    source: &dyn RemoteSource,
    url: &str,
    target: &FolderPath,
) -> Result<FileId, WorkspaceError> {
    if !workspace.state().has_folder(target) {
        return Err(WorkspaceError::validation(format!(
            "folder '{target}' does not exist"
        )));
    }
    let name = file_name_from_url(url)?;
    let content = source.fetch_text(url)?;
    let id = workspace.create_file(target, &name, &content, None)?;
    open_if_nothing_open(workspace, &id);
    Ok(id)
}

/// Import every file of an archive below `base`.
pub fn import_archive<E: EditorHost>(
    workspace: &mut Workspace<E>,
    codec: &dyn ArchiveCodec,
    bytes: &[u8],
    base: &FolderPath,
) -> Result<ImportReport, WorkspaceError> {
    let entries = codec.unpack(bytes)?;
    import_entries(workspace, base, entries)
}

/// Recursively import a remote directory tree below `base`.
///
/// The top-level listing failure aborts the import; deeper failures (one
/// file fetch, one subdirectory listing) only skip that entry.
pub fn import_remote_tree<E: EditorHost>(
    workspace: &mut Workspace<E>,
    source: &dyn RemoteSource,
    reference: &str,
    path: &str,
    base: &FolderPath,
) -> Result<ImportReport, WorkspaceError> {
    if !workspace.state().has_folder(base) {
        return Err(WorkspaceError::validation(format!(
            "folder '{base}' does not exist"
        )));
    }
    let entries = source.list_directory(reference, path)?;
    let mut report = ImportReport::default();
    import_remote_level(workspace, source, reference, base, entries, &mut report);
    Ok(report)
}

fn import_remote_level<E: EditorHost>(
    workspace: &mut Workspace<E>,
    source: &dyn RemoteSource,
    reference: &str,
    folder: &FolderPath,
    entries: Vec<RemoteEntry>,
    report: &mut ImportReport,
) {
    for entry in entries {
        match entry.kind {
            RemoteEntryKind::File => {
                report.count(import_remote_file(workspace, source, folder, &entry));
            }
            RemoteEntryKind::Directory => {
                let result = validate_folder_name(&entry.name)
                    .and_then(|()| {
                        let child = folder.join(&entry.name);
                        workspace.ensure_folder(&child)?;
                        Ok(child)
                    })
                    .and_then(|child| {
                        source
                            .list_directory(reference, &entry.url)
                            .map(|listing| (child, listing))
                    });
                match result {
                    Ok((child, listing)) => {
                        import_remote_level(workspace, source, reference, &child, listing, report);
                    }
                    Err(err) => {
                        tracing::warn!(%err, directory = %entry.name, "import: skipping subtree");
                    }
                }
            }
        }
    }
}

fn import_remote_file<E: EditorHost>(
    workspace: &mut Workspace<E>,
    source: &dyn RemoteSource,
    folder: &FolderPath,
    entry: &RemoteEntry,
) -> Result<(), WorkspaceError> {
    validate_name(&entry.name)?;
    let content = source.fetch_text(&entry.url)?;
    let id = workspace.create_file(folder, &entry.name, &content, None)?;
    open_if_nothing_open(workspace, &id);
    Ok(())
}

/// Hand the open file's live buffer content to the byte sink unchanged.
pub fn export_current_file<E: EditorHost>(
    workspace: &Workspace<E>,
    sink: &mut dyn ByteSink,
) -> Result<(), WorkspaceError> {
    let Some(id) = workspace.state().current_file().cloned() else {
        return Err(WorkspaceError::validation("no file is open"));
    };
    let Some(entry) = workspace.state().file(&id) else {
        return Err(WorkspaceError::not_found(format!(
            "file '{id}' does not exist"
        )));
    };
    let Some(content) = workspace.editor().buffer_text(entry.buffer) else {
        return Err(WorkspaceError::not_found(format!(
            "file '{id}' has no buffer"
        )));
    };
    sink.deliver(&id.name, content.as_bytes())
}

/// Walk the whole tree from root, pack it and hand the archive to the sink.
pub fn export_workspace<E: EditorHost>(
    workspace: &Workspace<E>,
    codec: &dyn ArchiveCodec,
    sink: &mut dyn ByteSink,
    archive_name: &str,
) -> Result<(), WorkspaceError> {
    let mut entries: Vec<(String, String)> = Vec::new();
    for (id, entry) in workspace.state().files() {
        let Some(content) = workspace.editor().buffer_text(entry.buffer) else {
            tracing::warn!(file = %id, "export: skipping file with dead buffer");
            continue;
        };
        entries.push((id.full_path(), content));
    }
    entries.sort();
    let bytes = codec.pack(&entries)?;
    sink.deliver(archive_name, &bytes)
}

fn open_if_nothing_open<E: EditorHost>(workspace: &mut Workspace<E>, id: &FileId) {
    if workspace.state().current_file().is_none() {
        if let Err(err) = workspace.open_file(id) {
            tracing::warn!(%err, "import: could not open first imported file");
        }
    }
}

fn file_name_from_url(url: &str) -> Result<String, WorkspaceError> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let name = without_query
        .trim_end_matches(crate::path::SEPARATOR)
        .rsplit(crate::path::SEPARATOR)
        .next()
        .unwrap_or_default();
    if name.is_empty() || name.contains(':') {
        return Err(WorkspaceError::validation(format!(
            "cannot derive a file name from '{url}'"
        )));
    }
    Ok(name.to_string())
}
