// Integration tests - the workspace engine, persistence and adapters
// working together.

mod common;

use std::time::Duration;

use pagepad::session::FileRecord;
use pagepad::time::MockTimeSource;
use pagepad::transfer::{self, ArchiveCodec, ByteSink};
use pagepad::{
    EditorHost, FileId, FileSlot, FolderPath, HeadlessEditor, MemorySlot, PasteOutcome,
    SessionManager,
    SessionSnapshot, Workspace, WorkspaceError,
};

fn workspace() -> Workspace<HeadlessEditor> {
    common::init_tracing_from_env();
    Workspace::new(HeadlessEditor::new())
}

fn root() -> FolderPath {
    FolderPath::root()
}

/// Line-per-entry "archive" codec, enough to exercise the adapters without
/// a real zip implementation.
struct TextCodec;

impl ArchiveCodec for TextCodec {
    fn unpack(&self, bytes: &[u8]) -> Result<Vec<(String, String)>, WorkspaceError> {
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| WorkspaceError::CorruptData(e.to_string()))?;
        Ok(text
            .lines()
            .filter_map(|line| line.split_once('=').map(|(p, c)| (p.into(), c.into())))
            .collect())
    }

    fn pack(&self, entries: &[(String, String)]) -> Result<Vec<u8>, WorkspaceError> {
        let mut out = String::new();
        for (path, content) in entries {
            out.push_str(path);
            out.push('=');
            out.push_str(content);
            out.push('\n');
        }
        Ok(out.into_bytes())
    }
}

#[derive(Default)]
struct CaptureSink {
    delivered: Vec<(String, Vec<u8>)>,
}

impl ByteSink for CaptureSink {
    fn deliver(&mut self, filename: &str, bytes: &[u8]) -> Result<(), WorkspaceError> {
        self.delivered.push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// Create `docs/readme.md`, save, reset, restore, and find the file back
/// with its folder and content.
#[test]
fn test_save_reset_restore_scenario() {
    let mut ws = workspace();
    let docs = ws.create_folder(&root(), "docs").unwrap();
    let readme = ws
        .create_file(&docs, "readme.md", "hello", None)
        .unwrap();
    ws.open_file(&readme).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let time = MockTimeSource::new();
    let mut manager = SessionManager::new(
        FileSlot::new(dir.path().join("session.json")),
        time.clone(),
    );
    assert!(manager.save(&ws).unwrap());

    ws.reset();
    assert!(ws.state().is_empty());

    let snapshot = manager.check_for_previous_session().unwrap().unwrap();
    manager.restore(&mut ws, &snapshot).unwrap();

    let restored = FileId::new(docs.clone(), "readme.md");
    let entry = ws.state().file(&restored).unwrap();
    assert_eq!(restored.folder.as_str(), "docs");
    assert_eq!(
        ws.editor().buffer_text(entry.buffer).as_deref(),
        Some("hello")
    );
    assert_eq!(ws.state().current_file(), Some(&restored));
}

/// Round-trip equivalence: a second snapshot taken right after restore
/// describes the same workspace (timestamps aside).
#[test]
fn test_round_trip_snapshot_equivalence() {
    let mut ws = workspace();
    let proj = ws.create_folder(&root(), "proj").unwrap();
    let sub = ws.create_folder(&proj, "sub").unwrap();
    ws.create_file(&proj, "a.js", "aa", None).unwrap();
    ws.create_file(&sub, "b.js", "bb", None).unwrap();
    let open = ws.create_file(&root(), "main.js", "main", None).unwrap();
    ws.open_file(&open).unwrap();

    let time = MockTimeSource::new();
    let mut manager = SessionManager::new(MemorySlot::new(), time);
    manager.save(&ws).unwrap();
    let before = manager.check_for_previous_session().unwrap().unwrap();

    ws.reset();
    manager.restore(&mut ws, &before).unwrap();
    let after = SessionManager::<MemorySlot>::snapshot(&ws);

    assert_eq!(after.file_contents, before.file_contents);
    assert_eq!(
        after.folders.keys().collect::<Vec<_>>(),
        before.folders.keys().collect::<Vec<_>>()
    );
    assert_eq!(after.current_file, before.current_file);
    assert_eq!(after.last_used_folder, before.last_used_folder);
    assert_eq!(after.sidebar_visible, before.sidebar_visible);
}

/// Dropped-directory import: `proj/` containing `proj/a.js` and
/// `proj/sub/b.js` lands with the same shape.
#[test]
fn test_dropped_directory_import_shape() {
    let mut ws = workspace();
    transfer::import_entries(
        &mut ws,
        &root(),
        vec![
            ("proj/a.js".to_string(), "aa".to_string()),
            ("proj/sub/b.js".to_string(), "bb".to_string()),
        ],
    )
    .unwrap();

    let proj = root().join("proj");
    let sub = proj.join("sub");
    let proj_folder = ws.state().folder(&proj).unwrap();
    assert_eq!(
        proj_folder.subfolders.iter().collect::<Vec<_>>(),
        vec![&sub]
    );
    assert_eq!(proj_folder.files.iter().collect::<Vec<_>>(), vec!["a.js"]);
    assert_eq!(
        ws.state().folder(&sub).unwrap().files.iter().collect::<Vec<_>>(),
        vec!["b.js"]
    );
}

/// Renaming `proj/sub` to `lib` rewrites every descendant path.
#[test]
fn test_rename_folder_scenario() {
    let mut ws = workspace();
    transfer::import_entries(
        &mut ws,
        &root(),
        vec![("proj/sub/b.js".to_string(), "bb".to_string())],
    )
    .unwrap();

    let sub = root().join("proj").join("sub");
    let lib = ws.rename_folder(&sub, "lib").unwrap();

    assert_eq!(lib.as_str(), "proj/lib");
    assert!(!ws.state().has_folder(&sub));
    assert!(ws.state().folder(&lib).unwrap().files.contains("b.js"));
    let moved = FileId::new(lib.clone(), "b.js");
    assert_eq!(moved.folder.as_str(), "proj/lib");
    assert!(ws.state().has_file(&moved));
}

#[test]
fn test_create_collision_overwrites_not_duplicates() {
    let mut ws = workspace();
    ws.create_file(&root(), "x.txt", "one", None).unwrap();
    ws.create_file(&root(), "x.txt", "two", None).unwrap();

    assert_eq!(ws.state().file_count(), 1);
    let id = FileId::new(root(), "x.txt");
    let buffer = ws.state().file(&id).unwrap().buffer;
    assert_eq!(ws.editor().buffer_text(buffer).as_deref(), Some("two"));
}

#[test]
fn test_cut_paste_round_trip_across_folders_persists() {
    let mut ws = workspace();
    let docs = ws.create_folder(&root(), "docs").unwrap();
    let a = ws.create_file(&root(), "a.txt", "payload", None).unwrap();

    ws.cut_file(&a).unwrap();
    let outcome = ws.paste(&docs).unwrap();
    assert!(matches!(outcome, PasteOutcome::PastedFile(_)));

    // Survives a save/restore cycle at its new location.
    let time = MockTimeSource::new();
    let mut manager = SessionManager::new(MemorySlot::new(), time);
    manager.save(&ws).unwrap();
    let snapshot = manager.check_for_previous_session().unwrap().unwrap();
    ws.reset();
    manager.restore(&mut ws, &snapshot).unwrap();

    assert!(!ws.state().has_file(&FileId::new(root(), "a.txt")));
    let moved = FileId::new(docs.clone(), "a.txt");
    let entry = ws.state().file(&moved).unwrap();
    assert_eq!(
        ws.editor().buffer_text(entry.buffer).as_deref(),
        Some("payload")
    );
}

#[test]
fn test_export_then_import_archive_rebuilds_tree() {
    let mut ws = workspace();
    let docs = ws.create_folder(&root(), "docs").unwrap();
    ws.create_file(&root(), "a.txt", "aa", None).unwrap();
    ws.create_file(&docs, "b.txt", "bb", None).unwrap();

    let mut sink = CaptureSink::default();
    transfer::export_workspace(&ws, &TextCodec, &mut sink, "workspace.zip").unwrap();
    let archive = sink.delivered.pop().unwrap().1;

    let mut fresh = workspace();
    let report = transfer::import_archive(&mut fresh, &TextCodec, &archive, &root()).unwrap();
    assert_eq!(report.imported, 2);
    assert!(fresh.state().has_file(&FileId::new(root(), "a.txt")));
    assert!(fresh.state().has_file(&FileId::new(docs.clone(), "b.txt")));
}

/// Imported paths containing the reserved `root` segment are rejected per
/// entry, so what gets saved always restores.
#[test]
fn test_reserved_segment_rejected_before_persistence() {
    let mut ws = workspace();
    let report = transfer::import_entries(
        &mut ws,
        &root(),
        vec![
            ("a/root/b.txt".to_string(), "bb".to_string()),
            ("a/ok.txt".to_string(), "ok".to_string()),
        ],
    )
    .unwrap();
    assert_eq!(report.imported, 1);
    assert!(!ws.state().has_folder(&root().join("a").join("root")));

    let time = MockTimeSource::new();
    let mut manager = SessionManager::new(MemorySlot::new(), time);
    manager.save(&ws).unwrap();
    let snapshot = manager.check_for_previous_session().unwrap().unwrap();
    ws.reset();
    manager.restore(&mut ws, &snapshot).unwrap();

    assert!(ws.state().has_file(&FileId::new(root().join("a"), "ok.txt")));
    assert!(
        manager.check_for_previous_session().unwrap().is_some(),
        "slot survives the round trip"
    );
}

/// Restore defensively re-adds root when the blob lost it.
#[test]
fn test_restore_without_root_folder_record() {
    let mut ws = workspace();
    ws.create_file(&root(), "a.txt", "aaa", None).unwrap();
    let time = MockTimeSource::new();
    let mut manager = SessionManager::new(MemorySlot::new(), time);
    manager.save(&ws).unwrap();
    let mut snapshot: SessionSnapshot = manager.check_for_previous_session().unwrap().unwrap();
    snapshot.folders.remove(pagepad::ROOT_PATH);

    ws.reset();
    manager.restore(&mut ws, &snapshot).unwrap();
    assert!(ws.state().has_folder(&root()));
    assert!(ws.state().has_file(&FileId::new(root(), "a.txt")));
}

/// A snapshot with a file whose folder has no folder record: the engine
/// create path re-establishes the chain.
#[test]
fn test_restore_recreates_missing_intermediate_folders() {
    let mut ws = workspace();
    let time = MockTimeSource::new();
    let mut manager = SessionManager::new(MemorySlot::new(), time);
    let mut snapshot = SessionManager::<MemorySlot>::snapshot(&ws);
    snapshot.file_contents.insert(
        "deep/nested/f.txt".to_string(),
        FileRecord {
            content: "x".to_string(),
            language: "plaintext".to_string(),
            path: "deep/nested".to_string(),
        },
    );

    manager.restore(&mut ws, &snapshot).unwrap();
    let nested = root().join("deep").join("nested");
    assert!(ws.state().has_folder(&nested));
    assert!(ws.state().has_file(&FileId::new(nested.clone(), "f.txt")));
    // Parent chain is linked, not just present.
    assert!(ws
        .state()
        .folder(&root().join("deep"))
        .unwrap()
        .subfolders
        .contains(&nested));
}

#[test]
fn test_autosave_end_to_end_with_file_slot() {
    let mut ws = workspace();
    ws.create_file(&root(), "a.txt", "v1", None).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let slot_path = dir.path().join("session.json");
    let time = MockTimeSource::new();
    let mut manager = SessionManager::new(FileSlot::new(&slot_path), time.clone());

    manager.note_change();
    manager.tick(&ws).unwrap();
    assert!(!slot_path.exists(), "debounce holds the save back");

    time.advance(Duration::from_secs(3));
    assert!(manager.tick(&ws).unwrap());
    assert!(slot_path.exists());

    // Teardown flush after more changes.
    ws.create_file(&root(), "a.txt", "v2", None).unwrap();
    manager.note_change();
    manager.flush(&ws);
    let blob = std::fs::read_to_string(&slot_path).unwrap();
    assert!(blob.contains("v2"));
}

#[test]
fn test_duplicate_names_across_folders_round_trip() {
    let mut ws = workspace();
    let docs = ws.create_folder(&root(), "docs").unwrap();
    ws.create_file(&root(), "x.txt", "in root", None).unwrap();
    ws.create_file(&docs, "x.txt", "in docs", None).unwrap();

    let time = MockTimeSource::new();
    let mut manager = SessionManager::new(MemorySlot::new(), time);
    manager.save(&ws).unwrap();
    let snapshot = manager.check_for_previous_session().unwrap().unwrap();
    ws.reset();
    manager.restore(&mut ws, &snapshot).unwrap();

    let in_root = ws.state().file(&FileId::new(root(), "x.txt")).unwrap();
    let in_docs = ws.state().file(&FileId::new(docs.clone(), "x.txt")).unwrap();
    assert_eq!(
        ws.editor().buffer_text(in_root.buffer).as_deref(),
        Some("in root")
    );
    assert_eq!(
        ws.editor().buffer_text(in_docs.buffer).as_deref(),
        Some("in docs")
    );
}
