// Property tests: structural invariants hold under arbitrary operation
// sequences, whether the individual operations succeed or are rejected.

mod common;

use proptest::prelude::*;

use pagepad::{EditorHost, FileId, FolderPath, HeadlessEditor, Workspace};

#[derive(Debug, Clone)]
enum Op {
    CreateFolder { parent: usize, name: usize },
    CreateFile { folder: usize, name: usize },
    DeleteFolder { folder: usize },
    DeleteFile { file: usize },
    RenameFolder { folder: usize, name: usize },
    RenameFile { file: usize, name: usize },
    MoveFolder { folder: usize, target: usize },
    MoveFile { file: usize, target: usize },
    CopyPasteFile { file: usize, target: usize },
    CutPasteFile { file: usize, target: usize },
    CopyPasteFolder { folder: usize, target: usize },
    OpenFile { file: usize },
}

const FOLDER_NAMES: &[&str] = &["docs", "src", "sub", "assets"];
const FILE_NAMES: &[&str] = &["a.txt", "b.js", "readme.md", "x.py"];

fn op_strategy() -> impl Strategy<Value = Op> {
    let idx = 0usize..8;
    prop::strategy::Union::new(vec![
        (idx.clone(), 0usize..FOLDER_NAMES.len())
            .prop_map(|(parent, name)| Op::CreateFolder { parent, name })
            .boxed(),
        (idx.clone(), 0usize..FILE_NAMES.len())
            .prop_map(|(folder, name)| Op::CreateFile { folder, name })
            .boxed(),
        idx.clone().prop_map(|folder| Op::DeleteFolder { folder }).boxed(),
        idx.clone().prop_map(|file| Op::DeleteFile { file }).boxed(),
        (idx.clone(), 0usize..FOLDER_NAMES.len())
            .prop_map(|(folder, name)| Op::RenameFolder { folder, name })
            .boxed(),
        (idx.clone(), 0usize..FILE_NAMES.len())
            .prop_map(|(file, name)| Op::RenameFile { file, name })
            .boxed(),
        (idx.clone(), idx.clone())
            .prop_map(|(folder, target)| Op::MoveFolder { folder, target })
            .boxed(),
        (idx.clone(), idx.clone())
            .prop_map(|(file, target)| Op::MoveFile { file, target })
            .boxed(),
        (idx.clone(), idx.clone())
            .prop_map(|(file, target)| Op::CopyPasteFile { file, target })
            .boxed(),
        (idx.clone(), idx.clone())
            .prop_map(|(file, target)| Op::CutPasteFile { file, target })
            .boxed(),
        (idx.clone(), idx.clone())
            .prop_map(|(folder, target)| Op::CopyPasteFolder { folder, target })
            .boxed(),
        idx.prop_map(|file| Op::OpenFile { file }).boxed(),
    ])
}

fn nth_folder(ws: &Workspace<HeadlessEditor>, index: usize) -> FolderPath {
    let mut paths: Vec<FolderPath> = ws.state().folders().map(|(p, _)| p.clone()).collect();
    paths.sort();
    paths[index % paths.len()].clone()
}

fn nth_file(ws: &Workspace<HeadlessEditor>, index: usize) -> Option<FileId> {
    let mut ids: Vec<FileId> = ws.state().files().map(|(id, _)| id.clone()).collect();
    if ids.is_empty() {
        return None;
    }
    ids.sort();
    Some(ids[index % ids.len()].clone())
}

fn apply(ws: &mut Workspace<HeadlessEditor>, op: &Op) {
    // Rejections are part of the contract; only panics and broken
    // invariants fail the test.
    match op {
        Op::CreateFolder { parent, name } => {
            let parent = nth_folder(ws, *parent);
            let _ = ws.create_folder(&parent, FOLDER_NAMES[*name]);
        }
        Op::CreateFile { folder, name } => {
            let folder = nth_folder(ws, *folder);
            let _ = ws.create_file(&folder, FILE_NAMES[*name], "content", None);
        }
        Op::DeleteFolder { folder } => {
            let folder = nth_folder(ws, *folder);
            let _ = ws.delete_folder(&folder);
        }
        Op::DeleteFile { file } => {
            if let Some(id) = nth_file(ws, *file) {
                let _ = ws.delete_file(&id);
            }
        }
        Op::RenameFolder { folder, name } => {
            let folder = nth_folder(ws, *folder);
            let _ = ws.rename_folder(&folder, FOLDER_NAMES[*name]);
        }
        Op::RenameFile { file, name } => {
            if let Some(id) = nth_file(ws, *file) {
                let _ = ws.rename_file(&id, FILE_NAMES[*name]);
            }
        }
        Op::MoveFolder { folder, target } => {
            let folder = nth_folder(ws, *folder);
            let target = nth_folder(ws, *target);
            let _ = ws.move_folder(&folder, &target);
        }
        Op::MoveFile { file, target } => {
            if let Some(id) = nth_file(ws, *file) {
                let target = nth_folder(ws, *target);
                let _ = ws.move_file(&id, &target);
            }
        }
        Op::CopyPasteFile { file, target } => {
            if let Some(id) = nth_file(ws, *file) {
                if ws.copy_file(&id).is_ok() {
                    let target = nth_folder(ws, *target);
                    let _ = ws.paste(&target);
                }
            }
        }
        Op::CutPasteFile { file, target } => {
            if let Some(id) = nth_file(ws, *file) {
                if ws.cut_file(&id).is_ok() {
                    let target = nth_folder(ws, *target);
                    let _ = ws.paste(&target);
                }
            }
        }
        Op::CopyPasteFolder { folder, target } => {
            let folder = nth_folder(ws, *folder);
            if ws.copy_folder(&folder).is_ok() {
                let target = nth_folder(ws, *target);
                let _ = ws.paste(&target);
            }
        }
        Op::OpenFile { file } => {
            if let Some(id) = nth_file(ws, *file) {
                let _ = ws.open_file(&id);
            }
        }
    }
}

/// Reachability: root exists; every other folder's parent exists and lists
/// it; every subfolder reference points at an existing folder that agrees
/// about its parent.
fn check_reachability(ws: &Workspace<HeadlessEditor>) {
    let root = FolderPath::root();
    assert!(ws.state().has_folder(&root), "root folder missing");

    for (path, folder) in ws.state().folders() {
        assert_eq!(&folder.path, path, "folder key and path field disagree");
        if !path.is_root() {
            let parent = path.parent().expect("non-root folder has a parent");
            let parent_folder = ws
                .state()
                .folder(&parent)
                .unwrap_or_else(|| panic!("parent of '{path}' missing"));
            assert!(
                parent_folder.subfolders.contains(path),
                "parent of '{path}' does not list it"
            );
        }
        for child in &folder.subfolders {
            assert_eq!(
                child.parent().as_ref(),
                Some(path),
                "subfolder '{child}' does not belong under '{path}'"
            );
            assert!(
                ws.state().has_folder(child),
                "dangling subfolder reference '{child}'"
            );
        }
    }
}

/// Containment consistency: file entries and folder `files` lists describe
/// the same set, and every buffer handle is alive.
fn check_containment(ws: &Workspace<HeadlessEditor>) {
    for (id, entry) in ws.state().files() {
        let folder = ws
            .state()
            .folder(&id.folder)
            .unwrap_or_else(|| panic!("file '{id}' points at a missing folder"));
        assert!(
            folder.files.contains(&id.name),
            "folder '{}' does not list file '{}'",
            id.folder,
            id.name
        );
        assert!(
            ws.editor().buffer_text(entry.buffer).is_some(),
            "file '{id}' holds a dead buffer handle"
        );
    }
    for (path, folder) in ws.state().folders() {
        for name in &folder.files {
            let id = FileId::new(path.clone(), name.clone());
            assert!(
                ws.state().has_file(&id),
                "folder '{path}' lists nonexistent file '{name}'"
            );
        }
    }
}

/// Editor sync: the current file, if any, exists and owns the active buffer.
fn check_editor_sync(ws: &Workspace<HeadlessEditor>) {
    if let Some(current) = ws.state().current_file() {
        let entry = ws
            .state()
            .file(current)
            .expect("current file has an entry");
        assert_eq!(
            ws.editor().active_buffer(),
            Some(entry.buffer),
            "open file's buffer is not the active one"
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_invariants_hold_under_random_ops(ops in prop::collection::vec(op_strategy(), 0..40)) {
        common::init_tracing_from_env();
        let mut ws = Workspace::new(HeadlessEditor::new());
        for op in &ops {
            apply(&mut ws, op);
            check_reachability(&ws);
            check_containment(&ws);
            check_editor_sync(&ws);
        }
    }
}
