//! Pagepad workspace engine.
//!
//! The workspace/file-tree core of an in-browser multi-file code editor:
//! a virtual hierarchical filesystem held purely in memory, synchronized
//! with an editor component's buffers, persisted to a single-slot key-value
//! store and manipulated through create/rename/delete/move/copy/cut/paste
//! operations that preserve referential integrity.
//!
//! The text-editing component, archive codec, remote fetch and download
//! sink are external collaborators consumed through traits; this crate
//! ships in-memory/file-backed implementations suitable for tests and
//! headless embedding.

pub mod editor;
pub mod error;
pub mod language;
pub mod path;
pub mod remote;
pub mod session;
pub mod state;
pub mod time;
pub mod transfer;
pub mod workspace;

pub use editor::{BufferId, EditorHost, HeadlessEditor, ViewState};
pub use error::WorkspaceError;
pub use path::{FileId, FolderPath, ROOT_PATH};
pub use session::{
    AutosavePolicy, FileSlot, MemorySlot, SessionManager, SessionSlot, SessionSnapshot,
};
pub use state::{FileEntry, Folder, WorkspaceState};
pub use transfer::{ArchiveCodec, ByteSink, ImportReport, RemoteSource};
pub use workspace::{PasteOutcome, PasteResolution, Workspace};
