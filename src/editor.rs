//! Editor component collaborator interface.
//!
//! The workspace engine never touches text storage, undo stacks or
//! rendering; it only creates, reads, activates and disposes buffers through
//! [`EditorHost`]. Production embeds an adapter over the real editor
//! component; [`HeadlessEditor`] is the in-memory implementation used by the
//! engine's tests and by anything that needs a workspace without a UI.

use std::collections::HashMap;

use crate::error::WorkspaceError;

/// Opaque handle to a buffer owned by the editor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// Opaque cursor/scroll snapshot owned by the editor component.
///
/// The engine stores and passes these back verbatim; it never looks inside.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub cursor: usize,
    pub scroll_top: usize,
}

/// Operations the workspace engine needs from the editor component.
pub trait EditorHost {
    /// Create a buffer holding `text` tagged with `language`.
    fn create_buffer(&mut self, text: &str, language: &str) -> Result<BufferId, WorkspaceError>;

    /// Make `buffer` the visible one, or clear the editor with `None`.
    fn set_active_buffer(&mut self, buffer: Option<BufferId>);

    /// The currently visible buffer, if any.
    fn active_buffer(&self) -> Option<BufferId>;

    /// Current text of a buffer, or `None` if the handle is dead.
    fn buffer_text(&self, buffer: BufferId) -> Option<String>;

    /// Replace a live buffer's content in place. Returns false for dead handles.
    fn set_buffer_text(&mut self, buffer: BufferId, text: &str) -> bool;

    /// Snapshot the cursor/scroll position of a buffer.
    fn save_view_state(&mut self, buffer: BufferId) -> Option<ViewState>;

    /// Reapply a previously saved cursor/scroll position.
    fn restore_view_state(&mut self, buffer: BufferId, view: &ViewState);

    /// Release a buffer. Dead handles are ignored.
    fn dispose(&mut self, buffer: BufferId);
}

#[derive(Debug, Clone)]
struct HeadlessBuffer {
    text: String,
    language: String,
    view: ViewState,
}

/// In-memory [`EditorHost`] with no rendering.
#[derive(Debug, Default)]
pub struct HeadlessEditor {
    buffers: HashMap<BufferId, HeadlessBuffer>,
    active: Option<BufferId>,
    next_id: u64,
}

impl HeadlessEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Language tag a buffer was created with (test observability).
    pub fn buffer_language(&self, buffer: BufferId) -> Option<&str> {
        self.buffers.get(&buffer).map(|b| b.language.as_str())
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

impl EditorHost for HeadlessEditor {
    fn create_buffer(&mut self, text: &str, language: &str) -> Result<BufferId, WorkspaceError> {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(
            id,
            HeadlessBuffer {
                text: text.to_string(),
                language: language.to_string(),
                view: ViewState::default(),
            },
        );
        Ok(id)
    }

    fn set_active_buffer(&mut self, buffer: Option<BufferId>) {
        self.active = buffer;
    }

    fn active_buffer(&self) -> Option<BufferId> {
        self.active
    }

    fn buffer_text(&self, buffer: BufferId) -> Option<String> {
        self.buffers.get(&buffer).map(|b| b.text.clone())
    }

    fn set_buffer_text(&mut self, buffer: BufferId, text: &str) -> bool {
        match self.buffers.get_mut(&buffer) {
            Some(b) => {
                b.text = text.to_string();
                true
            }
            None => false,
        }
    }

    fn save_view_state(&mut self, buffer: BufferId) -> Option<ViewState> {
        self.buffers.get(&buffer).map(|b| b.view.clone())
    }

    fn restore_view_state(&mut self, buffer: BufferId, view: &ViewState) {
        if let Some(b) = self.buffers.get_mut(&buffer) {
            b.view = view.clone();
        }
    }

    fn dispose(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        if self.active == Some(buffer) {
            self.active = None;
        }
    }
}
