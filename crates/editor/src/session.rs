//! Edit session state.

use std::fmt;

use gridedit_core::SelectionAnchor;
use gridedit_engine::snapshot::SnapshotKind;

/// Identity of one edit session. Never reused within a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// True if the buffer is parsed as a formula. Leading whitespace is ignored,
/// the same rule the sheet applies when the buffer is stored.
pub fn is_formula_text(buffer: &str) -> bool {
    buffer.trim_start().starts_with('=')
}

/// One active in-place edit. The anchor is fixed for the session's lifetime;
/// moving the selection ends the session instead.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    id: SessionId,
    anchor: SelectionAnchor,
    generation: u64,
    origin: SnapshotKind,
    buffer: String,
    caret: usize, // char index
    dirty: bool,
    formula_context: bool,
}

impl EditSession {
    pub(crate) fn new(
        id: SessionId,
        anchor: SelectionAnchor,
        generation: u64,
        origin: SnapshotKind,
        buffer: String,
        caret: usize,
    ) -> Self {
        let caret = caret.min(buffer.chars().count());
        let formula_context = is_formula_text(&buffer);
        Self { id, anchor, generation, origin, buffer, caret, dirty: false, formula_context }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn anchor(&self) -> &SelectionAnchor {
        &self.anchor
    }

    /// Edit generation of the selection request that opened this session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Representation the buffer was loaded from.
    pub fn origin(&self) -> SnapshotKind {
        self.origin
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Buffer differs from what the session started with.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_formula_context(&self) -> bool {
        self.formula_context
    }

    pub(crate) fn replace_buffer(&mut self, content: String, caret: usize) {
        if content != self.buffer {
            self.dirty = true;
        }
        self.caret = caret.min(content.chars().count());
        self.formula_context = is_formula_text(&content);
        self.buffer = content;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditState {
    #[default]
    Idle,
    Editing(EditSession),
}

impl EditState {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditState::Editing(_))
    }

    pub fn session(&self) -> Option<&EditSession> {
        match self {
            EditState::Editing(session) => Some(session),
            EditState::Idle => None,
        }
    }

    pub(crate) fn session_mut(&mut self) -> Option<&mut EditSession> {
        match self {
            EditState::Editing(session) => Some(session),
            EditState::Idle => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretTarget {
    End,
    At(usize),
}

/// Caret placement waiting for the surface to render. Applies only while
/// the session it was made for is still the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretRequest {
    pub session: SessionId,
    pub target: CaretTarget,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridedit_core::Geometry;

    fn session(buffer: &str) -> EditSession {
        let anchor = SelectionAnchor { row: 0, col: 0, geometry: Geometry::default() };
        EditSession::new(SessionId(1), anchor, 1, SnapshotKind::PlainValue, buffer.to_string(), usize::MAX)
    }

    #[test]
    fn test_new_session_caret_at_end_and_clean() {
        let s = session("héllo");
        assert_eq!(s.caret(), 5);
        assert!(!s.is_dirty());
        assert!(!s.is_formula_context());
    }

    #[test]
    fn test_formula_context_follows_buffer() {
        let mut s = session("5");
        s.replace_buffer("=5".into(), 2);
        assert!(s.is_formula_context());
        assert!(s.is_dirty());
        s.replace_buffer("5".into(), 1);
        assert!(!s.is_formula_context());
    }

    #[test]
    fn test_leading_whitespace_before_equals_is_formula() {
        assert!(is_formula_text("  =A1"));
        assert!(is_formula_text("\t=1+2"));
        assert!(!is_formula_text(" 5=5"));
        assert!(session(" =SUM(1)").is_formula_context());
    }

    #[test]
    fn test_same_content_is_not_dirty() {
        let mut s = session("abc");
        s.replace_buffer("abc".into(), 1);
        assert!(!s.is_dirty());
        assert_eq!(s.caret(), 1);
    }
}
