//! In-place cell edit controller.
//!
//! Owns the session state machine (Idle / Editing) and routes every key-down
//! through the classifier. The controller never touches a widget directly;
//! everything it reads or writes goes through [`Collaborators`].

use gridedit_config::EditorSettings;
use gridedit_core::{Direction, SelectionAnchor, StartOptions};
use gridedit_engine::snapshot::CellSnapshot;

use crate::autocomplete::{FormulaAssist, FormulaInput, NavResponse};
use crate::error::EditError;
use crate::keys::{classify, ClassifiedKey, ClassifyContext, KeyClassification, KeyEvent};
use crate::model::{CellStore, SelectionModel};
use crate::session::{CaretRequest, CaretTarget, EditSession, EditState, SessionId};
use crate::surface::InputSurface;

/// Vertical gap between the cell overlay and the suggestion popup
const POPUP_GAP: f32 = 4.0;

/// Everything the controller coordinates with, borrowed for one event.
pub struct Collaborators<'a> {
    pub store: &'a mut dyn CellStore,
    pub selection: &'a mut dyn SelectionModel,
    pub formula: &'a mut dyn FormulaAssist,
    pub surface: &'a mut dyn InputSurface,
}

/// Result of a key-down while a session may be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not handled here; the surface's default applies.
    Ignored,
    /// Surface applies the key. The content change it causes must carry
    /// this classification back in [`InputEvent::cause`].
    PassThrough(ClassifiedKey),
    Cancelled,
    Committed { row: usize, col: usize },
    /// Commit target went stale; nothing was written.
    CommitDropped,
    /// Formula subsystem consumed the key.
    FormulaHandled,
}

impl KeyOutcome {
    /// Whether the host should suppress the surface's default handling.
    pub fn prevents_default(&self) -> bool {
        !matches!(self, KeyOutcome::Ignored | KeyOutcome::PassThrough(_))
    }
}

/// Content change reported by the surface after it applied an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub content: String,
    pub caret: usize,
    /// The pass-through key that caused the change, if any
    pub cause: Option<ClassifiedKey>,
}

/// Where to draw the editor over the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub left: f32,
    pub top: f32,
    pub min_width: f32,
    pub height: f32,
    /// Suggestion popup offset below `top`
    pub popup_offset: f32,
}

pub struct EditController {
    settings: EditorSettings,
    state: EditState,
    next_session: u64,
    seen_generation: Option<u64>,
    pending_caret: Option<CaretRequest>,
}

impl EditController {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            settings,
            state: EditState::Idle,
            next_session: 0,
            seen_generation: None,
            pending_caret: None,
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.state.session()
    }

    pub fn is_editing(&self) -> bool {
        self.state.is_editing()
    }

    pub fn pending_caret(&self) -> Option<CaretRequest> {
        self.pending_caret
    }

    pub fn overlay(&self) -> Option<Overlay> {
        let g = self.session()?.anchor().geometry;
        Some(Overlay {
            left: g.left,
            top: g.top,
            min_width: g.width,
            height: g.height,
            popup_offset: g.height + POPUP_GAP,
        })
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Reconcile with the selection model's edit generation. Starts a session
    /// once per new generation and clears it when the generation goes away.
    pub fn sync(&mut self, cx: &mut Collaborators<'_>) {
        let Some(target) = cx.selection.edit_target() else {
            self.seen_generation = None;
            if self.is_editing() {
                self.clear_session(cx);
            }
            return;
        };

        if self.seen_generation == Some(target.generation) {
            return;
        }
        self.seen_generation = Some(target.generation);

        let anchor = match cx.selection.anchor() {
            Some(anchor) if anchor.cell() == (target.row, target.col) => anchor,
            _ => {
                log::debug!("edit request for ({}, {}) has no matching anchor", target.row, target.col);
                self.clear_session(cx);
                return;
            }
        };

        let snapshot = cx.store.snapshot(target.row, target.col);
        self.start_session(anchor, target.generation, &snapshot, target.options, cx);
    }

    /// Open a session on `anchor`. Any active session is cleared first.
    ///
    /// With `skip_overwrite` the surface keeps what it already shows and the
    /// snapshot is not loaded. Unless `suppress_auto_focus` is set, the caret
    /// is moved to the end once the surface has rendered (see
    /// [`flush_deferred`](Self::flush_deferred)).
    pub fn start_session(
        &mut self,
        anchor: SelectionAnchor,
        generation: u64,
        snapshot: &CellSnapshot,
        options: StartOptions,
        cx: &mut Collaborators<'_>,
    ) -> SessionId {
        let adopted = options.skip_overwrite.then(|| (cx.surface.content(), cx.surface.caret()));

        if self.is_editing() {
            self.clear_session(cx);
        }

        let (buffer, caret) = match adopted {
            Some((content, caret)) => {
                cx.surface.set_content(&content);
                cx.surface.set_caret(caret);
                (content, caret)
            }
            None => {
                cx.surface.set_content(&snapshot.rendered_content);
                (snapshot.rendered_content.clone(), usize::MAX)
            }
        };

        self.next_session += 1;
        let id = SessionId(self.next_session);
        let session = EditSession::new(id, anchor, generation, snapshot.kind, buffer, caret);
        log::debug!(
            "edit session {} started at ({}, {}), {:?}{}",
            id,
            anchor.row,
            anchor.col,
            snapshot.kind,
            if options.skip_overwrite { ", keeping surface content" } else { "" }
        );

        cx.formula.reset();
        self.pending_caret = (!options.suppress_auto_focus).then_some(CaretRequest { session: id, target: CaretTarget::End });
        self.seen_generation = Some(generation);
        self.state = EditState::Editing(session);
        id
    }

    /// End the session without writing. Safe to call while Idle.
    pub fn clear_session(&mut self, cx: &mut Collaborators<'_>) {
        if let EditState::Editing(session) = std::mem::take(&mut self.state) {
            let (row, col) = session.anchor().cell();
            log::debug!("edit session {} cleared at ({}, {})", session.id(), row, col);
        }
        self.pending_caret = None;
        cx.surface.set_content("");
        cx.formula.reset();
    }

    /// Replace the buffer. Only legal while editing.
    pub fn update_buffer(&mut self, content: impl Into<String>, caret: usize) -> Result<(), EditError> {
        let session = self.state.session_mut().ok_or(EditError::NotEditing)?;
        session.replace_buffer(content.into(), caret);
        Ok(())
    }

    /// Run the caret placement scheduled for after the last render. A request
    /// made for a session that has since ended is dropped.
    pub fn flush_deferred(&mut self, surface: &mut dyn InputSurface) -> bool {
        let Some(request) = self.pending_caret.take() else {
            return false;
        };
        match self.state.session_mut() {
            Some(session) if session.id() == request.session => {
                match request.target {
                    CaretTarget::End => surface.move_caret_to_end(),
                    CaretTarget::At(caret) => surface.set_caret(caret),
                }
                true
            }
            _ => {
                log::trace!("dropping caret request for ended session {}", request.session);
                false
            }
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn handle_key_down(&mut self, event: &KeyEvent, cx: &mut Collaborators<'_>) -> KeyOutcome {
        if !self.is_editing() {
            return KeyOutcome::Ignored;
        }

        let ctx = ClassifyContext {
            candidate_active: cx.formula.candidate_active(),
            enter_commits: self.settings.enter_commits,
            platform_is_control: self.settings.platform_is_control(),
        };
        let classification = classify(event, &ctx);
        if classification != KeyClassification::Ignored {
            log::trace!("key {:?} ({}) -> {:?}", event.key, event.key_code, classification);
        }
        let cause = ClassifiedKey { classification, key_code: event.key_code };

        match classification {
            KeyClassification::Cancel => self.cancel(cx),
            KeyClassification::ConfirmAndMoveDown => self.confirm_and_move(Direction::Down, cx),
            KeyClassification::ConfirmAndMoveRight => self.confirm_and_move(Direction::Right, cx),
            KeyClassification::NavigateDirection { direction, extend } => {
                self.navigate(direction, extend, cause, cx)
            }
            KeyClassification::AutocompleteCandidateKey => self.accept_candidate(cx),
            KeyClassification::ContentKey => KeyOutcome::PassThrough(cause),
            KeyClassification::Ignored => KeyOutcome::Ignored,
        }
    }

    /// The surface changed its content. Formula analysis re-runs when a
    /// content key caused the change; any other change drops suggestions and
    /// reference pointing, which were computed for the previous buffer.
    pub fn handle_input(&mut self, event: InputEvent, cx: &mut Collaborators<'_>) -> Result<(), EditError> {
        let session = self.state.session_mut().ok_or(EditError::NotEditing)?;
        session.replace_buffer(event.content, event.caret);

        match event.cause.filter(|c| c.classification == KeyClassification::ContentKey) {
            Some(cause) => cx.formula.analyze(session.buffer(), session.caret(), cause.key_code),
            None => cx.formula.reset(),
        }
        Ok(())
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Write the buffer to the session's cell and end the session. The write
    /// is dropped if the cell is no longer the selection's edit target.
    pub fn commit(&mut self, cx: &mut Collaborators<'_>) -> Result<(usize, usize), EditError> {
        let EditState::Editing(session) = std::mem::take(&mut self.state) else {
            return Err(EditError::NotEditing);
        };
        let (row, col) = session.anchor().cell();

        let current = cx
            .selection
            .edit_target()
            .is_some_and(|t| t.generation == session.generation() && (t.row, t.col) == (row, col));

        let result = if current && cx.store.contains(row, col) {
            cx.store.commit(row, col, session.buffer()).map_err(|e| {
                log::debug!("commit to ({}, {}) rejected: {}", row, col, e);
                EditError::StaleAnchor { row, col }
            })
        } else {
            Err(EditError::StaleAnchor { row, col })
        };

        match &result {
            Ok(()) => log::debug!("session {} committed to ({}, {})", session.id(), row, col),
            Err(e) => log::debug!("session {}: {}", session.id(), e),
        }

        self.clear_session(cx);
        if current {
            cx.selection.end_edit();
            self.seen_generation = None;
        }
        result.map(|()| (row, col))
    }

    fn cancel(&mut self, cx: &mut Collaborators<'_>) -> KeyOutcome {
        if let Some(session) = self.session() {
            log::debug!("session {} cancelled", session.id());
        }
        self.clear_session(cx);
        cx.selection.end_edit();
        self.seen_generation = None;
        cx.selection.move_active_cell(Direction::Down, 0, false);
        KeyOutcome::Cancelled
    }

    fn confirm_and_move(&mut self, direction: Direction, cx: &mut Collaborators<'_>) -> KeyOutcome {
        match self.commit(cx) {
            Ok((row, col)) => {
                cx.selection.move_active_cell(direction, 1, false);
                KeyOutcome::Committed { row, col }
            }
            Err(_) => KeyOutcome::CommitDropped,
        }
    }

    fn navigate(
        &mut self,
        direction: Direction,
        extend: bool,
        cause: ClassifiedKey,
        cx: &mut Collaborators<'_>,
    ) -> KeyOutcome {
        let Some(session) = self.session() else {
            return KeyOutcome::Ignored;
        };

        if !session.is_formula_context() {
            return if self.settings.arrow_keys_commit && !extend {
                self.confirm_and_move(direction, cx)
            } else {
                KeyOutcome::PassThrough(cause)
            };
        }

        let origin = session.anchor().cell();
        let mut buffer = session.buffer().to_string();
        let mut caret = session.caret();
        let input = FormulaInput { buffer: &mut buffer, caret: &mut caret };

        match cx.formula.navigate(origin, direction, extend, input) {
            NavResponse::NotHandled => KeyOutcome::PassThrough(cause),
            NavResponse::CandidateMoved => KeyOutcome::FormulaHandled,
            NavResponse::ReferenceUpdated => {
                self.apply_formula_edit(buffer, caret, cx);
                KeyOutcome::FormulaHandled
            }
        }
    }

    fn accept_candidate(&mut self, cx: &mut Collaborators<'_>) -> KeyOutcome {
        let Some(session) = self.session() else {
            return KeyOutcome::Ignored;
        };
        let mut buffer = session.buffer().to_string();
        let mut caret = session.caret();

        if cx.formula.accept_candidate(FormulaInput { buffer: &mut buffer, caret: &mut caret }) {
            self.apply_formula_edit(buffer, caret, cx);
        }
        KeyOutcome::FormulaHandled
    }

    /// Push a buffer the formula subsystem produced to the surface, with the
    /// caret placed after the next render.
    fn apply_formula_edit(&mut self, buffer: String, caret: usize, cx: &mut Collaborators<'_>) {
        let Some(session) = self.state.session_mut() else {
            return;
        };
        session.replace_buffer(buffer, caret);
        cx.surface.set_content(session.buffer());
        self.pending_caret = Some(CaretRequest {
            session: session.id(),
            target: CaretTarget::At(session.caret()),
        });
    }
}
