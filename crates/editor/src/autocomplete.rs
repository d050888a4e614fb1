//! Formula autocomplete and reference pointing.
//!
//! The controller talks to the formula subsystem only through
//! [`FormulaAssist`]. [`FormulaAutocomplete`] is the built-in implementation:
//! function-name suggestions by prefix, and arrow-key reference insertion.

use std::ops::Range;

use gridedit_core::Direction;

use crate::formula_context::{self, char_to_byte, FormulaEditMode, FunctionInfo};
use crate::formula_refs::{make_cell_ref, make_range_ref};
use crate::session::is_formula_text;

/// Largest grid the pointing reference may reach by default
const MAX_ROWS: usize = 1_000_000;
const MAX_COLS: usize = 16_384;

/// Mutable view of the edit buffer handed to the formula subsystem when it
/// claims a key. The caret is a char index.
pub struct FormulaInput<'a> {
    pub buffer: &'a mut String,
    pub caret: &'a mut usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavResponse {
    /// Arrow is not ours; it moves the caret
    NotHandled,
    /// Highlight moved inside the suggestion list
    CandidateMoved,
    /// A cell reference was inserted or replaced in the buffer
    ReferenceUpdated,
}

pub trait FormulaAssist {
    /// A suggestion list is open with a highlighted candidate.
    fn candidate_active(&self) -> bool;

    /// Re-run analysis after a content key changed the buffer.
    fn analyze(&mut self, buffer: &str, caret: usize, key_code: u32);

    /// Insert the highlighted candidate. Returns false if nothing was accepted.
    fn accept_candidate(&mut self, input: FormulaInput<'_>) -> bool;

    /// Arrow key in a formula buffer. `origin` is the cell being edited.
    fn navigate(
        &mut self,
        origin: (usize, usize),
        direction: Direction,
        extend: bool,
        input: FormulaInput<'_>,
    ) -> NavResponse;

    /// Forget suggestions and pointing state: the session ended or the
    /// buffer changed without a content key.
    fn reset(&mut self);
}

#[derive(Debug, Clone)]
pub struct FormulaAutocomplete {
    min_prefix: usize,
    rows: usize,
    cols: usize,

    visible: bool,
    selected: usize,
    suggestions: Vec<&'static FunctionInfo>,
    replace_range: Range<usize>,

    // Live pointing reference: start cell, optional range end, and where its
    // text sits in the buffer
    ref_cell: Option<(usize, usize)>,
    ref_end: Option<(usize, usize)>,
    ref_span: Range<usize>,
}

impl Default for FormulaAutocomplete {
    fn default() -> Self {
        Self::new(2)
    }
}

impl FormulaAutocomplete {
    pub fn new(min_prefix: usize) -> Self {
        Self {
            min_prefix: min_prefix.max(1),
            rows: MAX_ROWS,
            cols: MAX_COLS,
            visible: false,
            selected: 0,
            suggestions: Vec::new(),
            replace_range: 0..0,
            ref_cell: None,
            ref_end: None,
            ref_span: 0..0,
        }
    }

    /// Clamp pointing references to a `rows` x `cols` grid.
    pub fn with_bounds(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows.max(1);
        self.cols = cols.max(1);
        self
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn suggestions(&self) -> &[&'static FunctionInfo] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<&'static FunctionInfo> {
        if self.visible {
            self.suggestions.get(self.selected).copied()
        } else {
            None
        }
    }

    /// Cells covered by the live pointing reference, as (start, end).
    pub fn ref_target(&self) -> Option<((usize, usize), (usize, usize))> {
        let start = self.ref_cell?;
        Some((start, self.ref_end.unwrap_or(start)))
    }

    fn dismiss(&mut self) {
        self.visible = false;
        self.selected = 0;
        self.suggestions.clear();
    }

    fn stop_pointing(&mut self) {
        self.ref_cell = None;
        self.ref_end = None;
    }

    fn step(&self, (row, col): (usize, usize), direction: Direction) -> (usize, usize) {
        let (dr, dc) = direction.delta();
        let row = row.saturating_add_signed(dr).min(self.rows - 1);
        let col = col.saturating_add_signed(dc).min(self.cols - 1);
        (row, col)
    }

    /// Write the live reference into the buffer, replacing the previous one.
    fn write_reference(&mut self, input: FormulaInput<'_>) {
        let Some(start) = self.ref_cell else {
            return;
        };
        let text = match self.ref_end {
            Some(end) => make_range_ref(start, end),
            None => make_cell_ref(start.0, start.1),
        };

        let from = char_to_byte(input.buffer, self.ref_span.start);
        let to = char_to_byte(input.buffer, self.ref_span.end);
        input.buffer.replace_range(from..to, &text);

        self.ref_span = self.ref_span.start..self.ref_span.start + text.chars().count();
        *input.caret = self.ref_span.end;
    }
}

impl FormulaAssist for FormulaAutocomplete {
    fn candidate_active(&self) -> bool {
        self.visible && self.selected < self.suggestions.len()
    }

    fn analyze(&mut self, buffer: &str, caret: usize, key_code: u32) {
        log::trace!("formula analysis at {} after key {}", caret, key_code);

        // Typing finalizes any reference being pointed at
        self.stop_pointing();

        if !is_formula_text(buffer) {
            self.dismiss();
            return;
        }

        let ctx = formula_context::analyze(buffer, caret);
        let prefix = match (ctx.mode, ctx.identifier_text.as_deref()) {
            (FormulaEditMode::Identifier, Some(id)) if id.chars().count() >= self.min_prefix => id,
            _ => {
                self.dismiss();
                return;
            }
        };

        self.suggestions = formula_context::get_functions_by_prefix(prefix);
        if self.suggestions.is_empty() {
            self.dismiss();
            return;
        }
        self.visible = true;
        self.replace_range = ctx.replace_range;
        if self.selected >= self.suggestions.len() {
            self.selected = 0;
        }
    }

    fn accept_candidate(&mut self, input: FormulaInput<'_>) -> bool {
        let Some(func) = self.selected() else {
            self.dismiss();
            return false;
        };

        let replacement = format!("{}(", func.name);
        let range = self.replace_range.clone();
        let start = char_to_byte(input.buffer, range.start);
        let end = char_to_byte(input.buffer, range.end);
        input.buffer.replace_range(start..end, &replacement);
        *input.caret = range.start + replacement.chars().count();

        log::debug!("accepted function suggestion {}", func.name);
        self.dismiss();
        true
    }

    fn navigate(
        &mut self,
        origin: (usize, usize),
        direction: Direction,
        extend: bool,
        input: FormulaInput<'_>,
    ) -> NavResponse {
        if self.candidate_active() {
            match direction {
                Direction::Up if !extend => {
                    self.selected = self.selected.checked_sub(1).unwrap_or(self.suggestions.len() - 1);
                    return NavResponse::CandidateMoved;
                }
                Direction::Down if !extend => {
                    self.selected = (self.selected + 1) % self.suggestions.len();
                    return NavResponse::CandidateMoved;
                }
                _ => self.dismiss(),
            }
        }

        // A caret moved elsewhere since the last insertion ends pointing
        if self.ref_cell.is_some() && *input.caret != self.ref_span.end {
            self.stop_pointing();
        }

        let pointing = self.ref_cell.is_some();
        if !pointing && !formula_context::is_reference_insertion_point(input.buffer, *input.caret) {
            return NavResponse::NotHandled;
        }
        self.dismiss();

        if extend && pointing {
            let end = self.ref_end.or(self.ref_cell).unwrap_or(origin);
            self.ref_end = Some(self.step(end, direction));
        } else {
            let from = self.ref_cell.unwrap_or(origin);
            self.ref_cell = Some(self.step(from, direction));
            self.ref_end = None;
            if !pointing {
                self.ref_span = *input.caret..*input.caret;
            }
        }

        self.write_reference(input);
        NavResponse::ReferenceUpdated
    }

    fn reset(&mut self) {
        self.dismiss();
        self.stop_pointing();
        self.replace_range = 0..0;
        self.ref_span = 0..0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keycode;

    fn nav(
        ac: &mut FormulaAutocomplete,
        buffer: &mut String,
        caret: &mut usize,
        direction: Direction,
        extend: bool,
    ) -> NavResponse {
        ac.navigate((1, 1), direction, extend, FormulaInput { buffer, caret })
    }

    #[test]
    fn test_suggestions_open_after_min_prefix() {
        let mut ac = FormulaAutocomplete::new(2);
        ac.analyze("=S", 2, 83);
        assert!(!ac.candidate_active());
        ac.analyze("=SU", 3, 85);
        assert!(ac.candidate_active());
        assert_eq!(ac.selected().map(|f| f.name), Some("SUBSTITUTE"));
    }

    #[test]
    fn test_no_suggestions_outside_formula() {
        let mut ac = FormulaAutocomplete::new(1);
        ac.analyze("SU", 2, 85);
        assert!(!ac.candidate_active());
    }

    #[test]
    fn test_accept_replaces_identifier() {
        let mut ac = FormulaAutocomplete::new(2);
        let mut buffer = String::from("=1+vlo");
        let mut caret = 6;
        ac.analyze(&buffer, caret, 79);
        assert!(ac.accept_candidate(FormulaInput { buffer: &mut buffer, caret: &mut caret }));
        assert_eq!(buffer, "=1+VLOOKUP(");
        assert_eq!(caret, 11);
        assert!(!ac.candidate_active());
    }

    #[test]
    fn test_accept_without_candidate_does_nothing() {
        let mut ac = FormulaAutocomplete::new(2);
        let mut buffer = String::from("=1");
        let mut caret = 2;
        assert!(!ac.accept_candidate(FormulaInput { buffer: &mut buffer, caret: &mut caret }));
        assert_eq!(buffer, "=1");
    }

    #[test]
    fn test_up_down_cycle_highlight() {
        let mut ac = FormulaAutocomplete::new(2);
        let mut buffer = String::from("=SU");
        let mut caret = 3;
        ac.analyze(&buffer, caret, 85);
        assert_eq!(nav(&mut ac, &mut buffer, &mut caret, Direction::Down, false), NavResponse::CandidateMoved);
        assert_eq!(ac.selected().map(|f| f.name), Some("SUM"));
        assert_eq!(nav(&mut ac, &mut buffer, &mut caret, Direction::Up, false), NavResponse::CandidateMoved);
        assert_eq!(nav(&mut ac, &mut buffer, &mut caret, Direction::Up, false), NavResponse::CandidateMoved);
        assert_eq!(ac.selected().map(|f| f.name), Some("SUMPRODUCT"));
        assert_eq!(buffer, "=SU");
    }

    #[test]
    fn test_arrow_inserts_reference_at_insertion_point() {
        let mut ac = FormulaAutocomplete::default();
        let mut buffer = String::from("=");
        let mut caret = 1;
        // Editing B2; Right points at C2
        assert_eq!(nav(&mut ac, &mut buffer, &mut caret, Direction::Right, false), NavResponse::ReferenceUpdated);
        assert_eq!(buffer, "=C2");
        assert_eq!(caret, 3);

        // Moving again replaces the reference
        nav(&mut ac, &mut buffer, &mut caret, Direction::Down, false);
        assert_eq!(buffer, "=C3");

        // Shift extends to a range
        nav(&mut ac, &mut buffer, &mut caret, Direction::Right, true);
        nav(&mut ac, &mut buffer, &mut caret, Direction::Down, true);
        assert_eq!(buffer, "=C3:D4");
        assert_eq!(ac.ref_target(), Some(((2, 2), (3, 3))));
    }

    #[test]
    fn test_typing_finalizes_reference() {
        let mut ac = FormulaAutocomplete::default();
        let mut buffer = String::from("=SUM(");
        let mut caret = 5;
        nav(&mut ac, &mut buffer, &mut caret, Direction::Up, false);
        assert_eq!(buffer, "=SUM(B1");

        buffer.push('+');
        caret += 1;
        ac.analyze(&buffer, caret, 187);
        assert!(ac.ref_target().is_none());

        nav(&mut ac, &mut buffer, &mut caret, Direction::Left, false);
        assert_eq!(buffer, "=SUM(B1+A2");
    }

    #[test]
    fn test_arrow_passes_through_inside_operand() {
        let mut ac = FormulaAutocomplete::default();
        let mut buffer = String::from("=A1");
        let mut caret = 3;
        assert_eq!(nav(&mut ac, &mut buffer, &mut caret, Direction::Left, false), NavResponse::NotHandled);
        assert_eq!(buffer, "=A1");
    }

    #[test]
    fn test_reference_clamps_at_grid_edge() {
        let mut ac = FormulaAutocomplete::default().with_bounds(3, 3);
        let mut buffer = String::from("=");
        let mut caret = 1;
        ac.navigate((0, 0), Direction::Up, false, FormulaInput { buffer: &mut buffer, caret: &mut caret });
        assert_eq!(buffer, "=A1");
        for _ in 0..5 {
            ac.navigate((0, 0), Direction::Right, false, FormulaInput { buffer: &mut buffer, caret: &mut caret });
        }
        assert_eq!(buffer, "=C1");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ac = FormulaAutocomplete::new(1);
        ac.analyze("=S", 2, keycode::V);
        assert!(ac.candidate_active());
        ac.reset();
        assert!(!ac.candidate_active());
        assert!(ac.ref_target().is_none());
    }
}
