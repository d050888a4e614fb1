//! Collaborator seams: the cell store and the selection model.

use gridedit_core::{Direction, EditTarget, Selection, SelectionAnchor};
use gridedit_engine::snapshot::{read_snapshot, CellSnapshot};
use gridedit_engine::{sheet::Sheet, SheetError};

pub trait CellStore {
    /// Sanitized textual snapshot of a cell. Pure read.
    fn snapshot(&self, row: usize, col: usize) -> CellSnapshot;

    /// True if (row, col) is a writable cell.
    fn contains(&self, row: usize, col: usize) -> bool;

    /// Write buffer content; the store classifies it (plain, formula, rich).
    fn commit(&mut self, row: usize, col: usize, raw: &str) -> Result<(), SheetError>;
}

pub trait SelectionModel {
    /// First selected cell with its on-screen geometry.
    fn anchor(&self) -> Option<SelectionAnchor>;

    /// Current edit request, if any.
    fn edit_target(&self) -> Option<EditTarget>;

    fn end_edit(&mut self);

    fn move_active_cell(&mut self, direction: Direction, distance: usize, extend: bool);
}

impl CellStore for Sheet {
    fn snapshot(&self, row: usize, col: usize) -> CellSnapshot {
        read_snapshot(self, row, col)
    }

    fn contains(&self, row: usize, col: usize) -> bool {
        self.in_bounds(row, col)
    }

    fn commit(&mut self, row: usize, col: usize, raw: &str) -> Result<(), SheetError> {
        Sheet::commit(self, row, col, raw)
    }
}

impl SelectionModel for Selection {
    fn anchor(&self) -> Option<SelectionAnchor> {
        Selection::anchor(self)
    }

    fn edit_target(&self) -> Option<EditTarget> {
        Selection::edit_target(self)
    }

    fn end_edit(&mut self) {
        Selection::end_edit(self)
    }

    fn move_active_cell(&mut self, direction: Direction, distance: usize, extend: bool) {
        Selection::move_active_cell(self, direction, distance, extend)
    }
}
