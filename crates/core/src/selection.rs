use serde::{Deserialize, Serialize};

/// Default column width in pixels (matches `grid.defaultColumnWidth`).
pub const DEFAULT_COL_WIDTH: f32 = 80.0;
/// Default row height in pixels (matches `grid.rowHeight`).
pub const DEFAULT_ROW_HEIGHT: f32 = 24.0;

/// A rectangular range of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl Range {
    /// Create a new range, normalizing so start <= end.
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        }
    }

    pub fn single(row: usize, col: usize) -> Self {
        Self::new(row, col, row, col)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row &&
        col >= self.start_col && col <= self.end_col
    }

    pub fn is_single(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }
}

/// Pixel placement of a cell, used to position the edit overlay.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// The focused cell of the first selection entry plus where it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionAnchor {
    pub row: usize,
    pub col: usize,
    pub geometry: Geometry,
}

impl SelectionAnchor {
    pub fn cell(&self) -> (usize, usize) {
        (self.row, self.col)
    }
}

/// Grid direction for active-cell movement and reference pointing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// (row delta, col delta) for one step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// One-shot flags attached to a request to open an edit session.
///
/// They travel with the request itself and are consumed by the session start
/// that receives them; nothing keeps them around afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StartOptions {
    /// Keep whatever the input surface already holds instead of loading the cell.
    pub skip_overwrite: bool,
    /// Do not move the caret to the end once the surface has rendered.
    pub suppress_auto_focus: bool,
}

/// A pending request to edit the focused cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTarget {
    /// Bumped on every `begin_edit`; never reused.
    pub generation: u64,
    pub row: usize,
    pub col: usize,
    pub options: StartOptions,
}

/// The selection model: ordered list of ranges with a focused cell and the
/// edit generation token that tells the cell editor when to open or close.
#[derive(Debug, Clone)]
pub struct Selection {
    ranges: Vec<Range>,
    focus: (usize, usize),
    anchor: (usize, usize),
    rows: usize,
    cols: usize,
    col_width: f32,
    row_height: f32,
    generation: u64,
    editing: Option<EditTarget>,
}

impl Selection {
    /// Selection over a `rows` x `cols` grid, focused on A1.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            ranges: vec![Range::single(0, 0)],
            focus: (0, 0),
            anchor: (0, 0),
            rows: rows.max(1),
            cols: cols.max(1),
            col_width: DEFAULT_COL_WIDTH,
            row_height: DEFAULT_ROW_HEIGHT,
            generation: 0,
            editing: None,
        }
    }

    pub fn with_cell_size(mut self, col_width: f32, row_height: f32) -> Self {
        self.col_width = col_width;
        self.row_height = row_height;
        self
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Focused cell, or None when nothing is selected.
    pub fn active_cell(&self) -> Option<(usize, usize)> {
        if self.ranges.is_empty() {
            None
        } else {
            Some(self.focus)
        }
    }

    /// Anchor of the first selection entry with its uniform-grid geometry.
    pub fn anchor(&self) -> Option<SelectionAnchor> {
        let (row, col) = self.active_cell()?;
        Some(SelectionAnchor {
            row,
            col,
            geometry: self.geometry_of(row, col),
        })
    }

    pub fn geometry_of(&self, row: usize, col: usize) -> Geometry {
        Geometry {
            left: col as f32 * self.col_width,
            top: row as f32 * self.row_height,
            width: self.col_width,
            height: self.row_height,
        }
    }

    /// Select a single cell (click). Ends any edit in progress, since a
    /// session's anchor cannot move.
    pub fn select_cell(&mut self, row: usize, col: usize) {
        let (row, col) = self.clamp(row as isize, col as isize);
        self.editing = None;
        self.ranges = vec![Range::single(row, col)];
        self.focus = (row, col);
        self.anchor = (row, col);
    }

    /// Extend the first range from the anchor to the given cell.
    pub fn extend_to(&mut self, row: usize, col: usize) {
        let (row, col) = self.clamp(row as isize, col as isize);
        self.editing = None;
        let (anchor_row, anchor_col) = self.anchor;
        if self.ranges.is_empty() {
            self.ranges.push(Range::single(anchor_row, anchor_col));
        }
        self.ranges[0] = Range::new(anchor_row, anchor_col, row, col);
        self.focus = (row, col);
    }

    /// Drop every selection entry (and therefore any edit).
    pub fn clear(&mut self) {
        self.ranges.clear();
        self.editing = None;
    }

    /// Request an edit of the focused cell. Returns the new generation, or
    /// None when nothing is selected.
    pub fn begin_edit(&mut self, options: StartOptions) -> Option<u64> {
        let (row, col) = self.active_cell()?;
        self.generation += 1;
        self.editing = Some(EditTarget {
            generation: self.generation,
            row,
            col,
            options,
        });
        Some(self.generation)
    }

    /// Empty the edit token: the editor must go idle.
    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    pub fn edit_target(&self) -> Option<EditTarget> {
        self.editing
    }

    /// Move the focused cell `distance` steps in `dir`, clamped to the grid.
    ///
    /// With `extend` the first range grows from the anchor; otherwise the
    /// selection collapses onto the new cell. A distance of zero re-selects
    /// the focused cell, which restores a plain single-cell highlight.
    pub fn move_active_cell(&mut self, dir: Direction, distance: usize, extend: bool) {
        let Some((row, col)) = self.active_cell() else {
            return;
        };
        let (dr, dc) = dir.delta();
        let steps = distance as isize;
        let (new_row, new_col) = self.clamp(row as isize + dr * steps, col as isize + dc * steps);
        if extend {
            self.extend_to(new_row, new_col);
        } else {
            self.select_cell(new_row, new_col);
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn clamp(&self, row: isize, col: isize) -> (usize, usize) {
        (
            row.clamp(0, self.rows as isize - 1) as usize,
            col.clamp(0, self.cols as isize - 1) as usize,
        )
    }
}
