use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellValue};
use crate::error::SheetError;

/// Sparse cell storage for one sheet.
///
/// Serialized as a flat list of `{ "r", "c", ...cell }` entries since JSON
/// object keys cannot be coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SheetFile", into = "SheetFile")]
pub struct Sheet {
    pub name: String,
    cells: FxHashMap<(usize, usize), Cell>,
    pub rows: usize,
    pub cols: usize,
}

impl Sheet {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            name: String::from("Sheet1"),
            cells: FxHashMap::default(),
            rows,
            cols,
        }
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<(), SheetError> {
        if self.in_bounds(row, col) {
            Ok(())
        } else {
            Err(SheetError::OutOfBounds { row, col, rows: self.rows, cols: self.cols })
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Get a copy of a cell (default empty cell if not found)
    pub fn get_cell(&self, row: usize, col: usize) -> Cell {
        self.cells
            .get(&(row, col))
            .cloned()
            .unwrap_or_default()
    }

    /// Place a fully built cell (imports, fixtures). Empty cells are removed.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) -> Result<(), SheetError> {
        self.check_bounds(row, col)?;
        if cell.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), cell);
        }
        Ok(())
    }

    /// Write edit-buffer content to a cell. The cell decides whether the
    /// content is plain, formula, or rich text.
    pub fn commit(&mut self, row: usize, col: usize, raw: &str) -> Result<(), SheetError> {
        self.check_bounds(row, col)?;
        let cell = self.cells.entry((row, col)).or_insert_with(Cell::new);
        cell.set(raw);
        if cell.is_empty() {
            self.cells.remove(&(row, col));
        }
        log::debug!("committed cell ({}, {})", row, col);
        Ok(())
    }

    /// Store a value computed by an external evaluator for a formula cell.
    pub fn set_computed(&mut self, row: usize, col: usize, value: CellValue) -> Result<(), SheetError> {
        self.check_bounds(row, col)?;
        let cell = self.cells.entry((row, col)).or_insert_with(Cell::new);
        cell.value = value;
        cell.refresh_display();
        Ok(())
    }

    /// Raw value as text (no formula, no formatting).
    pub fn get_raw(&self, row: usize, col: usize) -> String {
        self.cells
            .get(&(row, col))
            .map(|c| c.value.raw_display())
            .unwrap_or_default()
    }

    /// Display text: `m` when present, else the raw value.
    pub fn get_display(&self, row: usize, col: usize) -> String {
        match self.cells.get(&(row, col)) {
            Some(cell) => cell
                .display
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| cell.value.raw_display()),
            None => String::new(),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Occupied cells in row-major order.
    pub fn cells_sorted(&self) -> Vec<((usize, usize), &Cell)> {
        let mut cells: Vec<_> = self.cells.iter().map(|(pos, cell)| (*pos, cell)).collect();
        cells.sort_by_key(|(pos, _)| *pos);
        cells
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SheetFile {
    #[serde(default = "default_name")]
    name: String,
    rows: usize,
    cols: usize,
    #[serde(default)]
    cells: Vec<CellEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CellEntry {
    r: usize,
    c: usize,
    #[serde(flatten)]
    cell: Cell,
}

fn default_name() -> String {
    String::from("Sheet1")
}

impl From<SheetFile> for Sheet {
    fn from(file: SheetFile) -> Self {
        let mut sheet = Sheet::new(file.rows, file.cols);
        sheet.name = file.name;
        for entry in file.cells {
            // Entries outside the declared size grow the sheet rather than vanish
            sheet.rows = sheet.rows.max(entry.r + 1);
            sheet.cols = sheet.cols.max(entry.c + 1);
            if !entry.cell.is_empty() {
                sheet.cells.insert((entry.r, entry.c), entry.cell);
            }
        }
        sheet
    }
}

impl From<Sheet> for SheetFile {
    fn from(sheet: Sheet) -> Self {
        let mut cells: Vec<CellEntry> = sheet
            .cells
            .into_iter()
            .map(|((r, c), cell)| CellEntry { r, c, cell })
            .collect();
        cells.sort_by_key(|e| (e.r, e.c));
        SheetFile { name: sheet.name, rows: sheet.rows, cols: sheet.cols, cells }
    }
}
