//! Picks the text an edit session starts from.
//!
//! Precedence: inline rich text, then formula source, then display value,
//! then raw value. Plain values are entity-escaped since the surface holds
//! markup, and the chosen text is always passed through [`escape_script_tag`]
//! because it is about to land in an editable surface.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::rich_text;
use crate::sanitize::escape_script_tag;
use crate::sheet::Sheet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    PlainValue,
    Formula,
    InlineRichText,
}

/// Read-only textual representation of a stored cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub kind: SnapshotKind,
    pub rendered_content: String,
}

impl CellSnapshot {
    pub fn empty() -> Self {
        Self { kind: SnapshotKind::PlainValue, rendered_content: String::new() }
    }
}

/// Snapshot of the cell at (row, col). Pure read; empty or missing cells
/// give an empty plain snapshot.
pub fn read_snapshot(sheet: &Sheet, row: usize, col: usize) -> CellSnapshot {
    match sheet.cell(row, col) {
        Some(cell) => snapshot_of(cell),
        None => CellSnapshot::empty(),
    }
}

pub fn snapshot_of(cell: &Cell) -> CellSnapshot {
    let (kind, text) = if let Some(runs) = cell.rich_text.as_deref().filter(|runs| !runs.is_empty()) {
        (SnapshotKind::InlineRichText, rich_text::render_html(runs))
    } else if let Some(formula) = cell.formula_source() {
        (SnapshotKind::Formula, formula.to_string())
    } else {
        let text = cell
            .display
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| cell.value.raw_display());
        (SnapshotKind::PlainValue, rich_text::escape_text(&text).into_owned())
    };

    CellSnapshot {
        kind,
        rendered_content: escape_script_tag(&text).into_owned(),
    }
}
