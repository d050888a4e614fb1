use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// Coordinate lies outside the sheet.
    OutOfBounds { row: usize, col: usize, rows: usize, cols: usize },
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { row, col, rows, cols } => {
                write!(f, "cell ({row}, {col}) is outside the {rows}x{cols} sheet")
            }
        }
    }
}

impl std::error::Error for SheetError {}
