use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// No edit session is active.
    NotEditing,
    /// The session's cell is no longer the edit target; nothing was written.
    StaleAnchor { row: usize, col: usize },
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEditing => write!(f, "no edit session is active"),
            Self::StaleAnchor { row, col } => {
                write!(f, "cell ({row}, {col}) is no longer being edited; commit dropped")
            }
        }
    }
}

impl std::error::Error for EditError {}
