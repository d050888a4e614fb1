//! Core types shared by the grid and the cell editor: selection ranges,
//! the selection anchor, directions, and edit-session start requests.

pub mod selection;

pub use selection::{Direction, EditTarget, Geometry, Range, Selection, SelectionAnchor, StartOptions};
