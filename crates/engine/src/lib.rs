pub mod cell;
pub mod error;
pub mod rich_text;
pub mod sanitize;
pub mod sheet;
pub mod snapshot;

pub use error::SheetError;
