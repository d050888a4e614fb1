pub mod autocomplete;
pub mod controller;
pub mod driver;
pub mod error;
pub mod formula_context;
pub mod formula_refs;
pub mod keys;
pub mod model;
pub mod session;
pub mod surface;

pub use autocomplete::{FormulaAssist, FormulaAutocomplete, FormulaInput, NavResponse};
pub use controller::{Collaborators, EditController, InputEvent, KeyOutcome, Overlay};
pub use driver::HeadlessEditor;
pub use error::EditError;
pub use keys::{classify, ClassifiedKey, ClassifyContext, KeyClassification, KeyEvent, Modifiers};
pub use model::{CellStore, SelectionModel};
pub use session::{CaretRequest, CaretTarget, EditSession, EditState, SessionId};
pub use surface::{InputSurface, MemorySurface};
