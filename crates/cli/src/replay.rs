//! Headless replay: run a script against a sheet and report what the editor
//! did at every step.
//!
//! Usage: gridedit replay --sheet book.json --script steps.json [--output out.json]
//!
//! The report is JSON on stdout: one entry per step with the key outcomes,
//! the active cell and the edit session afterwards, then the final sheet.

use serde::Serialize;

use gridedit_config::EditorSettings;
use gridedit_editor::formula_refs::make_cell_ref;
use gridedit_editor::{HeadlessEditor, KeyClassification, KeyOutcome, Modifiers};
use gridedit_engine::sheet::Sheet;
use gridedit_engine::snapshot::SnapshotKind;

use crate::script::{self, Step};
use crate::CliError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeReport {
    Ignored,
    PassThrough { classification: KeyClassification },
    Cancelled,
    Committed { cell: String },
    CommitDropped,
    FormulaHandled,
}

impl From<KeyOutcome> for OutcomeReport {
    fn from(outcome: KeyOutcome) -> Self {
        match outcome {
            KeyOutcome::Ignored => OutcomeReport::Ignored,
            KeyOutcome::PassThrough(cause) => OutcomeReport::PassThrough { classification: cause.classification },
            KeyOutcome::Cancelled => OutcomeReport::Cancelled,
            KeyOutcome::Committed { row, col } => OutcomeReport::Committed { cell: make_cell_ref(row, col) },
            KeyOutcome::CommitDropped => OutcomeReport::CommitDropped,
            KeyOutcome::FormulaHandled => OutcomeReport::FormulaHandled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub cell: String,
    pub origin: SnapshotKind,
    pub buffer: String,
    pub caret: usize,
    pub formula: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<OutcomeReport>,
    /// Editor-level rejection (input while idle, edit with nothing selected)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<String>,
    pub active_cell: Option<String>,
    pub session: Option<SessionReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub sheet: Sheet,
}

pub fn run(sheet: Sheet, settings: EditorSettings, steps: &[Step]) -> Result<ReplayReport, CliError> {
    let mut editor = HeadlessEditor::new(sheet, settings);
    let mut reports = Vec::with_capacity(steps.len());

    for (index, step) in steps.iter().enumerate() {
        let mut outcomes = Vec::new();
        let mut rejected = None;

        match step {
            Step::Select { cell } => {
                let (row, col) = script::parse_cell(cell)?;
                if !editor.sheet.in_bounds(row, col) {
                    return Err(CliError::args(format!(
                        "step {}: {} is outside the {}x{} sheet",
                        index + 1,
                        cell,
                        editor.sheet.rows,
                        editor.sheet.cols
                    )));
                }
                editor.select(row, col);
            }
            Step::BeginEdit { .. } => {
                let options = step.start_options().unwrap_or_default();
                if !editor.begin_edit(options) {
                    rejected = Some("no active cell".to_string());
                }
            }
            Step::EndEdit => editor.end_edit(),
            Step::Key { key, key_code, shift, control, alt, platform } => {
                let modifiers = Modifiers { control: *control, alt: *alt, shift: *shift, platform: *platform };
                let event = script::key_event(key, *key_code, modifiers);
                outcomes.push(editor.key(event).into());
            }
            Step::Type { text } => {
                outcomes.extend(editor.type_text(text).into_iter().map(OutcomeReport::from));
            }
            Step::Paste { text } => outcomes.push(editor.paste(text).into()),
            Step::Input { content } => {
                if let Err(e) = editor.input(content) {
                    rejected = Some(e.to_string());
                }
            }
            Step::Render => editor.render(),
        }

        if let Some(reason) = &rejected {
            log::debug!("step {} ({}) rejected: {}", index + 1, step.name(), reason);
        }

        reports.push(StepReport {
            step: index + 1,
            op: step.name(),
            outcomes,
            rejected,
            active_cell: editor.selection.active_cell().map(|(r, c)| make_cell_ref(r, c)),
            session: session_report(&editor),
        });
    }

    Ok(ReplayReport { steps: reports, sheet: editor.sheet })
}

fn session_report(editor: &HeadlessEditor) -> Option<SessionReport> {
    let session = editor.controller.session()?;
    let (row, col) = session.anchor().cell();
    Some(SessionReport {
        cell: make_cell_ref(row, col),
        origin: session.origin(),
        buffer: session.buffer().to_string(),
        caret: session.caret(),
        formula: session.is_formula_context(),
    })
}
