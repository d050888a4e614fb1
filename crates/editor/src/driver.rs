//! Headless host: a sheet, a selection, a plain-text surface and the
//! controller wired together the way a UI would wire them.
//!
//! Each user-level call (`key`, `type_text`, `begin_edit`, ...) is one event
//! followed by one frame: the controller syncs with the selection and any
//! deferred caret placement runs.

use gridedit_config::EditorSettings;
use gridedit_core::{Selection, StartOptions};
use gridedit_engine::sheet::Sheet;

use crate::autocomplete::FormulaAutocomplete;
use crate::controller::{Collaborators, EditController, InputEvent, KeyOutcome};
use crate::error::EditError;
use crate::keys::{keycode, KeyClassification, KeyEvent};
use crate::surface::{InputSurface, MemorySurface};

pub struct HeadlessEditor {
    pub sheet: Sheet,
    pub selection: Selection,
    pub formula: FormulaAutocomplete,
    pub surface: MemorySurface,
    pub controller: EditController,
    /// Text a paste key inserts
    pub clipboard: String,
}

impl HeadlessEditor {
    pub fn new(sheet: Sheet, settings: EditorSettings) -> Self {
        let selection = Selection::new(sheet.rows, sheet.cols);
        let formula = FormulaAutocomplete::new(settings.autocomplete_min_prefix).with_bounds(sheet.rows, sheet.cols);
        Self {
            sheet,
            selection,
            formula,
            surface: MemorySurface::new(),
            controller: EditController::new(settings),
            clipboard: String::new(),
        }
    }

    fn parts(&mut self) -> (&mut EditController, Collaborators<'_>) {
        (
            &mut self.controller,
            Collaborators {
                store: &mut self.sheet,
                selection: &mut self.selection,
                formula: &mut self.formula,
                surface: &mut self.surface,
            },
        )
    }

    /// One frame: react to selection changes, then run deferred caret work.
    pub fn render(&mut self) {
        let (controller, mut cx) = self.parts();
        controller.sync(&mut cx);
        self.controller.flush_deferred(&mut self.surface);
    }

    pub fn select(&mut self, row: usize, col: usize) {
        self.selection.select_cell(row, col);
        self.render();
    }

    /// Ask the selection model to edit the focused cell.
    pub fn begin_edit(&mut self, options: StartOptions) -> bool {
        let began = self.selection.begin_edit(options).is_some();
        self.render();
        began
    }

    pub fn end_edit(&mut self) {
        self.selection.end_edit();
        self.render();
    }

    /// Deliver a key-down, apply the surface's default for pass-through keys,
    /// and report the resulting content change.
    pub fn key(&mut self, event: KeyEvent) -> KeyOutcome {
        let (controller, mut cx) = self.parts();
        let outcome = controller.handle_key_down(&event, &mut cx);

        if let KeyOutcome::PassThrough(cause) = outcome {
            self.apply_default(&event, cause.classification);
            let input = InputEvent {
                content: self.surface.content(),
                caret: self.surface.caret(),
                cause: Some(cause),
            };
            let (controller, mut cx) = self.parts();
            if let Err(e) = controller.handle_input(input, &mut cx) {
                log::debug!("input after {:?} ignored: {}", event.key, e);
            }
        }

        self.render();
        outcome
    }

    /// Type each character as its own key-down.
    pub fn type_text(&mut self, text: &str) -> Vec<KeyOutcome> {
        text.chars().map(|ch| self.key(KeyEvent::from_char(ch))).collect()
    }

    pub fn paste(&mut self, text: &str) -> KeyOutcome {
        self.clipboard = text.to_string();
        self.key(KeyEvent::paste())
    }

    /// Content change with no key behind it (input method, drag and drop).
    pub fn input(&mut self, content: &str) -> Result<(), EditError> {
        self.surface.set_content(content);
        self.surface.move_caret_to_end();
        let event = InputEvent { content: self.surface.content(), caret: self.surface.caret(), cause: None };
        let (controller, mut cx) = self.parts();
        let result = controller.handle_input(event, &mut cx);
        self.render();
        result
    }

    fn apply_default(&mut self, event: &KeyEvent, classification: KeyClassification) {
        match classification {
            KeyClassification::ContentKey => match event.key_code {
                keycode::BACKSPACE => self.surface.backspace(),
                keycode::DELETE => self.surface.delete_forward(),
                keycode::SPACE => self.surface.insert_str(" "),
                keycode::V if event.modifiers.control || event.modifiers.platform => {
                    let text = self.clipboard.clone();
                    self.surface.insert_str(&text);
                }
                _ if event.key.chars().count() == 1 => self.surface.insert_str(&event.key),
                _ => {}
            },
            KeyClassification::NavigateDirection { direction, .. } => self.surface.move_caret(direction),
            _ => {}
        }
    }
}
