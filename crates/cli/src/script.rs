//! Replay scripts: a JSON array of steps driving the headless editor.
//!
//! ```json
//! [
//!   { "op": "select", "cell": "B2" },
//!   { "op": "begin_edit" },
//!   { "op": "type", "text": "=su" },
//!   { "op": "key", "key": "Tab" },
//!   { "op": "key", "key": "ArrowDown", "shift": true },
//!   { "op": "key", "key": "Enter" }
//! ]
//! ```

use serde::Deserialize;

use gridedit_core::{Direction, StartOptions};
use gridedit_editor::formula_refs::parse_cell_ref;
use gridedit_editor::{KeyEvent, Modifiers};

use crate::CliError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Move the selection to a single cell (A1 notation).
    Select { cell: String },
    BeginEdit {
        #[serde(default)]
        skip_overwrite: bool,
        #[serde(default)]
        suppress_auto_focus: bool,
    },
    EndEdit,
    /// One key-down. `key_code` is derived from `key` when omitted.
    Key {
        key: String,
        #[serde(default)]
        key_code: u32,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        control: bool,
        #[serde(default)]
        alt: bool,
        #[serde(default)]
        platform: bool,
    },
    /// One key-down per character.
    Type { text: String },
    Paste { text: String },
    /// Content change without a key (input method, drop).
    Input { content: String },
    Render,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Select { .. } => "select",
            Step::BeginEdit { .. } => "begin_edit",
            Step::EndEdit => "end_edit",
            Step::Key { .. } => "key",
            Step::Type { .. } => "type",
            Step::Paste { .. } => "paste",
            Step::Input { .. } => "input",
            Step::Render => "render",
        }
    }

    pub fn start_options(&self) -> Option<StartOptions> {
        match *self {
            Step::BeginEdit { skip_overwrite, suppress_auto_focus } => {
                Some(StartOptions { skip_overwrite, suppress_auto_focus })
            }
            _ => None,
        }
    }
}

pub fn parse_script(json: &str) -> Result<Vec<Step>, CliError> {
    serde_json::from_str(json).map_err(|e| {
        CliError::parse(format!("invalid script: {}", e))
            .with_hint("a script is a JSON array of steps such as {\"op\": \"select\", \"cell\": \"A1\"}")
    })
}

pub fn parse_cell(cell: &str) -> Result<(usize, usize), CliError> {
    parse_cell_ref(cell).ok_or_else(|| {
        CliError::parse(format!("invalid cell reference: {:?}", cell)).with_hint("use A1 notation, e.g. B3")
    })
}

/// Build the key-down a script step describes. Named keys and single
/// characters get their usual key code unless one is given explicitly.
pub fn key_event(key: &str, key_code: u32, modifiers: Modifiers) -> KeyEvent {
    let mut event = match named_key(key) {
        Some(event) => event,
        None => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => KeyEvent::from_char(ch),
                _ => KeyEvent::new(key, 0),
            }
        }
    };
    if key_code != 0 {
        event.key_code = key_code;
    }
    event.modifiers = Modifiers {
        control: modifiers.control,
        alt: modifiers.alt,
        platform: modifiers.platform,
        // `from_char` marks uppercase letters as shifted
        shift: modifiers.shift || event.modifiers.shift,
    };
    event
}

fn named_key(key: &str) -> Option<KeyEvent> {
    let lower = key.to_ascii_lowercase();
    let event = match lower.as_str() {
        "escape" | "esc" => KeyEvent::escape(),
        "enter" | "return" => KeyEvent::enter(),
        "tab" => KeyEvent::tab(),
        "backspace" => KeyEvent::backspace(),
        "delete" | "del" => KeyEvent::delete(),
        "f4" => KeyEvent::f4(),
        "space" => KeyEvent::from_char(' '),
        "arrowup" | "up" => KeyEvent::arrow(Direction::Up),
        "arrowdown" | "down" => KeyEvent::arrow(Direction::Down),
        "arrowleft" | "left" => KeyEvent::arrow(Direction::Left),
        "arrowright" | "right" => KeyEvent::arrow(Direction::Right),
        _ => return None,
    };
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridedit_editor::keys::keycode;
    use proptest::prelude::*;

    #[test]
    fn test_parse_script_steps() {
        let steps = parse_script(
            r#"[
                {"op": "select", "cell": "C2"},
                {"op": "begin_edit", "skip_overwrite": true},
                {"op": "key", "key": "Escape"},
                {"op": "type", "text": "12"},
                {"op": "render"}
            ]"#,
        )
        .unwrap();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0], Step::Select { cell: "C2".into() });
        assert_eq!(
            steps[1].start_options(),
            Some(StartOptions { skip_overwrite: true, suppress_auto_focus: false })
        );
        assert_eq!(steps[2].name(), "key");
        assert_eq!(steps[4], Step::Render);
    }

    #[test]
    fn test_parse_script_rejects_unknown_op() {
        let err = parse_script(r#"[{"op": "undo"}]"#).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_PARSE);
        assert!(err.hint.is_some());
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("b3").unwrap(), (2, 1));
        assert!(parse_cell("3B").is_err());
    }

    #[test]
    fn test_key_event_resolves_names_and_chars() {
        let esc = key_event("Escape", 0, Modifiers::default());
        assert_eq!(esc.key_code, keycode::ESCAPE);

        let up = key_event("up", 0, Modifiers { shift: true, ..Default::default() });
        assert_eq!(up.key_code, keycode::UP);
        assert!(up.modifiers.shift);

        let a = key_event("A", 0, Modifiers::default());
        assert_eq!(a.key_code, 65);
        assert!(a.modifiers.shift);

        let f2 = key_event("F2", 113, Modifiers::default());
        assert_eq!(f2.key_code, 113);
    }

    proptest! {
        #[test]
        fn prop_explicit_key_code_wins(key in "[A-Za-z0-9 ]{0,8}", code in 1u32..256, shift: bool) {
            let event = key_event(&key, code, Modifiers { shift, ..Default::default() });
            prop_assert_eq!(event.key_code, code);
            prop_assert!(!shift || event.modifiers.shift);
        }
    }
}
