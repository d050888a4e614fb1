//! Keystroke classification.
//!
//! Every key-down during an edit session passes through [`classify`] first.
//! Classification is a pure function of the event and a small context
//! (whether an autocomplete candidate is highlighted, and two settings), so
//! re-sending the same event yields the same answer.

use gridedit_core::Direction;
use serde::{Deserialize, Serialize};

/// Legacy DOM key codes used by the content-key rule.
pub mod keycode {
    pub const BACKSPACE: u32 = 8;
    pub const TAB: u32 = 9;
    pub const ENTER: u32 = 13;
    pub const SHIFT: u32 = 16;
    pub const CONTROL: u32 = 17;
    pub const ALT: u32 = 18;
    pub const ESCAPE: u32 = 27;
    pub const SPACE: u32 = 32;
    pub const LEFT: u32 = 37;
    pub const UP: u32 = 38;
    pub const RIGHT: u32 = 39;
    pub const DOWN: u32 = 40;
    /// Highest code in the non-printable control block.
    pub const DELETE: u32 = 46;
    pub const V: u32 = 86;
    pub const OS_LEFT: u32 = 91;
    pub const OS_RIGHT: u32 = 92;
    pub const MENU: u32 = 93;
    pub const NUMPAD_SEPARATOR: u32 = 108;
    pub const F1: u32 = 112;
    pub const F4: u32 = 115;
    pub const F12: u32 = 123;
    pub const NUM_LOCK: u32 = 144;
    /// Reported while an input method is composing.
    pub const PROCESS: u32 = 229;

    pub fn is_arrow(code: u32) -> bool {
        (LEFT..=DOWN).contains(&code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub control: bool,
    pub alt: bool,
    pub shift: bool,
    pub platform: bool, // Cmd on macOS
}

/// A raw key-down as delivered by the input surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key name (`"Escape"`, `"ArrowUp"`, `"a"`, ...). Lowercase short names
    /// such as `"escape"` or `"up"` are accepted as well.
    pub key: String,
    #[serde(default)]
    pub key_code: u32,
    #[serde(default, flatten)]
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, key_code: u32) -> Self {
        Self { key: key.into(), key_code, modifiers: Modifiers::default() }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.modifiers.control = true;
        self
    }

    pub fn escape() -> Self {
        Self::new("Escape", keycode::ESCAPE)
    }

    pub fn enter() -> Self {
        Self::new("Enter", keycode::ENTER)
    }

    pub fn tab() -> Self {
        Self::new("Tab", keycode::TAB)
    }

    pub fn backspace() -> Self {
        Self::new("Backspace", keycode::BACKSPACE)
    }

    pub fn delete() -> Self {
        Self::new("Delete", keycode::DELETE)
    }

    pub fn f4() -> Self {
        Self::new("F4", keycode::F4)
    }

    pub fn arrow(direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::new("ArrowUp", keycode::UP),
            Direction::Down => Self::new("ArrowDown", keycode::DOWN),
            Direction::Left => Self::new("ArrowLeft", keycode::LEFT),
            Direction::Right => Self::new("ArrowRight", keycode::RIGHT),
        }
    }

    pub fn paste() -> Self {
        Self::new("v", keycode::V).ctrl()
    }

    /// Key-down for typing a single character on a US layout.
    pub fn from_char(ch: char) -> Self {
        let (code, shift) = match ch {
            'a'..='z' => (ch.to_ascii_uppercase() as u32, false),
            'A'..='Z' => (ch as u32, true),
            '0'..='9' => (ch as u32, false),
            ' ' => (keycode::SPACE, false),
            ';' => (186, false),
            ':' => (186, true),
            '=' => (187, false),
            '+' => (187, true),
            ',' => (188, false),
            '<' => (188, true),
            '-' => (189, false),
            '.' => (190, false),
            '>' => (190, true),
            '/' => (191, false),
            '"' => (222, true),
            '\'' => (222, false),
            '!' => (49, true),
            '$' => (52, true),
            '%' => (53, true),
            '^' => (54, true),
            '&' => (55, true),
            '*' => (56, true),
            '(' => (57, true),
            ')' => (48, true),
            _ => (keycode::PROCESS, false),
        };
        let mut event = Self::new(ch.to_string(), code);
        event.modifiers.shift = shift;
        event
    }

    fn named(&self) -> Option<NamedKey> {
        let key = self.key.as_str();
        let is = |names: &[&str]| names.iter().any(|n| key.eq_ignore_ascii_case(n));
        if is(&["Escape", "Esc"]) {
            Some(NamedKey::Escape)
        } else if is(&["Enter", "Return"]) {
            Some(NamedKey::Enter)
        } else if is(&["Tab"]) {
            Some(NamedKey::Tab)
        } else if is(&["F4"]) {
            Some(NamedKey::F4)
        } else if is(&["ArrowUp", "Up"]) {
            Some(NamedKey::Arrow(Direction::Up))
        } else if is(&["ArrowDown", "Down"]) {
            Some(NamedKey::Arrow(Direction::Down))
        } else if is(&["ArrowLeft", "Left"]) {
            Some(NamedKey::Arrow(Direction::Left))
        } else if is(&["ArrowRight", "Right"]) {
            Some(NamedKey::Arrow(Direction::Right))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NamedKey {
    Escape,
    Enter,
    Tab,
    F4,
    Arrow(Direction),
}

/// What a key-down means to an active edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyClassification {
    Cancel,
    ConfirmAndMoveDown,
    ConfirmAndMoveRight,
    NavigateDirection { direction: Direction, extend: bool },
    AutocompleteCandidateKey,
    ContentKey,
    Ignored,
}

/// A classification paired with the key code that produced it. Travels with
/// the content-change event the key causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedKey {
    pub classification: KeyClassification,
    pub key_code: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyContext {
    /// The formula suggestion list is open with a highlighted candidate.
    pub candidate_active: bool,
    /// Enter confirms and moves down; otherwise Enter is left alone.
    pub enter_commits: bool,
    /// Cmd counts as Ctrl (paste exception, modifier exclusion).
    pub platform_is_control: bool,
}

impl Default for ClassifyContext {
    fn default() -> Self {
        Self { candidate_active: false, enter_commits: true, platform_is_control: true }
    }
}

pub fn classify(event: &KeyEvent, ctx: &ClassifyContext) -> KeyClassification {
    match event.named() {
        Some(NamedKey::Escape) => KeyClassification::Cancel,
        Some(NamedKey::Enter) => {
            if ctx.candidate_active {
                KeyClassification::AutocompleteCandidateKey
            } else if ctx.enter_commits {
                KeyClassification::ConfirmAndMoveDown
            } else {
                KeyClassification::Ignored
            }
        }
        Some(NamedKey::Tab) => {
            if ctx.candidate_active {
                KeyClassification::AutocompleteCandidateKey
            } else {
                KeyClassification::ConfirmAndMoveRight
            }
        }
        // Reference-lock toggling belongs to the formula subsystem
        Some(NamedKey::F4) => KeyClassification::Ignored,
        Some(NamedKey::Arrow(direction)) => KeyClassification::NavigateDirection {
            direction,
            extend: event.modifiers.shift,
        },
        None if is_content_key(event, ctx.platform_is_control) => KeyClassification::ContentKey,
        None => KeyClassification::Ignored,
    }
}

/// True if the key should mutate the buffer and re-run formula analysis.
///
/// Printable keys qualify unless Ctrl/Alt is held; function keys, the
/// control block (codes up to Delete), NumLock, the numpad separator and
/// OS/menu keys do not. Backspace, Space, Delete and paste always qualify.
pub fn is_content_key(event: &KeyEvent, platform_is_control: bool) -> bool {
    let code = event.key_code;
    if code == 0 {
        return false;
    }

    let m = &event.modifiers;
    let control = m.control || (platform_is_control && m.platform);

    if matches!(code, keycode::BACKSPACE | keycode::SPACE | keycode::DELETE) {
        return true;
    }
    if control && code == keycode::V {
        return true;
    }

    let excluded = (keycode::F1..=keycode::F12).contains(&code)
        || code <= keycode::DELETE
        || code == keycode::NUM_LOCK
        || code == keycode::NUMPAD_SEPARATOR
        || matches!(code, keycode::OS_LEFT | keycode::OS_RIGHT | keycode::MENU)
        || control
        || m.alt
        || (m.shift && keycode::is_arrow(code));

    !excluded
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx() -> ClassifyContext {
        ClassifyContext::default()
    }

    #[test]
    fn test_escape_cancels() {
        assert_eq!(classify(&KeyEvent::escape(), &ctx()), KeyClassification::Cancel);
        assert_eq!(classify(&KeyEvent::new("escape", 27), &ctx()), KeyClassification::Cancel);
    }

    #[test]
    fn test_tab_yields_to_candidate() {
        assert_eq!(classify(&KeyEvent::tab(), &ctx()), KeyClassification::ConfirmAndMoveRight);
        let with_candidate = ClassifyContext { candidate_active: true, ..ctx() };
        assert_eq!(classify(&KeyEvent::tab(), &with_candidate), KeyClassification::AutocompleteCandidateKey);
    }

    #[test]
    fn test_enter_commits_unless_disabled() {
        assert_eq!(classify(&KeyEvent::enter(), &ctx()), KeyClassification::ConfirmAndMoveDown);
        let off = ClassifyContext { enter_commits: false, ..ctx() };
        assert_eq!(classify(&KeyEvent::enter(), &off), KeyClassification::Ignored);
        let claimed = ClassifyContext { candidate_active: true, ..off };
        assert_eq!(classify(&KeyEvent::enter(), &claimed), KeyClassification::AutocompleteCandidateKey);
    }

    #[test]
    fn test_f4_is_ignored() {
        assert_eq!(classify(&KeyEvent::f4(), &ctx()), KeyClassification::Ignored);
    }

    #[test]
    fn test_arrows_navigate_with_extend_from_shift() {
        assert_eq!(
            classify(&KeyEvent::arrow(Direction::Left), &ctx()),
            KeyClassification::NavigateDirection { direction: Direction::Left, extend: false }
        );
        assert_eq!(
            classify(&KeyEvent::new("up", keycode::UP).shift(), &ctx()),
            KeyClassification::NavigateDirection { direction: Direction::Up, extend: true }
        );
    }

    #[test]
    fn test_printable_keys_are_content() {
        for ch in ['7', 'a', 'Z', '=', '(', '+', 'é'] {
            assert_eq!(
                classify(&KeyEvent::from_char(ch), &ctx()),
                KeyClassification::ContentKey,
                "{ch:?}"
            );
        }
    }

    #[test]
    fn test_always_content_exceptions() {
        for event in [KeyEvent::backspace(), KeyEvent::delete(), KeyEvent::from_char(' '), KeyEvent::paste()] {
            assert_eq!(classify(&event, &ctx()), KeyClassification::ContentKey, "{event:?}");
        }
    }

    #[test]
    fn test_paste_with_cmd_depends_on_modifier_style() {
        let cmd_v = KeyEvent::new("v", keycode::V).with_modifiers(Modifiers { platform: true, ..Default::default() });
        assert_eq!(classify(&cmd_v, &ctx()), KeyClassification::ContentKey);
        let ctrl_only = ClassifyContext { platform_is_control: false, ..ctx() };
        // Plain printable code with an unrelated modifier: still content
        assert_eq!(classify(&cmd_v, &ctrl_only), KeyClassification::ContentKey);
        let cmd_c = KeyEvent::new("c", 67).with_modifiers(Modifiers { platform: true, ..Default::default() });
        assert_eq!(classify(&cmd_c, &ctx()), KeyClassification::Ignored);
    }

    #[test]
    fn test_modifier_chords_are_not_content() {
        assert_eq!(classify(&KeyEvent::new("b", 66).ctrl(), &ctx()), KeyClassification::Ignored);
        let alt_x = KeyEvent::new("x", 88).with_modifiers(Modifiers { alt: true, ..Default::default() });
        assert_eq!(classify(&alt_x, &ctx()), KeyClassification::Ignored);
    }

    #[test]
    fn test_non_printable_codes_are_ignored() {
        for (key, code) in [
            ("Shift", keycode::SHIFT),
            ("Control", keycode::CONTROL),
            ("Alt", keycode::ALT),
            ("Home", 36),
            ("F1", keycode::F1),
            ("F12", keycode::F12),
            ("NumLock", keycode::NUM_LOCK),
            ("Separator", keycode::NUMPAD_SEPARATOR),
            ("Meta", keycode::OS_LEFT),
            ("ContextMenu", keycode::MENU),
            ("Unidentified", 0),
        ] {
            assert_eq!(classify(&KeyEvent::new(key, code), &ctx()), KeyClassification::Ignored, "{key}");
        }
    }

    #[test]
    fn test_shift_arrow_code_is_not_content() {
        // Arrow codes only reach the content rule under an unknown key name
        let event = KeyEvent::new("Unknown", keycode::LEFT).shift();
        assert!(!is_content_key(&event, true));
    }

    #[test]
    fn test_key_event_json() {
        let event: KeyEvent = serde_json::from_str(r#"{"key": "v", "key_code": 86, "control": true}"#).unwrap();
        assert_eq!(event, KeyEvent::paste());
    }

    proptest! {
        #[test]
        fn prop_classification_is_stateless(
            code in 0u32..256,
            control: bool,
            alt: bool,
            shift: bool,
            candidate: bool,
        ) {
            let event = KeyEvent::new("k", code)
                .with_modifiers(Modifiers { control, alt, shift, platform: false });
            let ctx = ClassifyContext { candidate_active: candidate, ..ClassifyContext::default() };
            prop_assert_eq!(classify(&event, &ctx), classify(&event, &ctx));
        }

        #[test]
        fn prop_function_keys_never_content(code in keycode::F1..=keycode::F12, shift: bool) {
            let event = KeyEvent::new("F", code).with_modifiers(Modifiers { shift, ..Default::default() });
            prop_assert!(!is_content_key(&event, true));
        }
    }
}
