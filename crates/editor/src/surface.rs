//! The editable surface the buffer is shown in.

use gridedit_core::Direction;

/// Editable text surface. Carets are char indices into the visible text.
pub trait InputSurface {
    fn content(&self) -> String;

    fn set_content(&mut self, content: &str);

    fn caret(&self) -> usize;

    fn set_caret(&mut self, caret: usize);

    /// Length of the rendered text, known only after layout.
    fn text_len(&self) -> usize;

    fn move_caret_to_end(&mut self) {
        let end = self.text_len();
        self.set_caret(end);
    }
}

/// Plain in-memory surface for headless hosts and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySurface {
    content: String,
    caret: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_str(&mut self, text: &str) {
        let at = byte_offset(&self.content, self.caret);
        self.content.insert_str(at, text);
        self.caret += text.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.caret == 0 {
            return;
        }
        let start = byte_offset(&self.content, self.caret - 1);
        let end = byte_offset(&self.content, self.caret);
        self.content.replace_range(start..end, "");
        self.caret -= 1;
    }

    pub fn delete_forward(&mut self) {
        let start = byte_offset(&self.content, self.caret);
        let end = byte_offset(&self.content, self.caret + 1);
        self.content.replace_range(start..end, "");
    }

    /// Single-line caret movement: Up/Down jump to the start/end.
    pub fn move_caret(&mut self, direction: Direction) {
        self.caret = match direction {
            Direction::Left => self.caret.saturating_sub(1),
            Direction::Right => (self.caret + 1).min(self.text_len()),
            Direction::Up => 0,
            Direction::Down => self.text_len(),
        };
    }
}

fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(s.len())
}

impl InputSurface for MemorySurface {
    fn content(&self) -> String {
        self.content.clone()
    }

    // Replacing content resets the caret to the start, like a freshly
    // rendered content-editable element
    fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.caret = 0;
    }

    fn caret(&self) -> usize {
        self.caret
    }

    fn set_caret(&mut self, caret: usize) {
        self.caret = caret.min(self.text_len());
    }

    fn text_len(&self) -> usize {
        self.content.chars().count()
    }
}
