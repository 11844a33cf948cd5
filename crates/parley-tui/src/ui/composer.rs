use unicode_width::UnicodeWidthStr;

/// Single-line message input.
///
/// Ctrl+A / Ctrl+E jump to the ends of the line, Ctrl+U kills to the start.
/// Pasted newlines are flattened to spaces.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    text: String,
    /// Byte offset, always on a char boundary
    cursor: usize,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Slash commands never produce typing notifications.
    pub fn is_command(&self) -> bool {
        self.text.starts_with('/')
    }

    /// Cursor column in terminal cells.
    pub fn cursor_column(&self) -> usize {
        self.text[..self.cursor].width()
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn handle_paste(&mut self, pasted: &str) {
        let flat: String = pasted
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        self.text.insert_str(self.cursor, &flat);
        self.cursor += flat.len();
    }

    pub fn delete_char_before(&mut self) {
        if let Some((prev, _)) = self.text[..self.cursor].char_indices().last() {
            self.text.remove(prev);
            self.cursor = prev;
        }
    }

    pub fn delete_char_at(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        if let Some((prev, _)) = self.text[..self.cursor].char_indices().last() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn move_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn kill_to_start(&mut self) {
        self.text.drain(..self.cursor);
        self.cursor = 0;
    }

    /// Returns the trimmed input and clears the line. `None` when blank.
    pub fn take(&mut self) -> Option<String> {
        let text = std::mem::take(&mut self.text);
        self.cursor = 0;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
