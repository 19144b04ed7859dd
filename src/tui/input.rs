//! Input field handling for the terminal user interface.

/// A single-line text input with a cursor.
///
/// The cursor counts characters, not bytes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
}

impl InputField {
    /// Create a new empty input field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text value.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.value
            .char_indices()
            .nth(cursor)
            .map_or(self.value.len(), |(i, _)| i)
    }

    /// Insert a character at the current cursor position.
    pub fn handle_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Insert a character only if it keeps the value a plain decimal number.
    pub fn handle_numeric_char(&mut self, c: char) {
        if c.is_ascii_digit() || (c == '.' && !self.value.contains('.')) {
            self.handle_char(c);
        }
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor > 0 {
            let at = self.byte_index(self.cursor - 1);
            self.value.remove(at);
            self.cursor -= 1;
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    /// Move cursor one position to the left.
    pub fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Move cursor one position to the right.
    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_multibyte_text() {
        let mut f = InputField::with_value("Blök");
        f.move_cursor_left();
        f.handle_backspace();
        assert_eq!(f.value, "Blk");
        f.handle_char('ö');
        assert_eq!(f.value, "Blök");
        f.handle_delete();
        assert_eq!(f.value, "Blö");
        assert_eq!(f.cursor, 3);
    }

    #[test]
    fn test_numeric_input_allows_one_point() {
        let mut f = InputField::new();
        for c in "4a0.5.x2".chars() {
            f.handle_numeric_char(c);
        }
        assert_eq!(f.value, "40.52");
    }
}
