/// Single-line draft buffer behind the task input. The cursor counts chars,
/// not bytes.
#[derive(Debug, Clone, Default)]
pub struct InputField {
    content: String,
    cursor: usize,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.content.len())
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let offset = self.byte_offset(self.cursor);
        self.content.insert(offset, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let offset = self.byte_offset(self.cursor - 1);
        self.content.remove(offset);
        self.cursor -= 1;
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.char_len() {
            let offset = self.byte_offset(self.cursor);
            self.content.remove(offset);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn move_to_start_of_line(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end_of_line(&mut self) {
        self.cursor = self.char_len();
    }

    /// Empties the buffer and hands back what it held.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputField {
        let mut field = InputField::new();
        text.chars().for_each(|c| field.insert_char(c));
        field
    }

    #[test]
    fn insert_at_cursor() {
        let mut field = typed("ac");
        field.move_cursor_left();
        field.insert_char('b');
        assert_eq!(field.value(), "abc");
        assert_eq!(field.cursor(), 2);
    }

    #[test]
    fn backspace_at_start_does_nothing() {
        let mut field = typed("ab");
        field.move_to_start_of_line();
        field.delete_char();
        assert_eq!(field.value(), "ab");
        field.move_to_end_of_line();
        field.delete_char();
        assert_eq!(field.value(), "a");
    }

    #[test]
    fn handles_multibyte_chars() {
        let mut field = typed("café");
        field.move_cursor_left();
        field.delete_forward();
        field.insert_char('e');
        assert_eq!(field.value(), "cafe");
        field.delete_char();
        assert_eq!(field.value(), "caf");
    }

    #[test]
    fn take_clears_buffer() {
        let mut field = typed("milk");
        assert_eq!(field.take(), "milk");
        assert!(field.is_empty());
        assert_eq!(field.cursor(), 0);
    }
}
