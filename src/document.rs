use std::ops::Range;

use crate::navigate::{Editor, Pos};

/// A note loaded in memory, with a cursor and a visible line range.
/// Used as the editor of the vault host.
#[derive(Debug, Clone)]
pub struct TextDocument {
    text: String,
    /// Byte offset where each line starts (0-based line numbers).
    line_starts: Vec<usize>,
    cursor: Pos,
    visible: Range<usize>,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = build_line_starts(&text);
        Self {
            text,
            line_starts,
            cursor: Pos::default(),
            visible: 0..0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of line `line` without its newline.
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text.get(start..end).map(|l| l.strip_suffix('\r').unwrap_or(l))
    }

    pub fn cursor(&self) -> Pos {
        self.cursor
    }

    /// Lines currently scrolled into view (end exclusive).
    pub fn visible_lines(&self) -> Range<usize> {
        self.visible.clone()
    }
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl Editor for TextDocument {
    fn offset_to_pos(&self, offset: usize) -> Pos {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        let ch = self.text.get(start..offset).map(|s| s.chars().count()).unwrap_or(0);
        Pos { line, ch }
    }

    fn set_cursor(&mut self, pos: Pos) {
        let last_line = self.line_count().saturating_sub(1);
        self.cursor = Pos { line: pos.line.min(last_line), ch: pos.ch };
    }

    fn scroll_into_view(&mut self, from: Pos, to: Pos) {
        let last_line = self.line_count().saturating_sub(1);
        self.visible = from.line.min(last_line)..to.line.min(last_line) + 1;
    }
}

/// Always contains at least one entry (offset 0), even for an empty text.
fn build_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_pos() {
        let doc = TextDocument::new("first\nsecond line\nthird");
        assert_eq!(doc.offset_to_pos(0), Pos { line: 0, ch: 0 });
        assert_eq!(doc.offset_to_pos(3), Pos { line: 0, ch: 3 });
        assert_eq!(doc.offset_to_pos(6), Pos { line: 1, ch: 0 });
        assert_eq!(doc.offset_to_pos(12), Pos { line: 1, ch: 6 });
        assert_eq!(doc.offset_to_pos(20), Pos { line: 2, ch: 2 });
        assert_eq!(doc.offset_to_pos(999), Pos { line: 2, ch: 5 });
    }

    #[test]
    fn test_offset_on_newline_stays_on_line() {
        let doc = TextDocument::new("ab\ncd");
        assert_eq!(doc.offset_to_pos(2), Pos { line: 0, ch: 2 });
    }

    #[test]
    fn test_columns_count_chars() {
        let doc = TextDocument::new("héllo");
        assert_eq!(doc.offset_to_pos(3), Pos { line: 0, ch: 2 });
    }

    #[test]
    fn test_empty_document() {
        let doc = TextDocument::default();
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.offset_to_pos(5), Pos { line: 0, ch: 0 });
    }

    #[test]
    fn test_lines() {
        let doc = TextDocument::new("a\r\nb\n");
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.line(0), Some("a"));
        assert_eq!(doc.line(1), Some("b"));
        assert_eq!(doc.line(2), Some(""));
        assert_eq!(doc.line(3), None);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut doc = TextDocument::new("1\n2\n3");
        doc.scroll_into_view(Pos { line: 0, ch: 0 }, Pos { line: 12, ch: 0 });
        assert_eq!(doc.visible_lines(), 0..3);
        doc.set_cursor(Pos { line: 40, ch: 0 });
        assert_eq!(doc.cursor(), Pos { line: 2, ch: 0 });
    }
}
