use super::theme::{BLUE, DIM};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// 单行查询输入框，支持 UTF-8
#[derive(Debug, Clone, Default)]
pub struct InputBox {
    content: String,
    /// 光标位置（按字符计数，非字节）
    cursor: usize,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = self.char_to_byte_pos(self.cursor);
        self.content.insert(byte_pos, c);
        self.cursor += 1;
    }

    /// Backspace
    pub fn delete_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let start = self.char_to_byte_pos(self.cursor);
        let end = self.char_to_byte_pos(self.cursor + 1);
        self.content.drain(start..end);
        true
    }

    /// Delete
    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.content.chars().count() {
            return false;
        }
        let start = self.char_to_byte_pos(self.cursor);
        let end = self.char_to_byte_pos(self.cursor + 1);
        self.content.drain(start..end);
        true
    }

    /// Ctrl+W，删除光标前的一个词
    pub fn delete_word(&mut self) -> bool {
        let before: Vec<char> = self.content.chars().take(self.cursor).collect();
        let mut start = before.len();
        while start > 0 && before[start - 1] == ' ' {
            start -= 1;
        }
        while start > 0 && before[start - 1] != ' ' {
            start -= 1;
        }
        if start == self.cursor {
            return false;
        }
        let from = self.char_to_byte_pos(start);
        let to = self.char_to_byte_pos(self.cursor);
        self.content.drain(from..to);
        self.cursor = start;
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.content.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.chars().count();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor_pos(&self) -> usize {
        self.cursor
    }

    fn char_to_byte_pos(&self, char_pos: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }
}

pub fn render_input_box(f: &mut Frame, input: &InputBox, label: &str, busy: bool, area: Rect) {
    let border_color = if busy { Color::Yellow } else { DIM };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let chars: Vec<char> = input.content().chars().collect();
    let cursor_pos = input.cursor_pos().min(chars.len());
    let before: String = chars[..cursor_pos].iter().collect();
    let (cursor_char, after) = match chars.get(cursor_pos) {
        Some(c) => (c.to_string(), chars[cursor_pos + 1..].iter().collect()),
        None => (" ".to_string(), String::new()),
    };

    let line = Line::from(vec![
        Span::styled(
            format!("{label} "),
            Style::default().fg(BLUE).add_modifier(Modifier::BOLD),
        ),
        Span::styled(before, Style::default().fg(Color::White)),
        Span::styled(cursor_char, Style::default().fg(Color::Black).bg(Color::White)),
        Span::styled(after, Style::default().fg(Color::White)),
    ]);

    f.render_widget(Paragraph::new(line).block(block), area);
}
