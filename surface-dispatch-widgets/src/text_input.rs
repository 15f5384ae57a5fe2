//! Single-line text entry for `TextField`

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::component::Component;
use crate::event::EventKind;

/// What a keystroke did to the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    /// The value is now this.
    Changed(String),
    /// Enter was pressed on this value.
    Submitted(String),
}

pub struct TextInputProps<'a> {
    /// Current value, as read from the data model
    pub value: &'a str,
    /// Border title
    pub label: &'a str,
    /// Shown dimmed while `value` is empty
    pub placeholder: &'a str,
    pub is_focused: bool,
}

/// Cursor state for one text field. The text itself lives in the data
/// model; every edit is reported as the full new value.
#[derive(Debug, Default, Clone)]
pub struct TextInput {
    /// Byte offset, always on a char boundary of the last seen value
    cursor: usize,
}

fn prev_boundary(value: &str, from: usize) -> usize {
    value[..from]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_boundary(value: &str, from: usize) -> usize {
    value[from..]
        .chars()
        .next()
        .map(|c| from + c.len_utf8())
        .unwrap_or(from)
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Keep the cursor valid after the value changed underneath us.
    fn sync(&mut self, value: &str) {
        self.cursor = self.cursor.min(value.len());
        while !value.is_char_boundary(self.cursor) {
            self.cursor -= 1;
        }
    }

    fn insert(&mut self, value: &str, c: char) -> String {
        let mut next = String::with_capacity(value.len() + c.len_utf8());
        next.push_str(&value[..self.cursor]);
        next.push(c);
        next.push_str(&value[self.cursor..]);
        self.cursor += c.len_utf8();
        next
    }

    fn backspace(&mut self, value: &str) -> Option<String> {
        if self.cursor == 0 {
            return None;
        }
        let start = prev_boundary(value, self.cursor);
        let next = format!("{}{}", &value[..start], &value[self.cursor..]);
        self.cursor = start;
        Some(next)
    }

    fn delete(&self, value: &str) -> Option<String> {
        let end = next_boundary(value, self.cursor);
        (end > self.cursor).then(|| format!("{}{}", &value[..self.cursor], &value[end..]))
    }
}

impl Component<TextEdit> for TextInput {
    type Props<'a> = TextInputProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = TextEdit> {
        let EventKind::Key(key) = event else {
            return None;
        };
        if !props.is_focused {
            return None;
        }
        let value = props.value;
        self.sync(value);

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('a') => {
                    self.cursor = 0;
                    None
                }
                KeyCode::Char('e') => {
                    self.cursor = value.len();
                    None
                }
                KeyCode::Char('u') => {
                    self.cursor = 0;
                    (!value.is_empty()).then(|| TextEdit::Changed(String::new()))
                }
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char(c) => Some(TextEdit::Changed(self.insert(value, c))),
            KeyCode::Backspace => self.backspace(value).map(TextEdit::Changed),
            KeyCode::Delete => self.delete(value).map(TextEdit::Changed),
            KeyCode::Left => {
                self.cursor = prev_boundary(value, self.cursor);
                None
            }
            KeyCode::Right => {
                self.cursor = next_boundary(value, self.cursor);
                None
            }
            KeyCode::Home => {
                self.cursor = 0;
                None
            }
            KeyCode::End => {
                self.cursor = value.len();
                None
            }
            KeyCode::Enter => Some(TextEdit::Submitted(value.to_string())),
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        self.sync(props.value);

        let (text, style) = if props.value.is_empty() {
            (props.placeholder, Style::default().fg(Color::DarkGray))
        } else {
            (props.value, Style::default())
        };
        let border = if props.is_focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(props.label);
        frame.render_widget(Paragraph::new(text).style(style).block(block), area);

        if props.is_focused && area.height >= 3 {
            let column = props.value[..self.cursor].chars().count() as u16;
            let x = area.x + 1 + column;
            if x < area.right().saturating_sub(1) {
                frame.set_cursor_position((x, area.y + 1));
            }
        }
    }
}
