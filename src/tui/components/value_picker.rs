//! Multi-select overlay listing the legal values of one attribute.

use crate::tui::{Action, Component, Theme};
use color_eyre::Result;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use std::collections::BTreeSet;

pub struct ValuePicker {
    row: usize,
    attribute: String,
    values: Vec<String>,
    selected: BTreeSet<String>,
    cursor: usize,
    scroll: usize,
    toggled: Option<String>,
    theme: Theme,
}

impl ValuePicker {
    pub fn new(
        row: usize,
        attribute: impl Into<String>,
        values: Vec<String>,
        selected: BTreeSet<String>,
        theme: Theme,
    ) -> Self {
        Self {
            row,
            attribute: attribute.into(),
            values,
            selected,
            cursor: 0,
            scroll: 0,
            toggled: None,
            theme,
        }
    }

    /// Selection row the picker edits
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn current_value(&self) -> Option<&str> {
        self.values.get(self.cursor).map(String::as_str)
    }

    /// Value the user asked to toggle since the last call
    pub fn take_toggled(&mut self) -> Option<String> {
        self.toggled.take()
    }

    pub fn set_selected(&mut self, selected: BTreeSet<String>) {
        self.selected = selected;
    }

    fn keep_cursor_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + height {
            self.scroll = self.cursor + 1 - height;
        }
    }
}

impl Component for ValuePicker {
    /// `Ok(false)` closes the picker
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        let last = self.values.len().saturating_sub(1);
        match action {
            Action::Confirm | Action::Cancel => return Ok(false),
            Action::MoveUp => self.cursor = self.cursor.saturating_sub(1),
            Action::MoveDown => self.cursor = (self.cursor + 1).min(last),
            Action::GoToTop => self.cursor = 0,
            Action::GoToBottom => self.cursor = last,
            Action::ToggleValue => self.toggled = self.current_value().map(str::to_string),
            _ => {}
        }
        Ok(true)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(8).clamp(20, 50).min(area.width);
        let height = (self.values.len() as u16 + 3).clamp(5, area.height.saturating_sub(2).max(5)).min(area.height);
        let modal = Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        };
        frame.render_widget(Clear, modal);

        let block = Block::default()
            .title(format!("{} ({} selected)", self.attribute, self.selected.len()))
            .title_bottom(Line::from("Space toggle, Enter/Esc done").right_aligned())
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(self.theme.focused_border_style())
            .style(self.theme.normal_style());
        let inner = block.inner(modal);
        frame.render_widget(block, modal);

        let visible = inner.height as usize;
        self.keep_cursor_visible(visible);
        let lines: Vec<Line> = self
            .values
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(visible)
            .map(|(i, value)| {
                let checked = self.selected.contains(value);
                let mark = if checked { "[✓] " } else { "[ ] " };
                let style = if i == self.cursor {
                    self.theme.cursor_style()
                } else if checked {
                    self.theme.checked_style()
                } else {
                    self.theme.normal_style()
                };
                Line::from(vec![Span::styled(mark, style), Span::styled(value.clone(), style)])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::ToggleValue,
            Action::Confirm,
            Action::Cancel,
        ]
    }

    fn name(&self) -> &str {
        "ValuePicker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn picker() -> ValuePicker {
        ValuePicker::new(
            2,
            "chrom",
            vec!["chr1".into(), "chr2".into(), "chrX".into()],
            BTreeSet::new(),
            Theme::default(),
        )
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut p = picker();
        p.handle_action(Action::MoveUp).unwrap();
        assert_eq!(p.current_value(), Some("chr1"));
        for _ in 0..5 {
            p.handle_action(Action::MoveDown).unwrap();
        }
        assert_eq!(p.current_value(), Some("chrX"));
    }

    #[test]
    fn test_toggle_is_reported_once() {
        let mut p = picker();
        p.handle_action(Action::MoveDown).unwrap();
        p.handle_action(Action::ToggleValue).unwrap();
        assert_eq!(p.take_toggled(), Some("chr2".to_string()));
        assert_eq!(p.take_toggled(), None);
        assert_eq!(p.row(), 2);
    }

    #[test]
    fn test_close() {
        let mut p = picker();
        assert!(!p.handle_action(Action::Confirm).unwrap());
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let mut p = picker();
        p.cursor = 2;
        p.keep_cursor_visible(2);
        assert_eq!(p.scroll, 1);
        p.cursor = 0;
        p.keep_cursor_visible(2);
        assert_eq!(p.scroll, 0);
    }
}
