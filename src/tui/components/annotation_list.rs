//! Checklist of reference annotation datasets for the Annotate tab.

use crate::core::catalog::AnnotationRegistry;
use crate::tui::{Action, Component, Focusable, Theme};
use color_eyre::Result;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::sync::Arc;

pub struct AnnotationList {
    registry: Arc<AnnotationRegistry>,
    checked: Vec<bool>,
    cursor: usize,
    viewport_top: usize,
    focused: bool,
    provenance_request: Option<String>,
    theme: Theme,
}

impl AnnotationList {
    pub fn new(registry: Arc<AnnotationRegistry>, theme: Theme) -> Self {
        let checked = vec![false; registry.len()];
        Self {
            registry,
            checked,
            cursor: 0,
            viewport_top: 0,
            focused: false,
            provenance_request: None,
            theme,
        }
    }

    /// Checked annotation names, in registry order
    pub fn checked_names(&self) -> Vec<String> {
        self.registry
            .iter()
            .zip(&self.checked)
            .filter(|(_, checked)| **checked)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn current(&self) -> Option<&str> {
        self.registry.get(self.cursor).map(String::as_str)
    }

    /// Dataset whose provenance the user asked for
    pub fn take_provenance_request(&mut self) -> Option<String> {
        self.provenance_request.take()
    }

    pub fn focus_first(&mut self) {
        self.cursor = 0;
    }

    pub fn focus_last(&mut self) {
        self.cursor = self.registry.len().saturating_sub(1);
    }

    pub fn height(&self) -> u16 {
        (self.registry.len() as u16).clamp(1, 10) + 2
    }
}

impl Component for AnnotationList {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        let len = self.registry.len();
        match action {
            Action::MoveUp if self.cursor > 0 => self.cursor -= 1,
            Action::MoveDown if self.cursor + 1 < len => self.cursor += 1,
            Action::GoToTop => self.cursor = 0,
            Action::GoToBottom => self.cursor = len.saturating_sub(1),
            Action::ToggleValue | Action::Confirm if len > 0 => {
                if let Some(flag) = self.checked.get_mut(self.cursor) {
                    *flag = !*flag;
                }
            }
            Action::ShowProvenance if len > 0 => {
                self.provenance_request = self.current().map(str::to_string);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border = if self.focused {
            self.theme.focused_border_style()
        } else {
            self.theme.border_style()
        };
        let block = Block::default()
            .title(format!("Annotations ({} checked, i for details)", self.checked_names().len()))
            .borders(Borders::ALL)
            .border_style(border);
        let inner = block.inner(area);

        let visible = inner.height.max(1) as usize;
        if self.cursor < self.viewport_top {
            self.viewport_top = self.cursor;
        } else if self.cursor >= self.viewport_top + visible {
            self.viewport_top = self.cursor + 1 - visible;
        }

        let lines: Vec<Line> = if self.registry.is_empty() {
            vec![Line::from(Span::styled("(no annotation datasets)", self.theme.muted_style()))]
        } else {
            self.registry
                .iter()
                .enumerate()
                .skip(self.viewport_top)
                .take(visible)
                .map(|(i, name)| {
                    let checked = self.checked[i];
                    let style = if self.focused && i == self.cursor {
                        self.theme.cursor_style()
                    } else if checked {
                        self.theme.checked_style()
                    } else {
                        self.theme.normal_style()
                    };
                    let mark = if checked { "[✓] " } else { "[ ] " };
                    Line::from(Span::styled(format!("{mark}{name}"), style))
                })
                .collect()
        };
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::ToggleValue,
            Action::ShowProvenance,
        ]
    }

    fn name(&self) -> &str {
        "AnnotationList"
    }
}

impl Focusable for AnnotationList {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list() -> AnnotationList {
        let registry = AnnotationRegistry::new(vec!["genes".into(), "enhancers".into(), "cpg".into()]);
        AnnotationList::new(Arc::new(registry), Theme::default())
    }

    #[test]
    fn test_checked_names_keep_registry_order() {
        let mut l = list();
        l.handle_action(Action::GoToBottom).unwrap();
        l.handle_action(Action::ToggleValue).unwrap();
        l.handle_action(Action::GoToTop).unwrap();
        l.handle_action(Action::ToggleValue).unwrap();
        assert_eq!(l.checked_names(), vec!["genes".to_string(), "cpg".to_string()]);
        l.handle_action(Action::ToggleValue).unwrap();
        assert_eq!(l.checked_names(), vec!["cpg".to_string()]);
    }

    #[test]
    fn test_edges_propagate() {
        let mut l = list();
        assert!(!l.handle_action(Action::MoveUp).unwrap());
        l.focus_last();
        assert!(!l.handle_action(Action::MoveDown).unwrap());
    }

    #[test]
    fn test_provenance_request() {
        let mut l = list();
        l.handle_action(Action::MoveDown).unwrap();
        l.handle_action(Action::ShowProvenance).unwrap();
        assert_eq!(l.take_provenance_request(), Some("enhancers".to_string()));
        assert_eq!(l.take_provenance_request(), None);
    }

    #[test]
    fn test_empty_registry() {
        let mut l = AnnotationList::new(Arc::new(AnnotationRegistry::default()), Theme::default());
        assert!(!l.handle_action(Action::ToggleValue).unwrap());
        assert!(l.checked_names().is_empty());
    }
}
