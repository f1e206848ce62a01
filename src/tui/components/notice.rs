//! Modal notice shown for every completed request.

use crate::core::catalog::Provenance;
use crate::core::error::QueryError;
use crate::core::response::{JobOutcome, UploadOutcome};
use crate::tui::{Action, Component, Theme};
use color_eyre::Result;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, BorderType, Borders, Clear, Widget},
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    kind: NoticeKind,
    title: String,
    message: String,
    theme: Theme,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            theme: Theme::default(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn kind(&self) -> NoticeKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn from_job(outcome: &JobOutcome) -> Self {
        let kind = match outcome {
            JobOutcome::Success { .. } | JobOutcome::ImagePreview { .. } => NoticeKind::Success,
            JobOutcome::Launched { .. } | JobOutcome::Waiting { .. } => NoticeKind::Info,
            _ => NoticeKind::Error,
        };
        Self::new(kind, outcome.title(), outcome.message())
    }

    pub fn from_upload(outcome: &UploadOutcome) -> Self {
        let kind = match outcome {
            UploadOutcome::Uploaded => NoticeKind::Success,
            _ => NoticeKind::Error,
        };
        Self::new(kind, outcome.title(), outcome.message())
    }

    pub fn from_provenance(provenance: &Provenance) -> Self {
        Self::new(NoticeKind::Info, provenance.name.clone(), provenance.description.clone())
    }

    pub fn from_query_error(error: &QueryError) -> Self {
        Self::new(NoticeKind::Error, "Cannot build query", error.to_string())
    }

    fn border_style(&self) -> Style {
        match self.kind {
            NoticeKind::Info => self.theme.info_style(),
            NoticeKind::Success => self.theme.success_style(),
            NoticeKind::Error => self.theme.error_style(),
        }
    }

    fn modal_area(&self, area: Rect) -> Rect {
        let max_width = area.width.saturating_sub(4).clamp(20, 72);
        let wrap_width = max_width.saturating_sub(4) as usize;
        let wrapped = textwrap::wrap(&self.message, wrap_width);
        let content_lines = wrapped.len() as u16;
        let height = content_lines
            .saturating_add(4) // borders + hint line + padding
            .clamp(5, area.height.saturating_sub(2).max(5));
        let width = max_width.min(area.width);
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        Rect { x, y, width, height: height.min(area.height) }
    }

    pub fn render_to(&self, area: Rect, buf: &mut Buffer) {
        let modal = self.modal_area(area);
        Clear.render(modal, buf);

        let block = Block::default()
            .title(self.title.as_str())
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(self.border_style())
            .style(self.theme.normal_style());
        let inner = block.inner(modal);
        block.render(modal, buf);

        let wrap_width = inner.width.saturating_sub(2) as usize;
        let wrapped = textwrap::wrap(&self.message, wrap_width.max(1));
        let text_rows = inner.height.saturating_sub(1);
        for (i, line) in wrapped.iter().enumerate() {
            if i as u16 >= text_rows {
                break;
            }
            buf.set_string(inner.x + 1, inner.y + i as u16, line, self.theme.normal_style());
        }

        let hint = "Enter/Esc to close";
        let hint_x = inner.x + inner.width.saturating_sub(hint.len() as u16 + 1);
        let hint_y = inner.y + inner.height.saturating_sub(1);
        buf.set_string(hint_x, hint_y, hint, self.theme.muted_style());
    }
}

impl Component for Notice {
    /// `Ok(false)` means the notice was dismissed
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::Confirm | Action::Cancel => Ok(false),
            _ => Ok(true),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.render_to(area, frame.buffer_mut());
    }

    fn supported_actions(&self) -> &[Action] {
        &[Action::Confirm, Action::Cancel]
    }

    fn name(&self) -> &str {
        "Notice"
    }
}
