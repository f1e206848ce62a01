//! Drawing and editing one [`Panel`].
//!
//! [`panel_fields`] and [`panel_lines`] are pure functions of the panel, so
//! the rows on screen are always exactly the panel's rows. [`PanelEditor`]
//! adds a field cursor and the value picker on top.

use crate::core::panel::{LiveCount, Panel, PanelChange};
use crate::core::types::Relation;
use crate::tui::components::value_picker::ValuePicker;
use crate::tui::{Action, Component, Focusable, TextEdit, Theme};
use color_eyre::Result;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::warn;

/// One focusable field of a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelField {
    Attribute(usize),
    Relation(usize),
    Distance(usize),
    Reference(usize),
    Reduction,
}

/// Focusable fields in display order; distance and reference only exist
/// once the row has a relation
pub fn panel_fields(panel: &Panel) -> Vec<PanelField> {
    let mut fields: Vec<PanelField> = (0..panel.selection_rows().len())
        .map(PanelField::Attribute)
        .collect();
    for (i, row) in panel.filter_rows().iter().enumerate() {
        fields.push(PanelField::Relation(i));
        if row.relation.is_set() {
            fields.push(PanelField::Distance(i));
            fields.push(PanelField::Reference(i));
        }
    }
    fields.push(PanelField::Reduction);
    fields
}

pub fn count_label(count: &LiveCount) -> String {
    match (count.value(), count.is_pending()) {
        (Some(n), false) => format!("{n} datasets selected"),
        (Some(n), true) => format!("{n} datasets selected (updating)"),
        (None, true) => "counting...".to_string(),
        (None, false) => "count unavailable".to_string(),
    }
}

fn chip(text: String, focused: bool, theme: &Theme) -> Span<'static> {
    let style = if focused { theme.cursor_style() } else { theme.normal_style() };
    Span::styled(format!("[{text}]"), style)
}

/// Text lines for `panel`, highlighting `cursor`
pub fn panel_lines(panel: &Panel, cursor: Option<PanelField>, theme: &Theme) -> Vec<Line<'static>> {
    let at = |field: PanelField| cursor == Some(field);
    let mut lines = vec![Line::from(Span::styled("Datasets where", theme.title_style()))];

    for (i, row) in panel.selection_rows().iter().enumerate() {
        let attribute = row.attribute.clone().unwrap_or_else(|| "(attribute)".to_string());
        let mut spans = vec![Span::raw("  "), chip(attribute, at(PanelField::Attribute(i)), theme)];
        if row.attribute.is_some() {
            spans.push(Span::raw(" is "));
            if row.selected.is_empty() {
                spans.push(Span::styled("(any value, Enter to pick)", theme.muted_style()));
            } else {
                let values: Vec<&str> = row.selected.iter().map(String::as_str).collect();
                spans.push(Span::styled(values.join(", "), theme.checked_style()));
            }
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(Span::styled("Keep regions that", theme.title_style())));
    for (i, row) in panel.filter_rows().iter().enumerate() {
        let mut spans = vec![
            Span::raw("  "),
            chip(row.relation.label().to_string(), at(PanelField::Relation(i)), theme),
        ];
        if row.relation.is_set() {
            let distance = row.distance.clone().unwrap_or_default();
            spans.push(Span::raw(" "));
            spans.push(chip(format!("{distance:>5}"), at(PanelField::Distance(i)), theme));
            spans.push(Span::raw(" bp of "));
            let reference = row.reference.clone().unwrap_or_else(|| "(no annotation)".to_string());
            spans.push(chip(reference, at(PanelField::Reference(i)), theme));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(vec![
        Span::styled("Combine datasets by ", theme.title_style()),
        chip(panel.reduction().label().to_string(), at(PanelField::Reduction), theme),
    ]));
    lines.push(Line::from(Span::styled(
        count_label(panel.live_count()),
        theme.info_style(),
    )));
    lines
}

/// Field cursor and value picker over one panel
pub struct PanelEditor {
    panel: Panel,
    cursor: usize,
    focused: bool,
    picker: Option<ValuePicker>,
    count_dirty: bool,
    theme: Theme,
}

impl PanelEditor {
    pub fn new(panel: Panel, theme: Theme) -> Self {
        Self {
            panel,
            cursor: 0,
            focused: false,
            picker: None,
            // Initial count
            count_dirty: true,
            theme,
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut Panel {
        &mut self.panel
    }

    pub fn current_field(&self) -> Option<PanelField> {
        panel_fields(&self.panel).get(self.cursor).copied()
    }

    pub fn focus_first(&mut self) {
        self.cursor = 0;
    }

    pub fn focus_last(&mut self) {
        self.cursor = panel_fields(&self.panel).len().saturating_sub(1);
    }

    pub fn has_picker(&self) -> bool {
        self.picker.is_some()
    }

    pub fn mark_count_dirty(&mut self) {
        self.count_dirty = true;
    }

    /// True once per selection change since the last call
    pub fn take_count_dirty(&mut self) -> bool {
        std::mem::take(&mut self.count_dirty)
    }

    /// Rows needed to draw the panel, borders included
    pub fn height(&self) -> u16 {
        panel_lines(&self.panel, None, &self.theme).len() as u16 + 2
    }

    fn apply(&mut self, result: std::result::Result<PanelChange, crate::core::error::ModelError>) {
        match result {
            Ok(change) => {
                if change.refresh_count {
                    self.count_dirty = true;
                }
            }
            Err(e) => warn!(panel = %self.panel.role(), "Edit rejected: {}", e),
        }
    }

    /// Keep the cursor on the same field after the field list changed
    fn restore_cursor(&mut self, field: Option<PanelField>) {
        let fields = panel_fields(&self.panel);
        self.cursor = field
            .and_then(|f| fields.iter().position(|x| *x == f))
            .unwrap_or(self.cursor)
            .min(fields.len().saturating_sub(1));
    }

    fn cycle(&mut self, field: PanelField, forward: bool) {
        match field {
            PanelField::Attribute(i) => {
                let result = self.panel.cycle_attribute(i, forward);
                self.apply(result);
            }
            PanelField::Relation(i) => {
                let result = self.panel.cycle_relation(i, forward);
                self.apply(result);
            }
            PanelField::Reference(i) => {
                let result = self.panel.cycle_reference(i, forward);
                self.apply(result);
            }
            PanelField::Reduction => self.panel.cycle_reduction(forward),
            PanelField::Distance(_) => {}
        }
    }

    fn clear(&mut self, field: PanelField) {
        let result = match field {
            PanelField::Attribute(i) => self.panel.set_attribute(i, None),
            PanelField::Relation(i) | PanelField::Reference(i) => {
                self.panel.set_relation(i, Relation::NoFilter)
            }
            PanelField::Distance(i) => self.panel.set_distance(i, None),
            PanelField::Reduction => return,
        };
        self.apply(result);
    }

    fn open_picker(&mut self, row: usize) -> bool {
        let Some(selection) = self.panel.selection_rows().get(row) else {
            return false;
        };
        let Some(attribute) = selection.attribute.clone() else {
            return false;
        };
        let values = self.panel.context().catalog.values(&attribute).to_vec();
        self.picker = Some(ValuePicker::new(
            row,
            attribute,
            values,
            selection.selected.clone(),
            self.theme.clone(),
        ));
        true
    }

    fn route_to_picker(&mut self, action: Action) -> Result<()> {
        let Some(picker) = self.picker.as_mut() else {
            return Ok(());
        };
        if !picker.handle_action(action)? {
            self.picker = None;
            return Ok(());
        }
        let row = picker.row();
        if let Some(value) = picker.take_toggled() {
            let result = self.panel.toggle_value(row, &value);
            self.apply(result);
            if let (Some(picker), Some(selection)) =
                (self.picker.as_mut(), self.panel.selection_rows().get(row))
            {
                picker.set_selected(selection.selected.clone());
            }
        }
        Ok(())
    }
}

impl Component for PanelEditor {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        if self.picker.is_some() {
            self.route_to_picker(action)?;
            return Ok(true);
        }

        let fields = panel_fields(&self.panel);
        let Some(field) = fields.get(self.cursor).copied() else {
            return Ok(false);
        };

        match action {
            Action::MoveUp if self.cursor > 0 => self.cursor -= 1,
            Action::MoveDown if self.cursor + 1 < fields.len() => self.cursor += 1,
            Action::GoToTop => self.cursor = 0,
            Action::GoToBottom => self.cursor = fields.len() - 1,
            Action::MoveLeft | Action::MoveRight => {
                self.cycle(field, action == Action::MoveRight);
                self.restore_cursor(Some(field));
            }
            Action::ClearField => {
                self.clear(field);
                self.restore_cursor(Some(field));
            }
            Action::Confirm | Action::ToggleValue => match field {
                PanelField::Attribute(row) => {
                    if !self.open_picker(row) {
                        return Ok(false);
                    }
                }
                _ => return Ok(false),
            },
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let cursor = if self.focused { self.current_field() } else { None };
        let border = if self.focused {
            self.theme.focused_border_style()
        } else {
            self.theme.border_style()
        };
        let block = Block::default()
            .title(self.panel.role().title())
            .borders(Borders::ALL)
            .border_style(border);
        let lines = panel_lines(&self.panel, cursor, &self.theme);
        frame.render_widget(Paragraph::new(lines).block(block).style(Style::default()), area);

        if let Some(picker) = self.picker.as_mut() {
            let screen = frame.area();
            picker.render(frame, screen);
        }
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::MoveLeft,
            Action::MoveRight,
            Action::ClearField,
            Action::Confirm,
        ]
    }

    fn name(&self) -> &str {
        "PanelEditor"
    }

    fn edit_text(&mut self, edit: TextEdit) -> bool {
        if self.picker.is_some() {
            return false;
        }
        let Some(PanelField::Distance(i)) = self.current_field() else {
            return false;
        };
        let mut distance = self
            .panel
            .filter_rows()
            .get(i)
            .and_then(|r| r.distance.clone())
            .unwrap_or_default();
        match edit {
            TextEdit::Insert(c) if c.is_ascii_alphanumeric() || ".-_".contains(c) => distance.push(c),
            TextEdit::Insert(_) => return false,
            TextEdit::Backspace => {
                distance.pop();
            }
            TextEdit::Delete => distance.clear(),
        }
        let result = self.panel.set_distance(i, Some(distance));
        self.apply(result);
        true
    }
}

impl Focusable for PanelEditor {
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
    use crate::core::catalog::{AnnotationRegistry, AppContext, AttributeCatalog};
    use crate::core::types::PanelRole;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn editor() -> PanelEditor {
        let mut entries = BTreeMap::new();
        entries.insert("chrom".to_string(), vec!["chr1".to_string(), "chr2".to_string()]);
        entries.insert("type".to_string(), vec!["regions".to_string()]);
        let ctx = AppContext::new(
            AttributeCatalog::new(entries),
            AnnotationRegistry::new(vec!["genes".into(), "enhancers".into()]),
        );
        PanelEditor::new(Panel::new(PanelRole::Summary, ctx), Theme::default())
    }

    fn text(lines: &[Line]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_fields_follow_rows() {
        let mut ed = editor();
        assert_eq!(
            panel_fields(ed.panel()),
            vec![PanelField::Attribute(0), PanelField::Relation(0), PanelField::Reduction]
        );
        ed.panel_mut().set_relation(0, Relation::Within).unwrap();
        assert_eq!(
            panel_fields(ed.panel()),
            vec![
                PanelField::Attribute(0),
                PanelField::Relation(0),
                PanelField::Distance(0),
                PanelField::Reference(0),
                PanelField::Relation(1),
                PanelField::Reduction,
            ]
        );
    }

    #[test]
    fn test_projection_matches_rows() {
        let mut ed = editor();
        ed.panel_mut().set_attribute(0, Some("chrom")).unwrap();
        ed.panel_mut().toggle_value(0, "chr2").unwrap();
        let lines = text(&panel_lines(ed.panel(), None, &Theme::default()));
        assert_eq!(lines[1], "  [chrom] is chr2");
        assert_eq!(lines[2], "  [(attribute)]");
        assert_eq!(lines[4], "  [(No filter)]");
        assert_eq!(lines[5], "Combine datasets by [Intersection]");
    }

    #[test]
    fn test_cycling_attribute_adds_row_and_marks_count() {
        let mut ed = editor();
        ed.take_count_dirty();
        assert!(ed.handle_action(Action::MoveRight).unwrap());
        assert_eq!(ed.panel().selection_rows().len(), 2);
        assert_eq!(ed.current_field(), Some(PanelField::Attribute(0)));
        assert!(ed.take_count_dirty());
        assert!(!ed.take_count_dirty());
    }

    #[test]
    fn test_cursor_edges_propagate() {
        let mut ed = editor();
        assert!(!ed.handle_action(Action::MoveUp).unwrap());
        ed.focus_last();
        assert_eq!(ed.current_field(), Some(PanelField::Reduction));
        assert!(!ed.handle_action(Action::MoveDown).unwrap());
    }

    #[test]
    fn test_picker_toggles_values() {
        let mut ed = editor();
        ed.handle_action(Action::MoveRight).unwrap(); // chrom
        ed.take_count_dirty();
        assert!(ed.handle_action(Action::Confirm).unwrap());
        assert!(ed.has_picker());
        ed.handle_action(Action::MoveDown).unwrap();
        ed.handle_action(Action::ToggleValue).unwrap();
        ed.handle_action(Action::Cancel).unwrap();
        assert!(!ed.has_picker());
        let selected: Vec<&String> = ed.panel().selection_rows()[0].selected.iter().collect();
        assert_eq!(selected, vec!["chr2"]);
        assert!(ed.take_count_dirty());
    }

    #[test]
    fn test_confirm_on_blank_attribute_propagates() {
        let mut ed = editor();
        assert!(!ed.handle_action(Action::Confirm).unwrap());
        assert!(!ed.has_picker());
    }

    #[test]
    fn test_distance_typing() {
        let mut ed = editor();
        ed.handle_action(Action::MoveDown).unwrap(); // relation 0
        ed.handle_action(Action::MoveRight).unwrap(); // within
        ed.handle_action(Action::MoveDown).unwrap(); // distance 0
        assert_eq!(ed.current_field(), Some(PanelField::Distance(0)));
        assert!(ed.edit_text(TextEdit::Insert('5')));
        assert!(ed.edit_text(TextEdit::Insert('0')));
        assert!(ed.edit_text(TextEdit::Insert('0')));
        assert!(ed.edit_text(TextEdit::Backspace));
        assert!(!ed.edit_text(TextEdit::Insert(' ')));
        assert_eq!(ed.panel().filter_rows()[0].distance.as_deref(), Some("50"));
        // Filters do not change the count
        ed.take_count_dirty();
        assert!(ed.edit_text(TextEdit::Insert('0')));
        assert!(!ed.take_count_dirty());
    }

    #[test]
    fn test_clear_relation_removes_row() {
        let mut ed = editor();
        ed.handle_action(Action::MoveDown).unwrap();
        ed.handle_action(Action::MoveRight).unwrap();
        assert_eq!(ed.panel().filter_rows().len(), 2);
        ed.handle_action(Action::ClearField).unwrap();
        assert_eq!(ed.panel().filter_rows().len(), 1);
        assert_eq!(ed.current_field(), Some(PanelField::Relation(0)));
    }

    #[test]
    fn test_count_labels() {
        let mut ed = editor();
        assert_eq!(count_label(ed.panel().live_count()), "count unavailable");
        let generation = ed.panel_mut().begin_count_request();
        assert_eq!(count_label(ed.panel().live_count()), "counting...");
        ed.panel_mut().apply_count(generation, 7);
        assert_eq!(count_label(ed.panel().live_count()), "7 datasets selected");
    }
}
