//! One tab of the application: a vertical stack of form sections with a
//! submit button, turning user input into backend requests.

use crate::core::catalog::AppContext;
use crate::core::panel::Panel;
use crate::core::query::{QueryBuilder, QueryString};
use crate::core::types::{PanelRole, ReductionOp, ANNOTATION_OPTIONS, COMPARISON_OPTIONS};
use crate::services::JobKind;
use crate::tui::components::annotation_list::AnnotationList;
use crate::tui::components::notice::Notice;
use crate::tui::components::panel_view::PanelEditor;
use crate::tui::{Action, Component, Focusable, TextEdit, Theme};
use color_eyre::Result;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::{debug, warn};

/// Work the form wants the app to carry out
#[derive(Debug)]
pub enum FormRequest {
    Count {
        role: PanelRole,
        generation: u64,
        query: QueryString,
    },
    Job {
        kind: JobKind,
        query: QueryString,
    },
    Upload {
        url: String,
        query: QueryString,
    },
    Provenance {
        name: String,
        query: QueryString,
    },
    Notice(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Summary,
    Comparison,
    Annotation,
    Upload,
    Result,
}

impl FormKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::Comparison => "Compare",
            Self::Annotation => "Annotate",
            Self::Upload => "Upload",
            Self::Result => "Result",
        }
    }
}

/// Single-line text input
#[derive(Debug, Clone, Default)]
pub struct TextField {
    pub label: &'static str,
    pub value: String,
    cursor: usize,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self { label, value: String::new(), cursor: 0 }
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn edit(&mut self, edit: TextEdit) {
        match edit {
            TextEdit::Insert(c) => {
                let at = self.byte_index();
                self.value.insert(at, c);
                self.cursor += 1;
            }
            TextEdit::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_index();
                self.value.remove(at);
            }
            TextEdit::Delete if self.cursor < self.value.chars().count() => {
                let at = self.byte_index();
                self.value.remove(at);
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, forward: bool) {
        if forward {
            self.cursor = (self.cursor + 1).min(self.value.chars().count());
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }
}

pub enum Section {
    Panel(PanelEditor),
    Combinator {
        label: &'static str,
        options: &'static [ReductionOp],
        value: ReductionOp,
    },
    Annotations(AnnotationList),
    Text(TextField),
    Submit(&'static str),
}

impl Section {
    fn height(&self) -> u16 {
        match self {
            Section::Panel(editor) => editor.height(),
            Section::Annotations(list) => list.height(),
            Section::Text(_) => 3,
            Section::Combinator { .. } | Section::Submit(_) => 1,
        }
    }

    fn set_focused(&mut self, focused: bool, from_below: bool) {
        match self {
            Section::Panel(editor) => {
                editor.set_focused(focused);
                if focused {
                    if from_below { editor.focus_last() } else { editor.focus_first() }
                }
            }
            Section::Annotations(list) => {
                list.set_focused(focused);
                if focused {
                    if from_below { list.focus_last() } else { list.focus_first() }
                }
            }
            _ => {}
        }
    }
}

pub struct QueryForm {
    kind: FormKind,
    sections: Vec<Section>,
    focus: usize,
    builder: QueryBuilder,
    requests: Vec<FormRequest>,
    theme: Theme,
}

impl QueryForm {
    fn new(kind: FormKind, sections: Vec<Section>, builder: QueryBuilder, theme: Theme) -> Self {
        let mut form = Self {
            kind,
            sections,
            focus: 0,
            builder,
            requests: Vec::new(),
            theme,
        };
        if let Some(first) = form.sections.first_mut() {
            first.set_focused(true, false);
        }
        form
    }

    fn panel_section(role: PanelRole, ctx: &AppContext, theme: &Theme) -> Section {
        Section::Panel(PanelEditor::new(Panel::new(role, ctx.clone()), theme.clone()))
    }

    pub fn summary(ctx: &AppContext, builder: QueryBuilder, theme: Theme) -> Self {
        let sections = vec![
            Self::panel_section(PanelRole::Summary, ctx, &theme),
            Section::Submit("Summarize"),
        ];
        Self::new(FormKind::Summary, sections, builder, theme)
    }

    pub fn comparison(ctx: &AppContext, builder: QueryBuilder, theme: Theme) -> Self {
        let sections = vec![
            Self::panel_section(PanelRole::OperandA, ctx, &theme),
            Self::panel_section(PanelRole::OperandB, ctx, &theme),
            Section::Combinator {
                label: "Compare sets by",
                options: &COMPARISON_OPTIONS,
                value: COMPARISON_OPTIONS[0],
            },
            Section::Submit("Compare"),
        ];
        Self::new(FormKind::Comparison, sections, builder, theme)
    }

    pub fn annotation(ctx: &AppContext, builder: QueryBuilder, theme: Theme) -> Self {
        let sections = vec![
            Self::panel_section(PanelRole::AnnotationTarget, ctx, &theme),
            Section::Annotations(AnnotationList::new(ctx.registry.clone(), theme.clone())),
            Section::Combinator {
                label: "Combine with annotations by",
                options: &ANNOTATION_OPTIONS,
                value: ANNOTATION_OPTIONS[0],
            },
            Section::Submit("Annotate"),
        ];
        Self::new(FormKind::Annotation, sections, builder, theme)
    }

    pub fn upload(builder: QueryBuilder, theme: Theme) -> Self {
        let sections = vec![
            Section::Text(TextField::new("Dataset URL")),
            Section::Text(TextField::new("Description")),
            Section::Submit("Upload"),
        ];
        Self::new(FormKind::Upload, sections, builder, theme)
    }

    pub fn result(builder: QueryBuilder, theme: Theme) -> Self {
        let sections = vec![
            Section::Text(TextField::new("Job ID")),
            Section::Submit("Fetch result"),
        ];
        Self::new(FormKind::Result, sections, builder, theme)
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut [Section] {
        &mut self.sections
    }

    pub fn focused_section(&self) -> Option<&Section> {
        self.sections.get(self.focus)
    }

    pub fn panel(&self, role: PanelRole) -> Option<&PanelEditor> {
        self.sections.iter().find_map(|s| match s {
            Section::Panel(editor) if editor.panel().role() == role => Some(editor),
            _ => None,
        })
    }

    fn panel_mut(&mut self, role: PanelRole) -> Option<&mut PanelEditor> {
        self.sections.iter_mut().find_map(|s| match s {
            Section::Panel(editor) if editor.panel().role() == role => Some(editor),
            _ => None,
        })
    }

    fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.sections.iter().filter_map(|s| match s {
            Section::Panel(editor) => Some(editor.panel()),
            _ => None,
        })
    }

    fn combinator(&self) -> Option<ReductionOp> {
        self.sections.iter().find_map(|s| match s {
            Section::Combinator { value, .. } => Some(*value),
            _ => None,
        })
    }

    fn texts(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter_map(|s| match s {
                Section::Text(field) => Some(field.value.as_str()),
                _ => None,
            })
            .collect()
    }

    fn checked_annotations(&self) -> Vec<String> {
        self.sections
            .iter()
            .find_map(|s| match s {
                Section::Annotations(list) => Some(list.checked_names()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Ask for a fresh live count on every panel of the form
    pub fn refresh_counts(&mut self) {
        for section in &mut self.sections {
            if let Section::Panel(editor) = section {
                editor.mark_count_dirty();
            }
        }
    }

    /// Apply a count reply to the panel with `role`, if this form owns it
    pub fn apply_count(&mut self, role: PanelRole, generation: u64, count: Option<u64>) -> bool {
        let Some(editor) = self.panel_mut(role) else {
            return false;
        };
        match count {
            Some(count) => {
                editor.panel_mut().apply_count(generation, count);
            }
            None => editor.panel_mut().abandon_count(generation),
        }
        true
    }

    /// Build the request for the submit button
    pub fn submit(&mut self) {
        let request = match self.kind {
            FormKind::Summary => self
                .panels()
                .next()
                .map(|panel| self.builder.summary(panel))
                .map(|query| query.map(|query| FormRequest::Job { kind: JobKind::Summary, query })),
            FormKind::Comparison => {
                let panels: Vec<&Panel> = self.panels().collect();
                match (panels.as_slice(), self.combinator()) {
                    ([a, b], Some(combinator)) => Some(
                        self.builder
                            .comparison(a, b, combinator)
                            .map(|query| FormRequest::Job { kind: JobKind::Comparison, query }),
                    ),
                    _ => None,
                }
            }
            FormKind::Annotation => {
                let annotations = self.checked_annotations();
                match (self.panels().next(), self.combinator()) {
                    (Some(panel), Some(combinator)) => Some(
                        self.builder
                            .annotation(panel, &annotations, combinator)
                            .map(|query| FormRequest::Job { kind: JobKind::Annotation, query }),
                    ),
                    _ => None,
                }
            }
            FormKind::Upload => {
                let texts = self.texts();
                let url = texts.first().copied().unwrap_or_default();
                let description = texts.get(1).copied().unwrap_or_default();
                Some(self.builder.upload(url, description).map(|query| FormRequest::Upload {
                    url: url.trim().to_string(),
                    query,
                }))
            }
            FormKind::Result => {
                let job_id = self.texts().first().copied().unwrap_or_default();
                Some(
                    self.builder
                        .result(job_id)
                        .map(|query| FormRequest::Job { kind: JobKind::Result, query }),
                )
            }
        };

        match request {
            Some(Ok(request)) => {
                debug!(form = self.kind.title(), "form submitted");
                self.requests.push(request);
            }
            Some(Err(e)) => {
                warn!(form = self.kind.title(), "Query not sent: {}", e);
                self.requests.push(FormRequest::Notice(Notice::from_query_error(&e)));
            }
            None => warn!(form = self.kind.title(), "Form is missing a section"),
        }
    }

    /// Everything the form accumulated since the last call: count refreshes
    /// for edited panels, provenance lookups and submissions
    pub fn drain_requests(&mut self) -> Vec<FormRequest> {
        let mut out = Vec::new();
        for section in &mut self.sections {
            match section {
                Section::Panel(editor) => {
                    if !editor.take_count_dirty() {
                        continue;
                    }
                    let panel = editor.panel_mut();
                    let generation = panel.begin_count_request();
                    match self.builder.count(panel) {
                        Ok(query) => out.push(FormRequest::Count {
                            role: panel.role(),
                            generation,
                            query,
                        }),
                        Err(e) => {
                            debug!(panel = %panel.role(), "No count request: {}", e);
                            panel.abandon_count(generation);
                        }
                    }
                }
                Section::Annotations(list) => {
                    if let Some(name) = list.take_provenance_request() {
                        let query = self.builder.provenance(&name);
                        out.push(FormRequest::Provenance { name, query });
                    }
                }
                _ => {}
            }
        }
        out.append(&mut self.requests);
        out
    }

    /// A value picker overlay owns all input while open
    pub fn picker_open(&self) -> bool {
        matches!(self.focused_section(), Some(Section::Panel(editor)) if editor.has_picker())
    }

    fn move_focus(&mut self, forward: bool) -> bool {
        let next = if forward {
            (self.focus + 1 < self.sections.len()).then(|| self.focus + 1)
        } else {
            self.focus.checked_sub(1)
        };
        let Some(next) = next else {
            return false;
        };
        if let Some(section) = self.sections.get_mut(self.focus) {
            section.set_focused(false, false);
        }
        self.focus = next;
        if let Some(section) = self.sections.get_mut(self.focus) {
            section.set_focused(true, !forward);
        }
        true
    }

    fn focus_edge(&mut self, last: bool) {
        if let Some(section) = self.sections.get_mut(self.focus) {
            section.set_focused(false, false);
        }
        self.focus = if last { self.sections.len().saturating_sub(1) } else { 0 };
        if let Some(section) = self.sections.get_mut(self.focus) {
            section.set_focused(true, last);
        }
    }

    fn section_line(&self, index: usize) -> Line<'static> {
        let focused = index == self.focus;
        let style = |on: bool| if on { self.theme.cursor_style() } else { self.theme.normal_style() };
        match &self.sections[index] {
            Section::Combinator { label, value, .. } => Line::from(vec![
                Span::styled(format!("{label} "), self.theme.title_style()),
                Span::styled(format!("[{}]", value.label()), style(focused)),
            ]),
            Section::Submit(label) => Line::from(Span::styled(format!("[ {label} ]"), style(focused))),
            _ => Line::default(),
        }
    }
}

impl Component for QueryForm {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::Submit => {
                self.submit();
                return Ok(true);
            }
            Action::RefreshCount => {
                self.refresh_counts();
                return Ok(true);
            }
            Action::GoToTop | Action::GoToBottom if !self.picker_open() => {
                self.focus_edge(action == Action::GoToBottom);
                return Ok(true);
            }
            _ => {}
        }

        let consumed = match self.sections.get_mut(self.focus) {
            Some(Section::Panel(editor)) => editor.handle_action(action)?,
            Some(Section::Annotations(list)) => list.handle_action(action)?,
            Some(Section::Combinator { options, value, .. }) => match action {
                Action::MoveLeft | Action::MoveRight => {
                    *value = value.cycle(options, action == Action::MoveRight);
                    true
                }
                _ => false,
            },
            Some(Section::Text(field)) => match action {
                Action::MoveLeft | Action::MoveRight => {
                    field.move_cursor(action == Action::MoveRight);
                    true
                }
                Action::ClearField => {
                    *field = TextField::new(field.label);
                    true
                }
                _ => false,
            },
            Some(Section::Submit(_)) => {
                if action == Action::Confirm {
                    self.submit();
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if consumed {
            return Ok(true);
        }

        Ok(match action {
            Action::MoveDown | Action::Confirm => self.move_focus(true),
            Action::MoveUp => self.move_focus(false),
            _ => false,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        // Adjacent panels share one row
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (i, section) in self.sections.iter().enumerate() {
            let joins = matches!(section, Section::Panel(_))
                && groups
                    .last()
                    .and_then(|g| g.last())
                    .is_some_and(|&j| matches!(self.sections[j], Section::Panel(_)));
            match groups.last_mut() {
                Some(group) if joins => group.push(i),
                _ => groups.push(vec![i]),
            }
        }

        let mut constraints: Vec<Constraint> = groups
            .iter()
            .map(|g| {
                let height = g.iter().map(|&i| self.sections[i].height()).max().unwrap_or(1);
                Constraint::Length(height)
            })
            .collect();
        constraints.push(Constraint::Min(0));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (group, row) in groups.iter().zip(rows.iter()) {
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, group.len() as u32); group.len()])
                .split(*row);
            for (&index, cell) in group.iter().zip(cells.iter()) {
                let line = self.section_line(index);
                let focused = index == self.focus;
                match &mut self.sections[index] {
                    Section::Panel(editor) => editor.render(frame, *cell),
                    Section::Annotations(list) => list.render(frame, *cell),
                    Section::Text(field) => {
                        let border = if focused {
                            self.theme.focused_border_style()
                        } else {
                            self.theme.border_style()
                        };
                        let block = Block::default()
                            .title(field.label)
                            .borders(Borders::ALL)
                            .border_style(border);
                        frame.render_widget(Paragraph::new(field.value.clone()).block(block), *cell);
                        if focused {
                            let cursor = u16::try_from(field.cursor).unwrap_or(u16::MAX);
                            let x = cell.x.saturating_add(1).saturating_add(cursor);
                            frame.set_cursor_position((x.min(cell.right().saturating_sub(2)), cell.y + 1));
                        }
                    }
                    Section::Combinator { .. } | Section::Submit(_) => {
                        frame.render_widget(Paragraph::new(line), *cell);
                    }
                }
            }
        }
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::MoveLeft,
            Action::MoveRight,
            Action::Submit,
            Action::RefreshCount,
        ]
    }

    fn name(&self) -> &str {
        self.kind.title()
    }

    fn edit_text(&mut self, edit: TextEdit) -> bool {
        match self.sections.get_mut(self.focus) {
            Some(Section::Panel(editor)) => editor.edit_text(edit),
            Some(Section::Text(field)) => {
                field.edit(edit);
                true
            }
            _ => false,
        }
    }
}
