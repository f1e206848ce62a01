use crate::core::catalog::AppContext;
use crate::core::query::QueryBuilder;
use crate::services::{BackendEvent, Dispatcher};
use crate::tui::components::{FormRequest, Notice, QueryForm};
use crate::tui::{Action, Component, KeyBindings, TextEdit, Theme};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
    Frame,
};
use std::collections::VecDeque;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, trace, warn};

/// Application state
///
/// Owns one [`QueryForm`] per tab, forwards the requests they produce to the
/// [`Dispatcher`] and applies completed requests on every tick.
pub struct App {
    /// One form per tab, in tab order
    tabs: Vec<QueryForm>,

    /// Index of the visible tab
    active: usize,

    /// Backend request runner
    dispatcher: Dispatcher,

    /// Completions coming back from the dispatcher
    events: UnboundedReceiver<BackendEvent>,

    /// Notices waiting to be shown; the front one is on screen
    notices: VecDeque<Notice>,

    /// Whether the help overlay is open
    show_help: bool,

    /// One-line feedback for failures that do not warrant a notice
    status: Option<String>,

    /// Keybindings configuration
    keybindings: KeyBindings,

    /// Current theme
    theme: Theme,

    /// Whether the app should quit
    should_quit: bool,
}

impl App {
    /// Create the app with all five tabs built over `ctx`
    pub fn new(
        ctx: &AppContext,
        builder: QueryBuilder,
        dispatcher: Dispatcher,
        events: UnboundedReceiver<BackendEvent>,
        keybindings: KeyBindings,
        theme: Theme,
    ) -> Self {
        let tabs = vec![
            QueryForm::summary(ctx, builder.clone(), theme.clone()),
            QueryForm::comparison(ctx, builder.clone(), theme.clone()),
            QueryForm::annotation(ctx, builder.clone(), theme.clone()),
            QueryForm::upload(builder.clone(), theme.clone()),
            QueryForm::result(builder, theme.clone()),
        ];
        let mut app = Self {
            tabs,
            active: 0,
            dispatcher,
            events,
            notices: VecDeque::new(),
            show_help: false,
            status: None,
            keybindings,
            theme,
            should_quit: false,
        };
        app.pump_requests();
        app
    }

    /// Handle a key event
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        // Only handle key press events, ignore release/repeat
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        // Typed text goes to a focused text field before any binding applies
        if self.notices.is_empty() && !self.show_help {
            let edit = match key.code {
                KeyCode::Char(c)
                    if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    Some(TextEdit::Insert(c))
                }
                KeyCode::Backspace => Some(TextEdit::Backspace),
                KeyCode::Delete => Some(TextEdit::Delete),
                _ => None,
            };
            if let Some(edit) = edit {
                if let Some(tab) = self.tabs.get_mut(self.active) {
                    if tab.edit_text(edit) {
                        self.pump_requests();
                        return Ok(());
                    }
                }
            }
        }

        // Translate key to action
        if let Some(action) = self.keybindings.get_action(&key) {
            self.handle_action(action)?;
        }

        Ok(())
    }

    /// Handle an action
    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        // Modal overlays first
        if let Some(notice) = self.notices.front_mut() {
            if !notice.handle_action(action)? {
                self.notices.pop_front();
            }
            return Ok(());
        }
        if self.show_help {
            if matches!(action, Action::ToggleHelp | Action::Cancel | Action::Confirm | Action::Quit) {
                self.show_help = false;
            }
            return Ok(());
        }

        // App-level actions
        match action {
            Action::Quit => {
                self.should_quit = true;
                return Ok(());
            }
            Action::ToggleHelp => {
                self.show_help = true;
                return Ok(());
            }
            Action::NextTab | Action::PrevTab if !self.picker_open() => {
                let len = self.tabs.len();
                self.active = if action == Action::NextTab {
                    (self.active + 1) % len
                } else {
                    (self.active + len - 1) % len
                };
                return Ok(());
            }
            _ => {}
        }

        if let Some(tab) = self.tabs.get_mut(self.active) {
            if !tab.handle_action(action)? {
                trace!(tab = tab.name(), ?action, "Action not handled");
            }
        }
        self.pump_requests();
        Ok(())
    }

    fn picker_open(&self) -> bool {
        self.tabs.get(self.active).is_some_and(|tab| tab.picker_open())
    }

    /// Send every pending form request to the dispatcher
    fn pump_requests(&mut self) {
        let requests: Vec<FormRequest> = self
            .tabs
            .iter_mut()
            .flat_map(|tab| tab.drain_requests())
            .collect();
        for request in requests {
            match request {
                FormRequest::Count { role, generation, query } => {
                    debug!(panel = %role, generation, "Refreshing live count");
                    self.dispatcher.refresh_count(role, generation, query);
                }
                FormRequest::Job { kind, query } => {
                    self.status = Some(format!("Submitted {kind} request"));
                    self.dispatcher.submit_job(kind, query);
                }
                FormRequest::Upload { url, query } => {
                    self.status = Some(format!("Uploading {url}"));
                    self.dispatcher.upload(url, query);
                }
                FormRequest::Provenance { name, query } => {
                    self.dispatcher.provenance(name, query);
                }
                FormRequest::Notice(notice) => self.push_notice(notice),
            }
        }
    }

    fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice.with_theme(self.theme.clone()));
    }

    /// Apply one finished backend request
    pub fn apply_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Count { role, generation, result } => {
                let count = match result {
                    Ok(count) => Some(count),
                    Err(e) => {
                        debug!(panel = %role, "Count failed: {}", e);
                        self.status = Some(format!("{} count unavailable", role.title()));
                        None
                    }
                };
                if !self.tabs.iter_mut().any(|tab| tab.apply_count(role, generation, count)) {
                    warn!(panel = %role, "Count reply for a panel no tab owns");
                }
            }
            BackendEvent::Job { kind, result } => match result {
                Ok(outcome) => {
                    info!("{} request finished: {}", kind, outcome.title());
                    self.status = None;
                    self.push_notice(Notice::from_job(&outcome));
                }
                Err(_) => self.status = Some(format!("The {kind} request failed, see the log")),
            },
            BackendEvent::Upload { result } => match result {
                Ok(outcome) => {
                    self.status = None;
                    self.push_notice(Notice::from_upload(&outcome));
                }
                Err(_) => self.status = Some("The upload request failed, see the log".to_string()),
            },
            BackendEvent::Provenance { name, result } => match result {
                Ok(provenance) => self.push_notice(Notice::from_provenance(&provenance)),
                Err(_) => self.status = Some(format!("No provenance for {name}, see the log")),
            },
        }
    }

    /// Check if the app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Update app state (called on every tick)
    pub fn update(&mut self) -> Result<()> {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("Backend event channel closed");
                    break;
                }
            }
        }
        for tab in &mut self.tabs {
            tab.update()?;
        }
        self.pump_requests();
        Ok(())
    }

    /// Render the app
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tab bar
                Constraint::Min(0),    // Active form
                Constraint::Length(1), // Status line
            ])
            .split(area);

        let titles: Vec<Line> = self.tabs.iter().map(|t| Line::from(t.kind().title())).collect();
        let tabs = Tabs::new(titles)
            .select(self.active)
            .block(
                Block::default()
                    .title("WiggleDB")
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style()),
            )
            .style(self.theme.normal_style())
            .highlight_style(self.theme.cursor_style());
        frame.render_widget(tabs, chunks[0]);

        if let Some(tab) = self.tabs.get_mut(self.active) {
            tab.render(frame, chunks[1]);
        }

        let status = match &self.status {
            Some(message) => Span::styled(message.clone(), self.theme.warning_style()),
            None => Span::styled(
                "? help  Tab switch form  Ctrl+s submit  Ctrl+c quit",
                self.theme.muted_style(),
            ),
        };
        frame.render_widget(Paragraph::new(Line::from(status)), chunks[2]);

        if self.show_help {
            self.render_help(frame, Self::centered_rect(70, 80, area));
        }
        if let Some(notice) = self.notices.front_mut() {
            notice.render(frame, area);
        }
    }

    fn help_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let mut category = None;
        for action in Action::all() {
            if category != Some(action.category()) {
                if category.is_some() {
                    lines.push(Line::default());
                }
                category = Some(action.category());
                lines.push(Line::from(Span::styled(
                    action.category().to_string(),
                    self.theme.title_style(),
                )));
            }
            let keys = self.keybindings.keys_for(action).join(", ");
            lines.push(Line::from(vec![
                Span::styled(format!("  {keys:<20}"), self.theme.info_style()),
                Span::styled(action.description(), self.theme.normal_style()),
            ]));
        }
        lines
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Clear, area);
        let block = Block::default()
            .title("Help")
            .title_bottom(Line::from("? or Esc to close").right_aligned())
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(self.theme.focused_border_style())
            .style(self.theme.normal_style());
        frame.render_widget(Paragraph::new(self.help_lines()).block(block), area);
    }

    /// Helper to create centered rectangle
    fn centered_rect(percent_w: u16, percent_h: u16, area: Rect) -> Rect {
        let width = (area.width * percent_w) / 100;
        let height = (area.height * percent_h) / 100;
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn active_tab(&self) -> &QueryForm {
        &self.tabs[self.active]
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Get reference to theme
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Get keybindings
    pub fn keybindings(&self) -> &KeyBindings {
        &self.keybindings
    }
}
