use ratatui::style::{Color, Modifier, Style};
use strum::{Display, EnumString};

/// Names accepted by the `ui.theme` setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

/// Colour scheme for the form views and notices
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub border: Color,
    pub border_focused: Color,
    pub title_fg: Color,
    /// Field under the cursor, as (fg, bg)
    pub cursor: (Color, Color),
    /// Checked values and annotations
    pub checked: Color,
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: ThemeName::Dark,
            background: Color::Reset,
            foreground: Color::Gray,
            muted: Color::DarkGray,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            title_fg: Color::Cyan,
            cursor: (Color::Black, Color::Cyan),
            checked: Color::Green,
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Blue,
        }
    }

    pub fn light() -> Self {
        let green = Color::Rgb(0, 128, 0);
        Self {
            name: ThemeName::Light,
            background: Color::White,
            foreground: Color::Black,
            muted: Color::Gray,
            border: Color::Gray,
            border_focused: Color::Blue,
            title_fg: Color::Blue,
            cursor: (Color::White, Color::Blue),
            checked: green,
            success: green,
            error: Color::Red,
            // Plain yellow is unreadable on white
            warning: Color::Rgb(200, 150, 0),
            info: Color::Blue,
        }
    }

    /// Unknown names fall back to the dark theme
    pub fn from_name(name: &str) -> Self {
        match name.trim().parse().unwrap_or_default() {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    fn fg(color: Color) -> Style {
        Style::default().fg(color)
    }

    pub fn title_style(&self) -> Style {
        Self::fg(self.title_fg).add_modifier(Modifier::BOLD)
    }

    pub fn cursor_style(&self) -> Style {
        let (fg, bg) = self.cursor;
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD)
    }

    pub fn normal_style(&self) -> Style {
        Self::fg(self.foreground).bg(self.background)
    }

    pub fn muted_style(&self) -> Style {
        Self::fg(self.muted)
    }

    pub fn checked_style(&self) -> Style {
        Self::fg(self.checked)
    }

    pub fn border_style(&self) -> Style {
        Self::fg(self.border)
    }

    pub fn focused_border_style(&self) -> Style {
        Self::fg(self.border_focused)
    }

    pub fn success_style(&self) -> Style {
        Self::fg(self.success)
    }

    pub fn error_style(&self) -> Style {
        Self::fg(self.error)
    }

    pub fn warning_style(&self) -> Style {
        Self::fg(self.warning)
    }

    pub fn info_style(&self) -> Style {
        Self::fg(self.info)
    }
}
