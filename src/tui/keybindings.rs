//! Key bindings: string patterns such as `Ctrl+s` or `Space` mapped to
//! actions, loadable from and savable to a JSON file.

use crate::tui::action::Action;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Single keybinding entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub action: Action,
}

impl KeyBinding {
    pub fn new(key: &str, action: Action) -> Self {
        Self {
            key: key.to_string(),
            action,
        }
    }
}

/// On-disk shape of a keybinding file
#[derive(Serialize, Deserialize)]
struct BindingFile {
    bindings: Vec<KeyBinding>,
}

/// Maps key events to actions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "BindingFile", into = "BindingFile")]
pub struct KeyBindings {
    bindings: Vec<KeyBinding>,
    lookup: HashMap<KeyPattern, Action>,
}

impl From<BindingFile> for KeyBindings {
    fn from(file: BindingFile) -> Self {
        Self::new(file.bindings)
    }
}

impl From<KeyBindings> for BindingFile {
    fn from(bindings: KeyBindings) -> Self {
        Self { bindings: bindings.bindings }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        use Action::*;
        let defaults = [
            // Field cursor
            ("Up", MoveUp),
            ("Down", MoveDown),
            ("k", MoveUp),
            ("j", MoveDown),
            ("Home", GoToTop),
            ("End", GoToBottom),
            ("g", GoToTop),
            ("G", GoToBottom),
            // Choice cycling
            ("Left", MoveLeft),
            ("Right", MoveRight),
            ("h", MoveLeft),
            ("l", MoveRight),
            // Form
            ("Space", ToggleValue),
            ("Delete", ClearField),
            ("x", ClearField),
            ("i", ShowProvenance),
            ("r", RefreshCount),
            ("F5", RefreshCount),
            ("Ctrl+s", Submit),
            // Help
            ("?", ToggleHelp),
            ("F1", ToggleHelp),
            // Tabs
            ("Tab", NextTab),
            ("BackTab", PrevTab),
            // Application
            ("q", Quit),
            ("Ctrl+c", Quit),
            ("Esc", Cancel),
            ("Enter", Confirm),
        ];
        Self::new(defaults.iter().map(|(key, action)| KeyBinding::new(key, *action)).collect())
    }
}

impl KeyBindings {
    /// Bindings whose pattern does not parse are kept in the list (so they
    /// survive a save) but never match; see [`KeyBindings::validate`].
    pub fn new(bindings: Vec<KeyBinding>) -> Self {
        let lookup = bindings
            .iter()
            .filter_map(|b| b.key.parse::<KeyPattern>().ok().map(|p| (p, b.action)))
            .collect();
        Self { bindings, lookup }
    }

    pub fn get_action(&self, key: &KeyEvent) -> Option<Action> {
        self.lookup.get(&KeyPattern::from(key)).copied()
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Keys bound to `action`, as written in the bindings (for the help screen)
    pub fn keys_for(&self, action: Action) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|b| b.action == action)
            .map(|b| b.key.as_str())
            .collect()
    }

    pub fn unbound_actions(&self) -> Vec<Action> {
        let bound: HashSet<Action> = self.bindings.iter().map(|b| b.action).collect();
        Action::all().into_iter().filter(|a| !bound.contains(a)).collect()
    }

    /// Problems worth logging: unparsable patterns, one key bound twice,
    /// actions without any key
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen: HashMap<KeyPattern, &KeyBinding> = HashMap::new();
        for binding in &self.bindings {
            match binding.key.parse::<KeyPattern>() {
                Ok(pattern) => {
                    if let Some(first) = seen.insert(pattern, binding) {
                        warnings.push(format!(
                            "Key '{}' is bound to both {:?} and {:?}",
                            binding.key, first.action, binding.action
                        ));
                    }
                }
                Err(e) => warnings.push(format!("{} (bound to {:?})", e, binding.action)),
            }
        }
        let unbound = self.unbound_actions();
        if !unbound.is_empty() {
            warnings.push(format!("No key for: {:?}", unbound));
        }
        warnings
    }
}

/// A key code plus modifiers, normalized so that a printable character never
/// carries Shift: terminals disagree on whether `G` or `?` report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyPattern {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let modifiers = match code {
            KeyCode::Char(_) | KeyCode::BackTab => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        Self { code, modifiers }
    }
}

impl From<&KeyEvent> for KeyPattern {
    fn from(event: &KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }
}

fn parse_code(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    let code = match name.to_ascii_lowercase().as_str() {
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "pageup" | "pgup" => KeyCode::PageUp,
        "pagedown" | "pgdn" => KeyCode::PageDown,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "tab" => KeyCode::Tab,
        "backtab" => KeyCode::BackTab,
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "insert" | "ins" => KeyCode::Insert,
        "space" => KeyCode::Char(' '),
        f => match f.strip_prefix('f')?.parse::<u8>().ok()? {
            n @ 1..=12 => KeyCode::F(n),
            _ => return None,
        },
    };
    Some(code)
}

impl FromStr for KeyPattern {
    type Err = String;

    /// `Ctrl+s`, `Alt+Shift+Left`, `G`, `?`, `F5`, `Space`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A trailing '+' is the plus key itself
        let (prefix, key) = match s.strip_suffix("++") {
            Some(prefix) => (Some(prefix), "+"),
            None => match s.rsplit_once('+') {
                Some((prefix, key)) if !key.is_empty() => (Some(prefix), key),
                _ => (None, s),
            },
        };

        let mut modifiers = KeyModifiers::NONE;
        for part in prefix.into_iter().flat_map(|p| p.split('+')) {
            modifiers |= match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "alt" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                _ => return Err(format!("Unknown modifier '{part}' in key pattern '{s}'")),
            };
        }

        let mut code = parse_code(key).ok_or_else(|| format!("Unknown key '{key}' in key pattern '{s}'"))?;
        // Ctrl+S and Shift+g mean the same keys as Ctrl+s and G
        if let KeyCode::Char(c) = code {
            if modifiers.contains(KeyModifiers::SHIFT) {
                code = KeyCode::Char(c.to_ascii_uppercase());
            } else if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                code = KeyCode::Char(c.to_ascii_lowercase());
            }
        }
        Ok(Self::new(code, modifiers))
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (KeyModifiers::CONTROL, "Ctrl+"),
            (KeyModifiers::ALT, "Alt+"),
            (KeyModifiers::SHIFT, "Shift+"),
        ] {
            if self.modifiers.contains(flag) {
                f.write_str(name)?;
            }
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("Space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::F(n) => write!(f, "F{n}"),
            KeyCode::PageUp => f.write_str("PageUp"),
            KeyCode::PageDown => f.write_str("PageDown"),
            other => write!(f, "{other:?}"),
        }
    }
}
