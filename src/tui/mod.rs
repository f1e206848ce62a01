pub mod action;
pub mod app;
pub mod component;
pub mod components;
pub mod keybindings;
pub mod theme;

pub use action::{Action, ActionCategory};
pub use app::App;
pub use component::{Component, Focusable, TextEdit};
pub use components::{Notice, QueryForm};
pub use keybindings::{KeyBinding, KeyBindings, KeyPattern};
pub use theme::{Theme, ThemeName};
