#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_match)]
#![allow(clippy::collapsible_else_if)]

pub mod config;
pub mod core;
pub mod errors;
pub mod logging;
pub mod services;
pub mod tui;

// Re-export commonly used types
pub use crate::core::{AppContext, Panel, PanelRole, QueryBuilder, ReductionOp, Relation};
pub use crate::services::{Backend, BackendError, Dispatcher, HttpBackend};
pub use crate::tui::{Action, ActionCategory, App};
