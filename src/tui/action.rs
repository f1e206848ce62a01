use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// What a key press asks for, independent of which key it was
///
/// Variant order is the order of the help screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    GoToTop,
    GoToBottom,

    ToggleValue,
    ClearField,
    ShowProvenance,
    RefreshCount,
    Submit,

    ToggleHelp,

    NextTab,
    PrevTab,

    Quit,
    Confirm,
    Cancel,
}

/// Help screen section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ActionCategory {
    Navigation,
    Form,
    View,
    Tabs,
    Application,
}

impl Action {
    pub fn all() -> Vec<Action> {
        Action::iter().collect()
    }

    pub fn description(&self) -> &'static str {
        use Action::*;
        match self {
            MoveUp => "Previous field",
            MoveDown => "Next field",
            MoveLeft => "Previous choice",
            MoveRight => "Next choice",
            GoToTop => "First field",
            GoToBottom => "Last field",
            ToggleValue => "Toggle value or annotation",
            ClearField => "Clear attribute or filter",
            ShowProvenance => "Show annotation provenance",
            RefreshCount => "Refresh live counts",
            Submit => "Submit current form",
            ToggleHelp => "Toggle help screen",
            NextTab => "Next tab",
            PrevTab => "Previous tab",
            Quit => "Quit application",
            Confirm => "Open picker or submit",
            Cancel => "Close dialog",
        }
    }

    pub fn category(&self) -> ActionCategory {
        use Action::*;
        match self {
            MoveUp | MoveDown | MoveLeft | MoveRight | GoToTop | GoToBottom => {
                ActionCategory::Navigation
            }
            ToggleValue | ClearField | ShowProvenance | RefreshCount | Submit => ActionCategory::Form,
            ToggleHelp => ActionCategory::View,
            NextTab | PrevTab => ActionCategory::Tabs,
            Quit | Confirm | Cancel => ActionCategory::Application,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn categories_are_contiguous() {
        // The help screen prints a heading whenever the category changes
        let mut headings: Vec<ActionCategory> = Action::all().iter().map(Action::category).collect();
        headings.dedup();
        assert_eq!(
            headings,
            vec![
                ActionCategory::Navigation,
                ActionCategory::Form,
                ActionCategory::View,
                ActionCategory::Tabs,
                ActionCategory::Application,
            ]
        );
        assert_eq!(ActionCategory::Application.to_string(), "Application");
    }

    #[test]
    fn descriptions_are_unique() {
        let mut seen: Vec<&str> = Action::all().iter().map(Action::description).collect();
        let total = seen.len();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn names_in_binding_files() {
        assert_eq!(serde_json::to_string(&Action::ShowProvenance).unwrap(), "\"ShowProvenance\"");
        let parsed: Vec<Action> = serde_json::from_str(r#"["Submit", "PrevTab"]"#).unwrap();
        assert_eq!(parsed, vec![Action::Submit, Action::PrevTab]);
    }
}
