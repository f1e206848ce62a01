use crate::tui::action::Action;
use color_eyre::Result;
use ratatui::{layout::Rect, Frame};

/// Raw text editing, routed ahead of the key bindings while a text field
/// has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEdit {
    Insert(char),
    Backspace,
    Delete,
}

/// A piece of the screen that reacts to actions: a tab's form, one of its
/// sections, or an overlay.
///
/// Actions travel from the focused component outwards. `Ok(false)` hands
/// the action back to the container, which is how the cursor leaves a panel
/// past its last field and how an overlay asks to be closed.
pub trait Component {
    fn handle_action(&mut self, action: Action) -> Result<bool>;

    /// Draw into `area`; the component owns everything inside it
    fn render(&mut self, frame: &mut Frame, area: Rect);

    /// Actions this component reacts to itself
    fn supported_actions(&self) -> &[Action];

    /// Shown in logs
    fn name(&self) -> &str;

    /// Once per UI loop iteration
    fn update(&mut self) -> Result<()> {
        Ok(())
    }

    /// Apply `edit` to the focused text field; `false` when none has focus
    fn edit_text(&mut self, _edit: TextEdit) -> bool {
        false
    }
}

pub trait Focusable: Component {
    fn is_focused(&self) -> bool;
    fn set_focused(&mut self, focused: bool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A one-line text field that gives up focus on the cursor keys
    #[derive(Default)]
    struct LineInput {
        text: String,
        focused: bool,
        ticks: u32,
    }

    impl Component for LineInput {
        fn handle_action(&mut self, action: Action) -> Result<bool> {
            Ok(match action {
                Action::ClearField => {
                    self.text.clear();
                    true
                }
                _ => false,
            })
        }

        fn render(&mut self, _frame: &mut Frame, _area: Rect) {}

        fn supported_actions(&self) -> &[Action] {
            &[Action::ClearField]
        }

        fn name(&self) -> &str {
            "line"
        }

        fn update(&mut self) -> Result<()> {
            self.ticks += 1;
            Ok(())
        }

        fn edit_text(&mut self, edit: TextEdit) -> bool {
            if !self.focused {
                return false;
            }
            match edit {
                TextEdit::Insert(c) => self.text.push(c),
                TextEdit::Backspace | TextEdit::Delete => {
                    self.text.pop();
                }
            }
            true
        }
    }

    impl Focusable for LineInput {
        fn is_focused(&self) -> bool {
            self.focused
        }

        fn set_focused(&mut self, focused: bool) {
            self.focused = focused;
        }
    }

    /// Minimal component relying on every default method
    struct Label;

    impl Component for Label {
        fn handle_action(&mut self, _action: Action) -> Result<bool> {
            Ok(false)
        }

        fn render(&mut self, _frame: &mut Frame, _area: Rect) {}

        fn supported_actions(&self) -> &[Action] {
            &[]
        }

        fn name(&self) -> &str {
            "label"
        }
    }

    #[test]
    fn unhandled_actions_go_back_to_the_container() {
        let mut input = LineInput::default();
        assert!(input.handle_action(Action::ClearField).unwrap());
        assert!(!input.handle_action(Action::MoveDown).unwrap());
        assert!(!input.handle_action(Action::Submit).unwrap());
        assert_eq!(input.supported_actions(), &[Action::ClearField]);
    }

    #[test]
    fn text_reaches_only_a_focused_field() {
        let mut input = LineInput::default();
        assert!(!input.edit_text(TextEdit::Insert('5')));

        input.set_focused(true);
        for c in "500".chars() {
            assert!(input.edit_text(TextEdit::Insert(c)));
        }
        input.edit_text(TextEdit::Backspace);
        assert_eq!(input.text, "50");

        input.handle_action(Action::ClearField).unwrap();
        assert_eq!(input.text, "");
    }

    #[test]
    fn defaults_do_nothing() {
        let mut label = Label;
        assert!(label.update().is_ok());
        assert!(!label.edit_text(TextEdit::Insert('q')));
        assert_eq!(label.name(), "label");

        let mut input = LineInput::default();
        input.update().unwrap();
        assert_eq!(input.ticks, 1);
    }
}
