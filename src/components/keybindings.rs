//! Keybinding system for context-aware keyboard shortcuts
//!
//! One registry serves two readers: the input handler resolves key events to
//! actions through it, and the footer renders its hints from it. The active
//! context follows the engine mode and the kind of the current question.

use crate::catalog::QuestionKind;
use crate::engine::{Mode, WizardEngine};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Which set of bindings is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyContext {
    /// Text or Secret question: printable keys are typed, not bound
    Text,
    Select,
    YesNo,
    Confirming,
    /// Run is over, nothing is bound
    Finished,
}

impl KeyContext {
    pub fn for_state(mode: Mode, kind: Option<QuestionKind>) -> Self {
        match (mode, kind) {
            (Mode::Terminated(_), _) => Self::Finished,
            (Mode::Confirming, _) | (Mode::Answering, None) => Self::Confirming,
            (Mode::Answering, Some(QuestionKind::Text | QuestionKind::Secret)) => Self::Text,
            (Mode::Answering, Some(QuestionKind::Select)) => Self::Select,
            (Mode::Answering, Some(QuestionKind::YesNo)) => Self::YesNo,
        }
    }

    pub fn for_engine(engine: &WizardEngine) -> Self {
        Self::for_state(engine.mode(), engine.current_question().map(|q| q.kind))
    }
}

/// Actions that can be triggered by keybindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Submit,
    DeleteChar,
    NavigateUp,
    NavigateDown,
    Choose,
    Yes,
    No,
    Accept,
    Reject,
    Quit,
}

/// A keybinding definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: KeyAction,
    pub display: &'static str,
    pub description: &'static str,
}

impl Keybinding {
    pub fn new(
        key: KeyCode,
        action: KeyAction,
        display: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::NONE,
            action,
            display,
            description,
        }
    }

    pub fn with_modifiers(
        key: KeyCode,
        modifiers: KeyModifiers,
        action: KeyAction,
        display: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            modifiers,
            action,
            display,
            description,
        }
    }

    /// Control and Alt must match exactly; Shift is ignored
    fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let relevant = KeyModifiers::CONTROL | KeyModifiers::ALT;
        self.key == code && (modifiers & relevant) == (self.modifiers & relevant)
    }
}

/// Navigation bar item for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavBarItem {
    pub key_display: String,
    pub action_label: String,
}

/// Context-aware keybinding registry
pub struct KeybindingContext {
    mode_bindings: HashMap<KeyContext, Vec<Keybinding>>,
    /// Available in every context except `Finished`
    global_bindings: Vec<Keybinding>,
}

impl Default for KeybindingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl KeybindingContext {
    pub fn new() -> Self {
        let mut ctx = Self {
            mode_bindings: HashMap::new(),
            global_bindings: Vec::new(),
        };
        ctx.register_defaults();
        ctx
    }

    fn register_defaults(&mut self) {
        self.global_bindings = vec![
            Keybinding::new(KeyCode::Esc, KeyAction::Quit, "Esc", "Quit"),
            Keybinding::with_modifiers(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
                KeyAction::Quit,
                "Ctrl+C",
                "Quit",
            ),
        ];

        self.mode_bindings.insert(
            KeyContext::Text,
            vec![
                Keybinding::new(KeyCode::Enter, KeyAction::Submit, "Enter", "Submit"),
                Keybinding::new(KeyCode::Backspace, KeyAction::DeleteChar, "Bksp", "Delete"),
            ],
        );

        self.mode_bindings.insert(
            KeyContext::Select,
            vec![
                Keybinding::new(KeyCode::Up, KeyAction::NavigateUp, "Up", "Previous option"),
                Keybinding::new(KeyCode::Char('k'), KeyAction::NavigateUp, "k", "Previous option"),
                Keybinding::new(KeyCode::Down, KeyAction::NavigateDown, "Down", "Next option"),
                Keybinding::new(KeyCode::Char('j'), KeyAction::NavigateDown, "j", "Next option"),
                Keybinding::new(KeyCode::Enter, KeyAction::Choose, "Enter", "Choose"),
            ],
        );

        self.mode_bindings.insert(
            KeyContext::YesNo,
            vec![
                Keybinding::new(KeyCode::Char('y'), KeyAction::Yes, "y", "Yes"),
                Keybinding::new(KeyCode::Char('n'), KeyAction::No, "n", "No"),
            ],
        );

        self.mode_bindings.insert(
            KeyContext::Confirming,
            vec![
                Keybinding::new(KeyCode::Char('y'), KeyAction::Accept, "y", "Save"),
                Keybinding::new(KeyCode::Enter, KeyAction::Accept, "Enter", "Save"),
                Keybinding::new(KeyCode::Char('n'), KeyAction::Reject, "n", "Edit"),
                Keybinding::new(KeyCode::Char('q'), KeyAction::Quit, "q", "Quit"),
            ],
        );
    }

    /// Bindings active in `context`, context-specific first
    pub fn get_bindings(&self, context: KeyContext) -> Vec<&Keybinding> {
        if context == KeyContext::Finished {
            return Vec::new();
        }
        self.mode_bindings
            .get(&context)
            .into_iter()
            .flatten()
            .chain(self.global_bindings.iter())
            .collect()
    }

    /// Action bound to `key` in `context`.
    ///
    /// Letters are matched case-insensitively outside text entry, so `Y` works
    /// like `y`.
    pub fn resolve(&self, context: KeyContext, key: &KeyEvent) -> Option<KeyAction> {
        let code = match key.code {
            KeyCode::Char(c) if context != KeyContext::Text => {
                KeyCode::Char(c.to_ascii_lowercase())
            }
            code => code,
        };
        self.get_bindings(context)
            .into_iter()
            .find(|b| b.matches(code, key.modifiers))
            .map(|b| b.action)
    }

    /// Footer hints for `context`, one item per action
    pub fn get_nav_items(&self, context: KeyContext) -> Vec<NavBarItem> {
        let mut items: Vec<NavBarItem> = Vec::new();
        let mut seen: Vec<KeyAction> = Vec::new();

        for binding in self.get_bindings(context) {
            if let Some(pos) = seen.iter().position(|a| *a == binding.action) {
                // Same action on several keys: "Up/k"
                items[pos].key_display.push('/');
                items[pos].key_display.push_str(binding.display);
                continue;
            }
            seen.push(binding.action);
            items.push(NavBarItem {
                key_display: binding.display.to_string(),
                action_label: binding.description.to_string(),
            });
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Termination;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_context_follows_mode_and_kind() {
        assert_eq!(
            KeyContext::for_state(Mode::Answering, Some(QuestionKind::Secret)),
            KeyContext::Text
        );
        assert_eq!(
            KeyContext::for_state(Mode::Answering, Some(QuestionKind::Select)),
            KeyContext::Select
        );
        assert_eq!(KeyContext::for_state(Mode::Confirming, None), KeyContext::Confirming);
        assert_eq!(
            KeyContext::for_state(Mode::Terminated(Termination::Saved), None),
            KeyContext::Finished
        );
    }

    #[test]
    fn test_letters_are_text_in_text_context() {
        let ctx = KeybindingContext::new();
        assert_eq!(ctx.resolve(KeyContext::Text, &key(KeyCode::Char('q'))), None);
        assert_eq!(ctx.resolve(KeyContext::Text, &key(KeyCode::Char('y'))), None);
        assert_eq!(
            ctx.resolve(KeyContext::Text, &key(KeyCode::Enter)),
            Some(KeyAction::Submit)
        );
    }

    #[test]
    fn test_quit_is_global() {
        let ctx = KeybindingContext::new();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for context in [
            KeyContext::Text,
            KeyContext::Select,
            KeyContext::YesNo,
            KeyContext::Confirming,
        ] {
            assert_eq!(ctx.resolve(context, &key(KeyCode::Esc)), Some(KeyAction::Quit));
            assert_eq!(ctx.resolve(context, &ctrl_c), Some(KeyAction::Quit));
        }
        assert_eq!(ctx.resolve(KeyContext::Finished, &key(KeyCode::Esc)), None);
    }

    #[test]
    fn test_plain_c_is_not_quit() {
        let ctx = KeybindingContext::new();
        assert_eq!(ctx.resolve(KeyContext::Text, &key(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_uppercase_yes_no() {
        let ctx = KeybindingContext::new();
        let upper_y = KeyEvent::new(KeyCode::Char('Y'), KeyModifiers::SHIFT);
        assert_eq!(ctx.resolve(KeyContext::YesNo, &upper_y), Some(KeyAction::Yes));
        assert_eq!(ctx.resolve(KeyContext::Confirming, &upper_y), Some(KeyAction::Accept));
    }

    #[test]
    fn test_nav_items_merge_keys() {
        let ctx = KeybindingContext::new();
        let items = ctx.get_nav_items(KeyContext::Select);
        assert_eq!(items[0].key_display, "Up/k");
        assert_eq!(items[1].key_display, "Down/j");
        assert_eq!(items.last().map(|i| i.key_display.as_str()), Some("Esc/Ctrl+C"));
    }

    #[test]
    fn test_confirming_quit_hint_merged() {
        let ctx = KeybindingContext::new();
        let items = ctx.get_nav_items(KeyContext::Confirming);
        let quit: Vec<_> = items.iter().filter(|i| i.action_label == "Quit").collect();
        assert_eq!(quit.len(), 1);
        assert_eq!(quit[0].key_display, "q/Esc/Ctrl+C");
    }
}
