//! Input handling module
//!
//! Turns terminal key events into engine [`Event`]s. Typed text is buffered
//! here until Enter submits it; the engine only ever sees whole answers.

use crate::components::keybindings::{KeyAction, KeyContext, KeybindingContext};
use crate::engine::{Event, Mode, WizardEngine};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Key-to-event mapper with a text buffer for Text/Secret questions
pub struct InputHandler {
    buffer: String,
    bindings: KeybindingContext,
    /// `(mode, cursor)` the buffer was last loaded for
    synced: Option<(Mode, usize)>,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            bindings: KeybindingContext::new(),
            synced: None,
        }
    }

    /// Current text buffer (unmasked)
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn bindings(&self) -> &KeybindingContext {
        &self.bindings
    }

    /// Reload the buffer when the engine has moved to another question.
    ///
    /// A failed submit leaves the cursor in place, so the typed text stays
    /// editable. Moving on (or a rewind) loads the question's displayed answer.
    pub fn sync(&mut self, engine: &WizardEngine) {
        let position = (engine.mode(), engine.cursor());
        if self.synced == Some(position) {
            return;
        }
        self.synced = Some(position);
        self.buffer = match engine.current_question() {
            Some(q) if q.kind.takes_text() => engine
                .displayed_answer(engine.cursor())
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        };
    }

    /// Map `key` to an engine event, editing the buffer on the way.
    ///
    /// Returns `None` for keys that only edit the buffer or are unbound.
    pub fn handle_key(&mut self, key: KeyEvent, engine: &WizardEngine) -> Option<Event> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        self.sync(engine);

        let context = KeyContext::for_engine(engine);
        if let Some(action) = self.bindings.resolve(context, &key) {
            return self.apply_action(action);
        }

        match key.code {
            KeyCode::Char(c)
                if context == KeyContext::Text
                    && !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.buffer.push(c);
                None
            }
            _ => None,
        }
    }

    fn apply_action(&mut self, action: KeyAction) -> Option<Event> {
        match action {
            KeyAction::Submit => Some(Event::TextSubmit(self.buffer.clone())),
            KeyAction::DeleteChar => {
                self.buffer.pop();
                None
            }
            KeyAction::NavigateUp => Some(Event::SelectMove(-1)),
            KeyAction::NavigateDown => Some(Event::SelectMove(1)),
            KeyAction::Choose => Some(Event::SelectConfirm),
            KeyAction::Yes => Some(Event::YesNoChoice(true)),
            KeyAction::No => Some(Event::YesNoChoice(false)),
            KeyAction::Accept => Some(Event::ConfirmAccept),
            KeyAction::Reject => Some(Event::ConfirmReject),
            KeyAction::Quit => Some(Event::Quit),
        }
    }
}
