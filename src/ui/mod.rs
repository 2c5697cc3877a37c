//! User interface rendering module
//!
//! Rendering is a pure function of a [`WizardView`], a read-only projection
//! built from the engine and the input buffer after every transition. Nothing
//! here mutates wizard state.
//!
//! - `header` - title bar and footer (progress gauge, key hints)
//! - `screens` - answers column, question panel, review panel

mod header;
pub mod screens;

use crate::catalog::{Question, QuestionKind};
use crate::components::keybindings::{KeyContext, NavBarItem};
use crate::engine::{Mode, WizardEngine};
use crate::input::InputHandler;
use crate::theme::{Styles, UiConstants, mask};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    widgets::Block,
};

/// One line of the answers column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRow<'a> {
    pub id: &'a str,
    /// Display value, already masked for secrets
    pub value: String,
    pub current: bool,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone)]
pub struct WizardView<'a> {
    pub rows: Vec<AnswerRow<'a>>,
    pub mode: Mode,
    pub cursor: usize,
    pub total: usize,
    pub question: Option<&'a Question>,
    pub selection: usize,
    /// Text being typed, masked for secrets
    pub input: String,
    pub error: Option<&'a str>,
    pub hints: Vec<NavBarItem>,
}

impl<'a> WizardView<'a> {
    pub fn new(engine: &'a WizardEngine, input: &'a InputHandler) -> Self {
        let question = engine.current_question();
        let rows = engine
            .catalog()
            .questions()
            .iter()
            .enumerate()
            .map(|(index, q)| {
                let value = engine.displayed_answer(index).unwrap_or_default();
                AnswerRow {
                    id: q.id,
                    value: display_value(q.kind, value),
                    current: question.is_some() && index == engine.cursor(),
                }
            })
            .collect();

        let input_text = match question {
            Some(q) => display_value(q.kind, input.buffer()),
            None => String::new(),
        };

        Self {
            rows,
            mode: engine.mode(),
            cursor: engine.cursor(),
            total: engine.catalog().len(),
            question,
            selection: engine.selection(),
            input: input_text,
            error: engine.pending_error(),
            hints: input.bindings().get_nav_items(KeyContext::for_engine(engine)),
        }
    }

    /// Completed share for the progress gauge, in `0.0..=1.0`
    pub fn progress_ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.cursor.min(self.total) as f64) / (self.total as f64)
    }

    pub fn progress_label(&self) -> String {
        format!("{}/{}", self.cursor.min(self.total), self.total)
    }
}

fn display_value(kind: QuestionKind, value: &str) -> String {
    match kind {
        QuestionKind::Secret => mask(value),
        _ => value.to_string(),
    }
}

/// Render one frame
pub fn render(f: &mut Frame, view: &WizardView) {
    f.render_widget(Block::default().style(Styles::base()), f.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(UiConstants::HEADER_HEIGHT),
            Constraint::Min(5),
            Constraint::Length(UiConstants::FOOTER_HEIGHT),
        ])
        .split(f.area());

    header::render_header(f, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(UiConstants::ANSWERS_WIDTH_PCT),
            Constraint::Percentage(100 - UiConstants::ANSWERS_WIDTH_PCT),
        ])
        .split(rows[1]);

    screens::render_answers(f, columns[0], view);
    match view.mode {
        Mode::Answering => screens::render_question(f, columns[1], view),
        Mode::Confirming | Mode::Terminated(_) => screens::render_review(f, columns[1], view),
    }

    header::render_footer(f, rows[2], view);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Question, QuestionRole};
    use crate::engine::Event;
    use crate::validators::Validator;
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Question::text("HOSTNAME", "Enter hostname:").with_default("archlinux"),
            Question::secret("PASSWORD", "Enter password:"),
            Question::secret("CONFIRM_PASSWORD", "Confirm password:")
                .with_validator(Validator::Matches("PASSWORD"))
                .with_role(QuestionRole::Confirms("PASSWORD")),
            Question::select("SHELL", "Select shell:", ["bash", "zsh"]),
        ])
        .expect("valid catalog")
    }

    fn buffer_text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut text = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn draw(engine: &WizardEngine, input: &mut InputHandler) -> String {
        input.sync(engine);
        let view = WizardView::new(engine, input);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &view)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_renders_prompt_and_answers() {
        let engine = WizardEngine::new(catalog());
        let mut input = InputHandler::new();
        let text = draw(&engine, &mut input);

        assert!(text.contains("Enter hostname:"));
        assert!(text.contains("HOSTNAME"));
        assert!(text.contains("archlinux"));
        assert!(text.contains("0/4"));
    }

    #[test]
    fn test_secrets_are_masked() {
        let mut engine = WizardEngine::new(catalog());
        engine.apply(Event::TextSubmit("archlinux".into()));
        engine.apply(Event::TextSubmit("hunter22".into()));
        let mut input = InputHandler::new();
        let text = draw(&engine, &mut input);

        assert!(!text.contains("hunter22"));
        assert!(text.contains("********"));
        assert!(text.contains("Confirm password:"));
    }

    #[test]
    fn test_pending_error_shown() {
        let mut engine = WizardEngine::new(catalog());
        engine.apply(Event::TextSubmit("archlinux".into()));
        engine.apply(Event::TextSubmit("hunter22".into()));
        engine.apply(Event::TextSubmit("other".into()));
        let mut input = InputHandler::new();
        let text = draw(&engine, &mut input);

        assert!(text.contains("passwords do not match"));
        assert!(text.contains("Enter password:"));
    }

    #[test]
    fn test_select_and_review_panels() {
        let mut engine = WizardEngine::new(catalog());
        engine.apply(Event::TextSubmit("archlinux".into()));
        engine.apply(Event::TextSubmit("hunter22".into()));
        engine.apply(Event::TextSubmit("hunter22".into()));
        let mut input = InputHandler::new();
        let text = draw(&engine, &mut input);
        assert!(text.contains("zsh"));
        assert!(text.contains("Select shell:"));

        engine.apply(Event::SelectConfirm);
        let text = draw(&engine, &mut input);
        assert!(text.contains("Save these answers?"));
        assert!(text.contains("4/4"));
    }

    #[test]
    fn test_view_progress() {
        let engine = WizardEngine::new(Catalog::new(Vec::new()).expect("valid"));
        let input = InputHandler::new();
        let view = WizardView::new(&engine, &input);
        assert_eq!(view.progress_ratio(), 1.0);
        assert_eq!(view.progress_label(), "0/0");
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let engine = WizardEngine::new(catalog());
        let input = InputHandler::new();
        let view = WizardView::new(&engine, &input);
        let mut terminal = Terminal::new(TestBackend::new(10, 4)).unwrap();
        terminal.draw(|f| render(f, &view)).unwrap();
    }
}
