//! Wizard engine: the question-flow state machine.
//!
//! The engine walks the catalog one question at a time, applies input events
//! according to each question's kind, runs validators, propagates derived
//! answers and drives the final confirm/edit/quit cycle.
//!
//! # State Flow
//!
//! ```text
//! Answering(0) -> Answering(1) -> ... -> Answering(len-1)
//!       ^                                      |
//!       |  ConfirmReject                       v  (emits PersistSnapshot)
//!       +------------------------------- Confirming
//!                                              |
//!                     ConfirmAccept            |           Quit (from anywhere)
//!            (emits PersistFinal)              v
//!                                   Terminated(Saved | Quit)
//! ```
//!
//! The engine never performs I/O. Persistence is requested through the
//! returned [`Effect`]s; the caller executes them and reports failures back
//! with [`WizardEngine::report_persistence_failure`].

pub mod storage;

use crate::answers::{AnswerStore, Answers};
use crate::catalog::{Catalog, Question, QuestionKind, QuestionRole};
use crate::error::WizardError;
use storage::StorageLayout;
use tracing::{debug, info, warn};

/// Input accepted by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Submit typed text for a Text/Secret question
    TextSubmit(String),
    /// Move the Select highlight by `delta` (clamped to the option list)
    SelectMove(isize),
    /// Choose the highlighted Select option
    SelectConfirm,
    /// Answer a YesNo question
    YesNoChoice(bool),
    /// Save the reviewed answers
    ConfirmAccept,
    /// Go back and edit from the first question
    ConfirmReject,
    /// Leave without saving
    Quit,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Save the answers collected so far (entering confirmation)
    PersistSnapshot(Answers),
    /// Save the accepted answers as the final configuration
    PersistFinal(Answers),
}

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Saved,
    Quit,
}

/// Engine mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Answering,
    Confirming,
    Terminated(Termination),
}

impl Mode {
    pub fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

/// Owns the wizard state and the answer store for one run.
#[derive(Debug, Clone)]
pub struct WizardEngine {
    catalog: Catalog,
    store: AnswerStore,
    /// Displayed answer per catalog index
    displayed: Vec<String>,
    cursor: usize,
    mode: Mode,
    pending_error: Option<String>,
    /// Highlighted option, meaningful only while the cursor is on a Select
    selection: usize,
}

impl WizardEngine {
    /// Start a run at the first question.
    ///
    /// Displayed answers start from each question's default.
    pub fn new(catalog: Catalog) -> Self {
        let displayed = catalog.questions().iter().map(|q| q.default.clone()).collect();
        let mode = if catalog.is_empty() {
            Mode::Confirming
        } else {
            Mode::Answering
        };

        let mut engine = Self {
            catalog,
            store: AnswerStore::new(),
            displayed,
            cursor: 0,
            mode,
            pending_error: None,
            selection: 0,
        };
        engine.prepare_question();
        engine
    }

    /// Apply one input event and return the effects to execute.
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        debug!(
            "apply {:?} (cursor={}, mode={:?})",
            redact(&event),
            self.cursor,
            self.mode
        );

        match self.mode {
            Mode::Terminated(_) => {
                debug!("Ignoring event after termination");
                Vec::new()
            }
            _ if event == Event::Quit => {
                info!("Wizard quit at question {}", self.cursor);
                self.pending_error = None;
                self.mode = Mode::Terminated(Termination::Quit);
                Vec::new()
            }
            Mode::Answering => self.apply_answering(event),
            Mode::Confirming => self.apply_confirming(event),
        }
    }

    /// Surface a failed persistence effect without changing the flow
    pub fn report_persistence_failure(&mut self, message: impl AsRef<str>) {
        warn!("Persistence failure reported: {}", message.as_ref());
        self.pending_error = Some(format!("Error saving answers: {}", message.as_ref()));
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.store
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn pending_error(&self) -> Option<&str> {
        self.pending_error.as_deref()
    }

    /// Question under the cursor, `None` once every question is answered
    pub fn current_question(&self) -> Option<&Question> {
        match self.mode {
            Mode::Answering => self.catalog.get(self.cursor),
            _ => None,
        }
    }

    /// Displayed answer of the question at `index`
    pub fn displayed_answer(&self, index: usize) -> Option<&str> {
        self.displayed.get(index).map(String::as_str)
    }

    /// Displayed answers in catalog order
    pub fn displayed_answers(&self) -> &[String] {
        &self.displayed
    }

    pub fn termination(&self) -> Option<Termination> {
        match self.mode {
            Mode::Terminated(reason) => Some(reason),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Answering
    // ------------------------------------------------------------------------

    fn apply_answering(&mut self, event: Event) -> Vec<Effect> {
        let Some(kind) = self.catalog.get(self.cursor).map(|q| q.kind) else {
            return self.enter_confirming();
        };

        match (kind, event) {
            (QuestionKind::Text | QuestionKind::Secret, Event::TextSubmit(raw)) => {
                self.submit_text(raw)
            }
            (QuestionKind::YesNo, Event::YesNoChoice(choice)) => {
                let value = if choice { "true" } else { "false" };
                self.record(value.to_string());
                self.advance()
            }
            (QuestionKind::Select, Event::SelectMove(delta)) => {
                self.move_selection(delta);
                Vec::new()
            }
            (QuestionKind::Select, Event::SelectConfirm) => self.confirm_selection(),
            (kind, event) => {
                debug!("Ignoring {:?} for {} question", redact(&event), kind);
                Vec::new()
            }
        }
    }

    fn submit_text(&mut self, raw: String) -> Vec<Effect> {
        let question = &self.catalog.questions()[self.cursor];
        let id = question.id;
        let confirms = question.confirms();

        if let Some(validator) = &question.validator {
            if let Err(err) = validator
                .validate(&raw, self.store.snapshot())
                .map_err(WizardError::from)
            {
                warn!("Validation failed for {}: {}", id, err);
                self.pending_error = Some(err.to_string());
                if let Some(source) = confirms.filter(|s| err.mismatch_source() == Some(*s)) {
                    self.rewind_to_source(source, id);
                }
                return Vec::new();
            }
        }

        self.record(raw);
        if confirms.is_some() {
            // Transient check: neither persisted nor kept on screen
            self.store.delete(id);
            self.displayed[self.cursor].clear();
        }
        self.advance()
    }

    /// Fail closed: clear both fields and make the user re-enter the source
    fn rewind_to_source(&mut self, source: &'static str, confirm_id: &'static str) {
        for id in [source, confirm_id] {
            self.store.delete(id);
            if let Some(index) = self.catalog.index_of(id) {
                self.displayed[index].clear();
            }
        }
        if let Some(index) = self.catalog.index_of(source) {
            info!("Confirmation mismatch, rewinding to {}", source);
            self.cursor = index;
            self.prepare_question();
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self
            .catalog
            .get(self.cursor)
            .map(|q| q.options.len())
            .unwrap_or(0);
        let max = len.saturating_sub(1);
        let target = if delta < 0 {
            self.selection.saturating_sub(delta.unsigned_abs())
        } else {
            self.selection.saturating_add(delta.unsigned_abs())
        };
        self.selection = target.min(max);
    }

    fn confirm_selection(&mut self) -> Vec<Effect> {
        let question = &self.catalog.questions()[self.cursor];
        let role = question.role;
        let Some(value) = question.projected_option(self.selection).map(str::to_string) else {
            return Vec::new();
        };

        self.record(value.clone());
        if role == QuestionRole::InstallTarget {
            self.derive_storage(&value);
        }
        self.advance()
    }

    /// Write the derived storage answers and refresh what is displayed
    fn derive_storage(&mut self, device: &str) {
        let layout = StorageLayout::for_device(device);
        let changed = self.store.apply_derived(layout.to_answers());
        info!("Derived storage layout {}", layout);
        if !changed.is_empty() {
            debug!("Derived answers changed: {:?}", changed);
        }

        for (index, question) in self.catalog.questions().iter().enumerate() {
            if let Some(value) = self.store.get(question.id) {
                self.displayed[index] = value.to_string();
            }
        }
    }

    /// Store `value` as the answer of the current question
    fn record(&mut self, value: String) {
        let id = self.catalog.questions()[self.cursor].id;
        self.pending_error = None;
        self.displayed[self.cursor] = value.clone();
        self.store.set(id, value);
    }

    fn advance(&mut self) -> Vec<Effect> {
        self.cursor += 1;
        if self.cursor >= self.catalog.len() {
            return self.enter_confirming();
        }
        self.prepare_question();
        Vec::new()
    }

    fn enter_confirming(&mut self) -> Vec<Effect> {
        self.cursor = self.catalog.len();
        self.mode = Mode::Confirming;
        info!("All {} questions answered, awaiting confirmation", self.catalog.len());
        vec![Effect::PersistSnapshot(self.store.to_answers())]
    }

    /// Reset per-question state for the question under the cursor
    fn prepare_question(&mut self) {
        self.selection = self
            .catalog
            .get(self.cursor)
            .filter(|q| q.kind == QuestionKind::Select)
            .and_then(|q| q.option_index(&self.displayed[self.cursor]))
            .unwrap_or(0);
    }

    // ------------------------------------------------------------------------
    // Confirming
    // ------------------------------------------------------------------------

    fn apply_confirming(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::ConfirmAccept => {
                info!("Answers accepted, saving configuration");
                self.mode = Mode::Terminated(Termination::Saved);
                vec![Effect::PersistFinal(self.store.to_answers())]
            }
            Event::ConfirmReject => {
                info!("Answers rejected, returning to first question");
                self.cursor = 0;
                self.mode = if self.catalog.is_empty() {
                    Mode::Confirming
                } else {
                    Mode::Answering
                };
                self.pending_error = None;
                self.prepare_question();
                Vec::new()
            }
            other => {
                debug!("Ignoring {:?} while confirming", redact(&other));
                Vec::new()
            }
        }
    }
}

/// Keep typed text (possibly a password) out of the logs
fn redact(event: &Event) -> Event {
    match event {
        Event::TextSubmit(raw) => Event::TextSubmit(format!("<{} chars>", raw.chars().count())),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Projection, Question};
    use crate::validators::Validator;

    fn small_catalog() -> Catalog {
        Catalog::new(vec![
            Question::text("NAME", "Name:").with_validator(Validator::Username),
            Question::secret("PW", "Password:").with_validator(Validator::Password),
            Question::secret("PW2", "Again:")
                .with_validator(Validator::Matches("PW"))
                .with_role(QuestionRole::Confirms("PW")),
            Question::select("DISK", "Disk:", ["/dev/sda (1T)", "/dev/nvme0n1 (2T)"])
                .with_role(QuestionRole::InstallTarget)
                .with_projection(Projection::FirstToken),
            Question::yes_no("GO", "Run?"),
        ])
        .expect("valid catalog")
    }

    #[test]
    fn test_new_starts_answering_at_zero() {
        let engine = WizardEngine::new(small_catalog());
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.mode(), Mode::Answering);
        assert!(engine.answers().is_empty());
        assert!(engine.pending_error().is_none());
    }

    #[test]
    fn test_invalid_text_keeps_cursor_and_store() {
        let mut engine = WizardEngine::new(small_catalog());
        let effects = engine.apply(Event::TextSubmit("ab".into()));
        assert!(effects.is_empty());
        assert_eq!(engine.cursor(), 0);
        assert!(engine.answers().is_empty());
        assert_eq!(
            engine.pending_error(),
            Some("username must be at least 3 characters long")
        );
    }

    #[test]
    fn test_valid_text_stores_and_advances() {
        let mut engine = WizardEngine::new(small_catalog());
        engine.apply(Event::TextSubmit("arch".into()));
        assert_eq!(engine.cursor(), 1);
        assert_eq!(engine.answers().get("NAME"), Some("arch"));
        assert_eq!(engine.displayed_answer(0), Some("arch"));
    }

    #[test]
    fn test_success_clears_pending_error() {
        let mut engine = WizardEngine::new(small_catalog());
        engine.apply(Event::TextSubmit("a".into()));
        assert!(engine.pending_error().is_some());
        engine.apply(Event::TextSubmit("arch".into()));
        assert!(engine.pending_error().is_none());
    }

    #[test]
    fn test_confirm_field_is_not_stored() {
        let mut engine = WizardEngine::new(small_catalog());
        engine.apply(Event::TextSubmit("arch".into()));
        engine.apply(Event::TextSubmit("abcdefgh".into()));
        engine.apply(Event::TextSubmit("abcdefgh".into()));
        assert_eq!(engine.cursor(), 3);
        assert_eq!(engine.answers().get("PW"), Some("abcdefgh"));
        assert!(!engine.answers().contains("PW2"));
        assert_eq!(engine.displayed_answer(2), Some(""));
    }

    #[test]
    fn test_mismatch_rewinds_and_clears_both() {
        let mut engine = WizardEngine::new(small_catalog());
        engine.apply(Event::TextSubmit("arch".into()));
        engine.apply(Event::TextSubmit("abcdefgh".into()));
        engine.apply(Event::TextSubmit("mismatch1".into()));

        assert_eq!(engine.cursor(), 1);
        assert!(!engine.answers().contains("PW"));
        assert!(!engine.answers().contains("PW2"));
        assert_eq!(engine.displayed_answer(1), Some(""));
        assert_eq!(engine.pending_error(), Some("passwords do not match"));
    }

    #[test]
    fn test_select_move_is_clamped() {
        let mut engine = WizardEngine::new(small_catalog());
        engine.apply(Event::TextSubmit("arch".into()));
        engine.apply(Event::TextSubmit("abcdefgh".into()));
        engine.apply(Event::TextSubmit("abcdefgh".into()));

        engine.apply(Event::SelectMove(-5));
        assert_eq!(engine.selection(), 0);
        engine.apply(Event::SelectMove(10));
        assert_eq!(engine.selection(), 1);
        engine.apply(Event::SelectMove(isize::MIN));
        assert_eq!(engine.selection(), 0);
    }

    #[test]
    fn test_install_target_derives_layout() {
        let mut engine = WizardEngine::new(small_catalog());
        engine.apply(Event::TextSubmit("arch".into()));
        engine.apply(Event::TextSubmit("abcdefgh".into()));
        engine.apply(Event::TextSubmit("abcdefgh".into()));
        engine.apply(Event::SelectMove(1));
        engine.apply(Event::SelectConfirm);

        let answers = engine.answers();
        assert_eq!(answers.get("DISK"), Some("/dev/nvme0n1"));
        assert_eq!(answers.get("PARTITION_EFI"), Some("/dev/nvme0n1p2"));
        assert_eq!(
            answers.get("MOUNT_OPTIONS"),
            Some("noatime,compress=zstd,ssd,commit=120")
        );
        assert_eq!(engine.cursor(), 4);
    }

    #[test]
    fn test_mismatched_event_kind_is_ignored() {
        let mut engine = WizardEngine::new(small_catalog());
        assert!(engine.apply(Event::YesNoChoice(true)).is_empty());
        assert!(engine.apply(Event::SelectConfirm).is_empty());
        assert!(engine.apply(Event::ConfirmAccept).is_empty());
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.mode(), Mode::Answering);
    }

    #[test]
    fn test_yes_no_then_confirming_emits_snapshot() {
        let mut engine = WizardEngine::new(small_catalog());
        engine.apply(Event::TextSubmit("arch".into()));
        engine.apply(Event::TextSubmit("abcdefgh".into()));
        engine.apply(Event::TextSubmit("abcdefgh".into()));
        engine.apply(Event::SelectConfirm);
        let effects = engine.apply(Event::YesNoChoice(false));

        assert_eq!(engine.mode(), Mode::Confirming);
        assert_eq!(engine.cursor(), 5);
        assert!(engine.current_question().is_none());
        match effects.as_slice() {
            [Effect::PersistSnapshot(answers)] => {
                assert_eq!(answers.get("GO").map(String::as_str), Some("false"));
            }
            other => panic!("unexpected effects {:?}", other),
        }
    }

    #[test]
    fn test_quit_preempts_pending_error() {
        let mut engine = WizardEngine::new(small_catalog());
        engine.apply(Event::TextSubmit("x".into()));
        let effects = engine.apply(Event::Quit);
        assert!(effects.is_empty());
        assert_eq!(engine.termination(), Some(Termination::Quit));
        assert!(engine.pending_error().is_none());
        assert!(engine.apply(Event::TextSubmit("arch".into())).is_empty());
    }

    #[test]
    fn test_persistence_failure_does_not_change_mode() {
        let catalog = Catalog::new(vec![Question::yes_no("GO", "Run?")]).expect("valid");
        let mut engine = WizardEngine::new(catalog);
        engine.apply(Event::YesNoChoice(true));
        engine.report_persistence_failure("disk full");
        assert_eq!(engine.mode(), Mode::Confirming);
        assert_eq!(engine.pending_error(), Some("Error saving answers: disk full"));
    }

    #[test]
    fn test_empty_catalog_starts_confirming() {
        let engine = WizardEngine::new(Catalog::new(Vec::new()).expect("valid"));
        assert_eq!(engine.mode(), Mode::Confirming);
        assert_eq!(engine.cursor(), 0);
    }

    #[test]
    fn test_redact_hides_text() {
        assert_eq!(
            redact(&Event::TextSubmit("hunter22".into())),
            Event::TextSubmit("<8 chars>".into())
        );
        assert_eq!(redact(&Event::Quit), Event::Quit);
    }
}
