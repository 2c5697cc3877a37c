//! Application module
//!
//! Owns the engine for one run and drives it: terminal events go through the
//! input handler, the resulting engine events are applied, the returned
//! effects are executed against the persistence gateway, and a fresh view is
//! rendered after every transition.

use crate::answers::Answers;
use crate::catalog::{HOSTNAME, INSTALL_DEVICE, LOCALE, TIMEZONE, USERNAME};
use crate::config_file::PersistenceGateway;
use crate::engine::{Effect, Event, Termination, WizardEngine};
use crate::error::{Result, WizardError};
use crate::input::InputHandler;
use crate::ui::{self, WizardView};
use crossterm::event::{self, KeyEvent};
use ratatui::{Terminal, backend::Backend};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How the run ended, handed back to `main`
#[derive(Debug)]
pub struct Outcome {
    pub termination: Termination,
    pub answers: Answers,
    /// Set when the final save failed
    pub save_error: Option<WizardError>,
}

/// Answers echoed after a successful save, as `(label, id)`
const SUMMARY_FIELDS: [(&str, &str); 5] = [
    ("Username", USERNAME),
    ("Hostname", HOSTNAME),
    ("Timezone", TIMEZONE),
    ("Locale", LOCALE),
    ("Install device", INSTALL_DEVICE),
];

impl Outcome {
    pub fn saved(&self) -> bool {
        self.termination == Termination::Saved && self.save_error.is_none()
    }

    /// Whether the saved answers ask for the install script to run
    pub fn auto_run(&self) -> bool {
        crate::config_file::auto_run(&self.answers)
    }

    /// Summary lines printed once the terminal is restored
    pub fn summary(&self) -> Vec<String> {
        SUMMARY_FIELDS
            .iter()
            .map(|(label, id)| {
                let value = self.answers.get(*id).map_or("(not set)", String::as_str);
                format!("{}: {}", label, value)
            })
            .collect()
    }
}

/// Main application struct
pub struct App<G: PersistenceGateway> {
    engine: WizardEngine,
    input: InputHandler,
    gateway: G,
    save_error: Option<WizardError>,
}

impl<G: PersistenceGateway> App<G> {
    pub fn new(engine: WizardEngine, gateway: G) -> Self {
        Self {
            engine,
            input: InputHandler::new(),
            gateway,
            save_error: None,
        }
    }

    pub fn engine(&self) -> &WizardEngine {
        &self.engine
    }

    pub fn is_finished(&self) -> bool {
        self.engine.mode().is_terminated()
    }

    /// Run until the engine terminates
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        info!("Starting wizard loop");

        loop {
            self.input.sync(&self.engine);
            let view = WizardView::new(&self.engine, &self.input);
            terminal.draw(|f| ui::render(f, &view))?;

            if self.is_finished() {
                break;
            }

            // Resize and other events only need the redraw above
            if event::poll(Duration::from_millis(250))? {
                if let event::Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }

        Ok(())
    }

    /// Feed one key press through the input handler
    pub fn handle_key(&mut self, key: KeyEvent) {
        if let Some(event) = self.input.handle_key(key, &self.engine) {
            self.dispatch(event);
        }
    }

    /// Apply `event` and execute the effects it produces
    pub fn dispatch(&mut self, event: Event) {
        for effect in self.engine.apply(event) {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::PersistSnapshot(answers) => {
                debug!("Saving snapshot of {} answers", answers.len());
                if let Err(e) = self.gateway.save_snapshot(&answers) {
                    warn!("Snapshot save failed: {}", e);
                    self.engine.report_persistence_failure(e.to_string());
                }
            }
            Effect::PersistFinal(answers) => {
                info!("Saving final answers");
                if let Err(e) = self.gateway.save_final(&answers) {
                    error!("Final save failed: {}", e);
                    self.engine.report_persistence_failure(e.to_string());
                    self.save_error = Some(e.into());
                }
            }
        }
    }

    /// Consume the app once the engine has terminated.
    ///
    /// Returns `None` while the run is still in progress.
    pub fn into_outcome(self) -> Option<Outcome> {
        let termination = self.engine.termination()?;
        Some(Outcome {
            termination,
            answers: self.engine.answers().to_answers(),
            save_error: self.save_error,
        })
    }
}
