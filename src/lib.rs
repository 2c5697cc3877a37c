//! ArchWizard Library
//!
//! Question-and-answer wizard that collects Arch Linux install settings,
//! saves them as TOML and hands them to the install script.

pub mod answers;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod components;
pub mod config;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod hardware;
pub mod input;
pub mod installer;
pub mod process_guard;
pub mod script_traits;
pub mod theme;
pub mod ui;
pub mod validators;

// Re-export main types for convenience
pub use answers::{AnswerStore, Answers};
pub use app::{App, Outcome};
pub use catalog::{Catalog, Projection, Question, QuestionKind, QuestionRole};
pub use config::Settings;
pub use config_file::{FileGateway, PersistenceError, PersistenceGateway, WizardConfig};
pub use engine::storage::StorageLayout;
pub use engine::{Effect, Event, Mode, Termination, WizardEngine};
pub use error::{Result, WizardError};
pub use hardware::{CpuInfo, CpuVendor, Environment, HardwareProbe, SystemProbe};
pub use process_guard::{ChildRegistry, ProcessGuard, SpawnInGroup, TrackedChild};
pub use script_traits::ScriptArgs;
pub use validators::{ValidationError, Validator};
