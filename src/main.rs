//! ArchWizard - Main entry point
//!
//! Collects install settings through the terminal wizard, saves them, prints a
//! summary and, when asked to, runs the install script.

use anyhow::{Context, Result};
use archwizard::app::{App, Outcome};
use archwizard::catalog::Catalog;
use archwizard::cli::Cli;
use archwizard::config::Settings;
use archwizard::config_file::{FileGateway, PersistenceGateway};
use archwizard::engine::{Termination, WizardEngine};
use archwizard::hardware::{Environment, SystemProbe};
use archwizard::installer::{self, InstallScriptArgs};
use archwizard::process_guard::{self, ProcessGuard};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Log to a file: the terminal belongs to the wizard
fn init_logging(settings: &Settings) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
        .with_context(|| format!("Failed to open log file {}", settings.log_file.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let settings = Settings::from(&cli);

    if let Err(e) = init_logging(&settings) {
        eprintln!("Warning: {:#}", e);
    }
    info!("ArchWizard starting up");

    match run(&settings) {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<ExitCode> {
    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    let _guard = ProcessGuard::new();

    let gateway = FileGateway::from_settings(settings);
    let prior = match gateway.load() {
        Ok(answers) => {
            info!("Pre-filling from {}", settings.config_path.display());
            answers
        }
        Err(e) if e.is_not_found() => {
            debug!("{}", e);
            Default::default()
        }
        Err(e) => {
            warn!("Ignoring prior answers: {}", e);
            Default::default()
        }
    };

    let env = Environment::detect(&SystemProbe);
    let catalog = Catalog::build(&prior, &env).context("Failed to build question catalog")?;
    let engine = WizardEngine::new(catalog);

    let outcome = run_wizard(App::new(engine, gateway))?;
    Ok(finish(settings, outcome))
}

/// Run the wizard in the alternate screen, restoring the terminal on every path
fn run_wizard(mut app: App<FileGateway>) -> Result<Outcome> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut out = stdout();
    if let Err(e) = execute!(out, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e).context("Failed to enter alternate screen");
    }

    let result = Terminal::new(CrosstermBackend::new(out))
        .map_err(anyhow::Error::from)
        .and_then(|mut terminal| {
            app.run(&mut terminal)?;
            Ok(())
        });

    restore_terminal();
    result?;

    app.into_outcome()
        .context("Wizard loop ended before the run terminated")
}

fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        warn!("Failed to disable raw mode: {}", e);
    }
    if let Err(e) = execute!(stdout(), LeaveAlternateScreen) {
        warn!("Failed to leave alternate screen: {}", e);
    }
}

/// Report the outcome, launch the installer if requested, pick the exit code
fn finish(settings: &Settings, outcome: Outcome) -> ExitCode {
    if outcome.termination == Termination::Quit {
        info!("Wizard quit without saving");
        println!("Exited without saving.");
        return ExitCode::SUCCESS;
    }

    if let Some(e) = &outcome.save_error {
        error!("Configuration was not saved: {}", e);
        eprintln!("Error: configuration not saved: {}", e);
        return ExitCode::FAILURE;
    }

    println!("Configuration saved to {}", settings.config_path.display());
    for line in outcome.summary() {
        println!("  {}", line);
    }

    if !outcome.auto_run() {
        println!("Install script not started. Run it later with the saved configuration.");
        return ExitCode::SUCCESS;
    }

    match installer::confirm_launch(&mut io::stdin().lock(), &mut stdout()) {
        Ok(true) => {}
        Ok(false) => {
            info!("Input closed at launch prompt, installer not started");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            warn!("Launch prompt failed: {}", e);
            return ExitCode::SUCCESS;
        }
    }

    let args = InstallScriptArgs::new(outcome.answers, settings);
    match installer::run(&args, &settings.install_dir) {
        Ok(()) => println!("Installation script finished."),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
        }
    }
    ExitCode::SUCCESS
}
