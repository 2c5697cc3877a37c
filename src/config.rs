//! Runtime settings
//!
//! Resolves the CLI surface into the concrete paths and flags used by the
//! rest of the wizard.

use crate::cli::Cli;
use std::path::PathBuf;

/// File name of the verified answers copy inside the install directory
pub const INSTALL_CONFIG_NAME: &str = "arch_config.toml";

/// Resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub install_dir: PathBuf,
    pub log_file: PathBuf,
    pub dry_run: bool,
    pub verbose: bool,
}

impl Settings {
    /// Copy of the final answers that the install script reads
    pub fn install_config_path(&self) -> PathBuf {
        self.install_dir.join(INSTALL_CONFIG_NAME)
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.install_dir.join("scripts")
    }

    pub fn install_script(&self) -> PathBuf {
        self.install_dir.join("install.sh")
    }

    /// Default log filter, overridden by `RUST_LOG`
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Self {
            config_path: cli.config.clone(),
            snapshot_path: cli.snapshot.clone(),
            install_dir: cli.install_dir.clone(),
            log_file: cli.log_file.clone(),
            dry_run: cli.dry_run,
            verbose: cli.verbose,
        }
    }
}
