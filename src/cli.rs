use clap::Parser;
use std::path::PathBuf;

/// ArchWizard - question-and-answer setup for the Arch Linux install script
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "archwizard")]
#[command(about = "Collects Arch Linux install settings and runs the install script")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: forwarded to install.sh as --dry-run.
    ///
    /// The wizard itself still saves the answers file; only the install script
    /// is expected to skip destructive steps.
    #[arg(short, long)]
    pub dry_run: bool,

    /// Verbose output: forwarded to install.sh and raises the log level to debug
    #[arg(short, long)]
    pub verbose: bool,

    /// Answers file: prior answers are loaded from here and the final ones saved here
    #[arg(long, default_value = "arch_config.toml")]
    pub config: PathBuf,

    /// Snapshot written when every question has been answered
    #[arg(long, default_value = "saved_answers.toml")]
    pub snapshot: PathBuf,

    /// Directory holding install.sh and scripts/
    #[arg(long, default_value = "install")]
    pub install_dir: PathBuf,

    /// Log file (the terminal belongs to the wizard)
    #[arg(long, default_value = "archwizard.log")]
    pub log_file: PathBuf,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
