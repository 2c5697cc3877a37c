//! Installer invocation
//!
//! Hands the accepted answers to `install.sh`. Every answer becomes an
//! environment variable (`KEY=value`), alongside the paths the script needs to
//! find its helpers and the persisted answers file. The script's stdout and
//! stderr go straight to the terminal; the wizard does not inspect them.

use crate::answers::Answers;
use crate::config::Settings;
use crate::error::{Result, WizardError};
use crate::process_guard::{ChildRegistry, SpawnInGroup};
use crate::script_traits::ScriptArgs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{error, info};

/// Prompt shown before the install script starts
pub const LAUNCH_PROMPT: &str = "Press Enter to continue or Ctrl+C to cancel...";

/// Arguments for `install.sh`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallScriptArgs {
    pub answers: Answers,
    /// Directory holding `install.sh` (exported as `ARCH_DIR`)
    pub arch_dir: PathBuf,
    /// Helper scripts directory (exported as `SCRIPTS_DIR`)
    pub scripts_dir: PathBuf,
    /// Persisted answers file (exported as `CONFIG_FILE`)
    pub config_file: PathBuf,
    pub dry_run: bool,
    pub verbose: bool,
}

impl InstallScriptArgs {
    pub fn new(answers: Answers, settings: &Settings) -> Self {
        Self {
            answers,
            arch_dir: settings.install_dir.clone(),
            scripts_dir: settings.scripts_dir(),
            config_file: settings.install_config_path(),
            dry_run: settings.dry_run,
            verbose: settings.verbose,
        }
    }
}

impl ScriptArgs for InstallScriptArgs {
    fn to_cli_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.dry_run {
            args.push("--dry-run".to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        args
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        let mut env: Vec<(String, String)> = self
            .answers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.push(("ARCH_DIR".to_string(), self.arch_dir.display().to_string()));
        env.push(("SCRIPTS_DIR".to_string(), self.scripts_dir.display().to_string()));
        env.push(("CONFIG_FILE".to_string(), self.config_file.display().to_string()));
        env
    }

    fn script_name(&self) -> &'static str {
        "install.sh"
    }
}

/// Print [`LAUNCH_PROMPT`] and wait for a line on `input`.
///
/// Returns `false` when input is closed before a line arrives.
pub fn confirm_launch<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> std::io::Result<bool> {
    write!(output, "{} ", LAUNCH_PROMPT)?;
    output.flush()?;
    let mut line = String::new();
    Ok(input.read_line(&mut line)? > 0)
}

/// Run `<dir>/<script_name>` with bash and wait for it.
///
/// The child runs in its own process group and is tracked by the global
/// [`ChildRegistry`] so a signal to the wizard stops it too. A spawn failure
/// or a non-zero exit is a [`WizardError::ProcessLaunch`].
pub fn run<T: ScriptArgs>(args: &T, dir: &Path) -> Result<()> {
    let script_path = dir.join(args.script_name());
    if !script_path.is_file() {
        return Err(WizardError::process_launch(format!(
            "install script not found at {}",
            script_path.display()
        )));
    }

    let cli_args = args.to_cli_args();
    info!(
        "Launching {} args={:?} env_keys={:?}",
        script_path.display(),
        cli_args,
        args.env_keys()
    );

    let mut cmd = Command::new("bash");
    cmd.arg(&script_path)
        .args(&cli_args)
        .envs(args.get_env_vars())
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .own_process_group();

    let mut child = cmd.spawn().map_err(|e| {
        WizardError::process_launch(format!("failed to start {}: {}", script_path.display(), e))
    })?;
    let tracked = ChildRegistry::track(child.id(), args.script_name());
    let status = child.wait();
    drop(tracked);

    let status = status.map_err(|e| {
        WizardError::process_launch(format!("failed waiting for {}: {}", script_path.display(), e))
    })?;

    if status.success() {
        info!("{} completed successfully", args.script_name());
        Ok(())
    } else {
        let code = status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        error!("{} exited with {}", args.script_name(), code);
        Err(WizardError::process_launch(format!(
            "{} exited with status {}",
            args.script_name(),
            code
        )))
    }
}
