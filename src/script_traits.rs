//! Typed script argument contracts.
//!
//! Scripts launched by the wizard receive their inputs as CLI flags plus
//! environment variables. Instead of assembling raw string vectors at the call
//! site, an args struct implements [`ScriptArgs`] and the runner consumes it.
//!
//! # Contract
//!
//! - `to_cli_args()`: flags exactly as the script's argument parser expects
//! - `get_env_vars()`: the script's environment contract (answers, paths)
//! - `script_name()`: file name only; the runner resolves the directory
//!
//! Environment values may contain secrets. Runners log the keys, never the
//! values.
pub trait ScriptArgs {
    /// CLI arguments, e.g. `["--dry-run", "--verbose"]`
    fn to_cli_args(&self) -> Vec<String>;

    /// Environment variables the script reads, e.g. `[("HOSTNAME", "archlinux")]`
    fn get_env_vars(&self) -> Vec<(String, String)>;

    /// Script file name, e.g. `install.sh`
    fn script_name(&self) -> &'static str;

    /// Environment variable names only, safe to log
    fn env_keys(&self) -> Vec<String> {
        self.get_env_vars().into_iter().map(|(key, _)| key).collect()
    }
}
