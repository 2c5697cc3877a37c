//! Child process lifecycle for the install script
//!
//! The installer subprocess must not outlive the wizard. If the wizard is
//! interrupted while `install.sh` is partitioning a disk, the script and
//! everything it spawned have to stop too.
//!
//! The script is spawned as leader of its own process group
//! ([`SpawnInGroup::own_process_group`]) and tracked in the global
//! [`ChildRegistry`] through a [`TrackedChild`] handle. A signal to the wizard,
//! or dropping the [`ProcessGuard`] held by `main`, stops every tracked group:
//! SIGTERM first, SIGKILL for whatever is left after the grace period.

use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Grace period between SIGTERM and SIGKILL on normal shutdown
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Shorter grace period used from the signal handler
pub const SIGNAL_GRACE: Duration = Duration::from_secs(3);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

static REGISTRY: OnceLock<Mutex<ChildRegistry>> = OnceLock::new();

/// What [`ChildRegistry::stop_all`] had to do
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StopReport {
    /// Groups that exited within the grace period
    pub terminated: Vec<u32>,
    /// Groups that needed SIGKILL
    pub killed: Vec<u32>,
}

/// Running children by process-group id, with a label for the logs
#[derive(Debug, Default)]
pub struct ChildRegistry {
    groups: BTreeMap<u32, String>,
    stopped: bool,
}

impl ChildRegistry {
    /// Lock the process-wide registry, recovering from a poisoned lock
    pub fn global() -> MutexGuard<'static, ChildRegistry> {
        REGISTRY
            .get_or_init(|| Mutex::new(ChildRegistry::default()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Track `pid` in the global registry until the returned handle drops
    pub fn track(pid: u32, label: impl Into<String>) -> TrackedChild {
        Self::global().insert(pid, label);
        TrackedChild { pid }
    }

    pub fn insert(&mut self, pid: u32, label: impl Into<String>) {
        let label = label.into();
        debug!("Tracking {} as process group {}", label, pid);
        self.groups.insert(pid, label);
    }

    pub fn remove(&mut self, pid: u32) -> Option<String> {
        let label = self.groups.remove(&pid);
        if let Some(label) = &label {
            debug!("{} (group {}) no longer tracked", label, pid);
        }
        label
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Stop every tracked group.
    ///
    /// Only the first call does anything; later calls return an empty report.
    pub fn stop_all(&mut self, grace: Duration) -> StopReport {
        let mut report = StopReport::default();
        if std::mem::replace(&mut self.stopped, true) || self.groups.is_empty() {
            return report;
        }

        let groups = std::mem::take(&mut self.groups);
        info!("Stopping {} child process group(s)", groups.len());
        for (&pgid, label) in &groups {
            signal_group(pgid, Signal::SIGTERM, label);
        }

        let mut pending: Vec<u32> = groups.keys().copied().collect();
        let deadline = Instant::now() + grace;
        loop {
            pending.retain(|&pgid| {
                let alive = is_running(pgid);
                if !alive {
                    report.terminated.push(pgid);
                }
                alive
            });
            if pending.is_empty() || Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        for pgid in pending {
            let label = groups.get(&pgid).map_or("child", String::as_str);
            warn!("{} (group {}) ignored SIGTERM, sending SIGKILL", label, pgid);
            signal_group(pgid, Signal::SIGKILL, label);
            report.killed.push(pgid);
        }
        report
    }
}

/// Removes its pid from the global registry when dropped
#[derive(Debug)]
pub struct TrackedChild {
    pid: u32,
}

impl TrackedChild {
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for TrackedChild {
    fn drop(&mut self) {
        ChildRegistry::global().remove(self.pid);
    }
}

fn as_pid(pid: u32) -> Pid {
    Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX))
}

/// Signal the whole group, falling back to the leader alone
fn signal_group(pgid: u32, sig: Signal, label: &str) {
    let group = Pid::from_raw(-as_pid(pgid).as_raw());
    if let Err(group_err) = signal::kill(group, sig) {
        if let Err(e) = signal::kill(as_pid(pgid), sig) {
            error!("{} to {} (group {}) failed: {} / {}", sig, label, pgid, group_err, e);
        }
    }
}

/// State letter from `/proc/<pid>/stat`, `None` when the process is gone
fn process_state(pid: u32) -> Option<char> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    // The command name may contain spaces; the state follows its closing paren
    let (_, rest) = stat.rsplit_once(')')?;
    rest.trim_start().chars().next()
}

/// Present and neither zombie nor dead
fn is_running(pid: u32) -> bool {
    if signal::kill(as_pid(pid), None).is_err() {
        return false;
    }
    !matches!(process_state(pid), Some('Z' | 'X'))
}

/// Stops every tracked child when dropped. Held by `main` for the whole run.
#[derive(Debug, Default)]
pub struct ProcessGuard;

impl ProcessGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn tracked(&self) -> usize {
        ChildRegistry::global().len()
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        let report = ChildRegistry::global().stop_all(SHUTDOWN_GRACE);
        if !report.killed.is_empty() {
            warn!("Killed {} child group(s) on shutdown", report.killed.len());
        }
    }
}

fn signal_name(sig: i32) -> &'static str {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    match sig {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        _ => "signal",
    }
}

/// Watch SIGINT, SIGTERM and SIGHUP on a background thread. The first one
/// stops tracked children and exits with `128 + signal`.
///
/// In raw mode Ctrl+C reaches the wizard as a key event, so in practice this
/// fires while the installer runs.
pub fn init_signal_handlers() -> std::io::Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
    std::thread::Builder::new()
        .name("signal-watch".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("Received {}, stopping installer", signal_name(sig));
                ChildRegistry::global().stop_all(SIGNAL_GRACE);
                std::process::exit(128 + sig);
            }
        })?;
    Ok(())
}

/// `Command` extension: make the child lead a new process group and die
/// with the wizard
pub trait SpawnInGroup {
    fn own_process_group(&mut self) -> &mut Self;
}

impl SpawnInGroup for std::process::Command {
    fn own_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: setpgid and prctl are async-signal-safe
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::other)?;
                // Covers the wizard being SIGKILLed, where no handler runs
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) != 0 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
        self
    }
}
