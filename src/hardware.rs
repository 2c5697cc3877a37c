//! Hardware environment detection
//!
//! Lists install target drives and identifies the CPU vendor so the question
//! catalog can offer real drives and a sensible microcode default.
//!
//! # Design
//!
//! - **Never fails**: a probe that cannot run logs a warning and substitutes a
//!   fallback (a single synthetic drive, an unknown CPU)
//! - **Parse separately**: `lsblk`/`lscpu` output is parsed by pure functions so
//!   the parsing is testable without the tools installed
//! - **Behind a trait**: the catalog only sees `HardwareProbe`, so tests can
//!   supply fixed hardware

use crate::error::{Result, WizardError};
use std::fmt;
use std::process::Command;
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

/// Option offered when no drive could be detected
pub const FALLBACK_DRIVE: &str = "/dev/sda (Unknown size) Unknown model";

/// CPU vendor tag used to seed the microcode question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CpuVendor {
    Amd,
    Intel,
    #[default]
    Unknown,
}

impl CpuVendor {
    /// Map the `Vendor ID` field reported by lscpu
    pub fn from_vendor_id(vendor_id: &str) -> Self {
        if vendor_id.contains("AuthenticAMD") {
            Self::Amd
        } else if vendor_id.contains("GenuineIntel") {
            Self::Intel
        } else {
            Self::Unknown
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Detected CPU facts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuInfo {
    pub model: String,
    pub vendor: CpuVendor,
    pub microcode: String,
    pub logical_cpus: usize,
}

impl Default for CpuInfo {
    fn default() -> Self {
        Self {
            model: "Unknown".to_string(),
            vendor: CpuVendor::Unknown,
            microcode: "Unknown".to_string(),
            logical_cpus: 1,
        }
    }
}

impl fmt::Display for CpuInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (vendor: {}, microcode: {}, cpus: {})",
            self.model, self.vendor, self.microcode, self.logical_cpus
        )
    }
}

/// Source of hardware facts consumed before the catalog is built.
pub trait HardwareProbe {
    /// Drive display strings, e.g. `/dev/sda (500G - Samsung SSD)`.
    ///
    /// Must never be empty; implementations fall back to [`FALLBACK_DRIVE`].
    fn install_targets(&self) -> Vec<String>;

    /// CPU identification. Unknown fields stay at their defaults.
    fn cpu(&self) -> CpuInfo;
}

/// Probe backed by `lsblk`, `lscpu` and `/proc/cpuinfo`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl HardwareProbe for SystemProbe {
    fn install_targets(&self) -> Vec<String> {
        match run_capture("lsblk", &["-ndo", "NAME,SIZE,MODEL"]) {
            Ok(output) => {
                let drives = parse_lsblk(&output);
                if drives.is_empty() {
                    warn!("lsblk reported no drives, offering fallback entry");
                    vec![FALLBACK_DRIVE.to_string()]
                } else {
                    info!("Detected {} install target(s)", drives.len());
                    drives
                }
            }
            Err(e) => {
                warn!("{}, offering fallback entry", e);
                vec![FALLBACK_DRIVE.to_string()]
            }
        }
    }

    fn cpu(&self) -> CpuInfo {
        let mut cpu = match run_capture("lscpu", &[]) {
            Ok(output) => parse_lscpu(&output),
            Err(e) => {
                warn!("{}, CPU left unknown", e);
                CpuInfo::default()
            }
        };

        // lscpu on AMD often omits the microcode line
        if cpu.microcode == "Unknown" && cpu.vendor == CpuVendor::Amd {
            if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
                if let Some(rev) = parse_proc_microcode(&cpuinfo) {
                    cpu.microcode = rev;
                }
            }
        }

        cpu.logical_cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        info!("CPU detection: {}", cpu);
        cpu
    }
}

/// Run a read-only probe command and capture its stdout.
///
/// Failures are [`WizardError::DiscoveryDegraded`]; callers log them and fall
/// back.
fn run_capture(program: &str, args: &[&str]) -> Result<String> {
    debug!("Probing hardware: {} {:?}", program, args);
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| WizardError::discovery(format!("failed to run {}: {}", program, e)))?;
    if !output.status.success() {
        return Err(WizardError::discovery(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parse `lsblk -ndo NAME,SIZE,MODEL` into display strings.
///
/// Lines with fewer than two fields are skipped.
pub fn parse_lsblk(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 2 {
                return None;
            }
            let mut drive = format!("/dev/{} ({}", fields[0], fields[1]);
            if fields.len() >= 3 {
                drive.push_str(&format!(" - {}", fields[2..].join(" ")));
            }
            drive.push(')');
            Some(drive)
        })
        .collect()
}

/// Parse the `Model name`, `Vendor ID` and `Microcode` fields of lscpu output
pub fn parse_lscpu(output: &str) -> CpuInfo {
    let mut cpu = CpuInfo::default();
    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Model name" => cpu.model = value.to_string(),
            "Vendor ID" => cpu.vendor = CpuVendor::from_vendor_id(value),
            key if key.starts_with("Microcode") => cpu.microcode = value.to_string(),
            _ => {}
        }
    }
    cpu
}

/// First `microcode` revision in /proc/cpuinfo
pub fn parse_proc_microcode(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|line| line.starts_with("microcode"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, rev)| rev.trim().to_string())
        .filter(|rev| !rev.is_empty())
}

/// Hardware facts gathered once at startup and fed to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub install_targets: Vec<String>,
    pub cpu: CpuInfo,
}

impl Environment {
    /// Query `probe` for everything the catalog needs
    pub fn detect(probe: &dyn HardwareProbe) -> Self {
        let mut install_targets = probe.install_targets();
        if install_targets.is_empty() {
            warn!("Hardware probe returned no drives, offering fallback entry");
            install_targets.push(FALLBACK_DRIVE.to_string());
        }
        Self {
            install_targets,
            cpu: probe.cpu(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyProbe;

    impl HardwareProbe for EmptyProbe {
        fn install_targets(&self) -> Vec<String> {
            Vec::new()
        }
        fn cpu(&self) -> CpuInfo {
            CpuInfo::default()
        }
    }

    #[test]
    fn test_parse_lsblk_with_and_without_model() {
        let output = "sda   465.8G Samsung SSD 860\nnvme0n1 1.8T\nsr0\n";
        let drives = parse_lsblk(output);
        assert_eq!(
            drives,
            vec![
                "/dev/sda (465.8G - Samsung SSD 860)".to_string(),
                "/dev/nvme0n1 (1.8T)".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_lsblk_empty_output() {
        assert!(parse_lsblk("").is_empty());
    }

    #[test]
    fn test_parse_lscpu_amd() {
        let output = "Architecture:        x86_64\n\
                      Vendor ID:           AuthenticAMD\n\
                      Model name:          AMD Ryzen 7 5800X 8-Core Processor\n";
        let cpu = parse_lscpu(output);
        assert_eq!(cpu.vendor, CpuVendor::Amd);
        assert_eq!(cpu.model, "AMD Ryzen 7 5800X 8-Core Processor");
        assert_eq!(cpu.microcode, "Unknown");
    }

    #[test]
    fn test_parse_lscpu_intel_with_microcode() {
        let output = "Vendor ID: GenuineIntel\nModel name: Intel(R) Core(TM) i7\nMicrocode: 0xf0\n";
        let cpu = parse_lscpu(output);
        assert_eq!(cpu.vendor, CpuVendor::Intel);
        assert_eq!(cpu.microcode, "0xf0");
    }

    #[test]
    fn test_parse_proc_microcode() {
        let cpuinfo = "processor\t: 0\nmicrocode\t: 0xa201016\nmicrocode\t: 0xa201016\n";
        assert_eq!(parse_proc_microcode(cpuinfo), Some("0xa201016".to_string()));
        assert_eq!(parse_proc_microcode("processor : 0\n"), None);
    }

    #[test]
    fn test_cpu_vendor_tags() {
        assert_eq!(CpuVendor::Amd.to_string(), "amd");
        assert_eq!(CpuVendor::Intel.to_string(), "intel");
        assert_eq!(CpuVendor::Unknown.to_string(), "unknown");
        assert!(!CpuVendor::from_vendor_id("CentaurHauls").is_known());
    }

    #[test]
    fn test_environment_never_has_empty_targets() {
        let env = Environment::detect(&EmptyProbe);
        assert_eq!(env.install_targets, vec![FALLBACK_DRIVE.to_string()]);
    }

    #[test]
    fn test_system_probe_runs() {
        // Whatever the host has, the probe must return at least one option
        let probe = SystemProbe;
        assert!(!probe.install_targets().is_empty());
        assert!(probe.cpu().logical_cpus >= 1);
    }

    #[test]
    fn test_missing_tool_is_degraded_discovery() {
        let err = run_capture("archwizard-no-such-tool", &[]).unwrap_err();
        assert!(matches!(err, WizardError::DiscoveryDegraded(_)));
        assert!(err.to_string().contains("archwizard-no-such-tool"));

        let err = run_capture("false", &[]).unwrap_err();
        assert!(matches!(err, WizardError::DiscoveryDegraded(_)));
    }
}
