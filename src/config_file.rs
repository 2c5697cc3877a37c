//! Answers file handling.
//!
//! Answers are saved as TOML with two sections: an `[install]` table holding
//! the auto-run flag and a flat `[variables]` string table that the install
//! script reads back.
//!
//! ```toml
//! [install]
//! auto_run = true
//!
//! [variables]
//! HOSTNAME = "archlinux"
//! USERNAME = "arch"
//! ```
//!
//! The layout is validated here, at the file boundary, so the rest of the
//! crate only ever sees a typed [`WizardConfig`].

use crate::answers::Answers;
use crate::catalog::RUN_INSTALL;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures at the persistence boundary
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// No answers file yet (normal on a first run)
    #[error("no saved answers at {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to encode answers: {0}")]
    Encode(#[from] toml::ser::Error),

    /// The install-dir copy does not match the file it was copied from
    #[error("{} and {} differ after copy", original.display(), copy.display())]
    Verify { original: PathBuf, copy: PathBuf },
}

impl PersistenceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// `[install]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSection {
    #[serde(default)]
    pub auto_run: bool,
}

/// On-disk answers file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardConfig {
    #[serde(default)]
    pub install: InstallSection,
    #[serde(default)]
    pub variables: Answers,
}

impl WizardConfig {
    pub fn new(answers: &Answers, auto_run: bool) -> Self {
        Self {
            install: InstallSection { auto_run },
            variables: answers.clone(),
        }
    }

    /// Build from answers, deriving `auto_run` from the RUN_INSTALL answer
    pub fn from_answers(answers: &Answers) -> Self {
        Self::new(answers, auto_run(answers))
    }

    pub fn to_toml(&self) -> Result<String, PersistenceError> {
        Ok(toml::to_string(self)?)
    }
}

/// Whether the answers ask for the installer to run afterwards
pub fn auto_run(answers: &Answers) -> bool {
    answers.get(RUN_INSTALL).is_some_and(|v| v == "true")
}

/// Read and parse an answers file
pub fn load_config(path: &Path) -> Result<WizardConfig, PersistenceError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PersistenceError::NotFound(path.to_path_buf())
        } else {
            PersistenceError::io(path, e)
        }
    })?;

    toml::from_str(&content).map_err(|source| PersistenceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load only the `[variables]` table
pub fn load(path: &Path) -> Result<Answers, PersistenceError> {
    let config = load_config(path)?;
    debug!(
        "Loaded {} answers from {}",
        config.variables.len(),
        path.display()
    );
    Ok(config.variables)
}

/// Write `answers` to `path`.
///
/// The file holds passwords in plain text, so it is restricted to the owner.
pub fn save(path: &Path, answers: &Answers, auto_run: bool) -> Result<(), PersistenceError> {
    let content = WizardConfig::new(answers, auto_run).to_toml()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }
    write_private(path, content.as_bytes()).map_err(|e| PersistenceError::io(path, e))?;

    info!("Saved {} answers to {}", answers.len(), path.display());
    Ok(())
}

/// Write `bytes` to a file only the owner can read.
///
/// New files are created 0600; an existing file is narrowed before the
/// new contents go in.
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.set_len(0)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Save to `path`, copy to `copy_path` and check both are byte-identical
pub fn save_and_verify(
    path: &Path,
    copy_path: &Path,
    answers: &Answers,
    auto_run: bool,
) -> Result<(), PersistenceError> {
    save(path, answers, auto_run)?;

    if let Some(parent) = copy_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }
    fs::copy(path, copy_path).map_err(|e| PersistenceError::io(copy_path, e))?;

    verify_identical(path, copy_path)?;
    info!("Verified copy at {}", copy_path.display());
    Ok(())
}

/// Fail unless both files have the same bytes
pub fn verify_identical(original: &Path, copy: &Path) -> Result<(), PersistenceError> {
    let a = fs::read(original).map_err(|e| PersistenceError::io(original, e))?;
    let b = fs::read(copy).map_err(|e| PersistenceError::io(copy, e))?;
    if a != b {
        warn!(
            "{} ({} bytes) and {} ({} bytes) differ",
            original.display(),
            a.len(),
            copy.display(),
            b.len()
        );
        return Err(PersistenceError::Verify {
            original: original.to_path_buf(),
            copy: copy.to_path_buf(),
        });
    }
    Ok(())
}

/// Where the wizard reads prior answers and writes new ones.
///
/// The app talks to this trait only, so tests can substitute an in-memory or
/// failing implementation.
pub trait PersistenceGateway {
    /// Answers from an earlier run
    fn load(&self) -> Result<Answers, PersistenceError>;

    /// Save the answers collected so far
    fn save_snapshot(&self, answers: &Answers) -> Result<(), PersistenceError>;

    /// Save the accepted answers as the final configuration
    fn save_final(&self, answers: &Answers) -> Result<(), PersistenceError>;
}

/// File-backed gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGateway {
    pub config_path: PathBuf,
    pub snapshot_path: PathBuf,
    /// Verified copy of the final configuration, read by the install script
    pub install_copy_path: PathBuf,
}

impl FileGateway {
    pub fn from_settings(settings: &crate::config::Settings) -> Self {
        Self {
            config_path: settings.config_path.clone(),
            snapshot_path: settings.snapshot_path.clone(),
            install_copy_path: settings.install_config_path(),
        }
    }
}

impl PersistenceGateway for FileGateway {
    fn load(&self) -> Result<Answers, PersistenceError> {
        load(&self.config_path)
    }

    fn save_snapshot(&self, answers: &Answers) -> Result<(), PersistenceError> {
        save(&self.snapshot_path, answers, auto_run(answers))
    }

    fn save_final(&self, answers: &Answers) -> Result<(), PersistenceError> {
        save_and_verify(
            &self.config_path,
            &self.install_copy_path,
            answers,
            auto_run(answers),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    fn sample_answers() -> Answers {
        Answers::from([
            ("USERNAME".to_string(), "arch".to_string()),
            ("HOSTNAME".to_string(), "archlinux".to_string()),
            (RUN_INSTALL.to_string(), "true".to_string()),
        ])
    }

    #[test]
    fn test_toml_layout_has_two_sections() {
        let toml = WizardConfig::from_answers(&sample_answers())
            .to_toml()
            .unwrap();
        assert!(toml.contains("[install]"));
        assert!(toml.contains("auto_run = true"));
        assert!(toml.contains("[variables]"));
        assert!(toml.contains("USERNAME = \"arch\""));
    }

    #[test]
    fn test_auto_run_follows_run_install() {
        let mut answers = sample_answers();
        assert!(auto_run(&answers));
        answers.insert(RUN_INSTALL.to_string(), "false".to_string());
        assert!(!auto_run(&answers));
        answers.remove(RUN_INSTALL);
        assert!(!auto_run(&answers));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[variables\nUSERNAME = ").unwrap();
        temp_file.flush().unwrap();

        let err = load(temp_file.path()).unwrap_err();
        assert!(matches!(err, PersistenceError::Parse { .. }));
    }

    #[test]
    fn test_load_rejects_non_string_variables() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[variables]\nCOUNT = 3\n").unwrap();
        temp_file.flush().unwrap();

        assert!(load(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_sections_default() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[variables]\nUSERNAME = \"arch\"\n").unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert!(!config.install.auto_run);
        assert_eq!(config.variables.get("USERNAME").map(String::as_str), Some("arch"));
    }

    #[test]
    fn test_save_restricts_permissions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("answers.toml");
        save(&path, &sample_answers(), true).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_save_narrows_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("answers.toml");
        let stale = "[variables]\nLEFTOVER = \"a much longer stale value than the new file\"\n";
        fs::write(&path, stale).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        save(&path, &sample_answers(), false).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, sample_answers());
    }

    #[test]
    fn test_save_and_verify_writes_identical_copy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arch_config.toml");
        let copy = dir.path().join("install").join("arch_config.toml");

        save_and_verify(&path, &copy, &sample_answers(), true).unwrap();
        assert_eq!(fs::read(&path).unwrap(), fs::read(&copy).unwrap());
    }

    #[test]
    fn test_verify_detects_difference() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.toml");
        let b = dir.path().join("b.toml");
        fs::write(&a, "x").unwrap();
        fs::write(&b, "y").unwrap();

        let err = verify_identical(&a, &b).unwrap_err();
        assert!(matches!(err, PersistenceError::Verify { .. }));
    }

    #[test]
    fn test_file_gateway_snapshot_and_final() {
        let dir = TempDir::new().unwrap();
        let gateway = FileGateway {
            config_path: dir.path().join("arch_config.toml"),
            snapshot_path: dir.path().join("saved_answers.toml"),
            install_copy_path: dir.path().join("install").join("arch_config.toml"),
        };

        gateway.save_snapshot(&sample_answers()).unwrap();
        assert!(gateway.snapshot_path.exists());
        assert!(gateway.load().unwrap_err().is_not_found());

        gateway.save_final(&sample_answers()).unwrap();
        assert_eq!(gateway.load().unwrap(), sample_answers());
    }
}
