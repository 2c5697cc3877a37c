//! Question catalog
//!
//! The ordered, immutable list of prompts for one run. Questions are schema
//! only: the answers typed against them live in the engine and the
//! [`AnswerStore`](crate::answers::AnswerStore).

use crate::answers::Answers;
use crate::error::{Result, WizardError};
use crate::hardware::Environment;
use crate::validators::Validator;
use std::collections::HashSet;
use strum::{Display, EnumString};
use tracing::debug;

// Question ids referenced outside the catalog definition.
pub const COUNTRY_ISO: &str = "COUNTRY_ISO";
pub const INSTALL_DEVICE: &str = "INSTALL_DEVICE";
pub const DEVICE: &str = "DEVICE";
pub const PARTITION_BIOSBOOT: &str = "PARTITION_BIOSBOOT";
pub const PARTITION_EFI: &str = "PARTITION_EFI";
pub const PARTITION_ROOT: &str = "PARTITION_ROOT";
pub const PARTITION_HOME: &str = "PARTITION_HOME";
pub const PARTITION_SWAP: &str = "PARTITION_SWAP";
pub const MOUNT_OPTIONS: &str = "MOUNT_OPTIONS";
pub const LOCALE: &str = "LOCALE";
pub const TIMEZONE: &str = "TIMEZONE";
pub const KEYMAP: &str = "KEYMAP";
pub const USERNAME: &str = "USERNAME";
pub const PASSWORD: &str = "PASSWORD";
pub const CONFIRM_PASSWORD: &str = "CONFIRM_PASSWORD";
pub const HOSTNAME: &str = "HOSTNAME";
pub const MICROCODE: &str = "MICROCODE";
pub const RUN_INSTALL: &str = "RUN_INSTALL";

const TIMEZONES: &[&str] = &[
    "UTC",
    "America/New_York",
    "America/Toronto",
    "America/Vancouver",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "America/Texas",
    "Europe/London",
    "Europe/Berlin",
    "Asia/Tokyo",
];
const LOCALES: &[&str] = &["en_US.UTF-8", "de_DE.UTF-8", "fr_FR.UTF-8"];
const KEYMAPS: &[&str] = &["us", "uk", "de"];
const FILESYSTEMS: &[&str] = &["btrfs", "ext4"];
const DESKTOPS: &[&str] = &["none", "gnome", "kde", "cosmic", "dwm"];

/// How a question collects its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum QuestionKind {
    /// Free text, echoed
    Text,
    /// Free text, masked on screen
    Secret,
    /// Binary choice stored as "true"/"false"
    YesNo,
    /// Single choice from `options`
    Select,
}

impl QuestionKind {
    /// Text and Secret questions take typed input
    pub fn takes_text(self) -> bool {
        matches!(self, Self::Text | Self::Secret)
    }
}

/// Special handling a question receives beyond its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionRole {
    #[default]
    Plain,
    /// Chosen device drives the derived partition and mount-option answers
    InstallTarget,
    /// Transient check against the named field, never persisted
    Confirms(&'static str),
}

/// What gets stored when a Select option is confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// The option string as displayed
    #[default]
    Whole,
    /// The first whitespace-separated token (`/dev/sda (500G)` -> `/dev/sda`)
    FirstToken,
}

impl Projection {
    pub fn apply<'a>(self, option: &'a str) -> &'a str {
        match self {
            Self::Whole => option,
            Self::FirstToken => option.split_whitespace().next().unwrap_or(option),
        }
    }
}

/// A single prompt definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub validator: Option<Validator>,
    pub role: QuestionRole,
    pub projection: Projection,
    /// Pre-filled answer (catalog default, hardware seed or prior run)
    pub default: String,
}

impl Question {
    fn new(id: &'static str, prompt: &'static str, kind: QuestionKind) -> Self {
        Self {
            id,
            prompt,
            kind,
            options: Vec::new(),
            validator: None,
            role: QuestionRole::Plain,
            projection: Projection::Whole,
            default: String::new(),
        }
    }

    pub fn text(id: &'static str, prompt: &'static str) -> Self {
        Self::new(id, prompt, QuestionKind::Text)
    }

    pub fn secret(id: &'static str, prompt: &'static str) -> Self {
        Self::new(id, prompt, QuestionKind::Secret)
    }

    pub fn yes_no(id: &'static str, prompt: &'static str) -> Self {
        Self::new(id, prompt, QuestionKind::YesNo)
    }

    pub fn select<I, S>(id: &'static str, prompt: &'static str, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut question = Self::new(id, prompt, QuestionKind::Select);
        question.options = options.into_iter().map(Into::into).collect();
        question
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_role(mut self, role: QuestionRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Value stored for option `index` of a Select question
    pub fn projected_option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(|o| self.projection.apply(o))
    }

    /// Index of the option whose stored value equals `answer`
    pub fn option_index(&self, answer: &str) -> Option<usize> {
        self.options
            .iter()
            .position(|o| self.projection.apply(o) == answer)
    }

    /// Id of the field this question confirms, if it is a confirm field
    pub fn confirms(&self) -> Option<&'static str> {
        match self.role {
            QuestionRole::Confirms(source) => Some(source),
            _ => None,
        }
    }
}

/// Ordered collection of questions with unique ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    questions: Vec<Question>,
}

impl Catalog {
    /// Validate and wrap a question list.
    ///
    /// Fails on duplicate ids, on Select questions without options and on
    /// confirm fields whose source is missing, comes later or is not the
    /// field their `Matches` validator checks.
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        let mut seen = HashSet::new();
        for (index, question) in questions.iter().enumerate() {
            if !seen.insert(question.id) {
                return Err(WizardError::catalog(format!(
                    "duplicate question id {}",
                    question.id
                )));
            }
            if question.kind == QuestionKind::Select && question.options.is_empty() {
                return Err(WizardError::catalog(format!(
                    "select question {} has no options",
                    question.id
                )));
            }
            if question.kind != QuestionKind::Select && !question.options.is_empty() {
                return Err(WizardError::catalog(format!(
                    "{} question {} must not carry options",
                    question.kind, question.id
                )));
            }
            if let Some(source) = question.confirms() {
                let source_before = questions[..index].iter().any(|q| q.id == source);
                if !source_before {
                    return Err(WizardError::catalog(format!(
                        "{} confirms {} which is not asked before it",
                        question.id, source
                    )));
                }
                let checked = question.validator.as_ref().and_then(Validator::source_field);
                if checked != Some(source) {
                    return Err(WizardError::catalog(format!(
                        "{} confirms {} but is not validated against it",
                        question.id, source
                    )));
                }
            }
        }
        Ok(Self { questions })
    }

    /// Build the install catalog.
    ///
    /// Defaults come from the catalog itself, then from detected hardware,
    /// then from `prior` (answers persisted by an earlier run), each layer
    /// overriding the previous one.
    pub fn build(prior: &Answers, env: &Environment) -> Result<Self> {
        let mut drives = env.install_targets.clone();
        if drives.is_empty() {
            drives.push(crate::hardware::FALLBACK_DRIVE.to_string());
        }

        let mut microcode = Question::select(MICROCODE, "Select microcode:", ["amd", "intel"]);
        if env.cpu.vendor.is_known() {
            microcode = microcode.with_default(env.cpu.vendor.to_string());
        }

        let mut questions = vec![
            Question::text(COUNTRY_ISO, "Enter country ISO code:").with_default("CA"),
            Question::select(INSTALL_DEVICE, "Select installation device:", drives)
                .with_role(QuestionRole::InstallTarget)
                .with_projection(Projection::FirstToken),
            Question::text(DEVICE, "Confirm device path:"),
            Question::text(PARTITION_BIOSBOOT, "Confirm BIOS boot partition:"),
            Question::text(PARTITION_EFI, "Confirm EFI partition:"),
            Question::text(PARTITION_ROOT, "Confirm root partition:"),
            Question::text(PARTITION_HOME, "Confirm home partition:"),
            Question::text(PARTITION_SWAP, "Confirm swap partition:"),
            Question::text(MOUNT_OPTIONS, "Enter mount options:")
                .with_default(crate::engine::storage::SSD_MOUNT_OPTIONS),
            Question::select(LOCALE, "Select locale:", LOCALES.iter().copied()),
            Question::select(TIMEZONE, "Select timezone:", TIMEZONES.iter().copied()),
            Question::select(KEYMAP, "Select keymap:", KEYMAPS.iter().copied()),
            Question::text(USERNAME, "Enter username:").with_validator(Validator::Username),
            Question::secret(PASSWORD, "Enter password:").with_validator(Validator::Password),
            Question::secret(CONFIRM_PASSWORD, "Confirm password:")
                .with_validator(Validator::Matches(PASSWORD))
                .with_role(QuestionRole::Confirms(PASSWORD)),
            Question::text(HOSTNAME, "Enter hostname:").with_validator(Validator::Hostname),
            microcode,
            Question::select("GPU", "Select GPU type:", ["amd", "intel", "nvidia"]),
            Question::select("GPU_DRIVER", "Select GPU driver:", ["nvidia", "amdgpu", "intel"]),
            Question::select("TERMINAL", "Select terminal:", ["alacritty", "kitty"]),
            Question::select("SHELL", "Select shell:", ["bash", "zsh"]),
            Question::select("EDITOR", "Select editor:", ["nvim", "vim", "nano"]),
            Question::select(
                "DESKTOP_ENVIRONMENT",
                "Select desktop environment:",
                DESKTOPS.iter().copied(),
            ),
            Question::select(
                "FORMAT_TYPE",
                "Select filesystem format:",
                FILESYSTEMS.iter().copied(),
            ),
            Question::text("SUBVOLUMES", "Enter subvolumes (comma-separated):")
                .with_default("@,@home,@var,@.snapshots"),
            Question::secret("LUKS_PASSWORD", "Enter LUKS password (leave empty if not using):"),
            Question::yes_no("LUKS", "Use disk encryption?"),
            Question::yes_no(RUN_INSTALL, "Do you want to run the install script?"),
        ];

        for question in &mut questions {
            // Confirm fields are never persisted, so never pre-filled either
            if question.confirms().is_some() {
                continue;
            }
            if let Some(value) = prior.get(question.id) {
                debug!("Pre-filling {} from prior answers", question.id);
                question.default = value.clone();
            }
        }

        Self::new(questions)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Position of the question with `id`
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{CpuInfo, CpuVendor, FALLBACK_DRIVE};

    fn env_with(drives: &[&str], vendor: CpuVendor) -> Environment {
        Environment {
            install_targets: drives.iter().map(|d| d.to_string()).collect(),
            cpu: CpuInfo {
                vendor,
                ..CpuInfo::default()
            },
        }
    }

    #[test]
    fn test_build_has_unique_ids_in_order() {
        let env = env_with(&["/dev/sda (1T)"], CpuVendor::Unknown);
        let catalog = Catalog::build(&Answers::new(), &env).expect("catalog builds");
        assert_eq!(catalog.get(0).map(|q| q.id), Some(COUNTRY_ISO));
        assert_eq!(catalog.questions().last().map(|q| q.id), Some(RUN_INSTALL));

        let ids: HashSet<&str> = catalog.questions().iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_build_is_deterministic() {
        let env = env_with(&["/dev/sda (1T)", "/dev/nvme0n1 (2T)"], CpuVendor::Amd);
        let prior = Answers::from([("USERNAME".to_string(), "arch".to_string())]);
        let a = Catalog::build(&prior, &env).expect("catalog builds");
        let b = Catalog::build(&prior, &env).expect("catalog builds");
        assert_eq!(a, b);
    }

    #[test]
    fn test_prior_answers_seed_defaults() {
        let prior = Answers::from([
            (USERNAME.to_string(), "arch".to_string()),
            (COUNTRY_ISO.to_string(), "DE".to_string()),
            (CONFIRM_PASSWORD.to_string(), "leaked".to_string()),
        ]);
        let catalog = Catalog::build(&prior, &env_with(&[], CpuVendor::Unknown)).expect("builds");

        let default_of = |id: &str| {
            catalog
                .index_of(id)
                .and_then(|i| catalog.get(i))
                .map(|q| q.default.clone())
        };
        assert_eq!(default_of(USERNAME), Some("arch".to_string()));
        assert_eq!(default_of(COUNTRY_ISO), Some("DE".to_string()));
        assert_eq!(default_of(CONFIRM_PASSWORD), Some(String::new()));
    }

    #[test]
    fn test_cpu_vendor_seeds_microcode_but_prior_wins() {
        let env = env_with(&[], CpuVendor::Intel);
        let catalog = Catalog::build(&Answers::new(), &env).expect("builds");
        let idx = catalog.index_of(MICROCODE).expect("microcode question");
        assert_eq!(catalog.get(idx).map(|q| q.default.as_str()), Some("intel"));

        let prior = Answers::from([(MICROCODE.to_string(), "amd".to_string())]);
        let catalog = Catalog::build(&prior, &env).expect("builds");
        assert_eq!(catalog.get(idx).map(|q| q.default.as_str()), Some("amd"));
    }

    #[test]
    fn test_empty_drive_list_uses_fallback() {
        let env = env_with(&[], CpuVendor::Unknown);
        let catalog = Catalog::build(&Answers::new(), &env).expect("builds");
        let idx = catalog.index_of(INSTALL_DEVICE).expect("device question");
        let question = catalog.get(idx).expect("device question");
        assert_eq!(question.options, vec![FALLBACK_DRIVE.to_string()]);
        assert_eq!(question.projected_option(0), Some("/dev/sda"));
    }

    #[test]
    fn test_new_rejects_duplicates_and_empty_selects() {
        let dup = vec![Question::text("A", "a"), Question::text("A", "again")];
        assert!(matches!(Catalog::new(dup), Err(WizardError::Catalog(_))));

        let empty_select = vec![Question::select("S", "pick", Vec::<String>::new())];
        assert!(Catalog::new(empty_select).is_err());
    }

    #[test]
    fn test_new_rejects_confirm_before_source() {
        let questions = vec![
            Question::secret("CONFIRM", "again").with_role(QuestionRole::Confirms("PW")),
            Question::secret("PW", "pw"),
        ];
        assert!(Catalog::new(questions).is_err());
    }

    #[test]
    fn test_new_rejects_unchecked_confirm() {
        let unchecked = vec![
            Question::secret("PW", "pw"),
            Question::secret("CONFIRM", "again").with_role(QuestionRole::Confirms("PW")),
        ];
        let err = Catalog::new(unchecked).unwrap_err();
        assert!(err.to_string().contains("not validated against it"));

        let wrong_source = vec![
            Question::secret("PW", "pw"),
            Question::secret("OTHER", "other"),
            Question::secret("CONFIRM", "again")
                .with_validator(Validator::Matches("OTHER"))
                .with_role(QuestionRole::Confirms("PW")),
        ];
        assert!(Catalog::new(wrong_source).is_err());
    }

    #[test]
    fn test_projection() {
        let q = Question::select("D", "d", ["/dev/sda (1T - Disk)"])
            .with_projection(Projection::FirstToken);
        assert_eq!(q.projected_option(0), Some("/dev/sda"));
        assert_eq!(q.option_index("/dev/sda"), Some(0));
        assert_eq!(q.option_index("/dev/sdb"), None);
        assert_eq!(Projection::Whole.apply("a b"), "a b");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(QuestionKind::YesNo.to_string(), "yesno");
        assert!(QuestionKind::Secret.takes_text());
        assert!(!QuestionKind::Select.takes_text());
    }
}
