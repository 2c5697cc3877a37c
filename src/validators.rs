//! Answer validators
//!
//! Every validator is a pure function over the candidate string and a
//! read-only view of the answers recorded so far. They never touch the store;
//! the engine applies the answer only after a validator returns `Ok`.

use crate::answers::Answers;
use thiserror::Error;

/// Why a candidate answer was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Candidate is shorter than the field's minimum length
    #[error("{field} must be at least {min} characters long")]
    TooShort { field: &'static str, min: usize },

    /// Candidate is empty where a value is required
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Confirmation field does not match its source field
    #[error("{field} do not match")]
    Mismatch {
        field: &'static str,
        source_id: String,
    },
}

impl ValidationError {
    /// Mismatches trigger the fail-closed rewind instead of a plain re-prompt
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

/// Validator attached to a question.
///
/// The cross-field dependency of `Matches` is explicit: it names the id of the
/// answer it compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    /// At least 3 characters
    Username,
    /// At least 8 characters
    Password,
    /// At least 1 character
    Hostname,
    /// Must equal the answer recorded under the given id
    Matches(&'static str),
}

impl Validator {
    /// Run this validator against `candidate`
    pub fn validate(&self, candidate: &str, answers: &Answers) -> Result<(), ValidationError> {
        match self {
            Self::Username => validate_username(candidate, answers),
            Self::Password => validate_password(candidate, answers),
            Self::Hostname => validate_hostname(candidate, answers),
            Self::Matches(source_id) => validate_matches(candidate, answers, source_id),
        }
    }

    /// Id of the field this validator compares against, if any
    pub fn source_field(&self) -> Option<&'static str> {
        match self {
            Self::Matches(source_id) => Some(source_id),
            _ => None,
        }
    }
}

pub fn validate_username(candidate: &str, _answers: &Answers) -> Result<(), ValidationError> {
    min_chars(candidate, "username", 3)
}

pub fn validate_password(candidate: &str, _answers: &Answers) -> Result<(), ValidationError> {
    min_chars(candidate, "password", 8)
}

pub fn validate_hostname(candidate: &str, _answers: &Answers) -> Result<(), ValidationError> {
    if candidate.is_empty() {
        return Err(ValidationError::Empty { field: "hostname" });
    }
    Ok(())
}

/// Equality against another recorded answer. A missing source compares as "".
pub fn validate_matches(
    candidate: &str,
    answers: &Answers,
    source_id: &str,
) -> Result<(), ValidationError> {
    let source = answers.get(source_id).map(String::as_str).unwrap_or_default();
    if candidate != source {
        return Err(ValidationError::Mismatch {
            field: "passwords",
            source_id: source_id.to_string(),
        });
    }
    Ok(())
}

// Counts chars, not bytes, so multi-byte input is measured the way it is typed.
fn min_chars(candidate: &str, field: &'static str, min: usize) -> Result<(), ValidationError> {
    if candidate.chars().count() < min {
        return Err(ValidationError::TooShort { field, min });
    }
    Ok(())
}
