//! Answer store
//!
//! Keyed mapping from question id to the recorded answer. Derived entries
//! (partition paths computed from the install device) live here too, next to
//! the answers the user typed.

use std::collections::BTreeMap;

/// Plain id -> value mapping.
///
/// This is what validators see (as a shared borrow), what gets persisted under
/// `[variables]` and what the installer receives as environment variables.
pub type Answers = BTreeMap<String, String>;

/// Mutable store of recorded answers, owned by the engine for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    entries: Answers,
}

impl AnswerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the answer recorded for `id`
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Record `value` for `id`, returning the previous value if any
    pub fn set(&mut self, id: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(id.into(), value.into())
    }

    /// Remove the answer for `id`
    pub fn delete(&mut self, id: &str) -> Option<String> {
        self.entries.remove(id)
    }

    /// Whether an answer is recorded for `id`
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Write a batch of derived values.
    ///
    /// Returns the ids whose stored value actually changed.
    pub fn apply_derived<I, K, V>(&mut self, derived: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut changed = Vec::new();
        for (key, value) in derived {
            let key = key.into();
            let value = value.into();
            if self.entries.get(&key) != Some(&value) {
                self.entries.insert(key.clone(), value);
                changed.push(key);
            }
        }
        changed
    }

    /// Read-only view handed to validators
    pub fn snapshot(&self) -> &Answers {
        &self.entries
    }

    /// Owned copy, used for persistence effects
    pub fn to_answers(&self) -> Answers {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
