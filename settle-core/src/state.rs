//! PollState - Opaque status values reported by a probe

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status value reported by a probe on one invocation
///
/// There is no fixed vocabulary: a value only means something relative to the
/// sets in a [`crate::PollConfig`]. Comparison against those sets ignores ASCII
/// case, since APIs report the same status as `Failed`, `failed` or `FAILED`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollState(String);

impl PollState {
    pub fn new(state: impl Into<String>) -> Self {
        Self(state.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether two states name the same status, ignoring ASCII case
    pub fn matches(&self, other: &PollState) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PollState {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PollState {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for PollState {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

/// Small ordered set of states with case-insensitive membership
///
/// Sets hold a handful of entries, so lookups are a linear scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSet {
    states: Vec<PollState>,
}

impl StateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state; duplicates (ignoring case) are dropped
    pub fn insert(&mut self, state: impl Into<PollState>) {
        let state = state.into();
        if !self.contains(&state) {
            self.states.push(state);
        }
    }

    pub fn contains(&self, state: &PollState) -> bool {
        self.states.iter().any(|s| s.matches(state))
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PollState> {
        self.states.iter()
    }

    /// First state of `self` that also appears in `other`
    pub fn overlap(&self, other: &StateSet) -> Option<&PollState> {
        self.states.iter().find(|s| other.contains(s))
    }
}

impl<S: Into<PollState>> FromIterator<S> for StateSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = StateSet::new();
        for state in iter {
            set.insert(state);
        }
        set
    }
}

impl IntoIterator for StateSet {
    type Item = PollState;
    type IntoIter = std::vec::IntoIter<PollState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.into_iter()
    }
}

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, state) in self.states.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", state)?;
        }
        write!(f, "]")
    }
}
