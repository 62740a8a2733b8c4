//! Session lifecycle state.
//!
//! A session starts `OPEN` and may move to `CLOSED` exactly once. The
//! textual form (`"OPEN"` / `"CLOSED"`) is shared by the database column,
//! the JSON snapshot and the list filter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle state of an ordering session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    #[default]
    Open,
    Closed,
}

impl SessionState {
    /// Canonical upper-case name, as stored and serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Open => "OPEN",
            SessionState::Closed => "CLOSED",
        }
    }

    /// Whether orders may still be attached in this state.
    pub fn accepts_orders(self) -> bool {
        self == SessionState::Open
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Staying in the same state is allowed (a no-op); `CLOSED` is terminal.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        match (self, next) {
            (SessionState::Open, _) => true,
            (SessionState::Closed, SessionState::Closed) => true,
            (SessionState::Closed, SessionState::Open) => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive parse (`"open"`, `"Closed"`, ...).
impl FromStr for SessionState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("OPEN") {
            Ok(SessionState::Open)
        } else if s.eq_ignore_ascii_case("CLOSED") {
            Ok(SessionState::Closed)
        } else {
            Err(CoreError::MalformedInput(format!(
                "Unknown session state: {s}"
            )))
        }
    }
}

impl TryFrom<String> for SessionState {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
