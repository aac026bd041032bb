//! Session lifecycle states and save policies.

use std::fmt;
use std::time::Duration;

/// Where a document session is in its lifecycle.
///
/// `Unloaded` and `Prompting` belong to a `PendingOpen`; a `Session`
/// starts in `Clean`.  `Locked` and `Closed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Prompting,
    Clean,
    Dirty,
    Saving,
    Locked,
    Closed,
}

impl SessionState {
    /// No further reads, edits or saves are accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Locked | SessionState::Closed)
    }

    /// Plaintext is held in memory.
    pub fn is_decrypted(self) -> bool {
        matches!(
            self,
            SessionState::Clean | SessionState::Dirty | SessionState::Saving
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Unloaded => "unloaded",
            SessionState::Prompting => "prompting",
            SessionState::Clean => "clean",
            SessionState::Dirty => "dirty",
            SessionState::Saving => "saving",
            SessionState::Locked => "locked",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// When edits are written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePolicy {
    /// Every edit saves.
    Immediate,
    /// Save once the document has been idle this long; each edit restarts the wait.
    Delayed(Duration),
    /// Only `Session::save` writes.
    Manual,
}

impl Default for SavePolicy {
    fn default() -> Self {
        SavePolicy::Delayed(Duration::from_secs(2))
    }
}
