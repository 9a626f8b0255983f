//! Pipeline action model
//!
//! One [`Action`] row is written per pipeline step invocation. Its parameter
//! and result logs are accumulated while the action runs and are width-limited
//! only when persisted.

use super::errors::ConduitError;
use super::ids::ActionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Receive,
    Translate,
    Route,
    Batch,
    Send,
    Process,
    Download,
    Wipe,
    None,
    BatchError,
    SendError,
    WipeError,
}

impl ActionKind {
    /// Returns the persisted name of the action kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Receive => "receive",
            ActionKind::Translate => "translate",
            ActionKind::Route => "route",
            ActionKind::Batch => "batch",
            ActionKind::Send => "send",
            ActionKind::Process => "process",
            ActionKind::Download => "download",
            ActionKind::Wipe => "wipe",
            ActionKind::None => "none",
            ActionKind::BatchError => "batch_error",
            ActionKind::SendError => "send_error",
            ActionKind::WipeError => "wipe_error",
        }
    }

    /// True for the terminal error kinds
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ActionKind::BatchError | ActionKind::SendError | ActionKind::WipeError
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ConduitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "receive" => ActionKind::Receive,
            "translate" => ActionKind::Translate,
            "route" => ActionKind::Route,
            "batch" => ActionKind::Batch,
            "send" => ActionKind::Send,
            "process" => ActionKind::Process,
            "download" => ActionKind::Download,
            "wipe" => ActionKind::Wipe,
            "none" => ActionKind::None,
            "batch_error" => ActionKind::BatchError,
            "send_error" => ActionKind::SendError,
            "wipe_error" => ActionKind::WipeError,
            other => {
                return Err(ConduitError::Validation(format!(
                    "Unknown action kind '{other}'"
                )))
            }
        };
        Ok(kind)
    }
}

/// A scheduled follow-up action for a produced report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Action that should pick the report up next
    pub action: ActionKind,

    /// When that action is due
    pub at: DateTime<Utc>,
}

impl Event {
    /// Creates an event due at the given time
    pub fn new(action: ActionKind, at: DateTime<Utc>) -> Self {
        Self { action, at }
    }

    /// Creates an event due immediately
    pub fn now(action: ActionKind) -> Self {
        Self::new(action, Utc::now())
    }
}

/// Append-only diagnostic text
///
/// Entries are newline separated. The log is never truncated while it grows;
/// [`DiagnosticLog::to_column`] applies the storage width when persisting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticLog {
    text: String,
}

impl DiagnosticLog {
    /// Creates an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry
    pub fn append(&mut self, entry: impl AsRef<str>) {
        let entry = entry.as_ref();
        if entry.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(entry);
    }

    /// Returns the full accumulated text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True if nothing has been appended
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the text limited to `max_width` characters, or `None` if empty
    pub fn to_column(&self, max_width: usize) -> Option<String> {
        if self.text.is_empty() {
            None
        } else {
            Some(truncate_to_width(&self.text, max_width))
        }
    }
}

/// Limits `text` to at most `max_width` characters, keeping the prefix
///
/// Width is counted in characters to match `VARCHAR(n)` semantics, so a
/// multi-byte code point is never split.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    match text.char_indices().nth(max_width) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// One pipeline action invocation
#[derive(Debug, Clone)]
pub struct Action {
    /// Store-assigned identifier (set at commit)
    pub id: Option<ActionId>,

    /// Kind of step
    pub kind: ActionKind,

    /// Accumulated parameters log
    pub params: DiagnosticLog,

    /// Accumulated result log
    pub result: DiagnosticLog,

    /// When the action started
    pub created_at: DateTime<Utc>,
}

impl Action {
    /// Starts a new, uncommitted action
    pub fn new(kind: ActionKind) -> Self {
        Self {
            id: None,
            kind,
            params: DiagnosticLog::new(),
            result: DiagnosticLog::new(),
            created_at: Utc::now(),
        }
    }
}
