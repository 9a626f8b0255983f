//! Domain identifier types
//!
//! Newtype wrappers keep report and action identifiers from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Globally unique report identifier
///
/// # Examples
///
/// ```
/// use conduit::domain::ids::ReportId;
/// use std::str::FromStr;
///
/// let id = ReportId::from_str("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap();
/// assert_eq!(id.to_string(), "7d44b88c-4199-4bad-97dc-d78268e01398");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportId(Uuid);

impl ReportId {
    /// Generates a fresh random report identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReportId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid report ID '{s}': {e}"))
    }
}

/// Store-assigned action identifier
///
/// Only exists after the action row has been inserted during commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(i64);

impl ActionId {
    /// Wraps a raw identifier returned by the store
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_id_unique() {
        assert_ne!(ReportId::new(), ReportId::new());
    }

    #[test]
    fn test_report_id_parse() {
        let id = ReportId::from_str(" 7d44b88c-4199-4bad-97dc-d78268e01398 ").unwrap();
        assert_eq!(id.to_string(), "7d44b88c-4199-4bad-97dc-d78268e01398");
    }

    #[test]
    fn test_report_id_parse_invalid() {
        let result = ReportId::from_str("not-a-uuid");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("not-a-uuid"));
    }

    #[test]
    fn test_report_id_serde_transparent() {
        let id = ReportId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ReportId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_action_id_display() {
        let id = ActionId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
    }
}
