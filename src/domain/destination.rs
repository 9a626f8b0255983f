//! Destination descriptor
//!
//! Describes where a produced report is delivered. Destinations are resolved
//! outside of this crate; here they are plain values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport used to reach a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// SMTP email
    Email,
    /// Write to a local or mounted directory
    FileDrop,
    /// HTTP submission endpoint
    Rest,
}

impl TransportKind {
    /// Returns the configuration name of the transport
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Email => "email",
            TransportKind::FileDrop => "file_drop",
            TransportKind::Rest => "rest",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiving organization, service and schema for a delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Receiving organization
    pub organization: String,

    /// Receiving service within the organization
    pub service: String,

    /// Schema the destination expects
    pub schema_name: String,

    /// Schema topic
    pub topic: String,

    /// Transport used for delivery
    pub transport: TransportKind,
}

impl Destination {
    /// Creates a destination descriptor
    pub fn new(
        organization: impl Into<String>,
        service: impl Into<String>,
        schema_name: impl Into<String>,
        topic: impl Into<String>,
        transport: TransportKind,
    ) -> Self {
        Self {
            organization: organization.into(),
            service: service.into(),
            schema_name: schema_name.into(),
            topic: topic.into(),
            transport,
        }
    }

    /// Returns `"{organization}.{service}"`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.organization, self.service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        let dest = Destination::new("az-phd", "elr", "schema", "covid-19", TransportKind::Email);
        assert_eq!(dest.full_name(), "az-phd.elr");
    }

    #[test]
    fn test_transport_kind_serde() {
        let kind: TransportKind = serde_json::from_str("\"file_drop\"").unwrap();
        assert_eq!(kind, TransportKind::FileDrop);
        assert_eq!(kind.to_string(), "file_drop");
    }
}
