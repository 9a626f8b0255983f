//! Report domain model
//!
//! A report is an opaque data file plus the metadata the pipeline needs to
//! route it: where it came from, its schema, where its body lives, and how
//! many items it holds.

use super::destination::Destination;
use super::ids::ReportId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a report came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportSource {
    /// Submitted by an external sending organization's client
    Client {
        /// Sending organization name
        organization: String,
        /// Client (sender) name within the organization
        client: String,
    },

    /// Loaded from a local file
    File {
        /// Source path
        path: String,
    },

    /// Generated for testing
    Test {
        /// Test fixture name
        name: String,
    },
}

impl ReportSource {
    /// Creates a client source
    pub fn client(organization: impl Into<String>, client: impl Into<String>) -> Self {
        Self::Client {
            organization: organization.into(),
            client: client.into(),
        }
    }

    /// Returns `(organization, client)` for client sources
    pub fn sending_org(&self) -> Option<(&str, &str)> {
        match self {
            Self::Client {
                organization,
                client,
            } => Some((organization.as_str(), client.as_str())),
            _ => None,
        }
    }
}

/// A report moving through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Globally unique report identifier
    pub id: ReportId,

    /// Provenance sources (exactly one for externally received reports)
    pub sources: Vec<ReportSource>,

    /// Schema the body conforms to
    pub schema_name: String,

    /// Schema topic (e.g. "covid-19")
    pub schema_topic: String,

    /// Location of the stored body, if any
    pub body_url: Option<String>,

    /// Body format (e.g. "CSV", "HL7")
    pub body_format: String,

    /// Number of items (rows/messages) in the body
    pub item_count: usize,

    /// Destination this report is bound for, if already routed
    pub destination: Option<Destination>,

    /// When this report was created
    pub created_at: DateTime<Utc>,
}

/// Builder for [`Report`]
///
/// # Examples
///
/// ```
/// use conduit::domain::{ReportBuilder, ReportSource};
///
/// let report = ReportBuilder::new("covid-19", "covid-19")
///     .source(ReportSource::client("simple_report", "default"))
///     .body_format("CSV")
///     .item_count(12)
///     .build();
///
/// assert_eq!(report.sources.len(), 1);
/// assert_eq!(report.item_count, 12);
/// ```
#[derive(Debug)]
pub struct ReportBuilder {
    report: Report,
}

impl ReportBuilder {
    /// Starts a report with a fresh identifier
    pub fn new(schema_name: impl Into<String>, schema_topic: impl Into<String>) -> Self {
        Self {
            report: Report {
                id: ReportId::new(),
                sources: Vec::new(),
                schema_name: schema_name.into(),
                schema_topic: schema_topic.into(),
                body_url: None,
                body_format: "CSV".to_string(),
                item_count: 0,
                destination: None,
                created_at: Utc::now(),
            },
        }
    }

    /// Overrides the generated identifier
    pub fn id(mut self, id: ReportId) -> Self {
        self.report.id = id;
        self
    }

    /// Adds a provenance source
    pub fn source(mut self, source: ReportSource) -> Self {
        self.report.sources.push(source);
        self
    }

    /// Sets the body location
    pub fn body_url(mut self, url: impl Into<String>) -> Self {
        self.report.body_url = Some(url.into());
        self
    }

    /// Sets the body format
    pub fn body_format(mut self, format: impl Into<String>) -> Self {
        self.report.body_format = format.into();
        self
    }

    /// Sets the item count
    pub fn item_count(mut self, count: usize) -> Self {
        self.report.item_count = count;
        self
    }

    /// Binds the report to a destination
    pub fn destination(mut self, destination: Destination) -> Self {
        self.report.destination = Some(destination);
        self
    }

    /// Builds the report
    pub fn build(self) -> Report {
        self.report
    }
}

/// Everything a transport needs to deliver one report
///
/// The header pairs the report's metadata with its body. Transports never
/// touch storage; the caller resolves the body before sending.
#[derive(Debug, Clone)]
pub struct ReportHeader {
    /// Report being delivered
    pub report: Report,

    /// Destination the report is delivered to
    pub destination: Destination,

    /// Report body, if it has been loaded
    pub content: Option<Vec<u8>>,
}

impl ReportHeader {
    /// Creates a header for a report and its destination
    pub fn new(report: Report, destination: Destination, content: Option<Vec<u8>>) -> Self {
        Self {
            report,
            destination,
            content,
        }
    }

    /// External filename for the report sent as `sent_report_id`
    ///
    /// Format: `{schema}-{sent_report_id}-{yyyyMMddHHmmss}.{ext}`
    pub fn external_filename(&self, sent_report_id: ReportId) -> String {
        let ext = self
            .report
            .body_format
            .to_lowercase()
            .replace(|c: char| !c.is_ascii_alphanumeric(), "_");
        let schema = self
            .destination
            .schema_name
            .replace(|c: char| !c.is_ascii_alphanumeric() && c != '-', "_");
        format!(
            "{}-{}-{}.{}",
            schema,
            sent_report_id,
            self.report.created_at.format("%Y%m%d%H%M%S"),
            ext
        )
    }

    /// Splits the body into items, one per non-blank line
    pub fn items(&self) -> Vec<&[u8]> {
        match &self.content {
            Some(content) => split_items(content),
            None => Vec::new(),
        }
    }
}

/// Split a report body into items
///
/// Lines holding only whitespace are not items.
pub fn split_items(content: &[u8]) -> Vec<&[u8]> {
    content
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .collect()
}
