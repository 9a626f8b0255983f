//! Transport protocol traits
//!
//! A transport delivers one report to one destination and reports back a
//! [`RetryOutcome`]. Failures never escape [`TransportProtocol::send`]; they
//! are folded into the outcome plus diagnostic text in the returned
//! [`Transmission`].

use crate::domain::{Destination, ReportHeader, ReportId, Result, RetryItems, RetryOutcome};
use async_trait::async_trait;
use std::time::Duration;

/// Long-lived resource reused across sends to one destination
///
/// Callers release a session with [`TransportSession::close`] on every exit
/// path. Implementations must also release on drop.
#[async_trait]
pub trait TransportSession: Send {
    /// Release the session
    async fn close(self: Box<Self>);

    /// Downcasting support for adapters that need their concrete session
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// Result of one call to [`TransportProtocol::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    /// What is left to deliver
    pub outcome: RetryOutcome,

    /// Filename at the destination, if the transport names its payload
    pub external_name: Option<String>,

    /// Description of the delivery parameters (never contains secrets)
    pub params: String,

    /// Diagnostic text for this attempt
    pub result: String,

    /// Items delivered by this attempt
    pub delivered_items: usize,
}

impl Transmission {
    /// A fully successful attempt
    pub fn delivered(params: String, result: String, delivered_items: usize) -> Self {
        Self {
            outcome: RetryOutcome::Delivered,
            external_name: None,
            params,
            result,
            delivered_items,
        }
    }

    /// An attempt that must be repeated in full
    pub fn retry_all(params: String, result: String) -> Self {
        Self {
            outcome: RetryOutcome::RetryAll,
            external_name: None,
            params,
            result,
            delivered_items: 0,
        }
    }

    /// Sets the external filename
    pub fn with_external_name(mut self, name: impl Into<String>) -> Self {
        self.external_name = Some(name.into());
        self
    }
}

/// Destination-specific delivery capability
#[async_trait]
pub trait TransportProtocol: Send + Sync {
    /// Transport name for logging
    fn name(&self) -> &str;

    /// Open an optional session for `destination`
    ///
    /// # Errors
    ///
    /// Returns an error if the session resource cannot be acquired. Callers
    /// treat this like a failed attempt.
    async fn start_session(
        &self,
        destination: &Destination,
    ) -> Result<Option<Box<dyn TransportSession>>>;

    /// Attempt delivery of `header` as `sent_report_id`
    ///
    /// `retry_items` is empty on the first attempt and holds the failed
    /// ordinals of the previous partial attempt otherwise.
    async fn send(
        &self,
        header: &ReportHeader,
        sent_report_id: ReportId,
        retry_items: &RetryItems,
        session: Option<&mut (dyn TransportSession + 'static)>,
    ) -> Transmission;
}

/// Run `call`, turning an elapsed `limit` into a retry-all transmission
pub async fn with_send_timeout<F>(limit: Duration, params: String, call: F) -> Transmission
where
    F: std::future::Future<Output = Transmission> + Send,
{
    match tokio::time::timeout(limit, call).await {
        Ok(transmission) => transmission,
        Err(_) => Transmission::retry_all(
            params,
            format!("timed out after {}s", limit.as_secs()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_becomes_retry_all() {
        let transmission = with_send_timeout(Duration::from_millis(10), "p".into(), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Transmission::delivered("p".into(), "late".into(), 1)
        })
        .await;

        assert_eq!(transmission.outcome, RetryOutcome::RetryAll);
        assert!(transmission.result.contains("timed out"));
    }

    #[tokio::test]
    async fn test_timeout_passes_result_through() {
        let transmission = with_send_timeout(Duration::from_secs(5), "p".into(), async {
            Transmission::delivered("p".into(), "ok".into(), 3)
        })
        .await;

        assert!(transmission.outcome.is_delivered());
        assert_eq!(transmission.delivered_items, 3);
    }
}
