//! REST transport
//!
//! Splits the report body into items (one per line) and POSTs each pending
//! item individually. Items that fail are returned as their ordinals so the
//! next attempt only resubmits those.

use super::traits::{TransportProtocol, TransportSession, Transmission};
use crate::config::RestTransportConfig;
use crate::domain::{
    ConduitError, Destination, ReportHeader, ReportId, Result, RetryItems, RetryOutcome,
    TransportError,
};
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::ExposeSecret;
use std::any::Any;
use std::time::Duration;

/// HTTP client prepared for one destination
pub struct RestSession {
    client: reqwest::Client,
    destination: String,
}

#[async_trait]
impl TransportSession for RestSession {
    async fn close(self: Box<Self>) {
        tracing::debug!(destination = %self.destination, "Closing REST session");
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-item HTTP submission adapter
pub struct RestTransport {
    url: String,
    headers: HeaderMap,
    timeout: Duration,
}

impl RestTransport {
    /// Create an adapter from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a credential or content type is not a valid
    /// header value.
    pub fn new(config: &RestTransportConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&config.content_type).map_err(|e| {
                ConduitError::Configuration(format!("Invalid transports.rest.content_type: {e}"))
            })?,
        );

        let authorization = match config.auth_type.as_str() {
            "basic" => {
                let username = config.username.as_deref().unwrap_or_default();
                let password = config
                    .password
                    .as_ref()
                    .map(|p| p.expose_secret().as_ref().to_string())
                    .unwrap_or_default();
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                Some(format!("Basic {encoded}"))
            }
            "bearer" => config
                .token
                .as_ref()
                .map(|t| format!("Bearer {}", t.expose_secret().as_ref())),
            _ => None,
        };

        if let Some(value) = authorization {
            let mut value = HeaderValue::from_str(&value).map_err(|e| {
                ConduitError::Configuration(format!("Invalid REST credentials: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(Self {
            url: config.url.clone(),
            headers,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    fn build_client(&self) -> std::result::Result<reqwest::Client, TransportError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.headers.clone())
            .build()
            .map_err(|e| TransportError::ConnectionFailed(format!("HTTP client: {e}")))
    }

    async fn post_item(
        &self,
        client: &reqwest::Client,
        sent_report_id: ReportId,
        ordinal: usize,
        item: &[u8],
    ) -> std::result::Result<(), TransportError> {
        let response = client
            .post(&self.url)
            .header("X-Report-Id", sent_report_id.to_string())
            .header("X-Item-Ordinal", ordinal.to_string())
            .body(item.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout.as_secs())
                } else {
                    TransportError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn send_items(
        &self,
        client: &reqwest::Client,
        header: &ReportHeader,
        sent_report_id: ReportId,
        retry_items: &RetryItems,
        params: String,
    ) -> Transmission {
        let items = header.items();
        if items.is_empty() {
            let e = TransportError::MissingContent(sent_report_id.to_string());
            return Transmission::retry_all(params, format!("rest failed: {e}"));
        }

        let selected = retry_items.selected(items.len());
        let mut failed = Vec::new();
        let mut errors = Vec::new();

        for ordinal in &selected {
            if let Err(e) = self
                .post_item(client, sent_report_id, *ordinal, items[*ordinal])
                .await
            {
                tracing::debug!(report_id = %sent_report_id, ordinal, error = %e, "Item rejected");
                errors.push(format!("item {ordinal}: {e}"));
                failed.push(*ordinal);
            }
        }

        let delivered_items = selected.len() - failed.len();
        let mut result = format!("rest posted {delivered_items}/{} items", selected.len());
        if !errors.is_empty() {
            result.push_str("; ");
            result.push_str(&errors.join("; "));
        }

        Transmission {
            outcome: RetryOutcome::from_failed(failed),
            external_name: None,
            params,
            result,
            delivered_items,
        }
    }
}

#[async_trait]
impl TransportProtocol for RestTransport {
    fn name(&self) -> &str {
        "rest"
    }

    async fn start_session(
        &self,
        destination: &Destination,
    ) -> Result<Option<Box<dyn TransportSession>>> {
        let client = self.build_client()?;
        Ok(Some(Box::new(RestSession {
            client,
            destination: destination.full_name(),
        })))
    }

    async fn send(
        &self,
        header: &ReportHeader,
        sent_report_id: ReportId,
        retry_items: &RetryItems,
        session: Option<&mut (dyn TransportSession + 'static)>,
    ) -> Transmission {
        let params = format!("rest url={}", self.url);

        let session_client = session
            .and_then(|s| s.as_any_mut().downcast_mut::<RestSession>())
            .map(|s| s.client.clone());

        let client = match session_client {
            Some(client) => client,
            None => match self.build_client() {
                Ok(client) => client,
                Err(e) => return Transmission::retry_all(params, format!("rest failed: {e}")),
            },
        };

        self.send_items(&client, header, sent_report_id, retry_items, params)
            .await
    }
}
