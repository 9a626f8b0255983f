//! Email transport
//!
//! Renders the destination template into a subject and body and hands the
//! message to a [`Mailer`] in a single call. There is no per-item
//! resolution: any error is `RetryAll`, success is `Delivered`.

use super::traits::{with_send_timeout, TransportProtocol, TransportSession, Transmission};
use crate::config::EmailTransportConfig;
use crate::domain::{Destination, ReportHeader, ReportId, Result, RetryItems, TransportError};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;

/// Rendered message ready to hand to a mailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Sender address
    pub from: String,
    /// Recipient addresses
    pub to: Vec<String>,
    /// Rendered subject
    pub subject: String,
    /// Rendered body
    pub body: String,
}

/// Delivery seam for rendered messages
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message, returning the provider's response text
    async fn deliver(&self, email: &OutgoingEmail) -> std::result::Result<String, TransportError>;
}

/// SMTP mailer over STARTTLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build an SMTP relay from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the relay host is invalid.
    pub fn from_config(config: &EmailTransportConfig) -> std::result::Result<Self, TransportError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| TransportError::ConnectionFailed(format!("SMTP relay error: {e}")))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().as_ref().to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, email: &OutgoingEmail) -> std::result::Result<String, TransportError> {
        let mut builder = Message::builder()
            .from(email.from.parse().map_err(|e| {
                TransportError::InvalidAddress(format!("from '{}': {e}", email.from))
            })?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        for to in &email.to {
            builder = builder.to(to
                .parse()
                .map_err(|e| TransportError::InvalidAddress(format!("to '{to}': {e}")))?);
        }

        let message = builder
            .body(email.body.clone())
            .map_err(|e| TransportError::Template(format!("Failed to build email: {e}")))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| TransportError::Provider(format!("SMTP send error: {e}")))?;

        Ok(format!("SMTP {}", response.code()))
    }
}

/// Fill `{{name}}` placeholders for one delivery
pub fn render_template(
    template: &str,
    header: &ReportHeader,
    sent_report_id: ReportId,
) -> std::result::Result<String, TransportError> {
    let destination = &header.destination;
    let values = [
        ("report_id", sent_report_id.to_string()),
        ("organization", destination.organization.clone()),
        ("service", destination.service.clone()),
        ("schema", destination.schema_name.clone()),
        ("topic", destination.topic.clone()),
        ("item_count", header.report.item_count.to_string()),
        ("filename", header.external_filename(sent_report_id)),
    ];

    let mut rendered = template.to_string();
    for (name, value) in &values {
        rendered = rendered.replace(&format!("{{{{{name}}}}}"), value);
    }

    if let Some(start) = rendered.find("{{") {
        let placeholder: String = rendered[start..].chars().take_while(|c| *c != '}').collect();
        return Err(TransportError::Template(format!(
            "unknown placeholder {placeholder}}}}}"
        )));
    }
    Ok(rendered)
}

/// Email transport adapter
pub struct EmailTransport {
    mailer: Arc<dyn Mailer>,
    from: String,
    to: Vec<String>,
    subject_template: String,
    body_template: String,
    timeout: Duration,
}

impl EmailTransport {
    /// Create an adapter around any mailer
    pub fn new(config: &EmailTransportConfig, mailer: Arc<dyn Mailer>, timeout: Duration) -> Self {
        Self {
            mailer,
            from: config.from.clone(),
            to: config.to.clone(),
            subject_template: config.subject_template.clone(),
            body_template: config.body_template.clone(),
            timeout,
        }
    }

    fn params(&self, destination: &Destination) -> String {
        format!(
            "email to={} destination={}",
            self.to.join(","),
            destination.full_name()
        )
    }

    async fn attempt(
        &self,
        header: &ReportHeader,
        sent_report_id: ReportId,
    ) -> std::result::Result<String, TransportError> {
        let email = OutgoingEmail {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: render_template(&self.subject_template, header, sent_report_id)?,
            body: render_template(&self.body_template, header, sent_report_id)?,
        };
        self.mailer.deliver(&email).await
    }
}

#[async_trait]
impl TransportProtocol for EmailTransport {
    fn name(&self) -> &str {
        "email"
    }

    async fn start_session(
        &self,
        _destination: &Destination,
    ) -> Result<Option<Box<dyn TransportSession>>> {
        Ok(None)
    }

    async fn send(
        &self,
        header: &ReportHeader,
        sent_report_id: ReportId,
        _retry_items: &RetryItems,
        _session: Option<&mut (dyn TransportSession + 'static)>,
    ) -> Transmission {
        let params = self.params(&header.destination);
        let filename = header.external_filename(sent_report_id);

        let call = async {
            match self.attempt(header, sent_report_id).await {
                Ok(response) => Transmission::delivered(
                    params.clone(),
                    format!("email sent: {response}"),
                    header.report.item_count,
                ),
                Err(e) => {
                    tracing::warn!(
                        report_id = %sent_report_id,
                        destination = %header.destination.full_name(),
                        error = %e,
                        "Email delivery failed"
                    );
                    Transmission::retry_all(params.clone(), format!("email failed: {e}"))
                }
            }
        };

        with_send_timeout(self.timeout, params.clone(), call)
            .await
            .with_external_name(filename)
    }
}
