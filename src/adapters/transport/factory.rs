//! Transport factory
//!
//! Maps a destination's transport kind to a configured adapter.

use super::email::{EmailTransport, SmtpMailer};
use super::file_drop::FileDropTransport;
use super::rest::RestTransport;
use super::traits::TransportProtocol;
use crate::config::schema::ConduitConfig;
use crate::domain::{ConduitError, Result, TransportKind};
use std::sync::Arc;
use std::time::Duration;

/// Create the adapter for `kind` from the `[transports]` configuration
///
/// # Errors
///
/// Returns an error if the transport section is missing or the adapter
/// cannot be built.
pub fn create_transport(
    kind: TransportKind,
    config: &ConduitConfig,
) -> Result<Arc<dyn TransportProtocol>> {
    let send_timeout = Duration::from_secs(config.delivery.send_timeout_seconds);
    let missing = || {
        ConduitError::Configuration(format!(
            "transport '{kind}' requested but [transports.{kind}] is not configured"
        ))
    };

    match kind {
        TransportKind::Email => {
            let email = config.transports.email.as_ref().ok_or_else(missing)?;
            let mailer = SmtpMailer::from_config(email)?;
            Ok(Arc::new(EmailTransport::new(email, Arc::new(mailer), send_timeout)))
        }
        TransportKind::FileDrop => {
            let file_drop = config.transports.file_drop.as_ref().ok_or_else(missing)?;
            Ok(Arc::new(FileDropTransport::new(file_drop, send_timeout)))
        }
        TransportKind::Rest => {
            let rest = config.transports.rest.as_ref().ok_or_else(missing)?;
            Ok(Arc::new(RestTransport::new(rest)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_missing_section_is_configuration_error() {
        let config = parse_config("store_target = \"memory\"").unwrap();
        let err = create_transport(TransportKind::Rest, &config).err().unwrap();
        assert!(matches!(err, ConduitError::Configuration(_)));
    }

    #[test]
    fn test_file_drop_from_config() {
        let config = parse_config(
            r#"
store_target = "memory"

[transports.file_drop]
directory = "/tmp/conduit-test-drop"
"#,
        )
        .unwrap();
        let transport = create_transport(TransportKind::FileDrop, &config).unwrap();
        assert_eq!(transport.name(), "file_drop");
    }
}
