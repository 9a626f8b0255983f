//! Delivery transports
//!
//! One [`TransportProtocol`] capability, implemented per destination kind:
//! - [`email`] (binary granularity, SMTP via lettre)
//! - [`file_drop`] (binary granularity, local directory)
//! - [`rest`] (per-item granularity, HTTP)

pub mod email;
pub mod factory;
pub mod file_drop;
pub mod rest;
pub mod traits;

pub use email::{EmailTransport, Mailer, OutgoingEmail, SmtpMailer};
pub use factory::create_transport;
pub use file_drop::FileDropTransport;
pub use rest::{RestSession, RestTransport};
pub use traits::{with_send_timeout, TransportProtocol, TransportSession, Transmission};
