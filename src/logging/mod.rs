//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels
//! - Console output
//! - JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use conduit::logging::init_logging;
//! use conduit::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a committed action
///
/// # Example
///
/// ```no_run
/// use conduit::log_commit;
/// use conduit::domain::{ActionId, ActionKind};
///
/// log_commit!(ActionId::new(7), ActionKind::Receive, 1, 0);
/// ```
#[macro_export]
macro_rules! log_commit {
    ($action_id:expr, $kind:expr, $reports:expr, $edges:expr) => {
        tracing::info!(
            action_id = %$action_id,
            action = %$kind,
            reports = $reports,
            edges = $edges,
            "Action committed"
        );
    };
}

/// Log one delivery attempt
///
/// # Example
///
/// ```no_run
/// use conduit::log_delivery_attempt;
///
/// log_delivery_attempt!("az-phd.elr", "7d44b88c-4199-4bad-97dc-d78268e01398", 1, "retry-all");
/// ```
#[macro_export]
macro_rules! log_delivery_attempt {
    ($destination:expr, $report_id:expr, $attempt:expr, $outcome:expr) => {
        tracing::info!(
            destination = %$destination,
            report_id = %$report_id,
            attempt = $attempt,
            outcome = %$outcome,
            "Delivery attempt finished"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use conduit::log_error_with_context;
/// use conduit::domain::ConduitError;
///
/// let error = ConduitError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use conduit::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "retry-all");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying delivery"
        );
    };
}
