//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{ConduitConfig, StoreTarget};
use super::secret::secret_string;
use crate::domain::{ConduitError, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ConduitConfig
/// 4. Applies environment variable overrides (CONDUIT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use conduit::config::loader::load_config;
///
/// let config = load_config("conduit.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ConduitConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConduitError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ConduitError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses, overrides and validates configuration text
///
/// # Errors
///
/// Same as [`load_config`] minus the file access errors.
pub fn parse_config(contents: &str) -> Result<ConduitConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ConduitConfig = toml::from_str(&contents)
        .map_err(|e| ConduitError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        ConduitError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ConduitError::Other(format!("invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ConduitError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using CONDUIT_* prefix
///
/// Environment variables follow the pattern: CONDUIT_<SECTION>_<KEY>
/// For example: CONDUIT_APPLICATION_DRY_RUN, CONDUIT_DELIVERY_MAX_ATTEMPTS
fn apply_env_overrides(config: &mut ConduitConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("CONDUIT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("CONDUIT_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    if let Ok(val) = std::env::var("CONDUIT_STORE_TARGET") {
        match val.to_lowercase().as_str() {
            "postgresql" => config.store_target = StoreTarget::PostgreSQL,
            "memory" => config.store_target = StoreTarget::Memory,
            other => tracing::warn!(value = other, "Ignoring unknown CONDUIT_STORE_TARGET"),
        }
    }

    // PostgreSQL overrides (only if PostgreSQL is configured)
    if let Some(ref mut pg) = config.postgresql {
        if let Ok(val) = std::env::var("CONDUIT_POSTGRESQL_CONNECTION_STRING") {
            pg.connection_string = secret_string(val);
        }
        if let Ok(val) = std::env::var("CONDUIT_POSTGRESQL_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                pg.max_connections = max;
            }
        }
        if let Ok(val) = std::env::var("CONDUIT_POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    // Lineage overrides
    if let Ok(val) = std::env::var("CONDUIT_LINEAGE_MAX_COLUMN_WIDTH") {
        if let Ok(width) = val.parse() {
            config.lineage.max_column_width = width;
        }
    }

    // Delivery overrides
    if let Ok(val) = std::env::var("CONDUIT_DELIVERY_MAX_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.delivery.max_attempts = attempts;
        }
    }
    if let Ok(val) = std::env::var("CONDUIT_DELIVERY_SEND_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.delivery.send_timeout_seconds = timeout;
        }
    }

    // Transport credential overrides
    if let Some(ref mut email) = config.transports.email {
        if let Ok(val) = std::env::var("CONDUIT_TRANSPORTS_EMAIL_PASSWORD") {
            email.password = Some(secret_string(val));
        }
    }
    if let Some(ref mut rest) = config.transports.rest {
        if let Ok(val) = std::env::var("CONDUIT_TRANSPORTS_REST_PASSWORD") {
            rest.password = Some(secret_string(val));
        }
        if let Ok(val) = std::env::var("CONDUIT_TRANSPORTS_REST_TOKEN") {
            rest.token = Some(secret_string(val));
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("CONDUIT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("CONDUIT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("CONDUIT_TEST_SUBST_VAR", "test_value");
        let input = "password = \"${CONDUIT_TEST_SUBST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result.trim_end(), "password = \"test_value\"");
        std::env::remove_var("CONDUIT_TEST_SUBST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("CONDUIT_TEST_MISSING_VAR");
        let input = "password = \"${CONDUIT_TEST_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("CONDUIT_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# password = \"${CONDUIT_TEST_COMMENTED_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${CONDUIT_TEST_COMMENTED_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("nonexistent.toml").is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
store_target = "memory"

[application]
log_level = "debug"

[lineage]
max_column_width = 1024

[transports.file_drop]
directory = "/tmp/conduit-drop"

[[destinations]]
organization = "az-phd"
service = "elr"
schema_name = "covid-19"
topic = "covid-19"
transport = "file_drop"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.lineage.max_column_width, 1024);
        assert_eq!(config.destinations.len(), 1);
        assert_eq!(config.destinations[0].to_destination().full_name(), "az-phd.elr");
    }
}
