//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Conduit using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Conduit - Health report routing with lineage tracking
#[derive(Parser, Debug)]
#[command(name = "conduit")]
#[command(version, about, long_about = None)]
#[command(author = "Conduit Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "conduit.toml", env = "CONDUIT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CONDUIT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Apply the lineage schema to PostgreSQL
    Migrate(commands::migrate::MigrateArgs),

    /// Receive a local file and deliver it to every configured destination
    Deliver(commands::deliver::DeliverArgs),

    /// Show parents and children of a report
    Lineage(commands::lineage::LineageArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["conduit", "validate-config"]);
        assert_eq!(cli.config, "conduit.toml");
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["conduit", "--config", "custom.toml", "migrate"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Migrate(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["conduit", "--log-level", "debug", "init"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_parse_deliver() {
        let cli = Cli::parse_from([
            "conduit",
            "deliver",
            "--file",
            "batch.csv",
            "--org",
            "simple_report",
            "--client",
            "default",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Deliver(args) => {
                assert_eq!(args.file, "batch.csv");
                assert_eq!(args.org, "simple_report");
                assert_eq!(args.client, "default");
                assert_eq!(args.schema, "covid-19");
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_deliver_requires_file() {
        let result = Cli::try_parse_from(["conduit", "deliver", "--org", "o", "--client", "c"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_lineage() {
        let cli = Cli::parse_from([
            "conduit",
            "lineage",
            "--report",
            "6f1c1f0e-3a53-4c7c-9b8e-1c2d3e4f5a6b",
        ]);
        assert!(matches!(cli.command, Commands::Lineage(_)));
    }
}
