//! # Orvane World Server - Main Entry Point
//!
//! Authoritative world channel node for the Orvane cluster. This entry
//! point handles CLI parsing, configuration loading, and application
//! lifecycle management.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! orvane
//!
//! # Specify custom configuration
//! orvane --config channel-3.toml
//!
//! # Override specific settings
//! orvane --bind 0.0.0.0:5403 --channel-id 3 --log-level debug
//!
//! # JSON logging for production
//! orvane --json-logs
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default: `world.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! The server handles graceful shutdown on:
//! - SIGINT (Ctrl+C)
//! - SIGTERM (Unix systems)
//!
//! Shutdown removes the node's cluster record before dropping sessions, so
//! the login tier stops routing players here first.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Main entry point for the Orvane world server.
///
/// Handles the complete application lifecycle including:
/// 1. Command-line argument parsing
/// 2. Configuration loading and validation
/// 3. Logging system initialization
/// 4. Application creation and execution
/// 5. Error handling and cleanup
///
/// Note: This function is called from an async context (main with
/// #[tokio::main]), so it should NOT have #[tokio::main] itself.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration early to get logging settings.
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

// Re-export main types for potential library usage
pub use config::{AppConfig as Config, LoggingSettings, ProjectileSettings, ServerSettings};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn cli_args_carry_overrides() {
        let args = CliArgs {
            config_path: PathBuf::from("test.toml"),
            bind_address: Some("127.0.0.1:9000".to_string()),
            channel_id: Some(3),
            log_level: Some("debug".to_string()),
            json_logs: true,
        };

        assert_eq!(args.config_path, PathBuf::from("test.toml"));
        assert_eq!(args.bind_address, Some("127.0.0.1:9000".to_string()));
        assert_eq!(args.channel_id, Some(3));
        assert_eq!(args.log_level, Some("debug".to_string()));
        assert!(args.json_logs);
    }

    #[tokio::test]
    async fn application_applies_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let config_path = dir.path().join("world.toml");
        let toml_content =
            toml::to_string_pretty(&AppConfig::default()).expect("serialize failed");
        tokio::fs::write(&config_path, toml_content)
            .await
            .expect("write failed");

        let args = CliArgs {
            config_path,
            bind_address: Some("127.0.0.1:0".to_string()),
            channel_id: Some(9),
            log_level: None,
            json_logs: false,
        };

        let app = Application::new(args).await.expect("application failed");
        assert_eq!(app.config().server.id, 9);
        assert_eq!(app.config().server.bind_address, "127.0.0.1:0");
    }
}
