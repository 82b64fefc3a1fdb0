//! Application configuration loaded from a TOML file.
//!
//! The on-disk shape is split into sections (`[server]`, `[projectiles]`,
//! `[logging]`) and translated into the typed [`WorldConfig`] the server
//! core consumes. CLI flags override individual fields after loading.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use world_server::WorldConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// World node identity and addresses.
    pub server: ServerSettings,
    /// Projectile tracking tunables.
    #[serde(default)]
    pub projectiles: ProjectileSettings,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// World node identity and network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Numeric channel id, unique within the cluster.
    pub id: u16,
    /// Cluster this node belongs to.
    pub cluster_id: u16,
    /// Display name shown in the channel list.
    pub name: String,
    /// Local address the accept socket binds to.
    pub bind_address: String,
    /// Host advertised to the login tier and sibling nodes.
    pub advertised_host: String,
    /// Port advertised to the login tier and sibling nodes.
    pub advertised_port: u16,
}

/// Projectile tracking tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSettings {
    /// Seconds an unresolved projectile stays tracked before the sweep
    /// retires it.
    #[serde(default = "default_projectile_ttl_secs")]
    pub ttl_secs: u64,
    /// Seconds between sweep passes. Zero disables the sweep.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Logging system configuration.
///
/// Controls log output format, levels, and destination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

fn default_projectile_ttl_secs() -> u64 {
    30
}

fn default_sweep_interval_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_projectile_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                id: 1,
                cluster_id: 1,
                name: "Orvane".to_string(),
                bind_address: "127.0.0.1:5400".to_string(),
                advertised_host: "127.0.0.1".to_string(),
                advertised_port: 5400,
            },
            projectiles: ProjectileSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at
    /// the specified path and returns the default configuration.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Translates the TOML shape into the config the server core consumes.
    pub fn to_world_config(&self) -> Result<WorldConfig, Box<dyn std::error::Error>> {
        Ok(WorldConfig {
            id: self.server.id,
            cluster_id: self.server.cluster_id,
            name: self.server.name.clone(),
            host: self.server.advertised_host.clone(),
            port: self.server.advertised_port,
            bind_address: self.server.bind_address.parse()?,
            projectile_ttl: Duration::from_secs(self.projectiles.ttl_secs),
            projectile_sweep_interval: Duration::from_secs(self.projectiles.sweep_interval_secs),
        })
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self
            .server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(format!(
                "Invalid bind address: {}",
                &self.server.bind_address
            ));
        }

        if self.server.name.trim().is_empty() {
            return Err("Channel name cannot be empty".to_string());
        }

        if self.server.advertised_host.trim().is_empty() {
            return Err("Advertised host cannot be empty".to_string());
        }

        if self.projectiles.ttl_secs == 0 {
            return Err("projectiles.ttl_secs must be greater than 0".to_string());
        }

        if self.projectiles.sweep_interval_secs > self.projectiles.ttl_secs {
            return Err(
                "projectiles.sweep_interval_secs must not exceed projectiles.ttl_secs".to_string(),
            );
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_valid_and_converts() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let world = config.to_world_config().expect("conversion failed");
        assert_eq!(world.id, 1);
        assert_eq!(world.port, 5400);
        assert_eq!(world.projectile_ttl, Duration::from_secs(30));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.server.bind_address = "not-an-address".to_string();
        assert!(config.validate().is_err());

        config.server.bind_address = "127.0.0.1:5400".to_string();
        config.projectiles.ttl_secs = 0;
        assert!(config.validate().is_err());

        config.projectiles.ttl_secs = 5;
        config.projectiles.sweep_interval_secs = 10;
        assert!(config.validate().is_err());

        config.projectiles.sweep_interval_secs = 5;
        config.logging.level = "noisy".to_string();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("world.toml");

        let config = AppConfig::load_from_file(&path).await.expect("load failed");
        assert!(path.exists());
        assert_eq!(config.server.id, AppConfig::default().server.id);
    }

    #[tokio::test]
    async fn partial_file_fills_in_section_defaults() {
        let file = NamedTempFile::new().expect("tempfile failed");
        let content = r#"
[server]
id = 3
cluster_id = 1
name = "Channel-3"
bind_address = "0.0.0.0:5403"
advertised_host = "10.0.0.5"
advertised_port = 5403
"#;
        tokio::fs::write(file.path(), content)
            .await
            .expect("write failed");

        let config = AppConfig::load_from_file(&file.path().to_path_buf())
            .await
            .expect("load failed");
        assert_eq!(config.server.id, 3);
        assert_eq!(config.projectiles.ttl_secs, 30);
        assert_eq!(config.logging.level, "info");
    }
}
