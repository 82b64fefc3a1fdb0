//! Main application logic and lifecycle management.
//!
//! This module contains the core `Application` struct that orchestrates
//! world node startup, monitoring, and shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{setup_signal_handlers, setup_signal_handlers_silent},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use world_server::{InMemoryCacheManager, StaticDatabase, WorldServer};

/// Main application struct.
///
/// Manages the complete lifecycle of one Orvane world node: configuration
/// loading, server initialization, health monitoring, and graceful shutdown
/// handling.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// World server instance
    server: WorldServer,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// Loads configuration, applies CLI overrides, validates settings, and
    /// initializes the world server.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Initialize the world server with configuration
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!(
            "🔧 Loading configuration from: {}",
            args.config_path.display()
        );
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }

        if let Some(channel_id) = args.channel_id {
            config.server.id = channel_id;
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        // The binary wires the in-process backends; deployments embedding
        // the crate supply their own persistence and cache implementations
        // through `WorldServer::new`.
        let world_config = config.to_world_config()?;
        let server = WorldServer::new(
            world_config,
            Arc::new(StaticDatabase::reachable()),
            Arc::new(InMemoryCacheManager::new()),
        );

        info!(
            "📂 Config: {} | Channel: {} (id {}, cluster {})",
            args.config_path.display(),
            config.server.name,
            config.server.id,
            config.server.cluster_id
        );

        Ok(Self { config, server })
    }

    /// Runs the application until a shutdown signal arrives.
    ///
    /// Starts the server, spawns a periodic health report, waits for the
    /// signal, and takes the node down gracefully. A second signal during
    /// shutdown exits immediately.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.log_configuration_summary();

        self.server.start().await?;

        let monitoring_handle = {
            let bus = self.server.bus().clone();
            let sessions = self.server.sessions().clone();
            let projectiles = self.server.projectiles().clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
                let mut last_published = 0u64;

                loop {
                    interval.tick().await;

                    let stats = bus.get_stats().await;
                    let messages_this_period = stats.messages_published - last_published;
                    last_published = stats.messages_published;

                    info!(
                        "📊 System Health - {} msg/min | {} session(s) | {} projectile(s) in flight",
                        messages_this_period,
                        sessions.count(),
                        projectiles.len()
                    );
                }
            })
        };

        info!("✅ Orvane world node is now running!");
        info!(
            "🎮 Ready to accept connections on {}",
            self.config.server.bind_address
        );
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        setup_signal_handlers().await?;

        // A second signal during shutdown exits without draining.
        tokio::spawn(async move {
            if let Err(e) = setup_signal_handlers_silent().await {
                error!("Failed to set up second-signal handler: {e}");
                return;
            }
            warn!("Shutdown signal received again! I'll make this quick.");
            std::process::exit(1);
        });

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        monitoring_handle.abort();

        self.server.stop().await?;

        let final_stats = self.server.bus().get_stats().await;
        info!("📊 Final Statistics:");
        info!(
            "  - Total messages published: {}",
            final_stats.messages_published
        );
        info!("  - Handlers registered: {}", final_stats.total_handlers);

        info!("✅ Orvane world node shutdown complete");
        Ok(())
    }

    /// The merged configuration the application is running with.
    #[cfg(test)]
    pub(crate) fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!(
            "  🌍 Advertised: {}:{}",
            self.config.server.advertised_host, self.config.server.advertised_port
        );
        info!(
            "  🏹 Projectile TTL: {}s (sweep every {}s)",
            self.config.projectiles.ttl_secs, self.config.projectiles.sweep_interval_secs
        );
    }
}
