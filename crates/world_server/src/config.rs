//! World server configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for one world node.
///
/// `id` and `cluster_id` together identify this node inside the cluster;
/// `host`/`port` are the address advertised to sibling processes through the
/// cluster cache (which may differ from `bind_address` behind NAT).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Numeric channel id of this node, unique within the cluster.
    pub id: u16,
    /// Cluster this node belongs to.
    pub cluster_id: u16,
    /// Display name shown in the channel list.
    pub name: String,
    /// Host advertised to the login tier and sibling nodes.
    pub host: String,
    /// Port advertised to the login tier and sibling nodes.
    pub port: u16,
    /// Local address the accept socket binds to.
    pub bind_address: SocketAddr,
    /// How long an unresolved projectile stays tracked before the sweep
    /// retires it.
    pub projectile_ttl: Duration,
    /// Interval between projectile sweep passes. Zero disables the sweep.
    pub projectile_sweep_interval: Duration,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            id: 1,
            cluster_id: 1,
            name: "Orvane".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5400,
            bind_address: SocketAddr::from(([127, 0, 0, 1], 5400)),
            projectile_ttl: Duration::from_secs(30),
            projectile_sweep_interval: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let config = WorldConfig::default();
        assert_eq!(config.bind_address.port(), config.port);
        assert!(config.projectile_ttl > config.projectile_sweep_interval);
    }
}
