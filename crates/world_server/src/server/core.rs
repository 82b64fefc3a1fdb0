//! The world server itself.

use crate::cluster::{CacheManager, CacheType, ClusterCacheExt, WorldChannel};
use crate::config::WorldConfig;
use crate::database::WorldDatabase;
use crate::dispatch::HandlerInvoker;
use crate::error::ServerError;
use crate::handlers;
use crate::projectile::ProjectileTracker;
use crate::resources::{BehaviorManager, ChatCommandManager, GameResources, MapManager, ResourceLoader};
use crate::server::connection::run_connection;
use crate::session::SessionManager;
use orvane_event_system::messages::{
    PlayerCacheUpdate, PlayerConnected, PlayerDisconnected, PlayerMessengerBlockFriend,
    PlayerMessengerMessage, PlayerMessengerRemoveFriend, PlayerMessengerStatusUpdate,
};
use orvane_event_system::{DisconnectReason, Message, MessageBus, ShutdownState};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// One authoritative world node.
///
/// Startup order is fixed and fail-fast: persistence liveness, resource
/// tables, subsystems, handler and bus wiring, accept socket, and only then
/// the cluster advertisement. A node that fails any step never becomes
/// visible to the rest of the cluster.
pub struct WorldServer {
    config: WorldConfig,
    database: Arc<dyn WorldDatabase>,
    cache_manager: Arc<dyn CacheManager>,
    resources: GameResources,
    chat_commands: ChatCommandManager,
    behaviors: BehaviorManager,
    maps: MapManager,
    bus: Arc<MessageBus>,
    invoker: Arc<HandlerInvoker>,
    sessions: Arc<SessionManager>,
    projectiles: Arc<ProjectileTracker>,
    shutdown: ShutdownState,
    local_addr: RwLock<Option<SocketAddr>>,
}

impl WorldServer {
    pub fn new(
        config: WorldConfig,
        database: Arc<dyn WorldDatabase>,
        cache_manager: Arc<dyn CacheManager>,
    ) -> Self {
        let bus = Arc::new(MessageBus::new());
        let projectiles = Arc::new(ProjectileTracker::new());
        let sessions = Arc::new(SessionManager::new(bus.clone(), projectiles.clone()));
        Self {
            config,
            database,
            cache_manager,
            resources: GameResources::new(),
            chat_commands: ChatCommandManager::new(),
            behaviors: BehaviorManager::new(),
            maps: MapManager::new(),
            bus,
            invoker: Arc::new(HandlerInvoker::new()),
            sessions,
            projectiles,
            shutdown: ShutdownState::new(),
            local_addr: RwLock::new(None),
        }
    }

    /// Registers a resource loader to run during startup, in order.
    pub fn register_resource(&mut self, loader: Box<dyn ResourceLoader>) {
        self.resources.register(loader);
    }

    /// Brings the node up.
    ///
    /// Returns once the accept socket is live and the cluster advertisement
    /// has been attempted; the accept loop and sweep task keep running in
    /// the background until [`WorldServer::stop`].
    pub async fn start(&self) -> Result<(), ServerError> {
        info!(
            "🚀 Starting world channel '{}' (id {}, cluster {})",
            self.config.name, self.config.id, self.config.cluster_id
        );

        if !self.database.is_alive().await {
            return Err(ServerError::Database(
                "persistence layer did not answer the liveness probe".to_string(),
            ));
        }

        self.resources.load()?;
        self.chat_commands.load()?;
        self.behaviors.load()?;
        self.maps.load()?;

        handlers::register_all(&self.invoker, self.sessions.clone(), self.projectiles.clone());
        self.subscribe_cluster_messages().await?;

        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!("bind {} failed: {e}", self.config.bind_address))
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("local_addr: {e}")))?;
        if let Ok(mut slot) = self.local_addr.write() {
            *slot = Some(local_addr);
        }
        info!("👂 Listening on {}", local_addr);

        self.spawn_accept_loop(listener);
        self.spawn_sweep_task();

        // A failed advertisement is a visibility problem, not a local one:
        // the node keeps serving whoever reaches it directly.
        if let Err(e) = self.advertise_channel() {
            error!(
                "❌ Cluster visibility failure - channel record not published: {}",
                e
            );
        }

        info!("✅ World channel '{}' is up", self.config.name);
        Ok(())
    }

    /// Takes the node down gracefully.
    ///
    /// The cluster record is removed first so the login tier stops routing
    /// players here before sessions start dropping. Stopping an already
    /// stopped node repeats the checked delete harmlessly.
    pub async fn stop(&self) -> Result<(), ServerError> {
        self.shutdown.initiate_shutdown();

        let key = self.config.id.to_string();
        let cache = self.cache_manager.get_cache(CacheType::ClusterWorldChannels);
        if cache.contains(&key) {
            cache.delete(&key)?;
            info!("🌐 Removed world channel record '{}'", key);
        } else {
            warn!("World channel record '{}' was already absent", key);
        }

        for session in self.sessions.all() {
            self.sessions
                .disconnect(session.id(), DisconnectReason::ServerKick)
                .await;
        }

        self.shutdown.complete_shutdown();
        Ok(())
    }

    /// Address the accept socket actually bound to. `None` before `start`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.read().ok().and_then(|slot| *slot)
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn projectiles(&self) -> &Arc<ProjectileTracker> {
        &self.projectiles
    }

    pub fn invoker(&self) -> &Arc<HandlerInvoker> {
        &self.invoker
    }

    pub fn shutdown_state(&self) -> &ShutdownState {
        &self.shutdown
    }

    /// Subscribes every cluster message this node consumes, forwarding each
    /// delivery into the handler invoker on its own task so bus publishing
    /// never waits on handler work.
    async fn subscribe_cluster_messages(&self) -> Result<(), ServerError> {
        bridge::<PlayerConnected>(&self.bus, &self.invoker, PlayerConnected::NAME).await?;
        bridge::<PlayerDisconnected>(&self.bus, &self.invoker, PlayerDisconnected::NAME).await?;
        bridge::<PlayerMessengerStatusUpdate>(
            &self.bus,
            &self.invoker,
            PlayerMessengerStatusUpdate::NAME,
        )
        .await?;
        bridge::<PlayerMessengerRemoveFriend>(
            &self.bus,
            &self.invoker,
            PlayerMessengerRemoveFriend::NAME,
        )
        .await?;
        bridge::<PlayerMessengerBlockFriend>(
            &self.bus,
            &self.invoker,
            PlayerMessengerBlockFriend::NAME,
        )
        .await?;
        bridge::<PlayerMessengerMessage>(&self.bus, &self.invoker, PlayerMessengerMessage::NAME)
            .await?;
        bridge::<PlayerCacheUpdate>(&self.bus, &self.invoker, PlayerCacheUpdate::NAME).await?;
        Ok(())
    }

    fn spawn_accept_loop(&self, listener: TcpListener) {
        let sessions = self.sessions.clone();
        let invoker = self.invoker.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut shutdown_poll = tokio::time::interval(Duration::from_millis(250));
            loop {
                tokio::select! {
                    accepted = listener.accept() => match accepted {
                        Ok((stream, addr)) => {
                            if shutdown.is_shutdown_initiated() {
                                break;
                            }
                            let sessions = sessions.clone();
                            let invoker = invoker.clone();
                            tokio::spawn(run_connection(stream, addr, sessions, invoker));
                        }
                        Err(e) => {
                            warn!("Accept failed: {}", e);
                        }
                    },
                    _ = shutdown_poll.tick() => {
                        if shutdown.is_shutdown_initiated() {
                            break;
                        }
                    }
                }
            }
            info!("👂 Accept loop stopped");
        });
    }

    fn spawn_sweep_task(&self) {
        let every = self.config.projectile_sweep_interval;
        if every.is_zero() {
            return;
        }
        let ttl = self.config.projectile_ttl;
        let projectiles = self.projectiles.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if shutdown.is_shutdown_initiated() {
                    break;
                }
                projectiles.sweep_expired(ttl);
            }
        });
    }

    /// Publishes this node's reachability record. Last startup step: the
    /// record must never exist while the socket is down.
    fn advertise_channel(&self) -> Result<(), ServerError> {
        let channel = WorldChannel {
            cluster_id: self.config.cluster_id,
            host: self.config.host.clone(),
            port: self.config.port,
            id: self.config.id,
            name: self.config.name.clone(),
        };
        let cache = self.cache_manager.get_cache(CacheType::ClusterWorldChannels);
        cache.set_record(&channel.id.to_string(), &channel)?;
        info!(
            "🌐 Advertised world channel '{}' at {}:{}",
            channel.name, channel.host, channel.port
        );
        Ok(())
    }
}

/// Forwards one bus message name into the invoker.
async fn bridge<T>(
    bus: &Arc<MessageBus>,
    invoker: &Arc<HandlerInvoker>,
    name: &'static str,
) -> Result<(), ServerError>
where
    T: Message + Serialize + Send + 'static,
{
    let invoker = invoker.clone();
    bus.subscribe(name, move |payload: T| {
        let invoker = invoker.clone();
        tokio::spawn(async move {
            if let Err(e) = invoker.dispatch_message(name, &payload).await {
                error!("❌ Message handler for '{}' failed: {}", name, e);
            }
        });
        Ok(())
    })
    .await
    .map_err(|e| ServerError::Internal(format!("bus subscription for '{name}': {e}")))
}
