//! Resource and subsystem loading boundaries.
//!
//! Definition-file parsing (items, movers, skills, quests), chat-command
//! text handling, AI behaviors, and map data all live behind simple `load`
//! seams. The world server only cares that each collaborator loads
//! successfully, in order, before the first socket is accepted.

use crate::error::ServerError;
use tracing::{debug, info};

/// One loadable resource table.
///
/// Implementations parse their definition files elsewhere; the core invokes
/// them sequentially during startup and treats any failure as fatal.
pub trait ResourceLoader: Send + Sync {
    /// Stable loader name for logging.
    fn name(&self) -> &'static str;

    /// Loads the table into memory.
    fn load(&self) -> Result<(), ServerError>;
}

/// Ordered registry of resource loaders.
pub struct GameResources {
    loaders: Vec<Box<dyn ResourceLoader>>,
}

impl GameResources {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    /// Appends a loader. Loaders run in registration order.
    pub fn register(&mut self, loader: Box<dyn ResourceLoader>) {
        self.loaders.push(loader);
    }

    /// Runs every registered loader in order.
    ///
    /// The first failure aborts the sequence; resource loading happens
    /// before any socket is opened, so a failure here is a startup abort.
    pub fn load(&self) -> Result<(), ServerError> {
        for loader in &self.loaders {
            debug!("Loading resource table '{}'", loader.name());
            loader.load()?;
        }
        info!("📚 Loaded {} resource table(s)", self.loaders.len());
        Ok(())
    }

    /// Number of registered loaders.
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl Default for GameResources {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat-command registry boundary. Parsing and authority checks live in the
/// commands crate; the core only triggers the load.
pub struct ChatCommandManager;

impl ChatCommandManager {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self) -> Result<(), ServerError> {
        debug!("Chat command registry loaded");
        Ok(())
    }
}

impl Default for ChatCommandManager {
    fn default() -> Self {
        Self::new()
    }
}

/// AI behavior registry boundary.
pub struct BehaviorManager;

impl BehaviorManager {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self) -> Result<(), ServerError> {
        debug!("Behavior registry loaded");
        Ok(())
    }
}

impl Default for BehaviorManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Map data boundary.
pub struct MapManager;

impl MapManager {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self) -> Result<(), ServerError> {
        debug!("Map data loaded");
        Ok(())
    }
}

impl Default for MapManager {
    fn default() -> Self {
        Self::new()
    }
}
