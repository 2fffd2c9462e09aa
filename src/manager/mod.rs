//! The log manager: entry points and reconfiguration coordination.
//!
//! # Data Flow
//! ```text
//! get_logger(name)
//!     → existing handle? return it (lock-free)
//!     → else, under the shared barrier: resolve node, bind backend, cache
//!
//! set_level / reconfigure
//!     → validate and build everything fallible first
//!     → exclusive barrier: mutate nodes in place, rebind handles
//! ```
//!
//! # Design Decisions
//! - Emitting never touches the barrier; only handle creation and
//!   reconfiguration do
//! - A rejected configuration leaves every node, handle and appender as it was
//! - Nodes and handles are never evicted

mod reconfigure;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use arc_swap::ArcSwap;

use crate::appender::{sync_all, Appender, AppenderRegistry, AppenderSet, SyncError};
use crate::config::schema::LogConfig;
use crate::config::validation::validate_config;
use crate::config::ConfigError;
use crate::error::Result;
use crate::level::Level;
use crate::logger::LoggerHandle;
use crate::observability::metrics;
use crate::routing::{build_tree, NodePolicy, NodeRegistry, RoutingNode};

pub(crate) struct Shared {
    registry: NodeRegistry,
    appenders: ArcSwap<AppenderSet>,
    barrier: RwLock<()>,
    factories: AppenderRegistry,
}

impl Shared {
    /// The handle for `name`, created on first use.
    pub(crate) fn logger(self: &Arc<Self>, name: &str) -> LoggerHandle {
        if let Some(handle) = self.registry.handle(name) {
            return handle;
        }

        let _shared = self.read_barrier();
        let appenders = self.appenders.load();
        let handle = self
            .registry
            .get_or_create_handle(name, &appenders, &Arc::downgrade(self));
        metrics::record_handles(self.registry.handle_count());
        handle
    }

    fn read_barrier(&self) -> RwLockReadGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned barrier carries no broken state.
        self.barrier.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_barrier(&self) -> RwLockWriteGuard<'_, ()> {
        self.barrier.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns a logger hierarchy, its appenders, and every handle given out.
///
/// Cloning is cheap; clones share the same hierarchy.
#[derive(Clone)]
pub struct LogManager {
    shared: Arc<Shared>,
}

impl LogManager {
    /// Build a manager from `config` using the built-in appender types.
    pub fn new(config: &LogConfig) -> Result<Self> {
        Self::with_registry(config, AppenderRegistry::default())
    }

    /// Build a manager whose appenders come from `factories`.
    pub fn with_registry(config: &LogConfig, factories: AppenderRegistry) -> Result<Self> {
        validate_config(config).map_err(ConfigError::Validation)?;
        let appenders = factories.build(&config.appenders)?;
        let registry = build_tree(config, Vec::new())?;

        tracing::debug!(
            appenders = appenders.len(),
            loggers = config.loggers.len(),
            "log manager created"
        );
        Ok(Self {
            shared: Arc::new(Shared {
                registry,
                appenders: ArcSwap::from_pointee(appenders),
                barrier: RwLock::new(()),
                factories,
            }),
        })
    }

    /// A manager with no appenders; every handle discards its records.
    pub fn disabled() -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: NodeRegistry::new(NodePolicy::default()),
                appenders: ArcSwap::from_pointee(AppenderSet::new(Vec::new())),
                barrier: RwLock::new(()),
                factories: AppenderRegistry::default(),
            }),
        }
    }

    /// The handle for `name`. Repeated calls return the same logger.
    pub fn get_logger(&self, name: &str) -> LoggerHandle {
        Shared::logger(&self.shared, name)
    }

    /// Set `level` on `name`.
    ///
    /// With no appender names, the node's default level and every appender
    /// it routes to move to `level`. Otherwise only the named appenders do.
    /// The handle for `name`, if any, is rebound before this returns.
    pub fn set_level(&self, name: &str, level: Level, appenders: &[&str]) {
        let shared = &self.shared;
        let _exclusive = shared.write_barrier();

        let node = if appenders.is_empty() {
            shared.registry.set_default_level(name, level)
        } else {
            let mut node = None;
            for appender in appenders {
                node = Some(shared.registry.set_appender_level(name, appender, level));
            }
            node.unwrap_or_else(|| shared.registry.resolve(name))
        };

        if let Some(handle) = shared.registry.handle(node.name()) {
            shared.registry.rebind(&handle, &shared.appenders.load());
        }
        tracing::debug!(logger = node.name(), %level, ?appenders, "level changed");
    }

    /// Flush every appender reachable from any handle plus the current
    /// generation. Each appender is flushed once; failures are aggregated.
    pub fn sync(&self) -> Result<(), SyncError> {
        let current = self.shared.appenders.load_full();
        let mut appenders: Vec<Appender> = current.iter().cloned().collect();
        for handle in self.shared.registry.handles() {
            for appender in handle.bound_appenders() {
                if !appenders.iter().any(|known| known.same_writer(&appender)) {
                    appenders.push(appender);
                }
            }
        }
        sync_all(appenders.iter())
    }

    /// Node for `name`, created from its parent if missing.
    pub fn node(&self, name: &str) -> Arc<RoutingNode> {
        let _shared = self.shared.read_barrier();
        self.shared.registry.resolve(name)
    }

    /// Effective policy for `name` right now.
    pub fn policy(&self, name: &str) -> Arc<NodePolicy> {
        self.node(name).policy()
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.shared.registry
    }

    /// The current appender generation.
    pub fn appenders(&self) -> Arc<AppenderSet> {
        self.shared.appenders.load_full()
    }
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("nodes", &self.shared.registry.node_count())
            .field("handles", &self.shared.registry.handle_count())
            .field("appenders", &self.shared.appenders.load().names())
            .finish()
    }
}
