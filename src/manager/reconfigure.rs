//! Hot reconfiguration.
//!
//! A new configuration is validated and its appenders are built before the
//! live hierarchy is touched. The swap itself runs under the exclusive
//! barrier:
//!
//! 1. carry over declarations that vanished but still back a handle
//! 2. build the staged tree
//! 3. flush the outgoing appenders
//! 4. overwrite live node policies from the staged tree
//! 5. rebind every handle against the new appenders
//! 6. publish the new appender generation and flush the retired one

use std::sync::Arc;
use std::time::Instant;

use crate::appender::AppenderSet;
use crate::config::schema::LogConfig;
use crate::config::validation::validate_config;
use crate::config::ConfigError;
use crate::error::{Error, Result};
use crate::manager::LogManager;
use crate::observability::metrics;
use crate::routing::build_tree;

impl LogManager {
    /// Replace the active configuration.
    ///
    /// Every handle already given out keeps its identity and starts routing
    /// by the new configuration before this returns. On error nothing
    /// changes.
    pub fn reconfigure(&self, config: &LogConfig) -> Result<()> {
        let started = Instant::now();
        match self.apply(config) {
            Ok(handles) => {
                metrics::record_reconfiguration("applied");
                tracing::info!(
                    handles,
                    appenders = config.appenders.len(),
                    loggers = config.loggers.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "logging reconfigured"
                );
                Ok(())
            }
            Err(error) => {
                metrics::record_reconfiguration("rejected");
                tracing::warn!(%error, "logging configuration rejected, keeping the current one");
                Err(error)
            }
        }
    }

    fn apply(&self, config: &LogConfig) -> Result<usize> {
        validate_config(config).map_err(ConfigError::Validation)?;
        let appenders = Arc::new(self.shared.factories.build(&config.appenders)?);

        let shared = &self.shared;
        let _exclusive = shared.write_barrier();

        let retained = shared
            .registry
            .declared_policies()
            .into_iter()
            .filter(|(name, _)| shared.registry.handle(name).is_some())
            .collect();
        let staged = build_tree(config, retained).map_err(Error::from)?;

        let retiring = shared.appenders.load_full();
        if let Err(error) = retiring.sync() {
            tracing::warn!(%error, "failed to flush appenders before reconfiguration");
        }

        shared.registry.adopt(&staged);

        let handles = shared.registry.handles();
        for handle in &handles {
            shared.registry.rebind(handle, &appenders);
        }

        shared.appenders.store(appenders);
        retire(&retiring);
        Ok(handles.len())
    }
}

fn retire(appenders: &AppenderSet) {
    if let Err(error) = appenders.sync() {
        tracing::warn!(%error, "failed to flush retired appenders");
    }
}

#[cfg(test)]
mod tests {
    use crate::config::schema::{AppenderConfig, LogConfig, LoggerConfig};
    use crate::level::Level;
    use crate::manager::LogManager;

    fn config(root_level: &str) -> LogConfig {
        let mut config = LogConfig::empty();
        config
            .appenders
            .push(AppenderConfig::new("CONSOLE", "console").with_option("target", "discard"));
        config.root.level = root_level.into();
        config.root.appender_refs = vec!["CONSOLE".into()];
        config
    }

    #[test]
    fn test_reconfigure_updates_existing_handles() {
        let manager = LogManager::new(&config("info")).unwrap();
        let handle = manager.get_logger("a/b");
        assert_eq!(handle.min_level(), Level::Info);

        manager.reconfigure(&config("error")).unwrap();
        assert!(handle.ptr_eq(&manager.get_logger("a/b")));
        assert_eq!(handle.min_level(), Level::Error);
    }

    #[test]
    fn test_rejected_config_changes_nothing() {
        let manager = LogManager::new(&config("info")).unwrap();
        let handle = manager.get_logger("svc");
        let before = manager.appenders();

        let mut bad = config("debug");
        bad.appenders.push(AppenderConfig::new("X", "carrier-pigeon"));
        assert!(manager.reconfigure(&bad).is_err());

        assert_eq!(handle.min_level(), Level::Info);
        assert!(std::sync::Arc::ptr_eq(&before, &manager.appenders()));
    }

    #[test]
    fn test_removed_declaration_is_retained_for_live_handles() {
        let mut first = config("info");
        first.loggers.push(LoggerConfig::new("kept").with_level("debug"));
        first.loggers.push(LoggerConfig::new("unused").with_level("debug"));
        let manager = LogManager::new(&first).unwrap();
        let kept = manager.get_logger("kept");

        manager.reconfigure(&config("warn")).unwrap();

        assert_eq!(kept.min_level(), Level::Debug);
        assert_eq!(manager.get_logger("kept/child").min_level(), Level::Debug);
        assert_eq!(manager.get_logger("unused").min_level(), Level::Warn);
    }
}
