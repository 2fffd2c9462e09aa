//! Builds a routing tree from configuration.
//!
//! Declarations are applied shallowest first so each one starts from its
//! nearest ancestor's finished policy.

use std::sync::Arc;

use crate::config::schema::{AppenderLevelConfig, LogConfig, LoggerConfig, RootLoggerConfig};
use crate::config::validation::ValidationError;
use crate::level::Level;
use crate::routing::node::{NodePolicy, SEPARATOR};
use crate::routing::registry::NodeRegistry;

const ROOT_DISPLAY_NAME: &str = "root";

/// Build a staged tree for `config`.
///
/// `retained` holds declarations to carry over from a previous tree. A
/// configured logger of the same name replaces its retained policy.
pub fn build_tree(
    config: &LogConfig,
    retained: Vec<(Arc<str>, Arc<NodePolicy>)>,
) -> Result<NodeRegistry, ValidationError> {
    let registry = NodeRegistry::new(root_policy(&config.root)?);

    let mut declarations: Vec<Declaration<'_>> = retained
        .into_iter()
        .filter(|(name, _)| config.logger(name).is_none())
        .map(|(name, policy)| Declaration::Retained(name, policy))
        .chain(config.loggers.iter().map(Declaration::Configured))
        .collect();
    declarations.sort_by_key(|declaration| depth(declaration.name()));

    for declaration in declarations {
        match declaration {
            Declaration::Retained(name, policy) => registry.declare(&name, policy),
            Declaration::Configured(logger) => {
                let inherited = registry.resolve(&logger.name).policy();
                let policy = logger_policy(logger, &inherited)?;
                registry.declare(&logger.name, Arc::new(policy));
            }
        }
    }

    Ok(registry)
}

enum Declaration<'a> {
    Retained(Arc<str>, Arc<NodePolicy>),
    Configured(&'a LoggerConfig),
}

impl Declaration<'_> {
    fn name(&self) -> &str {
        match self {
            Declaration::Retained(name, _) => name,
            Declaration::Configured(logger) => &logger.name,
        }
    }
}

fn depth(name: &str) -> usize {
    name.matches(SEPARATOR).count()
}

/// Policy of the root logger.
pub fn root_policy(config: &RootLoggerConfig) -> Result<NodePolicy, ValidationError> {
    let level = parse_level(ROOT_DISPLAY_NAME, "level", &config.level)?;
    let mut policy = NodePolicy {
        level,
        add_caller: config.add_caller,
        ..NodePolicy::default()
    };
    if let Some(trace) = &config.trace_level {
        policy.stacktrace_level = parse_level(ROOT_DISPLAY_NAME, "trace_level", trace)?;
    }
    for appender in &config.appender_refs {
        policy.appender_levels.insert(appender.as_str(), level);
    }
    apply_overrides(&mut policy, ROOT_DISPLAY_NAME, &config.appenders)?;
    Ok(policy)
}

/// Policy of a named logger, starting from `inherited`.
///
/// `inherited` is the policy the node would have without a declaration,
/// i.e. its parent's.
pub fn logger_policy(config: &LoggerConfig, inherited: &NodePolicy) -> Result<NodePolicy, ValidationError> {
    let mut policy = inherited.clone();
    let name = config.name.as_str();

    if let Some(level) = &config.level {
        policy.level = parse_level(name, "level", level)?;
    }
    if config.appender_refs.is_empty() {
        policy.appender_levels.set_all(policy.level);
    } else {
        policy.appender_levels = config
            .appender_refs
            .iter()
            .map(|appender| (appender.as_str(), policy.level))
            .collect();
    }
    apply_overrides(&mut policy, name, &config.appenders)?;

    if let Some(add_caller) = config.add_caller {
        policy.add_caller = add_caller;
    }
    if let Some(trace) = &config.trace_level {
        policy.stacktrace_level = parse_level(name, "trace_level", trace)?;
    }
    Ok(policy)
}

fn apply_overrides(
    policy: &mut NodePolicy,
    logger: &str,
    overrides: &[AppenderLevelConfig],
) -> Result<(), ValidationError> {
    for appender in overrides {
        let level = match &appender.level {
            Some(level) => parse_level(logger, "appender level", level)?,
            None => policy.level,
        };
        policy.appender_levels.insert(appender.name.as_str(), level);
    }
    Ok(())
}

fn parse_level(logger: &str, what: &'static str, value: &str) -> Result<Level, ValidationError> {
    value.parse().map_err(|_| ValidationError::InvalidLevel {
        logger: logger.to_string(),
        what,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AppenderConfig;

    fn config() -> LogConfig {
        let mut config = LogConfig::empty();
        config.appenders.push(AppenderConfig::new("CONSOLE", "console"));
        config.appenders.push(AppenderConfig::new("FILE", "file").with_option("file_name", "x.log"));
        config.root.level = "warn".into();
        config.root.appender_refs = vec!["CONSOLE".into()];
        config
    }

    #[test]
    fn test_root_policy() {
        let policy = root_policy(&config().root).unwrap();
        assert_eq!(policy.level, Level::Warn);
        assert_eq!(policy.appender_levels.get("CONSOLE"), Some(Level::Warn));
        assert_eq!(policy.stacktrace_level, Level::Error);
        assert!(!policy.add_caller);
    }

    #[test]
    fn test_logger_without_refs_rebinds_inherited_appenders() {
        let mut config = config();
        config.loggers.push(LoggerConfig::new("app").with_level("debug"));
        let tree = build_tree(&config, Vec::new()).unwrap();

        let app = tree.resolve("app");
        assert_eq!(app.level(), Level::Debug);
        assert_eq!(app.appender_level("CONSOLE"), Some(Level::Debug));
        assert!(app.is_declared());
    }

    #[test]
    fn test_logger_refs_replace_fan_out() {
        let mut config = config();
        config.loggers.push(
            LoggerConfig::new("app")
                .with_level("info")
                .with_appender_refs(["FILE"])
                .with_appender_level("CONSOLE", "error"),
        );
        let tree = build_tree(&config, Vec::new()).unwrap();

        let app = tree.resolve("app");
        assert_eq!(app.appender_level("FILE"), Some(Level::Info));
        assert_eq!(app.appender_level("CONSOLE"), Some(Level::Error));
    }

    #[test]
    fn test_override_without_level_uses_logger_level() {
        let mut config = config();
        let mut logger = LoggerConfig::new("app").with_level("debug");
        logger.appenders.push(AppenderLevelConfig {
            name: "FILE".into(),
            level: None,
        });
        config.loggers.push(logger);
        let tree = build_tree(&config, Vec::new()).unwrap();

        assert_eq!(tree.resolve("app").appender_level("FILE"), Some(Level::Debug));
    }

    #[test]
    fn test_descendant_declared_before_ancestor_in_config() {
        let mut config = config();
        config.loggers.push(LoggerConfig::new("a/b"));
        config.loggers.push(LoggerConfig::new("a").with_level("error"));
        let tree = build_tree(&config, Vec::new()).unwrap();

        assert_eq!(tree.resolve("a/b").appender_level("CONSOLE"), Some(Level::Error));
        assert_eq!(tree.resolve("a/b/c").level(), Level::Error);
    }

    #[test]
    fn test_inherits_caller_and_trace_settings() {
        let mut config = config();
        let mut parent = LoggerConfig::new("a");
        parent.add_caller = Some(true);
        parent.trace_level = Some("warn".into());
        config.loggers.push(parent);
        config.loggers.push(LoggerConfig::new("a/b"));
        let tree = build_tree(&config, Vec::new()).unwrap();

        let child = tree.resolve("a/b").policy();
        assert!(child.add_caller);
        assert_eq!(child.stacktrace_level, Level::Warn);
    }

    #[test]
    fn test_retained_declarations_yield_to_config() {
        let mut kept = NodePolicy::default();
        kept.appender_levels.insert("CONSOLE", Level::Debug);
        let kept = Arc::new(kept);

        let mut config = config();
        config.loggers.push(LoggerConfig::new("b").with_level("error"));
        let retained = vec![(Arc::from("a"), Arc::clone(&kept)), (Arc::from("b"), kept)];
        let tree = build_tree(&config, retained).unwrap();

        assert_eq!(tree.resolve("a").appender_level("CONSOLE"), Some(Level::Debug));
        assert_eq!(tree.resolve("a/x").appender_level("CONSOLE"), Some(Level::Debug));
        assert_eq!(tree.resolve("b").appender_level("CONSOLE"), Some(Level::Error));
    }

    #[test]
    fn test_retained_leaf_sees_configured_ancestor() {
        let mut config = config();
        config.loggers.push(LoggerConfig::new("a").with_level("error"));
        let retained = vec![(Arc::from("a/b/c"), Arc::new(NodePolicy::default()))];
        let tree = build_tree(&config, retained).unwrap();

        assert_eq!(tree.resolve("a/b").appender_level("CONSOLE"), Some(Level::Error));
        assert!(tree.resolve("a/b/c").is_declared());
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let mut config = config();
        config.loggers.push(LoggerConfig::new("a").with_level("loud"));
        assert!(matches!(
            build_tree(&config, Vec::new()),
            Err(ValidationError::InvalidLevel { .. })
        ));
    }
}
