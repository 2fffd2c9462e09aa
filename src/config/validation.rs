//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (logger policies reference declared appenders)
//! - Validate level names
//! - Detect duplicate appender and logger names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LogConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system; appender types are
//!   checked later against the registry, still before any swap

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{AppenderLevelConfig, LogConfig};
use crate::level::Level;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("appender #{0} has an empty name")]
    EmptyAppenderName(usize),

    #[error("appender `{0}` has no type")]
    MissingAppenderType(String),

    #[error("appender `{0}` is declared more than once")]
    DuplicateAppender(String),

    #[error("logger #{0} has an empty name")]
    EmptyLoggerName(usize),

    #[error("logger `{0}` is declared more than once")]
    DuplicateLogger(String),

    #[error("logger `{logger}`: invalid {what} {value:?}")]
    InvalidLevel {
        logger: String,
        what: &'static str,
        value: String,
    },

    #[error("logger `{logger}` references undeclared appender `{appender}`")]
    UnknownAppenderRef { logger: String, appender: String },

    #[error("watch.poll_interval_secs must be greater than zero")]
    ZeroPollInterval,
}

const ROOT_DISPLAY_NAME: &str = "root";

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &LogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut appender_names = HashSet::new();
    for (i, appender) in config.appenders.iter().enumerate() {
        if appender.name.is_empty() {
            errors.push(ValidationError::EmptyAppenderName(i));
            continue;
        }
        if appender.kind.is_empty() {
            errors.push(ValidationError::MissingAppenderType(appender.name.clone()));
        }
        if !appender_names.insert(appender.name.as_str()) {
            errors.push(ValidationError::DuplicateAppender(appender.name.clone()));
        }
    }

    let root = &config.root;
    check_level(&mut errors, ROOT_DISPLAY_NAME, "level", &root.level);
    if let Some(trace) = &root.trace_level {
        check_level(&mut errors, ROOT_DISPLAY_NAME, "trace_level", trace);
    }
    check_refs(&mut errors, ROOT_DISPLAY_NAME, &appender_names, &root.appender_refs, &root.appenders);

    let mut logger_names = HashSet::new();
    for (i, logger) in config.loggers.iter().enumerate() {
        if logger.name.is_empty() {
            errors.push(ValidationError::EmptyLoggerName(i));
            continue;
        }
        if !logger_names.insert(logger.name.as_str()) {
            errors.push(ValidationError::DuplicateLogger(logger.name.clone()));
        }
        if let Some(level) = &logger.level {
            check_level(&mut errors, &logger.name, "level", level);
        }
        if let Some(trace) = &logger.trace_level {
            check_level(&mut errors, &logger.name, "trace_level", trace);
        }
        check_refs(&mut errors, &logger.name, &appender_names, &logger.appender_refs, &logger.appenders);
    }

    if config.watch.enabled && config.watch.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_level(errors: &mut Vec<ValidationError>, logger: &str, what: &'static str, value: &str) {
    if value.parse::<Level>().is_err() {
        errors.push(ValidationError::InvalidLevel {
            logger: logger.to_string(),
            what,
            value: value.to_string(),
        });
    }
}

fn check_refs(
    errors: &mut Vec<ValidationError>,
    logger: &str,
    declared: &HashSet<&str>,
    refs: &[String],
    overrides: &[AppenderLevelConfig],
) {
    let referenced = refs.iter().map(String::as_str).chain(overrides.iter().map(|o| o.name.as_str()));
    for appender in referenced {
        if !declared.contains(appender) {
            errors.push(ValidationError::UnknownAppenderRef {
                logger: logger.to_string(),
                appender: appender.to_string(),
            });
        }
    }
    for appender in overrides {
        if let Some(level) = &appender.level {
            check_level(errors, logger, "appender level", level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{AppenderConfig, LoggerConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&LogConfig::default()).is_ok());
        assert!(validate_config(&LogConfig::empty()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = LogConfig::default();
        config.appenders.push(AppenderConfig::new("CONSOLE", "console"));
        config.appenders.push(AppenderConfig::new("", "file"));
        config.root.level = "loud".into();
        config.loggers.push(
            LoggerConfig::new("app")
                .with_level("debug")
                .with_appender_refs(["MISSING"])
                .with_appender_level("CONSOLE", "chatty"),
        );
        config.loggers.push(LoggerConfig::new("app"));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateAppender("CONSOLE".into())));
        assert!(errors.contains(&ValidationError::EmptyAppenderName(2)));
        assert!(errors.contains(&ValidationError::DuplicateLogger("app".into())));
        assert!(errors.contains(&ValidationError::UnknownAppenderRef {
            logger: "app".into(),
            appender: "MISSING".into(),
        }));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidLevel { logger, value, .. } if logger == "root" && value == "loud"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidLevel { what: "appender level", value, .. } if value == "chatty"
        )));
    }

    #[test]
    fn test_zero_poll_interval_only_when_watching() {
        let mut config = LogConfig::default();
        config.watch.poll_interval_secs = 0;
        assert!(validate_config(&config).is_ok());

        config.watch.enabled = true;
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::ZeroPollInterval]);
    }
}
