//! Configuration file watcher for hot reload.
//!
//! Every create or modify event on the file reloads it. A file that fails
//! to parse or validate is reported and skipped, so the receiver only ever
//! sees configurations that `LogManager::reconfigure` can apply.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::LogConfig;

/// Watches one configuration file and forwards each valid revision.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    updates: mpsc::UnboundedSender<LogConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its updates.
    pub fn new(path: &Path, poll_interval: Duration) -> (Self, mpsc::UnboundedReceiver<LogConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            poll_interval,
            updates,
        };
        (watcher, rx)
    }

    /// Start watching on notify's background thread.
    ///
    /// Updates stop when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            poll_interval,
            updates,
        } = self;

        let watched = path.clone();
        let handler = move |event: notify::Result<Event>| match event {
            Ok(event) if is_content_change(&event.kind) => reload(&watched, &updates),
            Ok(_) => {}
            Err(error) => tracing::warn!(path = %watched.display(), %error, "config watch error"),
        };

        let mut watcher = RecommendedWatcher::new(handler, Config::default().with_poll_interval(poll_interval))?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %path.display(), ?poll_interval, "watching logging configuration");
        Ok(watcher)
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

fn reload(path: &Path, updates: &mpsc::UnboundedSender<LogConfig>) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "logging configuration changed");
            if updates.send(config).is_err() {
                tracing::debug!("config receiver dropped, ignoring change");
            }
        }
        Err(error) => {
            tracing::error!(path = %path.display(), %error, "ignoring invalid logging configuration");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn config_text(root_level: &str) -> String {
        format!(
            r#"
            [[appenders]]
            name = "CONSOLE"
            type = "console"
            target = "discard"

            [root]
            level = "{root_level}"
            appender_refs = ["CONSOLE"]
            "#
        )
    }

    #[tokio::test]
    async fn test_forwards_rewritten_config() {
        let dir = std::env::temp_dir().join(format!("logtree-watch-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("logtree.toml");
        fs::write(&path, config_text("info")).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path, Duration::from_millis(50));
        let _watcher = watcher.run().unwrap();

        fs::write(&path, config_text("debug")).unwrap();

        // A truncate-then-write can surface an intermediate revision first.
        let reloaded = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(config) = updates.recv().await {
                if config.root.level == "debug" {
                    return Some(config);
                }
            }
            None
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(reloaded.root.appender_refs, vec!["CONSOLE".to_string()]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_skips_invalid_revision() {
        let dir = std::env::temp_dir().join(format!("logtree-watch-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("logtree.toml");
        fs::write(&path, config_text("info")).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path, Duration::from_millis(50));
        let _watcher = watcher.run().unwrap();

        fs::write(&path, config_text("chatty")).unwrap();
        let outcome = tokio::time::timeout(Duration::from_millis(500), async {
            while let Some(config) = updates.recv().await {
                if config.root.level == "chatty" {
                    return Some(config);
                }
            }
            None
        })
        .await;

        assert!(!matches!(outcome, Ok(Some(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
