//! Bootstrap diagnostics.
//!
//! # Responsibilities
//! - Install a `tracing` subscriber for the crate's own warnings
//! - Honour `LOGTREE_LOG` (filter directives) and `LOGTREE_DEBUG`
//!
//! # Design Decisions
//! - Output goes to stderr so it never interleaves with appender output
//! - The subscriber is installed with `set_global_default`, not `init`, so
//!   the `log` facade stays free for [`LogBridge`](crate::bridge::LogBridge)

use std::env;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Filter directives for the bootstrap channel.
pub const LOG_FILTER_ENV: &str = "LOGTREE_LOG";

/// Any non-empty value other than `0`/`false` turns on debug diagnostics.
pub const DEBUG_ENV: &str = "LOGTREE_DEBUG";

/// True when `LOGTREE_DEBUG` asks for verbose diagnostics.
pub fn debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
        .unwrap_or(false)
}

/// Install the bootstrap subscriber. Returns false if another global
/// subscriber was already set.
pub fn init_bootstrap_logging(debug: bool) -> bool {
    let default = if debug { "logtree=debug" } else { "logtree=warn" };
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
