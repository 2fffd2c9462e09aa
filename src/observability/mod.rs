//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Library internals produce:
//!     → logging.rs (bootstrap diagnostics through `tracing`, on stderr)
//!     → metrics.rs (counters and gauges through `metrics`)
//!
//! Consumers:
//!     → operator terminal (stderr)
//!     → Metrics endpoint (Prometheus scrape), when the binary enables it
//! ```
//!
//! # Design Decisions
//! - Diagnostics about the logging system never go through the hierarchy
//!   they describe
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod logging;
pub mod metrics;
