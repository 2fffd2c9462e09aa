//! Logger handles and their write path.
//!
//! # Data Flow
//! ```text
//! handle.info(msg, fields)
//!     → handle.rs (one atomic load of the current Backend)
//!     → backend.rs (level gate, encode per appender, one write per record)
//!     → Appender writers
//! ```

pub mod backend;
pub mod handle;
pub mod job;

pub use backend::Backend;
pub use handle::{LoggerHandle, SwapState};
pub use job::{CompletionStatus, Job};
