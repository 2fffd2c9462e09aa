//! Routing subsystem: the logger-name hierarchy.
//!
//! # Data Flow
//! ```text
//! logger name ("app/db/pool")
//!     → registry.rs (load-or-store lookup, ancestors created first)
//!     → node.rs (RoutingNode: copied policy, appender → level)
//!     → logger::Backend bound from the node's policy
//!
//! Reconfiguration:
//!     LogConfig
//!     → tree.rs (staged registry, shallowest declarations first)
//!     → registry.rs adopt (live nodes overwritten in place)
//! ```
//!
//! # Design Decisions
//! - A child copies its parent's policy once, at creation; later edits to
//!   the parent reach it only through reconfiguration
//! - Nodes are never removed, so handles never dangle
//! - Empty path segments are kept as part of the name

pub mod node;
pub mod registry;
pub mod tree;

pub use node::{parent_name, AppenderLevels, NodePolicy, RoutingNode, ROOT_NAME, SEPARATOR};
pub use registry::NodeRegistry;
pub use tree::build_tree;
