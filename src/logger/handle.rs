//! Logger handles: the stable, cloneable front of a routing node.
//!
//! # Design Decisions
//! - The backend sits behind an `ArcSwap`, so an emit is one atomic load
//!   and no lock
//! - A rebind swaps the pointer and then waits until no emit still holds
//!   the retired backend; callers never see a half-built fan-out
//! - `with` derivatives share the swappable slot, so they follow every
//!   rebind of the handle they came from

use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;

use crate::appender::{Appender, SyncError};
use crate::field::Field;
use crate::level::Level;
use crate::logger::backend::Backend;
use crate::logger::job::Job;
use crate::manager::Shared;
use crate::routing::{NodePolicy, RoutingNode, SEPARATOR};

/// How long a rebind waits for in-flight writes before warning.
const STALL_WARNING: Duration = Duration::from_secs(1);

/// Busy-wait iterations before a draining rebind starts yielding.
const SPIN_LIMIT: u32 = 128;

/// Whether a handle is being rebound.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    Live = 0,
    Swapping = 1,
}

struct HandleInner {
    name: Arc<str>,
    node: Arc<RoutingNode>,
    backend: ArcSwap<Backend>,
    state: AtomicU8,
    owner: Weak<Shared>,
}

/// A named logger.
///
/// Cloning is cheap. Every clone, and every handle made with [`with`],
/// writes through the same backend and observes reconfiguration.
///
/// [`with`]: LoggerHandle::with
#[derive(Clone)]
pub struct LoggerHandle {
    inner: Arc<HandleInner>,
    context: Arc<[Field]>,
}

impl LoggerHandle {
    pub(crate) fn new(node: Arc<RoutingNode>, backend: Backend, owner: Weak<Shared>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                name: Arc::clone(node.name_arc()),
                node,
                backend: ArcSwap::from_pointee(backend),
                state: AtomicU8::new(SwapState::Live as u8),
                owner,
            }),
            context: Arc::from(Vec::new()),
        }
    }

    /// A handle that belongs to no manager and discards every record.
    pub fn detached(name: &str) -> Self {
        let node = Arc::new(RoutingNode::new(
            name,
            Arc::new(NodePolicy {
                level: Level::Off,
                ..NodePolicy::default()
            }),
            false,
        ));
        let backend = Backend::noop(node.name_arc());
        Self::new(node, backend, Weak::new())
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn node(&self) -> &Arc<RoutingNode> {
        &self.inner.node
    }

    pub fn state(&self) -> SwapState {
        match self.inner.state.load(Ordering::Acquire) {
            0 => SwapState::Live,
            _ => SwapState::Swapping,
        }
    }

    /// True when both handles write through the same logger.
    pub fn ptr_eq(&self, other: &LoggerHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Fields attached with [`with`](LoggerHandle::with).
    pub fn context(&self) -> &[Field] {
        &self.context
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.inner.backend.load().enabled(level)
    }

    /// Lowest level any bound appender accepts right now.
    pub fn min_level(&self) -> Level {
        self.inner.backend.load().min_level()
    }

    /// Bound appender names and thresholds right now.
    pub fn appender_levels(&self) -> Vec<(String, Level)> {
        self.inner.backend.load().appender_levels()
    }

    /// Emit a record. `Panic` panics after writing; `DPanic` panics only in
    /// debug builds; `Fatal` flushes and exits the process.
    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: &[Field]) {
        let caller = Location::caller();
        {
            let backend = self.inner.backend.load();
            backend.write(level, message, &self.context, fields, caller);
        }

        match level {
            Level::DPanic if cfg!(debug_assertions) => panic!("{message}"),
            Level::Panic => panic!("{message}"),
            Level::Fatal => {
                if let Err(error) = self.sync() {
                    eprintln!("logtree: failed to flush before exit: {error}");
                }
                std::process::exit(1);
            }
            _ => {}
        }
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields);
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields);
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields);
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields);
    }

    #[track_caller]
    pub fn dpanic(&self, message: &str, fields: &[Field]) {
        self.log(Level::DPanic, message, fields);
    }

    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field]) {
        self.log(Level::Panic, message, fields);
    }

    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) {
        self.log(Level::Fatal, message, fields);
    }

    /// The handle for `<name>/<suffix>`, carrying this handle's context.
    pub fn named(&self, suffix: &str) -> LoggerHandle {
        if suffix.is_empty() {
            return self.clone();
        }
        let name = if self.inner.name.is_empty() {
            suffix.to_string()
        } else {
            format!("{}{}{}", self.inner.name, SEPARATOR, suffix)
        };

        let child = match self.inner.owner.upgrade() {
            Some(shared) => Shared::logger(&shared, &name),
            None => {
                tracing::warn!(logger = %name, "log manager is gone, returning a detached logger");
                LoggerHandle::detached(&name)
            }
        };
        if self.context.is_empty() {
            child
        } else {
            LoggerHandle {
                inner: child.inner,
                context: Arc::clone(&self.context),
            }
        }
    }

    /// A handle that adds `fields` to every record. It shares this handle's
    /// backend slot, so it follows reconfiguration too.
    pub fn with(&self, fields: impl IntoIterator<Item = Field>) -> LoggerHandle {
        let context: Vec<Field> = self.context.iter().cloned().chain(fields).collect();
        LoggerHandle {
            inner: Arc::clone(&self.inner),
            context: Arc::from(context),
        }
    }

    /// Start a tracked unit of work on this logger.
    pub fn job(&self, name: impl Into<String>) -> Job {
        Job::new(name, self.clone())
    }

    /// Flush the appenders this handle currently writes to.
    pub fn sync(&self) -> Result<(), SyncError> {
        self.inner.backend.load().sync()
    }

    pub(crate) fn bound_appenders(&self) -> Vec<Appender> {
        self.inner.backend.load().appenders().cloned().collect()
    }

    /// Replace the backend and wait until no emit still uses the old one.
    pub(crate) fn rebind(&self, backend: Backend) {
        self.inner.state.store(SwapState::Swapping as u8, Ordering::Release);
        let retired = self.inner.backend.swap(Arc::new(backend));
        self.drain(&retired);
        self.inner.state.store(SwapState::Live as u8, Ordering::Release);
    }

    fn drain(&self, retired: &Arc<Backend>) {
        let started = Instant::now();
        let mut spins = 0u32;
        let mut warned = false;
        while Arc::strong_count(retired) > 1 {
            if spins < SPIN_LIMIT {
                spins += 1;
                std::hint::spin_loop();
            } else {
                thread::yield_now();
            }
            if !warned && started.elapsed() >= STALL_WARNING {
                warned = true;
                tracing::warn!(
                    logger = %self.inner.name,
                    "reconfiguration stalled waiting for in-flight writes to finish"
                );
            }
        }
    }
}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .field("context", &self.context.len())
            .finish()
    }
}
