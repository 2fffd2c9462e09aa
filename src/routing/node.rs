//! Routing nodes: one per logger name in the hierarchy.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::level::Level;

/// Hierarchy separator in logger names.
pub const SEPARATOR: char = '/';

/// Name of the root logger.
pub const ROOT_NAME: &str = "";

/// Name of the portion before the last separator, or `None` when the parent
/// is the root. Empty prefixes are skipped.
pub fn parent_name(name: &str) -> Option<&str> {
    let idx = name.rfind(SEPARATOR)?;
    let prefix = &name[..idx];
    (!prefix.is_empty()).then_some(prefix)
}

/// Per-appender thresholds of one node, keyed by appender name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppenderLevels(BTreeMap<String, Level>);

impl AppenderLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, appender: &str) -> Option<Level> {
        self.0.get(appender).copied()
    }

    pub fn insert(&mut self, appender: impl Into<String>, level: Level) {
        self.0.insert(appender.into(), level);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Level)> {
        self.0.iter().map(|(name, level)| (name.as_str(), *level))
    }

    /// Rebind every appender at `level`.
    pub fn set_all(&mut self, level: Level) {
        self.0.values_mut().for_each(|l| *l = level);
    }
}

impl<S: Into<String>> FromIterator<(S, Level)> for AppenderLevels {
    fn from_iter<I: IntoIterator<Item = (S, Level)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, level)| (name.into(), level)).collect())
    }
}

/// Resolved routing policy of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePolicy {
    /// Default threshold for appenders bound without an override.
    pub level: Level,
    /// Fan-out: appender name → threshold.
    pub appender_levels: AppenderLevels,
    pub add_caller: bool,
    pub stacktrace_level: Level,
}

impl Default for NodePolicy {
    fn default() -> Self {
        Self {
            level: Level::Info,
            appender_levels: AppenderLevels::new(),
            add_caller: false,
            stacktrace_level: Level::Error,
        }
    }
}

impl NodePolicy {
    /// Lowest threshold across the fan-out, `Off` if nothing can be written.
    pub fn min_level(&self) -> Level {
        self.appender_levels
            .iter()
            .map(|(_, level)| level)
            .min()
            .unwrap_or(Level::Off)
    }
}

/// A node in the logger-name hierarchy.
///
/// Nodes are never removed. Reconfiguration replaces the policy in place so
/// every holder of the `Arc<RoutingNode>` observes the update. The parent is
/// recorded by name only; the registry owns every node.
pub struct RoutingNode {
    name: Arc<str>,
    parent: Option<Arc<str>>,
    policy: ArcSwap<NodePolicy>,
    declared: AtomicBool,
}

impl RoutingNode {
    pub(crate) fn root(policy: NodePolicy) -> Self {
        Self {
            name: Arc::from(ROOT_NAME),
            parent: None,
            policy: ArcSwap::from_pointee(policy),
            declared: AtomicBool::new(true),
        }
    }

    pub(crate) fn new(name: &str, policy: Arc<NodePolicy>, declared: bool) -> Self {
        Self {
            name: Arc::from(name),
            parent: Some(Arc::from(parent_name(name).unwrap_or(ROOT_NAME))),
            policy: ArcSwap::new(policy),
            declared: AtomicBool::new(declared),
        }
    }

    /// A node whose policy is a copy of `parent`'s at this instant.
    pub(crate) fn derive(name: &str, parent: &RoutingNode) -> Self {
        // Policies are immutable once published; sharing the Arc is a value copy.
        Self::new(name, parent.policy.load_full(), false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// Parent's name; `Some("")` for top-level names, `None` for the root.
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// True when the policy came from an explicit declaration.
    pub fn is_declared(&self) -> bool {
        self.declared.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> Arc<NodePolicy> {
        self.policy.load_full()
    }

    pub fn level(&self) -> Level {
        self.policy.load().level
    }

    pub fn appender_level(&self, appender: &str) -> Option<Level> {
        self.policy.load().appender_levels.get(appender)
    }

    pub(crate) fn replace(&self, policy: Arc<NodePolicy>, declared: bool) {
        self.policy.store(policy);
        self.declared.store(declared, Ordering::Release);
    }

    pub(crate) fn update(&self, f: impl Fn(&mut NodePolicy)) {
        self.policy.rcu(|current| {
            let mut next = NodePolicy::clone(current);
            f(&mut next);
            next
        });
    }
}

impl fmt::Debug for RoutingNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingNode")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("declared", &self.is_declared())
            .field("policy", &*self.policy.load())
            .finish()
    }
}
