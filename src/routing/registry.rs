//! Name → node and name → handle maps.
//!
//! # Responsibilities
//! - Resolve a name to its node, creating missing ancestors on the way
//! - Hand out exactly one logger handle per name
//! - Apply point updates (single node, single appender)
//! - Adopt a freshly built tree during reconfiguration
//!
//! # Design Decisions
//! - Concurrent maps with load-or-store: two racing resolvers of the same
//!   name end up holding the same node
//! - Parents are resolved before the child's map entry is locked, so no map
//!   shard is held across a recursive resolution
//! - The root lives outside the map and is never replaced

use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::appender::AppenderSet;
use crate::level::Level;
use crate::logger::{Backend, LoggerHandle};
use crate::manager::Shared;
use crate::routing::node::{parent_name, NodePolicy, RoutingNode, ROOT_NAME};

/// Every routing node and handle known to one manager.
#[derive(Debug)]
pub struct NodeRegistry {
    root: Arc<RoutingNode>,
    nodes: DashMap<Arc<str>, Arc<RoutingNode>>,
    handles: DashMap<Arc<str>, LoggerHandle>,
}

impl NodeRegistry {
    pub fn new(root_policy: NodePolicy) -> Self {
        Self {
            root: Arc::new(RoutingNode::root(root_policy)),
            nodes: DashMap::new(),
            handles: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Arc<RoutingNode> {
        &self.root
    }

    /// Node for `name`, creating it (and any missing ancestors) by copying
    /// the parent's policy. The empty name is the root.
    pub fn resolve(&self, name: &str) -> Arc<RoutingNode> {
        if name == ROOT_NAME {
            return Arc::clone(&self.root);
        }
        if let Some(node) = self.nodes.get(name) {
            return Arc::clone(node.value());
        }

        let parent = match parent_name(name) {
            Some(parent) => self.resolve(parent),
            None => Arc::clone(&self.root),
        };
        let node = self
            .nodes
            .entry(Arc::from(name))
            .or_insert_with(|| Arc::new(RoutingNode::derive(name, &parent)));
        Arc::clone(node.value())
    }

    /// Existing node for `name`, without creating it.
    pub fn get(&self, name: &str) -> Option<Arc<RoutingNode>> {
        if name == ROOT_NAME {
            return Some(Arc::clone(&self.root));
        }
        self.nodes.get(name).map(|node| Arc::clone(node.value()))
    }

    /// Parent of `node`; `None` for the root.
    pub fn parent(&self, node: &RoutingNode) -> Option<Arc<RoutingNode>> {
        node.parent_name().map(|parent| self.resolve(parent))
    }

    /// Install an explicitly declared policy, creating ancestors first.
    pub(crate) fn declare(&self, name: &str, policy: Arc<NodePolicy>) {
        if name == ROOT_NAME {
            self.root.replace(policy, true);
            return;
        }
        if let Some(parent) = parent_name(name) {
            self.resolve(parent);
        }
        match self.nodes.entry(Arc::from(name)) {
            dashmap::mapref::entry::Entry::Occupied(entry) => entry.get().replace(policy, true),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Arc::new(RoutingNode::new(name, policy, true)));
            }
        }
    }

    /// Node count including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len() + 1
    }

    /// Every node name except the root, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.iter().map(|e| e.key().to_string()).collect();
        names.sort();
        names
    }

    /// Policies of explicitly declared, non-root nodes.
    pub fn declared_policies(&self) -> Vec<(Arc<str>, Arc<NodePolicy>)> {
        self.nodes
            .iter()
            .filter(|entry| entry.value().is_declared())
            .map(|entry| (Arc::clone(entry.key()), entry.value().policy()))
            .collect()
    }

    pub fn handle(&self, name: &str) -> Option<LoggerHandle> {
        self.handles.get(name).map(|h| h.value().clone())
    }

    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Snapshot of every handle handed out so far.
    pub fn handles(&self) -> Vec<LoggerHandle> {
        self.handles.iter().map(|h| h.value().clone()).collect()
    }

    /// The handle for `name`, binding a backend against `appenders` the first
    /// time the name is seen.
    pub(crate) fn get_or_create_handle(
        &self,
        name: &str,
        appenders: &AppenderSet,
        owner: &Weak<Shared>,
    ) -> LoggerHandle {
        if let Some(handle) = self.handles.get(name) {
            return handle.value().clone();
        }

        let node = self.resolve(name);
        let handle = self
            .handles
            .entry(Arc::clone(node.name_arc()))
            .or_insert_with(|| {
                let backend = Backend::bind(node.name_arc(), &node.policy(), appenders);
                LoggerHandle::new(Arc::clone(&node), backend, owner.clone())
            });
        handle.value().clone()
    }

    /// Set one appender's threshold on `name`.
    pub(crate) fn set_appender_level(&self, name: &str, appender: &str, level: Level) -> Arc<RoutingNode> {
        let node = self.resolve(name);
        node.update(|policy| policy.appender_levels.insert(appender, level));
        node
    }

    /// Set the default level of `name` and rebind every appender it routes to.
    pub(crate) fn set_default_level(&self, name: &str, level: Level) -> Arc<RoutingNode> {
        let node = self.resolve(name);
        node.update(|policy| {
            policy.level = level;
            policy.appender_levels.set_all(level);
        });
        node
    }

    /// Overwrite this tree's policies with `staged`'s.
    ///
    /// Live nodes keep their identity; each takes the policy the staged tree
    /// resolves for its name. Staged nodes unknown here are inserted.
    pub(crate) fn adopt(&self, staged: &NodeRegistry) {
        self.root.replace(staged.root.policy(), true);

        for entry in self.nodes.iter() {
            let staged_node = staged.resolve(entry.key());
            entry.value().replace(staged_node.policy(), staged_node.is_declared());
        }

        for entry in staged.nodes.iter() {
            if self.nodes.contains_key(entry.key()) {
                continue;
            }
            let node = entry.value();
            self.nodes.entry(Arc::clone(entry.key())).or_insert_with(|| {
                Arc::new(RoutingNode::new(node.name(), node.policy(), node.is_declared()))
            });
        }
    }

    /// Rebind one handle's backend from its node's current policy.
    pub(crate) fn rebind(&self, handle: &LoggerHandle, appenders: &AppenderSet) {
        let node = handle.node();
        handle.rebind(Backend::bind(node.name_arc(), &node.policy(), appenders));
    }

    /// Rebind every handle.
    pub(crate) fn rebind_all(&self, appenders: &AppenderSet) {
        for handle in self.handles() {
            self.rebind(&handle, appenders);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn registry_with_console(level: Level) -> NodeRegistry {
        let mut policy = NodePolicy::default();
        policy.level = level;
        policy.appender_levels.insert("CONSOLE", level);
        NodeRegistry::new(policy)
    }

    #[test]
    fn test_resolve_root() {
        let registry = registry_with_console(Level::Info);
        assert!(Arc::ptr_eq(&registry.resolve(""), registry.root()));
        assert_eq!(registry.node_count(), 1);
    }

    #[test]
    fn test_resolve_creates_ancestors() {
        let registry = registry_with_console(Level::Warn);
        let node = registry.resolve("a/b/c");

        assert_eq!(node.name(), "a/b/c");
        assert_eq!(node.parent_name(), Some("a/b"));
        assert_eq!(registry.names(), vec!["a", "a/b", "a/b/c"]);
        assert_eq!(node.appender_level("CONSOLE"), Some(Level::Warn));

        let parent = registry.parent(&node).unwrap();
        assert!(Arc::ptr_eq(&parent, &registry.resolve("a/b")));
        assert_eq!(registry.parent(&registry.resolve("a")).unwrap().name(), "");
    }

    #[test]
    fn test_resolve_is_identity() {
        let registry = Arc::new(registry_with_console(Level::Info));
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.resolve("x/y/z"))
            })
            .collect();

        let nodes: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
        for node in &nodes[1..] {
            assert!(Arc::ptr_eq(&nodes[0], node));
        }
        assert_eq!(registry.node_count(), 4);
    }

    #[test]
    fn test_child_copies_policy_at_creation() {
        let registry = registry_with_console(Level::Info);
        registry.set_appender_level("a", "CONSOLE", Level::Error);
        let child = registry.resolve("a/b");
        assert_eq!(child.appender_level("CONSOLE"), Some(Level::Error));

        registry.set_appender_level("a", "CONSOLE", Level::Debug);
        assert_eq!(child.appender_level("CONSOLE"), Some(Level::Error));
    }

    #[test]
    fn test_set_default_level_rebinds_all_appenders() {
        let registry = registry_with_console(Level::Info);
        registry.set_appender_level("svc", "FILE", Level::Debug);
        let node = registry.set_default_level("svc", Level::Error);

        assert_eq!(node.level(), Level::Error);
        assert_eq!(node.appender_level("CONSOLE"), Some(Level::Error));
        assert_eq!(node.appender_level("FILE"), Some(Level::Error));
    }

    #[test]
    fn test_declare_and_adopt() {
        let live = registry_with_console(Level::Info);
        let kept = live.resolve("app/db");
        live.resolve("other");

        let staged = registry_with_console(Level::Warn);
        let mut policy = NodePolicy::default();
        policy.appender_levels.insert("CONSOLE", Level::Debug);
        staged.declare("app", Arc::new(policy));
        staged.declare("fresh/leaf", Arc::new(NodePolicy::default()));

        live.adopt(&staged);

        assert!(Arc::ptr_eq(&kept, &live.resolve("app/db")));
        assert_eq!(kept.appender_level("CONSOLE"), Some(Level::Debug));
        assert!(!kept.is_declared());
        assert!(live.resolve("app").is_declared());
        assert_eq!(live.resolve("other").appender_level("CONSOLE"), Some(Level::Warn));
        assert_eq!(live.root().appender_level("CONSOLE"), Some(Level::Warn));
        assert!(live.get("fresh/leaf").unwrap().is_declared());

        let mut declared: Vec<_> = live.declared_policies().into_iter().map(|(n, _)| n.to_string()).collect();
        declared.sort();
        assert_eq!(declared, vec!["app", "fresh/leaf"]);
    }
}
