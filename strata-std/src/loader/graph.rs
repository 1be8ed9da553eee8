//! Dependency resolution.
//!
//! [`resolve`] links every candidate plugin to the candidates satisfying its
//! dependencies. Binding is first-match in candidate order; a plugin whose
//! dependencies are not all bound on registration is retried until a pass
//! makes no progress.

use crate::error::{LoadError, MissingDependency, UnresolvedDependencies, UnresolvedPlugin};
use std::collections::HashMap;
use strata_core::{Dependency, Plugin, PluginId};
use tracing::{debug, trace};

/// Index of a plugin in the candidate list it was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the plugin in the candidate list.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Lifecycle position of a node during loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Every dependency has been started.
    DependenciesRegistered,
    /// The node's own start callback succeeded.
    PluginRegistered,
    /// The node's dependents have been visited.
    DependentsRegistered,
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) plugin: Plugin,
    /// One slot per declared dependency, in declaration order.
    pub(crate) satisfiers: Vec<Option<NodeId>>,
    pub(crate) dependents: Vec<NodeId>,
    pub(crate) state: Option<RegistrationState>,
}

impl Node {
    fn new(plugin: Plugin) -> Self {
        let satisfiers = vec![None; plugin.dependencies().len()];
        Self {
            plugin,
            satisfiers,
            dependents: Vec::new(),
            state: None,
        }
    }

    fn is_resolved(&self) -> bool {
        self.satisfiers.iter().all(Option::is_some)
    }
}

/// Plugins linked to the plugins satisfying their dependencies.
///
/// Built by [`resolve`]. Every node is fully resolved and reachable from a
/// root through satisfied links.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    pub(crate) nodes: Vec<Node>,
    roots: Vec<NodeId>,
    by_id: HashMap<PluginId, Vec<NodeId>>,
}

impl DependencyGraph {
    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no plugin was resolved.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes without dependencies, in candidate order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The plugin behind a node.
    pub fn plugin(&self, id: NodeId) -> &Plugin {
        &self.nodes[id.0].plugin
    }

    /// The satisfier bound to each declared dependency of a node.
    pub fn dependencies(&self, id: NodeId) -> impl Iterator<Item = (&Dependency, NodeId)> + '_ {
        let node = &self.nodes[id.0];
        node.plugin
            .dependencies()
            .iter()
            .zip(node.satisfiers.iter().flatten().copied())
    }

    /// Nodes with a dependency bound to this node, in binding order.
    pub fn dependents(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].dependents
    }

    /// Every node registered under a plugin id, in candidate order.
    pub fn find(&self, id: &str) -> &[NodeId] {
        self.by_id.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    fn insert(&mut self, plugin: Plugin) -> NodeId {
        let id = NodeId(self.nodes.len());
        if plugin.dependencies().is_empty() {
            self.roots.push(id);
        }
        self.by_id.entry(plugin.id().clone()).or_default().push(id);
        self.nodes.push(Node::new(plugin));
        id
    }

    /// First registered candidate satisfying `dependency`, excluding `from`.
    fn first_candidate(&self, from: NodeId, dependency: &Dependency) -> Option<NodeId> {
        self.find(dependency.target().as_str())
            .iter()
            .copied()
            .find(|&candidate| candidate != from && self.plugin(candidate).satisfies(dependency))
    }

    /// Bind every still-unbound dependency of `id` that a registered
    /// candidate satisfies. Returns `true` once all are bound.
    fn bind(&mut self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        let picks: Vec<(usize, NodeId)> = node
            .plugin
            .dependencies()
            .iter()
            .enumerate()
            .filter(|(slot, _)| node.satisfiers[*slot].is_none())
            .filter_map(|(slot, dependency)| {
                self.first_candidate(id, dependency)
                    .map(|candidate| (slot, candidate))
            })
            .collect();

        for (slot, candidate) in picks {
            trace!(
                plugin = %self.nodes[id.0].plugin,
                satisfier = %self.nodes[candidate.0].plugin,
                "bound dependency"
            );
            self.nodes[id.0].satisfiers[slot] = Some(candidate);
            let dependents = &mut self.nodes[candidate.0].dependents;
            if !dependents.contains(&id) {
                dependents.push(id);
            }
        }

        self.nodes[id.0].is_resolved()
    }

    fn unresolved(&self, pending: &[NodeId]) -> UnresolvedDependencies {
        let plugins = pending
            .iter()
            .map(|&id| {
                let node = &self.nodes[id.0];
                let missing = node
                    .plugin
                    .dependencies()
                    .iter()
                    .zip(&node.satisfiers)
                    .filter(|(_, satisfier)| satisfier.is_none())
                    .map(|(dependency, _)| MissingDependency {
                        dependency: dependency.clone(),
                        candidates: self
                            .find(dependency.target().as_str())
                            .iter()
                            .map(|&candidate| self.plugin(candidate).clone())
                            .collect(),
                    })
                    .collect();

                UnresolvedPlugin {
                    plugin: node.plugin.clone(),
                    missing,
                }
            })
            .collect();

        UnresolvedDependencies::new(plugins)
    }

    /// Nodes that can never start: some dependency chain loops back
    /// instead of ending at a root.
    fn unreachable(&self) -> Vec<NodeId> {
        let mut started = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if started[id.0] || !node.satisfiers.iter().flatten().all(|s| started[s.0]) {
                continue;
            }
            started[id.0] = true;
            stack.extend(node.dependents.iter().rev().copied());
        }

        started
            .iter()
            .enumerate()
            .filter(|&(_, done)| !done)
            .map(|(index, _)| NodeId(index))
            .collect()
    }
}

/// Link every candidate to the candidates satisfying its dependencies.
///
/// # Errors
///
/// - [`LoadError::Unresolved`] if some dependency has no satisfier after the
///   retry passes reach a fixed point.
/// - [`LoadError::NoRoots`] if the set is non-empty and every plugin has a
///   dependency.
/// - [`LoadError::Cycle`] if some resolved plugins depend on each other in a
///   loop and can therefore never be started.
pub fn resolve(candidates: impl IntoIterator<Item = Plugin>) -> Result<DependencyGraph, LoadError> {
    let mut graph = DependencyGraph::default();
    let mut pending = Vec::new();

    for plugin in candidates {
        let id = graph.insert(plugin);
        if !graph.bind(id) {
            pending.push(id);
        }
    }

    while !pending.is_empty() {
        let before = pending.len();
        pending.retain(|&id| !graph.bind(id));
        if pending.len() == before {
            break;
        }
    }

    if !pending.is_empty() {
        return Err(graph.unresolved(&pending).into());
    }

    if graph.roots.is_empty() && !graph.nodes.is_empty() {
        return Err(LoadError::NoRoots);
    }

    let unreachable = graph.unreachable();
    if !unreachable.is_empty() {
        return Err(LoadError::Cycle {
            plugins: unreachable
                .into_iter()
                .map(|id| graph.plugin(id).clone())
                .collect(),
        });
    }

    debug!(plugins = graph.len(), roots = graph.roots.len(), "resolved plugins");
    Ok(graph)
}
