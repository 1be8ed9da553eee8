//! Lifecycle orchestration over a resolved graph.

use super::graph::{DependencyGraph, NodeId, RegistrationState, resolve};
use crate::error::LoadError;
use strata_core::{BoxError, Dependency, Plugin};
use tracing::{debug, info, info_span, warn};

/// A read-only view of one node handed to lifecycle callbacks.
#[derive(Clone, Copy)]
pub struct LoadedPlugin<'g> {
    graph: &'g DependencyGraph,
    id: NodeId,
}

impl<'g> LoadedPlugin<'g> {
    /// Position of the plugin in the candidate list passed to [`load`].
    pub fn index(&self) -> usize {
        self.id.index()
    }

    /// The underlying descriptor.
    pub fn plugin(&self) -> &'g Plugin {
        self.graph.plugin(self.id)
    }

    /// Each declared dependency with the node bound to it.
    pub fn dependencies(self) -> impl Iterator<Item = (&'g Dependency, LoadedPlugin<'g>)> {
        let graph = self.graph;
        graph
            .dependencies(self.id)
            .map(move |(dependency, id)| (dependency, LoadedPlugin { graph, id }))
    }

    /// Nodes depending on this one, in binding order.
    pub fn dependents(self) -> impl Iterator<Item = LoadedPlugin<'g>> {
        let graph = self.graph;
        graph
            .dependents(self.id)
            .iter()
            .map(move |&id| LoadedPlugin { graph, id })
    }

    /// Current lifecycle position, `None` before the node is reached or
    /// after it has been unloaded.
    pub fn state(&self) -> Option<RegistrationState> {
        self.graph.nodes[self.id.0].state
    }
}

impl std::fmt::Debug for LoadedPlugin<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("plugin", self.plugin())
            .field("state", &self.state())
            .finish()
    }
}

/// Plugins whose start callback succeeded, in start order.
#[derive(Debug, Default)]
pub struct LoadedPlugins {
    graph: DependencyGraph,
    order: Vec<NodeId>,
}

impl LoadedPlugins {
    /// Number of loaded plugins.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The `i`-th loaded plugin.
    pub fn get(&self, i: usize) -> Option<LoadedPlugin<'_>> {
        self.order.get(i).map(|&id| LoadedPlugin {
            graph: &self.graph,
            id,
        })
    }

    /// Loaded plugins in start order.
    pub fn iter(&self) -> impl Iterator<Item = LoadedPlugin<'_>> + '_ {
        self.order.iter().map(|&id| LoadedPlugin {
            graph: &self.graph,
            id,
        })
    }

    /// The resolved graph, including nodes that were never started.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Run `stop` on every loaded plugin in exact reverse start order.
    ///
    /// Stops at the first failing callback. The loaded list is then
    /// truncated to the plugins not yet stopped, the failing one included,
    /// so a later call resumes where this one left off.
    pub fn unload<C, F>(&mut self, context: &mut C, mut stop: F) -> Result<(), LoadError>
    where
        F: FnMut(&mut C, LoadedPlugin<'_>) -> Result<(), BoxError>,
    {
        let span = info_span!("unload", plugins = self.order.len());
        let _enter = span.enter();

        let mut remaining = self.order.len();
        let mut result = Ok(());
        while remaining > 0 {
            let id = self.order[remaining - 1];
            info!(plugin = %self.graph.plugin(id), "stopping plugin");
            let view = LoadedPlugin {
                graph: &self.graph,
                id,
            };
            if let Err(source) = stop(context, view) {
                let plugin = self.graph.plugin(id).clone();
                warn!(%plugin, error = %source, "plugin failed to stop");
                result = Err(LoadError::Stop { plugin, source });
                break;
            }
            self.graph.nodes[id.0].state = None;
            remaining -= 1;
        }

        self.order.truncate(remaining);
        result
    }
}

/// What [`load`] hands back: the context threaded through every callback,
/// the plugins started so far and the first error, if any.
#[derive(Debug)]
pub struct LoadOutcome<C> {
    /// The context after the last callback ran.
    pub context: C,
    /// Plugins whose start callback succeeded.
    pub plugins: LoadedPlugins,
    /// The resolution error or first callback error.
    pub result: Result<(), LoadError>,
}

impl<C> LoadOutcome<C> {
    /// Split into the context and either the loaded plugins or the error
    /// together with the partially loaded plugins.
    pub fn into_result(self) -> Result<(C, LoadedPlugins), (C, LoadedPlugins, LoadError)> {
        match self.result {
            Ok(()) => Ok((self.context, self.plugins)),
            Err(error) => Err((self.context, self.plugins, error)),
        }
    }
}

struct Walker {
    graph: DependencyGraph,
    seen: Vec<bool>,
    order: Vec<NodeId>,
}

impl Walker {
    fn visit<C, F>(&mut self, id: NodeId, context: &mut C, start: &mut F) -> Result<(), LoadError>
    where
        F: FnMut(&mut C, LoadedPlugin<'_>) -> Result<(), BoxError>,
    {
        if self.seen[id.0] {
            return Ok(());
        }
        let ready = self.graph.nodes[id.0]
            .satisfiers
            .iter()
            .flatten()
            .all(|dependency| self.seen[dependency.0]);
        if !ready {
            // Revisited from the last dependency to be seen.
            return Ok(());
        }

        self.seen[id.0] = true;
        self.graph.nodes[id.0].state = Some(RegistrationState::DependenciesRegistered);
        info!(plugin = %self.graph.plugin(id), "starting plugin");

        let view = LoadedPlugin {
            graph: &self.graph,
            id,
        };
        start(context, view).map_err(|source| LoadError::Start {
            plugin: self.graph.plugin(id).clone(),
            source,
        })?;
        self.order.push(id);
        self.graph.nodes[id.0].state = Some(RegistrationState::PluginRegistered);

        let dependents = self.graph.dependents(id).to_vec();
        for dependent in dependents {
            self.visit(dependent, context, start)?;
        }
        self.graph.nodes[id.0].state = Some(RegistrationState::DependentsRegistered);
        Ok(())
    }
}

/// Resolve `candidates` and run `start` on every plugin, dependencies first.
///
/// Traversal is depth-first from each root in candidate order. A node is
/// entered only once all of its dependencies have been started; the last
/// of them to start enters it. The context is threaded through every
/// callback and returned in the outcome even when loading fails.
///
/// # Example
///
/// ```rust,ignore
/// let outcome = load(Vec::new(), plugins, |order: &mut Vec<String>, plugin| {
///     order.push(plugin.plugin().id().to_string());
///     Ok(())
/// });
/// assert_eq!(outcome.context, ["base", "maven"]);
/// ```
pub fn load<C, F>(mut context: C, candidates: impl IntoIterator<Item = Plugin>, mut start: F) -> LoadOutcome<C>
where
    F: FnMut(&mut C, LoadedPlugin<'_>) -> Result<(), BoxError>,
{
    let span = info_span!("load");
    let _enter = span.enter();

    let graph = match resolve(candidates) {
        Ok(graph) => graph,
        Err(error) => {
            warn!(%error, "plugin resolution failed");
            return LoadOutcome {
                context,
                plugins: LoadedPlugins::default(),
                result: Err(error),
            };
        }
    };

    let mut walker = Walker {
        seen: vec![false; graph.len()],
        order: Vec::with_capacity(graph.len()),
        graph,
    };

    let roots = walker.graph.roots().to_vec();
    let mut result = Ok(());
    for root in roots {
        if let Err(error) = walker.visit(root, &mut context, &mut start) {
            warn!(%error, loaded = walker.order.len(), "plugin loading aborted");
            result = Err(error);
            break;
        }
    }

    if result.is_ok() {
        debug!(loaded = walker.order.len(), "plugins loaded");
    }

    LoadOutcome {
        context,
        plugins: LoadedPlugins {
            graph: walker.graph,
            order: walker.order,
        },
        result,
    }
}
