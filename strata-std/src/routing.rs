//! Per-module routing tables.
//!
//! Every module owns a table mapping path segments to handler chains.
//! Modules mount handlers into the tables of their dependencies while they
//! start, through a [`Routes`] accessor scoped to the starting plugin.
//! Once loading is done the table is frozen inside a
//! [`Dispatcher`](crate::dispatch::Dispatcher).

use crate::{
    builtin::{self, ROOT_MODULE_ID},
    dispatch::{Process, ProcessCx, Render, RenderCx, State},
    error::RouteAccessError,
};
use std::{borrow::Borrow, collections::HashMap, fmt, sync::Arc};
use strata_core::{BoxError, Plugin, PluginId};
use tracing::debug;

/// A single path segment a handler chain is mounted on.
///
/// The empty segment addresses the module itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathSpec(String);

impl PathSpec {
    /// Create a path segment.
    pub fn new(segment: impl Into<String>) -> Self {
        Self(segment.into())
    }

    /// The segment as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathSpec {
    fn from(segment: &str) -> Self {
        Self(segment.to_string())
    }
}

impl From<String> for PathSpec {
    fn from(segment: String) -> Self {
        Self(segment)
    }
}

impl Borrow<str> for PathSpec {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A process/render pair tagged with the module that registered it.
pub struct HandlerEntry<Req, S> {
    module: PluginId,
    process: Arc<dyn Process<Req, S>>,
    render: Arc<dyn Render<Req, S>>,
}

impl<Req, S> HandlerEntry<Req, S> {
    /// Tag a handler pair with its owner.
    pub fn new(
        module: impl Into<PluginId>,
        process: impl Process<Req, S>,
        render: impl Render<Req, S>,
    ) -> Self {
        Self {
            module: module.into(),
            process: Arc::new(process),
            render: Arc::new(render),
        }
    }

    /// The module that registered this entry.
    pub fn module(&self) -> &PluginId {
        &self.module
    }

    pub(crate) fn process(&self) -> &dyn Process<Req, S> {
        self.process.as_ref()
    }

    pub(crate) fn render(&self) -> &dyn Render<Req, S> {
        self.render.as_ref()
    }
}

impl<Req, S> Clone for HandlerEntry<Req, S> {
    fn clone(&self) -> Self {
        Self {
            module: self.module.clone(),
            process: Arc::clone(&self.process),
            render: Arc::clone(&self.render),
        }
    }
}

impl<Req, S> fmt::Debug for HandlerEntry<Req, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// The routing record of a single module.
pub struct ModuleRoutes<Req, S> {
    default_path: Option<PathSpec>,
    paths: HashMap<PathSpec, Vec<HandlerEntry<Req, S>>>,
}

impl<Req, S> ModuleRoutes<Req, S> {
    fn new() -> Self {
        Self {
            default_path: None,
            paths: HashMap::new(),
        }
    }

    /// The first path segment ever registered on this module.
    pub fn default_path(&self) -> Option<&PathSpec> {
        self.default_path.as_ref()
    }

    /// Handler chain mounted on `segment`, in registration order.
    pub fn get(&self, segment: &str) -> Option<&[HandlerEntry<Req, S>]> {
        self.paths
            .get(segment)
            .map(Vec::as_slice)
            .filter(|entries| !entries.is_empty())
    }

    /// Mounted path segments, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &PathSpec> {
        self.paths.keys()
    }

    fn push(&mut self, path: PathSpec, entry: HandlerEntry<Req, S>) {
        if self.paths.is_empty() {
            self.default_path = Some(path.clone());
        }
        self.paths.entry(path).or_default().push(entry);
    }
}

impl<Req, S> fmt::Debug for ModuleRoutes<Req, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRoutes")
            .field("default_path", &self.default_path)
            .field("paths", &self.paths)
            .finish()
    }
}

/// Routing records of every module, keyed by module id.
///
/// A new table already routes the empty segment of the bootstrap module to
/// the built-in not-found handler and default renderer.
pub struct RoutingTable<Req, S> {
    modules: HashMap<PluginId, ModuleRoutes<Req, S>>,
}

impl<Req: 'static, S: 'static> RoutingTable<Req, S> {
    /// Create a table seeded with the bootstrap entry.
    pub fn new() -> Self {
        let mut table = Self {
            modules: HashMap::new(),
        };
        table.add(
            PluginId::from(ROOT_MODULE_ID),
            PathSpec::default(),
            HandlerEntry::new(
                ROOT_MODULE_ID,
                builtin::not_found::<Req, S>,
                builtin::default_renderer::<Req, S>,
            ),
        );
        table
    }
}

impl<Req: 'static, S: 'static> Default for RoutingTable<Req, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, S> RoutingTable<Req, S> {
    /// The routing record of a module, if anything was mounted on it.
    pub fn module(&self, id: &str) -> Option<&ModuleRoutes<Req, S>> {
        self.modules.get(id)
    }

    pub(crate) fn module_entry(&self, id: &str) -> Option<(&PluginId, &ModuleRoutes<Req, S>)> {
        self.modules.get_key_value(id)
    }

    /// Handler chain mounted on `segment` of `module`.
    pub fn lookup(&self, module: &str, segment: &str) -> Option<&[HandlerEntry<Req, S>]> {
        self.modules.get(module)?.get(segment)
    }

    /// Append `entry` to the chain of `path` within `target`'s record.
    pub fn add(&mut self, target: PluginId, path: PathSpec, entry: HandlerEntry<Req, S>) {
        debug!(
            target = %target,
            path = %path,
            owner = %entry.module,
            "mounted route"
        );
        self.modules
            .entry(target)
            .or_insert_with(ModuleRoutes::new)
            .push(path, entry);
    }

    /// Scope the table to a starting plugin.
    pub fn routes<'a>(&'a mut self, plugin: &'a Plugin) -> Routes<'a, Req, S> {
        Routes { table: self, plugin }
    }
}

impl<Req, S> fmt::Debug for RoutingTable<Req, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(&self.modules).finish()
    }
}

/// Routing table access for one starting plugin.
///
/// A plugin may mount routes on the bootstrap module and on any module it
/// declares a dependency on. Its own record is filled by its dependents.
pub struct Routes<'a, Req, S> {
    table: &'a mut RoutingTable<Req, S>,
    plugin: &'a Plugin,
}

impl<Req, S> Routes<'_, Req, S> {
    /// The plugin this accessor is scoped to.
    pub fn plugin(&self) -> &Plugin {
        self.plugin
    }

    /// Open the routing record of `target` for mounting.
    ///
    /// # Errors
    ///
    /// Returns [`RouteAccessError`] if `target` is not accessible to the
    /// scoped plugin. Propagating it with `?` aborts the plugin's start.
    pub fn get(&mut self, target: &str) -> Result<ModuleRouter<'_, Req, S>, RouteAccessError> {
        let plugin = self.plugin;
        let allowed = target == ROOT_MODULE_ID || plugin.depends_on(target);
        if !allowed {
            return Err(RouteAccessError {
                target: PluginId::from(target),
                plugin: plugin.id().clone(),
            });
        }

        Ok(ModuleRouter {
            table: &mut *self.table,
            target: PluginId::from(target),
            owner: plugin.id(),
        })
    }
}

/// Mounts handlers into one module's routing record.
pub struct ModuleRouter<'r, Req, S> {
    table: &'r mut RoutingTable<Req, S>,
    target: PluginId,
    owner: &'r PluginId,
}

impl<Req, S> ModuleRouter<'_, Req, S> {
    /// The module whose record is being edited.
    pub fn module(&self) -> &PluginId {
        &self.target
    }

    /// The record's default path, the first segment ever mounted on it.
    pub fn default_path(&self) -> Option<&PathSpec> {
        self.table.module(self.target.as_str())?.default_path()
    }

    /// Append a closure pair to the chain of `path`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// routes.get("core")?.add_route(
    ///     "about",
    ///     |_, _| Ok(State::Value("about page".to_string())),
    ///     |state, _| Ok(state),
    /// );
    /// ```
    pub fn add_route<P, R>(&mut self, path: impl Into<PathSpec>, process: P, render: R) -> &mut Self
    where
        P: Fn(State<S>, ProcessCx<'_, Req, S>) -> Result<State<S>, BoxError> + Send + Sync + 'static,
        R: Fn(State<S>, RenderCx<'_, Req, S>) -> Result<State<S>, BoxError> + Send + Sync + 'static,
    {
        self.add_handlers(path, process, render)
    }

    /// Append any [`Process`]/[`Render`] pair to the chain of `path`.
    pub fn add_handlers(
        &mut self,
        path: impl Into<PathSpec>,
        process: impl Process<Req, S>,
        render: impl Render<Req, S>,
    ) -> &mut Self {
        let entry = HandlerEntry::new(self.owner.clone(), process, render);
        self.table.add(self.target.clone(), path.into(), entry);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Table = RoutingTable<&'static str, String>;

    fn passthrough(table: &mut Table, plugin: &Plugin, target: &str, path: &str) -> Result<(), RouteAccessError> {
        table
            .routes(plugin)
            .get(target)?
            .add_route(path, |state, _| Ok(state), |state, _| Ok(state));
        Ok(())
    }

    #[test]
    fn test_new_table_routes_bootstrap() {
        let table = Table::new();
        let entries = table.lookup(ROOT_MODULE_ID, "").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].module(), ROOT_MODULE_ID);
        assert_eq!(
            table.module(ROOT_MODULE_ID).unwrap().default_path(),
            Some(&PathSpec::default())
        );
    }

    #[test]
    fn test_first_path_becomes_default() {
        let mut table = Table::new();
        let status = Plugin::parse("status", "1.0.0", ["core [1.0.0,1.0.0]"]).unwrap();
        passthrough(&mut table, &status, "core", "status").unwrap();
        passthrough(&mut table, &status, "core", "about").unwrap();

        let routes = table.module("core").unwrap();
        assert_eq!(routes.default_path().unwrap().as_str(), "status");
        assert_eq!(routes.paths().count(), 2);
    }

    #[test]
    fn test_entries_append_in_registration_order() {
        let mut table = Table::new();
        let core = Plugin::parse("core", "1.0.0", ["bootstrap [1.0.0,1.0.0]"]).unwrap();
        passthrough(&mut table, &core, ROOT_MODULE_ID, "").unwrap();

        let owners: Vec<_> = table
            .lookup(ROOT_MODULE_ID, "")
            .unwrap()
            .iter()
            .map(|e| e.module().as_str())
            .collect();
        assert_eq!(owners, [ROOT_MODULE_ID, "core"]);
    }

    #[test]
    fn test_access_requires_dependency() {
        let mut table = Table::new();
        let about = Plugin::parse("about", "1.0.0", ["core [1.0.0,2.0.0)"]).unwrap();

        passthrough(&mut table, &about, "core", "about").unwrap();
        passthrough(&mut table, &about, ROOT_MODULE_ID, "about").unwrap();

        let err = passthrough(&mut table, &about, "git", "log").unwrap_err();
        assert_eq!(err.target, "git");
        assert_eq!(err.plugin, "about");
        assert!(table.module("git").is_none());

        let err = passthrough(&mut table, &about, "about", "").unwrap_err();
        assert_eq!(err.target, "about");
        assert!(table.module("about").is_none());
    }

    #[test]
    fn test_lookup_misses() {
        let table = Table::new();
        assert!(table.lookup(ROOT_MODULE_ID, "missing").is_none());
        assert!(table.lookup("core", "").is_none());
    }
}
