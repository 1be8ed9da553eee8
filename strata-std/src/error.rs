//! Error types for loading and dispatch.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`LoadError`] - resolution and lifecycle failures
//! - [`UnresolvedDependencies`] - per-plugin diagnostics for missing dependencies
//! - [`RouteAccessError`] - a module touched a routing table it may not access
//! - [`DispatchError`] - process/render failures for a single request

use std::fmt;
use strata_core::{BoxError, Dependency, Plugin, PluginId};
use thiserror::Error;

/// Errors that abort a `load` or `unload` call.
#[derive(Error, Debug)]
pub enum LoadError {
    /// One or more plugins have dependencies no candidate satisfies.
    #[error(transparent)]
    Unresolved(#[from] UnresolvedDependencies),

    /// The candidate set is non-empty but every plugin has a dependency.
    #[error("no root plugins detected: every plugin declares a dependency")]
    NoRoots,

    /// Resolved plugins that can never start because they depend on each other.
    #[error("dependency cycle between plugins: {}", join(.plugins))]
    Cycle {
        /// Plugins caught in the cycle or depending on it.
        plugins: Vec<Plugin>,
    },

    /// A start callback failed.
    #[error("plugin [{plugin}] failed to start")]
    Start {
        /// The plugin whose callback failed.
        plugin: Plugin,
        /// The error returned by the callback.
        #[source]
        source: BoxError,
    },

    /// A stop callback failed.
    #[error("plugin [{plugin}] failed to stop")]
    Stop {
        /// The plugin whose callback failed.
        plugin: Plugin,
        /// The error returned by the callback.
        #[source]
        source: BoxError,
    },
}

fn join(plugins: &[Plugin]) -> String {
    plugins
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A declared dependency that no candidate satisfies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    /// The unsatisfied dependency.
    pub dependency: Dependency,
    /// Every candidate sharing the dependency's target id, in registration order.
    pub candidates: Vec<Plugin>,
}

/// A plugin with at least one unsatisfied dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPlugin {
    /// The plugin that could not be resolved.
    pub plugin: Plugin,
    /// Its unsatisfied dependencies.
    pub missing: Vec<MissingDependency>,
}

/// Returned when the candidate set is incomplete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependencies {
    plugins: Vec<UnresolvedPlugin>,
}

impl UnresolvedDependencies {
    pub(crate) fn new(plugins: Vec<UnresolvedPlugin>) -> Self {
        Self { plugins }
    }

    /// The plugins that could not be resolved, in candidate order.
    pub fn plugins(&self) -> &[UnresolvedPlugin] {
        &self.plugins
    }

    /// Look up the diagnostics for a plugin id.
    pub fn get(&self, id: &str) -> Option<&UnresolvedPlugin> {
        self.plugins.iter().find(|u| u.plugin.id() == id)
    }
}

impl fmt::Display for UnresolvedDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, unresolved) in self.plugins.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "cannot resolve plugin [{}]", unresolved.plugin)?;
            for missing in &unresolved.missing {
                write!(f, "\n  missing dependency: {}", missing.dependency)?;
                if missing.candidates.is_empty() {
                    write!(f, "\n  candidates: none")?;
                } else {
                    write!(f, "\n  candidates: {}", join(&missing.candidates))?;
                }
            }
        }
        Ok(())
    }
}

/// A module asked for the routing table of a module it does not depend on.
///
/// This always indicates a wrong plugin manifest: the dependency must be
/// declared before routes can be mounted under the target module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid access, module `{target}` is not a dependency of `{plugin}`")]
pub struct RouteAccessError {
    /// The module whose table was requested.
    pub target: PluginId,
    /// The module that asked.
    pub plugin: PluginId,
}

/// Signals that a state reached the bootstrap renderer unclaimed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot handle state of unknown type")]
pub struct UnclaimedState;

/// Errors raised while dispatching a single request.
///
/// Dispatch errors never affect the routing table; only the failing
/// request is aborted.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A process handler failed.
    #[error("process handler of module `{module}` failed at `{path}`")]
    Process {
        /// Owner of the failing entry. When the error surfaced through
        /// parent calls, this is the innermost entry that failed.
        module: PluginId,
        /// Path consumed up to the failing segment.
        path: String,
        /// The handler's error.
        #[source]
        source: BoxError,
    },

    /// A render handler failed.
    #[error("render handler of module `{module}` failed at `{path}`")]
    Render {
        /// Owner of the failing entry. When the error surfaced through
        /// parent calls, this is the innermost entry that failed.
        module: PluginId,
        /// Path consumed up to the failing segment.
        path: String,
        /// The handler's error.
        #[source]
        source: BoxError,
    },

    /// No renderer in the chain claimed the produced state.
    #[error("state produced for `{path}` was not claimed by any renderer")]
    UnhandledState {
        /// Path consumed up to the segment being rendered.
        path: String,
    },
}
