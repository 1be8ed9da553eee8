//! Plugin loading.
//!
//! Loading happens in two steps:
//!
//! 1. [`resolve`] binds every dependency to a satisfying candidate and
//!    rejects incomplete, rootless or cyclic sets.
//! 2. [`load`] walks the resolved graph from its roots and runs a start
//!    callback on each plugin after all of its dependencies.
//!
//! [`LoadedPlugins::unload`] undoes a load in exact reverse order.

mod graph;
mod orchestrator;

pub use graph::{DependencyGraph, NodeId, RegistrationState, resolve};
pub use orchestrator::{LoadOutcome, LoadedPlugin, LoadedPlugins, load};
