//! # strata - Dependency-Ordered Modules with Layered Dispatch
//!
//! `strata` loads a set of versioned modules in dependency order and
//! dispatches requests through the routes they mount on each other.
//!
//! - **Descriptors**: [`Version`], [`VersionRange`], [`Dependency`], [`Plugin`]
//! - **Loading**: [`resolve`], [`load`], [`LoadedPlugins::unload`]
//! - **Modules**: [`Module`], [`FnModule`], [`load_modules`]
//! - **Dispatch**: [`Dispatcher`] with its process and render passes
//! - **Configuration**: [`manifest::PluginManifest`] for TOML plugin lists
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::{AboutModule, BoxModule, BufferedResponse, CoreModule, State, load_modules};
//!
//! let modules: Vec<BoxModule<(), http::Request<()>, String>> = vec![
//!     Box::new(CoreModule::new(|value: &String, writer: &mut dyn ResponseWriter| {
//!         writer.write(value.as_bytes());
//!         Ok(())
//!     })),
//!     Box::new(AboutModule::new("About the world".to_string())),
//! ];
//!
//! let mut app = load_modules((), modules)?;
//! let request = http::Request::get("/about").body(())?;
//! let mut response = BufferedResponse::new();
//! app.dispatcher().dispatch(State::Empty, &request, &mut response)?;
//! app.shutdown()?;
//! ```
//!
//! ## Features
//!
//! - `tower`: [`service::DispatchService`], a `tower::Service` over `http::Request`s
//! - `inventory`: link-time plugin registration with [`register_plugin!`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use strata_core::{BoxError, Dependency, ParseError, Plugin, PluginId, Version, VersionRange};

// Loading
pub use strata_std::loader::{
    DependencyGraph, LoadOutcome, LoadedPlugin, LoadedPlugins, NodeId, RegistrationState, load,
    resolve,
};

// Errors
pub use strata_std::error::{
    DispatchError, LoadError, MissingDependency, RouteAccessError, UnclaimedState,
    UnresolvedDependencies, UnresolvedPlugin,
};

// Routing and dispatch
pub use strata_std::{
    dispatch::{
        DispatchTrace, Dispatcher, Process, ProcessCx, Render, RenderCx, State, split_path,
    },
    routing::{HandlerEntry, ModuleRouter, ModuleRoutes, PathSpec, Routes, RoutingTable},
    transport::{BufferedResponse, RequestPath, ResponseWriter},
};

// Modules
pub use strata_std::{
    builtin::{
        ABOUT_MODULE_ID, AboutModule, Bootstrap, CORE_MODULE_ID, CoreModule, ROOT_MODULE_ID,
    },
    module::{FnModule, Module},
    runtime::{Application, BoxModule, PartialLoad, load_modules},
};

// Testing
pub use strata_std::testing;

pub mod manifest;

#[cfg(feature = "tower")]
pub mod service;

#[cfg(feature = "inventory")]
pub mod registration;

#[cfg(feature = "inventory")]
pub use inventory;
