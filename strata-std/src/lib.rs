//! # strata-std
//!
//! Loading and dispatch machinery for the Strata module framework.
//!
//! This crate provides:
//! - **Loading**: [`loader::resolve`], [`loader::load`] and
//!   [`loader::LoadedPlugins::unload`]
//! - **Routing**: per-module tables built through scoped [`routing::Routes`]
//! - **Dispatch**: the two-pass [`dispatch::Dispatcher`]
//! - **Modules**: the [`module::Module`] trait, built-in modules and
//!   [`runtime::load_modules`]
//! - **Transport**: [`transport::RequestPath`], [`transport::ResponseWriter`]
//!   and [`transport::BufferedResponse`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use strata_core;

// Modules
pub mod builtin;
pub mod dispatch;
pub mod error;
pub mod loader;
pub mod module;
pub mod routing;
pub mod runtime;
pub mod testing;
pub mod transport;
