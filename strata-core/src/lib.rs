//! # strata-core
//!
//! Descriptor types for the Strata module framework.
//!
//! This crate has minimal dependencies and is meant to be imported by
//! plugins that only need to *describe* themselves, without pulling in the
//! loader or the dispatch engine from `strata-std`.
//!
//! # Descriptors
//!
//! - [`Version`] - `MAJOR.MINOR.PATCH[-LABEL]`, totally ordered
//! - [`VersionRange`] - an open, closed or half-open interval of versions
//! - [`Dependency`] - a target [`PluginId`] plus an acceptable range
//! - [`Plugin`] - id, version and ordered dependencies
//!
//! # Features
//!
//! - `serde`: (de)serialize versions, ranges and dependencies through their
//!   textual forms.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod dependency;
mod error;
mod plugin;
mod range;
mod version;

// Re-exports
pub use dependency::{Dependency, PluginId};
pub use error::{BoxError, ParseError};
pub use plugin::Plugin;
pub use range::VersionRange;
pub use version::Version;
