//! Declarative plugin manifests.
//!
//! A manifest lists plugin descriptors in TOML:
//!
//! ```toml
//! [[plugin]]
//! id = "base"
//! version = "1.0.0"
//!
//! [[plugin]]
//! id = "maven"
//! version = "1.0.2"
//! dependencies = ["base [1.0.0,1.0.2)"]
//! ```
//!
//! Versions and dependencies use their textual forms; malformed ones are
//! reported as TOML errors pointing at the offending value.

use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use strata_core::{Dependency, Plugin, PluginId, Version};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest `{}`", .path.display())]
    Io {
        /// The manifest path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid TOML or a value failed to parse.
    #[error("invalid manifest: {0}")]
    Toml(#[from] toml::de::Error),

    /// The same `(id, version)` pair is declared twice.
    #[error("plugin [{id} {version}] is declared more than once")]
    Duplicate {
        /// The repeated id.
        id: PluginId,
        /// The repeated version.
        version: Version,
    },
}

/// One `[[plugin]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginEntry {
    /// Plugin id.
    pub id: PluginId,
    /// Plugin version, e.g. `"1.0.2"`.
    pub version: Version,
    /// Dependencies in textual form, e.g. `"base [1.0.0,1.0.2)"`.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl From<PluginEntry> for Plugin {
    fn from(entry: PluginEntry) -> Self {
        Plugin::new(entry.id, entry.version).with_dependencies(entry.dependencies)
    }
}

/// A list of plugin descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// The declared plugins, in file order.
    #[serde(default, rename = "plugin")]
    pub plugins: Vec<PluginEntry>,
}

impl PluginManifest {
    /// Parse and validate a manifest.
    pub fn from_toml_str(input: &str) -> Result<Self, ManifestError> {
        let manifest: Self = toml::from_str(input)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read, parse and validate a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), plugins = manifest.plugins.len(), "loaded manifest");
        Ok(manifest)
    }

    /// Reject repeated `(id, version)` pairs.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = HashSet::new();
        for entry in &self.plugins {
            if !seen.insert((&entry.id, &entry.version)) {
                return Err(ManifestError::Duplicate {
                    id: entry.id.clone(),
                    version: entry.version.clone(),
                });
            }
        }
        Ok(())
    }

    /// The declared plugins as descriptors, in file order.
    pub fn into_plugins(self) -> Vec<Plugin> {
        self.plugins.into_iter().map(Plugin::from).collect()
    }
}
