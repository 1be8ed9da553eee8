//! Link-time plugin registration via `inventory`.
//!
//! Plugins declared with [`register_plugin!`](crate::register_plugin) anywhere
//! in the final binary are collected by [`registered_plugins`].
//!
//! # Example
//!
//! ```rust,ignore
//! strata::register_plugin!("base", "1.0.0");
//! strata::register_plugin!("maven", "1.0.2", "base [1.0.0,1.0.2)");
//!
//! let plugins = strata::registration::registered_plugins()?;
//! ```

use strata_core::{ParseError, Plugin};

/// A plugin descriptor in textual form, submitted to `inventory`.
#[derive(Debug, Clone, Copy)]
pub struct ModuleRegistration {
    id: &'static str,
    version: &'static str,
    dependencies: &'static [&'static str],
}

impl ModuleRegistration {
    /// Describe a plugin by id, version and dependencies.
    pub const fn new(
        id: &'static str,
        version: &'static str,
        dependencies: &'static [&'static str],
    ) -> Self {
        Self {
            id,
            version,
            dependencies,
        }
    }

    /// Parse the descriptor.
    pub fn plugin(&self) -> Result<Plugin, ParseError> {
        Plugin::parse(self.id, self.version, self.dependencies)
    }
}

inventory::collect!(ModuleRegistration);

/// Every registered plugin, sorted by id then version.
///
/// Link order is unspecified; sorting keeps candidate order, and with it
/// first-match dependency binding, stable across builds.
pub fn registered_plugins() -> Result<Vec<Plugin>, ParseError> {
    let mut plugins = inventory::iter::<ModuleRegistration>
        .into_iter()
        .map(ModuleRegistration::plugin)
        .collect::<Result<Vec<_>, _>>()?;
    plugins.sort_by(|a, b| (a.id(), a.version()).cmp(&(b.id(), b.version())));
    Ok(plugins)
}

/// Registers a plugin descriptor for [`registered_plugins`].
///
/// # Example
/// ```rust,ignore
/// register_plugin!("maven", "1.0.2", "base [1.0.0,1.0.2)");
/// ```
#[macro_export]
macro_rules! register_plugin {
    ($id:expr, $version:expr $(, $dependency:expr)* $(,)?) => {
        $crate::inventory::submit! {
            $crate::registration::ModuleRegistration::new($id, $version, &[$($dependency),*])
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::register_plugin!("registered-base", "1.0.0");
    crate::register_plugin!("registered-git", "1.0.2", "registered-base [1.0.0,1.0.1]");

    #[test]
    fn test_registered_plugins_are_collected() {
        let plugins = registered_plugins().unwrap();
        let ids: Vec<_> = plugins.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, ["registered-base", "registered-git"]);
        assert!(plugins[0].satisfies(&plugins[1].dependencies()[0]));
    }
}
