//! Plugin descriptors.

use crate::{
    dependency::{Dependency, PluginId},
    error::ParseError,
    version::Version,
};
use std::fmt;

/// Describes a single loadable unit of functionality.
///
/// A plugin has an id, a version and an ordered list of dependencies on
/// other plugins. Descriptors are immutable once built.
///
/// # Example
///
/// ```rust,ignore
/// let base = Plugin::new("base", Version::new(1, 0, 0));
/// let maven = Plugin::parse("maven", "1.0.2", ["base [1.0.0,1.0.2)"])?;
/// assert!(base.satisfies(&maven.dependencies()[0]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Plugin {
    id: PluginId,
    version: Version,
    dependencies: Vec<Dependency>,
}

impl Plugin {
    /// Create a plugin without dependencies.
    pub fn new(id: impl Into<PluginId>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            dependencies: Vec::new(),
        }
    }

    /// Build a plugin from its textual parts.
    pub fn parse<I, D>(id: impl Into<PluginId>, version: &str, dependencies: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<str>,
    {
        let dependencies = dependencies
            .into_iter()
            .map(|d| d.as_ref().parse())
            .collect::<Result<Vec<Dependency>, _>>()?;

        Ok(Self {
            id: id.into(),
            version: version.parse()?,
            dependencies,
        })
    }

    /// Append a dependency.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Append several dependencies.
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = Dependency>) -> Self {
        self.dependencies.extend(dependencies);
        self
    }

    /// The plugin id.
    pub fn id(&self) -> &PluginId {
        &self.id
    }

    /// The plugin version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Declared dependencies, in declaration order.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Returns `true` if this plugin has the dependency's target id and a
    /// version within its range.
    pub fn satisfies(&self, dependency: &Dependency) -> bool {
        self.id == *dependency.target() && dependency.range().contains(&self.version)
    }

    /// Returns `true` if any declared dependency targets `id`.
    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|d| d.target() == id)
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maven() -> Plugin {
        Plugin::parse("maven", "1.0.2", ["base [1.0.0,1.0.2)"]).unwrap()
    }

    #[test]
    fn test_plugin_satisfies_dependency() {
        let table = [
            (true, "maven [1.0.2,2.0.0-beta)"),
            (true, "maven [1.0.2,1.0.2]"),
            (false, "maven (1.0.2,2.0.0-beta]"),
            (false, "maven [1.0.1,1.0.2)"),
            (false, "gradle [1.0.0,2.0.0]"),
        ];

        let plugin = maven();
        for (expected, dependency) in table {
            let dependency: Dependency = dependency.parse().unwrap();
            assert_eq!(plugin.satisfies(&dependency), expected, "{dependency}");
        }
    }

    #[test]
    fn test_plugin_equality() {
        assert_eq!(maven(), maven());
        assert_ne!(maven(), Plugin::new("maven", Version::new(1, 0, 2)));
    }

    #[test]
    fn test_depends_on() {
        let plugin = maven();
        assert!(plugin.depends_on("base"));
        assert!(!plugin.depends_on("git"));
        assert_eq!(plugin.to_string(), "maven 1.0.2");
    }
}
