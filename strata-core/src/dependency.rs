//! Plugin identities and dependency declarations.

use crate::{error::ParseError, range::VersionRange};
use std::{borrow::Borrow, fmt, str::FromStr};

/// The identity of a plugin.
///
/// Several versions of the same id may coexist in a candidate set; a plugin
/// is unique by its `(id, version)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct PluginId(String);

impl PluginId {
    /// Create a new id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PluginId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for PluginId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PluginId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PluginId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PluginId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A link from one plugin to another: a target id plus the acceptable
/// version range.
///
/// The textual form is `<id>[ ]<range>`, e.g. `maven [1.0.0,2.0.0)` or
/// `foo(1.0.0,2.0.0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Dependency {
    target: PluginId,
    range: VersionRange,
}

impl Dependency {
    /// Declare a dependency on `target` within `range`.
    pub fn new(target: impl Into<PluginId>, range: VersionRange) -> Self {
        Self {
            target: target.into(),
            range,
        }
    }

    /// The id of the plugin depended upon.
    pub fn target(&self) -> &PluginId {
        &self.target
    }

    /// The acceptable version range.
    pub fn range(&self) -> &VersionRange {
        &self.range
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target, self.range)
    }
}

impl FromStr for Dependency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let split = input
            .find([' ', '[', '('])
            .ok_or_else(|| ParseError::MissingRange(input.to_string()))?;

        let (id, range) = input.split_at(split);
        if id.is_empty() {
            return Err(ParseError::EmptyId(input.to_string()));
        }

        Ok(Self {
            target: PluginId::from(id),
            range: range.trim_start().parse()?,
        })
    }
}

impl TryFrom<String> for Dependency {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dependency> for String {
    fn from(dependency: Dependency) -> Self {
        dependency.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    #[test]
    fn test_parse_dependency() {
        let table = [
            ("foo [1.0.0,2.0.0]", true, true),
            ("foo(1.0.0,2.0.0]", false, true),
            ("foo (1.0.0,2.0.0)", false, false),
        ];

        for (input, min_inclusive, max_inclusive) in table {
            let dependency: Dependency = input.parse().unwrap();
            let expected = Dependency::new(
                "foo",
                VersionRange::new(
                    Version::new(1, 0, 0),
                    Version::new(2, 0, 0),
                    min_inclusive,
                    max_inclusive,
                )
                .unwrap(),
            );
            assert_eq!(dependency, expected, "input={input}");
        }
    }

    #[test]
    fn test_parse_dependency_errors() {
        assert!(matches!(
            "foo".parse::<Dependency>(),
            Err(ParseError::MissingRange(_))
        ));
        assert!(matches!(
            "[1.0.0,2.0.0]".parse::<Dependency>(),
            Err(ParseError::EmptyId(_))
        ));
        assert!(matches!(
            "foo [2.0.0,1.0.0]".parse::<Dependency>(),
            Err(ParseError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_display() {
        let dependency: Dependency = "maven(1.0.0,2.0.0-beta)".parse().unwrap();
        assert_eq!(dependency.to_string(), "maven (1.0.0,2.0.0-beta)");
        assert_eq!(dependency.target(), "maven");
    }
}
