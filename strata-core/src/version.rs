//! Semantic versions.

use crate::{error::ParseError, range::VersionRange};
use std::{fmt, str::FromStr};

/// A plugin version: `MAJOR.MINOR.PATCH` with an optional label.
///
/// Versions are totally ordered by major, minor and patch, with the label
/// compared lexicographically only when the numeric parts tie. This means
/// `2.0.0-beta < 2.0.0-rel`, and a labelled version sorts *after* the
/// unlabelled one (`2.0.0 < 2.0.0-beta`).
///
/// # Example
///
/// ```rust,ignore
/// let v: Version = "2.0.1-beta".parse()?;
/// assert_eq!(v, Version::new(2, 0, 1).with_label("beta"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Version {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
    /// Free-form label following the first `-`.
    pub label: String,
}

impl Version {
    /// Create an unlabelled version.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            label: String::new(),
        }
    }

    /// Attach a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns `true` if this version falls within `range`.
    pub fn is_within(&self, range: &VersionRange) -> bool {
        range.contains(self)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.label.is_empty() {
            write!(f, "-{}", self.label)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(ParseError::EmptyVersion);
        }

        let (numbers, label) = match input.split_once('-') {
            Some((numbers, label)) => (numbers, label.to_string()),
            None => (input, String::new()),
        };

        // Missing trailing components default to zero.
        let mut parts = [0u64; 3];
        for (i, component) in numbers.split('.').enumerate() {
            let slot = parts
                .get_mut(i)
                .ok_or_else(|| ParseError::TooManyComponents(input.to_string()))?;
            *slot = component
                .parse()
                .map_err(|_| ParseError::InvalidComponent {
                    input: input.to_string(),
                    component: component.to_string(),
                })?;
        }

        let [major, minor, patch] = parts;
        Ok(Self {
            major,
            minor,
            patch,
            label,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_table() {
        let table = [
            (Version::new(1, 0, 0), "1.0.0"),
            (Version::new(1, 0, 1), "1.0.1"),
            (Version::new(1, 0, 0), "1"),
            (Version::new(3, 4, 0), "3.4"),
            (Version::new(2, 0, 1).with_label("beta"), "2.0.1-beta"),
            (
                Version::new(2, 0, 1).with_label("beta.012312"),
                "2.0.1-beta.012312",
            ),
            (
                Version::new(0, 1, 1).with_label("build-13013-alpha"),
                "0.1.1-build-13013-alpha",
            ),
        ];

        for (expected, input) in table {
            assert_eq!(input.parse::<Version>().unwrap(), expected, "input={input}");
        }
    }

    #[test]
    fn test_parse_version_rejects_garbage() {
        assert_eq!("".parse::<Version>(), Err(ParseError::EmptyVersion));
        assert!(matches!(
            "1.x.0".parse::<Version>(),
            Err(ParseError::InvalidComponent { .. })
        ));
        assert!(matches!(
            "1.2.3.4".parse::<Version>(),
            Err(ParseError::TooManyComponents(_))
        ));
        assert!("-beta".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        let v1_0_0 = Version::new(1, 0, 0);
        let v1_0_1 = Version::new(1, 0, 1);
        let v1_1_0 = Version::new(1, 1, 0);
        let v2_0_0 = Version::new(2, 0, 0);

        assert!(v1_0_0 < v1_0_1);
        assert!(v1_0_1 < v1_1_0);
        assert!(v1_1_0 < v2_0_0);
        assert_eq!(v1_0_0, Version::new(1, 0, 0));
    }

    #[test]
    fn test_label_breaks_ties_only() {
        let beta = Version::new(2, 0, 0).with_label("beta");
        let rel = Version::new(2, 0, 0).with_label("rel");

        assert!(beta < rel);
        assert!(Version::new(1, 9, 9).with_label("zzz") < beta);
        assert!(Version::new(2, 0, 0) < beta);
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::new(1, 2, 3).to_string(), "1.2.3");
        assert_eq!(
            Version::new(1, 2, 3).with_label("rc.1").to_string(),
            "1.2.3-rc.1"
        );
    }
}
