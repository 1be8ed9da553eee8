//! Version ranges.

use crate::{error::ParseError, version::Version};
use std::{fmt, str::FromStr};

/// A contiguous interval of versions.
///
/// The textual form uses `[`/`]` for inclusive bounds and `(`/`)` for
/// exclusive ones, and brackets may be mixed: `(1.0.0,2.0.0]` holds every
/// version above `1.0.0` up to and including `2.0.0`.
///
/// A range is always valid: the minimum never exceeds the maximum, and a
/// single-version range is inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct VersionRange {
    minimum: Version,
    maximum: Version,
    min_inclusive: bool,
    max_inclusive: bool,
}

impl VersionRange {
    /// Create a range, validating its bounds.
    pub fn new(
        minimum: Version,
        maximum: Version,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Result<Self, ParseError> {
        match minimum.cmp(&maximum) {
            std::cmp::Ordering::Greater => {
                return Err(ParseError::InvertedRange { minimum, maximum });
            }
            std::cmp::Ordering::Equal if !(min_inclusive && max_inclusive) => {
                return Err(ParseError::ExclusivePoint(minimum));
            }
            _ => {}
        }

        Ok(Self {
            minimum,
            maximum,
            min_inclusive,
            max_inclusive,
        })
    }

    /// The range `[version,version]`.
    pub fn exact(version: Version) -> Self {
        Self {
            minimum: version.clone(),
            maximum: version,
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    /// The range `[minimum,maximum]`.
    pub fn inclusive(minimum: Version, maximum: Version) -> Result<Self, ParseError> {
        Self::new(minimum, maximum, true, true)
    }

    /// The range `[minimum,maximum)`.
    pub fn half_open(minimum: Version, maximum: Version) -> Result<Self, ParseError> {
        Self::new(minimum, maximum, true, false)
    }

    /// Lower bound.
    pub fn minimum(&self) -> &Version {
        &self.minimum
    }

    /// Upper bound.
    pub fn maximum(&self) -> &Version {
        &self.maximum
    }

    /// Whether the lower bound is part of the range.
    pub fn min_inclusive(&self) -> bool {
        self.min_inclusive
    }

    /// Whether the upper bound is part of the range.
    pub fn max_inclusive(&self) -> bool {
        self.max_inclusive
    }

    /// Returns `true` if `version` lies within the range.
    pub fn contains(&self, version: &Version) -> bool {
        let above_min = if self.min_inclusive {
            *version >= self.minimum
        } else {
            *version > self.minimum
        };
        let below_max = if self.max_inclusive {
            *version <= self.maximum
        } else {
            *version < self.maximum
        };
        above_min && below_max
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.min_inclusive { '[' } else { '(' };
        let close = if self.max_inclusive { ']' } else { ')' };
        write!(f, "{open}{},{}{close}", self.minimum, self.maximum)
    }
}

impl FromStr for VersionRange {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        let (min_inclusive, rest) = if let Some(rest) = input.strip_prefix('[') {
            (true, rest)
        } else if let Some(rest) = input.strip_prefix('(') {
            (false, rest)
        } else {
            return Err(ParseError::MissingMinBracket(input.to_string()));
        };

        let (max_inclusive, body) = if let Some(body) = rest.strip_suffix(']') {
            (true, body)
        } else if let Some(body) = rest.strip_suffix(')') {
            (false, body)
        } else {
            return Err(ParseError::MissingMaxBracket(input.to_string()));
        };

        let (minimum, maximum) = body
            .split_once(',')
            .ok_or_else(|| ParseError::MissingComma(input.to_string()))?;

        Self::new(
            minimum.parse()?,
            maximum.parse()?,
            min_inclusive,
            max_inclusive,
        )
    }
}

impl TryFrom<String> for VersionRange {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRange> for String {
    fn from(range: VersionRange) -> Self {
        range.to_string()
    }
}
