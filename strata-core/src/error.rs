//! Error types for descriptor parsing.
//!
//! Every textual form accepted by this crate (versions, ranges and
//! dependencies) reports failures through [`ParseError`].

use crate::version::Version;
use thiserror::Error;

/// A boxed error type for caller-supplied failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while parsing or constructing descriptors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The version string was empty.
    #[error("empty version string")]
    EmptyVersion,

    /// A numeric version component could not be parsed.
    #[error("invalid version component `{component}` in `{input}`")]
    InvalidComponent {
        /// The full version text.
        input: String,
        /// The offending component.
        component: String,
    },

    /// More than `MAJOR.MINOR.PATCH` numeric components were given.
    #[error("too many components in version `{0}`")]
    TooManyComponents(String),

    /// The range did not open with `[` or `(`.
    #[error("range `{0}` must start with `[` or `(`")]
    MissingMinBracket(String),

    /// The range did not close with `]` or `)`.
    #[error("range `{0}` must end with `]` or `)`")]
    MissingMaxBracket(String),

    /// The range had no `,` separating its bounds.
    #[error("range `{0}` is missing `,`")]
    MissingComma(String),

    /// The minimum bound is greater than the maximum bound.
    #[error("minimum version {minimum} is greater than maximum {maximum}")]
    InvertedRange {
        /// Lower bound.
        minimum: Version,
        /// Upper bound.
        maximum: Version,
    },

    /// A single-version range used an exclusive bound.
    #[error("single version range {0} must be inclusive on both ends")]
    ExclusivePoint(Version),

    /// A dependency had no version range.
    #[error("dependency `{0}` has no version range")]
    MissingRange(String),

    /// A dependency had an empty target id.
    #[error("dependency `{0}` has an empty plugin id")]
    EmptyId(String),
}
