//! Error types for reference parsing and matching.

use thiserror::Error;

/// Errors produced while parsing, validating or matching image references.
///
/// Every variant is a permanent input-validation failure; nothing here is
/// worth retrying.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    /// The input does not follow the reference grammar.
    #[error("invalid reference format")]
    InvalidFormat,

    /// The tag portion does not match `[\w][\w.-]{0,127}`.
    #[error("invalid tag format")]
    TagInvalidFormat,

    /// The digest portion is not a well-formed `algorithm:hex` digest.
    #[error("invalid digest format")]
    DigestInvalidFormat,

    /// The repository name contains uppercase characters.
    #[error("invalid reference format: repository name must be lowercase")]
    NameContainsUppercase,

    /// The repository name is empty.
    #[error("repository name must have at least one component")]
    NameEmpty,

    /// The full repository name exceeds the configured maximum.
    #[error("repository name must not be more than {max} characters")]
    NameTooLong { max: usize },

    /// A fully qualified name was required but the input was not one.
    #[error("repository name must be canonical")]
    NameNotCanonical,

    /// A match pattern could not be parsed.
    #[error("syntax error in pattern: {0}")]
    MalformedPattern(String),
}

/// Convenience type alias for reference operations.
pub type Result<T> = std::result::Result<T, ReferenceError>;
