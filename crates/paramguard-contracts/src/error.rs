//! Construction-time and I/O error types.
//!
//! Invalid input is never an error: it is reported through an
//! [`ErrorReport`](crate::report::ErrorReport).  `ParamGuardError` covers the
//! cases where a schema cannot be built or a schema file cannot be loaded.

use thiserror::Error;

/// The unified error type for paramguard.
#[derive(Debug, Error)]
pub enum ParamGuardError {
    /// A rule was declared with missing or contradictory parameters.
    #[error("invalid rule for field '{field}': {reason}")]
    InvalidRule { field: String, reason: String },

    /// A field was given more than one nested schema.
    #[error("field '{field}' already has a nested schema")]
    DuplicateNested { field: String },

    /// A nested schema references a name that was never defined.
    #[error("unknown schema '{name}'")]
    UnknownSchema { name: String },

    /// Named schemas reference each other in a loop.
    #[error("cyclic schema reference: {path}")]
    CyclicSchema { path: String },

    /// A custom rule names a check that was not registered.
    #[error("no custom check registered under '{name}'")]
    UnknownCustomCheck { name: String },

    /// A schema file is missing, unreadable, or malformed.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The document to validate could not be read or decoded.
    #[error("input error: {reason}")]
    InputError { reason: String },
}

/// Convenience alias used throughout the paramguard crates.
pub type ParamGuardResult<T> = Result<T, ParamGuardError>;
