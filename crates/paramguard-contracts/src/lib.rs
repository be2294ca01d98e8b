//! # paramguard-contracts
//!
//! Shared types for the paramguard allow-list validator.
//!
//! All crates in the workspace import from here. No validation logic lives in
//! this crate, only the input value model, the error report, and error types.

pub mod error;
pub mod report;
pub mod value;

pub use error::{ParamGuardError, ParamGuardResult};
pub use report::{ErrorEntry, ErrorKind, ErrorReport, FieldError, Validation};
pub use value::{ParamValue, Params};
