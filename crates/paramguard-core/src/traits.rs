//! Extension points for the validation engine.
//!
//! The built-in rule kinds cover presence, inclusion, exclusion, and length.
//! Anything else plugs in through [`CustomCheck`], which keeps
//! application-specific knowledge out of the engine itself.

use std::sync::Arc;

use paramguard_contracts::value::ParamValue;

/// A caller-supplied predicate over a single present field value.
///
/// Return `Some(message)` when the value is rejected, or `None` when it is
/// accepted.  Implementations must be pure: the same value always yields the
/// same answer, and nothing outside the value is consulted.
pub trait CustomCheck: Send + Sync {
    fn check(&self, value: &ParamValue) -> Option<String>;
}

impl<F> CustomCheck for F
where
    F: Fn(&ParamValue) -> Option<String> + Send + Sync,
{
    fn check(&self, value: &ParamValue) -> Option<String> {
        self(value)
    }
}

/// Shared handle to a registered custom check.
pub type CustomCheckFn = Arc<dyn CustomCheck>;
