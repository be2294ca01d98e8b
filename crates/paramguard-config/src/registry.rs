//! Named custom checks available to schema files.
//!
//! A schema file can only refer to custom checks by name.  The hosting
//! application registers the functions before loading; a file that names an
//! unregistered check fails to load rather than failing later at validation.

use std::collections::HashMap;
use std::sync::Arc;

use paramguard_core::traits::{CustomCheck, CustomCheckFn};

/// A name-to-function map of custom checks.
#[derive(Default, Clone)]
pub struct CheckRegistry {
    checks: HashMap<String, CustomCheckFn>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `check` under `name`.  Registering the same name twice
    /// replaces the previous function.
    pub fn register(&mut self, name: impl Into<String>, check: impl CustomCheck + 'static) {
        self.checks.insert(name.into(), Arc::new(check));
    }

    pub fn get(&self, name: &str) -> Option<CustomCheckFn> {
        self.checks.get(name).cloned()
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.checks.keys().collect();
        names.sort();
        f.debug_struct("CheckRegistry").field("checks", &names).finish()
    }
}
