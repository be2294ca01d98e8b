//! The recursive validation engine.
//!
//! Algorithm, applied independently at every nesting level:
//!
//! 1. For each declared field, in declaration order, run its rules against
//!    the field's value.  A missing key and an explicit null are both treated
//!    as absent: only presence checks (and required nested schemas) report
//!    them.
//! 2. If the field has a nested schema and a value, recurse.  A mapping is
//!    validated directly; a sequence is validated element by element.  The
//!    sub-report is attached under the field only if it holds errors.
//! 3. Every input key that is neither declared by the schema nor in the
//!    always-allowed seed set is recorded as `"is not allowed"`.
//!
//! No step short-circuits: a single run reports every failure.  The engine
//! holds no per-run state, so one `Validator` can serve any number of threads.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use paramguard_contracts::{
    report::{ErrorReport, FieldError, Validation},
    value::{ParamValue, Params},
};

use crate::rule::MISSING_MESSAGE;
use crate::schema::{FieldSpec, NestedSchema, Schema, BASE_KEY};

/// Validates input against a [`Schema`] and enforces its allow-list.
///
/// The always-allowed set names keys the host environment injects on every
/// request (routing metadata and the like).  They are accepted at every
/// nesting level without being declared.  The set is empty by default.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    always_allowed: BTreeSet<String>,
}

impl Validator {
    /// A validator with an empty always-allowed set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add keys that are never rejected, whatever the schema says.
    pub fn with_always_allowed<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_allowed.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn always_allowed(&self) -> &BTreeSet<String> {
        &self.always_allowed
    }

    /// Validate `input` against `schema`.
    ///
    /// The top-level input should be a mapping.  A null input is validated as
    /// an empty mapping; any other shape is reported under [`BASE_KEY`].
    pub fn validate(&self, schema: &Schema, input: &ParamValue) -> Validation {
        let errors = match input {
            ParamValue::Map(params) => self.validate_params(schema, params),
            ParamValue::Null => self.validate_params(schema, &Params::default()),
            _ => {
                let mut report = ErrorReport::new();
                report.add(BASE_KEY, FieldError::invalid("must be a mapping"));
                report
            }
        };

        let validation = Validation::from_report(errors);
        debug!(
            valid = validation.valid,
            error_count = validation.errors.error_count(),
            "validation complete"
        );
        validation
    }

    /// Convenience wrapper for callers holding decoded JSON.
    pub fn validate_json(&self, schema: &Schema, input: &serde_json::Value) -> Validation {
        self.validate(schema, &ParamValue::from(input.clone()))
    }

    /// Validate one nesting level and return its report.
    pub fn validate_params(&self, schema: &Schema, params: &Params) -> ErrorReport {
        let mut report = ErrorReport::new();

        for field in schema.fields() {
            let value = params.get(field.name()).filter(|v| !v.is_null());
            self.check_field(field, value, &mut report);
        }

        self.enforce_allow_list(schema, params, &mut report);

        debug!(
            declared = schema.fields().len(),
            keys = params.len(),
            failed_fields = report.len(),
            "level validated"
        );
        report
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn check_field(&self, field: &FieldSpec, value: Option<&ParamValue>, report: &mut ErrorReport) {
        debug!(field = %field.name(), present = value.is_some(), "checking field");

        for rule in field.rules() {
            if let Some(error) = rule.apply(value) {
                warn!(
                    field = %field.name(),
                    rule = %rule.name(),
                    message = %error.message,
                    "rule failed"
                );
                report.add(field.name(), error);
            }
        }

        let Some(nested) = field.nested() else {
            return;
        };

        match value {
            Some(value) => self.validate_nested(field.name(), nested, value, report),
            // A presence rule has already reported the absence.
            None if nested.is_required() && !field.has_presence_rule() => {
                report.add(field.name(), FieldError::missing(MISSING_MESSAGE));
            }
            None => {}
        }
    }

    fn validate_nested(
        &self,
        field: &str,
        nested: &NestedSchema,
        value: &ParamValue,
        report: &mut ErrorReport,
    ) {
        match value {
            ParamValue::Map(params) => {
                report.add_nested(field, self.validate_params(nested.schema(), params));
            }
            ParamValue::Seq(items) => {
                let reports = items
                    .iter()
                    .map(|item| match item {
                        ParamValue::Map(params) => self.validate_params(nested.schema(), params),
                        _ => {
                            let mut element = ErrorReport::new();
                            element.add(BASE_KEY, FieldError::invalid("must be a mapping"));
                            element
                        }
                    })
                    .collect();
                report.add_sequence(field, reports);
            }
            _ => {
                report.add(
                    field,
                    FieldError::invalid("must be a mapping or a list of mappings"),
                );
            }
        }
    }

    fn enforce_allow_list(&self, schema: &Schema, params: &Params, report: &mut ErrorReport) {
        for key in params.keys() {
            if schema.is_allowed(key) || self.always_allowed.contains(key) {
                continue;
            }
            warn!(key = %key, "rejecting key outside the allow-list");
            report.add(key, FieldError::not_allowed());
        }
    }
}
