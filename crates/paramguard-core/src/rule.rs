//! Single-field validation rules.
//!
//! A `Rule` inspects one field's value and yields at most one `FieldError`.
//! Declaring any rule for a field also puts that field on its schema's
//! allow-list; see [`crate::schema`].
//!
//! Only `Presence` looks at absent values.  Every other kind is skipped when
//! the field is missing or null, so absence is an error only where presence
//! is required.

use std::fmt;
use std::sync::Arc;

use paramguard_contracts::{
    error::{ParamGuardError, ParamGuardResult},
    report::FieldError,
    value::ParamValue,
};

use crate::traits::{CustomCheck, CustomCheckFn};

/// Default message for a missing or blank required field.
pub const MISSING_MESSAGE: &str = "missing";

/// Inclusive size bounds for a length rule.  `min == max` means an exact
/// length is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LengthBounds {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl LengthBounds {
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn exactly(len: usize) -> Self {
        Self::between(len, len)
    }

    fn violation(&self, len: usize) -> Option<String> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max && len != min => Some(format!(
                "is the wrong length (should be {min} characters)"
            )),
            (Some(min), _) if len < min => {
                Some(format!("is too short (minimum is {min} characters)"))
            }
            (_, Some(max)) if len > max => {
                Some(format!("is too long (maximum is {max} characters)"))
            }
            _ => None,
        }
    }
}

/// The check a rule performs.
#[derive(Clone)]
pub enum RuleKind {
    /// The value must be present and not blank.
    Presence,
    /// The value must be one of `members`.  A sequence value passes only if
    /// every element is a member.
    Inclusion { members: Vec<ParamValue> },
    /// The value must not be one of `members`.  A sequence value fails if any
    /// element is a member.
    Exclusion { members: Vec<ParamValue> },
    /// The value's [`length`](ParamValue::length) must fall within bounds.
    Length(LengthBounds),
    /// Delegate to a named caller-supplied predicate.
    Custom { name: String, check: CustomCheckFn },
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Presence => f.write_str("Presence"),
            RuleKind::Inclusion { members } => {
                f.debug_struct("Inclusion").field("members", members).finish()
            }
            RuleKind::Exclusion { members } => {
                f.debug_struct("Exclusion").field("members", members).finish()
            }
            RuleKind::Length(bounds) => f.debug_tuple("Length").field(bounds).finish(),
            RuleKind::Custom { name, .. } => {
                f.debug_struct("Custom").field("name", name).finish_non_exhaustive()
            }
        }
    }
}

/// A rule kind plus an optional message override.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    message: Option<String>,
}

impl Rule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn presence() -> Self {
        Self::new(RuleKind::Presence)
    }

    pub fn inclusion<I, V>(members: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        Self::new(RuleKind::Inclusion {
            members: members.into_iter().map(Into::into).collect(),
        })
    }

    pub fn exclusion<I, V>(members: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        Self::new(RuleKind::Exclusion {
            members: members.into_iter().map(Into::into).collect(),
        })
    }

    pub fn length(bounds: LengthBounds) -> Self {
        Self::new(RuleKind::Length(bounds))
    }

    /// Wrap a predicate as a named custom rule.
    pub fn custom(name: impl Into<String>, check: impl CustomCheck + 'static) -> Self {
        Self::new(RuleKind::Custom {
            name: name.into(),
            check: Arc::new(check),
        })
    }

    /// Use an already-shared check, e.g. one held by a registry.
    pub fn custom_shared(name: impl Into<String>, check: CustomCheckFn) -> Self {
        Self::new(RuleKind::Custom {
            name: name.into(),
            check,
        })
    }

    /// Replace the default failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_presence(&self) -> bool {
        matches!(self.kind, RuleKind::Presence)
    }

    /// Short name used in logs.
    pub fn name(&self) -> &str {
        match &self.kind {
            RuleKind::Presence => "presence",
            RuleKind::Inclusion { .. } => "inclusion",
            RuleKind::Exclusion { .. } => "exclusion",
            RuleKind::Length(_) => "length",
            RuleKind::Custom { name, .. } => name,
        }
    }

    /// Reject rules whose parameters cannot produce a meaningful check.
    pub(crate) fn check_definition(&self, field: &str) -> ParamGuardResult<()> {
        let invalid = |reason: &str| {
            Err(ParamGuardError::InvalidRule {
                field: field.to_string(),
                reason: reason.to_string(),
            })
        };

        match &self.kind {
            RuleKind::Presence => Ok(()),
            RuleKind::Inclusion { members } if members.is_empty() => {
                invalid("inclusion rule needs at least one permitted value")
            }
            RuleKind::Exclusion { members } if members.is_empty() => {
                invalid("exclusion rule needs at least one reserved value")
            }
            RuleKind::Inclusion { .. } | RuleKind::Exclusion { .. } => Ok(()),
            RuleKind::Length(LengthBounds {
                min: None,
                max: None,
            }) => invalid("length rule needs a minimum, a maximum, or both"),
            RuleKind::Length(LengthBounds {
                min: Some(min),
                max: Some(max),
            }) if min > max => invalid(&format!(
                "length minimum {min} exceeds maximum {max}"
            )),
            RuleKind::Length(_) => Ok(()),
            RuleKind::Custom { name, .. } if name.trim().is_empty() => {
                invalid("custom rule needs a non-empty check name")
            }
            RuleKind::Custom { .. } => Ok(()),
        }
    }

    /// Run the rule against a field value; `None` means absent or null.
    pub fn apply(&self, value: Option<&ParamValue>) -> Option<FieldError> {
        let failure = match (&self.kind, value) {
            (RuleKind::Presence, None) => {
                return Some(FieldError::missing(self.text(MISSING_MESSAGE)));
            }
            (RuleKind::Presence, Some(v)) => {
                return v
                    .is_blank()
                    .then(|| FieldError::missing(self.text(MISSING_MESSAGE)));
            }
            (_, None) => return None,

            (RuleKind::Inclusion { members }, Some(v)) => {
                let included = match v {
                    ParamValue::Seq(items) => items.iter().all(|i| members.contains(i)),
                    other => members.contains(other),
                };
                (!included).then(|| "is not included in the list".to_string())
            }
            (RuleKind::Exclusion { members }, Some(v)) => {
                let excluded = match v {
                    ParamValue::Seq(items) => items.iter().any(|i| members.contains(i)),
                    other => members.contains(other),
                };
                excluded.then(|| "is reserved".to_string())
            }
            (RuleKind::Length(bounds), Some(v)) => bounds.violation(v.length()),
            (RuleKind::Custom { check, .. }, Some(v)) => check.check(v),
        };

        failure.map(|default| FieldError::invalid(self.message.clone().unwrap_or(default)))
    }

    fn text(&self, default: &str) -> String {
        self.message.clone().unwrap_or_else(|| default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use paramguard_contracts::report::ErrorKind;
    use serde_json::json;

    use super::*;

    fn v(value: serde_json::Value) -> ParamValue {
        ParamValue::from(value)
    }

    fn message(rule: &Rule, value: serde_json::Value) -> Option<String> {
        rule.apply(Some(&v(value))).map(|e| e.message)
    }

    // ── Presence ─────────────────────────────────────────────────────────────

    #[test]
    fn presence_reports_absent_and_blank_as_missing() {
        let rule = Rule::presence();

        let absent = rule.apply(None).unwrap();
        assert_eq!(absent.kind, ErrorKind::FieldMissing);
        assert_eq!(absent.message, "missing");

        assert_eq!(message(&rule, json!("  ")), Some("missing".to_string()));
        assert_eq!(message(&rule, json!([])), Some("missing".to_string()));
        assert_eq!(message(&rule, json!("ok")), None);
    }

    #[test]
    fn message_override_applies() {
        let rule = Rule::presence().with_message("is required");
        assert_eq!(rule.apply(None).unwrap().message, "is required");

        let rule = Rule::inclusion(["a"]).with_message("must be a");
        assert_eq!(message(&rule, json!("b")), Some("must be a".to_string()));
    }

    // ── Non-presence rules skip absent values ────────────────────────────────

    #[test]
    fn other_rules_skip_absent_values() {
        assert!(Rule::inclusion(["a"]).apply(None).is_none());
        assert!(Rule::exclusion(["a"]).apply(None).is_none());
        assert!(Rule::length(LengthBounds::at_least(3)).apply(None).is_none());
        assert!(Rule::custom("never", |_: &ParamValue| Some("no".to_string()))
            .apply(None)
            .is_none());
    }

    // ── Inclusion / Exclusion ────────────────────────────────────────────────

    #[test]
    fn inclusion_checks_membership() {
        let rule = Rule::inclusion(["draft", "published"]);
        assert_eq!(message(&rule, json!("draft")), None);

        let err = rule.apply(Some(&v(json!("deleted")))).unwrap();
        assert_eq!(err.kind, ErrorKind::FieldInvalid);
        assert_eq!(err.message, "is not included in the list");
    }

    #[test]
    fn inclusion_requires_every_sequence_element() {
        let rule = Rule::inclusion(["red", "green", "blue"]);
        assert_eq!(message(&rule, json!(["red", "blue"])), None);
        assert!(message(&rule, json!(["red", "pink"])).is_some());
    }

    #[test]
    fn inclusion_is_type_strict() {
        let rule = Rule::inclusion([1i64, 2]);
        assert_eq!(message(&rule, json!(1)), None);
        assert!(message(&rule, json!("1")).is_some());
    }

    #[test]
    fn exclusion_rejects_reserved_values() {
        let rule = Rule::exclusion(["admin", "root"]);
        assert_eq!(message(&rule, json!("alice")), None);
        assert_eq!(message(&rule, json!("admin")), Some("is reserved".to_string()));
        assert_eq!(message(&rule, json!(["alice", "root"])), Some("is reserved".to_string()));
    }

    // ── Length ───────────────────────────────────────────────────────────────

    #[test]
    fn length_bounds_messages() {
        let rule = Rule::length(LengthBounds::between(2, 4));
        assert_eq!(
            message(&rule, json!("a")),
            Some("is too short (minimum is 2 characters)".to_string())
        );
        assert_eq!(
            message(&rule, json!("abcde")),
            Some("is too long (maximum is 4 characters)".to_string())
        );
        assert_eq!(message(&rule, json!("abc")), None);

        let exact = Rule::length(LengthBounds::exactly(5));
        assert_eq!(
            message(&exact, json!("1234")),
            Some("is the wrong length (should be 5 characters)".to_string())
        );
        assert_eq!(message(&exact, json!(12345)), None);
    }

    #[test]
    fn length_counts_sequence_elements() {
        let rule = Rule::length(LengthBounds::at_most(2));
        assert!(message(&rule, json!([1, 2, 3])).is_some());
        assert_eq!(message(&rule, json!([1, 2])), None);
    }

    // ── Custom ───────────────────────────────────────────────────────────────

    #[test]
    fn custom_rule_uses_predicate_message() {
        let rule = Rule::custom("even", |value: &ParamValue| match value {
            ParamValue::Number(n) if n.as_i64().is_some_and(|n| n % 2 == 0) => None,
            _ => Some("must be an even number".to_string()),
        });

        assert_eq!(message(&rule, json!(4)), None);
        assert_eq!(message(&rule, json!(3)), Some("must be an even number".to_string()));
        assert_eq!(rule.name(), "even");
    }

    // ── Definition checks ────────────────────────────────────────────────────

    #[test]
    fn malformed_definitions_are_rejected() {
        let empty: [&str; 0] = [];
        assert!(Rule::inclusion(empty).check_definition("f").is_err());
        assert!(Rule::exclusion(empty).check_definition("f").is_err());
        assert!(Rule::length(LengthBounds::default()).check_definition("f").is_err());
        assert!(Rule::length(LengthBounds::between(5, 2)).check_definition("f").is_err());
        assert!(Rule::custom(" ", |_: &ParamValue| None).check_definition("f").is_err());

        assert!(Rule::presence().check_definition("f").is_ok());
        assert!(Rule::length(LengthBounds::exactly(3)).check_definition("f").is_ok());
    }

    #[test]
    fn definition_error_names_the_field() {
        match Rule::length(LengthBounds::between(9, 1)).check_definition("zip") {
            Err(ParamGuardError::InvalidRule { field, reason }) => {
                assert_eq!(field, "zip");
                assert!(reason.contains("exceeds"), "unexpected reason: {reason}");
            }
            other => panic!("expected InvalidRule, got {:?}", other),
        }
    }
}
