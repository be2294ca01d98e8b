//! # paramguard-core
//!
//! A recursive validator that rejects any input carrying keys its schema did
//! not declare.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Rule`]: single-field checks (presence, inclusion, exclusion, length,
//!   custom predicates)
//! - [`Schema`] and [`SchemaBuilder`]: the declared fields at one nesting
//!   level, with optional nested schemas and a statically computed allow-list
//! - [`Validator`]: runs every rule, recurses into nested values, and records
//!   every key outside the allow-list, returning a full
//!   [`ErrorReport`](paramguard_contracts::report::ErrorReport)
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use paramguard_core::{Rule, Schema, Validator};
//!
//! let tag = Schema::builder().field("value", [Rule::presence()]).build()?;
//! let post = Schema::builder()
//!     .field("title", [Rule::presence()])
//!     .nested("tags", tag)
//!     .build()?;
//!
//! let outcome = Validator::new().validate_json(&post, &payload);
//! if !outcome.valid {
//!     return Err(outcome.errors.flatten());
//! }
//! ```
//!
//! ## Allow-listing
//!
//! Each nesting level enforces its own allow-list.  A key permitted inside a
//! nested schema is not thereby permitted at its parent, and the reverse.

pub mod rule;
pub mod schema;
pub mod traits;
pub mod validator;

pub use rule::{LengthBounds, Rule, RuleKind};
pub use schema::{FieldSpec, NestedSchema, Schema, SchemaBuilder, BASE_KEY};
pub use traits::{CustomCheck, CustomCheckFn};
pub use validator::Validator;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use paramguard_contracts::report::{ErrorKind, ErrorReport};
    use paramguard_contracts::value::{ParamValue, Params};

    use crate::{LengthBounds, Rule, Schema, Validator, BASE_KEY};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// `{ title: [presence], tags: nested-list-of { value: [presence] } }`
    fn post_schema() -> Schema {
        let tag = Schema::builder()
            .field("value", [Rule::presence()])
            .build()
            .unwrap();
        Schema::builder()
            .field("title", [Rule::presence()])
            .nested("tags", tag)
            .build()
            .unwrap()
    }

    fn address_schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder()
                .field("street", [Rule::presence()])
                .field("zip", [Rule::length(LengthBounds::exactly(5))])
                .build()
                .unwrap(),
        )
    }

    // ── 1. end-to-end example ────────────────────────────────────────────────

    /// Nested list errors keep their element position and extra keys are
    /// rejected alongside them.
    #[test]
    fn test_nested_list_and_extra_key() {
        let outcome = Validator::new().validate_json(
            &post_schema(),
            &json!({ "title": "ok", "tags": [{ "value": "a" }, {}], "extra": 1 }),
        );

        assert!(!outcome.valid);
        assert_eq!(
            serde_json::to_value(&outcome.errors).unwrap(),
            json!({
                "tags": [ {}, { "value": ["missing"] } ],
                "extra": ["is not allowed"]
            })
        );
    }

    #[test]
    fn test_valid_input_passes() {
        let outcome = Validator::new().validate_json(
            &post_schema(),
            &json!({ "title": "ok", "tags": [{ "value": "a" }] }),
        );
        assert!(outcome.valid, "unexpected errors: {:?}", outcome.errors);
        assert!(outcome.errors.is_empty());
    }

    // ── 2. allow-list enforcement ────────────────────────────────────────────

    /// Every undeclared key gets its own entry, even when all declared fields
    /// are valid.
    #[test]
    fn test_every_extra_key_is_reported() {
        let outcome = Validator::new().validate_json(
            &post_schema(),
            &json!({ "title": "ok", "admin": true, "role": "owner" }),
        );

        assert!(!outcome.valid);
        assert_eq!(outcome.errors.messages("admin"), vec!["is not allowed"]);
        assert_eq!(outcome.errors.messages("role"), vec!["is not allowed"]);
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors.has_kind(ErrorKind::KeyNotAllowed));
    }

    /// Extra keys inside a nested mapping are rejected at that level.
    #[test]
    fn test_extra_key_in_nested_mapping() {
        let schema = Schema::builder()
            .nested("address", address_schema())
            .build()
            .unwrap();
        let outcome = Validator::new().validate_json(
            &schema,
            &json!({ "address": { "street": "Main", "zip": "12345", "owner_id": 7 } }),
        );

        assert!(!outcome.valid);
        let nested = outcome.errors.nested("address").unwrap();
        assert_eq!(nested.messages("owner_id"), vec!["is not allowed"]);
        assert!(
            outcome.errors.messages("address").is_empty(),
            "the nested key itself is allowed at the parent level"
        );
    }

    /// A permitted-only field is accepted with any value.
    #[test]
    fn test_permit_allows_without_checks() {
        let schema = Schema::builder().permit("page").build().unwrap();
        let outcome = Validator::new().validate_json(&schema, &json!({ "page": [1, 2] }));
        assert!(outcome.valid);
    }

    /// Seeded keys are accepted at every level without being declared.
    #[test]
    fn test_always_allowed_keys() {
        let schema = Schema::builder()
            .nested("address", address_schema())
            .build()
            .unwrap();
        let validator = Validator::new().with_always_allowed(["controller", "action", "format"]);

        let outcome = validator.validate_json(
            &schema,
            &json!({
                "controller": "posts",
                "action": "create",
                "address": { "street": "Main", "format": "json" }
            }),
        );
        assert!(outcome.valid, "unexpected errors: {:?}", outcome.errors);

        let strict = Validator::new().validate_json(&schema, &json!({ "controller": "posts" }));
        assert_eq!(strict.errors.messages("controller"), vec!["is not allowed"]);
    }

    /// Allow-lists are local: a name legal inside a nested schema is still
    /// rejected at the top level.
    #[test]
    fn test_allow_lists_do_not_leak_across_levels() {
        let profile = Schema::builder()
            .field("name", [Rule::presence()])
            .permit("name2")
            .build()
            .unwrap();
        let schema = Schema::builder()
            .field("name", [Rule::presence()])
            .nested("profile", profile)
            .build()
            .unwrap();

        let outcome = Validator::new().validate_json(
            &schema,
            &json!({ "name": "a", "name2": "b", "profile": { "name": "c", "name2": "d" } }),
        );

        assert!(!outcome.valid);
        assert_eq!(outcome.errors.messages("name2"), vec!["is not allowed"]);
        assert!(outcome.errors.nested("profile").is_none());
    }

    // ── 3. presence ──────────────────────────────────────────────────────────

    #[test]
    fn test_missing_required_field() {
        let outcome = Validator::new().validate_json(&post_schema(), &json!({}));
        assert!(!outcome.valid);
        assert_eq!(outcome.errors.messages("title"), vec!["missing"]);
        assert!(outcome.errors.has_kind(ErrorKind::FieldMissing));
    }

    /// Absent optional fields skip every non-presence rule and nesting.
    #[test]
    fn test_absent_optional_field_is_skipped() {
        let schema = Schema::builder()
            .field("status", [Rule::inclusion(["draft", "published"])])
            .nested("address", address_schema())
            .build()
            .unwrap();

        assert!(Validator::new().validate_json(&schema, &json!({})).valid);
        assert!(Validator::new()
            .validate_json(&schema, &json!({ "status": null, "address": null }))
            .valid);
    }

    #[test]
    fn test_required_nested_reports_missing_once() {
        let schema = Schema::builder()
            .nested_required("address", address_schema())
            .field("billing", [Rule::presence()])
            .nested_required("billing", address_schema())
            .build()
            .unwrap();

        let outcome = Validator::new().validate_json(&schema, &json!({}));
        assert_eq!(outcome.errors.messages("address"), vec!["missing"]);
        assert_eq!(outcome.errors.messages("billing"), vec!["missing"]);
    }

    #[test]
    fn test_null_top_level_input_is_an_empty_mapping() {
        let outcome = Validator::new().validate(&post_schema(), &ParamValue::Null);
        assert_eq!(outcome.errors.messages("title"), vec!["missing"]);
    }

    #[test]
    fn test_scalar_top_level_input_is_rejected() {
        let outcome = Validator::new().validate_json(&post_schema(), &json!("title=ok"));
        assert!(!outcome.valid);
        assert_eq!(outcome.errors.messages(BASE_KEY), vec!["must be a mapping"]);
    }

    // ── 4. nested shapes ─────────────────────────────────────────────────────

    /// One valid and one invalid element: the sequence has two slots, the
    /// first empty, the second naming the violation.
    #[test]
    fn test_sequence_keeps_element_positions() {
        let outcome = Validator::new().validate_json(
            &post_schema(),
            &json!({ "title": "t", "tags": [{ "value": "ok" }, { "value": "" }] }),
        );

        let elements = outcome.errors.sequence("tags").unwrap();
        assert_eq!(elements.len(), 2);
        assert!(elements[0].is_empty());
        assert_eq!(elements[1].messages("value"), vec!["missing"]);
    }

    #[test]
    fn test_non_mapping_elements_and_values() {
        let schema = post_schema();

        let outcome = Validator::new()
            .validate_json(&schema, &json!({ "title": "t", "tags": [{ "value": "a" }, "b"] }));
        let elements = outcome.errors.sequence("tags").unwrap();
        assert_eq!(elements[1].messages(BASE_KEY), vec!["must be a mapping"]);

        let outcome = Validator::new().validate_json(&schema, &json!({ "title": "t", "tags": "a,b" }));
        assert_eq!(
            outcome.errors.messages("tags"),
            vec!["must be a mapping or a list of mappings"]
        );
    }

    #[test]
    fn test_deeply_nested_errors_flatten_to_paths() {
        let line = Schema::builder()
            .field("sku", [Rule::presence()])
            .build()
            .unwrap();
        let order = Schema::builder()
            .nested("lines", line)
            .nested("ship_to", address_schema())
            .build()
            .unwrap();
        let schema = Schema::builder().nested("order", order).build().unwrap();

        let outcome = Validator::new().validate_json(
            &schema,
            &json!({
                "order": {
                    "lines": [{ "sku": "A1" }, { "sku": "A2", "price": 0 }],
                    "ship_to": { "street": "Main", "zip": "123" }
                }
            }),
        );

        let flat = outcome.errors.flatten();
        assert_eq!(flat["order.lines.1.price"], vec!["is not allowed"]);
        assert_eq!(
            flat["order.ship_to.zip"],
            vec!["is the wrong length (should be 5 characters)"]
        );
        assert_eq!(flat.len(), 2);
    }

    // ── 5. aggregation ───────────────────────────────────────────────────────

    /// All rules run; earlier failures never hide later ones.
    #[test]
    fn test_all_failures_are_collected() {
        let schema = Schema::builder()
            .field(
                "username",
                [
                    Rule::length(LengthBounds::at_least(3)),
                    Rule::exclusion(["ad"]),
                ],
            )
            .field("role", [Rule::inclusion(["reader", "writer"])])
            .build()
            .unwrap();

        let outcome = Validator::new().validate_json(
            &schema,
            &json!({ "username": "ad", "role": "admin", "is_admin": true }),
        );

        assert_eq!(
            outcome.errors.messages("username"),
            vec!["is too short (minimum is 3 characters)", "is reserved"]
        );
        assert_eq!(outcome.errors.messages("role"), vec!["is not included in the list"]);
        assert_eq!(outcome.errors.messages("is_admin"), vec!["is not allowed"]);
        assert_eq!(outcome.errors.error_count(), 4);
    }

    #[test]
    fn test_custom_rule_in_schema() {
        let schema = Schema::builder()
            .field(
                "email",
                [Rule::custom("email", |v: &ParamValue| {
                    match v.as_str() {
                        Some(s) if s.contains('@') => None,
                        _ => Some("is not an email address".to_string()),
                    }
                })],
            )
            .build()
            .unwrap();

        let outcome = Validator::new().validate_json(&schema, &json!({ "email": "nope" }));
        assert_eq!(outcome.errors.messages("email"), vec!["is not an email address"]);
        assert!(Validator::new()
            .validate_json(&schema, &json!({ "email": "a@b.c" }))
            .valid);
    }

    // ── 6. determinism ───────────────────────────────────────────────────────

    #[test]
    fn test_repeated_runs_are_identical() {
        let schema = post_schema();
        let validator = Validator::new();
        let input = json!({ "tags": [{}], "x": 1 });

        let first = validator.validate_json(&schema, &input);
        let second = validator.validate_json(&schema, &input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_key_order_does_not_change_outcome() {
        let schema = post_schema();
        let a: Params = [
            ("zz", ParamValue::from(1_i64)),
            ("title", ParamValue::from("")),
            ("aa", ParamValue::from(2_i64)),
        ]
        .into_iter()
        .collect();
        let b: Params = [
            ("aa", ParamValue::from(2_i64)),
            ("title", ParamValue::from("")),
            ("zz", ParamValue::from(1_i64)),
        ]
        .into_iter()
        .collect();

        let first = Validator::new().validate_params(&schema, &a);
        let second = Validator::new().validate_params(&schema, &b);
        assert_eq!(first, second);

        // Declared fields come first, then rejected keys in sorted order.
        let keys: Vec<&str> = first.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["title", "aa", "zz"]);
    }

    /// A shared validator and schema give the same answer on every thread.
    #[test]
    fn test_concurrent_runs_share_nothing() {
        let schema = &post_schema();
        let validator = &Validator::new();
        let inputs = [
            json!({ "title": "ok" }),
            json!({ "title": "ok", "bad": 1 }),
            json!({ "tags": [{}] }),
        ];

        let results: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = inputs
                .iter()
                .map(|input| scope.spawn(move || validator.validate_json(schema, input).valid))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results, vec![true, false, false]);
    }

    #[test]
    fn test_empty_report_for_empty_schema_and_input() {
        let schema = Schema::builder().build().unwrap();
        let outcome = Validator::new().validate_json(&schema, &json!({}));
        assert_eq!(outcome.errors, ErrorReport::new());
        assert!(outcome.valid);
    }
}
