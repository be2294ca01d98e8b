//! Schema file types.
//!
//! A `SchemaFile` is deserialized from TOML and holds named schema
//! definitions plus the always-allowed key list.  Nested fields either
//! reference another named schema or define their fields inline.

use serde::{Deserialize, Serialize};

use paramguard_contracts::value::ParamValue;

/// Keys accepted everywhere when a file does not set `always_allowed`.
pub const DEFAULT_ALWAYS_ALLOWED: [&str; 3] = ["controller", "action", "format"];

/// The top-level structure of a schema file.
///
/// Example:
/// ```toml
/// always_allowed = ["controller", "action", "format"]
///
/// [[schemas]]
/// name = "tag"
///
/// [[schemas.fields]]
/// name = "value"
/// rules = [{ kind = "presence" }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    /// Keys never rejected at any level.  Defaults to
    /// [`DEFAULT_ALWAYS_ALLOWED`] when omitted.
    pub always_allowed: Option<Vec<String>>,

    #[serde(default)]
    pub schemas: Vec<SchemaDefinition>,
}

/// A named schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDefinition {
    /// Name used by nested references and by callers.
    pub name: String,

    /// Free-form note for operators, printed by `paramguard describe`.
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// One declared field.  A field with no rules and no nested schema is simply
/// permitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub name: String,

    #[serde(default)]
    pub rules: Vec<RuleDefinition>,

    #[serde(default)]
    pub nested: Option<NestedDefinition>,
}

/// A nested schema, referenced by name or written inline.  Exactly one of
/// `schema` and `fields` must be given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NestedDefinition {
    /// Name of another schema in the same file.
    pub schema: Option<String>,

    /// Inline field list.
    pub fields: Option<Vec<FieldDefinition>>,

    /// Report the field as missing when absent.
    #[serde(default)]
    pub required: bool,
}

/// A rule, tagged by `kind` (kebab-case).
///
/// ```toml
/// rules = [
///   { kind = "presence" },
///   { kind = "inclusion", values = ["draft", "published"] },
///   { kind = "length", min = 1, max = 80, message = "must be 1-80 characters" },
///   { kind = "custom", check = "slug" },
/// ]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", deny_unknown_fields)]
pub enum RuleDefinition {
    Presence {
        message: Option<String>,
    },
    Inclusion {
        values: Vec<ParamValue>,
        message: Option<String>,
    },
    Exclusion {
        values: Vec<ParamValue>,
        message: Option<String>,
    },
    Length {
        min: Option<usize>,
        max: Option<usize>,
        /// Exact length; cannot be combined with `min` or `max`.
        is: Option<usize>,
        message: Option<String>,
    },
    Custom {
        /// Name the check was registered under.
        check: String,
        message: Option<String>,
    },
    /// Permit the field without checking it.
    Allowed,
}
