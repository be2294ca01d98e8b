//! Declarative schema model.
//!
//! A `Schema` lists the fields permitted at one nesting level, the rules each
//! field must satisfy, and optionally a nested `Schema` for fields whose value
//! is itself a mapping or a list of mappings.
//!
//! The allow-list is computed once, when the schema is built: every declared
//! field is permitted, whether it carries rules, a nested schema, or was only
//! [`permit`](SchemaBuilder::permit)ted.  Validation never grows it.
//!
//! Schemas are immutable after [`SchemaBuilder::build`] and are shared by
//! `Arc`, so a nested schema must exist before its parent is built.  Self
//! reference is therefore impossible through this API; named references in
//! schema files are resolved (and cycles rejected) by `paramguard-config`.

use std::collections::BTreeSet;
use std::sync::Arc;

use paramguard_contracts::error::{ParamGuardError, ParamGuardResult};

use crate::rule::Rule;

/// Key used for errors that concern a whole mapping rather than one field.
/// Reserved: a schema cannot declare a field with this name.
pub const BASE_KEY: &str = "base";

/// The sub-schema applied to a nested field.
#[derive(Debug, Clone)]
pub struct NestedSchema {
    schema: Arc<Schema>,
    required: bool,
}

impl NestedSchema {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            required: false,
        }
    }

    /// An absent value is reported as missing instead of skipped.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// One declared field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    rules: Vec<Rule>,
    nested: Option<NestedSchema>,
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn nested(&self) -> Option<&NestedSchema> {
        self.nested.as_ref()
    }

    /// True when absence of this field is an error.
    pub fn is_required(&self) -> bool {
        self.has_presence_rule() || self.nested.as_ref().is_some_and(NestedSchema::is_required)
    }

    pub(crate) fn has_presence_rule(&self) -> bool {
        self.rules.iter().any(Rule::is_presence)
    }
}

/// An immutable set of field declarations for one nesting level.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    allowed: BTreeSet<String>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Every key permitted at this level, independent of any input.
    pub fn allowed_keys(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    pub fn is_allowed(&self, key: &str) -> bool {
        self.allowed.contains(key)
    }
}

/// Collects field declarations and checks them when [`build`](Self::build)
/// is called.
///
/// Declaring the same field more than once merges the declarations: rules
/// accumulate in order.  A field may receive at most one nested schema.
///
/// ```rust,ignore
/// let tag = Schema::builder().field("value", [Rule::presence()]).build()?;
/// let post = Schema::builder()
///     .field("title", [Rule::presence(), Rule::length(LengthBounds::at_most(80))])
///     .nested("tags", tag)
///     .permit("page")
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
    duplicate_nested: Vec<String>,
}

impl SchemaBuilder {
    /// Declare `name` with the given rules.
    pub fn field(mut self, name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.entry(name.into()).rules.extend(rules);
        self
    }

    /// Declare `name` as allowed without any check.
    pub fn permit(mut self, name: impl Into<String>) -> Self {
        self.entry(name.into());
        self
    }

    /// Declare `name` as an optional nested field.
    pub fn nested(self, name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        self.nested_with(name, NestedSchema::new(schema))
    }

    /// Declare `name` as a nested field that must be present.
    pub fn nested_required(self, name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        self.nested_with(name, NestedSchema::new(schema).required())
    }

    pub fn nested_with(mut self, name: impl Into<String>, nested: NestedSchema) -> Self {
        let name = name.into();
        if self.fields.iter().any(|f| f.name == name && f.nested.is_some()) {
            self.duplicate_nested.push(name);
        } else {
            self.entry(name).nested = Some(nested);
        }
        self
    }

    /// Validate every declaration and freeze the schema.
    pub fn build(self) -> ParamGuardResult<Schema> {
        if let Some(field) = self.duplicate_nested.into_iter().next() {
            return Err(ParamGuardError::DuplicateNested { field });
        }

        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ParamGuardError::InvalidRule {
                    field: field.name.clone(),
                    reason: "field name must not be empty".to_string(),
                });
            }
            if field.name == BASE_KEY {
                return Err(ParamGuardError::InvalidRule {
                    field: field.name.clone(),
                    reason: format!("'{BASE_KEY}' is reserved for whole-mapping errors"),
                });
            }
            for rule in &field.rules {
                rule.check_definition(&field.name)?;
            }
        }

        let allowed = self.fields.iter().map(|f| f.name.clone()).collect();
        Ok(Schema {
            fields: self.fields,
            allowed,
        })
    }

    fn entry(&mut self, name: String) -> &mut FieldSpec {
        let index = match self.fields.iter().position(|f| f.name == name) {
            Some(index) => index,
            None => {
                self.fields.push(FieldSpec {
                    name,
                    rules: Vec::new(),
                    nested: None,
                });
                self.fields.len() - 1
            }
        };
        &mut self.fields[index]
    }
}
