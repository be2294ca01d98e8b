//! Compiles schema files into core `Schema`s.
//!
//! `SchemaSet` loads a `SchemaFile` from a TOML string or file and resolves
//! every named schema up front.  All configuration problems surface here, at
//! load time:
//!
//! 1. TOML that does not parse or does not match `SchemaFile`.
//! 2. Duplicate or empty schema names.
//! 3. Nested references to undefined schemas, and reference cycles
//!    (`a -> b -> a`).
//! 4. Rules with bad parameters, and custom rules naming unregistered checks.
//!
//! A loaded set never fails during validation.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use paramguard_contracts::error::{ParamGuardError, ParamGuardResult};
use paramguard_core::{LengthBounds, NestedSchema, Rule, Schema, Validator};

use crate::definition::{
    FieldDefinition, NestedDefinition, RuleDefinition, SchemaDefinition, SchemaFile,
    DEFAULT_ALWAYS_ALLOWED,
};
use crate::registry::CheckRegistry;

/// Named, fully resolved schemas plus the always-allowed key list.
///
/// ```rust,ignore
/// use paramguard_config::SchemaSet;
///
/// let set = SchemaSet::from_file(Path::new("schemas/blog.toml"))?;
/// let outcome = set.validator().validate_json(set.schema("post")?, &payload);
/// ```
#[derive(Debug, Clone)]
pub struct SchemaSet {
    schemas: BTreeMap<String, Arc<Schema>>,
    descriptions: BTreeMap<String, String>,
    always_allowed: Vec<String>,
}

impl SchemaSet {
    /// Parse `s` as a schema file with no custom checks available.
    pub fn from_toml_str(s: &str) -> ParamGuardResult<Self> {
        Self::from_toml_str_with_checks(s, &CheckRegistry::new())
    }

    /// Parse `s` as a schema file, resolving custom rules against `checks`.
    pub fn from_toml_str_with_checks(s: &str, checks: &CheckRegistry) -> ParamGuardResult<Self> {
        let file: SchemaFile = toml::from_str(s).map_err(|e| ParamGuardError::ConfigError {
            reason: format!("failed to parse schema TOML: {}", e),
        })?;
        Self::from_definition(&file, checks)
    }

    /// Read the file at `path` and parse it as a schema file.
    pub fn from_file(path: &Path) -> ParamGuardResult<Self> {
        Self::from_file_with_checks(path, &CheckRegistry::new())
    }

    pub fn from_file_with_checks(path: &Path, checks: &CheckRegistry) -> ParamGuardResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ParamGuardError::ConfigError {
            reason: format!("failed to read schema file '{}': {}", path.display(), e),
        })?;
        let set = Self::from_toml_str_with_checks(&contents, checks)?;
        info!(path = %path.display(), schemas = set.schemas.len(), "schema file loaded");
        Ok(set)
    }

    /// Compile an already-deserialized schema file.
    pub fn from_definition(file: &SchemaFile, checks: &CheckRegistry) -> ParamGuardResult<Self> {
        let mut definitions: HashMap<&str, &SchemaDefinition> = HashMap::new();
        for definition in &file.schemas {
            if definition.name.trim().is_empty() {
                return Err(ParamGuardError::ConfigError {
                    reason: "schema name must not be empty".to_string(),
                });
            }
            if definitions.insert(&definition.name, definition).is_some() {
                return Err(ParamGuardError::ConfigError {
                    reason: format!("schema '{}' is defined more than once", definition.name),
                });
            }
        }

        let mut compiler = Compiler {
            definitions,
            checks,
            compiled: HashMap::new(),
            stack: Vec::new(),
        };
        let mut schemas = BTreeMap::new();
        let mut descriptions = BTreeMap::new();
        for definition in &file.schemas {
            let schema = compiler.compile_named(&definition.name)?;
            schemas.insert(definition.name.clone(), schema);
            if let Some(description) = &definition.description {
                descriptions.insert(definition.name.clone(), description.clone());
            }
        }

        let always_allowed = match &file.always_allowed {
            Some(keys) => keys.clone(),
            None => DEFAULT_ALWAYS_ALLOWED.iter().map(|k| k.to_string()).collect(),
        };

        debug!(
            schemas = schemas.len(),
            always_allowed = ?always_allowed,
            "schema set compiled"
        );
        Ok(Self {
            schemas,
            descriptions,
            always_allowed,
        })
    }

    /// Look up a schema by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    /// Look up a schema by name, failing with `UnknownSchema`.
    pub fn schema(&self, name: &str) -> ParamGuardResult<&Schema> {
        self.schemas
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| ParamGuardError::UnknownSchema {
                name: name.to_string(),
            })
    }

    /// The `description` given for `name` in the schema file, if any.
    pub fn description(&self, name: &str) -> Option<&str> {
        self.descriptions.get(name).map(String::as_str)
    }

    /// Schema names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn always_allowed(&self) -> &[String] {
        &self.always_allowed
    }

    /// A validator seeded with this file's always-allowed keys.
    pub fn validator(&self) -> Validator {
        Validator::new().with_always_allowed(self.always_allowed.iter().cloned())
    }
}

// ── Compilation ───────────────────────────────────────────────────────────────

struct Compiler<'a> {
    definitions: HashMap<&'a str, &'a SchemaDefinition>,
    checks: &'a CheckRegistry,
    compiled: HashMap<String, Arc<Schema>>,
    /// Names currently being compiled, outermost first.
    stack: Vec<String>,
}

impl<'a> Compiler<'a> {
    fn compile_named(&mut self, name: &str) -> ParamGuardResult<Arc<Schema>> {
        if let Some(schema) = self.compiled.get(name) {
            return Ok(Arc::clone(schema));
        }

        if let Some(start) = self.stack.iter().position(|n| n == name) {
            let mut path: Vec<&str> = self.stack[start..].iter().map(String::as_str).collect();
            path.push(name);
            return Err(ParamGuardError::CyclicSchema {
                path: path.join(" -> "),
            });
        }

        let definition = *self
            .definitions
            .get(name)
            .ok_or_else(|| ParamGuardError::UnknownSchema {
                name: name.to_string(),
            })?;

        self.stack.push(name.to_string());
        let schema = Arc::new(self.compile_fields(&definition.fields)?);
        self.stack.pop();

        debug!(schema = %name, fields = schema.fields().len(), "schema compiled");
        self.compiled.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn compile_fields(&mut self, fields: &'a [FieldDefinition]) -> ParamGuardResult<Schema> {
        let mut builder = Schema::builder();

        for field in fields {
            let mut rules = Vec::with_capacity(field.rules.len());
            for rule in &field.rules {
                if let Some(rule) = self.compile_rule(&field.name, rule)? {
                    rules.push(rule);
                }
            }
            builder = builder.field(field.name.clone(), rules);

            if let Some(nested) = &field.nested {
                let nested = self.compile_nested(&field.name, nested)?;
                builder = builder.nested_with(field.name.clone(), nested);
            }
        }

        builder.build()
    }

    fn compile_nested(
        &mut self,
        field: &str,
        nested: &'a NestedDefinition,
    ) -> ParamGuardResult<NestedSchema> {
        let schema = match (&nested.schema, &nested.fields) {
            (Some(name), None) => self.compile_named(name)?,
            (None, Some(fields)) => Arc::new(self.compile_fields(fields)?),
            _ => {
                return Err(ParamGuardError::ConfigError {
                    reason: format!(
                        "nested field '{field}' needs exactly one of `schema` or `fields`"
                    ),
                })
            }
        };

        let nested_schema = NestedSchema::new(schema);
        Ok(if nested.required {
            nested_schema.required()
        } else {
            nested_schema
        })
    }

    /// `Allowed` compiles to no rule: declaring the field is enough.
    fn compile_rule(&self, field: &str, rule: &RuleDefinition) -> ParamGuardResult<Option<Rule>> {
        let (rule, message) = match rule {
            RuleDefinition::Presence { message } => (Rule::presence(), message),
            RuleDefinition::Inclusion { values, message } => {
                (Rule::inclusion(values.iter().cloned()), message)
            }
            RuleDefinition::Exclusion { values, message } => {
                (Rule::exclusion(values.iter().cloned()), message)
            }
            RuleDefinition::Length {
                min,
                max,
                is,
                message,
            } => {
                let bounds = match (is, min, max) {
                    (Some(len), None, None) => LengthBounds::exactly(*len),
                    (Some(_), _, _) => {
                        return Err(ParamGuardError::InvalidRule {
                            field: field.to_string(),
                            reason: "length `is` cannot be combined with `min` or `max`"
                                .to_string(),
                        })
                    }
                    (None, min, max) => LengthBounds {
                        min: *min,
                        max: *max,
                    },
                };
                (Rule::length(bounds), message)
            }
            RuleDefinition::Custom { check, message } => {
                let function = self.checks.get(check).ok_or_else(|| {
                    ParamGuardError::UnknownCustomCheck {
                        name: check.clone(),
                    }
                })?;
                (Rule::custom_shared(check.clone(), function), message)
            }
            RuleDefinition::Allowed => return Ok(None),
        };

        Ok(Some(match message {
            Some(message) => rule.with_message(message.clone()),
            None => rule,
        }))
    }
}
