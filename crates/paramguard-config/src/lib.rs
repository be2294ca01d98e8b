//! # paramguard-config
//!
//! Declarative, TOML-driven schema definitions for paramguard.
//!
//! ## Overview
//!
//! [`SchemaSet`] loads a file of named schemas and compiles each into a
//! [`paramguard_core::Schema`].  Nested fields may reference another named
//! schema or define their fields inline.  References are resolved at load
//! time, so unknown names and reference cycles are configuration errors, not
//! validation-time surprises.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use paramguard_config::SchemaSet;
//!
//! let set = SchemaSet::from_file(Path::new("schemas/blog.toml"))?;
//! let outcome = set.validator().validate_json(set.schema("post")?, &payload);
//! ```
//!
//! ## Custom checks
//!
//! Rules of kind `custom` name a function registered in a [`CheckRegistry`]
//! and passed to [`SchemaSet::from_toml_str_with_checks`].

pub mod definition;
pub mod loader;
pub mod registry;

pub use definition::{RuleDefinition, SchemaFile, DEFAULT_ALWAYS_ALLOWED};
pub use loader::SchemaSet;
pub use registry::CheckRegistry;

// ── Tests ─────────────────────────────────────────────────────────────────────
