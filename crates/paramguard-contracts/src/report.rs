//! Error report types returned by a validation run.
//!
//! An `ErrorReport` maps field names to the ordered errors recorded for them.
//! Errors for nested fields are carried as sub-reports rather than flattened,
//! so callers can render them hierarchically; [`ErrorReport::flatten`] gives
//! the dotted-path view when a flat map is more convenient.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

/// The class of a single validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A declared rule failed for a present value.
    FieldInvalid,
    /// A required field was absent or blank.
    FieldMissing,
    /// A nested sub-validation produced its own errors.
    NestedInvalid,
    /// A key was present in the input but not allowed at its level.
    KeyNotAllowed,
}

/// A single message-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::FieldInvalid,
            message: message.into(),
        }
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::FieldMissing,
            message: message.into(),
        }
    }

    /// The fixed rejection recorded for a key outside the allow-list.
    pub fn not_allowed() -> Self {
        Self {
            kind: ErrorKind::KeyNotAllowed,
            message: "is not allowed".to_string(),
        }
    }
}

/// One error recorded under a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorEntry {
    /// A plain message from a rule or from allow-list enforcement.
    Message(FieldError),
    /// Errors from validating a nested mapping.
    Nested(ErrorReport),
    /// Errors from validating each element of a nested sequence.  One slot
    /// per input element; valid elements hold an empty report.
    Sequence(Vec<ErrorReport>),
}

impl ErrorEntry {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorEntry::Message(e) => e.kind,
            ErrorEntry::Nested(_) | ErrorEntry::Sequence(_) => ErrorKind::NestedInvalid,
        }
    }
}

/// Per-field errors for one nesting level, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    fields: Vec<(String, Vec<ErrorEntry>)>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field has any error.  Sub-reports are only ever attached
    /// when non-empty, so this holds at every depth.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with at least one error at this level.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Record a message-level error under `field`.
    pub fn add(&mut self, field: &str, error: FieldError) {
        self.entry_mut(field).push(ErrorEntry::Message(error));
    }

    /// Attach a nested report under `field` if it holds any errors.
    pub fn add_nested(&mut self, field: &str, report: ErrorReport) {
        if !report.is_empty() {
            self.entry_mut(field).push(ErrorEntry::Nested(report));
        }
    }

    /// Attach per-element reports under `field` if any element failed.
    pub fn add_sequence(&mut self, field: &str, reports: Vec<ErrorReport>) {
        if reports.iter().any(|r| !r.is_empty()) {
            self.entry_mut(field).push(ErrorEntry::Sequence(reports));
        }
    }

    /// All entries recorded under `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[ErrorEntry]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, entries)| entries.as_slice())
    }

    /// Iterate fields and their entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ErrorEntry])> {
        self.fields
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    /// The direct message strings under `field` (nested entries excluded).
    pub fn messages(&self, field: &str) -> Vec<&str> {
        self.get(field)
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| match entry {
                ErrorEntry::Message(e) => Some(e.message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The nested report under `field`, if one was attached.
    pub fn nested(&self, field: &str) -> Option<&ErrorReport> {
        self.get(field)?.iter().find_map(|entry| match entry {
            ErrorEntry::Nested(r) => Some(r),
            _ => None,
        })
    }

    /// The per-element reports under `field`, if a sequence was attached.
    pub fn sequence(&self, field: &str) -> Option<&[ErrorReport]> {
        self.get(field)?.iter().find_map(|entry| match entry {
            ErrorEntry::Sequence(rs) => Some(rs.as_slice()),
            _ => None,
        })
    }

    /// Total number of message-level errors at every depth.
    pub fn error_count(&self) -> usize {
        self.fields
            .iter()
            .flat_map(|(_, entries)| entries)
            .map(|entry| match entry {
                ErrorEntry::Message(_) => 1,
                ErrorEntry::Nested(r) => r.error_count(),
                ErrorEntry::Sequence(rs) => rs.iter().map(ErrorReport::error_count).sum(),
            })
            .sum()
    }

    /// True if a message of `kind` appears at any depth.
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.fields.iter().flat_map(|(_, entries)| entries).any(|entry| match entry {
            ErrorEntry::Message(e) => e.kind == kind,
            ErrorEntry::Nested(r) => kind == ErrorKind::NestedInvalid || r.has_kind(kind),
            ErrorEntry::Sequence(rs) => {
                kind == ErrorKind::NestedInvalid || rs.iter().any(|r| r.has_kind(kind))
            }
        })
    }

    /// Collapse the report into dotted paths (`address.zip`, `tags.1.value`)
    /// mapped to their messages.
    pub fn flatten(&self) -> BTreeMap<String, Vec<String>> {
        let mut out = BTreeMap::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut BTreeMap<String, Vec<String>>) {
        for (field, entries) in &self.fields {
            let path = if prefix.is_empty() {
                field.clone()
            } else {
                format!("{prefix}.{field}")
            };
            for entry in entries {
                match entry {
                    ErrorEntry::Message(e) => out
                        .entry(path.clone())
                        .or_insert_with(Vec::new)
                        .push(e.message.clone()),
                    ErrorEntry::Nested(r) => r.flatten_into(&path, out),
                    ErrorEntry::Sequence(rs) => {
                        for (index, r) in rs.iter().enumerate() {
                            r.flatten_into(&format!("{path}.{index}"), out);
                        }
                    }
                }
            }
        }
    }

    fn entry_mut(&mut self, field: &str) -> &mut Vec<ErrorEntry> {
        let index = match self.fields.iter().position(|(name, _)| name == field) {
            Some(index) => index,
            None => {
                self.fields.push((field.to_string(), Vec::new()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index].1
    }
}

// ── Serialization ─────────────────────────────────────────────────────────────
//
// A field holding exactly one nested entry serializes as that entry directly
// (`{"tags": [{}, {"value": ["missing"]}]}`); anything else serializes as a
// list of strings and nested values.

impl Serialize for ErrorReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, entries) in &self.fields {
            match entries.as_slice() {
                [entry @ (ErrorEntry::Nested(_) | ErrorEntry::Sequence(_))] => {
                    map.serialize_entry(field, entry)?;
                }
                _ => map.serialize_entry(field, &EntryList(entries))?,
            }
        }
        map.end()
    }
}

impl Serialize for ErrorEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ErrorEntry::Message(e) => serializer.serialize_str(&e.message),
            ErrorEntry::Nested(r) => r.serialize(serializer),
            ErrorEntry::Sequence(rs) => {
                let mut seq = serializer.serialize_seq(Some(rs.len()))?;
                for r in rs {
                    seq.serialize_element(r)?;
                }
                seq.end()
            }
        }
    }
}

struct EntryList<'a>(&'a [ErrorEntry]);

impl Serialize for EntryList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for entry in self.0 {
            seq.serialize_element(entry)?;
        }
        seq.end()
    }
}

/// The outcome of validating one input against one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    /// True only if `errors` is empty.
    pub valid: bool,
    /// Every failure found during the run.
    pub errors: ErrorReport,
}

impl Validation {
    pub fn from_report(errors: ErrorReport) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}
