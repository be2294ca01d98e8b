//! paramguard — validate request documents against declared schemas.
//!
//! Usage:
//!   paramguard check --schemas schemas/blog.toml --schema post --input req.json
//!   echo '{"title": "Hi"}' | paramguard check --schemas schemas/blog.toml --schema post --flat
//!   paramguard describe --schemas schemas/blog.toml --schema signup
//!
//! Exit codes: 0 valid, 1 invalid, 2 configuration or input error.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use paramguard_config::SchemaSet;
use paramguard_contracts::error::{ParamGuardError, ParamGuardResult};
use paramguard_core::{RuleKind, Schema};

// ── CLI definition ────────────────────────────────────────────────────────────

/// paramguard — allow-list validation for untrusted request data.
#[derive(Parser)]
#[command(
    name = "paramguard",
    about = "Validate JSON documents against paramguard schema files",
    long_about = "Validates decoded request data against a named schema, reporting every\n\
                  rule failure and every key outside the schema's allow-list."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a JSON document against one schema.
    Check {
        /// TOML schema file.
        #[arg(long)]
        schemas: PathBuf,
        /// Name of the schema to apply.
        #[arg(long)]
        schema: String,
        /// JSON document to validate; reads stdin when omitted.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Print errors as dotted paths instead of the nested report.
        #[arg(long)]
        flat: bool,
    },
    /// Print a schema's fields and allow-list at every nesting level.
    Describe {
        /// TOML schema file.
        #[arg(long)]
        schemas: PathBuf,
        /// Name of the schema to describe.
        #[arg(long)]
        schema: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Set RUST_LOG=debug for per-field output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check {
            schemas,
            schema,
            input,
            flat,
        } => read_document(input.as_deref())
            .and_then(|document| run_check(&schemas, &schema, &document, flat))
            .map(|(valid, rendered)| {
                println!("{rendered}");
                valid
            }),
        Command::Describe { schemas, schema } => {
            run_describe(&schemas, &schema).map(|lines| {
                println!("{}", lines.join("\n"));
                true
            })
        }
    };

    if let Err(e) = &result {
        eprintln!("paramguard: {}", e);
    }
    ExitCode::from(exit_code(&result))
}

/// 0 valid, 1 invalid, 2 configuration or input error.
fn exit_code(result: &ParamGuardResult<bool>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Validate `document` and render the outcome, nested or flattened.
fn run_check(
    schemas: &Path,
    name: &str,
    document: &serde_json::Value,
    flat: bool,
) -> ParamGuardResult<(bool, String)> {
    let set = SchemaSet::from_file(schemas)?;
    let schema = set.schema(name)?;

    let outcome = set.validator().validate_json(schema, document);
    debug!(schema = %name, valid = outcome.valid, "document checked");

    let rendered = if flat {
        serde_json::to_string_pretty(&outcome.errors.flatten())
    } else {
        serde_json::to_string_pretty(&outcome)
    }
    .map_err(|e| ParamGuardError::InputError {
        reason: format!("failed to render report: {}", e),
    })?;

    Ok((outcome.valid, rendered))
}

fn run_describe(schemas: &Path, name: &str) -> ParamGuardResult<Vec<String>> {
    let set = SchemaSet::from_file(schemas)?;
    let schema = set.schema(name)?;

    let mut lines = vec![format!("schema '{name}'")];
    if let Some(description) = set.description(name) {
        lines.push(format!("  {description}"));
    }
    if !set.always_allowed().is_empty() {
        lines.push(format!("always allowed: {}", set.always_allowed().join(", ")));
    }
    describe_level(schema, 1, &mut lines);
    Ok(lines)
}

fn describe_level(schema: &Schema, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let allowed: Vec<&str> = schema.allowed_keys().iter().map(String::as_str).collect();
    lines.push(format!("{indent}allowed: [{}]", allowed.join(", ")));

    for field in schema.fields() {
        let mut parts: Vec<String> = field.rules().iter().map(describe_rule).collect();
        if let Some(nested) = field.nested() {
            parts.push(if nested.is_required() {
                "nested (required)".to_string()
            } else {
                "nested".to_string()
            });
        }
        if parts.is_empty() {
            parts.push("permitted".to_string());
        }
        lines.push(format!("{indent}- {}: {}", field.name(), parts.join(", ")));

        if let Some(nested) = field.nested() {
            describe_level(nested.schema(), depth + 1, lines);
        }
    }
}

fn describe_rule(rule: &paramguard_core::Rule) -> String {
    match rule.kind() {
        RuleKind::Presence => "presence".to_string(),
        RuleKind::Inclusion { members } => format!("inclusion {}", render_members(members)),
        RuleKind::Exclusion { members } => format!("exclusion {}", render_members(members)),
        RuleKind::Length(bounds) => match (bounds.min, bounds.max) {
            (Some(min), Some(max)) if min == max => format!("length = {min}"),
            (Some(min), Some(max)) => format!("length {min}..={max}"),
            (Some(min), None) => format!("length >= {min}"),
            (None, Some(max)) => format!("length <= {max}"),
            (None, None) => "length".to_string(),
        },
        RuleKind::Custom { name, .. } => format!("custom '{name}'"),
    }
}

fn render_members(members: &[paramguard_contracts::value::ParamValue]) -> String {
    let rendered: Vec<String> = members
        .iter()
        .map(|m| serde_json::Value::from(m.clone()).to_string())
        .collect();
    format!("[{}]", rendered.join(", "))
}

// ── Input ─────────────────────────────────────────────────────────────────────

fn read_document(input: Option<&Path>) -> ParamGuardResult<serde_json::Value> {
    let (source, text) = match input {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| ParamGuardError::InputError {
                reason: format!("failed to read '{}': {}", path.display(), e),
            })?;
            (path.display().to_string(), text)
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| ParamGuardError::InputError {
                    reason: format!("failed to read stdin: {}", e),
                })?;
            ("stdin".to_string(), text)
        }
    };

    serde_json::from_str(&text).map_err(|e| ParamGuardError::InputError {
        reason: format!("{source} is not valid JSON: {}", e),
    })
}
