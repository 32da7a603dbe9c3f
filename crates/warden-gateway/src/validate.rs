//! Argument validation against a tool's JSON Schema.
//!
//! Every violation is collected, not just the first, and reported in the
//! order the offending fields are declared in the schema's `properties`.
//! Violations that do not concern a declared field (e.g. arguments that are
//! not an object at all) come first.

use jsonschema::error::{ValidationError, ValidationErrorKind};
use serde_json::Value;
use tracing::debug;

/// One failed structural check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the offending field; empty for the argument root.
    pub field: String,
    pub reason: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            write!(f, "[(root)]: {}", self.reason)
        } else {
            write!(f, "[{}]: {}", self.field, self.reason)
        }
    }
}

/// Validate `args` against `schema`, returning every violation on failure.
pub fn validate_args(schema: &Value, args: &Value) -> Result<(), Vec<Violation>> {
    let validator = match jsonschema::validator_for(schema) {
        Ok(validator) => validator,
        Err(e) => {
            return Err(vec![Violation {
                field: String::new(),
                reason: format!("tool declares an invalid input schema: {e}"),
            }]);
        }
    };

    let declared = declared_properties(schema);
    let mut violations: Vec<(usize, Violation)> = validator
        .iter_errors(args)
        .map(|error| {
            let reason = error.to_string();
            let field = field_of(&error);
            (declaration_rank(&field, &declared), Violation { field, reason })
        })
        .collect();

    if violations.is_empty() {
        return Ok(());
    }

    violations.sort_by_key(|(rank, _)| *rank);
    debug!(violation_count = violations.len(), "argument validation failed");
    Err(violations.into_iter().map(|(_, v)| v).collect())
}

/// Top-level property names in declaration order.
fn declared_properties(schema: &Value) -> Vec<String> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}

/// The dotted path of the field a violation concerns.
///
/// A missing required property is reported against its parent object, so
/// its name is taken from the error kind and appended.
fn field_of(error: &ValidationError<'_>) -> String {
    let parent = error.instance_path.to_string().trim_start_matches('/').replace('/', ".");
    match &error.kind {
        ValidationErrorKind::Required { property } => match property.as_str() {
            Some(name) if parent.is_empty() => name.to_string(),
            Some(name) => format!("{parent}.{name}"),
            None => parent,
        },
        _ => parent,
    }
}

/// 0 for root violations, 1 + index for declared fields, last for the rest.
fn declaration_rank(field: &str, declared: &[String]) -> usize {
    if field.is_empty() {
        return 0;
    }
    let top = field.split('.').next().unwrap_or(field);
    declared
        .iter()
        .position(|name| name == top)
        .map_or(declared.len() + 1, |index| index + 1)
}
