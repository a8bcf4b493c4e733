//! Field-level error messages
//!
//! Flattens `validator` results into [`FieldError`]s addressed by location and
//! phrases each one for display next to its input.

use serde::Serialize;
use serde_path_to_error::Segment;
use serde_json::Value;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// One failed check, addressed by the path of field names leading to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(loc: Vec<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            loc,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether `name` appears anywhere in the location
    pub fn concerns(&self, name: &str) -> bool {
        self.loc.iter().any(|segment| segment == name)
    }

    /// Dotted location, e.g. `address.street`
    pub fn path(&self) -> String {
        self.loc.join(".")
    }
}

/// Flatten nested validation errors, ordered by location
///
/// The sort is stable, so several errors on one field keep the order in which
/// the validator reported them.
pub fn flatten(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut flat = Vec::new();
    collect(errors, &mut Vec::new(), &mut flat);
    flat.sort_by(|a, b| a.loc.cmp(&b.loc));
    flat
}

/// Field names along a deserialization path, e.g. `["address", "lot"]`
pub(crate) fn location(path: &serde_path_to_error::Path) -> Vec<String> {
    path.iter()
        .filter_map(|segment| match segment {
            Segment::Map { key } => Some(key.clone()),
            Segment::Seq { index } => Some(index.to_string()),
            Segment::Enum { variant } => Some(variant.clone()),
            _ => None,
        })
        .collect()
}

fn collect(errors: &ValidationErrors, path: &mut Vec<String>, flat: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        path.push(field.to_string());
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    flat.push(FieldError::new(
                        path.clone(),
                        error.code.to_string(),
                        describe(error),
                    ));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, path, flat),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    path.push(index.to_string());
                    collect(inner, path, flat);
                    path.pop();
                }
            }
        }
        path.pop();
    }
}

/// Human message for one validator error; an explicit message always wins
pub fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    match &*error.code {
        "length" => describe_length(error),
        "range" => describe_range(error),
        "email" => "value is not a valid email address".to_string(),
        "url" => "Input should be a valid URL".to_string(),
        "required" => "Field required".to_string(),
        "regex" => "String should match pattern".to_string(),
        "must_match" => match param(error, "other") {
            Some(other) => format!("Value should match {}", other),
            None => "Values should match".to_string(),
        },
        "contains" => match param(error, "needle") {
            Some(needle) => format!("String should contain '{}'", needle),
            None => "String is missing a required part".to_string(),
        },
        "does_not_contain" => match param(error, "needle") {
            Some(needle) => format!("String should not contain '{}'", needle),
            None => "String contains a forbidden part".to_string(),
        },
        "credit_card" => "Input should be a valid card number".to_string(),
        code => format!("Invalid value ({})", code),
    }
}

fn describe_length(error: &ValidationError) -> String {
    let value = error.params.get("value");
    let (subject, length) = match value {
        Some(Value::Array(items)) => ("List", Some(items.len() as f64)),
        Some(Value::Object(entries)) => ("Dictionary", Some(entries.len() as f64)),
        Some(Value::String(text)) => ("String", Some(text.chars().count() as f64)),
        _ => ("String", None),
    };
    let unit = |count: &str| match subject {
        "String" => characters(count),
        _ if count == "1" => "item",
        _ => "items",
    };

    if let Some(equal) = param(error, "equal") {
        return format!("{} should have exactly {} {}", subject, equal, unit(&equal));
    }

    let min = param(error, "min");
    let max = param(error, "max");

    match (length, &min, &max) {
        (Some(length), _, Some(max)) if length > number(max) => {
            format!("{} should have at most {} {}", subject, max, unit(max))
        }
        (_, Some(min), _) => format!("{} should have at least {} {}", subject, min, unit(min)),
        (_, None, Some(max)) => format!("{} should have at most {} {}", subject, max, unit(max)),
        _ => format!("{} has an invalid length", subject),
    }
}

fn describe_range(error: &ValidationError) -> String {
    let value = error.params.get("value").and_then(Value::as_f64);
    let checks = [
        ("exclusive_min", "greater than"),
        ("min", "greater than or equal to"),
        ("exclusive_max", "less than"),
        ("max", "less than or equal to"),
    ];

    for (name, relation) in checks {
        let Some(bound) = param(error, name) else {
            continue;
        };
        let limit = number(&bound);
        let violated = match value {
            Some(value) => match name {
                "exclusive_min" => value <= limit,
                "min" => value < limit,
                "exclusive_max" => value >= limit,
                _ => value > limit,
            },
            None => true,
        };
        if violated {
            return format!("Input should be {} {}", relation, bound);
        }
    }

    "Input is out of range".to_string()
}

/// Parameter rendered without JSON quoting
fn param(error: &ValidationError, name: &str) -> Option<String> {
    error.params.get(name).map(|value| match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}

fn number(text: &str) -> f64 {
    text.parse().unwrap_or(f64::NAN)
}

fn characters(count: &str) -> &'static str {
    if count == "1" { "character" } else { "characters" }
}

pub(crate) fn integer_parsing() -> (&'static str, String) {
    (
        "int_parsing",
        "Input should be a valid integer, unable to parse string as an integer".to_string(),
    )
}

pub(crate) fn number_parsing() -> (&'static str, String) {
    (
        "float_parsing",
        "Input should be a valid number, unable to parse string as a number".to_string(),
    )
}

pub(crate) fn boolean_parsing() -> (&'static str, String) {
    (
        "bool_parsing",
        "Input should be a valid boolean, unable to interpret input".to_string(),
    )
}

/// e.g. `Input should be 'free', 'team' or 'pro'`
pub(crate) fn enum_mismatch(options: &[String]) -> (&'static str, String) {
    let quoted: Vec<String> = options.iter().map(|option| format!("'{}'", option)).collect();
    let expected = match quoted.split_last() {
        None => "one of no options".to_string(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    };
    ("enum", format!("Input should be {}", expected))
}
