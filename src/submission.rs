//! Submission Validation
//!
//! A submission is replayed onto the model's default instance, deserialized, and
//! checked with `validator`. Rejections come back as a [`FormState`] that keeps
//! every submitted value next to its first error, ready to be rendered again.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::messages::{self, FieldError};
use crate::schema::{FieldDescriptor, FieldKind, FormModel, ModelSchema};
use crate::state::{FormField, FormState, generate_csrf_token};

/// Raw submitted key/value pairs, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pairs: Vec<(String, String)>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// First value submitted under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Distinct keys with their first value, in submission order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut seen = HashSet::new();
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .filter(move |(key, _)| seen.insert(*key))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Submission {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for Submission {
    fn from(map: HashMap<String, String>) -> Self {
        let mut pairs: Vec<(String, String)> = map.into_iter().collect();
        pairs.sort();
        Self { pairs }
    }
}

/// Result of validating one submission
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Accepted(T),
    Rejected {
        state: FormState,
        errors: Vec<FieldError>,
    },
}

impl<T> Outcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }

    pub fn accepted(self) -> Option<T> {
        match self {
            Outcome::Accepted(record) => Some(record),
            Outcome::Rejected { .. } => None,
        }
    }

    pub fn state(&self) -> Option<&FormState> {
        match self {
            Outcome::Accepted(_) => None,
            Outcome::Rejected { state, .. } => Some(state),
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            Outcome::Accepted(_) => &[],
            Outcome::Rejected { errors, .. } => errors,
        }
    }
}

/// Validates submissions against a [`FormModel`]
pub struct SubmissionValidator<'a> {
    csrf_field: &'a str,
}

impl Default for SubmissionValidator<'static> {
    fn default() -> Self {
        Self { csrf_field: "csrf" }
    }
}

impl<'a> SubmissionValidator<'a> {
    pub fn new(csrf_field: &'a str) -> Self {
        Self { csrf_field }
    }

    pub fn validate<T: FormModel>(&self, submission: &Submission) -> Outcome<T> {
        let schema = T::schema();
        let mut errors = Vec::new();

        let defaults = match serde_json::to_value(T::default()) {
            Ok(defaults) => defaults,
            Err(err) => {
                errors.push(FieldError::new(Vec::new(), "model_serialization", err.to_string()));
                Value::Object(Map::new())
            }
        };
        let mut candidate = match &defaults {
            Value::Object(object) => object.clone(),
            _ => Map::new(),
        };
        self.apply(schema, schema, &mut candidate, submission, &mut Vec::new(), &mut errors);

        // Each failing field goes back to its default until the record deserializes
        let record: T = loop {
            match serde_path_to_error::deserialize(Value::Object(candidate.clone())) {
                Ok(record) => break record,
                Err(err) => {
                    let loc = messages::location(err.path());
                    tracing::warn!(
                        model = %schema.name,
                        path = %err.path(),
                        error = %err.inner(),
                        "candidate record did not deserialize"
                    );
                    let restored = restore_default(&mut candidate, &defaults, &loc);
                    errors.push(FieldError::new(loc, "model_parsing", err.inner().to_string()));
                    if !restored {
                        return self.reject(schema, submission, errors);
                    }
                }
            }
        };

        if let Err(validation) = validator::Validate::validate(&record) {
            errors.extend(messages::flatten(&validation));
        }

        if errors.is_empty() {
            tracing::info!(model = %schema.name, "submission accepted");
            Outcome::Accepted(record)
        } else {
            self.reject(schema, submission, errors)
        }
    }

    /// Overwrite candidate values with coerced submitted values; returns how many were applied
    fn apply(
        &self,
        root: &ModelSchema,
        schema: &ModelSchema,
        object: &mut Map<String, Value>,
        submission: &Submission,
        path: &mut Vec<String>,
        errors: &mut Vec<FieldError>,
    ) -> usize {
        let mut applied = 0;

        for descriptor in &schema.fields {
            path.push(descriptor.name.clone());
            match &descriptor.kind {
                FieldKind::Nested(model_name) => {
                    if let Some(def) = root.defs.get(model_name) {
                        if let Some(Value::Object(nested)) = object.get_mut(&descriptor.name) {
                            applied += self.apply(root, def, nested, submission, path, errors);
                        } else {
                            let mut nested = Map::new();
                            let count = self.apply(root, def, &mut nested, submission, path, errors);
                            if count > 0 {
                                object.insert(descriptor.name.clone(), Value::Object(nested));
                                applied += count;
                            }
                        }
                    }
                }
                _ => {
                    if descriptor.name != self.csrf_field
                        && let Some(raw) = submission.get(&descriptor.name)
                    {
                        match coerce(descriptor, raw) {
                            Ok(Some(value)) => {
                                object.insert(descriptor.name.clone(), value);
                                applied += 1;
                            }
                            Ok(None) => {}
                            Err((code, message)) => {
                                errors.push(FieldError::new(path.clone(), code, message));
                            }
                        }
                    }
                }
            }
            path.pop();
        }

        applied
    }

    fn reject<T>(&self, schema: &ModelSchema, submission: &Submission, errors: Vec<FieldError>) -> Outcome<T> {
        let csrf = submission
            .get(self.csrf_field)
            .map(str::to_owned)
            .unwrap_or_else(generate_csrf_token);
        let mut state = FormState::with_csrf(csrf);

        for (key, value) in submission.iter() {
            if key == self.csrf_field {
                continue;
            }
            let mut field = FormField::new(key, Some(value.to_string()));
            if let Some(error) = errors.iter().find(|error| error.concerns(key)) {
                field = field.with_error(error.message.clone());
            }
            state.insert(field);
        }

        tracing::info!(
            model = %schema.name,
            errors = errors.len(),
            flagged = state.error_count(),
            "submission rejected"
        );

        Outcome::Rejected { state, errors }
    }
}

/// Put the default back at `loc`; false when nothing changed
fn restore_default(candidate: &mut Map<String, Value>, defaults: &Value, loc: &[String]) -> bool {
    let Some((last, parents)) = loc.split_last() else {
        return false;
    };

    let mut object = candidate;
    let mut default = defaults;
    for key in parents {
        default = default.get(key.as_str()).unwrap_or(&Value::Null);
        match object.get_mut(key.as_str()) {
            Some(Value::Object(inner)) => object = inner,
            _ => return false,
        }
    }

    match default.get(last.as_str()) {
        Some(value) if object.get(last.as_str()) == Some(value) => false,
        Some(value) => {
            object.insert(last.clone(), value.clone());
            true
        }
        None => object.remove(last.as_str()).is_some(),
    }
}

/// Convert a raw string by field kind; `Ok(None)` leaves the default in place
fn coerce(descriptor: &FieldDescriptor, raw: &str) -> Result<Option<Value>, (&'static str, String)> {
    let trimmed = raw.trim();
    match &descriptor.kind {
        FieldKind::String => Ok(Some(Value::String(raw.to_string()))),
        _ if trimmed.is_empty() => Ok(None),
        FieldKind::Integer => trimmed
            .parse::<i64>()
            .map(|number| Some(Value::from(number)))
            .map_err(|_| messages::integer_parsing()),
        FieldKind::Number => trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(|number| Some(Value::Number(number)))
            .ok_or_else(messages::number_parsing),
        FieldKind::Boolean => match trimmed.to_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(Some(Value::Bool(true))),
            "false" | "off" | "no" | "0" => Ok(Some(Value::Bool(false))),
            _ => Err(messages::boolean_parsing()),
        },
        FieldKind::Enum(options) => {
            if options.iter().any(|option| option == trimmed) {
                Ok(Some(Value::String(trimmed.to_string())))
            } else {
                Err(messages::enum_mismatch(options))
            }
        }
        FieldKind::Nested(_) => Ok(None),
    }
}

/// Validate `submission` against `T` using the default `csrf` field name
pub fn validate_submission<T: FormModel>(submission: &Submission) -> Outcome<T> {
    SubmissionValidator::default().validate(submission)
}
