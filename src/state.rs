//! Per-request form state threaded between rendering and validation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::schema::{FieldKind, FormModel, ModelSchema};

/// Value and error of one rendered field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: Option<String>,
    pub error: Option<String>,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Carrier of csrf token, field values and field errors for one exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub csrf: String,
    pub fields: BTreeMap<String, FormField>,
    pub model: Option<Value>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    /// Empty state with a freshly generated csrf token
    pub fn new() -> Self {
        Self::with_csrf(generate_csrf_token())
    }

    pub fn with_csrf(csrf: impl Into<String>) -> Self {
        Self {
            csrf: csrf.into(),
            fields: BTreeMap::new(),
            model: None,
        }
    }

    /// State pre-filled with the values of `model`, nested fields flattened by name
    pub fn from_model<T: FormModel>(model: &T) -> Result<Self> {
        let snapshot = serde_json::to_value(model)?;
        let mut state = Self::new();
        collect_values(T::schema(), T::schema(), &snapshot, &mut state.fields);
        state.model = Some(snapshot);
        Ok(state)
    }

    pub fn insert(&mut self, field: FormField) {
        self.fields.insert(field.name.clone(), field);
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|field| field.value.as_deref())
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|field| field.error.as_deref())
    }

    pub fn has_errors(&self) -> bool {
        self.fields.values().any(|field| field.error.is_some())
    }

    pub fn error_count(&self) -> usize {
        self.fields
            .values()
            .filter(|field| field.error.is_some())
            .count()
    }
}

/// Opaque url-safe token for the hidden csrf input
pub fn generate_csrf_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn collect_values(
    root: &ModelSchema,
    schema: &ModelSchema,
    object: &Value,
    fields: &mut BTreeMap<String, FormField>,
) {
    for descriptor in &schema.fields {
        let value = object.get(&descriptor.name).unwrap_or(&Value::Null);
        match &descriptor.kind {
            FieldKind::Nested(model_name) => {
                if let Some(def) = root.defs.get(model_name) {
                    collect_values(root, def, value, fields);
                }
            }
            _ => {
                fields.insert(
                    descriptor.name.clone(),
                    FormField::new(descriptor.name.clone(), display_value(value)),
                );
            }
        }
    }
}

/// Text shown in an input for a JSON scalar; `null` shows nothing
pub(crate) fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;
    use std::sync::OnceLock;
    use validator::Validate;

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    struct Address {
        lot: Option<i64>,
        street: Option<String>,
    }

    impl FormModel for Address {
        fn schema() -> &'static ModelSchema {
            static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                ModelSchema::new("Address")
                    .field(FieldDescriptor::integer("lot"))
                    .field(FieldDescriptor::string("street"))
            })
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    struct Person {
        name: Option<String>,
        member: bool,
        #[validate(nested)]
        address: Address,
    }

    impl FormModel for Person {
        fn schema() -> &'static ModelSchema {
            static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                ModelSchema::new("Person")
                    .field(FieldDescriptor::string("name"))
                    .field(FieldDescriptor::boolean("member"))
                    .nested::<Address>("address")
            })
        }
    }

    #[test]
    fn test_from_model_flattens_nested_values() {
        let person = Person {
            name: Some("Apple".to_string()),
            member: true,
            address: Address {
                lot: Some(52),
                street: None,
            },
        };

        let state = FormState::from_model(&person).unwrap();
        assert_eq!(state.value("name"), Some("Apple"));
        assert_eq!(state.value("member"), Some("true"));
        assert_eq!(state.value("lot"), Some("52"));
        assert_eq!(state.value("street"), None);
        assert!(state.field("street").is_some());
        assert!(state.field("address").is_none());
        assert!(state.model.is_some());
        assert!(!state.has_errors());
    }

    #[test]
    fn test_fresh_states_get_distinct_tokens() {
        let first = FormState::new();
        let second = FormState::new();
        assert!(!first.csrf.is_empty());
        assert_ne!(first.csrf, second.csrf);
        assert!(first.csrf.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_errors_are_counted() {
        let mut state = FormState::with_csrf("token");
        state.insert(FormField::new("age", Some("15".to_string())).with_error("too young"));
        state.insert(FormField::new("name", Some("Apple".to_string())));

        assert!(state.has_errors());
        assert_eq!(state.error_count(), 1);
        assert_eq!(state.error("age"), Some("too young"));
        assert_eq!(state.error("name"), None);
        assert_eq!(state.error("missing"), None);
    }
}
