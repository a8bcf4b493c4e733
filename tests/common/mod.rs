//! Shared fixture models for integration tests
#![allow(dead_code)]

use std::borrow::Cow;
use std::sync::OnceLock;

use schema_forms::{FieldDescriptor, FormModel, ModelSchema, Submission};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Contact {
    #[validate(range(min = 1, max = 1000))]
    pub tel: Option<i64>,
    #[validate(email)]
    pub email: Option<String>,
}

impl FormModel for Contact {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new("Contact")
                .field(
                    FieldDescriptor::integer("tel")
                        .title("Tel")
                        .icon("phone")
                        .range(Some(1.0), Some(1000.0)),
                )
                .field(FieldDescriptor::string("email").title("Email").icon("envelope"))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[validate(range(min = 1, max = 1000))]
    pub lot: Option<i64>,
    #[validate(length(min = 3, max = 36))]
    pub street: Option<String>,
}

impl FormModel for Address {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new("Address")
                .field(
                    FieldDescriptor::integer("lot")
                        .title("Lot")
                        .icon("bath")
                        .range(Some(1.0), Some(1000.0)),
                )
                .field(
                    FieldDescriptor::string("street")
                        .title("Street")
                        .icon("address-card")
                        .length(Some(3), Some(36)),
                )
        })
    }
}

fn older_than_twenty(age: i64) -> Result<(), ValidationError> {
    if age <= 20 {
        let mut error = ValidationError::new("age");
        error.message = Some(Cow::Owned(format!("must be older than {} !", age)));
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct MyForm {
    #[validate(length(min = 2, max = 50))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 120), custom(function = "older_than_twenty"))]
    pub age: Option<i64>,
    #[validate(range(min = 0.5, max = 3.0))]
    pub height: Option<f64>,
    pub plan: Option<String>,
    #[validate(nested)]
    pub contact: Contact,
    #[validate(nested)]
    pub address: Address,
}

impl FormModel for MyForm {
    fn schema() -> &'static ModelSchema {
        static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            ModelSchema::new("MyForm")
                .icon("location-arrow")
                .field(
                    FieldDescriptor::string("name")
                        .title("Name")
                        .icon("user")
                        .length(Some(2), Some(50)),
                )
                .field(
                    FieldDescriptor::integer("age")
                        .title("Age")
                        .icon("user-clock")
                        .range(Some(1.0), Some(120.0)),
                )
                .field(
                    FieldDescriptor::number("height")
                        .title("Height")
                        .range(Some(0.5), Some(3.0)),
                )
                .field(FieldDescriptor::options("plan", ["free", "pro"]).title("Plan"))
                .nested::<Contact>("contact")
                .nested::<Address>("address")
        })
    }
}

/// A submission that passes every check
pub fn valid_submission() -> Submission {
    Submission::from_pairs([
        ("csrf", "token-123"),
        ("name", "Apple"),
        ("age", "23"),
        ("height", "1.75"),
        ("plan", "pro"),
        ("tel", "752"),
        ("email", "baker@gfox.com"),
        ("lot", "52"),
        ("street", "baker road"),
    ])
}

/// `valid_submission` with one value replaced
pub fn submission_with(key: &str, value: &str) -> Submission {
    valid_submission()
        .iter()
        .map(|(name, original)| {
            if name == key {
                (name.to_string(), value.to_string())
            } else {
                (name.to_string(), original.to_string())
            }
        })
        .collect()
}
