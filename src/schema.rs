//! Field descriptor tables for form models
//!
//! Each model type builds its [`ModelSchema`] once (usually in a `OnceLock`) and
//! hands out a `&'static` reference afterwards. The table drives both rendering
//! and the coercion of submitted strings into a candidate record.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::Validate;

/// A model that can be rendered as a form and validated from a submission.
///
/// The `Default` instance seeds the candidate record, `Serialize`/`Deserialize`
/// move it in and out of JSON, and `Validate` is the constraint checker.
pub trait FormModel: Default + Serialize + DeserializeOwned + Validate {
    fn schema() -> &'static ModelSchema;
}

/// Value kind of a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    /// One of a fixed set of string options
    Enum(Vec<String>),
    /// Reference to another model, by its schema name
    Nested(String),
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Number)
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, FieldKind::Nested(_))
    }
}

/// Declared constraints, mirrored from the model's `#[validate]` attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }
}

/// Metadata about one schema field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub title: Option<String>,
    pub kind: FieldKind,
    pub icon: Option<String>,
    pub constraints: Constraints,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            title: None,
            kind,
            icon: None,
            constraints: Constraints::default(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn options<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FieldKind::Enum(options.into_iter().map(Into::into).collect()),
        )
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn length(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.constraints.min_length = min;
        self.constraints.max_length = max;
        self
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraints.minimum = min;
        self.constraints.maximum = max;
        self
    }

    pub fn exclusive_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraints.exclusive_minimum = min;
        self.constraints.exclusive_maximum = max;
        self
    }

    /// Label text, blank when the descriptor has no title
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

/// Ordered field table of one model plus the definitions of the models it nests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSchema {
    pub name: String,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub fields: Vec<FieldDescriptor>,
    /// Nested model definitions keyed by model name, flattened to one level
    pub defs: BTreeMap<String, ModelSchema>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            icon: None,
            fields: Vec::new(),
            defs: BTreeMap::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a field holding the nested model `M` and register its definition
    pub fn nested<M: FormModel>(mut self, name: impl Into<String>) -> Self {
        let nested = M::schema();
        let mut descriptor = FieldDescriptor::new(name, FieldKind::Nested(nested.name.clone()));
        descriptor.title = nested.title.clone();
        descriptor.icon = nested.icon.clone();
        self.fields.push(descriptor);

        for (def_name, def) in &nested.defs {
            self.defs.entry(def_name.clone()).or_insert_with(|| def.clone());
        }
        let mut flat = nested.clone();
        flat.defs.clear();
        self.defs.insert(nested.name.clone(), flat);
        self
    }

    /// Heading text, falling back to the model name
    pub fn heading(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Scalar fields in declaration order; nested references are excluded
    pub fn top_level_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| !field.kind.is_nested())
    }

    /// Fields that reference another model
    pub fn nested_references(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.kind.is_nested())
    }

    /// Nested model name paired with its scalar fields, ordered by name
    pub fn nested_groups(&self) -> impl Iterator<Item = (&str, Vec<&FieldDescriptor>)> {
        self.defs
            .iter()
            .map(|(name, def)| (name.as_str(), def.top_level_fields().collect()))
    }

    pub fn nested_fields(&self, model_name: &str) -> Option<Vec<&FieldDescriptor>> {
        self.defs
            .get(model_name)
            .map(|def| def.top_level_fields().collect())
    }

    pub fn has_nested(&self) -> bool {
        !self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::OnceLock;

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    struct Inner {
        code: Option<String>,
    }

    impl FormModel for Inner {
        fn schema() -> &'static ModelSchema {
            static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                ModelSchema::new("Inner")
                    .field(FieldDescriptor::string("code").title("Code").icon("barcode"))
            })
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    struct Middle {
        label: Option<String>,
        #[validate(nested)]
        inner: Inner,
    }

    impl FormModel for Middle {
        fn schema() -> &'static ModelSchema {
            static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                ModelSchema::new("Middle")
                    .field(FieldDescriptor::string("label"))
                    .nested::<Inner>("inner")
            })
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    struct Outer {
        count: Option<i64>,
        #[validate(nested)]
        middle: Middle,
        ratio: Option<f64>,
    }

    impl FormModel for Outer {
        fn schema() -> &'static ModelSchema {
            static SCHEMA: OnceLock<ModelSchema> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                ModelSchema::new("Outer")
                    .title("Outer form")
                    .field(FieldDescriptor::integer("count").title("Count"))
                    .nested::<Middle>("middle")
                    .field(FieldDescriptor::number("ratio").range(Some(0.0), Some(1.0)))
            })
        }
    }

    #[test]
    fn test_top_level_fields_exclude_nested_references() {
        let schema = Outer::schema();
        let names: Vec<&str> = schema
            .top_level_fields()
            .map(|field| field.name.as_str())
            .collect();
        assert_eq!(names, vec!["count", "ratio"]);

        let nested: Vec<&str> = schema
            .nested_references()
            .map(|field| field.name.as_str())
            .collect();
        assert_eq!(nested, vec!["middle"]);
    }

    #[test]
    fn test_nested_definitions_are_flattened() {
        let schema = Outer::schema();
        let groups: Vec<&str> = schema.nested_groups().map(|(name, _)| name).collect();
        assert_eq!(groups, vec!["Inner", "Middle"]);

        let middle = schema.nested_fields("Middle").unwrap();
        assert_eq!(middle.len(), 1);
        assert_eq!(middle[0].name, "label");
        assert!(schema.defs["Middle"].defs.is_empty());

        let inner = schema.nested_fields("Inner").unwrap();
        assert_eq!(inner[0].icon.as_deref(), Some("barcode"));
    }

    #[test]
    fn test_missing_metadata_degrades_to_blank() {
        let schema = Middle::schema();
        let label = schema.top_level_fields().next().unwrap();
        assert_eq!(label.label(), "");
        assert!(label.icon.is_none());
        assert_eq!(schema.heading(), "Middle");
        assert_eq!(Outer::schema().heading(), "Outer form");
    }

    #[test]
    fn test_constraints_builder() {
        let field = FieldDescriptor::string("street").length(Some(3), Some(36));
        assert_eq!(field.constraints.min_length, Some(3));
        assert_eq!(field.constraints.max_length, Some(36));
        assert!(!field.constraints.is_empty());
        assert!(FieldDescriptor::boolean("flag").constraints.is_empty());

        let kind = FieldDescriptor::options("plan", ["free", "pro"]).kind;
        assert_eq!(
            kind,
            FieldKind::Enum(vec!["free".to_string(), "pro".to_string()])
        );
        assert!(FieldKind::Number.is_numeric());
        assert!(!kind.is_numeric());
    }

    #[test]
    fn test_unknown_nested_model() {
        assert!(Outer::schema().nested_fields("Missing").is_none());
        assert!(Outer::schema().has_nested());
        assert!(!Inner::schema().has_nested());
    }
}
