//! # schema-forms Library
//!
//! Renders HTML forms from model descriptor tables and validates submitted form
//! data back against the same models, annotating each field with its error.

pub mod config;
pub mod engine;
pub mod error;
pub mod messages;
pub mod render;
pub mod schema;
pub mod state;
pub mod submission;

pub use config::{
    ConfigError, ConfigManager, DocumentConfig, EnvProvider, FormConfig, FormsConfig,
    SuccessConfig, SuccessFormat, SystemEnvProvider,
};
pub use engine::{FormEngine, FormResponse};
pub use error::{FormError, Result};
pub use messages::FieldError;
pub use render::{FormRenderer, Fragments, RenderOptions, SubmitTarget, render_form, success_card};
pub use schema::{Constraints, FieldDescriptor, FieldKind, FormModel, ModelSchema};
pub use state::{FormField, FormState, generate_csrf_token};
pub use submission::{Outcome, Submission, SubmissionValidator, validate_submission};
