use thiserror::Error;

use crate::config::ConfigError;

/// Faults raised while rendering forms or building responses.
///
/// Rejected submissions are not errors: they come back as
/// [`Outcome::Rejected`](crate::submission::Outcome) carrying the field messages.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ConfigError> for FormError {
    fn from(err: ConfigError) -> Self {
        FormError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, FormError>;
