//! Request-facing entry points
//!
//! [`FormEngine`] bundles the configuration with the renderer and the
//! submission validator, so a request handler needs one call per exchange: one
//! to show the form, one to answer its submission.

use serde_json::Value;

use crate::config::{FormsConfig, SuccessFormat};
use crate::error::Result;
use crate::render::{FormRenderer, Fragments, RenderOptions, success_card};
use crate::schema::FormModel;
use crate::state::FormState;
use crate::submission::{Outcome, Submission, SubmissionValidator};

/// Body handed back to the web framework
#[derive(Debug, Clone, PartialEq)]
pub enum FormResponse {
    Html(String),
    Json(Value),
}

impl FormResponse {
    pub fn content_type(&self) -> &'static str {
        match self {
            FormResponse::Html(_) => "text/html; charset=utf-8",
            FormResponse::Json(_) => "application/json",
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, FormResponse::Html(_))
    }

    pub fn into_body(self) -> String {
        match self {
            FormResponse::Html(html) => html,
            FormResponse::Json(value) => value.to_string(),
        }
    }
}

pub struct FormEngine {
    config: FormsConfig,
}

impl Default for FormEngine {
    fn default() -> Self {
        Self::new(FormsConfig::default())
    }
}

impl FormEngine {
    pub fn new(config: FormsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormsConfig {
        &self.config
    }

    /// Render options derived from the form configuration
    pub fn options(&self) -> RenderOptions {
        RenderOptions::from_config(&self.config.form)
    }

    /// Render the form of `model`, pre-filled from the instance
    pub fn render<T: FormModel>(&self, model: &T, options: &RenderOptions) -> Result<Fragments> {
        let state = FormState::from_model(model)?;
        self.render_state::<T>(&state, options)
    }

    /// Render the form of `T` from an existing state, e.g. one carried over from a rejection
    pub fn render_state<T: FormModel>(&self, state: &FormState, options: &RenderOptions) -> Result<Fragments> {
        FormRenderer::new(T::schema(), &self.config).fragments(options, Some(state))
    }

    pub fn validate<T: FormModel>(&self, submission: &Submission) -> Outcome<T> {
        SubmissionValidator::new(&self.config.form.csrf_field).validate(submission)
    }

    /// Validate a submission and build the response body
    ///
    /// Accepted records are answered in the configured success format. Rejected
    /// submissions re-render the form as an embeddable fragment with the
    /// submitted values and their errors.
    pub fn validate_and_render<T: FormModel>(&self, submission: &Submission) -> Result<FormResponse> {
        match self.validate::<T>(submission) {
            Outcome::Accepted(record) => {
                let record = serde_json::to_value(&record)?;
                match self.config.success.format {
                    SuccessFormat::Json => Ok(FormResponse::Json(record)),
                    SuccessFormat::Html => Ok(FormResponse::Html(success_card(T::schema(), &record)?)),
                }
            }
            Outcome::Rejected { state, .. } => {
                let options = self.options().document(false).with_values().with_errors();
                let fragments = self.render_state::<T>(&state, &options)?;
                Ok(FormResponse::Html(fragments.concat()))
            }
        }
    }
}
