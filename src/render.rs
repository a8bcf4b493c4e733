//! Form Markup Rendering
//!
//! Turns a [`ModelSchema`] and a [`FormState`] into an ordered list of markup
//! fragments. Concatenated, the fragments form either a full HTML document or a
//! fragment meant to be swapped into a page by htmx.

use std::fmt;
use std::sync::OnceLock;

use futures::stream::{self, Stream};
use handlebars::{Handlebars, html_escape};
use serde::Serialize;
use serde_json::Value;

use crate::config::{DocumentConfig, FormConfig, FormsConfig};
use crate::error::Result;
use crate::schema::{FieldDescriptor, FieldKind, FormModel, ModelSchema};
use crate::state::FormState;

const SHELL_OPEN: &str = "shell_open";

const SHELL_OPEN_TEMPLATE: &str = r#"<!DOCTYPE html><html lang="{{lang}}"><head><meta charset="UTF-8"><meta name="viewport" content="width=device-width, initial-scale=1.0"><title>{{title}}</title>{{#each stylesheets}}<link rel="stylesheet" href="{{this}}" />{{/each}}</head><body>"#;

const SHELL_CLOSE: &str = "</body></html>";

static SHELL: OnceLock<Handlebars<'static>> = OnceLock::new();

fn shell() -> Result<&'static Handlebars<'static>> {
    if let Some(registry) = SHELL.get() {
        return Ok(registry);
    }
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_template_string(SHELL_OPEN, SHELL_OPEN_TEMPLATE)?;
    Ok(SHELL.get_or_init(|| registry))
}

#[derive(Serialize)]
struct ShellContext<'a> {
    title: &'a str,
    lang: &'a str,
    stylesheets: &'a [String],
}

/// Where the form posts and which element the response replaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTarget {
    pub endpoint: String,
    pub element_id: String,
}

impl SubmitTarget {
    pub fn new(endpoint: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            element_id: element_id.into(),
        }
    }
}

/// Display mode flags for one rendering pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Wrap the form in a full HTML document
    pub document: bool,
    /// Fill inputs with the values held by the form state
    pub values: bool,
    /// Show the errors held by the form state under their inputs
    pub errors: bool,
    pub target: Option<SubmitTarget>,
}

impl RenderOptions {
    pub fn from_config(config: &FormConfig) -> Self {
        let target = match (&config.endpoint, &config.target) {
            (Some(endpoint), Some(element_id)) => {
                Some(SubmitTarget::new(endpoint.clone(), element_id.clone()))
            }
            _ => None,
        };
        Self {
            document: !config.insert,
            values: false,
            errors: false,
            target,
        }
    }

    pub fn document(mut self, document: bool) -> Self {
        self.document = document;
        self
    }

    pub fn with_values(mut self) -> Self {
        self.values = true;
        self
    }

    pub fn with_errors(mut self) -> Self {
        self.errors = true;
        self
    }

    pub fn with_target(mut self, endpoint: impl Into<String>, element_id: impl Into<String>) -> Self {
        self.target = Some(SubmitTarget::new(endpoint, element_id));
        self
    }
}

/// Ordered markup fragments of one rendered form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments(Vec<String>);

impl Fragments {
    fn push(&mut self, fragment: impl Into<String>) {
        self.0.push(fragment.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// The whole document or fragment as one string
    pub fn concat(&self) -> String {
        self.0.concat()
    }

    /// Fragments as a stream, for chunked response bodies
    pub fn into_stream(self) -> impl Stream<Item = String> {
        stream::iter(self.0)
    }
}

impl IntoIterator for Fragments {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Fragments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.0 {
            f.write_str(fragment)?;
        }
        Ok(())
    }
}

/// Renders the form of one model schema
pub struct FormRenderer<'a> {
    schema: &'a ModelSchema,
    form: &'a FormConfig,
    document: &'a DocumentConfig,
}

impl<'a> FormRenderer<'a> {
    pub fn new(schema: &'a ModelSchema, config: &'a FormsConfig) -> Self {
        Self {
            schema,
            form: &config.form,
            document: &config.document,
        }
    }

    /// Render the form, falling back to a fresh empty state when none is given
    pub fn fragments(&self, options: &RenderOptions, state: Option<&FormState>) -> Result<Fragments> {
        match state {
            Some(state) => self.render(options, state),
            None => self.render(options, &FormState::new()),
        }
    }

    fn render(&self, options: &RenderOptions, state: &FormState) -> Result<Fragments> {
        let mut fragments = Fragments::default();

        if options.document {
            fragments.push(self.document_open()?);
        }

        fragments.push(self.form_open(options));
        fragments.push(format!(
            r#"<input type="hidden" name="{}" value="{}" />"#,
            html_escape(&self.form.csrf_field),
            html_escape(&state.csrf)
        ));
        fragments.push(format!(
            r#"<h3 class="title is-4">{}</h3>"#,
            html_escape(self.schema.heading())
        ));

        for field in self.schema.top_level_fields() {
            fragments.push(self.field_block(field, options, state));
        }

        if self.schema.has_nested() {
            fragments.push("<ul uk-accordion>");
            for (model_name, fields) in self.schema.nested_groups() {
                let heading = self
                    .schema
                    .defs
                    .get(model_name)
                    .map(|def| def.heading())
                    .unwrap_or(model_name);
                fragments.push(format!(
                    r##"<li data-model="{}"><a class="uk-accordion-title" href="#">{}</a><div class="uk-accordion-content">"##,
                    html_escape(model_name),
                    html_escape(heading)
                ));
                for field in fields {
                    fragments.push(self.field_block(field, options, state));
                }
                fragments.push("</div></li>");
            }
            fragments.push("</ul>");
        }

        fragments.push(
            r#"<div class="field is-grouped mt-5"><div class="control"><input type="submit" class="button is-primary" value="Submit" /></div><div class="control"><button type="reset" class="button is-link is-light">Cancel</button></div></div></form></div>"#,
        );

        if options.document {
            fragments.push(SHELL_CLOSE);
        }

        tracing::debug!(
            model = %self.schema.name,
            fragments = fragments.len(),
            values = options.values,
            errors = options.errors,
            "rendered form"
        );

        Ok(fragments)
    }

    fn document_open(&self) -> Result<String> {
        let title: &str = if self.document.title.is_empty() {
            self.schema.heading()
        } else {
            &self.document.title
        };
        let context = ShellContext {
            title,
            lang: &self.document.lang,
            stylesheets: &self.document.stylesheets,
        };
        Ok(shell()?.render(SHELL_OPEN, &context)?)
    }

    fn form_open(&self, options: &RenderOptions) -> String {
        match &options.target {
            Some(target) => format!(
                r##"<div class="box"><form method="POST" hx-post="{}" hx-target="#{}">"##,
                html_escape(&target.endpoint),
                html_escape(&target.element_id)
            ),
            None => r#"<div class="box"><form method="POST">"#.to_string(),
        }
    }

    fn field_block(&self, field: &FieldDescriptor, options: &RenderOptions, state: &FormState) -> String {
        let name = html_escape(&field.name);
        let title = html_escape(field.label());
        let error = if options.errors {
            state.error(&field.name)
        } else {
            None
        };

        let input_type = match field.kind {
            FieldKind::Number => format!(r#"type="number" step="{}""#, html_escape(&self.form.number_step)),
            FieldKind::Integer => r#"type="number" step="1""#.to_string(),
            _ => r#"type="text""#.to_string(),
        };
        let value = if options.values {
            format!(r#" value="{}""#, html_escape(state.value(&field.name).unwrap_or("")))
        } else {
            String::new()
        };
        let control_class = if field.icon.is_some() {
            "control has-icons-left"
        } else {
            "control"
        };
        let input_class = if error.is_some() { "input is-danger" } else { "input" };

        let mut block = format!(
            r#"<div class="field"><label class="label" for="{name}">{title}</label><div class="{control_class}"><input class="{input_class}" {input_type} name="{name}" id="{name}" placeholder="{title}"{value} />"#
        );
        if let Some(icon) = &field.icon {
            block.push_str(&format!(
                r#"<span class="icon is-small is-left"><i class="fas fa-{}"></i></span>"#,
                html_escape(icon)
            ));
        }
        if let Some(error) = error {
            block.push_str(&format!(r#"<p class="help is-danger">{}</p>"#, html_escape(error)));
        }
        block.push_str("</div></div>");
        block
    }
}

/// Render the form of `model`, pre-filled from the instance
pub fn render_form<T: FormModel>(model: &T, options: &RenderOptions) -> Result<Fragments> {
    let config = FormsConfig::default();
    let state = FormState::from_model(model)?;
    FormRenderer::new(T::schema(), &config).fragments(options, Some(&state))
}

/// Success view for an accepted record
pub fn success_card(schema: &ModelSchema, record: &Value) -> Result<String> {
    let pretty = serde_json::to_string_pretty(record)?;
    Ok(format!(
        r#"<div class="card"><div class="card-content"><p class="title is-5">{}</p><pre>{}</pre></div></div>"#,
        html_escape(schema.heading()),
        html_escape(&pretty)
    ))
}
