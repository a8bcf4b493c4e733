use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FormsConfig {
    pub form: FormConfig,
    pub document: DocumentConfig,
    pub success: SuccessConfig,
}

/// Form element settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormConfig {
    /// Endpoint the form posts to via `hx-post`
    pub endpoint: Option<String>,
    /// Id of the element replaced with the response via `hx-target`
    pub target: Option<String>,
    /// Emit an embeddable fragment instead of a full document
    pub insert: bool,
    /// Name of the hidden csrf input
    pub csrf_field: String,
    /// `step` attribute of number inputs
    pub number_step: String,
}

/// Document shell settings, used when a full page is rendered
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentConfig {
    pub title: String,
    pub lang: String,
    pub stylesheets: Vec<String>,
}

/// How accepted submissions are answered
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SuccessConfig {
    pub format: SuccessFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuccessFormat {
    #[default]
    Html,
    Json,
}

impl std::str::FromStr for SuccessFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "html" => Ok(SuccessFormat::Html),
            "json" => Ok(SuccessFormat::Json),
            other => Err(ConfigError::Environment(format!(
                "Invalid SCHEMA_FORMS_SUCCESS_FORMAT value: {}",
                other
            ))),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            target: None,
            insert: true,
            csrf_field: "csrf".to_string(),
            number_step: "0.001".to_string(),
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: "Form".to_string(),
            lang: "en".to_string(),
            stylesheets: vec![
                "/static/jscss/fontawesome-free-6.7.2-web/css/fontawesome.css".to_string(),
                "/static/jscss/fontawesome-free-6.7.2-web/css/solid.css".to_string(),
                "https://cdn.jsdelivr.net/npm/bulma@1.0.4/css/bulma.min.css".to_string(),
                "/static/site.css".to_string(),
            ],
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment
    pub async fn load_config(config_path: Option<&Path>) -> Result<FormsConfig> {
        let mut config = FormsConfig::default();

        if let Some(path) = config_path {
            let file_config = Self::load_from_file(path).await?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides(config)?;

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<FormsConfig> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<FormsConfig>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<FormsConfig>> {
        let config_names = [
            "schema-forms.toml",
            "schema-forms.json",
            ".schema-forms.toml",
            ".schema-forms.json",
        ];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading form configuration");
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("schema-forms");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    tracing::debug!(path = %path.display(), "loading form configuration");
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: FormsConfig) -> Result<FormsConfig> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: FormsConfig,
    ) -> Result<FormsConfig> {
        // Form settings
        if let Some(endpoint) = env.get("SCHEMA_FORMS_ENDPOINT") {
            config.form.endpoint = Some(endpoint);
        }

        if let Some(target) = env.get("SCHEMA_FORMS_TARGET") {
            config.form.target = Some(target);
        }

        if let Some(insert) = env.get("SCHEMA_FORMS_INSERT") {
            config.form.insert = insert.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid SCHEMA_FORMS_INSERT value: {}", insert))
            })?;
        }

        if let Some(csrf_field) = env.get("SCHEMA_FORMS_CSRF_FIELD") {
            config.form.csrf_field = csrf_field;
        }

        if let Some(step) = env.get("SCHEMA_FORMS_NUMBER_STEP") {
            config.form.number_step = step;
        }

        // Document settings
        if let Some(title) = env.get("SCHEMA_FORMS_TITLE") {
            config.document.title = title;
        }

        if let Some(lang) = env.get("SCHEMA_FORMS_LANG") {
            config.document.lang = lang;
        }

        if let Some(stylesheets) = env.get("SCHEMA_FORMS_STYLESHEETS") {
            config.document.stylesheets = stylesheets
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Success settings
        if let Some(format) = env.get("SCHEMA_FORMS_SUCCESS_FORMAT") {
            config.success.format = format.parse()?;
        }

        Ok(config)
    }

    /// Merge two configurations, with the override taking precedence
    pub fn merge_configs(mut base: FormsConfig, override_config: FormsConfig) -> FormsConfig {
        let defaults = FormsConfig::default();

        if override_config.form.endpoint.is_some() {
            base.form.endpoint = override_config.form.endpoint;
        }
        if override_config.form.target.is_some() {
            base.form.target = override_config.form.target;
        }
        if override_config.form.insert != defaults.form.insert {
            base.form.insert = override_config.form.insert;
        }
        if override_config.form.csrf_field != defaults.form.csrf_field {
            base.form.csrf_field = override_config.form.csrf_field;
        }
        if override_config.form.number_step != defaults.form.number_step {
            base.form.number_step = override_config.form.number_step;
        }

        if override_config.document.title != defaults.document.title {
            base.document.title = override_config.document.title;
        }
        if override_config.document.lang != defaults.document.lang {
            base.document.lang = override_config.document.lang;
        }
        if override_config.document.stylesheets != defaults.document.stylesheets {
            base.document.stylesheets = override_config.document.stylesheets;
        }

        if override_config.success.format != defaults.success.format {
            base.success.format = override_config.success.format;
        }

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &FormsConfig) -> Result<()> {
        if let Some(endpoint) = &config.form.endpoint
            && !(endpoint.starts_with('/') || endpoint.starts_with("http"))
        {
            return Err(ConfigError::Validation(format!(
                "Form endpoint must be a path or URL: {}",
                endpoint
            )));
        }

        if let Some(target) = &config.form.target {
            if config.form.endpoint.is_none() {
                return Err(ConfigError::Validation(
                    "Form target requires an endpoint".to_string(),
                ));
            }
            if target.is_empty()
                || target.starts_with('#')
                || target.chars().any(char::is_whitespace)
            {
                return Err(ConfigError::Validation(format!(
                    "Form target must be a bare element id: {:?}",
                    target
                )));
            }
        }

        if config.form.csrf_field.trim().is_empty() {
            return Err(ConfigError::Validation(
                "CSRF field name cannot be empty".to_string(),
            ));
        }

        match config.form.number_step.parse::<f64>() {
            Ok(step) if step > 0.0 && step.is_finite() => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "Number step must be a positive number: {}",
                    config.form.number_step
                )));
            }
        }

        Ok(())
    }
}
