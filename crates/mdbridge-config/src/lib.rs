//! Configuration management for mdbridge.
//!
//! Parses `mdbridge.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! All string fields of the `[confluence]` and `[jira]` sections are expanded,
//! including `[jira.fields]`.

mod expand;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdbridge.toml";

/// Marker phrase for the estimate footer of issue documents.
const DEFAULT_ESTIMATE_MARKER: &str = "Estimated Time Frame";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config,
/// and only for sections present in the file.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override `confluence.parent_page`.
    pub parent_page: Option<String>,
    /// Override `confluence.math`.
    pub math: Option<bool>,
    /// Override `jira.issue_type`.
    pub issue_type: Option<String>,
    /// Override `jira.priority`.
    pub priority: Option<String>,
    /// Override `jira.estimate_marker`.
    pub estimate_marker: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Confluence configuration.
    pub confluence: Option<ConfluenceConfig>,
    /// Jira configuration.
    pub jira: Option<JiraConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Confluence configuration.
#[derive(Debug, Deserialize)]
pub struct ConfluenceConfig {
    /// Confluence base URL, including the `/wiki` context path on cloud sites.
    pub base_url: String,
    /// Account name or email used for basic authentication.
    pub username: String,
    /// API token used as the basic authentication password.
    pub api_token: String,
    /// Space that pages are published to.
    pub space_key: String,
    /// Default parent page title.
    #[serde(default)]
    pub parent_page: Option<String>,
    /// Convert LaTeX math to math macros.
    #[serde(default = "default_true")]
    pub math: bool,
    /// Page titles keyed by source file name.
    #[serde(default)]
    pub titles: HashMap<String, String>,
}

impl ConfluenceConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "confluence.base_url")?;
        require_http_url(&self.base_url, "confluence.base_url")?;
        require_non_empty(&self.username, "confluence.username")?;
        require_non_empty(&self.api_token, "confluence.api_token")?;
        require_non_empty(&self.space_key, "confluence.space_key")?;
        Ok(())
    }

    /// Configured title for a source file name, if any.
    #[must_use]
    pub fn title_for(&self, file_name: &str) -> Option<&str> {
        self.titles.get(file_name).map(String::as_str)
    }
}

/// Jira configuration.
#[derive(Debug, Deserialize)]
pub struct JiraConfig {
    /// Jira base URL.
    pub base_url: String,
    /// Account name or email used for basic authentication.
    pub username: String,
    /// API token used as the basic authentication password.
    pub api_token: String,
    /// Project new issues are created in.
    pub project_key: String,
    /// Issue type name for new issues.
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
    /// Priority name for new issues.
    #[serde(default = "default_priority")]
    pub priority: String,
    /// Phrase marking the estimate footer of a document.
    #[serde(default = "default_estimate_marker")]
    pub estimate_marker: String,
    /// Extra fields sent when creating issues.
    #[serde(default)]
    pub fields: JiraFields,
}

impl JiraConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "jira.base_url")?;
        require_http_url(&self.base_url, "jira.base_url")?;
        require_non_empty(&self.username, "jira.username")?;
        require_non_empty(&self.api_token, "jira.api_token")?;
        require_non_empty(&self.project_key, "jira.project_key")?;
        require_non_empty(&self.issue_type, "jira.issue_type")?;
        require_non_empty(&self.priority, "jira.priority")?;
        if self.fields.category.is_some() && self.fields.category_field.is_none() {
            return Err(ConfigError::Validation(
                "jira.fields.category requires jira.fields.category_field".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Site-specific issue fields: component ids and a category custom field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JiraFields {
    /// Component ids attached to new issues.
    pub components: Vec<String>,
    /// Custom field id holding the category (e.g. `customfield_10033`).
    pub category_field: Option<String>,
    /// Category value for new issues.
    pub category: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_issue_type() -> String {
    "Task".to_owned()
}

fn default_priority() -> String {
    "Medium".to_owned()
}

fn default_estimate_marker() -> String {
    DEFAULT_ESTIMATE_MARKER.to_owned()
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`jira.api_token`").
        field: String,
        /// Error message (e.g., "${`JIRA_API_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdbridge.toml` in current directory and parents.
    /// Without a file the configuration is empty and every section is missing.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or an
    /// environment variable reference cannot be resolved.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(confluence) = &mut self.confluence {
            if let Some(parent_page) = &settings.parent_page {
                confluence.parent_page = Some(parent_page.clone());
            }
            if let Some(math) = settings.math {
                confluence.math = math;
            }
        }
        if let Some(jira) = &mut self.jira {
            if let Some(issue_type) = &settings.issue_type {
                jira.issue_type.clone_from(issue_type);
            }
            if let Some(priority) = &settings.priority {
                jira.priority.clone_from(priority);
            }
            if let Some(marker) = &settings.estimate_marker {
                jira.estimate_marker.clone_from(marker);
            }
        }
    }

    /// Get validated Confluence configuration.
    ///
    /// Use this instead of accessing the `confluence` field directly when the
    /// command requires Confluence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_confluence(&self) -> Result<&ConfluenceConfig, ConfigError> {
        let conf = self.confluence.as_ref().ok_or_else(|| {
            ConfigError::Validation("[confluence] section required in config".into())
        })?;
        conf.validate()?;
        Ok(conf)
    }

    /// Get validated Jira configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_jira(&self) -> Result<&JiraConfig, ConfigError> {
        let jira = self
            .jira
            .as_ref()
            .ok_or_else(|| ConfigError::Validation("[jira] section required in config".into()))?;
        jira.validate()?;
        Ok(jira)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        Self::discover_from(&cwd)
    }

    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref mut confluence) = self.confluence {
            confluence.base_url = expand::expand_env(&confluence.base_url, "confluence.base_url")?;
            confluence.username = expand::expand_env(&confluence.username, "confluence.username")?;
            confluence.api_token =
                expand::expand_env(&confluence.api_token, "confluence.api_token")?;
            confluence.space_key =
                expand::expand_env(&confluence.space_key, "confluence.space_key")?;
            expand::expand_optional(&mut confluence.parent_page, "confluence.parent_page")?;
        }

        if let Some(ref mut jira) = self.jira {
            jira.base_url = expand::expand_env(&jira.base_url, "jira.base_url")?;
            jira.username = expand::expand_env(&jira.username, "jira.username")?;
            jira.api_token = expand::expand_env(&jira.api_token, "jira.api_token")?;
            jira.project_key = expand::expand_env(&jira.project_key, "jira.project_key")?;
            jira.issue_type = expand::expand_env(&jira.issue_type, "jira.issue_type")?;
            jira.priority = expand::expand_env(&jira.priority, "jira.priority")?;
            for component in &mut jira.fields.components {
                *component = expand::expand_env(component, "jira.fields.components")?;
            }
            expand::expand_optional(&mut jira.fields.category_field, "jira.fields.category_field")?;
            expand::expand_optional(&mut jira.fields.category, "jira.fields.category")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FULL_CONFIG: &str = r#"
[confluence]
base_url = "https://example.atlassian.net/wiki"
username = "me@example.com"
api_token = "token123"
space_key = "DOCS"
parent_page = "Project Documentation"

[confluence.titles]
"README.md" = "Project - Overview"

[jira]
base_url = "https://example.atlassian.net"
username = "me@example.com"
api_token = "token456"
project_key = "PROJ"

[jira.fields]
components = ["10013"]
category_field = "customfield_10033"
category = "Software research & development"
"#;

    fn confluence_config() -> ConfluenceConfig {
        ConfluenceConfig {
            base_url: "https://example.atlassian.net/wiki".to_owned(),
            username: "me@example.com".to_owned(),
            api_token: "token".to_owned(),
            space_key: "DOCS".to_owned(),
            parent_page: None,
            math: true,
            titles: HashMap::new(),
        }
    }

    fn jira_config() -> JiraConfig {
        toml::from_str(
            r#"
base_url = "https://example.atlassian.net"
username = "me@example.com"
api_token = "token"
project_key = "PROJ"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.confluence.is_none());
        assert!(config.jira.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(FULL_CONFIG).unwrap();

        let confluence = config.confluence.unwrap();
        assert_eq!(confluence.space_key, "DOCS");
        assert_eq!(confluence.parent_page.as_deref(), Some("Project Documentation"));
        assert!(confluence.math);
        assert_eq!(confluence.title_for("README.md"), Some("Project - Overview"));
        assert_eq!(confluence.title_for("other.md"), None);

        let jira = config.jira.unwrap();
        assert_eq!(jira.project_key, "PROJ");
        assert_eq!(jira.fields.components, vec!["10013"]);
        assert_eq!(jira.fields.category_field.as_deref(), Some("customfield_10033"));
        assert_eq!(
            jira.fields.category.as_deref(),
            Some("Software research & development")
        );
    }

    #[test]
    fn test_jira_defaults() {
        let jira = jira_config();
        assert_eq!(jira.issue_type, "Task");
        assert_eq!(jira.priority, "Medium");
        assert_eq!(jira.estimate_marker, "Estimated Time Frame");
        assert!(jira.fields.components.is_empty());
        assert!(jira.fields.category_field.is_none());
    }

    #[test]
    fn test_confluence_math_can_be_disabled() {
        let config: Config = toml::from_str(
            r#"
[confluence]
base_url = "https://wiki.example.com"
username = "u"
api_token = "t"
space_key = "S"
math = false
"#,
        )
        .unwrap();
        assert!(!config.confluence.unwrap().math);
    }

    #[test]
    fn test_confluence_validate_valid() {
        assert!(confluence_config().validate().is_ok());
    }

    #[test]
    fn test_confluence_validate_empty_token() {
        let config = ConfluenceConfig {
            api_token: String::new(),
            ..confluence_config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("confluence.api_token"));
    }

    #[test]
    fn test_confluence_validate_invalid_url() {
        let config = ConfluenceConfig {
            base_url: "example.atlassian.net".to_owned(),
            ..confluence_config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http:// or https://"));
    }

    #[test]
    fn test_jira_validate_valid() {
        assert!(jira_config().validate().is_ok());
    }

    #[test]
    fn test_jira_validate_empty_project() {
        let jira = JiraConfig {
            project_key: "  ".to_owned(),
            ..jira_config()
        };
        let err = jira.validate().unwrap_err();
        assert!(err.to_string().contains("jira.project_key"));
    }

    #[test]
    fn test_jira_category_requires_field_id() {
        let mut jira = jira_config();
        jira.fields.category = Some("Research".to_owned());
        let err = jira.validate().unwrap_err();
        assert!(err.to_string().contains("category_field"));
    }

    #[test]
    fn test_require_confluence_missing_section() {
        let config = Config::default();
        let err = config.require_confluence().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("[confluence]"));
    }

    #[test]
    fn test_require_jira_missing_section() {
        let err = Config::default().require_jira().unwrap_err();
        assert!(err.to_string().contains("[jira]"));
    }

    #[test]
    fn test_require_jira_returns_validated() {
        let config = Config {
            jira: Some(jira_config()),
            ..Config::default()
        };
        assert_eq!(config.require_jira().unwrap().project_key, "PROJ");
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config: Config = toml::from_str(FULL_CONFIG).unwrap();
        config.apply_cli_settings(&CliSettings {
            parent_page: Some("Other Parent".to_owned()),
            math: Some(false),
            issue_type: Some("Bug".to_owned()),
            priority: None,
            estimate_marker: Some("Effort".to_owned()),
        });

        let confluence = config.confluence.as_ref().unwrap();
        assert_eq!(confluence.parent_page.as_deref(), Some("Other Parent"));
        assert!(!confluence.math);

        let jira = config.jira.as_ref().unwrap();
        assert_eq!(jira.issue_type, "Bug");
        assert_eq!(jira.priority, "Medium"); // Unchanged
        assert_eq!(jira.estimate_marker, "Effort");
    }

    #[test]
    fn test_apply_cli_settings_without_sections() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            math: Some(false),
            ..CliSettings::default()
        });
        assert!(config.confluence.is_none());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDBRIDGE_CFG_CONFLUENCE_TOKEN", "wiki-token");
            std::env::set_var("MDBRIDGE_CFG_JIRA_TOKEN", "jira-token");
        }

        let mut config: Config = toml::from_str(
            r#"
[confluence]
base_url = "https://wiki.example.com"
username = "me"
api_token = "${MDBRIDGE_CFG_CONFLUENCE_TOKEN}"
space_key = "${MDBRIDGE_CFG_SPACE:-DOCS}"

[jira]
base_url = "https://jira.example.com"
username = "me"
api_token = "${MDBRIDGE_CFG_JIRA_TOKEN}"
project_key = "PROJ"
"#,
        )
        .unwrap();
        config.expand_env_vars().unwrap();

        let confluence = config.confluence.as_ref().unwrap();
        assert_eq!(confluence.api_token, "wiki-token");
        assert_eq!(confluence.space_key, "DOCS");
        assert_eq!(config.jira.as_ref().unwrap().api_token, "jira-token");

        unsafe {
            std::env::remove_var("MDBRIDGE_CFG_CONFLUENCE_TOKEN");
            std::env::remove_var("MDBRIDGE_CFG_JIRA_TOKEN");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDBRIDGE_CFG_MISSING");
        }

        let mut config: Config = toml::from_str(
            r#"
[jira]
base_url = "https://jira.example.com"
username = "me"
api_token = "${MDBRIDGE_CFG_MISSING}"
project_key = "PROJ"
"#,
        )
        .unwrap();
        let err = config.expand_env_vars().unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("jira.api_token"));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, FULL_CONFIG).unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.require_confluence().unwrap().space_key, "DOCS");
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[confluence\nbase_url = ").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&config_path, "").unwrap();
        let nested = dir.path().join("docs").join("guides");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(Config::discover_from(&nested), Some(config_path));
    }
}
