//! Environment variable expansion for configuration strings.
//!
//! - `${VAR}` expands to the value of VAR, errors if unset
//! - `${VAR:-default}` expands to VAR if set, otherwise uses default
//!
//! Bare `$VAR` is left alone so tokens and URLs containing `$` survive.

use crate::ConfigError;

/// Expand `${...}` references in a single configuration value.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, lookup)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.cause.0),
        })
}

/// Expand an optional value in place.
pub(crate) fn expand_optional(
    value: &mut Option<String>,
    field: &str,
) -> Result<(), ConfigError> {
    if let Some(inner) = value.as_deref() {
        *value = Some(expand_env(inner, field)?);
    }
    Ok(())
}

/// Variable name that could not be resolved.
struct UnsetVar(String);

fn lookup(var: &str) -> Result<Option<String>, UnsetVar> {
    std::env::var(var)
        .map(Some)
        .map_err(|_| UnsetVar(var.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_token_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDBRIDGE_TEST_TOKEN", "secret-token");
        }
        let result = expand_env("${MDBRIDGE_TEST_TOKEN}", "jira.api_token").unwrap();
        assert_eq!(result, "secret-token");
        unsafe {
            std::env::remove_var("MDBRIDGE_TEST_TOKEN");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDBRIDGE_UNSET_SPACE");
        }
        let result = expand_env("${MDBRIDGE_UNSET_SPACE:-DOCS}", "confluence.space_key").unwrap();
        assert_eq!(result, "DOCS");
    }

    #[test]
    fn test_expand_embedded_in_url() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDBRIDGE_TEST_SITE", "acme");
        }
        let result = expand_env("https://${MDBRIDGE_TEST_SITE}.atlassian.net", "jira.base_url")
            .unwrap();
        assert_eq!(result, "https://acme.atlassian.net");
        unsafe {
            std::env::remove_var("MDBRIDGE_TEST_SITE");
        }
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MDBRIDGE_MISSING_VAR");
        }
        let err = expand_env("${MDBRIDGE_MISSING_VAR}", "confluence.api_token").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MDBRIDGE_MISSING_VAR"));
        assert!(err.to_string().contains("confluence.api_token"));
    }

    #[test]
    fn test_bare_dollar_unchanged() {
        assert_eq!(expand_env("pa$$word", "jira.api_token").unwrap(), "pa$$word");
    }

    #[test]
    fn test_expand_optional() {
        let mut none = None;
        expand_optional(&mut none, "confluence.parent_page").unwrap();
        assert_eq!(none, None);

        let mut literal = Some("Home".to_owned());
        expand_optional(&mut literal, "confluence.parent_page").unwrap();
        assert_eq!(literal.as_deref(), Some("Home"));
    }
}
