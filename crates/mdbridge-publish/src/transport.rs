//! Blocking HTTP transport shared by the Confluence and Jira clients.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use ureq::Agent;

use crate::error::PublishError;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Authenticated JSON transport against one base URL.
pub(crate) struct Transport {
    agent: Agent,
    base_url: String,
    authorization: String,
}

impl Transport {
    pub(crate) fn new(base_url: &str, username: &str, api_token: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            authorization: basic_auth(username, api_token),
        }
    }

    /// Base URL without trailing slash.
    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a GET request with query parameters.
    pub(crate) fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<RawResponse, PublishError> {
        let mut request = self
            .agent
            .get(url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json");
        for (key, value) in query {
            request = request.query(*key, *value);
        }

        let response = request.call()?;
        read_response(response)
    }

    /// Send a POST request with a JSON payload.
    pub(crate) fn post(&self, url: &str, payload: &Value) -> Result<RawResponse, PublishError> {
        let payload_bytes = serde_json::to_vec(payload)?;
        debug!("POST {url}: {payload}");

        let response = self
            .agent
            .post(url)
            .header("Authorization", &self.authorization)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;
        read_response(response)
    }

    /// Send a PUT request with a JSON payload.
    pub(crate) fn put(&self, url: &str, payload: &Value) -> Result<RawResponse, PublishError> {
        let payload_bytes = serde_json::to_vec(payload)?;
        debug!("PUT {url}: {payload}");

        let response = self
            .agent
            .put(url)
            .header("Authorization", &self.authorization)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;
        read_response(response)
    }
}

/// Successful response with its body read to a string.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Decode the body into a typed value.
    pub(crate) fn json<T: DeserializeOwned>(&self) -> Result<T, PublishError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Decode the body leniently.
    ///
    /// No-content statuses, empty bodies and unparseable bodies yield an empty object.
    pub(crate) fn json_or_empty(&self) -> Value {
        if matches!(self.status, 204 | 205) || self.body.trim().is_empty() {
            debug!("Response {}: no content to parse", self.status);
            return Value::Object(serde_json::Map::new());
        }
        serde_json::from_str(&self.body).unwrap_or_else(|e| {
            warn!("Failed to parse JSON response: {e}");
            debug!("Response content: {}", self.body);
            Value::Object(serde_json::Map::new())
        })
    }
}

fn read_response(response: ureq::http::Response<ureq::Body>) -> Result<RawResponse, PublishError> {
    let status = response.status().as_u16();
    let mut body_reader = response.into_body();

    if status >= 400 {
        let error_body = body_reader
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(PublishError::HttpResponse {
            status,
            body: error_body,
        });
    }

    Ok(RawResponse {
        status,
        body: body_reader.read_to_string()?,
    })
}

/// `Authorization` header value for HTTP basic authentication.
pub(crate) fn basic_auth(username: &str, api_token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{api_token}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.to_owned(),
        }
    }

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(
            basic_auth("me@example.com", "token"),
            "Basic bWVAZXhhbXBsZS5jb206dG9rZW4="
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = Transport::new("https://example.atlassian.net/wiki/", "u", "t");
        assert_eq!(transport.base_url(), "https://example.atlassian.net/wiki");
    }

    #[test]
    fn test_json_or_empty_no_content() {
        assert_eq!(response(204, "").json_or_empty(), json!({}));
        assert_eq!(response(205, "ignored").json_or_empty(), json!({}));
        assert_eq!(response(200, "  \n").json_or_empty(), json!({}));
    }

    #[test]
    fn test_json_or_empty_created_keeps_body() {
        let decoded = response(201, r#"{"id":"10001","key":"PROJ-7"}"#).json_or_empty();
        assert_eq!(decoded["key"], "PROJ-7");
    }

    #[test]
    fn test_json_or_empty_invalid_json() {
        assert_eq!(response(200, "<html>").json_or_empty(), json!({}));
    }

    #[test]
    fn test_typed_json_error() {
        let result: Result<Value, _> = response(200, "not json").json();
        assert!(matches!(result, Err(PublishError::Json(_))));
    }
}
