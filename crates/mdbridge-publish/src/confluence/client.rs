//! Confluence REST API client.

use serde_json::{Value, json};
use tracing::info;

use mdbridge_config::ConfluenceConfig;

use super::types::{Page, PageSearch};
use crate::error::PublishError;
use crate::transport::Transport;

/// Confluence content API client for a single space.
pub struct ConfluenceClient {
    transport: Transport,
    space_key: String,
}

impl ConfluenceClient {
    /// Create a client authenticating with `username:api_token`.
    #[must_use]
    pub fn new(base_url: &str, username: &str, api_token: &str, space_key: &str) -> Self {
        Self {
            transport: Transport::new(base_url, username, api_token),
            space_key: space_key.to_owned(),
        }
    }

    /// Create a client from a validated `[confluence]` section.
    #[must_use]
    pub fn from_config(config: &ConfluenceConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.username,
            &config.api_token,
            &config.space_key,
        )
    }

    /// Space pages are published to.
    #[must_use]
    pub fn space_key(&self) -> &str {
        &self.space_key
    }

    fn api_url(&self) -> String {
        format!("{}/rest/api", self.transport.base_url())
    }

    /// Find a page by exact title in the configured space.
    pub fn find_page(&self, title: &str) -> Result<Option<Page>, PublishError> {
        let url = format!("{}/content", self.api_url());
        info!("Looking up page '{}' in space {}", title, self.space_key);

        let response = self.transport.get(
            &url,
            &[
                ("title", title),
                ("spaceKey", &self.space_key),
                ("expand", "version"),
            ],
        )?;
        let search: PageSearch = response.json()?;
        Ok(search.results.into_iter().next())
    }

    /// Get page by ID with its version expanded.
    pub fn get_page(&self, page_id: &str) -> Result<Page, PublishError> {
        let url = format!("{}/content/{}", self.api_url(), page_id);
        info!("Getting page {}", page_id);

        self.transport.get(&url, &[("expand", "version")])?.json()
    }

    /// Create a page, optionally under a parent page.
    pub fn create_page(
        &self,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<Page, PublishError> {
        let url = format!("{}/content", self.api_url());
        let payload = create_page_payload(&self.space_key, title, body, parent_id);

        info!("Creating page '{}' in space {}", title, self.space_key);
        let page: Page = self.transport.post(&url, &payload)?.json()?;
        info!("Created page {}", page.id);
        Ok(page)
    }

    /// Update existing page (auto-increments version).
    pub fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        version: u32,
    ) -> Result<Page, PublishError> {
        let url = format!("{}/content/{}", self.api_url(), page_id);
        let payload = update_page_payload(title, body, version);

        info!(
            "Updating page {} from version {} to {}",
            page_id,
            version,
            version + 1
        );
        let page: Page = self.transport.put(&url, &payload)?.json()?;
        info!("Updated page {} to version {}", page_id, page.version.number);
        Ok(page)
    }

    /// Web URL for a page.
    #[must_use]
    pub fn page_url(&self, page: &Page) -> String {
        if let Some(links) = &page.links
            && let Some(webui) = &links.webui
        {
            return format!("{}{}", self.transport.base_url(), webui);
        }

        format!(
            "{}/pages/viewpage.action?pageId={}",
            self.transport.base_url(),
            page.id
        )
    }
}

fn storage_body(body: &str) -> Value {
    json!({
        "storage": {
            "value": body,
            "representation": "storage"
        }
    })
}

pub(crate) fn create_page_payload(
    space_key: &str,
    title: &str,
    body: &str,
    parent_id: Option<&str>,
) -> Value {
    let mut payload = json!({
        "type": "page",
        "title": title,
        "space": {"key": space_key},
        "body": storage_body(body)
    });

    if let Some(parent) = parent_id {
        payload["ancestors"] = json!([{"id": parent}]);
    }
    payload
}

pub(crate) fn update_page_payload(title: &str, body: &str, version: u32) -> Value {
    json!({
        "type": "page",
        "title": title,
        "body": storage_body(body),
        "version": {"number": version + 1}
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_payload_with_parent() {
        let payload = create_page_payload("DOCS", "Guide", "<p>Hi</p>", Some("42"));
        assert_eq!(
            payload,
            json!({
                "type": "page",
                "title": "Guide",
                "space": {"key": "DOCS"},
                "body": {"storage": {"value": "<p>Hi</p>", "representation": "storage"}},
                "ancestors": [{"id": "42"}]
            })
        );
    }

    #[test]
    fn test_create_payload_at_space_root() {
        let payload = create_page_payload("DOCS", "Guide", "", None);
        assert!(payload.get("ancestors").is_none());
    }

    #[test]
    fn test_update_payload_increments_version() {
        let payload = update_page_payload("Guide", "<p>v2</p>", 7);
        assert_eq!(payload["version"]["number"], 8);
        assert_eq!(payload["body"]["storage"]["value"], "<p>v2</p>");
        assert_eq!(payload["title"], "Guide");
    }

    #[test]
    fn test_page_url_from_webui_link() {
        let client = ConfluenceClient::new("https://acme.atlassian.net/wiki/", "u", "t", "DOCS");
        let page: Page = serde_json::from_value(json!({
            "id": "5",
            "title": "Guide",
            "_links": {"webui": "/spaces/DOCS/pages/5/Guide"}
        }))
        .unwrap();
        assert_eq!(
            client.page_url(&page),
            "https://acme.atlassian.net/wiki/spaces/DOCS/pages/5/Guide"
        );
    }

    #[test]
    fn test_page_url_fallback() {
        let client = ConfluenceClient::new("https://wiki.example.com", "u", "t", "DOCS");
        let page: Page = serde_json::from_value(json!({"id": "5", "title": "Guide"})).unwrap();
        assert_eq!(
            client.page_url(&page),
            "https://wiki.example.com/pages/viewpage.action?pageId=5"
        );
    }
}
