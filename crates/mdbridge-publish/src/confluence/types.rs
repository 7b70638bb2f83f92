//! Confluence content types.

use serde::Deserialize;

/// Confluence page.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    /// Page ID.
    pub id: String,
    /// Page title.
    pub title: String,
    /// Version information (present when expanded).
    #[serde(default)]
    pub version: Version,
    /// Hypermedia links.
    #[serde(rename = "_links", default)]
    pub links: Option<Links>,
}

/// Page version.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Version {
    /// Version number.
    pub number: u32,
}

/// Hypermedia links.
#[derive(Debug, Clone, Deserialize)]
pub struct Links {
    /// Web UI link, relative to the site.
    #[serde(default)]
    pub webui: Option<String>,
}

/// Result list of a content search.
#[derive(Debug, Deserialize)]
pub struct PageSearch {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub size: usize,
}
