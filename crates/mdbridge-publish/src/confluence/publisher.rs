//! Create-or-update workflow for Confluence pages.

use std::fmt;

use tracing::{info, warn};

use mdbridge_markup::{WikiOptions, convert_to_wiki_markup};

use super::client::ConfluenceClient;
use super::types::Page;
use crate::error::PublishError;
use crate::lock::KeyedLocks;

/// What publishing did (or would do) to the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishAction {
    Created,
    Updated,
}

impl PublishAction {
    fn for_existing(existing: Option<&Page>) -> Self {
        if existing.is_some() {
            Self::Updated
        } else {
            Self::Created
        }
    }
}

impl fmt::Display for PublishAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

/// Result of publishing a page.
#[derive(Debug)]
pub struct PublishResult {
    pub action: PublishAction,
    pub page_id: String,
    pub title: String,
    /// Version number after publishing.
    pub version: u32,
    pub url: String,
    /// Conversion and resolution warnings.
    pub warnings: Vec<String>,
}

/// Result of a dry run (nothing sent).
#[derive(Debug)]
pub struct DryRunResult {
    /// Action a real publish would take.
    pub action: PublishAction,
    pub title: String,
    /// Converted storage format body.
    pub markup: String,
    /// ID and version of the existing page, if any.
    pub existing: Option<(String, u32)>,
    /// Resolved parent page ID.
    pub parent_id: Option<String>,
    pub warnings: Vec<String>,
}

/// Publishes markdown documents as Confluence pages.
///
/// Publishes to the same title are serialized; a page is looked up by title
/// and updated when it exists, created otherwise.
pub struct PagePublisher<'a> {
    client: &'a ConfluenceClient,
    options: WikiOptions,
    locks: KeyedLocks,
}

impl<'a> PagePublisher<'a> {
    /// Create a new page publisher.
    #[must_use]
    pub fn new(client: &'a ConfluenceClient, options: WikiOptions) -> Self {
        Self {
            client,
            options,
            locks: KeyedLocks::new(),
        }
    }

    /// Convert `markdown` and create or update the page titled `title`.
    ///
    /// A missing parent page is reported as a warning and the page is
    /// created at the space root.
    pub fn publish(
        &self,
        title: &str,
        markdown: &str,
        parent_title: Option<&str>,
    ) -> Result<PublishResult, PublishError> {
        self.locks.with_lock(title, || -> Result<PublishResult, PublishError> {
            let conversion = convert_to_wiki_markup(markdown, &self.options);
            let mut warnings = conversion.warnings;

            let existing = self.client.find_page(title)?;
            let action = PublishAction::for_existing(existing.as_ref());

            let page = if let Some(existing) = existing {
                let current = self.client.get_page(&existing.id)?;
                self.client.update_page(
                    &current.id,
                    title,
                    &conversion.markup,
                    current.version.number,
                )?
            } else {
                let parent_id = self.resolve_parent(parent_title, &mut warnings)?;
                self.client
                    .create_page(title, &conversion.markup, parent_id.as_deref())?
            };

            info!("Page '{}' {} (id {})", title, action, page.id);
            Ok(PublishResult {
                action,
                url: self.client.page_url(&page),
                page_id: page.id,
                title: page.title,
                version: page.version.number,
                warnings,
            })
        })
    }

    /// Convert and resolve without creating or updating anything.
    pub fn dry_run(
        &self,
        title: &str,
        markdown: &str,
        parent_title: Option<&str>,
    ) -> Result<DryRunResult, PublishError> {
        let conversion = convert_to_wiki_markup(markdown, &self.options);
        let mut warnings = conversion.warnings;

        let existing = self.client.find_page(title)?;
        let parent_id = self.resolve_parent(parent_title, &mut warnings)?;

        Ok(DryRunResult {
            action: PublishAction::for_existing(existing.as_ref()),
            title: title.to_owned(),
            markup: conversion.markup,
            existing: existing.map(|page| (page.id, page.version.number)),
            parent_id,
            warnings,
        })
    }

    fn resolve_parent(
        &self,
        parent_title: Option<&str>,
        warnings: &mut Vec<String>,
    ) -> Result<Option<String>, PublishError> {
        let Some(parent_title) = parent_title else {
            return Ok(None);
        };

        if let Some(parent) = self.client.find_page(parent_title)? {
            return Ok(Some(parent.id));
        }

        let warning = parent_not_found(parent_title);
        warn!("{warning}");
        warnings.push(warning);
        Ok(None)
    }
}

fn parent_not_found(parent_title: &str) -> String {
    format!("Parent page '{parent_title}' not found")
}
