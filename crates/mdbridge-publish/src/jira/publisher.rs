//! Comment, update or create workflow for Jira issues.

use std::fmt;
use std::time::Duration;

use tracing::info;

use mdbridge_config::JiraConfig;
use mdbridge_markup::{IssueOptions, convert_to_issue_markup};

use super::client::JiraClient;
use super::types::NewIssue;
use crate::error::PublishError;
use crate::lock::KeyedLocks;

/// Per-publish options supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct IssueRequest {
    /// Existing issue to update or comment on.
    pub issue_key: Option<String>,
    /// Parent issue key for new child issues.
    pub parent_key: Option<String>,
    /// Assignee user name for new issues.
    pub assignee: Option<String>,
    /// Post the document as a comment on `issue_key` instead of updating it.
    pub as_comment: bool,
    /// Estimate that takes precedence over the one found in the document.
    pub time_estimate: Option<Duration>,
}

/// Defaults applied to every new issue.
#[derive(Debug, Clone)]
pub struct IssueDefaults {
    pub issue_type: String,
    pub priority: String,
    pub estimate_marker: String,
    pub components: Vec<String>,
    /// Custom field id and value for the issue category.
    pub category: Option<(String, String)>,
}

impl IssueDefaults {
    /// Defaults from a validated `[jira]` section.
    #[must_use]
    pub fn from_config(config: &JiraConfig) -> Self {
        let category = match (&config.fields.category_field, &config.fields.category) {
            (Some(field), Some(value)) => Some((field.clone(), value.clone())),
            _ => None,
        };
        Self {
            issue_type: config.issue_type.clone(),
            priority: config.priority.clone(),
            estimate_marker: config.estimate_marker.clone(),
            components: config.fields.components.clone(),
            category,
        }
    }
}

/// What publishing did (or would do) to the issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueAction {
    Created,
    Updated,
    Commented,
}

impl IssueAction {
    fn for_request(request: &IssueRequest) -> Self {
        match (&request.issue_key, request.as_comment) {
            (Some(_), true) => Self::Commented,
            (Some(_), false) => Self::Updated,
            (None, _) => Self::Created,
        }
    }
}

impl fmt::Display for IssueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
            Self::Commented => f.write_str("commented on"),
        }
    }
}

/// Result of publishing a document to Jira.
#[derive(Debug)]
pub struct IssuePublishResult {
    pub action: IssueAction,
    pub key: String,
    pub summary: String,
    pub url: String,
    /// Estimate applied to the issue, if any.
    pub estimate: Option<Duration>,
    pub warnings: Vec<String>,
}

/// Result of a dry run (nothing sent).
#[derive(Debug)]
pub struct IssueDryRun {
    pub action: IssueAction,
    pub summary: String,
    /// Converted Jira markup.
    pub body: String,
    pub estimate: Option<Duration>,
    pub warnings: Vec<String>,
}

/// Publishes markdown documents as Jira issues or comments.
pub struct IssuePublisher<'a> {
    client: &'a JiraClient,
    defaults: IssueDefaults,
    locks: KeyedLocks,
}

impl<'a> IssuePublisher<'a> {
    /// Create a new issue publisher.
    #[must_use]
    pub fn new(client: &'a JiraClient, defaults: IssueDefaults) -> Self {
        Self {
            client,
            defaults,
            locks: KeyedLocks::new(),
        }
    }

    /// Convert `markdown` and comment on, update or create an issue.
    ///
    /// With `as_comment` and an issue key the document becomes a comment; with
    /// only a key the issue summary and description are replaced; otherwise a
    /// new issue is created. The estimate is applied after create or update.
    pub fn publish(
        &self,
        markdown: &str,
        request: &IssueRequest,
    ) -> Result<IssuePublishResult, PublishError> {
        let conversion = convert_to_issue_markup(markdown, &self.options());
        let estimate = request.time_estimate.or(conversion.estimate);
        let action = IssueAction::for_request(request);

        let key = match (&request.issue_key, action) {
            (Some(key), IssueAction::Commented) => {
                self.locks.with_lock(key, || {
                    self.client.add_comment(key, &conversion.body).map(|_| ())
                })?;
                key.clone()
            }
            (Some(key), _) => {
                self.locks.with_lock(key, || -> Result<(), PublishError> {
                    self.client
                        .update_issue(key, Some(&conversion.title), Some(&conversion.body))?;
                    self.apply_estimate(key, estimate)
                })?;
                key.clone()
            }
            (None, _) => {
                if let Some(parent) = &request.parent_key {
                    info!("Creating as child of: {}", parent);
                }
                let created = self.client.create_issue(&self.new_issue(
                    &conversion.title,
                    &conversion.body,
                    request,
                ))?;
                self.locks
                    .with_lock(&created.key, || self.apply_estimate(&created.key, estimate))?;
                created.key
            }
        };

        info!("Issue {} {}", key, action);
        Ok(IssuePublishResult {
            action,
            url: self.client.issue_url(&key),
            key,
            summary: conversion.title,
            estimate: if action == IssueAction::Commented {
                None
            } else {
                estimate
            },
            warnings: conversion.warnings,
        })
    }

    /// Convert without sending anything.
    #[must_use]
    pub fn dry_run(&self, markdown: &str, request: &IssueRequest) -> IssueDryRun {
        let conversion = convert_to_issue_markup(markdown, &self.options());
        IssueDryRun {
            action: IssueAction::for_request(request),
            summary: conversion.title,
            body: conversion.body,
            estimate: request.time_estimate.or(conversion.estimate),
            warnings: conversion.warnings,
        }
    }

    fn options(&self) -> IssueOptions {
        IssueOptions {
            estimate_marker: self.defaults.estimate_marker.clone(),
        }
    }

    fn new_issue(&self, summary: &str, description: &str, request: &IssueRequest) -> NewIssue {
        NewIssue {
            summary: summary.to_owned(),
            description: description.to_owned(),
            issue_type: self.defaults.issue_type.clone(),
            priority: self.defaults.priority.clone(),
            assignee: request.assignee.clone(),
            parent_key: request.parent_key.clone(),
            components: self.defaults.components.clone(),
            category: self.defaults.category.clone(),
        }
    }

    fn apply_estimate(&self, key: &str, estimate: Option<Duration>) -> Result<(), PublishError> {
        match estimate {
            Some(duration) if duration.as_secs() > 0 => {
                self.client.update_time_estimate(key, duration.as_secs())
            }
            _ => Ok(()),
        }
    }
}
