//! Jira issue publishing.

mod client;
mod publisher;
mod types;

pub use client::JiraClient;
pub use publisher::{
    IssueAction, IssueDefaults, IssueDryRun, IssuePublishResult, IssuePublisher, IssueRequest,
};
pub use types::{CreatedIssue, NewIssue};
