//! Jira REST API (v2) client.

use serde_json::{Value, json};
use tracing::{debug, info};

use mdbridge_config::JiraConfig;

use super::types::{CreatedIssue, NewIssue};
use crate::error::PublishError;
use crate::transport::Transport;

/// Jira issue API client for a single project.
pub struct JiraClient {
    transport: Transport,
    project_key: String,
}

impl JiraClient {
    /// Create a client authenticating with `username:api_token`.
    #[must_use]
    pub fn new(base_url: &str, username: &str, api_token: &str, project_key: &str) -> Self {
        Self {
            transport: Transport::new(base_url, username, api_token),
            project_key: project_key.to_owned(),
        }
    }

    /// Create a client from a validated `[jira]` section.
    #[must_use]
    pub fn from_config(config: &JiraConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.username,
            &config.api_token,
            &config.project_key,
        )
    }

    /// Project new issues are created in.
    #[must_use]
    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    fn issue_api_url(&self) -> String {
        format!("{}/rest/api/2/issue", self.transport.base_url())
    }

    /// Create a new issue in the configured project.
    pub fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, PublishError> {
        let payload = create_issue_payload(&self.project_key, issue);
        info!("Creating issue '{}' in project {}", issue.summary, self.project_key);

        let created: CreatedIssue = self.transport.post(&self.issue_api_url(), &payload)?.json()?;
        info!("Created issue {}", created.key);
        Ok(created)
    }

    /// Update summary and/or description of an existing issue.
    ///
    /// `None` and empty values are left untouched.
    pub fn update_issue(
        &self,
        issue_key: &str,
        summary: Option<&str>,
        description: Option<&str>,
    ) -> Result<Value, PublishError> {
        let url = format!("{}/{}", self.issue_api_url(), issue_key);
        let payload = update_issue_payload(summary, description);
        info!("Updating issue {}", issue_key);

        Ok(self.transport.put(&url, &payload)?.json_or_empty())
    }

    /// Add a comment to an existing issue.
    pub fn add_comment(&self, issue_key: &str, body: &str) -> Result<Value, PublishError> {
        let url = format!("{}/{}/comment", self.issue_api_url(), issue_key);
        info!("Adding comment to issue {}", issue_key);

        Ok(self.transport.post(&url, &json!({"body": body}))?.json_or_empty())
    }

    /// Set the original time estimate of an issue.
    pub fn update_time_estimate(&self, issue_key: &str, seconds: u64) -> Result<(), PublishError> {
        let url = format!("{}/{}", self.issue_api_url(), issue_key);
        debug!("Updating time estimate for {} to {}s", issue_key, seconds);

        let response = self.transport.put(&url, &time_estimate_payload(seconds))?;
        if response.status == 204 {
            info!("Time estimate updated for {}", issue_key);
        } else {
            debug!(
                "Unexpected status {} updating time estimate: {}",
                response.status, response.body
            );
        }
        Ok(())
    }

    /// Browser URL for an issue.
    #[must_use]
    pub fn issue_url(&self, issue_key: &str) -> String {
        format!("{}/browse/{}", self.transport.base_url(), issue_key)
    }
}

pub(crate) fn create_issue_payload(project_key: &str, issue: &NewIssue) -> Value {
    let mut payload = json!({
        "fields": {
            "project": {"key": project_key},
            "summary": issue.summary,
            "description": issue.description,
            "issuetype": {"name": issue.issue_type},
            "priority": {"name": issue.priority}
        }
    });
    let fields = &mut payload["fields"];

    if !issue.components.is_empty() {
        fields["components"] = issue
            .components
            .iter()
            .map(|id| json!({"id": id}))
            .collect();
    }
    if let Some((field, value)) = &issue.category {
        fields[field.as_str()] = json!({"value": value});
    }
    if let Some(assignee) = &issue.assignee {
        fields["assignee"] = json!({"name": assignee});
    }
    if let Some(parent) = &issue.parent_key {
        fields["parent"] = json!({"key": parent});
    }
    payload
}

pub(crate) fn update_issue_payload(summary: Option<&str>, description: Option<&str>) -> Value {
    let mut fields = serde_json::Map::new();
    if let Some(summary) = summary.filter(|s| !s.is_empty()) {
        fields.insert("summary".to_owned(), json!(summary));
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        fields.insert("description".to_owned(), json!(description));
    }
    json!({ "fields": fields })
}

pub(crate) fn time_estimate_payload(seconds: u64) -> Value {
    json!({
        "fields": {
            "timetracking": {
                "originalEstimate": format!("{seconds}s")
            }
        }
    })
}
