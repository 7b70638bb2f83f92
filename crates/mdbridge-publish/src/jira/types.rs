//! Jira issue types.

use serde::Deserialize;

/// Fields for a new issue.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub summary: String,
    /// Description in Jira markup.
    pub description: String,
    pub issue_type: String,
    pub priority: String,
    /// Assignee user name.
    pub assignee: Option<String>,
    /// Parent issue key for child issues.
    pub parent_key: Option<String>,
    /// Component ids.
    pub components: Vec<String>,
    /// Custom field id and value for the issue category.
    pub category: Option<(String, String)>,
}

/// Response to a create-issue request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    /// Issue key (e.g. `PROJ-123`).
    pub key: String,
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,
}
