//! Epic/parent resolution.
//!
//! Next-gen projects link stories to epics through `parent`; classic projects
//! use the epic link field. Issues with neither fall back to their project so
//! every worklog has a parent for grouping.

use std::collections::HashMap;

use tracing::warn;

use crate::{IssueDetails, JiraClient, ParentInfo, RawWorklog, Result};

/// Issue type name JIRA uses for epics.
pub const EPIC_TYPE: &str = "Epic";

/// Parent type recorded when an issue has no parent at all.
pub const PROJECT_PARENT_TYPE: &str = "Project";

/// Place an issue in the hierarchy without further lookups.
///
/// The epic name is unknown when it comes from the epic link field; use
/// [`IssueResolver`] to fill it.
pub fn resolve_parent(issue: &IssueDetails) -> ParentInfo {
    let mut info = ParentInfo::default();

    if let Some(parent) = &issue.parent {
        info.parent_key = Some(parent.key.clone());
        info.parent_name = Some(parent.summary.clone());
        info.parent_type = parent.issue_type.clone();

        if parent.issue_type.as_deref() == Some(EPIC_TYPE) {
            info.epic_key = Some(parent.key.clone());
            info.epic_name = Some(parent.summary.clone());
        }
    }

    if info.epic_key.is_none() {
        info.epic_key = issue.epic_link.clone();
    }

    if info.parent_key.is_none() {
        if let Some(project_key) = &issue.project_key {
            info.parent_key = Some(project_key.clone());
            info.parent_name = issue.project_name.clone();
            info.parent_type = Some(PROJECT_PARENT_TYPE.to_string());
        }
    }

    info
}

/// Resolves issue keys and hierarchy for worklogs, caching lookups for the
/// lifetime of one sync run.
pub struct IssueResolver<'a> {
    client: &'a JiraClient,
    issues: HashMap<String, Option<IssueDetails>>,
}

impl<'a> IssueResolver<'a> {
    pub fn new(client: &'a JiraClient) -> Self {
        Self {
            client,
            issues: HashMap::new(),
        }
    }

    /// Number of distinct issues looked up so far.
    pub fn lookups(&self) -> usize { self.issues.len() }

    /// Fetch an issue once. Missing or forbidden issues resolve to `None`.
    async fn issue(&mut self, key_or_id: &str) -> Result<Option<IssueDetails>> {
        if let Some(cached) = self.issues.get(key_or_id) {
            return Ok(cached.clone());
        }

        let fetched = match self.client.get_issue(key_or_id).await {
            Ok(issue) => Some(issue),
            Err(e) if matches!(e.status_code(), Some(403 | 404)) => {
                warn!(
                    instance = self.client.instance(),
                    issue = key_or_id,
                    error = %e,
                    "Issue not visible, worklog kept without hierarchy"
                );
                None
            },
            Err(e) => return Err(e),
        };

        self.issues.insert(key_or_id.to_string(), fetched.clone());
        Ok(fetched)
    }

    /// Fill issue key, summary, epic and parent on every worklog.
    pub async fn enrich(&mut self, worklogs: &mut [RawWorklog]) -> Result<()> {
        for worklog in worklogs.iter_mut() {
            let lookup = worklog
                .issue_id
                .clone()
                .unwrap_or_else(|| worklog.issue_key.clone());
            if lookup.is_empty() {
                continue;
            }

            let Some(issue) = self.issue(&lookup).await?
            else {
                continue;
            };

            worklog.issue_key = issue.key.clone();
            worklog.issue_summary = issue.summary.clone();

            let mut parent = resolve_parent(&issue);
            if let (Some(epic_key), None) = (parent.epic_key.clone(), parent.epic_name.as_ref()) {
                parent.epic_name = self.issue(&epic_key).await?.map(|epic| epic.summary);
            }
            worklog.apply_parent(parent);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IssueRef;

    fn issue() -> IssueDetails {
        IssueDetails {
            id: "10010".to_string(),
            key: "ACME-7".to_string(),
            summary: "Fix login".to_string(),
            issue_type: Some("Story".to_string()),
            project_key: Some("ACME".to_string()),
            project_name: Some("Acme Platform".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_epic_parent() {
        let mut story = issue();
        story.parent = Some(IssueRef {
            key:        "ACME-1".to_string(),
            summary:    "Authentication".to_string(),
            issue_type: Some("Epic".to_string()),
        });

        let info = resolve_parent(&story);
        assert_eq!(info.epic_key.as_deref(), Some("ACME-1"));
        assert_eq!(info.epic_name.as_deref(), Some("Authentication"));
        assert_eq!(info.parent_type.as_deref(), Some("Epic"));
    }

    #[test]
    fn test_non_epic_parent_with_epic_link() {
        let mut subtask = issue();
        subtask.parent = Some(IssueRef {
            key:        "ACME-5".to_string(),
            summary:    "Login story".to_string(),
            issue_type: Some("Story".to_string()),
        });
        subtask.epic_link = Some("ACME-1".to_string());

        let info = resolve_parent(&subtask);
        assert_eq!(info.parent_key.as_deref(), Some("ACME-5"));
        assert_eq!(info.parent_type.as_deref(), Some("Story"));
        assert_eq!(info.epic_key.as_deref(), Some("ACME-1"));
        assert!(info.epic_name.is_none());
    }

    #[test]
    fn test_project_fallback() {
        let info = resolve_parent(&issue());
        assert_eq!(info.parent_key.as_deref(), Some("ACME"));
        assert_eq!(info.parent_name.as_deref(), Some("Acme Platform"));
        assert_eq!(info.parent_type.as_deref(), Some("Project"));
        assert!(info.epic_key.is_none());
    }
}
