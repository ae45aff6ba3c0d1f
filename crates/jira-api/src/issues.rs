// Issue endpoints (Platform namespace).

use serde_json::{Value, json};
use tracing::warn;

use crate::cache::CacheClass;
use crate::client::{JiraClient, Namespace, degrade};
use crate::document;
use crate::error::Error;
use crate::types::{NewIssue, Supplemental, list_values};

impl JiraClient {
    /// Full issue detail.
    ///
    /// `GET /rest/api/3/issue/{key}` (cached 2 min)
    pub async fn get_issue_details(&self, issue_key: &str) -> Result<Value, Error> {
        let path = format!("issue/{issue_key}");
        let value = self
            .cached_get(Namespace::Api, &path, &[], CacheClass::IssueDetail)
            .await?;
        Ok((*value).clone())
    }

    /// Merge an arbitrary field map into an issue. Used for priority, type,
    /// due date, story points, summary, description, and sprint changes.
    ///
    /// `PUT /rest/api/3/issue/{key}`
    pub async fn update_issue_field(&self, issue_key: &str, fields: Value) -> Result<(), Error> {
        let session = self.session()?;
        let path = format!("issue/{issue_key}");
        session
            .put_json(Namespace::Api, &path, &json!({ "fields": fields }))
            .await?;
        self.invalidate_issue(issue_key);
        Ok(())
    }

    /// Assign an issue to `account_id`, or unassign with `None`.
    ///
    /// `PUT /rest/api/3/issue/{key}/assignee`
    pub async fn assign_issue(
        &self,
        issue_key: &str,
        account_id: Option<&str>,
    ) -> Result<(), Error> {
        let session = self.session()?;
        let path = format!("issue/{issue_key}/assignee");
        session
            .put_json(Namespace::Api, &path, &json!({ "accountId": account_id }))
            .await?;
        self.invalidate_issue(issue_key);
        Ok(())
    }

    /// Workflow transitions currently available for an issue. Always fetched
    /// fresh -- availability depends on live workflow state.
    ///
    /// `GET /rest/api/3/issue/{key}/transitions` (uncached)
    pub async fn get_available_transitions(&self, issue_key: &str) -> Result<Vec<Value>, Error> {
        let path = format!("issue/{issue_key}/transitions");
        let value = self
            .cached_get(Namespace::Api, &path, &[], CacheClass::Uncached)
            .await?;
        Ok(list_values(&value, "transitions"))
    }

    /// Execute a workflow transition.
    ///
    /// `POST /rest/api/3/issue/{key}/transitions`
    pub async fn transition_issue(
        &self,
        issue_key: &str,
        transition_id: &str,
    ) -> Result<(), Error> {
        let session = self.session()?;
        let path = format!("issue/{issue_key}/transitions");
        session
            .post_json(
                Namespace::Api,
                &path,
                &json!({ "transition": { "id": transition_id } }),
            )
            .await?;
        self.invalidate_issue(issue_key);
        Ok(())
    }

    /// Issue links (blocks, relates-to, ...) read out of the issue's own
    /// fields. Supplementary: failures degrade to an empty list. (uncached)
    pub async fn get_issue_links(&self, issue_key: &str) -> Result<Supplemental<Vec<Value>>, Error> {
        let path = format!("issue/{issue_key}");
        let params = vec![("fields", "issuelinks".to_owned())];
        let result = self
            .cached_get(Namespace::Api, &path, &params, CacheClass::Uncached)
            .await
            .map(|value| {
                value
                    .pointer("/fields/issuelinks")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default()
            });
        degrade("issue links", result)
    }

    /// Remote (web) links attached to an issue. Supplementary. (uncached)
    ///
    /// `GET /rest/api/3/issue/{key}/remotelink`
    pub async fn get_remote_links(
        &self,
        issue_key: &str,
    ) -> Result<Supplemental<Vec<Value>>, Error> {
        let path = format!("issue/{issue_key}/remotelink");
        let result = self
            .cached_get(Namespace::Api, &path, &[], CacheClass::Uncached)
            .await
            .map(|value| value.as_array().cloned().unwrap_or_default());
        degrade("remote links", result)
    }

    /// Create an issue from a simplified input shape.
    ///
    /// When `sprint_id` is set, a second call adds the new issue to that
    /// sprint. That call is best-effort: the creation has already committed,
    /// so its failure is logged and never surfaced.
    ///
    /// `POST /rest/api/3/issue`
    pub async fn create_issue(&self, project_id: &str, input: &NewIssue) -> Result<Value, Error> {
        let session = self.session()?;

        let mut fields = serde_json::Map::new();
        fields.insert("project".into(), json!({ "id": project_id }));
        fields.insert("summary".into(), json!(input.summary));
        fields.insert("issuetype".into(), json!({ "id": input.issue_type_id }));
        if let Some(description) = &input.description {
            fields.insert("description".into(), document::text_document(description));
        }
        if let Some(account_id) = &input.assignee_account_id {
            fields.insert("assignee".into(), json!({ "accountId": account_id }));
        }
        if let Some(priority_id) = &input.priority_id {
            fields.insert("priority".into(), json!({ "id": priority_id }));
        }
        if let Some(due_date) = &input.due_date {
            fields.insert("duedate".into(), json!(due_date));
        }

        let created = session
            .post_json(Namespace::Api, "issue", &json!({ "fields": fields }))
            .await?;
        self.invalidate_boards();

        if let Some(sprint_id) = input.sprint_id {
            if let Some(key) = created.get("key").and_then(Value::as_str) {
                if let Err(e) = self.move_issue_to_sprint(key, Some(sprint_id)).await {
                    warn!("created issue {key} but could not add it to sprint {sprint_id}: {e}");
                }
            }
        }

        Ok(created)
    }
}
