// Comment endpoints (Platform namespace).
//
// Comment bodies are ADF documents built in `document`; threading uses the
// backend's `parentId` reference.

use serde_json::{Value, json};

use crate::cache::CacheClass;
use crate::client::{JiraClient, Namespace};
use crate::document;
use crate::error::Error;
use crate::types::{Mention, list_values};

impl JiraClient {
    /// All comments on an issue. Always fetched fresh.
    ///
    /// `GET /rest/api/3/issue/{key}/comment` (uncached)
    pub async fn get_issue_comments(&self, issue_key: &str) -> Result<Vec<Value>, Error> {
        let path = format!("issue/{issue_key}/comment");
        let value = self
            .cached_get(Namespace::Api, &path, &[], CacheClass::Uncached)
            .await?;
        Ok(list_values(&value, "comments"))
    }

    /// Add a comment, optionally as a threaded reply (`parent_id`) and with
    /// an optional leading mention node.
    ///
    /// `POST /rest/api/3/issue/{key}/comment`
    pub async fn add_comment(
        &self,
        issue_key: &str,
        text: &str,
        parent_id: Option<&str>,
        mention: Option<&Mention>,
    ) -> Result<Value, Error> {
        let session = self.session()?;
        let path = format!("issue/{issue_key}/comment");

        let mut body = json!({ "body": document::comment_document(text, mention) });
        if let Some(parent) = parent_id {
            body["parentId"] = json!(parent);
        }

        let created = session.post_json(Namespace::Api, &path, &body).await?;
        self.invalidate_issue(issue_key);
        Ok(created)
    }

    /// Replace a comment's body.
    ///
    /// `PUT /rest/api/3/issue/{key}/comment/{id}`
    pub async fn update_comment(
        &self,
        issue_key: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<Value, Error> {
        let session = self.session()?;
        let path = format!("issue/{issue_key}/comment/{comment_id}");
        let body = json!({ "body": document::comment_document(text, None) });

        let updated = session.put_json(Namespace::Api, &path, &body).await?;
        self.invalidate_issue(issue_key);
        Ok(updated)
    }

    /// Delete a comment.
    ///
    /// `DELETE /rest/api/3/issue/{key}/comment/{id}`
    pub async fn delete_comment(&self, issue_key: &str, comment_id: &str) -> Result<(), Error> {
        let session = self.session()?;
        let path = format!("issue/{issue_key}/comment/{comment_id}");
        session.delete(Namespace::Api, &path).await?;
        self.invalidate_issue(issue_key);
        Ok(())
    }
}
