// Sprint endpoints (Agile namespace).

use serde_json::{Value, json};
use tracing::debug;

use crate::cache::CacheClass;
use crate::client::{JiraClient, Namespace};
use crate::error::Error;
use crate::types::{AssigneeFilter, list_values};

impl JiraClient {
    /// All sprints attached to a board.
    ///
    /// A backend 400/404 means the board type does not support sprints
    /// (Kanban) and resolves to an empty list, not an error -- callers pick a
    /// fallback board mode based on this distinction.
    ///
    /// `GET /rest/agile/1.0/board/{id}/sprint` (cached 5 min)
    pub async fn get_sprints_for_board(&self, board_id: u64) -> Result<Vec<Value>, Error> {
        let path = format!("board/{board_id}/sprint");
        match self
            .cached_get(Namespace::Agile, &path, &[], CacheClass::SprintsForBoard)
            .await
        {
            Ok(value) => Ok(list_values(&value, "values")),
            Err(Error::Http {
                status: 400 | 404, ..
            }) => {
                debug!("board {board_id} does not support sprints");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// The currently active sprint on a board, if any.
    ///
    /// `GET /rest/agile/1.0/board/{id}/sprint?state=active` (cached 5 min)
    pub async fn get_active_sprint(&self, board_id: u64) -> Result<Option<Value>, Error> {
        let path = format!("board/{board_id}/sprint");
        let params = vec![("state", "active".to_owned())];
        match self
            .cached_get(
                Namespace::Agile,
                &path,
                &params,
                CacheClass::SprintsForBoard,
            )
            .await
        {
            Ok(value) => Ok(list_values(&value, "values").into_iter().next()),
            Err(Error::Http {
                status: 400 | 404, ..
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Issues in a sprint, optionally filtered by assignee.
    ///
    /// `GET /rest/agile/1.0/board/{board}/sprint/{sprint}/issue` (cached 1 min)
    pub async fn get_sprint_issues(
        &self,
        board_id: u64,
        sprint_id: u64,
        assignee: &AssigneeFilter,
    ) -> Result<Vec<Value>, Error> {
        let path = format!("board/{board_id}/sprint/{sprint_id}/issue");
        let mut params = vec![("maxResults", "100".to_owned())];
        if let Some(jql) = assignee.jql() {
            params.push(("jql", jql));
        }
        let value = self
            .cached_get(
                Namespace::Agile,
                &path,
                &params,
                CacheClass::BoardIssueList,
            )
            .await?;
        Ok(list_values(&value, "issues"))
    }

    /// Backlog issues for a board, optionally filtered by assignee.
    ///
    /// `GET /rest/agile/1.0/board/{id}/backlog` (cached 1 min)
    pub async fn get_backlog_issues(
        &self,
        board_id: u64,
        assignee: &AssigneeFilter,
    ) -> Result<Vec<Value>, Error> {
        let path = format!("board/{board_id}/backlog");
        let mut params = vec![("maxResults", "100".to_owned())];
        if let Some(jql) = assignee.jql() {
            params.push(("jql", jql));
        }
        let value = self
            .cached_get(
                Namespace::Agile,
                &path,
                &params,
                CacheClass::BoardIssueList,
            )
            .await?;
        Ok(list_values(&value, "issues"))
    }

    /// Close a sprint.
    ///
    /// `POST /rest/agile/1.0/sprint/{id}` with `state=closed`
    pub async fn complete_sprint(&self, sprint_id: u64) -> Result<(), Error> {
        let session = self.session()?;
        let path = format!("sprint/{sprint_id}");
        session
            .post_json(Namespace::Agile, &path, &json!({ "state": "closed" }))
            .await?;
        self.invalidate_sprints();
        Ok(())
    }

    /// Move an issue into a sprint, or to the backlog when `sprint_id` is
    /// `None` (clears the sprint field directly instead of calling a
    /// sprint-add endpoint).
    pub async fn move_issue_to_sprint(
        &self,
        issue_key: &str,
        sprint_id: Option<u64>,
    ) -> Result<(), Error> {
        let session = self.session()?;
        match sprint_id {
            Some(id) => {
                let path = format!("sprint/{id}/issue");
                session
                    .post_json(
                        Namespace::Agile,
                        &path,
                        &json!({ "issues": [issue_key] }),
                    )
                    .await?;
            }
            None => {
                let path = format!("issue/{issue_key}");
                session
                    .put_json(
                        Namespace::Api,
                        &path,
                        &json!({ "fields": { "sprint": null } }),
                    )
                    .await?;
            }
        }
        self.invalidate_sprints();
        self.invalidate_issue(issue_key);
        Ok(())
    }
}
