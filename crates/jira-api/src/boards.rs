// Board endpoints (Agile namespace).

use std::collections::HashSet;

use serde_json::Value;

use crate::cache::CacheClass;
use crate::client::{JiraClient, Namespace, degrade};
use crate::error::Error;
use crate::types::{Page, Supplemental, list_values};

impl JiraClient {
    /// List boards with pagination and an optional name filter.
    ///
    /// `GET /rest/agile/1.0/board` (cached 5 min)
    pub async fn get_boards(
        &self,
        start_at: u64,
        max_results: u32,
        query: Option<&str>,
    ) -> Result<Page, Error> {
        let mut params = vec![
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        if let Some(name) = query {
            params.push(("name", name.to_owned()));
        }

        let value = self
            .cached_get(Namespace::Agile, "board", &params, CacheClass::BoardList)
            .await?;
        Ok(Page::from_list(&value, "values"))
    }

    /// Fetch a single board. A backend 404 resolves to `None`, not an error --
    /// callers probe board ids and fall back rather than failing.
    ///
    /// `GET /rest/agile/1.0/board/{id}` (cached 5 min)
    pub async fn get_board_by_id(&self, board_id: u64) -> Result<Option<Value>, Error> {
        let path = format!("board/{board_id}");
        match self
            .cached_get(Namespace::Agile, &path, &[], CacheClass::BoardList)
            .await
        {
            Ok(value) => Ok(Some((*value).clone())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Issues on a board, most recent first per the board's configured order.
    ///
    /// `GET /rest/agile/1.0/board/{id}/issue` (cached 1 min)
    pub async fn get_board_issues(
        &self,
        board_id: u64,
        max_results: u32,
    ) -> Result<Vec<Value>, Error> {
        let path = format!("board/{board_id}/issue");
        let params = vec![("maxResults", max_results.to_string())];
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

    /// Distinct assignees across a board's issues, deduplicated by account id.
    ///
    /// There is no backend endpoint for this; it is derived from the board's
    /// issues fetched with only the assignee field. Supplementary: failures
    /// degrade to an empty list. (cached 5 min)
    pub async fn get_board_assignees(
        &self,
        board_id: u64,
    ) -> Result<Supplemental<Vec<Value>>, Error> {
        let path = format!("board/{board_id}/issue");
        let params = vec![
            ("fields", "assignee".to_owned()),
            ("maxResults", "100".to_owned()),
        ];

        let result = self
            .cached_get(
                Namespace::Agile,
                &path,
                &params,
                CacheClass::BoardAssignees,
            )
            .await
            .map(|value| {
                let mut seen = HashSet::new();
                let mut users = Vec::new();
                for issue in list_values(&value, "issues") {
                    let Some(assignee) = issue.pointer("/fields/assignee") else {
                        continue;
                    };
                    if let Some(id) = assignee.get("accountId").and_then(Value::as_str) {
                        if seen.insert(id.to_owned()) {
                            users.push(assignee.clone());
                        }
                    }
                }
                users
            });

        degrade("board assignees", result)
    }
}
