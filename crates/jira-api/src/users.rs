// User endpoints (Platform namespace).

use serde_json::Value;

use crate::cache::CacheClass;
use crate::client::{JiraClient, Namespace, degrade};
use crate::error::Error;
use crate::types::Supplemental;

impl JiraClient {
    /// Users assignable to a specific issue, optionally filtered by a search
    /// string. Supplementary: failures degrade to an empty list. (uncached)
    ///
    /// `GET /rest/api/3/user/assignable/search?issueKey=...`
    pub async fn get_assignable_users(
        &self,
        issue_key: &str,
        query: Option<&str>,
    ) -> Result<Supplemental<Vec<Value>>, Error> {
        let mut params = vec![("issueKey", issue_key.to_owned())];
        if let Some(q) = query {
            params.push(("query", q.to_owned()));
        }
        let result = self
            .cached_get(
                Namespace::Api,
                "user/assignable/search",
                &params,
                CacheClass::Uncached,
            )
            .await
            .map(|value| value.as_array().cloned().unwrap_or_default());
        degrade("assignable users", result)
    }

    /// Users assignable within a project (used before an issue exists, e.g.
    /// on the create form). Supplementary. (uncached)
    ///
    /// `GET /rest/api/3/user/assignable/search?project=...`
    pub async fn get_assignable_users_for_project(
        &self,
        project_key: &str,
        query: Option<&str>,
    ) -> Result<Supplemental<Vec<Value>>, Error> {
        let mut params = vec![("project", project_key.to_owned())];
        if let Some(q) = query {
            params.push(("query", q.to_owned()));
        }
        let result = self
            .cached_get(
                Namespace::Api,
                "user/assignable/search",
                &params,
                CacheClass::Uncached,
            )
            .await
            .map(|value| value.as_array().cloned().unwrap_or_default());
        degrade("assignable users for project", result)
    }

    /// The authenticated user. Always fetched fresh.
    ///
    /// `GET /rest/api/3/myself` (uncached)
    pub async fn get_current_user(&self) -> Result<Value, Error> {
        let value = self
            .cached_get(Namespace::Api, "myself", &[], CacheClass::Uncached)
            .await?;
        Ok((*value).clone())
    }
}
