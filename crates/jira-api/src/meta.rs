// Project metadata endpoints (Platform namespace): issue types, priorities.

use serde_json::Value;

use crate::cache::CacheClass;
use crate::client::{JiraClient, Namespace, degrade};
use crate::error::Error;
use crate::types::{Supplemental, list_values};

impl JiraClient {
    /// Issue types available in a project, read from the project resource.
    /// Supplementary: failures degrade to an empty list.
    ///
    /// `GET /rest/api/3/project/{key}` (cached 5 min)
    pub async fn get_project_issue_types(
        &self,
        project_key: &str,
    ) -> Result<Supplemental<Vec<Value>>, Error> {
        let path = format!("project/{project_key}");
        let result = self
            .cached_get(Namespace::Api, &path, &[], CacheClass::ProjectIssueTypes)
            .await
            .map(|value| list_values(&value, "issueTypes"));
        degrade("project issue types", result)
    }

    /// The site-wide priority list. Changes rarely. Supplementary.
    ///
    /// `GET /rest/api/3/priority` (cached 30 min)
    pub async fn get_priorities(&self) -> Result<Supplemental<Vec<Value>>, Error> {
        let result = self
            .cached_get(Namespace::Api, "priority", &[], CacheClass::Priorities)
            .await
            .map(|value| value.as_array().cloned().unwrap_or_default());
        degrade("priorities", result)
    }
}
