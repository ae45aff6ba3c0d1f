// Thin typed wrappers over the backend's JSON payloads.
//
// Resource entities stay opaque `serde_json::Value`s -- the crate only
// imposes shape where the method surface names one (pagination envelopes,
// filter sentinels, the supplementary-read result).

use serde_json::Value;

/// One page of a paginated listing: `{items, total, isLast}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub total: u64,
    pub is_last: bool,
}

impl Page {
    /// Extract a page from a raw response, reading the list out of
    /// `list_field`. Absent fields default to empty/last rather than
    /// propagating nulls to callers.
    pub(crate) fn from_list(value: &Value, list_field: &str) -> Self {
        let items = list_values(value, list_field);
        let total = value
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or_else(|| u64::try_from(items.len()).unwrap_or(u64::MAX));
        let is_last = value.get("isLast").and_then(Value::as_bool).unwrap_or(true);
        Self {
            items,
            total,
            is_last,
        }
    }
}

/// Pull a list field out of a response, defaulting to empty when absent.
pub(crate) fn list_values(value: &Value, field: &str) -> Vec<Value> {
    value
        .get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Assignee filter for board/sprint/backlog issue queries.
///
/// The `All` and `Unassigned` sentinels map to special-case query behavior
/// rather than literal filter values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeFilter {
    /// No filtering -- every issue on the board.
    All,
    /// Issues with no assignee (`assignee is EMPTY`).
    Unassigned,
    /// Issues assigned to the given account id.
    User(String),
}

impl AssigneeFilter {
    /// The JQL fragment for this filter, or `None` for [`All`](Self::All).
    pub(crate) fn jql(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::Unassigned => Some("assignee is EMPTY".to_owned()),
            Self::User(account_id) => Some(format!("assignee = \"{account_id}\"")),
        }
    }
}

/// Result of a supplementary read that degrades to empty on failure.
///
/// `degraded` distinguishes "genuinely empty" from "fetch failed and was
/// papered over" -- the failure itself is logged, not surfaced, because a
/// missing supplementary panel is preferable to blocking the primary view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Supplemental<T> {
    pub data: T,
    pub degraded: bool,
}

impl<T> Supplemental<T> {
    pub(crate) fn loaded(data: T) -> Self {
        Self {
            data,
            degraded: false,
        }
    }

    pub(crate) fn unavailable() -> Self
    where
        T: Default,
    {
        Self {
            data: T::default(),
            degraded: true,
        }
    }
}

/// A user referenced by a leading mention node in a comment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub account_id: String,
    pub display_name: String,
}

/// Simplified input shape for issue creation.
///
/// Assembled into the backend's structured field payload by
/// [`JiraClient::create_issue`](crate::JiraClient::create_issue).
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub summary: String,
    pub issue_type_id: String,
    pub description: Option<String>,
    pub assignee_account_id: Option<String>,
    pub priority_id: Option<String>,
    /// `YYYY-MM-DD`.
    pub due_date: Option<String>,
    /// When set, the created issue is added to this sprint in a best-effort
    /// second call whose failure is logged, never surfaced.
    pub sprint_id: Option<u64>,
}
