use secrecy::SecretString;

/// Connection settings for a Jira Cloud site.
///
/// Resolved by an external collaborator (secure storage, env, prompt) and
/// handed in fully formed -- this crate never reads or writes credential
/// stores itself. Basic auth only; OAuth and token refresh are out of scope.
#[derive(Debug, Clone)]
pub struct JiraConfig {
    /// Site root, e.g. `https://example.atlassian.net`.
    pub base_url: String,
    /// Account email (the basic-auth identity).
    pub email: String,
    /// API token (the basic-auth secret). Never logged.
    pub api_token: SecretString,
}
