// jira-api: Async Rust client for the Jira Cloud REST API (Agile + Platform)

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

mod document;

// Resource operations, implemented as inherent methods on `JiraClient`.
mod attachments;
mod boards;
mod comments;
mod issues;
mod meta;
mod sprints;
mod users;

pub use client::JiraClient;
pub use config::JiraConfig;
pub use error::Error;
pub use types::{AssigneeFilter, Mention, NewIssue, Page, Supplemental};
