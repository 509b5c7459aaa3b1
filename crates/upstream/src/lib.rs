//! Paginated HTTP accessors for the two upstream systems: the issue
//! tracker (boards, sprints, issues) and the source-control host
//! (repositories, commits, pull requests, reviews, members). Both clients
//! share the same request path: per-query TTL cache, retry with backoff,
//! and a stale-cache fallback when the upstream answers with a server
//! error on a previously seen query.

pub mod error;
mod fetch;
pub mod github;
pub mod jira;

pub use error::{UpstreamError, UpstreamErrorKind};
pub use github::client::{GitHubClient, GitHubConfig};
pub use jira::client::{JiraClient, JiraConfig};
