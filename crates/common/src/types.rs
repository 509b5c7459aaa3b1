use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VeloError, VeloResult};

/// Issue status treated as complete even when no resolution date is set.
pub const DONE_STATUS: &str = "Done";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub instance_id: Uuid,
}

impl ServiceInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            instance_id: Uuid::new_v4(),
        }
    }
}

/// A team as known to the issue tracker: one agile board per team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub board_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintState {
    Active,
    Closed,
    Future,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    pub id: u64,
    pub name: String,
    pub state: SprintState,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub board_id: Option<u64>,
}

/// Validated story-point estimate. Upstream data occasionally carries
/// negative or garbage values in the custom field; those are rejected here
/// instead of flowing into sums.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryPoints(f64);

impl StoryPoints {
    pub fn new(value: f64) -> VeloResult<Self> {
        if !value.is_finite() {
            return Err(VeloError::Validation(format!(
                "story points must be a finite number, got {value}"
            )));
        }
        if value < 0.0 {
            return Err(VeloError::Validation(format!(
                "story points must be non-negative, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueAssignee {
    pub account_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub summary: String,
    pub status: String,
    pub story_points: Option<StoryPoints>,
    pub assignee: Option<IssueAssignee>,
    pub board_id: Option<u64>,
    pub sprint_id: Option<u64>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// An issue counts as completed when its status is the done marker or
    /// the tracker recorded a resolution date.
    pub fn is_completed(&self) -> bool {
        self.status == DONE_STATUS || self.resolved_at.is_some()
    }

    /// Story points with a missing estimate counted as zero.
    pub fn story_point_value(&self) -> f64 {
        self.story_points.map(StoryPoints::value).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub author_login: Option<String>,
    pub message: String,
    pub authored_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestStatus {
    Open,
    Closed,
    Merged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub author_login: Option<String>,
    pub status: PullRequestStatus,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub repository: String,
}

impl PullRequest {
    /// Hours from creation to merge; `None` for anything not merged.
    pub fn time_to_merge_hours(&self) -> Option<f64> {
        self.merged_at
            .map(|merged| (merged - self.created_at).num_seconds() as f64 / 3600.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeReview {
    pub id: u64,
    pub reviewer_login: Option<String>,
    pub state: ReviewState,
    pub submitted_at: Option<DateTime<Utc>>,
}
