use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use velo_common::types::Repository;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberCompletionStats {
    pub account_id: String,
    pub display_name: String,
    pub total_story_points: f64,
    pub completed_story_points: f64,
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionStats {
    pub team_id: String,
    pub team_name: String,
    pub sprint_id: Option<u64>,
    pub sprint_name: Option<String>,
    pub total_story_points: f64,
    pub completed_story_points: f64,
    pub completion_percentage: f64,
    /// Per-assignee breakdown in first-appearance order. Unassigned issues
    /// count toward the team totals only.
    pub members: Vec<MemberCompletionStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GitMetrics {
    pub commit_count: usize,
    pub pr_count: usize,
    pub merged_pr_count: usize,
    pub avg_pr_time_to_merge_hours: f64,
    pub review_count: usize,
    pub avg_review_response_hours: f64,
    pub lines_added: u64,
    pub lines_removed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberGitMetrics {
    pub login: String,
    #[serde(flatten)]
    pub metrics: GitMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamGitMetrics {
    pub team_id: String,
    pub team_name: String,
    pub totals: GitMetrics,
    pub members: Vec<MemberGitMetrics>,
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightTarget {
    Team,
    Member,
    Organization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Positive,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationInsight {
    pub id: Uuid,
    pub target_type: InsightTarget,
    pub target_id: String,
    pub target_name: String,
    pub message: String,
    pub metric_name: String,
    pub metric_value: f64,
    pub trend: Trend,
    pub trend_percentage: Option<f64>,
    pub severity: Severity,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TeamCorrelation {
    pub story_point_to_commit_ratio: f64,
    pub planning_accuracy: f64,
    pub velocity: f64,
    pub consistency: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemberCorrelation {
    pub story_point_to_commit_ratio: f64,
    pub review_quality: f64,
    pub contribution: f64,
    pub velocity_index: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegratedTeamMetrics {
    pub team_id: String,
    pub team_name: String,
    pub completion: CompletionStats,
    pub git: TeamGitMetrics,
    pub correlation: TeamCorrelation,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegratedMemberMetrics {
    pub member_id: String,
    pub display_name: String,
    pub completion: MemberCompletionStats,
    pub git: GitMetrics,
    pub correlation: MemberCorrelation,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewMetrics {
    pub team_count: usize,
    pub total_story_points: f64,
    pub completed_story_points: f64,
    pub completion_percentage: f64,
    pub total_commits: usize,
    pub total_pull_requests: usize,
    pub total_reviews: usize,
    /// Distinct member identifiers across all teams' member stats, so one
    /// person on two teams counts once.
    pub active_members: usize,
}

/// Post-synthesis filtering requested by the caller. Filtering and
/// truncation never reorder the generated insights.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightFilter {
    pub severity: Option<Severity>,
    pub limit: Option<usize>,
}

impl InsightFilter {
    pub fn apply(&self, insights: Vec<CorrelationInsight>) -> Vec<CorrelationInsight> {
        let mut out: Vec<CorrelationInsight> = match self.severity {
            Some(severity) => insights
                .into_iter()
                .filter(|insight| insight.severity == severity)
                .collect(),
            None => insights,
        };
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}
