use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use velo_common::error::VeloResult;

use crate::activity::ActivityMetricsService;
use crate::completion::{completion_percentage, CompletionAnalyticsService};
use crate::models::{
    CompletionStats, CorrelationInsight, GitMetrics, InsightFilter, InsightTarget,
    IntegratedMemberMetrics, IntegratedTeamMetrics, MemberCompletionStats, MemberCorrelation,
    OverviewMetrics, Severity, TeamCorrelation, TeamGitMetrics, Trend,
};

// Insight thresholds
const TEAM_COMPLETION_WARNING_BELOW: f64 = 70.0;
const RATIO_ESTIMATION_FLAG_ABOVE: f64 = 5.0;
const MEMBER_COMPLETION_WARNING_BELOW: f64 = 60.0;
const MEMBER_CONTRIBUTION_POSITIVE_ABOVE: f64 = 0.8;

/// Commits per story point; 0 for a scope with no story points.
pub fn story_point_to_commit_ratio(total_story_points: f64, commit_count: usize) -> f64 {
    if total_story_points <= 0.0 {
        0.0
    } else {
        commit_count as f64 / total_story_points
    }
}

/// Coarse three-bucket consistency from planning accuracy. A deliberate
/// simplification, not a statistical measure over sprint history.
pub fn consistency_score(planning_accuracy: f64) -> f64 {
    if planning_accuracy > 80.0 {
        0.8
    } else if planning_accuracy > 60.0 {
        0.6
    } else {
        0.4
    }
}

pub fn contribution_score(commit_count: usize) -> f64 {
    if commit_count > 20 {
        0.9
    } else if commit_count > 10 {
        0.7
    } else {
        0.5
    }
}

pub fn velocity_index_score(completed_story_points: f64) -> f64 {
    if completed_story_points > 15.0 {
        0.9
    } else if completed_story_points > 8.0 {
        0.7
    } else {
        0.5
    }
}

pub fn team_correlation(stats: &CompletionStats, git: &GitMetrics) -> TeamCorrelation {
    let planning_accuracy =
        completion_percentage(stats.completed_story_points, stats.total_story_points);
    TeamCorrelation {
        story_point_to_commit_ratio: story_point_to_commit_ratio(
            stats.total_story_points,
            git.commit_count,
        ),
        planning_accuracy,
        velocity: stats.completed_story_points,
        consistency: consistency_score(planning_accuracy),
    }
}

pub fn member_correlation(
    completion: &MemberCompletionStats,
    git: &GitMetrics,
) -> MemberCorrelation {
    MemberCorrelation {
        story_point_to_commit_ratio: story_point_to_commit_ratio(
            completion.total_story_points,
            git.commit_count,
        ),
        // Review quality shares the commit-count buckets; the list
        // endpoints expose no finer review signal per member
        review_quality: contribution_score(git.commit_count),
        contribution: contribution_score(git.commit_count),
        velocity_index: velocity_index_score(completion.completed_story_points),
    }
}

/// Threshold-triggered insight synthesis for one team. Pure over its
/// inputs; a healthy team yields an empty vec, never a placeholder card.
///
/// Generation order is fixed: team completion, team ratio, member
/// completion warnings, member contribution highlights.
pub fn generate_team_insights(
    stats: &CompletionStats,
    git: &TeamGitMetrics,
    now: DateTime<Utc>,
) -> Vec<CorrelationInsight> {
    let mut insights = Vec::new();
    let correlation = team_correlation(stats, &git.totals);

    if stats.completion_percentage < TEAM_COMPLETION_WARNING_BELOW {
        insights.push(CorrelationInsight {
            id: Uuid::new_v4(),
            target_type: InsightTarget::Team,
            target_id: stats.team_id.clone(),
            target_name: stats.team_name.clone(),
            message: format!(
                "Team {} completed {:.1}% of committed story points, below the 70% target",
                stats.team_name, stats.completion_percentage
            ),
            metric_name: "Completion Rate".to_owned(),
            metric_value: stats.completion_percentage,
            trend: Trend::Down,
            trend_percentage: None,
            severity: Severity::Warning,
            generated_at: now,
        });
    }

    if correlation.story_point_to_commit_ratio > RATIO_ESTIMATION_FLAG_ABOVE {
        insights.push(CorrelationInsight {
            id: Uuid::new_v4(),
            target_type: InsightTarget::Team,
            target_id: stats.team_id.clone(),
            target_name: stats.team_name.clone(),
            message: format!(
                "Team {} averages {:.1} commits per story point, which may point to an estimation process issue",
                stats.team_name, correlation.story_point_to_commit_ratio
            ),
            metric_name: "Story Point to Commit Ratio".to_owned(),
            metric_value: correlation.story_point_to_commit_ratio,
            trend: Trend::Stable,
            trend_percentage: None,
            severity: Severity::Info,
            generated_at: now,
        });
    }

    for member in &stats.members {
        if member.completion_percentage < MEMBER_COMPLETION_WARNING_BELOW {
            insights.push(CorrelationInsight {
                id: Uuid::new_v4(),
                target_type: InsightTarget::Member,
                target_id: member.account_id.clone(),
                target_name: member.display_name.clone(),
                message: format!(
                    "{} completed {:.1}% of assigned story points this period",
                    member.display_name, member.completion_percentage
                ),
                metric_name: "Completion Rate".to_owned(),
                metric_value: member.completion_percentage,
                trend: Trend::Down,
                trend_percentage: None,
                severity: Severity::Warning,
                generated_at: now,
            });
        }
    }

    for member in &git.members {
        let contribution = contribution_score(member.metrics.commit_count);
        if contribution > MEMBER_CONTRIBUTION_POSITIVE_ABOVE {
            insights.push(CorrelationInsight {
                id: Uuid::new_v4(),
                target_type: InsightTarget::Member,
                target_id: member.login.clone(),
                target_name: member.login.clone(),
                message: format!(
                    "{} is a top contributor with {} commits and {} pull requests",
                    member.login, member.metrics.commit_count, member.metrics.pr_count
                ),
                metric_name: "Contribution".to_owned(),
                metric_value: contribution,
                trend: Trend::Up,
                trend_percentage: None,
                severity: Severity::Positive,
                generated_at: now,
            });
        }
    }

    insights
}

/// Merges completion and activity views of the same target into derived
/// indicators, insight cards, and the org-wide overview.
pub struct CorrelationEngine {
    completion: Arc<CompletionAnalyticsService>,
    activity: Arc<ActivityMetricsService>,
}

impl CorrelationEngine {
    pub fn new(
        completion: Arc<CompletionAnalyticsService>,
        activity: Arc<ActivityMetricsService>,
    ) -> Self {
        Self {
            completion,
            activity,
        }
    }

    pub async fn get_integrated_team_metrics(
        &self,
        team_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<IntegratedTeamMetrics> {
        let team = self.completion.get_team(team_id).await?;
        let stats = self
            .completion
            .get_team_completion_stats(team_id, None, start, end)
            .await?;
        let git = self.activity.get_team_git_metrics(&team, start, end).await?;
        let correlation = team_correlation(&stats, &git.totals);

        Ok(IntegratedTeamMetrics {
            team_id: team.id,
            team_name: team.name,
            completion: stats,
            git,
            correlation,
        })
    }

    /// One identifier serves as tracker account id and git author login;
    /// there is no cross-source identity matching.
    pub async fn get_integrated_member_metrics(
        &self,
        member_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<IntegratedMemberMetrics> {
        let completion = self
            .completion
            .get_member_completion_stats(member_id, start, end)
            .await?;
        let git = self.activity.get_member_git_metrics(member_id, start, end).await?;
        let correlation = member_correlation(&completion, &git);

        Ok(IntegratedMemberMetrics {
            member_id: member_id.to_owned(),
            display_name: completion.display_name.clone(),
            completion,
            git,
            correlation,
        })
    }

    pub async fn get_insights(
        &self,
        team_id: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        filter: &InsightFilter,
    ) -> VeloResult<Vec<CorrelationInsight>> {
        let teams = match team_id {
            Some(id) => vec![self.completion.get_team(id).await?],
            None => self.completion.list_teams().await?,
        };

        let now = Utc::now();
        let mut insights = Vec::new();
        for team in &teams {
            let stats = self
                .completion
                .get_team_completion_stats(&team.id, None, start, end)
                .await?;
            let git = self.activity.get_team_git_metrics(team, start, end).await?;
            insights.extend(generate_team_insights(&stats, &git, now));
        }

        Ok(filter.apply(insights))
    }

    pub async fn get_overview(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<OverviewMetrics> {
        let teams = self.completion.list_teams().await?;
        tracing::debug!(teams = teams.len(), "aggregating organization overview");

        let mut total_story_points = 0.0;
        let mut completed_story_points = 0.0;
        let mut total_commits = 0;
        let mut total_pull_requests = 0;
        let mut total_reviews = 0;
        let mut member_ids: HashSet<String> = HashSet::new();

        for team in &teams {
            let stats = self
                .completion
                .get_team_completion_stats(&team.id, None, start, end)
                .await?;
            let git = self.activity.get_team_git_metrics(team, start, end).await?;

            total_story_points += stats.total_story_points;
            completed_story_points += stats.completed_story_points;
            total_commits += git.totals.commit_count;
            total_pull_requests += git.totals.pr_count;
            total_reviews += git.totals.review_count;

            // Distinct across all teams, so a shared member counts once
            for member in &stats.members {
                member_ids.insert(member.account_id.clone());
            }
            for member in &git.members {
                member_ids.insert(member.login.clone());
            }
        }

        Ok(OverviewMetrics {
            team_count: teams.len(),
            total_story_points,
            completed_story_points,
            completion_percentage: completion_percentage(
                completed_story_points,
                total_story_points,
            ),
            total_commits,
            total_pull_requests,
            total_reviews,
            active_members: member_ids.len(),
        })
    }
}
