use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use velo_common::error::{VeloError, VeloResult};
use velo_common::types::{Issue, Team};
use velo_upstream::JiraClient;

use crate::models::{CompletionStats, MemberCompletionStats};

/// Story-point completion statistics per team, sprint, and member,
/// recomputed from tracker issues on every call.
pub struct CompletionAnalyticsService {
    jira: Arc<JiraClient>,
}

impl CompletionAnalyticsService {
    pub fn new(jira: Arc<JiraClient>) -> Self {
        Self { jira }
    }

    pub async fn list_teams(&self) -> VeloResult<Vec<Team>> {
        Ok(self.jira.list_boards().await?)
    }

    pub async fn get_team(&self, team_id: &str) -> VeloResult<Team> {
        let board_id = parse_team_id(team_id)?;
        Ok(self.jira.get_board(board_id).await?)
    }

    /// Completion stats for one team, scoped to a sprint or a date window.
    pub async fn get_team_completion_stats(
        &self,
        team_id: &str,
        sprint_id: Option<u64>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<CompletionStats> {
        let team = self.get_team(team_id).await?;

        match sprint_id {
            Some(sprint_id) => {
                let sprint = self.jira.get_sprint(sprint_id).await?;
                let issues = self.jira.list_sprint_issues(sprint_id).await?;
                Ok(build_completion_stats(
                    &team,
                    Some(sprint_id),
                    Some(sprint.name),
                    &issues,
                ))
            }
            None => {
                let issues = self
                    .jira
                    .list_board_issues(team.board_id, start, end)
                    .await?;
                Ok(build_completion_stats(&team, None, None, &issues))
            }
        }
    }

    /// Stats for every known team, in board order. A failure for one team
    /// aborts the whole call; no partial result is returned.
    pub async fn get_all_teams_completion_stats(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<Vec<CompletionStats>> {
        let teams = self.jira.list_boards().await?;
        tracing::debug!(teams = teams.len(), "computing completion stats for all teams");
        let mut all = Vec::with_capacity(teams.len());
        for team in &teams {
            let issues = self
                .jira
                .list_board_issues(team.board_id, start, end)
                .await?;
            all.push(build_completion_stats(team, None, None, &issues));
        }
        Ok(all)
    }

    /// Completion stats for one account across all teams.
    pub async fn get_member_completion_stats(
        &self,
        account_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<MemberCompletionStats> {
        let issues = self.jira.list_member_issues(account_id, start, end).await?;
        Ok(build_member_completion_stats(account_id, &issues))
    }
}

fn parse_team_id(team_id: &str) -> VeloResult<u64> {
    team_id.trim().parse().map_err(|_| {
        VeloError::Validation(format!(
            "teamId must be a numeric board id, got \"{team_id}\""
        ))
    })
}

/// `completed / total * 100` with an explicit zero-total rule: an empty
/// scope reports 0, never NaN.
pub fn completion_percentage(completed: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        completed / total * 100.0
    }
}

pub fn build_completion_stats(
    team: &Team,
    sprint_id: Option<u64>,
    sprint_name: Option<String>,
    issues: &[Issue],
) -> CompletionStats {
    let total: f64 = issues.iter().map(Issue::story_point_value).sum();
    let completed: f64 = issues
        .iter()
        .filter(|issue| issue.is_completed())
        .map(Issue::story_point_value)
        .sum();

    // Member breakdown in first-appearance order; unassigned issues are
    // counted in the team totals above but belong to no member row.
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, (String, Vec<&Issue>)> = HashMap::new();
    for issue in issues {
        if let Some(assignee) = &issue.assignee {
            let entry = grouped
                .entry(assignee.account_id.clone())
                .or_insert_with(|| {
                    order.push(assignee.account_id.clone());
                    (assignee.display_name.clone(), Vec::new())
                });
            entry.1.push(issue);
        }
    }
    let members = order
        .iter()
        .map(|account_id| {
            let (display_name, member_issues) = &grouped[account_id];
            member_stats(account_id, display_name, member_issues)
        })
        .collect();

    CompletionStats {
        team_id: team.id.clone(),
        team_name: team.name.clone(),
        sprint_id,
        sprint_name,
        total_story_points: total,
        completed_story_points: completed,
        completion_percentage: completion_percentage(completed, total),
        members,
    }
}

pub fn build_member_completion_stats(account_id: &str, issues: &[Issue]) -> MemberCompletionStats {
    let display_name = issues
        .iter()
        .find_map(|issue| issue.assignee.as_ref().map(|a| a.display_name.clone()))
        .unwrap_or_else(|| account_id.to_owned());
    let refs: Vec<&Issue> = issues.iter().collect();
    member_stats(account_id, &display_name, &refs)
}

fn member_stats(account_id: &str, display_name: &str, issues: &[&Issue]) -> MemberCompletionStats {
    let total: f64 = issues.iter().map(|issue| issue.story_point_value()).sum();
    let completed: f64 = issues
        .iter()
        .filter(|issue| issue.is_completed())
        .map(|issue| issue.story_point_value())
        .sum();
    MemberCompletionStats {
        account_id: account_id.to_owned(),
        display_name: display_name.to_owned(),
        total_story_points: total,
        completed_story_points: completed,
        completion_percentage: completion_percentage(completed, total),
    }
}
