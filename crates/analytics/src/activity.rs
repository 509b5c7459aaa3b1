use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use velo_common::error::VeloResult;
use velo_common::types::{CodeReview, Commit, PullRequest, PullRequestStatus, Repository, Team};
use velo_upstream::GitHubClient;

use crate::models::{GitMetrics, MemberGitMetrics, TeamGitMetrics};

/// Commit / pull-request / review statistics per team, member, and
/// repository, recomputed from the source-control host on every call.
pub struct ActivityMetricsService {
    github: Arc<GitHubClient>,
}

impl ActivityMetricsService {
    pub fn new(github: Arc<GitHubClient>) -> Self {
        Self { github }
    }

    pub async fn get_team_repositories(&self, team: &Team) -> VeloResult<Vec<Repository>> {
        Ok(self.github.list_team_repos(&team_slug(&team.name)).await?)
    }

    pub async fn get_org_repositories(&self) -> VeloResult<Vec<Repository>> {
        Ok(self.github.list_org_repos().await?)
    }

    /// Team totals plus per-member breakdown and the repository list.
    /// Reviews and line counts are not fetched for this shape and report 0.
    pub async fn get_team_git_metrics(
        &self,
        team: &Team,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<TeamGitMetrics> {
        let repositories = self.get_team_repositories(team).await?;
        let (commits, prs) = self.fetch_activity(&repositories, None, start, end).await?;

        Ok(TeamGitMetrics {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            totals: compute_git_metrics(&commits, &prs),
            members: member_breakdown(&commits, &prs),
            repositories,
        })
    }

    /// Metrics for one author across the organization, without the team
    /// resolution step.
    pub async fn get_member_git_metrics(
        &self,
        login: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<GitMetrics> {
        let repositories = self.github.list_org_repos().await?;
        let (commits, prs) = self
            .fetch_activity(&repositories, Some(login), start, end)
            .await?;
        Ok(compute_git_metrics(&commits, &prs))
    }

    /// Metrics for a single repository. This is the only shape that fetches
    /// reviews, so review counts and response times are populated here.
    pub async fn get_repository_git_metrics(
        &self,
        repo_name: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<GitMetrics> {
        let (since, until) = window_bounds(start, end);
        let commits = self.github.list_commits(repo_name, None, since, until).await?;
        let prs: Vec<PullRequest> = self
            .github
            .list_pull_requests(repo_name)
            .await?
            .into_iter()
            .filter(|pr| pr_in_window(pr, since, until))
            .collect();

        let mut reviews_per_pr: Vec<Vec<CodeReview>> = Vec::with_capacity(prs.len());
        for pr in &prs {
            reviews_per_pr.push(
                self.github
                    .list_pull_request_reviews(repo_name, pr.number)
                    .await?,
            );
        }

        let mut metrics = compute_git_metrics(&commits, &prs);
        let (review_count, avg_response) = review_response_stats(&prs, &reviews_per_pr);
        metrics.review_count = review_count;
        metrics.avg_review_response_hours = avg_response;
        Ok(metrics)
    }

    pub async fn collect_team_pull_requests(
        &self,
        team: &Team,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<Vec<PullRequest>> {
        let repositories = self.get_team_repositories(team).await?;
        let (since, until) = window_bounds(start, end);
        let mut prs = Vec::new();
        for repo in &repositories {
            prs.extend(
                self.github
                    .list_pull_requests(&repo.name)
                    .await?
                    .into_iter()
                    .filter(|pr| pr_in_window(pr, since, until)),
            );
        }
        Ok(prs)
    }

    pub async fn collect_member_pull_requests(
        &self,
        login: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<Vec<PullRequest>> {
        let repositories = self.github.list_org_repos().await?;
        let (since, until) = window_bounds(start, end);
        let mut prs = Vec::new();
        for repo in &repositories {
            prs.extend(
                self.github
                    .list_pull_requests(&repo.name)
                    .await?
                    .into_iter()
                    .filter(|pr| {
                        pr.author_login.as_deref() == Some(login) && pr_in_window(pr, since, until)
                    }),
            );
        }
        Ok(prs)
    }

    pub async fn collect_repository_pull_requests(
        &self,
        repo_name: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<Vec<PullRequest>> {
        let (since, until) = window_bounds(start, end);
        Ok(self
            .github
            .list_pull_requests(repo_name)
            .await?
            .into_iter()
            .filter(|pr| pr_in_window(pr, since, until))
            .collect())
    }

    /// Sequential per-repository fan-out; results keep repository order to
    /// bound upstream pressure and keep output deterministic.
    async fn fetch_activity(
        &self,
        repositories: &[Repository],
        author: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> VeloResult<(Vec<Commit>, Vec<PullRequest>)> {
        let (since, until) = window_bounds(start, end);
        let mut commits = Vec::new();
        let mut prs = Vec::new();
        for repo in repositories {
            commits.extend(
                self.github
                    .list_commits(&repo.name, author, since, until)
                    .await?,
            );
            prs.extend(
                self.github
                    .list_pull_requests(&repo.name)
                    .await?
                    .into_iter()
                    .filter(|pr| {
                        let author_matches = match author {
                            Some(login) => pr.author_login.as_deref() == Some(login),
                            None => true,
                        };
                        author_matches && pr_in_window(pr, since, until)
                    }),
            );
        }
        Ok((commits, prs))
    }
}

/// The source-control host addresses teams by slug: lowercase with runs of
/// non-alphanumerics collapsed to single dashes.
pub fn team_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_owned()
}

/// Inclusive day bounds: the start date at midnight, the end date at the
/// last second of the day.
pub fn window_bounds(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let since = start.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc());
    let until = end
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc());
    (since, until)
}

fn pr_in_window(
    pr: &PullRequest,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> bool {
    if let Some(since) = since {
        if pr.created_at < since {
            return false;
        }
    }
    if let Some(until) = until {
        if pr.created_at > until {
            return false;
        }
    }
    true
}

pub fn compute_git_metrics(commits: &[Commit], prs: &[PullRequest]) -> GitMetrics {
    let merged: Vec<&PullRequest> = prs
        .iter()
        .filter(|pr| pr.status == PullRequestStatus::Merged)
        .collect();

    let merge_hours: Vec<f64> = merged
        .iter()
        .filter_map(|pr| pr.time_to_merge_hours())
        .collect();
    let avg_pr_time_to_merge_hours = if merge_hours.is_empty() {
        0.0
    } else {
        merge_hours.iter().sum::<f64>() / merge_hours.len() as f64
    };

    GitMetrics {
        commit_count: commits.len(),
        pr_count: prs.len(),
        merged_pr_count: merged.len(),
        avg_pr_time_to_merge_hours,
        // The commit and PR list endpoints carry no review or line-count
        // data; shapes that fetch reviews overwrite these fields.
        review_count: 0,
        avg_review_response_hours: 0.0,
        lines_added: 0,
        lines_removed: 0,
    }
}

/// Per-author metrics in first-appearance order across commits, then PRs.
pub fn member_breakdown(commits: &[Commit], prs: &[PullRequest]) -> Vec<MemberGitMetrics> {
    let mut order: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for login in commits
        .iter()
        .filter_map(|c| c.author_login.clone())
        .chain(prs.iter().filter_map(|pr| pr.author_login.clone()))
    {
        if seen.insert(login.clone()) {
            order.push(login);
        }
    }

    order
        .into_iter()
        .map(|login| {
            let member_commits: Vec<Commit> = commits
                .iter()
                .filter(|c| c.author_login.as_deref() == Some(login.as_str()))
                .cloned()
                .collect();
            let member_prs: Vec<PullRequest> = prs
                .iter()
                .filter(|pr| pr.author_login.as_deref() == Some(login.as_str()))
                .cloned()
                .collect();
            MemberGitMetrics {
                metrics: compute_git_metrics(&member_commits, &member_prs),
                login,
            }
        })
        .collect()
}

/// Review count plus mean first-response latency over PRs that received at
/// least one review; 0.0 when none did.
pub fn review_response_stats(prs: &[PullRequest], reviews_per_pr: &[Vec<CodeReview>]) -> (usize, f64) {
    let review_count = reviews_per_pr.iter().map(Vec::len).sum();

    let latencies: Vec<f64> = prs
        .iter()
        .zip(reviews_per_pr)
        .filter_map(|(pr, reviews)| {
            reviews
                .iter()
                .filter_map(|review| review.submitted_at)
                .min()
                .map(|first| (first - pr.created_at).num_seconds() as f64 / 3600.0)
        })
        .collect();
    let avg = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<f64>() / latencies.len() as f64
    };

    (review_count, avg)
}
