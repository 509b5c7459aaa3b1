use axum::extract::{Query, State};
use axum::Json;
use serde_json::Value;
use velo_cache::cache_key;
use velo_common::types::PullRequest;

use crate::error::ApiError;
use crate::pull_requests::requests::PullRequestsParams;
use crate::response_cache::to_value;
use crate::{fixtures, AppState};

/// `GET /pull-requests` — PRs scoped to a repository, team, or author;
/// date-filtered first, then paginated, in that order.
pub async fn get_pull_requests(
    State(state): State<AppState>,
    Query(params): Query<PullRequestsParams>,
) -> Result<Json<Value>, ApiError> {
    params.validate()?;

    let Some(services) = state.services.clone() else {
        return Ok(Json(fixtures::pull_requests()));
    };

    let key = cache_key("/pull-requests", &params.cache_filters());
    let value = state
        .response_cache
        .get_or_compute(&key, || async move {
            // Date filtering happens inside the collectors; the most
            // specific scope wins when several are given
            let mut prs: Vec<PullRequest> = if let Some(repo) = &params.repository_id {
                services
                    .activity
                    .collect_repository_pull_requests(repo, params.start_date, params.end_date)
                    .await?
            } else if let Some(team_id) = &params.team_id {
                let team = services.completion.get_team(team_id).await?;
                services
                    .activity
                    .collect_team_pull_requests(&team, params.start_date, params.end_date)
                    .await?
            } else {
                // validate() guarantees author_id is present here
                let author = params.author_id.as_deref().unwrap_or_default();
                services
                    .activity
                    .collect_member_pull_requests(author, params.start_date, params.end_date)
                    .await?
            };

            if let Some(author) = &params.author_id {
                prs.retain(|pr| pr.author_login.as_deref() == Some(author.as_str()));
            }
            if let Some(status) = params.status {
                prs.retain(|pr| pr.status == status);
            }

            let page: Vec<PullRequest> = prs
                .into_iter()
                .skip((params.page() - 1) * params.page_size())
                .take(params.page_size())
                .collect();
            to_value(page)
        })
        .await?;
    Ok(Json(value))
}
