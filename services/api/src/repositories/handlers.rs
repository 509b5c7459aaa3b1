use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use velo_cache::cache_key;

use crate::error::ApiError;
use crate::response_cache::to_value;
use crate::{fixtures, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoriesParams {
    pub team_id: Option<String>,
}

/// `GET /repositories` — a team's repositories, or every organization
/// repository when no team is given.
pub async fn get_repositories(
    State(state): State<AppState>,
    Query(params): Query<RepositoriesParams>,
) -> Result<Json<Value>, ApiError> {
    let Some(services) = state.services.clone() else {
        return Ok(Json(fixtures::repositories()));
    };

    let mut filters: Vec<(&str, String)> = Vec::new();
    if let Some(team_id) = &params.team_id {
        filters.push(("teamId", team_id.clone()));
    }
    let key = cache_key("/repositories", &filters);

    let value = state
        .response_cache
        .get_or_compute(&key, || async move {
            match &params.team_id {
                Some(team_id) => {
                    let team = services.completion.get_team(team_id).await?;
                    to_value(services.activity.get_team_repositories(&team).await?)
                }
                None => to_value(services.activity.get_org_repositories().await?),
            }
        })
        .await?;
    Ok(Json(value))
}
