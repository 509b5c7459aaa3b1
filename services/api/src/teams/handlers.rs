use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use velo_cache::cache_key;

use crate::error::ApiError;
use crate::response_cache::to_value;
use crate::{fixtures, AppState};

#[derive(Debug, Deserialize)]
pub struct TeamsParams {
    pub id: Option<String>,
}

/// `GET /teams` — all teams, or one when `id` is given.
pub async fn get_teams(
    State(state): State<AppState>,
    Query(params): Query<TeamsParams>,
) -> Result<Json<Value>, ApiError> {
    let Some(services) = state.services.clone() else {
        return Ok(Json(fixtures::teams(params.id.as_deref())));
    };

    let mut filters: Vec<(&str, String)> = Vec::new();
    if let Some(id) = &params.id {
        filters.push(("id", id.clone()));
    }
    let key = cache_key("/teams", &filters);

    let value = state
        .response_cache
        .get_or_compute(&key, || async move {
            match &params.id {
                Some(id) => to_value(services.completion.get_team(id).await?),
                None => to_value(services.completion.list_teams().await?),
            }
        })
        .await?;
    Ok(Json(value))
}
