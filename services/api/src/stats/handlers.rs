use axum::extract::{Query, State};
use axum::Json;
use serde_json::Value;
use velo_cache::cache_key;
use velo_common::error::VeloError;

use crate::error::ApiError;
use crate::response_cache::to_value;
use crate::stats::requests::StatsParams;
use crate::{fixtures, AppState};

/// `GET /stats` — completion stats for one team (optionally one sprint),
/// one member, or every team when no scope is given.
pub async fn get_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<Value>, ApiError> {
    if params.sprint_id.is_some() && params.team_id.is_none() {
        return Err(VeloError::Validation("sprintId requires teamId".to_owned()).into());
    }

    let Some(services) = state.services.clone() else {
        return Ok(Json(fixtures::stats(
            params.team_id.as_deref(),
            params.member_id.as_deref(),
        )));
    };

    let key = cache_key("/stats", &params.cache_filters());
    let value = state
        .response_cache
        .get_or_compute(&key, || async move {
            if let Some(member_id) = &params.member_id {
                return to_value(
                    services
                        .completion
                        .get_member_completion_stats(member_id, params.start_date, params.end_date)
                        .await?,
                );
            }
            match &params.team_id {
                Some(team_id) => to_value(
                    services
                        .completion
                        .get_team_completion_stats(
                            team_id,
                            params.sprint_id,
                            params.start_date,
                            params.end_date,
                        )
                        .await?,
                ),
                None => to_value(
                    services
                        .completion
                        .get_all_teams_completion_stats(params.start_date, params.end_date)
                        .await?,
                ),
            }
        })
        .await?;
    Ok(Json(value))
}
