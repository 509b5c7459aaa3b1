use axum::extract::{Query, State};
use axum::Json;
use serde_json::Value;
use velo_analytics::models::InsightFilter;
use velo_cache::cache_key;
use velo_common::error::VeloError;

use crate::error::ApiError;
use crate::integrated::requests::IntegratedParams;
use crate::response_cache::to_value;
use crate::{fixtures, AppState};

/// `GET /metrics/integrated` — cross-source metrics, dispatched on `type`:
/// team, member, insights, or overview.
pub async fn get_integrated(
    State(state): State<AppState>,
    Query(params): Query<IntegratedParams>,
) -> Result<Json<Value>, ApiError> {
    match params.metric_type.as_str() {
        "team" => {
            if params.team_id.is_none() {
                return Err(VeloError::Validation("type=team requires teamId".to_owned()).into());
            }
        }
        "member" => {
            if params.member_id.is_none() {
                return Err(
                    VeloError::Validation("type=member requires memberId".to_owned()).into(),
                );
            }
        }
        "insights" | "overview" => {}
        other => {
            return Err(VeloError::Validation(format!(
                "type must be one of team, member, insights, overview; got \"{other}\""
            ))
            .into());
        }
    }

    let Some(services) = state.services.clone() else {
        return Ok(Json(fixtures::integrated(&params.metric_type)));
    };

    let key = cache_key("/metrics/integrated", &params.cache_filters());
    let value = state
        .response_cache
        .get_or_compute(&key, || async move {
            match params.metric_type.as_str() {
                "team" => {
                    let team_id = params.team_id.as_deref().unwrap_or_default();
                    to_value(
                        services
                            .correlation
                            .get_integrated_team_metrics(
                                team_id,
                                params.start_date,
                                params.end_date,
                            )
                            .await?,
                    )
                }
                "member" => {
                    let member_id = params.member_id.as_deref().unwrap_or_default();
                    to_value(
                        services
                            .correlation
                            .get_integrated_member_metrics(
                                member_id,
                                params.start_date,
                                params.end_date,
                            )
                            .await?,
                    )
                }
                "insights" => {
                    let filter = InsightFilter {
                        severity: params.severity,
                        limit: params.limit,
                    };
                    to_value(
                        services
                            .correlation
                            .get_insights(
                                params.team_id.as_deref(),
                                params.start_date,
                                params.end_date,
                                &filter,
                            )
                            .await?,
                    )
                }
                // Only "overview" remains after the match above
                _ => to_value(
                    services
                        .correlation
                        .get_overview(params.start_date, params.end_date)
                        .await?,
                ),
            }
        })
        .await?;
    Ok(Json(value))
}
