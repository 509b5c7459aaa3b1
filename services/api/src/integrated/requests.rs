use chrono::NaiveDate;
use serde::Deserialize;
use velo_analytics::models::Severity;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegratedParams {
    #[serde(rename = "type")]
    pub metric_type: String,
    pub team_id: Option<String>,
    pub member_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Post-filters for `type=insights`, applied after synthesis.
    pub severity: Option<Severity>,
    pub limit: Option<usize>,
}

impl IntegratedParams {
    pub fn cache_filters(&self) -> Vec<(&'static str, String)> {
        let mut filters = vec![("type", self.metric_type.clone())];
        if let Some(team_id) = &self.team_id {
            filters.push(("teamId", team_id.clone()));
        }
        if let Some(member_id) = &self.member_id {
            filters.push(("memberId", member_id.clone()));
        }
        if let Some(start) = self.start_date {
            filters.push(("startDate", start.to_string()));
        }
        if let Some(end) = self.end_date {
            filters.push(("endDate", end.to_string()));
        }
        if let Some(severity) = self.severity {
            filters.push(("severity", format!("{severity:?}").to_lowercase()));
        }
        if let Some(limit) = self.limit {
            filters.push(("limit", limit.to_string()));
        }
        filters
    }
}
