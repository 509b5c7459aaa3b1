use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    pub team_id: Option<String>,
    pub sprint_id: Option<u64>,
    pub member_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl StatsParams {
    pub fn cache_filters(&self) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if let Some(team_id) = &self.team_id {
            filters.push(("teamId", team_id.clone()));
        }
        if let Some(sprint_id) = self.sprint_id {
            filters.push(("sprintId", sprint_id.to_string()));
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
        filters
    }
}
