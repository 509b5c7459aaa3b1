use chrono::NaiveDate;
use serde::Deserialize;
use velo_common::error::{VeloError, VeloResult};
use velo_common::types::PullRequestStatus;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestsParams {
    pub team_id: Option<String>,
    pub author_id: Option<String>,
    pub repository_id: Option<String>,
    pub status: Option<PullRequestStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl PullRequestsParams {
    /// An unscoped query would fan out over every repository of the
    /// organization; require at least one scope.
    pub fn validate(&self) -> VeloResult<()> {
        if self.team_id.is_none() && self.author_id.is_none() && self.repository_id.is_none() {
            return Err(VeloError::Validation(
                "at least one of teamId, authorId, repositoryId is required".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn cache_filters(&self) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if let Some(team_id) = &self.team_id {
            filters.push(("teamId", team_id.clone()));
        }
        if let Some(author_id) = &self.author_id {
            filters.push(("authorId", author_id.clone()));
        }
        if let Some(repository_id) = &self.repository_id {
            filters.push(("repositoryId", repository_id.clone()));
        }
        if let Some(status) = self.status {
            filters.push(("status", format!("{status:?}").to_lowercase()));
        }
        if let Some(start) = self.start_date {
            filters.push(("startDate", start.to_string()));
        }
        if let Some(end) = self.end_date {
            filters.push(("endDate", end.to_string()));
        }
        filters.push(("page", self.page().to_string()));
        filters.push(("pageSize", self.page_size().to_string()));
        filters
    }
}
