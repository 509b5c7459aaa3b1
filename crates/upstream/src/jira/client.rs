use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use velo_common::types::{Issue, Sprint, Team};

use super::models::{map_board, map_issue, map_sprint, IssuesPage, ValuesPage};
use super::query::{build_member_issues_jql, date_window_clause};
use crate::error::UpstreamError;
use crate::fetch::{env_or, env_parse, Auth, Fetcher};

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
    /// Custom-field id the tracker stores story-point estimates in.
    pub story_point_field: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub page_size: u64,
    /// Hard cap on items accumulated by one paginated query.
    pub max_total: usize,
    pub cache_ttl_secs: u64,
}

impl JiraConfig {
    /// Load the tracker config from environment.
    ///
    /// Returns `None` when base URL / username / token are missing: the
    /// tracker is simply not configured and callers degrade to mock mode.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("JIRA_BASE_URL").ok()?;
        let username = std::env::var("JIRA_USERNAME").ok()?;
        let api_token = std::env::var("JIRA_API_TOKEN").ok()?;

        Some(Self {
            base_url,
            username,
            api_token,
            story_point_field: env_or("JIRA_STORY_POINT_FIELD", "customfield_10016"),
            max_retries: env_parse("JIRA_MAX_RETRIES", 3),
            timeout_secs: env_parse("JIRA_TIMEOUT_SECS", 30),
            page_size: env_parse("JIRA_PAGE_SIZE", 50),
            max_total: env_parse("JIRA_MAX_TOTAL", 1000),
            cache_ttl_secs: env_parse("JIRA_CACHE_TTL_SECS", 300),
        })
    }
}

pub struct JiraClient {
    fetcher: Fetcher,
    config: JiraConfig,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let auth = Auth::Basic {
            username: config.username.clone(),
            token: config.api_token.clone(),
        };
        let fetcher = Fetcher::new(
            http,
            &config.base_url,
            auth,
            config.max_retries,
            config.cache_ttl_secs,
        );
        Ok(Self { fetcher, config })
    }

    /// For testing: point the client at a specific base URL (e.g., wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self.fetcher.set_base_url(base_url);
        self
    }

    /// For testing: replace the cache clock so TTL expiry is deterministic.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: std::sync::Arc<dyn velo_cache::Clock>) -> Self {
        self.fetcher.set_clock(clock);
        self
    }

    /// All agile boards, one per team.
    pub async fn list_boards(&self) -> Result<Vec<Team>, UpstreamError> {
        let raw = self.fetch_all_values("/rest/agile/1.0/board", &[]).await?;
        Ok(raw.iter().filter_map(map_board).collect())
    }

    pub async fn get_board(&self, board_id: u64) -> Result<Team, UpstreamError> {
        let path = format!("/rest/agile/1.0/board/{board_id}");
        let value = self.fetcher.get_cached(&path, &[]).await?;
        map_board(&value).ok_or_else(|| UpstreamError::decode(&path, "board payload missing id or name"))
    }

    pub async fn list_sprints(&self, board_id: u64) -> Result<Vec<Sprint>, UpstreamError> {
        let path = format!("/rest/agile/1.0/board/{board_id}/sprint");
        let raw = self.fetch_all_values(&path, &[]).await?;
        Ok(raw.iter().filter_map(map_sprint).collect())
    }

    pub async fn get_sprint(&self, sprint_id: u64) -> Result<Sprint, UpstreamError> {
        let path = format!("/rest/agile/1.0/sprint/{sprint_id}");
        let value = self.fetcher.get_cached(&path, &[]).await?;
        map_sprint(&value).ok_or_else(|| UpstreamError::decode(&path, "sprint payload missing fields"))
    }

    /// Issues on a team's board, optionally bounded by an updated-date window.
    pub async fn list_board_issues(
        &self,
        board_id: u64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Issue>, UpstreamError> {
        let path = format!("/rest/agile/1.0/board/{board_id}/issue");
        let mut query: Vec<(&str, String)> = vec![("fields", self.issue_fields())];
        if let Some(jql) = date_window_clause(start, end) {
            query.push(("jql", jql));
        }
        let mut issues = self.fetch_all_issues(&path, &query).await?;
        for issue in &mut issues {
            issue.board_id = Some(board_id);
        }
        Ok(issues)
    }

    pub async fn list_sprint_issues(&self, sprint_id: u64) -> Result<Vec<Issue>, UpstreamError> {
        let path = format!("/rest/agile/1.0/sprint/{sprint_id}/issue");
        let query: Vec<(&str, String)> = vec![("fields", self.issue_fields())];
        let mut issues = self.fetch_all_issues(&path, &query).await?;
        for issue in &mut issues {
            issue.sprint_id = Some(sprint_id);
        }
        Ok(issues)
    }

    /// Issues assigned to one account across all teams.
    pub async fn list_member_issues(
        &self,
        account_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Issue>, UpstreamError> {
        let jql = build_member_issues_jql(account_id, start, end);
        self.search_issues(&jql).await
    }

    pub async fn search_issues(&self, jql: &str) -> Result<Vec<Issue>, UpstreamError> {
        let query: Vec<(&str, String)> =
            vec![("jql", jql.to_owned()), ("fields", self.issue_fields())];
        self.fetch_all_issues("/rest/api/2/search", &query).await
    }

    fn issue_fields(&self) -> String {
        format!(
            "summary,status,assignee,resolutiondate,sprint,{}",
            self.config.story_point_field
        )
    }

    /// Drain a `values`-envelope endpoint page by page until the upstream
    /// signals the last page or the accumulated count hits `max_total`.
    async fn fetch_all_values(
        &self,
        path: &str,
        base_query: &[(&str, String)],
    ) -> Result<Vec<Value>, UpstreamError> {
        let mut start_at = 0u64;
        let mut items: Vec<Value> = Vec::new();

        loop {
            let mut query = base_query.to_vec();
            query.push(("startAt", start_at.to_string()));
            query.push(("maxResults", self.config.page_size.to_string()));

            let value = self.fetcher.get_cached(path, &query).await?;
            let page: ValuesPage =
                serde_json::from_value(value).map_err(|e| UpstreamError::decode(path, e))?;
            let fetched = page.values.len() as u64;
            items.extend(page.values);

            if items.len() >= self.config.max_total {
                items.truncate(self.config.max_total);
                break;
            }
            start_at += self.config.page_size;
            let done = fetched < self.config.page_size
                || page.is_last == Some(true)
                || page.total.is_some_and(|total| start_at >= total);
            if done {
                break;
            }
        }

        Ok(items)
    }

    async fn fetch_all_issues(
        &self,
        path: &str,
        base_query: &[(&str, String)],
    ) -> Result<Vec<Issue>, UpstreamError> {
        let mut start_at = 0u64;
        let mut issues: Vec<Issue> = Vec::new();

        loop {
            let mut query = base_query.to_vec();
            query.push(("startAt", start_at.to_string()));
            query.push(("maxResults", self.config.page_size.to_string()));

            let value = self.fetcher.get_cached(path, &query).await?;
            let page: IssuesPage =
                serde_json::from_value(value).map_err(|e| UpstreamError::decode(path, e))?;
            let fetched = page.issues.len() as u64;
            issues.extend(
                page.issues
                    .iter()
                    .filter_map(|raw| map_issue(raw, &self.config.story_point_field)),
            );

            if issues.len() >= self.config.max_total {
                issues.truncate(self.config.max_total);
                break;
            }
            start_at += self.config.page_size;
            if fetched < self.config.page_size || start_at >= page.total {
                break;
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use velo_cache::ManualClock;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> JiraConfig {
        JiraConfig {
            base_url: "http://localhost".to_string(),
            username: "test@example.com".to_string(),
            api_token: "fake-token".to_string(),
            story_point_field: "customfield_10016".to_string(),
            max_retries: 0,
            timeout_secs: 5,
            page_size: 2,
            max_total: 1000,
            cache_ttl_secs: 300,
        }
    }

    fn board(id: u64, name: &str) -> serde_json::Value {
        json!({ "id": id, "name": name, "type": "scrum" })
    }

    fn board_page(start_at: u64, total: u64, boards: Vec<serde_json::Value>) -> serde_json::Value {
        json!({
            "startAt": start_at,
            "maxResults": 2,
            "total": total,
            "values": boards
        })
    }

    fn issue(key: &str, points: f64, status: &str) -> serde_json::Value {
        json!({
            "id": key.replace("DEV-", "100"),
            "key": key,
            "fields": {
                "summary": format!("issue {key}"),
                "status": { "name": status },
                "assignee": null,
                "customfield_10016": points
            }
        })
    }

    #[tokio::test]
    async fn list_boards_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board"))
            .and(query_param("startAt", "0"))
            .and(query_param("maxResults", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(board_page(
                0,
                1,
                vec![board(12, "Platform")],
            )))
            .mount(&server)
            .await;

        let client = JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let teams = client.list_boards().await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name, "Platform");
        assert_eq!(teams[0].board_id, 12);
    }

    #[tokio::test]
    async fn list_boards_multiple_pages_preserve_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board"))
            .and(query_param("startAt", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(board_page(
                0,
                3,
                vec![board(1, "Alpha"), board(2, "Beta")],
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board"))
            .and(query_param("startAt", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(board_page(
                2,
                3,
                vec![board(3, "Gamma")],
            )))
            .mount(&server)
            .await;

        let client = JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let teams = client.list_boards().await.unwrap();
        let names: Vec<&str> = teams.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn max_total_caps_accumulation() {
        let server = MockServer::start().await;
        for start_at in [0u64, 2] {
            let page = board_page(
                start_at,
                100,
                vec![
                    board(start_at + 1, "A"),
                    board(start_at + 2, "B"),
                ],
            );
            Mock::given(method("GET"))
                .and(path("/rest/agile/1.0/board"))
                .and(query_param("startAt", start_at.to_string().as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_json(page))
                .mount(&server)
                .await;
        }

        let mut config = test_config();
        config.max_total = 3;
        let client = JiraClient::new(config)
            .unwrap()
            .with_base_url(&server.uri());

        let teams = client.list_boards().await.unwrap();
        assert_eq!(teams.len(), 3);
    }

    #[tokio::test]
    async fn second_identical_query_is_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board"))
            .respond_with(ResponseTemplate::new(200).set_body_json(board_page(
                0,
                1,
                vec![board(12, "Platform")],
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let first = client.list_boards().await.unwrap();
        let second = client.list_boards().await.unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].id, second[0].id);
        // MockServer verifies the single-call expectation on drop
    }

    #[tokio::test]
    async fn stale_cache_serves_through_upstream_5xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(board(12, "Platform")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/12"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let client = JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri())
            .with_clock(clock.clone());

        let warm = client.get_board(12).await.unwrap();
        assert_eq!(warm.name, "Platform");

        // Entry expires, the refresh fails with 500, stale copy is returned
        clock.advance(chrono::Duration::seconds(301));
        let degraded = client.get_board(12).await.unwrap();
        assert_eq!(degraded.name, "Platform");
    }

    #[tokio::test]
    async fn cold_cache_5xx_propagates_server_kind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/12"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let client = JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let err = client.get_board(12).await.unwrap_err();
        assert_eq!(err.kind, crate::UpstreamErrorKind::Server);
        assert_eq!(err.status, Some(503));
        assert_eq!(err.endpoint, "/rest/agile/1.0/board/12");
    }

    #[tokio::test]
    async fn auth_failure_is_never_masked_by_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(board(12, "Platform")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/12"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let client = JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri())
            .with_clock(clock.clone());

        client.get_board(12).await.unwrap();
        clock.advance(chrono::Duration::seconds(301));

        let err = client.get_board(12).await.unwrap_err();
        assert_eq!(err.kind, crate::UpstreamErrorKind::Auth);
    }

    #[tokio::test]
    async fn not_found_board_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/99"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no board"))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.max_retries = 2; // 4xx must fail fast, no retries
        let client = JiraClient::new(config)
            .unwrap()
            .with_base_url(&server.uri());

        let err = client.get_board(99).await.unwrap_err();
        assert_eq!(err.kind, crate::UpstreamErrorKind::NotFound);
    }

    #[tokio::test]
    async fn retries_on_500_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/12"))
            .respond_with(ResponseTemplate::new(500).set_body_string("flaky"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(board(12, "Platform")))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.max_retries = 2;
        let client = JiraClient::new(config)
            .unwrap()
            .with_base_url(&server.uri());

        let team = client.get_board(12).await.unwrap();
        assert_eq!(team.name, "Platform");
    }

    #[tokio::test]
    async fn search_issues_maps_story_point_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("jql", "assignee = abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0,
                "maxResults": 2,
                "total": 2,
                "issues": [issue("DEV-1", 5.0, "Done"), issue("DEV-2", 3.0, "In Progress")]
            })))
            .mount(&server)
            .await;

        let client = JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let issues = client.search_issues("assignee = abc").await.unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].story_point_value(), 5.0);
        assert!(issues[0].is_completed());
        assert!(!issues[1].is_completed());
    }

    #[tokio::test]
    async fn lists_board_sprints_until_last_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/12/sprint"))
            .and(query_param("startAt", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0,
                "maxResults": 2,
                "isLast": false,
                "values": [
                    { "id": 6, "name": "Sprint 6", "state": "closed" },
                    { "id": 7, "name": "Sprint 7", "state": "active" }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/12/sprint"))
            .and(query_param("startAt", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 2,
                "maxResults": 2,
                "isLast": true,
                "values": [
                    { "id": 8, "name": "Sprint 8", "state": "future" }
                ]
            })))
            .mount(&server)
            .await;

        let client = JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let sprints = client.list_sprints(12).await.unwrap();
        let ids: Vec<u64> = sprints.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![6, 7, 8]);
        assert_eq!(sprints[1].state, velo_common::types::SprintState::Active);
    }

    #[tokio::test]
    async fn sprint_issues_carry_sprint_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/sprint/7/issue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0,
                "maxResults": 2,
                "total": 1,
                "issues": [issue("DEV-1", 5.0, "Done")]
            })))
            .mount(&server)
            .await;

        let client = JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let issues = client.list_sprint_issues(7).await.unwrap();
        assert_eq!(issues[0].sprint_id, Some(7));
    }

    #[tokio::test]
    async fn board_issues_pass_date_window_jql() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/agile/1.0/board/12/issue"))
            .and(query_param(
                "jql",
                "updated >= \"2026-02-01\" AND updated <= \"2026-02-28\"",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0,
                "maxResults": 2,
                "total": 1,
                "issues": [issue("DEV-1", 2.0, "Done")]
            })))
            .mount(&server)
            .await;

        let client = JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri());

        let issues = client
            .list_board_issues(
                12,
                NaiveDate::from_ymd_opt(2026, 2, 1),
                NaiveDate::from_ymd_opt(2026, 2, 28),
            )
            .await
            .unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].board_id, Some(12));
    }

    #[test]
    fn from_env_returns_none_without_credentials() {
        let _lock = ENV_LOCK.lock().unwrap();
        std::env::remove_var("JIRA_BASE_URL");
        std::env::remove_var("JIRA_USERNAME");
        std::env::remove_var("JIRA_API_TOKEN");
        assert!(JiraConfig::from_env().is_none());
    }

    #[test]
    fn from_env_defaults_story_point_field() {
        let _lock = ENV_LOCK.lock().unwrap();
        std::env::set_var("JIRA_BASE_URL", "https://test.atlassian.net");
        std::env::set_var("JIRA_USERNAME", "a@b.com");
        std::env::set_var("JIRA_API_TOKEN", "tok");
        std::env::remove_var("JIRA_STORY_POINT_FIELD");

        let cfg = JiraConfig::from_env().unwrap();
        assert_eq!(cfg.story_point_field, "customfield_10016");
        assert_eq!(cfg.cache_ttl_secs, 300);

        std::env::remove_var("JIRA_BASE_URL");
        std::env::remove_var("JIRA_USERNAME");
        std::env::remove_var("JIRA_API_TOKEN");
    }

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
}
