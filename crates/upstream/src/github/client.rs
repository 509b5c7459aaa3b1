use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;

use velo_common::types::{CodeReview, Commit, PullRequest, Repository};

use super::models::{map_commit, map_member_login, map_pull_request, map_repository, map_review};
use crate::error::UpstreamError;
use crate::fetch::{env_or, env_parse, Auth, Fetcher};

const DEFAULT_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub base_url: String,
    pub token: String,
    pub org: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub page_size: u64,
    /// Hard cap on items accumulated by one paginated query.
    pub max_total: usize,
    pub cache_ttl_secs: u64,
}

impl GitHubConfig {
    /// Load the source-control config from environment.
    ///
    /// Returns `None` when token or organization are missing: the host is
    /// not configured and callers degrade to mock mode.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("GITHUB_TOKEN").ok()?;
        let org = std::env::var("GITHUB_ORG").ok()?;

        Some(Self {
            base_url: env_or("GITHUB_BASE_URL", DEFAULT_BASE_URL),
            token,
            org,
            max_retries: env_parse("GITHUB_MAX_RETRIES", 3),
            timeout_secs: env_parse("GITHUB_TIMEOUT_SECS", 30),
            page_size: env_parse("GITHUB_PAGE_SIZE", 100),
            max_total: env_parse("GITHUB_MAX_TOTAL", 1000),
            cache_ttl_secs: env_parse("GITHUB_CACHE_TTL_SECS", 300),
        })
    }
}

pub struct GitHubClient {
    fetcher: Fetcher,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("velo-api")
            .default_headers(headers)
            .build()?;
        let auth = Auth::Bearer {
            token: config.token.clone(),
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

    pub async fn list_org_repos(&self) -> Result<Vec<Repository>, UpstreamError> {
        let path = format!("/orgs/{}/repos", self.config.org);
        let raw = self.fetch_all_pages(&path, &[]).await?;
        Ok(raw.iter().filter_map(map_repository).collect())
    }

    pub async fn list_team_repos(&self, team_slug: &str) -> Result<Vec<Repository>, UpstreamError> {
        let path = format!("/orgs/{}/teams/{}/repos", self.config.org, team_slug);
        let raw = self.fetch_all_pages(&path, &[]).await?;
        Ok(raw.iter().filter_map(map_repository).collect())
    }

    pub async fn list_commits(
        &self,
        repo: &str,
        author: Option<&str>,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Commit>, UpstreamError> {
        let path = format!("/repos/{}/{}/commits", self.config.org, repo);
        let mut base_query: Vec<(&str, String)> = Vec::new();
        if let Some(author) = author {
            base_query.push(("author", author.to_owned()));
        }
        if let Some(since) = since {
            base_query.push(("since", since.to_rfc3339()));
        }
        if let Some(until) = until {
            base_query.push(("until", until.to_rfc3339()));
        }

        match self.fetch_all_pages(&path, &base_query).await {
            Ok(raw) => Ok(raw.iter().filter_map(map_commit).collect()),
            // The host answers 409 for a repository with no commits yet
            Err(err) if err.status == Some(409) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// All pull requests of a repository, newest first. Date filtering is
    /// the caller's concern: the list endpoint has no `since` parameter.
    pub async fn list_pull_requests(&self, repo: &str) -> Result<Vec<PullRequest>, UpstreamError> {
        let path = format!("/repos/{}/{}/pulls", self.config.org, repo);
        let base_query: Vec<(&str, String)> = vec![
            ("state", "all".to_owned()),
            ("sort", "created".to_owned()),
            ("direction", "desc".to_owned()),
        ];
        let raw = self.fetch_all_pages(&path, &base_query).await?;
        Ok(raw.iter().filter_map(|v| map_pull_request(v, repo)).collect())
    }

    pub async fn list_pull_request_reviews(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<Vec<CodeReview>, UpstreamError> {
        let path = format!("/repos/{}/{}/pulls/{}/reviews", self.config.org, repo, number);
        let raw = self.fetch_all_pages(&path, &[]).await?;
        Ok(raw.iter().filter_map(map_review).collect())
    }

    pub async fn list_org_members(&self) -> Result<Vec<String>, UpstreamError> {
        let path = format!("/orgs/{}/members", self.config.org);
        let raw = self.fetch_all_pages(&path, &[]).await?;
        Ok(raw.iter().filter_map(map_member_login).collect())
    }

    /// Drain a page-numbered array endpoint. The host does not report a
    /// total, so a short page marks the end; `max_total` still caps the
    /// accumulation.
    async fn fetch_all_pages(
        &self,
        path: &str,
        base_query: &[(&str, String)],
    ) -> Result<Vec<Value>, UpstreamError> {
        let mut page = 1u64;
        let mut items: Vec<Value> = Vec::new();

        loop {
            let mut query = base_query.to_vec();
            query.push(("per_page", self.config.page_size.to_string()));
            query.push(("page", page.to_string()));

            let value = self.fetcher.get_cached(path, &query).await?;
            let batch: Vec<Value> =
                serde_json::from_value(value).map_err(|e| UpstreamError::decode(path, e))?;
            let fetched = batch.len() as u64;
            items.extend(batch);

            if items.len() >= self.config.max_total {
                items.truncate(self.config.max_total);
                break;
            }
            if fetched < self.config.page_size {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}
