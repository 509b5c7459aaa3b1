use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use velo_cache::{cache_key, TtlCache};

use crate::error::{UpstreamError, UpstreamErrorKind};

/// Per-request authentication scheme of an upstream.
pub(crate) enum Auth {
    Basic { username: String, token: String },
    Bearer { token: String },
}

/// Shared request path for both upstream clients: TTL cache in front of a
/// retrying GET, with stale fallback on upstream server errors.
pub(crate) struct Fetcher {
    http: Client,
    base_url: String,
    auth: Auth,
    max_retries: u32,
    ttl_secs: u64,
    cache: TtlCache<Value>,
}

impl Fetcher {
    pub(crate) fn new(
        http: Client,
        base_url: &str,
        auth: Auth,
        max_retries: u32,
        ttl_secs: u64,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth,
            max_retries,
            ttl_secs,
            cache: TtlCache::with_system_clock(ttl_secs),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_base_url(&mut self, base_url: &str) {
        self.base_url = base_url.trim_end_matches('/').to_owned();
    }

    #[cfg(test)]
    pub(crate) fn set_clock(&mut self, clock: std::sync::Arc<dyn velo_cache::Clock>) {
        self.cache = TtlCache::new(self.ttl_secs, clock);
    }

    /// Cached GET. A fresh cache entry short-circuits the network entirely;
    /// a server-side failure on a warm key degrades to the stale entry.
    pub(crate) async fn get_cached(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, UpstreamError> {
        let key = cache_key(path, query);
        if let Some(hit) = self.cache.get_fresh(&key) {
            tracing::debug!(endpoint = path, "cache hit");
            return Ok(hit);
        }

        match self.get_with_retry(path, query).await {
            Ok(value) => {
                self.cache.insert(&key, value.clone());
                Ok(value)
            }
            Err(err) if err.kind == UpstreamErrorKind::Server => match self.cache.get_stale(&key) {
                Some(stale) => {
                    tracing::warn!(
                        endpoint = %err.endpoint,
                        status = ?err.status,
                        "upstream server error, serving stale cache entry"
                    );
                    Ok(stale)
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    async fn get_with_retry(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error: Option<UpstreamError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff_secs = std::cmp::min(1u64 << attempt, 30);
                tracing::warn!(attempt, backoff_secs, endpoint = path, "retrying after backoff");
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            }

            let request = self.http.get(&url).query(query);
            let request = match &self.auth {
                Auth::Basic { username, token } => request.basic_auth(username, Some(token)),
                Auth::Bearer { token } => request.bearer_auth(token),
            };

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if e.is_timeout() || e.is_connect() {
                        last_error = Some(UpstreamError::transport(path, &e));
                        continue;
                    }
                    return Err(UpstreamError::transport(path, &e));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<Value>()
                    .await
                    .map_err(|e| UpstreamError::decode(path, e));
            }

            // Honor Retry-After for 429, then retry
            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    let wait = std::cmp::min(retry_after, 60);
                    tracing::warn!(wait, endpoint = path, "rate-limited, waiting Retry-After");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                last_error = Some(UpstreamError::from_status(path, status, ""));
                continue;
            }

            // Retry on 5xx
            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = Some(UpstreamError::from_status(path, status, &body));
                continue;
            }

            // Fail fast on remaining 4xx
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::from_status(path, status, &body));
        }

        Err(last_error.unwrap_or_else(|| UpstreamError {
            kind: UpstreamErrorKind::Unknown,
            endpoint: path.to_owned(),
            method: "GET".to_owned(),
            status: None,
            message: "retries exhausted".to_owned(),
        }))
    }
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
