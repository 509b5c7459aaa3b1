use reqwest::StatusCode;
use thiserror::Error;
use velo_common::error::VeloError;

/// Normalized classification of an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// 401 / 403 — bad or missing credentials, insufficient permissions.
    Auth,
    /// 404 — the queried entity does not exist upstream.
    NotFound,
    /// 429 — the upstream rate limit kicked in.
    RateLimited,
    /// 5xx — the upstream itself is failing; eligible for stale fallback.
    Server,
    /// Anything else, including transport and decode failures.
    Unknown,
}

#[derive(Debug, Error)]
#[error("{method} {endpoint} failed: {message}")]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub endpoint: String,
    pub method: String,
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn from_status(endpoint: &str, status: StatusCode, body: &str) -> Self {
        let kind = match status.as_u16() {
            401 | 403 => UpstreamErrorKind::Auth,
            404 => UpstreamErrorKind::NotFound,
            429 => UpstreamErrorKind::RateLimited,
            s if s >= 500 => UpstreamErrorKind::Server,
            _ => UpstreamErrorKind::Unknown,
        };
        // Error bodies can be large HTML pages; keep a short diagnostic slice
        let snippet: String = body.chars().take(200).collect();
        Self {
            kind,
            endpoint: endpoint.to_owned(),
            method: "GET".to_owned(),
            status: Some(status.as_u16()),
            message: format!("HTTP {status}: {snippet}"),
        }
    }

    /// Transport-level failure (connect, timeout). The reqwest error text
    /// embeds the full request URL, so only the failure class is kept.
    pub fn transport(endpoint: &str, err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_owned()
        } else if err.is_connect() {
            "connection failed".to_owned()
        } else {
            "transport error".to_owned()
        };
        Self {
            kind: UpstreamErrorKind::Unknown,
            endpoint: endpoint.to_owned(),
            method: "GET".to_owned(),
            status: None,
            message,
        }
    }

    pub fn decode(endpoint: &str, detail: impl std::fmt::Display) -> Self {
        Self {
            kind: UpstreamErrorKind::Unknown,
            endpoint: endpoint.to_owned(),
            method: "GET".to_owned(),
            status: None,
            message: format!("response decode failed: {detail}"),
        }
    }
}

impl From<UpstreamError> for VeloError {
    fn from(err: UpstreamError) -> Self {
        let message = err.to_string();
        match err.kind {
            UpstreamErrorKind::Auth => VeloError::Auth(message),
            UpstreamErrorKind::NotFound => VeloError::NotFound(message),
            UpstreamErrorKind::RateLimited => VeloError::RateLimited(message),
            UpstreamErrorKind::Server => VeloError::UpstreamServer(message),
            UpstreamErrorKind::Unknown => VeloError::Unknown(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        let cases = [
            (StatusCode::UNAUTHORIZED, UpstreamErrorKind::Auth),
            (StatusCode::FORBIDDEN, UpstreamErrorKind::Auth),
            (StatusCode::NOT_FOUND, UpstreamErrorKind::NotFound),
            (StatusCode::TOO_MANY_REQUESTS, UpstreamErrorKind::RateLimited),
            (StatusCode::INTERNAL_SERVER_ERROR, UpstreamErrorKind::Server),
            (StatusCode::BAD_GATEWAY, UpstreamErrorKind::Server),
            (StatusCode::IM_A_TEAPOT, UpstreamErrorKind::Unknown),
        ];
        for (status, kind) in cases {
            let err = UpstreamError::from_status("/e", status, "body");
            assert_eq!(err.kind, kind, "status {status}");
            assert_eq!(err.status, Some(status.as_u16()));
        }
    }

    #[test]
    fn error_carries_endpoint_and_method() {
        let err = UpstreamError::from_status("/rest/agile/1.0/board", StatusCode::NOT_FOUND, "");
        assert_eq!(err.endpoint, "/rest/agile/1.0/board");
        assert_eq!(err.method, "GET");
        assert!(err.to_string().contains("/rest/agile/1.0/board"));
    }

    #[test]
    fn body_snippet_is_truncated() {
        let body = "x".repeat(5000);
        let err = UpstreamError::from_status("/e", StatusCode::BAD_GATEWAY, &body);
        assert!(err.message.len() < 300);
    }

    #[test]
    fn converts_into_service_error_by_kind() {
        let auth = UpstreamError::from_status("/e", StatusCode::FORBIDDEN, "");
        assert!(matches!(VeloError::from(auth), VeloError::Auth(_)));

        let missing = UpstreamError::from_status("/e", StatusCode::NOT_FOUND, "");
        assert!(matches!(VeloError::from(missing), VeloError::NotFound(_)));

        let server = UpstreamError::from_status("/e", StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(matches!(VeloError::from(server), VeloError::UpstreamServer(_)));
    }
}
