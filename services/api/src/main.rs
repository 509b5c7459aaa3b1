mod error;
mod fixtures;
mod integrated;
mod pull_requests;
mod repositories;
mod response_cache;
mod stats;
mod teams;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use velo_analytics::{ActivityMetricsService, CompletionAnalyticsService, CorrelationEngine};
use velo_common::types::ServiceInfo;
use velo_config::{init_tracing, AppConfig};
use velo_upstream::{GitHubClient, GitHubConfig, JiraClient, JiraConfig};

use response_cache::ResponseCache;

pub struct Services {
    pub completion: Arc<CompletionAnalyticsService>,
    pub activity: Arc<ActivityMetricsService>,
    pub correlation: Arc<CorrelationEngine>,
}

impl Services {
    pub fn new(jira: JiraClient, github: GitHubClient) -> Self {
        let completion = Arc::new(CompletionAnalyticsService::new(Arc::new(jira)));
        let activity = Arc::new(ActivityMetricsService::new(Arc::new(github)));
        let correlation = Arc::new(CorrelationEngine::new(
            completion.clone(),
            activity.clone(),
        ));
        Self {
            completion,
            activity,
            correlation,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    /// `None` means mock mode: no upstream is configured and every data
    /// endpoint serves fixture payloads instead of failing.
    pub services: Option<Arc<Services>>,
    pub response_cache: Arc<ResponseCache>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo::new("velo-api"))
}

async fn metrics() -> impl IntoResponse {
    let body = "\
# HELP velo_up Service up indicator\n\
# TYPE velo_up gauge\n\
velo_up 1\n\
# HELP velo_info Service info\n\
# TYPE velo_info gauge\n\
velo_info{service=\"velo-api\",version=\"0.1.0\"} 1\n";

    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse::<HeaderValue>().unwrap(),
            "http://127.0.0.1:3000".parse::<HeaderValue>().unwrap(),
        ])
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/metrics", get(metrics))
        .merge(teams::router())
        .merge(stats::router())
        .merge(repositories::router())
        .merge(pull_requests::router())
        .merge(integrated::router())
        .layer(cors)
        .with_state(state)
}

fn build_services(config: &AppConfig) -> Option<Arc<Services>> {
    if config.mock_mode {
        tracing::info!("mock mode enabled, serving fixture data");
        return None;
    }
    let (jira_config, github_config) = match (JiraConfig::from_env(), GitHubConfig::from_env()) {
        (Some(jira), Some(github)) => (jira, github),
        _ => {
            tracing::warn!("upstream credentials missing, serving fixture data");
            return None;
        }
    };

    let jira = JiraClient::new(jira_config).expect("failed to build tracker HTTP client");
    let github = GitHubClient::new(github_config).expect("failed to build source-control HTTP client");
    Some(Arc::new(Services::new(jira, github)))
}

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("failed to load config");
    init_tracing(&config.log_level);
    tracing::info!(service = "velo-api", "starting");

    let state = AppState {
        services: build_services(&config),
        response_cache: Arc::new(ResponseCache::new(config.cache_ttl_secs)),
    };

    let app = build_router(state);
    let addr: SocketAddr = config.bind_addr().parse().expect("invalid bind address");

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
