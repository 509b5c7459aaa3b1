pub mod handlers;
pub mod requests;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/pull-requests", get(handlers::get_pull_requests))
}
