pub mod handlers;
pub mod requests;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(handlers::get_stats))
}
