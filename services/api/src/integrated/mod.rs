pub mod handlers;
pub mod requests;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/metrics/integrated", get(handlers::get_integrated))
}
