use crate::state::AppState;
use axum::Router;

pub mod dataset;
mod dto;
pub mod encoder;
pub mod error;
pub mod handle;
pub mod handlers;
pub mod model;
pub mod row;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::predict_routes())
        .merge(handlers::admin_routes())
}
