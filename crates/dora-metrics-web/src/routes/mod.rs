mod events;
pub mod health;

use axum::{
    routing::get,
    Router,
};

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/events", events::router())
}
