mod errors;
mod handlers;
mod state;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    routing::{get, post},
};

pub use state::HttpState;

pub fn router(state: HttpState) -> Router<()> {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/file-count", get(handlers::file_count))
        .route("/total-data", get(handlers::total_data))
        .route("/cost", get(handlers::cost))
        .route("/submitJob", post(handlers::submit_job))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    Router::new().nest("/api", api).with_state(state)
}
