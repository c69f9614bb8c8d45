use axum::{response::IntoResponse, routing::get, Json, Router};
use rand::Rng;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{config, notes, state::AppState};

pub fn create(state: AppState) -> Router {
    Router::new()
        .route("/__version__", get(version))
        .route("/__heartbeat__", get(heartbeat))
        .route("/__lbheartbeat__", get(lbheartbeat))
        .merge(notes::router(state))
        // The canvas is served from another origin
        .layer(CorsLayer::permissive())
}

async fn version() -> impl IntoResponse {
    let config = &config();
    Json(json!({
        "source" : config.source,
        "version": config.version,
        "commit" : config.git_commit,
        "build"  : config.pipeline_id
    }))
}

async fn heartbeat() -> impl IntoResponse {
    let mut rng = rand::thread_rng();
    let random: u32 = rng.gen_range(0..=10000);

    Json(json!({
        "status" : "ok",
        "random": random,
    }))
}

async fn lbheartbeat() -> impl IntoResponse {
    ""
}
