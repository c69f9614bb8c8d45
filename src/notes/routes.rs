use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};

use crate::{state::AppState, store::SharedStore, Result};

use super::handlers;
use super::{CreateNote, NearbyQuery, UpdatePosition};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/notes",
            get(list_notes).post(create_note).delete(delete_all_notes),
        )
        .route("/api/v1/notes/nearby", get(nearby_notes))
        .route("/api/v1/notes/{id}", delete(delete_note))
        .route("/api/v1/notes/{id}/position", put(update_position))
        .with_state(state)
}

async fn create_note(
    State(store): State<SharedStore>,
    Json(args): Json<CreateNote>,
) -> Result<impl IntoResponse> {
    handlers::create_note(args, store)
        .await
        .map(|note| (StatusCode::CREATED, Json(note)))
}

async fn list_notes(State(store): State<SharedStore>) -> Result<impl IntoResponse> {
    handlers::list_notes(store).await.map(Json)
}

async fn nearby_notes(
    Query(query): Query<NearbyQuery>,
    State(store): State<SharedStore>,
) -> Result<impl IntoResponse> {
    handlers::nearby_notes(query, store).await.map(Json)
}

async fn update_position(
    Path(id): Path<String>,
    State(store): State<SharedStore>,
    Json(args): Json<UpdatePosition>,
) -> Result<impl IntoResponse> {
    handlers::update_position(id, args, store).await.map(Json)
}

async fn delete_note(
    Path(id): Path<String>,
    State(store): State<SharedStore>,
) -> Result<impl IntoResponse> {
    handlers::delete_note(id, store).await.map(Json)
}

async fn delete_all_notes(State(store): State<SharedStore>) -> Result<impl IntoResponse> {
    handlers::delete_all_notes(store).await.map(Json)
}
