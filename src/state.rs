use axum::extract::FromRef;

use crate::store::SharedStore;

#[derive(FromRef, Clone)]
pub struct AppState {
    pub store: SharedStore,
}
