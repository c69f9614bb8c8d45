use serde::{Deserialize, Serialize};

pub use crate::store::Note;

#[derive(Debug, Deserialize)]
pub struct CreateNote {
    pub id: String,
    pub text: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// Absent coordinates keep the note's current value.
#[derive(Debug, Deserialize)]
pub struct UpdatePosition {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListNotesResponse {
    pub results: Vec<Note>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteNoteResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAllResponse {
    pub deleted: u64,
}
