//! The note store: the one durable component of the service.
//!
//! The contract is five operations keyed by a caller-supplied string id.
//! Concrete backends implement [`NoteStore`]; the rest of the crate only
//! sees `Arc<dyn NoteStore>`, picked once at startup.

mod fs;
mod sqlite;

pub use fs::FsStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

pub type SharedStore = Arc<dyn NoteStore>;

/// Maximum note text length, in characters, after trimming.
pub const MAX_TEXT_CHARS: usize = 100;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("validation")]
    Validation(String),
    #[error("not_found")]
    NotFound(String),
    #[error("storage")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    pub fn not_found_message(self, message: impl Into<String>) -> Self {
        if matches!(self, Self::NotFound(_)) {
            return Self::NotFound(message.into());
        }
        self
    }
}

impl From<tokio_rusqlite::Error> for Error {
    fn from(error: tokio_rusqlite::Error) -> Self {
        match error {
            tokio_rusqlite::Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows) => {
                Self::NotFound("Not found".into())
            }
            error => Self::Storage(Box::new(error)),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound("Not found".into()),
            error => Self::Storage(Box::new(error)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Storage(Box::new(error))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Storage(Box::new(error))
    }
}

/// A single stored text entry with position and identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for [`NoteStore::create_or_replace`].
///
/// Construction is the only validation point: both backends may assume a
/// `NoteInput` carries a non-empty id and trimmed text of 1..=100 chars.
#[derive(Debug, Clone)]
pub struct NoteInput {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl NoteInput {
    pub fn new(
        id: impl AsRef<str>,
        text: impl AsRef<str>,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Result<Self> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(Error::Validation("id must not be empty".into()));
        }

        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(Error::Validation("text must not be empty".into()));
        }
        let chars = text.chars().count();
        if chars > MAX_TEXT_CHARS {
            return Err(Error::Validation(format!(
                "text is {chars} characters, max is {MAX_TEXT_CHARS}"
            )));
        }

        Ok(Self {
            id: id.to_owned(),
            text: text.to_owned(),
            x: x.unwrap_or(0.0),
            y: y.unwrap_or(0.0),
        })
    }
}

/// The durable note collection.
///
/// Implementations guarantee per-key atomicity: concurrent upserts of the
/// same id resolve to exactly one of the inputs, and reads never observe a
/// half-written note. No cross-key ordering is promised.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Upsert. A colliding id replaces text and position and refreshes
    /// `updated_at`, keeping the original `created_at`.
    async fn create_or_replace(&self, input: NoteInput) -> Result<Note>;

    /// Every stored note, ordered by `created_at` ascending, ties broken
    /// by id. An empty store yields an empty vec; an unreadable backend is
    /// an error, not an empty result.
    async fn list_all(&self) -> Result<Vec<Note>>;

    /// Moves an existing note. `NotFound` if the id is unknown; never
    /// creates a note. Text and `created_at` are untouched.
    async fn update_position(&self, id: &str, x: f64, y: f64) -> Result<Note>;

    /// Returns whether a note was actually removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Removes every note, returning the count removed.
    async fn delete_all(&self) -> Result<u64>;
}
