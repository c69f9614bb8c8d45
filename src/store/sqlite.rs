use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use rusqlite::{params, Row};
use rusqlite_migration::{Migrations, M};
use tokio_rusqlite::Connection;

use super::{Error, Note, NoteInput, NoteStore, Result};

lazy_static! {
    static ref MIGRATIONS: Migrations<'static> = Migrations::new(vec![M::up(
        r#"
        CREATE TABLE notes (
            id TEXT PRIMARY KEY NOT NULL,
            text TEXT NOT NULL,
            x REAL NOT NULL DEFAULT 0,
            y REAL NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        );
        "#
    )]);
}

const NOTE_COLUMNS: &str = "id, text, x, y, created_at, updated_at";

impl<'a> TryFrom<&Row<'a>> for Note {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            x: row.get(2)?,
            y: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

/// Sqlite-backed store. A single serialized connection; every operation is
/// one statement, so same-key races resolve to whichever statement ran last.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref().to_path_buf()).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            MIGRATIONS
                .to_latest(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(e.into()))?;

            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;

            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl NoteStore for SqliteStore {
    async fn create_or_replace(&self, input: NoteInput) -> Result<Note> {
        let now = Utc::now();
        let note = self
            .conn
            .call(move |conn| {
                let note = conn.query_row(
                    r#"INSERT INTO notes (id, text, x, y, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                    ON CONFLICT(id) DO UPDATE SET
                        text = excluded.text,
                        x = excluded.x,
                        y = excluded.y,
                        updated_at = excluded.updated_at
                    RETURNING id, text, x, y, created_at, updated_at"#,
                    params![input.id, input.text, input.x, input.y, now],
                    |row| Note::try_from(row),
                )?;
                Ok(note)
            })
            .await?;
        Ok(note)
    }

    async fn list_all(&self) -> Result<Vec<Note>> {
        let notes = self
            .conn
            .call(|conn| {
                let notes = conn
                    .prepare(&format!(
                        "SELECT {NOTE_COLUMNS} FROM notes ORDER BY created_at ASC, id ASC"
                    ))?
                    .query_map([], |row| Note::try_from(row))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(notes)
            })
            .await?;
        Ok(notes)
    }

    async fn update_position(&self, id: &str, x: f64, y: f64) -> Result<Note> {
        let id = id.to_owned();
        let now = Utc::now();
        self.conn
            .call({
                let id = id.clone();
                move |conn| {
                    let note = conn.query_row(
                        r#"UPDATE notes SET x = ?2, y = ?3, updated_at = ?4
                        WHERE id = ?1
                        RETURNING id, text, x, y, created_at, updated_at"#,
                        params![id, x, y, now],
                        |row| Note::try_from(row),
                    )?;
                    Ok(note)
                }
            })
            .await
            .map_err(Error::from)
            .map_err(|e| e.not_found_message(format!("note {id} not found")))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_owned();
        let removed = self
            .conn
            .call(move |conn| {
                let n = conn.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
                Ok(n > 0)
            })
            .await?;
        Ok(removed)
    }

    async fn delete_all(&self) -> Result<u64> {
        let removed = self
            .conn
            .call(|conn| {
                let n = conn.execute("DELETE FROM notes", [])?;
                Ok(n as u64)
            })
            .await?;
        Ok(removed)
    }
}
