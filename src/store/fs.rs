use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use uuid::Uuid;

use super::{Error, Note, NoteInput, NoteStore, Result};

/// File-per-record JSON store: one `<id>.json` under the data directory.
///
/// Writes go to a uniquely named temp file first and are renamed into
/// place, so a same-key race ends with one intact record (last rename
/// wins) and readers never see a partial file.
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(id)))
    }

    async fn read_record(&self, id: &str) -> Result<Option<Note>> {
        match fs::read(self.record_path(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_record(&self, note: &Note) -> Result<()> {
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", file_stem(&note.id), Uuid::new_v4()));
        fs::write(&tmp, serde_json::to_vec_pretty(note)?).await?;
        fs::rename(&tmp, self.record_path(&note.id)).await?;
        Ok(())
    }
}

/// Ids are opaque caller-supplied strings; escape anything that is not
/// filename-safe so `../x` or `a/b` cannot leave the data directory.
/// The escape is fixed-width (six hex digits covers all of Unicode) so
/// the id-to-filename mapping stays one-to-one.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c.to_string()
            } else {
                format!("%{:06X}", c as u32)
            }
        })
        .collect()
}

fn is_record(path: &Path) -> bool {
    path.extension().map(|e| e == "json").unwrap_or(false)
}

#[async_trait]
impl NoteStore for FsStore {
    async fn create_or_replace(&self, input: NoteInput) -> Result<Note> {
        let now = Utc::now();
        let created_at = match self.read_record(&input.id).await? {
            Some(existing) => existing.created_at,
            None => now,
        };

        let note = Note {
            id: input.id,
            text: input.text,
            x: input.x,
            y: input.y,
            created_at,
            updated_at: now,
        };
        self.write_record(&note).await?;
        Ok(note)
    }

    async fn list_all(&self) -> Result<Vec<Note>> {
        // A missing or unreadable directory is a storage error, not an
        // empty canvas.
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut notes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_record(&path) {
                continue;
            }
            let bytes = fs::read(&path).await?;
            notes.push(serde_json::from_slice::<Note>(&bytes)?);
        }

        notes.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(notes)
    }

    async fn update_position(&self, id: &str, x: f64, y: f64) -> Result<Note> {
        let mut note = self
            .read_record(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("note {id} not found")))?;

        note.x = x;
        note.y = y;
        note.updated_at = Utc::now();
        self.write_record(&note).await?;
        Ok(note)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        match fs::remove_file(self.record_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_record(&path) {
                continue;
            }
            fs::remove_file(&path).await?;
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str, text: &str, x: f64, y: f64) -> NoteInput {
        NoteInput::new(id, text, Some(x), Some(y)).unwrap()
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = FsStore::open(dir.path()).await.unwrap();
        let created = store
            .create_or_replace(input("A", "hello", 10.25, -0.5))
            .await
            .unwrap();
        drop(store);

        // A fresh handle over the same directory sees the same note,
        // coordinates bit-exact.
        let store = FsStore::open(dir.path()).await.unwrap();
        let all = store.list_all().await.unwrap();
        assert_eq!(all, vec![created]);
    }

    #[tokio::test]
    async fn coordinates_round_trip_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();

        let x = 0.1 + 0.2; // 0.30000000000000004
        let y = f64::MAX / 3.0;
        store
            .create_or_replace(input("A", "hello", x, y))
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all[0].x, x);
        assert_eq!(all[0].y, y);
    }

    #[tokio::test]
    async fn replace_keeps_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();

        let first = store
            .create_or_replace(input("A", "hello", 1.0, 2.0))
            .await
            .unwrap();
        let second = store
            .create_or_replace(input("A", "world", 3.0, 4.0))
            .await
            .unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.text, "world");
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_position_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();

        let err = store.update_position("nope", 1.0, 1.0).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();

        store
            .create_or_replace(input("A", "hello", 0.0, 0.0))
            .await
            .unwrap();
        assert!(store.delete("A").await.unwrap());
        assert!(!store.delete("A").await.unwrap());
    }

    #[tokio::test]
    async fn delete_all_counts() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();

        for id in ["a", "b", "c"] {
            store
                .create_or_replace(input(id, "note", 0.0, 0.0))
                .await
                .unwrap();
        }
        assert_eq!(store.delete_all().await.unwrap(), 3);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hostile_ids_stay_inside_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();

        let id = "../escape/attempt";
        store
            .create_or_replace(input(id, "hello", 0.0, 0.0))
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);

        // Nothing was written outside the directory.
        assert!(!dir.path().join("..").join("escape").exists());
        assert!(store.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn distinct_ids_never_share_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).await.unwrap();

        // An astral-plane char followed by nothing, and a BMP char
        // followed by a digit: under a variable-width escape both ids
        // would collapse onto the same filename.
        store
            .create_or_replace(input("\u{1F600}", "first", 0.0, 0.0))
            .await
            .unwrap();
        store
            .create_or_replace(input("\u{1F60}0", "second", 0.0, 0.0))
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        let texts: Vec<_> = all.iter().map(|n| n.text.as_str()).collect();
        assert!(texts.contains(&"first"));
        assert!(texts.contains(&"second"));
    }

    #[tokio::test]
    async fn missing_directory_is_an_error_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path().join("data")).await.unwrap();

        tokio::fs::remove_dir_all(dir.path().join("data")).await.unwrap();

        assert!(matches!(
            store.list_all().await.unwrap_err(),
            Error::Storage(_)
        ));
    }
}
