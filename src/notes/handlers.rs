use crate::{
    store::{NoteInput, SharedStore},
    Error, Result,
};

use super::{
    CreateNote, DeleteAllResponse, DeleteNoteResponse, ListNotesResponse, NearbyQuery, Note,
    UpdatePosition,
};

pub async fn create_note(args: CreateNote, store: SharedStore) -> Result<Note> {
    let input = NoteInput::new(&args.id, &args.text, args.x, args.y)?;
    Ok(store.create_or_replace(input).await?)
}

pub async fn list_notes(store: SharedStore) -> Result<ListNotesResponse> {
    let results = store.list_all().await?;
    Ok(ListNotesResponse { results })
}

pub async fn update_position(id: String, args: UpdatePosition, store: SharedStore) -> Result<Note> {
    let (x, y) = match (args.x, args.y) {
        (Some(x), Some(y)) => (x, y),
        // A partial body keeps the stored value for the missing axis.
        (x, y) => {
            let current = store
                .list_all()
                .await?
                .into_iter()
                .find(|n| n.id == id)
                .ok_or_else(|| Error::NotFound(format!("note {id} not found")))?;
            (x.unwrap_or(current.x), y.unwrap_or(current.y))
        }
    };

    Ok(store.update_position(&id, x, y).await?)
}

pub async fn delete_note(id: String, store: SharedStore) -> Result<DeleteNoteResponse> {
    let deleted = store.delete(&id).await?;
    Ok(DeleteNoteResponse { deleted })
}

pub async fn delete_all_notes(store: SharedStore) -> Result<DeleteAllResponse> {
    let deleted = store.delete_all().await?;
    Ok(DeleteAllResponse { deleted })
}

pub async fn nearby_notes(query: NearbyQuery, store: SharedStore) -> Result<ListNotesResponse> {
    let results = nearby(store.list_all().await?, query.x, query.y, query.radius);
    Ok(ListNotesResponse { results })
}

/// Euclidean-distance filter over an already listed set; the radius is
/// inclusive. Not a store primitive.
pub fn nearby(notes: Vec<Note>, x: f64, y: f64, radius: f64) -> Vec<Note> {
    notes
        .into_iter()
        .filter(|n| (n.x - x).hypot(n.y - y) <= radius)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note(id: &str, x: f64, y: f64) -> Note {
        let now = Utc::now();
        Note {
            id: id.into(),
            text: "note".into(),
            x,
            y,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn nearby_is_inclusive_on_the_boundary() {
        let notes = vec![note("on", 3.0, 4.0), note("out", 3.0, 4.1)];

        let found = nearby(notes, 0.0, 0.0, 5.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "on");
    }

    #[test]
    fn nearby_of_empty_set_is_empty() {
        assert!(nearby(vec![], 0.0, 0.0, 100.0).is_empty());
    }

    #[test]
    fn nearby_negative_radius_matches_nothing() {
        let notes = vec![note("a", 0.0, 0.0)];
        assert!(nearby(notes, 0.0, 0.0, -1.0).is_empty());
    }
}
