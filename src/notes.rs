// Note collection: pinning, category and free-text queries

use crate::filter::{NoteFilter, note_matches_query};
use crate::models::{Note, NoteCategory};
use crate::store::Store;

pub type NoteStore = Store<Note>;

impl Store<Note> {
    /// Flip `is_pinned`. Returns false when the id is unknown.
    pub fn toggle_pin(&mut self, id: &str) -> bool {
        self.modify(id, |note| note.is_pinned = !note.is_pinned)
    }

    pub fn by_category(&self, category: NoteCategory) -> Vec<&Note> {
        self.filter(|note| note.category == category)
    }

    pub fn pinned(&self) -> Vec<&Note> {
        self.filter(|note| note.is_pinned)
    }

    /// Case-insensitive match on title, content or any tag.
    /// An empty query returns the whole collection.
    pub fn search(&self, query: &str) -> Vec<&Note> {
        self.filter(|note| note_matches_query(note, query))
    }

    /// Category and search applied together; both must match
    pub fn search_in(&self, category: Option<NoteCategory>, query: &str) -> Vec<&Note> {
        self.query(&NoteFilter {
            category,
            query: Some(query.to_string()),
            ..Default::default()
        })
    }

    pub fn query(&self, filter: &NoteFilter) -> Vec<&Note> {
        self.filter(|note| filter.matches(note))
    }
}
