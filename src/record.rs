// Entity trait shared by every persisted collection

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

/// Core trait that any collection entity must implement
pub trait Record: Serialize + DeserializeOwned + Clone + 'static {
    /// Caller-supplied fields for a new entity (no id or timestamps)
    type Draft;

    /// Partial update; `None` fields are left untouched
    type Patch;

    /// Storage key the whole collection is persisted under
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Build the entity from a draft, assigning identity and timestamps
    fn from_draft(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Shallow-merge the provided fields. Timestamps are handled by the store.
    fn apply(&mut self, patch: Self::Patch);

    fn id(&self) -> &str;

    fn touch(&mut self, now: DateTime<Utc>);
}

/// Generate a fresh entity id (UUIDv7: unique and time-ordered)
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
