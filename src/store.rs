// Generic in-memory collection persisted through the key-value adapter

use crate::clock::Clock;
use crate::kv::SharedKv;
use crate::record::{Record, new_id};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Observer<T> = Box<dyn FnMut(&[T])>;

/// Insertion-ordered collection of one entity type.
///
/// Every mutation rewrites the whole collection under `T::collection_name()`
/// and then notifies observers with the new snapshot. Lookups are linear scans.
pub struct Store<T: Record> {
    items: Vec<T>,
    // Stored entries that no longer parse, written back untouched on commit
    unparsed: Vec<Value>,
    kv: SharedKv,
    clock: Arc<dyn Clock>,
    observers: Vec<Observer<T>>,
}

impl<T: Record> Store<T> {
    /// Load the collection from the adapter. Entries that no longer parse are
    /// hidden from the collection but kept in storage.
    pub fn open(kv: SharedKv, clock: Arc<dyn Clock>) -> Self {
        let collection = T::collection_name();
        let raw: Option<Vec<Value>> = kv.borrow_mut().get_as(collection);

        let mut items = Vec::new();
        let mut unparsed = Vec::new();
        for (index, value) in raw.unwrap_or_default().into_iter().enumerate() {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(collection, index, error = ?e, "Failed to parse stored entity, keeping raw value");
                    unparsed.push(value);
                }
            }
        }

        info!(collection, count = items.len(), unparsed = unparsed.len(), "Loaded collection");

        Self {
            items,
            unparsed,
            kv,
            clock,
            observers: Vec::new(),
        }
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Entities matching `pred`, original order preserved
    pub fn filter<F>(&self, pred: F) -> Vec<&T>
    where
        F: Fn(&T) -> bool,
    {
        self.items.iter().filter(|item| pred(item)).collect()
    }

    /// Append a new entity built from `draft`. No validation happens here.
    pub fn add(&mut self, draft: T::Draft) -> String {
        let id = new_id();
        let item = T::from_draft(id.clone(), draft, self.clock.now());
        self.items.push(item);

        debug!(collection = T::collection_name(), id = %id, "Added entity");
        self.commit();
        id
    }

    /// Merge `patch` into the entity with `id`. Returns false when absent.
    pub fn update(&mut self, id: &str, patch: T::Patch) -> bool {
        self.modify(id, |item| item.apply(patch))
    }

    /// Remove the entity with `id`. Returns false when absent.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        if self.items.len() == before {
            return false;
        }

        debug!(collection = T::collection_name(), id, "Deleted entity");
        self.commit();
        true
    }

    /// Insert entities, replacing any with the same id in place.
    /// Returns how many were new.
    pub fn upsert_all(&mut self, incoming: Vec<T>) -> usize {
        let mut added = 0;
        for item in incoming {
            match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
                Some(existing) => *existing = item,
                None => {
                    self.items.push(item);
                    added += 1;
                }
            }
        }
        self.commit();
        added
    }

    /// Register a callback run with the new snapshot after every mutation
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&[T]) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Apply `f` to the entity with `id`, refresh `updated_at` and persist
    pub(crate) fn modify<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let now = self.clock.now();
        let Some(item) = self.items.iter_mut().find(|item| item.id() == id) else {
            debug!(collection = T::collection_name(), id, "No entity to modify");
            return false;
        };

        f(item);
        item.touch(now);
        self.commit();
        true
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    fn commit(&mut self) {
        let collection = T::collection_name();
        if self.unparsed.is_empty() {
            self.kv.borrow_mut().put(collection, &self.items);
        } else {
            let mut values = Vec::with_capacity(self.items.len() + self.unparsed.len());
            for item in &self.items {
                match serde_json::to_value(item) {
                    Ok(value) => values.push(value),
                    Err(e) => warn!(collection, id = item.id(), error = ?e, "Failed to serialize entity"),
                }
            }
            values.extend(self.unparsed.iter().cloned());
            self.kv.borrow_mut().set(collection, Value::Array(values), None);
        }
        for observer in &mut self.observers {
            observer(&self.items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::kv::{DEFAULT_PREFIX, KvStore, SqliteMedium};
    use crate::models::{Note, NoteDraft, NotePatch, Task, TaskDraft, TaskPatch, TaskPriority};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (SharedKv, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let kv = KvStore::new(DEFAULT_PREFIX, Box::new(SqliteMedium::in_memory().unwrap()), clock.clone()).shared();
        (kv, clock)
    }

    #[test]
    fn test_add_assigns_identity_and_timestamps() {
        let (kv, clock) = setup();
        let mut store: Store<Task> = Store::open(kv, clock.clone());

        let mut draft = TaskDraft::new("Buy milk");
        draft.priority = TaskPriority::High;
        draft.tags = Some(vec!["errand".to_string()]);
        let id = store.add(draft.clone());

        let task = store.get(&id).unwrap();
        assert!(!task.id.is_empty());
        assert_eq!(task.title, draft.title);
        assert_eq!(task.priority, draft.priority);
        assert_eq!(task.tags, draft.tags);
        assert_eq!(task.completed, draft.completed);
        assert_eq!(task.created_at, clock.now());
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_update_changes_only_patched_field() {
        let (kv, clock) = setup();
        let mut store: Store<Task> = Store::open(kv, clock.clone());
        let id = store.add(TaskDraft::new("Original"));
        let before = store.get(&id).unwrap().clone();

        clock.advance(Duration::minutes(5));
        let found = store.update(
            &id,
            TaskPatch {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        );
        assert!(found);

        let after = store.get(&id).unwrap();
        assert_eq!(after.title, "Renamed");
        assert_eq!(after.updated_at, before.updated_at + Duration::minutes(5));
        assert_eq!(after.created_at, before.created_at);

        let mut expected = before.clone();
        expected.title = "Renamed".to_string();
        expected.updated_at = after.updated_at;
        assert_eq!(*after, expected);
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let (kv, clock) = setup();
        let mut store: Store<Note> = Store::open(kv, clock);
        store.add(NoteDraft::new("One", ""));

        let snapshot = store.all().to_vec();
        assert!(!store.update("missing", NotePatch::default()));
        assert_eq!(store.all(), snapshot.as_slice());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (kv, clock) = setup();
        let mut store: Store<Task> = Store::open(kv, clock);
        let keep = store.add(TaskDraft::new("Keep"));
        let gone = store.add(TaskDraft::new("Gone"));

        assert!(store.delete(&gone));
        assert_eq!(store.len(), 1);

        assert!(!store.delete(&gone));
        assert_eq!(store.len(), 1);
        assert!(store.get(&keep).is_some());
    }

    #[test]
    fn test_mutations_persist_full_collection() {
        let (kv, clock) = setup();
        {
            let mut store: Store<Task> = Store::open(kv.clone(), clock.clone());
            store.add(TaskDraft::new("First"));
            store.add(TaskDraft::new("Second"));
        }

        let persisted = kv.borrow_mut().get("tasks").unwrap();
        assert_eq!(persisted.as_array().unwrap().len(), 2);

        let reopened: Store<Task> = Store::open(kv, clock);
        let titles: Vec<&str> = reopened.all().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn test_open_hides_but_keeps_unparseable_entities() {
        let (kv, clock) = setup();
        let good = {
            let mut store: Store<Task> = Store::open(kv.clone(), clock.clone());
            let id = store.add(TaskDraft::new("Valid"));
            serde_json::to_value(store.get(&id).unwrap()).unwrap()
        };
        kv.borrow_mut()
            .set("tasks", json!([good, {"id": "x", "title": "bad", "priority": "critical"}]), None);

        let mut store: Store<Task> = Store::open(kv.clone(), clock);
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].title, "Valid");

        // the bad entry survives the next write
        store.add(TaskDraft::new("Later"));
        let persisted = kv.borrow_mut().get("tasks").unwrap();
        let persisted = persisted.as_array().unwrap();
        assert_eq!(persisted.len(), 3);
        assert_eq!(persisted[2]["priority"], "critical");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_observers_receive_snapshots() {
        let (kv, clock) = setup();
        let mut store: Store<Task> = Store::open(kv, clock);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |tasks: &[Task]| sink.borrow_mut().push(tasks.len()));

        let id = store.add(TaskDraft::new("A"));
        store.add(TaskDraft::new("B"));
        store.delete(&id);
        store.delete(&id);

        assert_eq!(*seen.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn test_upsert_all_replaces_by_id() {
        let (kv, clock) = setup();
        let mut store: Store<Task> = Store::open(kv, clock);
        let id = store.add(TaskDraft::new("Old title"));

        let mut replacement = store.get(&id).unwrap().clone();
        replacement.title = "New title".to_string();
        let mut fresh = replacement.clone();
        fresh.id = "imported-1".to_string();

        let added = store.upsert_all(vec![replacement, fresh]);
        assert_eq!(added, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&id).unwrap().title, "New title");
    }
}
