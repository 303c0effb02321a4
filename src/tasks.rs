// Task collection: completion toggling and due-date queries

use crate::dates::add_clamped;
use crate::filter::{TaskFilter, search_tasks};
use crate::models::{Task, TaskCategory};
use crate::store::Store;
use chrono::{DateTime, Duration, Utc};

pub type TaskStore = Store<Task>;

/// Default look-ahead for `upcoming`
pub const DEFAULT_UPCOMING_DAYS: u32 = 7;

impl Store<Task> {
    /// Flip `completed`. Returns false when the id is unknown.
    pub fn toggle_complete(&mut self, id: &str) -> bool {
        self.modify(id, |task| task.completed = !task.completed)
    }

    pub fn by_category(&self, category: TaskCategory) -> Vec<&Task> {
        self.filter(|task| task.category == category)
    }

    /// Open tasks whose due date has passed
    pub fn overdue(&self) -> Vec<&Task> {
        self.overdue_at(self.now())
    }

    pub fn overdue_at(&self, now: DateTime<Utc>) -> Vec<&Task> {
        self.filter(|task| !task.completed && task.due_date.is_some_and(|due| due < now))
    }

    /// Open tasks due within the next `days` days, both ends inclusive
    pub fn upcoming(&self, days: u32) -> Vec<&Task> {
        self.upcoming_at(self.now(), days)
    }

    pub fn upcoming_at(&self, now: DateTime<Utc>, days: u32) -> Vec<&Task> {
        let horizon = Duration::try_days(i64::from(days))
            .map_or(DateTime::<Utc>::MAX_UTC, |window| add_clamped(now, window));
        self.filter(|task| {
            !task.completed && task.due_date.is_some_and(|due| now <= due && due <= horizon)
        })
    }

    pub fn completed(&self) -> Vec<&Task> {
        self.filter(|task| task.completed)
    }

    pub fn pending(&self) -> Vec<&Task> {
        self.filter(|task| !task.completed)
    }

    pub fn search(&self, query: &str) -> Vec<&Task> {
        search_tasks(self.all(), query)
    }

    pub fn query(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.filter(|task| filter.matches(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::kv::{DEFAULT_PREFIX, KvStore, SqliteMedium};
    use crate::models::{TaskDraft, TaskPatch};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn store() -> (TaskStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let kv = KvStore::new(DEFAULT_PREFIX, Box::new(SqliteMedium::in_memory().unwrap()), clock.clone()).shared();
        (TaskStore::open(kv, clock.clone()), clock)
    }

    fn due(store: &mut TaskStore, title: &str, due: Option<DateTime<Utc>>) -> String {
        let mut draft = TaskDraft::new(title);
        draft.due_date = due;
        store.add(draft)
    }

    #[test]
    fn test_toggle_complete_refreshes_updated_at() {
        let (mut store, clock) = store();
        let id = due(&mut store, "Task", None);

        clock.advance(Duration::seconds(30));
        assert!(store.toggle_complete(&id));
        let task = store.get(&id).unwrap();
        assert!(task.completed);
        assert_eq!(task.updated_at, start() + Duration::seconds(30));

        assert!(store.toggle_complete(&id));
        assert!(!store.get(&id).unwrap().completed);
        assert!(!store.toggle_complete("missing"));
    }

    #[test]
    fn test_by_category_preserves_order() {
        let (mut store, _clock) = store();
        for (title, category) in [
            ("a", TaskCategory::Work),
            ("b", TaskCategory::Health),
            ("c", TaskCategory::Work),
        ] {
            let mut draft = TaskDraft::new(title);
            draft.category = category;
            store.add(draft);
        }

        let titles: Vec<&str> = store
            .by_category(TaskCategory::Work)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["a", "c"]);
    }

    #[test]
    fn test_overdue_excludes_completed_and_undated() {
        let (mut store, _clock) = store();
        let late = due(&mut store, "Late", Some(start() - Duration::hours(1)));
        let done = due(&mut store, "Done", Some(start() - Duration::hours(1)));
        due(&mut store, "Undated", None);
        due(&mut store, "Future", Some(start() + Duration::hours(1)));
        due(&mut store, "Exactly now", Some(start()));
        store.toggle_complete(&done);

        let overdue: Vec<&str> = store.overdue().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(overdue, vec![late.as_str()]);
    }

    #[test]
    fn test_upcoming_window_is_inclusive() {
        let (mut store, _clock) = store();
        let edge = due(&mut store, "Edge", Some(Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap()));
        due(&mut store, "Past edge", Some(Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 1).unwrap()));
        let now_due = due(&mut store, "Now", Some(start()));
        due(&mut store, "Yesterday", Some(start() - Duration::days(1)));

        let ids: Vec<&str> = store
            .upcoming(DEFAULT_UPCOMING_DAYS)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec![edge.as_str(), now_due.as_str()]);
    }

    #[test]
    fn test_upcoming_skips_completed() {
        let (mut store, _clock) = store();
        let id = due(&mut store, "Soon", Some(start() + Duration::days(2)));
        store.update(
            &id,
            TaskPatch {
                completed: Some(true),
                ..Default::default()
            },
        );
        assert!(store.upcoming(7).is_empty());
        assert_eq!(store.completed().len(), 1);
        assert!(store.pending().is_empty());
    }

    #[test]
    fn test_query_combines_filter_and_search() {
        let (mut store, _clock) = store();
        let mut draft = TaskDraft::new("Pay rent");
        draft.category = TaskCategory::Finance;
        store.add(draft);
        store.add(TaskDraft::new("Pay attention"));

        let filter = TaskFilter {
            category: Some(TaskCategory::Finance),
            query: Some("pay".to_string()),
            ..Default::default()
        };
        assert_eq!(store.query(&filter).len(), 1);
        assert_eq!(store.search("PAY").len(), 2);
    }

    #[test]
    fn test_huge_upcoming_window_does_not_overflow() {
        let (mut store, _clock) = store();
        due(&mut store, "Far", Some(start() + Duration::days(365 * 5000)));
        due(&mut store, "Past", Some(start() - Duration::days(1)));

        assert_eq!(store.upcoming(100_000_000).len(), 1);
        assert_eq!(store.upcoming(u32::MAX)[0].title, "Far");
    }
}
