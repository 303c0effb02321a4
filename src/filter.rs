// Query filtering for tasks, notes and transactions
//
// Every active criterion must hold (AND). An unset criterion matches everything.

use crate::models::{
    Note, NoteCategory, NoteColor, Task, TaskCategory, TaskPriority, Transaction, TransactionCategory,
    TransactionType,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Case-insensitive substring test. An empty needle matches anything.
fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    needle_lower.is_empty() || haystack.to_lowercase().contains(needle_lower)
}

/// True when every wanted tag is present, compared case-insensitively
fn has_all_tags(tags: &[String], wanted: &[String]) -> bool {
    wanted.iter().all(|w| {
        let w = w.to_lowercase();
        tags.iter().any(|t| t.to_lowercase() == w)
    })
}

fn in_range<T: PartialOrd>(value: &T, from: Option<&T>, to: Option<&T>) -> bool {
    from.is_none_or(|from| value >= from) && to.is_none_or(|to| value <= to)
}

pub fn task_matches_query(task: &Task, query: &str) -> bool {
    let q = query.to_lowercase();
    q.is_empty()
        || contains_ci(&task.title, &q)
        || task.description.as_deref().is_some_and(|d| contains_ci(d, &q))
        || task.tags.iter().flatten().any(|tag| contains_ci(tag, &q))
}

pub fn note_matches_query(note: &Note, query: &str) -> bool {
    let q = query.to_lowercase();
    q.is_empty()
        || contains_ci(&note.title, &q)
        || contains_ci(&note.content, &q)
        || note.tags.iter().any(|tag| contains_ci(tag, &q))
}

pub fn transaction_matches_query(tx: &Transaction, query: &str) -> bool {
    let q = query.to_lowercase();
    q.is_empty()
        || contains_ci(&tx.description, &q)
        || contains_ci(tx.category.as_str(), &q)
        || tx.tags.iter().flatten().any(|tag| contains_ci(tag, &q))
}

/// Free-text task search over title, description and tags
pub fn search_tasks<'a, I>(tasks: I, query: &str) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().filter(|t| task_matches_query(t, query)).collect()
}

/// Free-text transaction search over description, category and tags
pub fn search_transactions<'a, I>(transactions: I, query: &str) -> Vec<&'a Transaction>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .filter(|t| transaction_matches_query(t, query))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub category: Option<TaskCategory>,
    pub priority: Option<TaskPriority>,
    pub completed: Option<bool>,
    /// Inclusive lower bound on the due date; undated tasks never match a bound
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub query: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if self.category.is_some_and(|c| c != task.category) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if self.completed.is_some_and(|c| c != task.completed) {
            return false;
        }
        if self.due_from.is_some() || self.due_to.is_some() {
            match &task.due_date {
                Some(due) if in_range(due, self.due_from.as_ref(), self.due_to.as_ref()) => {}
                _ => return false,
            }
        }
        let tags = task.tags.as_deref().unwrap_or_default();
        if !has_all_tags(tags, &self.tags) {
            return false;
        }
        self.query.as_deref().is_none_or(|q| task_matches_query(task, q))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub category: Option<NoteCategory>,
    pub color: Option<NoteColor>,
    pub tags: Vec<String>,
    pub pinned: Option<bool>,
    pub query: Option<String>,
}

impl NoteFilter {
    pub fn matches(&self, note: &Note) -> bool {
        self.category.is_none_or(|c| c == note.category)
            && self.color.is_none_or(|c| c == note.color)
            && self.pinned.is_none_or(|p| p == note.is_pinned)
            && has_all_tags(&note.tags, &self.tags)
            && self.query.as_deref().is_none_or(|q| note_matches_query(note, q))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub category: Option<TransactionCategory>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub tags: Vec<String>,
    pub query: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        let tags = tx.tags.as_deref().unwrap_or_default();
        self.kind.is_none_or(|k| k == tx.kind)
            && self.category.is_none_or(|c| c == tx.category)
            && in_range(&tx.date, self.date_from.as_ref(), self.date_to.as_ref())
            && in_range(&tx.amount, self.min_amount.as_ref(), self.max_amount.as_ref())
            && has_all_tags(tags, &self.tags)
            && self
                .query
                .as_deref()
                .is_none_or(|q| transaction_matches_query(tx, q))
    }
}
