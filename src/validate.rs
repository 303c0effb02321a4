// Field validation, kept apart from the stores: callers validate before add/update

use crate::models::{Note, NoteDraft, Task, TaskDraft, Transaction, TransactionDraft};
use eyre::{Result, eyre};
use rust_decimal::Decimal;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_TASK_DESCRIPTION_CHARS: usize = 500;
pub const MAX_NOTE_CONTENT_CHARS: usize = 10_000;
pub const MAX_TRANSACTION_DESCRIPTION_CHARS: usize = 100;

/// Collects human-readable problems; empty means valid
pub trait Validate {
    fn validate(&self) -> Vec<String>;
}

/// Turn a non-empty problem list into an error
pub fn ensure_valid<V: Validate + ?Sized>(item: &V) -> Result<()> {
    let errors = item.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(eyre!("{}", errors.join("; ")))
    }
}

fn too_long(text: &str, max: usize) -> bool {
    text.chars().count() > max
}

fn check_title(errors: &mut Vec<String>, entity: &str, title: &str) {
    if title.trim().is_empty() {
        errors.push(format!("{} title is required", entity));
    }
    if too_long(title, MAX_TITLE_CHARS) {
        errors.push(format!("{} title must be at most {} characters", entity, MAX_TITLE_CHARS));
    }
}

fn task_errors(title: &str, description: Option<&str>) -> Vec<String> {
    let mut errors = Vec::new();
    check_title(&mut errors, "Task", title);
    if description.is_some_and(|d| too_long(d, MAX_TASK_DESCRIPTION_CHARS)) {
        errors.push(format!(
            "Task description must be at most {} characters",
            MAX_TASK_DESCRIPTION_CHARS
        ));
    }
    errors
}

fn note_errors(title: &str, content: &str) -> Vec<String> {
    let mut errors = Vec::new();
    check_title(&mut errors, "Note", title);
    if too_long(content, MAX_NOTE_CONTENT_CHARS) {
        errors.push("Note content must be at most 10,000 characters".to_string());
    }
    errors
}

fn transaction_errors(amount: Decimal, description: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if amount <= Decimal::ZERO {
        errors.push("Transaction amount must be greater than 0".to_string());
    }
    if description.trim().is_empty() {
        errors.push("Transaction description is required".to_string());
    }
    if too_long(description, MAX_TRANSACTION_DESCRIPTION_CHARS) {
        errors.push(format!(
            "Transaction description must be at most {} characters",
            MAX_TRANSACTION_DESCRIPTION_CHARS
        ));
    }
    errors
}

impl Validate for TaskDraft {
    fn validate(&self) -> Vec<String> {
        task_errors(&self.title, self.description.as_deref())
    }
}

impl Validate for Task {
    fn validate(&self) -> Vec<String> {
        task_errors(&self.title, self.description.as_deref())
    }
}

impl Validate for NoteDraft {
    fn validate(&self) -> Vec<String> {
        note_errors(&self.title, &self.content)
    }
}

impl Validate for Note {
    fn validate(&self) -> Vec<String> {
        note_errors(&self.title, &self.content)
    }
}

impl Validate for TransactionDraft {
    fn validate(&self) -> Vec<String> {
        transaction_errors(self.amount, &self.description)
    }
}

impl Validate for Transaction {
    fn validate(&self) -> Vec<String> {
        transaction_errors(self.amount, &self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionCategory;
    use chrono::Utc;

    #[test]
    fn test_task_title_required_and_bounded() {
        assert_eq!(TaskDraft::new("  ").validate(), vec!["Task title is required"]);
        assert!(TaskDraft::new("a".repeat(100)).validate().is_empty());
        assert_eq!(TaskDraft::new("a".repeat(101)).validate().len(), 1);
    }

    #[test]
    fn test_task_description_bound_counts_chars() {
        let mut draft = TaskDraft::new("Title");
        draft.description = Some("é".repeat(500));
        assert!(draft.validate().is_empty());
        draft.description = Some("é".repeat(501));
        assert_eq!(draft.validate().len(), 1);
    }

    #[test]
    fn test_note_content_bound() {
        assert!(NoteDraft::new("Title", "x".repeat(10_000)).validate().is_empty());
        let errors = NoteDraft::new("", "x".repeat(10_001)).validate();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_transaction_amount_must_be_positive() {
        let mut draft = TransactionDraft::new(Decimal::ZERO, "Coffee", TransactionCategory::Food, Utc::now());
        assert_eq!(draft.validate(), vec!["Transaction amount must be greater than 0"]);

        draft.amount = Decimal::new(-5, 0);
        assert!(ensure_valid(&draft).is_err());

        draft.amount = Decimal::new(350, 2);
        assert!(ensure_valid(&draft).is_ok());

        draft.description = String::new();
        assert_eq!(draft.validate(), vec!["Transaction description is required"]);
    }
}
