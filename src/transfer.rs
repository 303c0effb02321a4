// Export and import of the three entity collections as a single JSON document

use crate::models::{Note, Task, Transaction};
use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Version string written into every export
pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub tasks: Vec<Task>,
    pub notes: Vec<Note>,
    pub transactions: Vec<Transaction>,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

pub fn export_data(tasks: &[Task], notes: &[Note], transactions: &[Transaction], now: DateTime<Utc>) -> ExportData {
    ExportData {
        tasks: tasks.to_vec(),
        notes: notes.to_vec(),
        transactions: transactions.to_vec(),
        exported_at: now,
        version: EXPORT_VERSION.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub tasks: usize,
    pub notes: usize,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub success: bool,
    pub imported: ImportCounts,
    pub errors: Vec<String>,
}

/// Entities parsed from an import document that passed every check
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub tasks: Vec<Task>,
    pub notes: Vec<Note>,
    pub transactions: Vec<Transaction>,
}

fn count_section(data: &Value, field: &str, errors: &mut Vec<String>) -> usize {
    match data.get(field).and_then(Value::as_array) {
        Some(items) => items.len(),
        None => {
            errors.push(format!("Invalid {} data", field));
            0
        }
    }
}

/// Structural check: each collection field must be present and a sequence.
/// Entities themselves are not inspected. Counts of valid sections are kept
/// even when another section fails.
pub fn inspect_import(data: &Value) -> ImportResult {
    let mut errors = Vec::new();
    let imported = ImportCounts {
        tasks: count_section(data, "tasks", &mut errors),
        notes: count_section(data, "notes", &mut errors),
        transactions: count_section(data, "transactions", &mut errors),
    };

    ImportResult {
        success: errors.is_empty(),
        imported,
        errors,
    }
}

fn parse_section<T: DeserializeOwned>(data: &Value, field: &str, label: &str, errors: &mut Vec<String>) -> Vec<T> {
    let items = data.get(field).and_then(Value::as_array).cloned().unwrap_or_default();

    let mut parsed = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(entity) => parsed.push(entity),
            Err(e) => {
                warn!(field, index, error = ?e, "Rejected entity in import");
                errors.push(format!("Invalid {} at index {}: {}", label, index, e));
            }
        }
    }
    parsed
}

/// Structural check followed by entity parsing. The batch is only returned
/// when both pass, so a caller applying it never applies a partial import.
pub fn parse_import(data: &Value) -> (ImportResult, Option<ImportBatch>) {
    let mut result = inspect_import(data);
    if !result.success {
        return (result, None);
    }

    let batch = ImportBatch {
        tasks: parse_section(data, "tasks", "task", &mut result.errors),
        notes: parse_section(data, "notes", "note", &mut result.errors),
        transactions: parse_section(data, "transactions", "transaction", &mut result.errors),
    };

    if !result.errors.is_empty() {
        result.success = false;
        return (result, None);
    }

    match data.get("version").and_then(Value::as_str) {
        Some(version) if version != EXPORT_VERSION => {
            info!(version, expected = EXPORT_VERSION, "Importing export from a different version");
        }
        _ => {}
    }

    (result, Some(batch))
}

/// Write an export as pretty-printed JSON
pub fn write_export(path: &Path, data: &ExportData) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize export")?;
    fs::write(path, json).with_context(|| format!("Failed to write export to {}", path.display()))?;
    info!(path = ?path, tasks = data.tasks.len(), notes = data.notes.len(), transactions = data.transactions.len(), "Wrote export");
    Ok(())
}

/// Read an import document without interpreting it
pub fn read_import(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).context("Import file is not valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteDraft, TaskDraft, TransactionCategory, TransactionDraft};
    use crate::record::Record;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use serde_json::json;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn sample() -> ExportData {
        let tasks = vec![Task::from_draft("t1".to_string(), TaskDraft::new("Task"), now())];
        let notes = vec![
            Note::from_draft("n1".to_string(), NoteDraft::new("Note", "body"), now()),
            Note::from_draft("n2".to_string(), NoteDraft::new("Other", ""), now()),
        ];
        let transactions = vec![Transaction::from_draft(
            "x1".to_string(),
            TransactionDraft::new(Decimal::from(12), "Lunch", TransactionCategory::Food, now()),
            now(),
        )];
        export_data(&tasks, &notes, &transactions, now())
    }

    #[test]
    fn test_export_then_import_counts() {
        let data = sample();
        assert_eq!(data.version, EXPORT_VERSION);

        let value = serde_json::to_value(&data).unwrap();
        let (result, batch) = parse_import(&value);
        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(
            result.imported,
            ImportCounts {
                tasks: 1,
                notes: 2,
                transactions: 1
            }
        );

        let batch = batch.unwrap();
        assert_eq!(batch.notes, data.notes);
        assert_eq!(batch.transactions, data.transactions);
    }

    #[test]
    fn test_inspect_reports_partial_counts_on_failure() {
        let value = json!({
            "tasks": [{}, {}],
            "notes": "not a list",
            "version": "1.0.0"
        });
        let result = inspect_import(&value);
        assert!(!result.success);
        assert_eq!(result.imported.tasks, 2);
        assert_eq!(result.imported.notes, 0);
        assert_eq!(
            result.errors,
            vec!["Invalid notes data".to_string(), "Invalid transactions data".to_string()]
        );
    }

    #[test]
    fn test_inspect_does_not_type_check_entities() {
        let value = json!({"tasks": [1, 2], "notes": [], "transactions": []});
        let result = inspect_import(&value);
        assert!(result.success);
        assert_eq!(result.imported.tasks, 2);
    }

    #[test]
    fn test_parse_import_fails_closed_on_bad_entity() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["transactions"][0]["category"] = json!("lottery");

        let (result, batch) = parse_import(&value);
        assert!(!result.success);
        assert!(batch.is_none());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Invalid transaction at index 0"));
        assert_eq!(result.imported.transactions, 1);
    }

    #[test]
    fn test_file_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("export.json");

        write_export(&path, &sample()).unwrap();
        let value = read_import(&path).unwrap();
        let parsed: ExportData = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, sample());

        assert!(read_import(&temp.path().join("missing.json")).is_err());
    }
}
