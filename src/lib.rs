// LifeHub - Task, note and finance stores over a local key-value adapter

pub mod analytics;
pub mod clock;
pub mod config;
pub mod dates;
pub mod filter;
pub mod hub;
pub mod kv;
pub mod models;
pub mod notes;
pub mod record;
pub mod store;
pub mod tasks;
pub mod timing;
pub mod transactions;
pub mod transfer;
pub mod user;
pub mod validate;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use filter::{NoteFilter, TaskFilter, TransactionFilter};
pub use hub::Hub;
pub use kv::{KvStore, Medium, SharedKv, SqliteMedium};
pub use models::*;
pub use notes::NoteStore;
pub use record::Record;
pub use store::Store;
pub use tasks::TaskStore;
pub use transactions::{Period, TransactionStore};
pub use transfer::{ExportData, ImportResult};
pub use user::UserStore;
pub use validate::{Validate, ensure_valid};

// Re-export decimal type used for amounts
pub use rust_decimal::Decimal;
