// Owning context: one adapter, one clock, one instance of every store

use crate::analytics::{self, DashboardStats};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::kv::{KvStore, Medium, SharedKv, SqliteMedium};
use crate::notes::NoteStore;
use crate::tasks::{DEFAULT_UPCOMING_DAYS, TaskStore};
use crate::transactions::TransactionStore;
use crate::transfer::{self, ExportData, ImportResult};
use crate::user::UserStore;
use eyre::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

const TOP_EXPENSE_CATEGORIES: usize = 5;

/// Application state built once at start-up and passed to the UI layer
pub struct Hub {
    tasks: TaskStore,
    notes: NoteStore,
    transactions: TransactionStore,
    user: UserStore,
    kv: SharedKv,
    clock: Arc<dyn Clock>,
    upcoming_days: u32,
}

impl Hub {
    /// Open the durable store described by `config`
    pub fn open(config: &Config) -> Result<Self> {
        let medium = SqliteMedium::open(&config.data_dir)?;
        let mut hub = Self::with_medium(&config.key_prefix, Box::new(medium), Arc::new(SystemClock));
        hub.upcoming_days = config.upcoming_days;
        Ok(hub)
    }

    /// Ephemeral hub, nothing outlives the process
    pub fn in_memory(clock: Arc<dyn Clock>) -> Result<Self> {
        let medium = SqliteMedium::in_memory()?;
        Ok(Self::with_medium(crate::kv::DEFAULT_PREFIX, Box::new(medium), clock))
    }

    pub fn with_medium(prefix: &str, medium: Box<dyn Medium>, clock: Arc<dyn Clock>) -> Self {
        let kv = KvStore::new(prefix, medium, clock.clone()).shared();

        Self {
            tasks: TaskStore::open(kv.clone(), clock.clone()),
            notes: NoteStore::open(kv.clone(), clock.clone()),
            transactions: TransactionStore::open(kv.clone(), clock.clone()),
            user: UserStore::open(kv.clone(), clock.clone()),
            kv,
            clock,
            upcoming_days: DEFAULT_UPCOMING_DAYS,
        }
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskStore {
        &mut self.tasks
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut NoteStore {
        &mut self.notes
    }

    pub fn transactions(&self) -> &TransactionStore {
        &self.transactions
    }

    pub fn transactions_mut(&mut self) -> &mut TransactionStore {
        &mut self.transactions
    }

    pub fn user(&self) -> &UserStore {
        &self.user
    }

    pub fn user_mut(&mut self) -> &mut UserStore {
        &mut self.user
    }

    /// The adapter shared by every store
    pub fn kv(&self) -> &SharedKv {
        &self.kv
    }

    pub fn upcoming_days(&self) -> u32 {
        self.upcoming_days
    }

    pub fn export(&self) -> ExportData {
        transfer::export_data(
            self.tasks.all(),
            self.notes.all(),
            self.transactions.all(),
            self.clock.now(),
        )
    }

    /// Validate an export document and, when it is entirely valid, upsert
    /// its entities by id. Nothing is applied on failure.
    pub fn import(&mut self, data: &Value) -> ImportResult {
        let (result, batch) = transfer::parse_import(data);

        let Some(batch) = batch else {
            warn!(errors = ?result.errors, "Import rejected");
            return result;
        };

        let new_tasks = self.tasks.upsert_all(batch.tasks);
        let new_notes = self.notes.upsert_all(batch.notes);
        let new_transactions = self.transactions.upsert_all(batch.transactions);
        info!(
            tasks = result.imported.tasks,
            notes = result.imported.notes,
            transactions = result.imported.transactions,
            new_tasks,
            new_notes,
            new_transactions,
            "Import applied"
        );
        result
    }

    /// Headline numbers for the current month
    pub fn dashboard(&self) -> DashboardStats {
        let now = self.clock.now();
        let tasks = self.tasks.all();
        let month = self.transactions.current_month();
        let monthly_income = self.transactions.total_income(month);
        let monthly_expenses = self.transactions.total_expenses(month);

        DashboardStats {
            tasks_completed: self.tasks.completed().len(),
            tasks_pending: self.tasks.pending().len(),
            overdue_tasks: self.tasks.overdue_at(now).len(),
            upcoming_tasks: self.tasks.upcoming_at(now, self.upcoming_days).len(),
            completion_rate: analytics::completion_rate(tasks),
            total_notes: self.notes.len(),
            pinned_notes: self.notes.pinned().len(),
            monthly_income,
            monthly_expenses,
            net_income: monthly_income.saturating_sub(monthly_expenses),
            top_expense_categories: analytics::top_expense_categories(
                self.transactions.all(),
                TOP_EXPENSE_CATEGORIES,
            ),
        }
    }
}
