// Transaction collection: direction, category and calendar-month totals

use crate::analytics::sum_amounts;
use crate::dates::is_same_month;
use crate::filter::{TransactionFilter, search_transactions};
use crate::models::{Transaction, TransactionCategory, TransactionType};
use crate::store::Store;
use chrono::Datelike;
use rust_decimal::Decimal;

pub type TransactionStore = Store<Transaction>;

/// Time restriction for totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// The whole collection
    AllTime,
    /// One calendar month; `month0` is zero-based
    Month { year: i32, month0: u32 },
}

impl Period {
    /// Build from optional parts. Only a full year+month pair restricts.
    pub fn from_parts(year: Option<i32>, month0: Option<u32>) -> Self {
        match (year, month0) {
            (Some(year), Some(month0)) => Period::Month { year, month0 },
            _ => Period::AllTime,
        }
    }

    pub fn contains(&self, tx: &Transaction) -> bool {
        match *self {
            Period::AllTime => true,
            Period::Month { year, month0 } => is_same_month(&tx.date, year, month0),
        }
    }
}

impl Store<Transaction> {
    pub fn by_type(&self, kind: TransactionType) -> Vec<&Transaction> {
        self.filter(|tx| tx.kind == kind)
    }

    pub fn by_category(&self, category: TransactionCategory) -> Vec<&Transaction> {
        self.filter(|tx| tx.category == category)
    }

    /// Transactions dated within `year` / `month0` (zero-based)
    pub fn monthly(&self, year: i32, month0: u32) -> Vec<&Transaction> {
        self.filter(|tx| is_same_month(&tx.date, year, month0))
    }

    /// Sum of `kind` amounts within `period`
    pub fn total(&self, kind: TransactionType, period: Period) -> Decimal {
        sum_amounts(
            self.all()
                .iter()
                .filter(|tx| tx.kind == kind && period.contains(tx))
                .map(|tx| tx.amount),
        )
    }

    pub fn total_income(&self, period: Period) -> Decimal {
        self.total(TransactionType::Income, period)
    }

    pub fn total_expenses(&self, period: Period) -> Decimal {
        self.total(TransactionType::Expense, period)
    }

    pub fn total_income_all_time(&self) -> Decimal {
        self.total_income(Period::AllTime)
    }

    pub fn total_expenses_all_time(&self) -> Decimal {
        self.total_expenses(Period::AllTime)
    }

    pub fn total_income_this_month(&self) -> Decimal {
        self.total_income(self.current_month())
    }

    pub fn total_expenses_this_month(&self) -> Decimal {
        self.total_expenses(self.current_month())
    }

    /// Income minus expenses within `period`
    pub fn net(&self, period: Period) -> Decimal {
        self.total_income(period).saturating_sub(self.total_expenses(period))
    }

    pub fn current_month(&self) -> Period {
        let now = self.now();
        Period::Month {
            year: now.year(),
            month0: now.month0(),
        }
    }

    pub fn search(&self, query: &str) -> Vec<&Transaction> {
        search_transactions(self.all(), query)
    }

    pub fn query(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        self.filter(|tx| filter.matches(tx))
    }
}
