// Pure derivations over collections: ordering, ratios and spending breakdowns

use crate::dates::{is_same_month, shift_month};
use crate::models::{Task, TaskCategory, Transaction, TransactionCategory, TransactionType};
use rust_decimal::Decimal;
use serde::Serialize;
use std::borrow::Borrow;
use std::cmp::Reverse;

/// Order by priority weight descending, then due date ascending. Tasks without
/// a due date go after dated ones of the same priority. The sort is stable.
pub fn sort_by_priority_then_due_date<T: Borrow<Task>>(tasks: &mut [T]) {
    tasks.sort_by_key(|task| {
        let task: &Task = task.borrow();
        (Reverse(task.priority.weight()), task.due_date.is_none(), task.due_date)
    });
}

/// `value / total * 100`, or zero when `total` is zero
pub fn percentage(value: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    value / total * Decimal::ONE_HUNDRED
}

/// Sum of amounts, clamped at `Decimal::MAX` instead of overflowing
pub fn sum_amounts<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(amount))
}

/// Expense totals per expense category, declaration order, positive sums only
pub fn expenses_by_category<'a, I>(transactions: I) -> Vec<(TransactionCategory, Decimal)>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut sums = vec![Decimal::ZERO; TransactionCategory::ALL.len()];
    for tx in transactions {
        if tx.kind == TransactionType::Expense && tx.category.is_expense() {
            let sum = &mut sums[tx.category as usize];
            *sum = sum.saturating_add(tx.amount);
        }
    }

    TransactionCategory::expense_categories()
        .map(|category| (category, sums[category as usize]))
        .filter(|(_, amount)| *amount > Decimal::ZERO)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category: TransactionCategory,
    pub amount: Decimal,
    /// Share of total expenses, 0-100
    pub percentage: Decimal,
}

/// Largest expense categories first, each with its share of all expenses
pub fn top_expense_categories<'a, I>(transactions: I, limit: usize) -> Vec<CategorySpending>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let grouped = expenses_by_category(transactions);
    let total = sum_amounts(grouped.iter().map(|(_, amount)| *amount));

    let mut spending: Vec<CategorySpending> = grouped
        .into_iter()
        .map(|(category, amount)| CategorySpending {
            category,
            amount,
            percentage: percentage(amount, total),
        })
        .collect();
    spending.sort_by(|a, b| b.amount.cmp(&a.amount));
    spending.truncate(limit);
    spending
}

/// Share of completed tasks, 0-100
pub fn completion_rate<'a, I>(tasks: I) -> Decimal
where
    I: IntoIterator<Item = &'a Task>,
{
    let (done, total) = tasks
        .into_iter()
        .fold((0u64, 0u64), |(done, total), task| (done + u64::from(task.completed), total + 1));
    percentage(Decimal::from(done), Decimal::from(total))
}

/// Task count per category, declaration order, non-zero only
pub fn tasks_by_category<'a, I>(tasks: I) -> Vec<(TaskCategory, usize)>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut counts = vec![0usize; TaskCategory::ALL.len()];
    for task in tasks {
        counts[task.category as usize] += 1;
    }

    TaskCategory::ALL
        .iter()
        .map(|category| (*category, counts[*category as usize]))
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub year: i32,
    pub month0: u32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
    pub count: usize,
}

pub fn monthly_summary(transactions: &[Transaction], year: i32, month0: u32) -> MonthlySummary {
    let mut summary = MonthlySummary {
        year,
        month0,
        income: Decimal::ZERO,
        expenses: Decimal::ZERO,
        net: Decimal::ZERO,
        count: 0,
    };

    for tx in transactions.iter().filter(|tx| is_same_month(&tx.date, year, month0)) {
        match tx.kind {
            TransactionType::Income => summary.income = summary.income.saturating_add(tx.amount),
            TransactionType::Expense => summary.expenses = summary.expenses.saturating_add(tx.amount),
        }
        summary.count += 1;
    }
    summary.net = summary.income.saturating_sub(summary.expenses);
    summary
}

/// Summaries for the `months` months ending at `year` / `month0`, oldest first
pub fn monthly_trend(transactions: &[Transaction], year: i32, month0: u32, months: u32) -> Vec<MonthlySummary> {
    (0..months as i32)
        .rev()
        .map(|back| {
            let (y, m) = shift_month(year, month0, -back);
            monthly_summary(transactions, y, m)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub tasks_completed: usize,
    pub tasks_pending: usize,
    pub overdue_tasks: usize,
    pub upcoming_tasks: usize,
    pub completion_rate: Decimal,
    pub total_notes: usize,
    pub pinned_notes: usize,
    pub monthly_income: Decimal,
    pub monthly_expenses: Decimal,
    pub net_income: Decimal,
    pub top_expense_categories: Vec<CategorySpending>,
}
