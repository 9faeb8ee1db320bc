//! Read-only aggregates over an account's transactions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{EngineError, Period, ResultEngine, Transaction, TransactionKind};

/// Latest transactions shown on the dashboard.
pub const DASHBOARD_RECENT: u64 = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_income: i64,
    pub total_expense: i64,
    pub balance: i64,
    pub transaction_count: u64,
    pub period: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: i64,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub categories: Vec<CategoryTotal>,
    pub recent: Vec<Transaction>,
}

fn out_of_range() -> EngineError {
    EngineError::InvalidAmount("totals exceed the supported range".to_string())
}

fn add(total: i64, amount: i64) -> ResultEngine<i64> {
    total.checked_add(amount).ok_or_else(out_of_range)
}

pub fn summarize(transactions: &[Transaction], period: &Period) -> ResultEngine<Summary> {
    let mut total_income = 0i64;
    let mut total_expense = 0i64;
    for tx in transactions {
        match tx.kind {
            TransactionKind::Income => total_income = add(total_income, tx.amount_minor)?,
            TransactionKind::Expense => total_expense = add(total_expense, tx.amount_minor)?,
        }
    }
    Ok(Summary {
        total_income,
        total_expense,
        balance: total_income
            .checked_sub(total_expense)
            .ok_or_else(out_of_range)?,
        transaction_count: transactions.len() as u64,
        period: period.label(),
    })
}

/// Expenses grouped by category, largest first. Ties keep alphabetical order.
pub fn expenses_by_category(transactions: &[Transaction]) -> ResultEngine<Vec<CategoryTotal>> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for tx in transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Expense)
    {
        let total = totals.entry(tx.category.as_str()).or_default();
        *total = add(*total, tx.amount_minor)?;
    }
    let grand_total = totals.values().try_fold(0i64, |acc, total| add(acc, *total))?;

    let mut out: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
            percentage: percentage(total, grand_total),
        })
        .collect();
    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    Ok(out)
}

fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = part as f64 / whole as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn tx(kind: TransactionKind, category: &str, amount_minor: i64) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: format!("{category}-{amount_minor}"),
            account_id: "acc".to_string(),
            title: category.to_string(),
            amount_minor,
            kind,
            category: category.to_string(),
            notes: None,
            date: now,
            created_by_id: "alice".to_string(),
            updated_by_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn summary_totals() {
        let txs = vec![
            tx(TransactionKind::Income, "Salary", 300_000),
            tx(TransactionKind::Expense, "Rent", 120_000),
            tx(TransactionKind::Expense, "Food", 30_000),
        ];
        let summary = summarize(&txs, &Period::Month { month: 3, year: 2025 }).unwrap();
        assert_eq!(summary.total_income, 300_000);
        assert_eq!(summary.total_expense, 150_000);
        assert_eq!(summary.balance, 150_000);
        assert_eq!(summary.transaction_count, 3);
        assert_eq!(summary.period, "3/2025");
    }

    #[test]
    fn categories_sorted_with_rounded_percentages() {
        let txs = vec![
            tx(TransactionKind::Expense, "Food", 100),
            tx(TransactionKind::Expense, "Rent", 200),
            tx(TransactionKind::Expense, "Food", 0),
            tx(TransactionKind::Income, "Salary", 1_000),
        ];
        let categories = expenses_by_category(&txs).unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "Rent");
        assert_eq!(categories[0].percentage, 66.67);
        assert_eq!(categories[1].category, "Food");
        assert_eq!(categories[1].percentage, 33.33);
    }

    #[test]
    fn no_expenses_gives_empty_breakdown() {
        let txs = vec![tx(TransactionKind::Income, "Salary", 1_000)];
        assert!(expenses_by_category(&txs).unwrap().is_empty());
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn huge_totals_are_rejected_instead_of_wrapping() {
        let big = i64::MAX / 2 + 1;
        let incomes = vec![
            tx(TransactionKind::Income, "Salary", big),
            tx(TransactionKind::Income, "Bonus", big),
        ];
        let err = summarize(&incomes, &Period::AllTime).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));

        let expenses = vec![
            tx(TransactionKind::Expense, "Rent", big),
            tx(TransactionKind::Expense, "Food", big),
        ];
        let err = expenses_by_category(&expenses).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));

        let one_each = vec![
            tx(TransactionKind::Income, "Salary", i64::MAX),
            tx(TransactionKind::Expense, "Rent", i64::MAX),
        ];
        let summary = summarize(&one_each, &Period::AllTime).unwrap();
        assert_eq!(summary.balance, 0);
    }
}
