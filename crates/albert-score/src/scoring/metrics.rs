//! Pure metric calculators over a [`FinancialState`] and a reference date.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{FinancialState, Transaction, TransactionKind};

/// Recent-month discretionary spend above this multiple of the prior average counts as growth.
const TREND_GROWTH_FACTOR: f64 = 1.2;
/// Prior months averaged against the most recent one.
const TREND_PRIOR_MONTHS: f64 = 2.0;
const MIN_STABILITY_TRANSACTIONS: usize = 3;
const MIN_STABILITY_MONTHS: usize = 3;

/// Monthly debt payments over monthly income.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtToIncome {
    Ratio(f64),
    /// No positive income in the window; the ratio has no finite value.
    Unbounded,
}

impl DebtToIncome {
    pub fn ratio(self) -> Option<f64> {
        match self {
            DebtToIncome::Ratio(ratio) => Some(ratio),
            DebtToIncome::Unbounded => None,
        }
    }

    pub fn is_unbounded(self) -> bool {
        matches!(self, DebtToIncome::Unbounded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpendingTrend {
    pub increasing_discretionary: bool,
    /// Discretionary share of the most recent month's expenses.
    pub discretionary_ratio: f64,
    pub recent_discretionary: f64,
    pub previous_monthly_average: f64,
    pub recent_expenses: f64,
}

/// Every metric the sub-scores consume, computed once per recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings_rate: f64,
    pub weighted_interest_rate: f64,
    pub debt_to_income: DebtToIncome,
    pub spending_trend: SpendingTrend,
    pub income_stability: f64,
}

impl FinancialMetrics {
    pub fn compute(state: &FinancialState, today: NaiveDate) -> Self {
        let monthly_income = monthly_total(state, TransactionKind::Income, today);
        let monthly_expenses = monthly_total(state, TransactionKind::Expense, today);

        Self {
            monthly_income,
            monthly_expenses,
            savings_rate: savings_rate_from(monthly_income, monthly_expenses),
            weighted_interest_rate: weighted_interest_rate(state),
            debt_to_income: debt_to_income_from(state, monthly_income),
            spending_trend: spending_trend(state, today),
            income_stability: income_stability(state, today),
        }
    }
}

/// `today` shifted back by whole calendar months; day-of-month clamps to the month end.
pub fn months_before(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

fn in_window<'a>(
    state: &'a FinancialState,
    kind: TransactionKind,
    since: NaiveDate,
) -> impl Iterator<Item = &'a Transaction> {
    state
        .transactions
        .iter()
        .filter(move |transaction| transaction.kind == kind && transaction.date >= since)
}

pub fn monthly_total(state: &FinancialState, kind: TransactionKind, today: NaiveDate) -> f64 {
    in_window(state, kind, months_before(today, 1))
        .map(|transaction| transaction.amount)
        .sum()
}

pub fn monthly_income(state: &FinancialState, today: NaiveDate) -> f64 {
    monthly_total(state, TransactionKind::Income, today)
}

pub fn monthly_expenses(state: &FinancialState, today: NaiveDate) -> f64 {
    monthly_total(state, TransactionKind::Expense, today)
}

pub fn savings_rate(state: &FinancialState, today: NaiveDate) -> f64 {
    savings_rate_from(monthly_income(state, today), monthly_expenses(state, today))
}

fn savings_rate_from(income: f64, expenses: f64) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }
    ((income - expenses) / income).max(0.0)
}

pub fn weighted_interest_rate(state: &FinancialState) -> f64 {
    let total_debt = state.total_debt();
    if total_debt == 0.0 {
        return 0.0;
    }
    let weighted: f64 = state
        .debts
        .iter()
        .map(|debt| debt.amount * debt.interest_rate)
        .sum();
    weighted / total_debt
}

pub fn debt_to_income(state: &FinancialState, today: NaiveDate) -> DebtToIncome {
    debt_to_income_from(state, monthly_income(state, today))
}

fn debt_to_income_from(state: &FinancialState, income: f64) -> DebtToIncome {
    if income <= 0.0 || income.is_nan() {
        return DebtToIncome::Unbounded;
    }
    let payments: f64 = state.debts.iter().map(|debt| debt.minimum_payment).sum();
    DebtToIncome::Ratio(payments / income)
}

/// Compares last month's discretionary spend with the average of the two months before.
///
/// Months without any transactions count as zero spend, so a sparse history makes any
/// recent discretionary spend look like growth.
pub fn spending_trend(state: &FinancialState, today: NaiveDate) -> SpendingTrend {
    let window_start = months_before(today, 3);
    let recent_start = months_before(today, 1);

    let mut recent_discretionary = 0.0;
    let mut previous_discretionary = 0.0;
    let mut recent_expenses = 0.0;

    for transaction in in_window(state, TransactionKind::Expense, window_start) {
        let recent = transaction.date >= recent_start;
        if recent {
            recent_expenses += transaction.amount;
        }
        if transaction.category.is_discretionary() {
            if recent {
                recent_discretionary += transaction.amount;
            } else {
                previous_discretionary += transaction.amount;
            }
        }
    }

    let previous_monthly_average = previous_discretionary / TREND_PRIOR_MONTHS;
    let discretionary_ratio = if recent_expenses > 0.0 {
        recent_discretionary / recent_expenses
    } else {
        0.0
    };

    SpendingTrend {
        increasing_discretionary: recent_discretionary
            > previous_monthly_average * TREND_GROWTH_FACTOR,
        discretionary_ratio,
        recent_discretionary,
        previous_monthly_average,
        recent_expenses,
    }
}

/// `1 - CV` of monthly income over the trailing six months, in `[0, 1]`.
pub fn income_stability(state: &FinancialState, today: NaiveDate) -> f64 {
    let incomes: Vec<&Transaction> =
        in_window(state, TransactionKind::Income, months_before(today, 6)).collect();
    if incomes.len() < MIN_STABILITY_TRANSACTIONS {
        return 0.0;
    }

    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for transaction in incomes {
        let key = (transaction.date.year(), transaction.date.month());
        *by_month.entry(key).or_default() += transaction.amount;
    }
    if by_month.len() < MIN_STABILITY_MONTHS {
        return 0.0;
    }

    let months = by_month.len() as f64;
    let mean = by_month.values().sum::<f64>() / months;
    let variance = by_month
        .values()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / months;
    let cv = if mean > 0.0 {
        variance.sqrt() / mean
    } else {
        1.0
    };

    let stability = 1.0 - cv;
    if stability.is_nan() {
        0.0
    } else {
        stability.clamp(0.0, 1.0)
    }
}

/// Months of expenses covered by cash on hand; zero when there are no expenses.
pub fn months_of_cover(state: &FinancialState, monthly_expenses: f64) -> f64 {
    if monthly_expenses == 0.0 {
        return 0.0;
    }
    state.cash_on_hand() / monthly_expenses
}
