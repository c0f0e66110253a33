use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{FinancialState, Transaction};
use super::metrics::{months_of_cover, DebtToIncome, FinancialMetrics};

const RECENT_TRANSACTION_DAYS: i64 = 30;
const RECENT_TRANSACTION_LIMIT: usize = 5;

/// Coarse reading of the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl ScoreBand {
    pub const fn from_score(score: u8) -> Self {
        if score >= 80 {
            Self::Strong
        } else if score >= 40 {
            Self::Fair
        } else {
            Self::Weak
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::Fair => "Fair",
            Self::Weak => "Weak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtToAssetRating {
    Excellent,
    Good,
    NeedsImprovement,
}

impl DebtToAssetRating {
    pub fn rate(total_assets: f64, total_debt: f64) -> Self {
        if (total_debt <= 0.0 && total_assets > 0.0) || total_assets > total_debt * 2.0 {
            Self::Excellent
        } else if total_assets > total_debt {
            Self::Good
        } else {
            Self::NeedsImprovement
        }
    }
}

/// Derived view of the engine state for dashboards and assistant context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub as_of: NaiveDate,
    pub score: u8,
    pub band: ScoreBand,
    pub cash_on_hand: f64,
    pub other_assets: f64,
    pub total_assets: f64,
    pub total_debts: f64,
    pub net_worth: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings_rate: f64,
    pub weighted_interest_rate: f64,
    pub debt_to_income: DebtToIncome,
    pub emergency_fund_months: f64,
    pub debt_to_asset: DebtToAssetRating,
    pub discretionary_ratio: f64,
    pub goal_count: usize,
    pub recent_transactions: Vec<Transaction>,
}

impl FinancialSnapshot {
    pub fn capture(state: &FinancialState, score: u8, today: NaiveDate) -> Self {
        let metrics = FinancialMetrics::compute(state, today);
        let cash_on_hand = state.cash_on_hand();
        let total_assets = state.total_assets();
        let total_debts = state.total_debt();

        Self {
            as_of: today,
            score,
            band: ScoreBand::from_score(score),
            cash_on_hand,
            other_assets: total_assets - cash_on_hand,
            total_assets,
            total_debts,
            net_worth: total_assets - total_debts,
            monthly_income: metrics.monthly_income,
            monthly_expenses: metrics.monthly_expenses,
            savings_rate: metrics.savings_rate,
            weighted_interest_rate: metrics.weighted_interest_rate,
            debt_to_income: metrics.debt_to_income,
            emergency_fund_months: months_of_cover(state, metrics.monthly_expenses),
            debt_to_asset: DebtToAssetRating::rate(total_assets, total_debts),
            discretionary_ratio: metrics.spending_trend.discretionary_ratio,
            goal_count: state.goals.len(),
            recent_transactions: recent_transactions(state, today),
        }
    }
}

fn recent_transactions(state: &FinancialState, today: NaiveDate) -> Vec<Transaction> {
    let since = today - Duration::days(RECENT_TRANSACTION_DAYS);
    let mut recent: Vec<&Transaction> = state
        .transactions
        .iter()
        .filter(|transaction| transaction.date >= since)
        .collect();
    // Stable sort keeps insertion order within a day.
    recent.sort_by(|left, right| right.date.cmp(&left.date));
    recent
        .into_iter()
        .take(RECENT_TRANSACTION_LIMIT)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::domain::{Category, RecordId, TransactionKind};

    #[test]
    fn score_bands_split_at_forty_and_eighty() {
        assert_eq!(ScoreBand::from_score(100), ScoreBand::Strong);
        assert_eq!(ScoreBand::from_score(80), ScoreBand::Strong);
        assert_eq!(ScoreBand::from_score(79), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(40), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(39), ScoreBand::Weak);
    }

    #[test]
    fn debt_to_asset_rating_thresholds() {
        assert_eq!(DebtToAssetRating::rate(0.0, 0.0), DebtToAssetRating::NeedsImprovement);
        assert_eq!(DebtToAssetRating::rate(500.0, 0.0), DebtToAssetRating::Excellent);
        assert_eq!(DebtToAssetRating::rate(2001.0, 1000.0), DebtToAssetRating::Excellent);
        assert_eq!(DebtToAssetRating::rate(2000.0, 1000.0), DebtToAssetRating::Good);
        assert_eq!(DebtToAssetRating::rate(900.0, 1000.0), DebtToAssetRating::NeedsImprovement);
    }

    #[test]
    fn recent_transactions_are_newest_first_and_limited() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date");
        let transactions = (0..8)
            .map(|day| Transaction {
                id: RecordId::new(format!("t{day}")),
                kind: TransactionKind::Expense,
                category: Category::Groceries,
                amount: 10.0,
                description: String::new(),
                date: today - Duration::days(day * 6),
            })
            .collect();
        let state = FinancialState {
            transactions,
            ..FinancialState::default()
        };

        let recent = recent_transactions(&state, today);

        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id, RecordId::new("t0"));
        assert_eq!(recent[4].id, RecordId::new("t4"));
    }
}
