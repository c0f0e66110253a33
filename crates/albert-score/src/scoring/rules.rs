use serde::{Deserialize, Serialize};

use super::bounded;
use super::config::ScoringPolicy;
use super::domain::{FinancialGoal, FinancialState};
use super::metrics::{DebtToIncome, FinancialMetrics, SpendingTrend};

const EMERGENCY_FUND_TARGET_MONTHS: f64 = 6.0;
const DEBT_TO_ASSET_TARGET: f64 = 2.0;
const DTI_COMFORT_LIMIT: f64 = 0.36;
const DTI_CEILING: f64 = 1.0;
const MAX_INTEREST_PENALTY: f64 = 5.0;
const SAVINGS_RATE_TARGET: f64 = 0.2;
const DISCRETIONARY_RATIO_CEILING: f64 = 0.5;
const STEADY_SPENDING_BONUS: f64 = 5.0;

/// The six bounded factors that make up the base score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    EmergencyFund,
    DebtStructure,
    SavingsBehavior,
    SpendingAnalysis,
    IncomeStability,
    GoalProgress,
}

impl ScoreFactor {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::EmergencyFund,
            Self::DebtStructure,
            Self::SavingsBehavior,
            Self::SpendingAnalysis,
            Self::IncomeStability,
            Self::GoalProgress,
        ]
    }

    /// Maximum points the factor can contribute.
    pub const fn budget(self) -> f64 {
        match self {
            Self::EmergencyFund => 20.0,
            Self::DebtStructure => 25.0,
            Self::SavingsBehavior => 20.0,
            Self::SpendingAnalysis => 15.0,
            Self::IncomeStability => 10.0,
            Self::GoalProgress => 10.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::EmergencyFund => "Emergency Fund",
            Self::DebtStructure => "Debt Structure",
            Self::SavingsBehavior => "Savings Behavior",
            Self::SpendingAnalysis => "Spending Analysis",
            Self::IncomeStability => "Income Stability",
            Self::GoalProgress => "Goal Progress",
        }
    }
}

/// Discrete contribution to the base score, kept for transparent breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: f64,
    pub budget: f64,
    pub notes: String,
}

/// Result of the last recalculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub components: Vec<ScoreComponent>,
    pub base_score: f64,
    pub event_modifier: f64,
    /// `base_score + event_modifier`, clamped to `[0, 100]` but not rounded.
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn new(components: Vec<ScoreComponent>, event_modifier: f64) -> Self {
        let base_score: f64 = components.iter().map(|component| component.points).sum();
        let total = bounded(base_score + event_modifier, 0.0, 100.0);
        Self {
            components,
            base_score,
            event_modifier,
            total,
        }
    }

    pub fn points(&self, factor: ScoreFactor) -> Option<f64> {
        self.components
            .iter()
            .find(|component| component.factor == factor)
            .map(|component| component.points)
    }
}

pub fn emergency_fund_score(cash_on_hand: f64, monthly_expenses: f64) -> f64 {
    if monthly_expenses == 0.0 {
        return 0.0;
    }
    let months = cash_on_hand / monthly_expenses;
    bounded(
        months / EMERGENCY_FUND_TARGET_MONTHS * ScoreFactor::EmergencyFund.budget(),
        0.0,
        ScoreFactor::EmergencyFund.budget(),
    )
}

pub fn debt_structure_score(
    total_assets: f64,
    total_debt: f64,
    debt_to_income: DebtToIncome,
    weighted_interest_rate: f64,
    policy: &ScoringPolicy,
) -> f64 {
    let mut score = 0.0;

    if total_debt > 0.0 {
        let coverage = total_assets / total_debt;
        score += 10.0 * (coverage / DEBT_TO_ASSET_TARGET).min(1.0);
    } else if total_assets > 0.0 {
        score += 10.0;
    }

    if let DebtToIncome::Ratio(dti) = debt_to_income {
        score += if dti <= DTI_COMFORT_LIMIT {
            10.0
        } else {
            (10.0 * (1.0 - (dti - DTI_COMFORT_LIMIT) / (DTI_CEILING - DTI_COMFORT_LIMIT))).max(0.0)
        };
    }

    if policy.is_high_interest(weighted_interest_rate) {
        score -= ((weighted_interest_rate - policy.high_interest_threshold) / 2.0)
            .min(MAX_INTEREST_PENALTY);
    }

    bounded(score, 0.0, ScoreFactor::DebtStructure.budget())
}

pub fn savings_behavior_score(savings_rate: f64) -> f64 {
    bounded(
        savings_rate / SAVINGS_RATE_TARGET * ScoreFactor::SavingsBehavior.budget(),
        0.0,
        ScoreFactor::SavingsBehavior.budget(),
    )
}

pub fn spending_analysis_score(trend: &SpendingTrend) -> f64 {
    let ratio_points = (10.0 * (1.0 - trend.discretionary_ratio / DISCRETIONARY_RATIO_CEILING))
        .max(0.0);
    let bonus = if trend.increasing_discretionary {
        0.0
    } else {
        STEADY_SPENDING_BONUS
    };
    bounded(
        ratio_points + bonus,
        0.0,
        ScoreFactor::SpendingAnalysis.budget(),
    )
}

pub fn income_stability_score(stability: f64) -> f64 {
    bounded(
        stability * ScoreFactor::IncomeStability.budget(),
        0.0,
        ScoreFactor::IncomeStability.budget(),
    )
}

pub fn goal_progress_score(goals: &[FinancialGoal]) -> f64 {
    if goals.is_empty() {
        return 0.0;
    }
    let average = goals.iter().map(FinancialGoal::progress).sum::<f64>() / goals.len() as f64;
    bounded(
        average * ScoreFactor::GoalProgress.budget(),
        0.0,
        ScoreFactor::GoalProgress.budget(),
    )
}

/// Scores every factor against the current state.
pub(crate) fn score_state(
    state: &FinancialState,
    metrics: &FinancialMetrics,
    policy: &ScoringPolicy,
) -> Vec<ScoreComponent> {
    let cash = state.cash_on_hand();
    let total_assets = state.total_assets();
    let total_debt = state.total_debt();
    let trend = &metrics.spending_trend;

    ScoreFactor::ordered()
        .into_iter()
        .map(|factor| {
            let (points, notes) = match factor {
                ScoreFactor::EmergencyFund => (
                    emergency_fund_score(cash, metrics.monthly_expenses),
                    if metrics.monthly_expenses == 0.0 {
                        "no expenses recorded in the last month".to_string()
                    } else {
                        format!(
                            "cash covers {:.1} month(s) of expenses",
                            cash / metrics.monthly_expenses
                        )
                    },
                ),
                ScoreFactor::DebtStructure => (
                    debt_structure_score(
                        total_assets,
                        total_debt,
                        metrics.debt_to_income,
                        metrics.weighted_interest_rate,
                        policy,
                    ),
                    match metrics.debt_to_income {
                        DebtToIncome::Ratio(dti) => format!(
                            "debt-to-income {:.2}, average interest {:.1}%",
                            dti, metrics.weighted_interest_rate
                        ),
                        DebtToIncome::Unbounded => format!(
                            "no income in the last month, average interest {:.1}%",
                            metrics.weighted_interest_rate
                        ),
                    },
                ),
                ScoreFactor::SavingsBehavior => (
                    savings_behavior_score(metrics.savings_rate),
                    format!("saving {:.0}% of income", metrics.savings_rate * 100.0),
                ),
                ScoreFactor::SpendingAnalysis => (
                    spending_analysis_score(trend),
                    format!(
                        "discretionary share {:.0}%{}",
                        trend.discretionary_ratio * 100.0,
                        if trend.increasing_discretionary {
                            ", trending up"
                        } else {
                            ""
                        }
                    ),
                ),
                ScoreFactor::IncomeStability => (
                    income_stability_score(metrics.income_stability),
                    format!("stability index {:.2}", metrics.income_stability),
                ),
                ScoreFactor::GoalProgress => (
                    goal_progress_score(&state.goals),
                    format!("{} goal(s) tracked", state.goals.len()),
                ),
            };

            ScoreComponent {
                factor,
                points,
                budget: factor.budget(),
                notes,
            }
        })
        .collect()
}
