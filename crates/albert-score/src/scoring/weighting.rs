use chrono::{Duration, NaiveDate};

use super::domain::{FinancialState, SpendingClass, Transaction, TransactionKind};
use super::metrics::monthly_income;

const INCOME_WEIGHT: f64 = 2.0;
const NECESSARY_WEIGHT: f64 = -1.0;
const DISCRETIONARY_WEIGHT: f64 = -2.0;
const UNCLASSIFIED_WEIGHT: f64 = -1.5;
const REPEAT_PENALTY: f64 = 1.0;
const REPEAT_THRESHOLD: usize = 3;
const REPEAT_LOOKBACK_DAYS: i64 = 60;
const LARGE_TRANSACTION_SHARE: f64 = 0.5;
const WEALTH_BUILDING_BONUS: f64 = 3.0;

/// Same-category expenses dated within the lookback window, excluding `transaction` itself.
pub fn recent_similar_expenses<'a>(
    state: &'a FinancialState,
    transaction: &Transaction,
    today: NaiveDate,
) -> Vec<&'a Transaction> {
    let since = today - Duration::days(REPEAT_LOOKBACK_DAYS);
    state
        .transactions
        .iter()
        .filter(|other| {
            other.kind == TransactionKind::Expense
                && other.category == transaction.category
                && other.date >= since
                && other.id != transaction.id
        })
        .collect()
}

/// Event weight for a transaction already appended to `state`.
///
/// Monthly income used for amplification therefore includes the transaction itself.
pub fn transaction_weight(
    state: &FinancialState,
    transaction: &Transaction,
    today: NaiveDate,
) -> f64 {
    let class = transaction.category.class();

    let mut weight = match transaction.kind {
        TransactionKind::Income => INCOME_WEIGHT,
        TransactionKind::Expense => {
            let mut base = match class {
                SpendingClass::Necessary => NECESSARY_WEIGHT,
                SpendingClass::Discretionary => DISCRETIONARY_WEIGHT,
                SpendingClass::Unclassified => UNCLASSIFIED_WEIGHT,
            };
            if class == SpendingClass::Discretionary
                && recent_similar_expenses(state, transaction, today).len() >= REPEAT_THRESHOLD
            {
                base -= REPEAT_PENALTY;
            }
            base
        }
    };

    let income = monthly_income(state, today);
    if income > 0.0 && transaction.amount.abs() / income > LARGE_TRANSACTION_SHARE {
        weight *= match (transaction.kind, class) {
            (TransactionKind::Income, _) => 2.0,
            (TransactionKind::Expense, SpendingClass::Discretionary) => 3.0,
            (TransactionKind::Expense, _) => 1.5,
        };
    }

    if transaction.kind == TransactionKind::Income && transaction.category.is_wealth_building() {
        weight += WEALTH_BUILDING_BONUS;
    }

    weight
}
