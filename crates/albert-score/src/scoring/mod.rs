//! Albert Score engine: records, metrics, bounded sub-scores and the decayed event layer.

pub mod clock;
mod config;
pub mod domain;
mod engine;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod router;
pub mod rules;
pub mod session;
pub mod snapshot;
pub mod weighting;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ScoringPolicy;
pub use domain::{
    Asset, AssetKind, Category, Debt, DebtKind, FinancialGoal, FinancialState, GoalKind, RecordId,
    SpendingClass, StatePatch, Transaction, TransactionKind, CASH_ASSET_ID,
};
pub use engine::ScoreEngine;
pub use events::{EventLog, UserEvent};
pub use ledger::{LedgerImportError, LedgerImporter};
pub use metrics::{DebtToIncome, FinancialMetrics, SpendingTrend};
pub use router::session_router;
pub use rules::{ScoreBreakdown, ScoreComponent, ScoreFactor};
pub use session::{SessionError, SessionId, SessionRegistry};
pub use snapshot::{DebtToAssetRating, FinancialSnapshot, ScoreBand};

/// Clamps into `[floor, ceiling]`, collapsing NaN to the nearest bound of zero.
pub(crate) fn bounded(value: f64, floor: f64, ceiling: f64) -> f64 {
    if value.is_nan() {
        0.0f64.clamp(floor, ceiling)
    } else {
        value.clamp(floor, ceiling)
    }
}
