use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::config::ScoringPolicy;
use super::domain::{Asset, Debt, FinancialGoal, FinancialState, StatePatch, Transaction};
use super::events::{EventLog, UserEvent, ASSET_ADDED, DEBT_ADDED, TRANSACTION_RECORDED};
use super::metrics::FinancialMetrics;
use super::rules::{score_state, ScoreBreakdown};
use super::snapshot::FinancialSnapshot;
use super::weighting::transaction_weight;

const ASSET_ADDED_WEIGHT: f64 = 3.0;
const HIGH_INTEREST_DEBT_WEIGHT: f64 = -5.0;
const DEBT_WEIGHT: f64 = -2.0;

/// Stateful Albert Score calculator for a single user session.
///
/// Mutators update the state, append a weighted event where applicable and
/// recalculate eagerly; readers only return what the last recalculation cached.
#[derive(Debug)]
pub struct ScoreEngine<C = SystemClock> {
    state: FinancialState,
    events: EventLog,
    policy: ScoringPolicy,
    clock: C,
    current_score: f64,
    breakdown: Option<ScoreBreakdown>,
}

impl ScoreEngine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for ScoreEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ScoreEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self::with_policy(ScoringPolicy::default(), clock)
    }

    pub fn with_policy(policy: ScoringPolicy, clock: C) -> Self {
        let state = FinancialState::seeded(clock.now());
        Self {
            state,
            events: EventLog::new(),
            current_score: policy.initial_score,
            policy,
            clock,
            breakdown: None,
        }
    }

    /// Appends a non-cash asset. Returns `false` and changes nothing for the reserved cash id.
    pub fn add_asset(&mut self, asset: Asset) -> bool {
        if asset.id.is_cash() {
            debug!(asset_id = %asset.id, "ignoring manual edit of cash on hand");
            return false;
        }
        self.state.assets.push(asset);
        self.record_event(ASSET_ADDED, ASSET_ADDED_WEIGHT);
        true
    }

    pub fn add_debt(&mut self, debt: Debt) {
        let weight = if self.policy.is_high_interest(debt.interest_rate) {
            HIGH_INTEREST_DEBT_WEIGHT
        } else {
            DEBT_WEIGHT
        };
        self.state.debts.push(debt);
        self.record_event(DEBT_ADDED, weight);
    }

    pub fn add_transaction(&mut self, transaction: Transaction) {
        let now = self.clock.now();
        match self.state.cash_asset_mut() {
            Some(cash) => {
                cash.value += transaction.signed_amount();
                cash.last_updated = now;
            }
            None => warn!(
                transaction_id = %transaction.id,
                "cash on hand asset missing; transaction not reconciled"
            ),
        }

        self.state.transactions.push(transaction);
        let weight = self
            .state
            .transactions
            .last()
            .map(|recorded| transaction_weight(&self.state, recorded, now.date_naive()))
            .unwrap_or_default();
        self.record_event(TRANSACTION_RECORDED, weight);
    }

    /// Inserts the goal, or overwrites the stored goal with the same id in place.
    pub fn update_goal(&mut self, goal: FinancialGoal) {
        match self.state.goal_mut(&goal.id) {
            Some(existing) => *existing = goal,
            None => self.state.goals.push(goal),
        }
        self.recalculate();
    }

    /// Replaces whole collections without reconciling cash or emitting events.
    pub fn update_financial_state(&mut self, patch: StatePatch) {
        self.state.apply(patch);
        if self.state.cash_asset().is_none() {
            warn!("bulk update removed the cash on hand asset");
        }
        self.recalculate();
    }

    /// Aggregate score from the last recalculation, rounded.
    pub fn score(&self) -> u8 {
        self.current_score.round() as u8
    }

    pub fn raw_score(&self) -> f64 {
        self.current_score
    }

    /// Owned copy of the aggregate state.
    pub fn financial_state(&self) -> FinancialState {
        self.state.clone()
    }

    pub fn state(&self) -> &FinancialState {
        &self.state
    }

    pub fn events(&self) -> &[UserEvent] {
        self.events.events()
    }

    /// `None` until the first mutation.
    pub fn breakdown(&self) -> Option<&ScoreBreakdown> {
        self.breakdown.as_ref()
    }

    pub fn metrics(&self) -> FinancialMetrics {
        FinancialMetrics::compute(&self.state, self.clock.now().date_naive())
    }

    pub fn snapshot(&self) -> FinancialSnapshot {
        FinancialSnapshot::capture(&self.state, self.score(), self.clock.now().date_naive())
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn record_event(&mut self, label: &str, weight: f64) {
        self.events
            .push(UserEvent::new(label, weight, self.clock.now()));
        self.recalculate();
    }

    fn recalculate(&mut self) {
        let now = self.clock.now();
        let metrics = FinancialMetrics::compute(&self.state, now.date_naive());
        let components = score_state(&self.state, &metrics, &self.policy);
        let modifier = self.events.modifier(now, &self.policy);
        let breakdown = ScoreBreakdown::new(components, modifier);

        debug!(
            base = breakdown.base_score,
            modifier = breakdown.event_modifier,
            total = breakdown.total,
            events = self.events.len(),
            "recalculated albert score"
        );

        self.current_score = breakdown.total;
        self.breakdown = Some(breakdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::clock::ManualClock;
    use crate::scoring::domain::{
        AssetKind, Category, DebtKind, GoalKind, RecordId, TransactionKind, CASH_ASSET_ID,
    };
    use crate::scoring::rules::ScoreFactor;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single().expect("valid instant")
    }

    fn engine() -> (ScoreEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::starting_at(start());
        (ScoreEngine::with_clock(clock.clone()), clock)
    }

    fn today() -> NaiveDate {
        start().date_naive()
    }

    fn income(id: &str, category: Category, amount: f64) -> Transaction {
        Transaction {
            id: RecordId::new(id),
            kind: TransactionKind::Income,
            category,
            amount,
            description: "deposit".to_string(),
            date: today(),
        }
    }

    fn expense(id: &str, category: Category, amount: f64, days_ago: i64) -> Transaction {
        Transaction {
            id: RecordId::new(id),
            kind: TransactionKind::Expense,
            category,
            amount,
            description: "card".to_string(),
            date: today() - Duration::days(days_ago),
        }
    }

    fn debt(rate: f64) -> Debt {
        Debt {
            id: RecordId::new("card"),
            name: "Credit card".to_string(),
            amount: 1000.0,
            interest_rate: rate,
            minimum_payment: 40.0,
            kind: DebtKind::Credit,
            last_updated: start(),
        }
    }

    fn asset(id: &str, value: f64) -> Asset {
        Asset {
            id: RecordId::new(id),
            name: "Brokerage".to_string(),
            value,
            kind: AssetKind::Investment,
            last_updated: start(),
        }
    }

    fn goal(id: &str, current: f64) -> FinancialGoal {
        FinancialGoal {
            id: RecordId::new(id),
            name: "Rainy day".to_string(),
            target_amount: 1000.0,
            current_amount: current,
            kind: GoalKind::Savings,
            deadline: None,
        }
    }

    #[test]
    fn fresh_engine_reports_initial_score() {
        let (engine, _) = engine();
        assert_eq!(engine.score(), 50);
        assert!(engine.breakdown().is_none());
        assert_eq!(engine.state().assets.len(), 1);
        assert_eq!(engine.state().assets[0].id.as_str(), CASH_ASSET_ID);
        assert_eq!(engine.state().cash_on_hand(), 0.0);
    }

    #[test]
    fn income_transaction_funds_cash_on_hand() {
        let (mut engine, clock) = engine();
        clock.advance(Duration::minutes(5));

        engine.add_transaction(income("pay", Category::Salary, 1000.0));

        let cash = engine.state().cash_asset().expect("cash asset present");
        assert_eq!(cash.value, 1000.0);
        assert_eq!(cash.last_updated, start() + Duration::minutes(5));
        let breakdown = engine.breakdown().expect("recalculated");
        assert_eq!(breakdown.points(ScoreFactor::EmergencyFund), Some(0.0));
    }

    #[test]
    fn reserved_cash_id_is_rejected() {
        let (mut engine, _) = engine();
        let before = engine.financial_state();

        let accepted = engine.add_asset(asset(CASH_ASSET_ID, 1_000_000.0));

        assert!(!accepted);
        assert_eq!(engine.financial_state(), before);
        assert!(engine.events().is_empty());
        assert_eq!(engine.score(), 50);
    }

    #[test]
    fn adding_asset_records_positive_event() {
        let (mut engine, _) = engine();
        assert!(engine.add_asset(asset("brokerage", 5000.0)));

        assert_eq!(engine.state().assets.len(), 2);
        let event = engine.events().last().expect("event recorded");
        assert_eq!(event.label, ASSET_ADDED);
        assert_eq!(event.weight, 3.0);
    }

    #[test]
    fn high_interest_debt_records_heavier_event() {
        let (mut engine, _) = engine();
        engine.add_debt(debt(20.0));
        engine.add_debt(debt(6.0));

        let weights: Vec<f64> = engine.events().iter().map(|event| event.weight).collect();
        assert_eq!(weights, vec![-5.0, -2.0]);
        assert!((engine.metrics().weighted_interest_rate - 13.0).abs() < 1e-12);
    }

    #[test]
    fn fourth_dining_expense_is_penalised() {
        let (mut engine, _) = engine();
        for (index, days_ago) in [3, 10, 20].into_iter().enumerate() {
            let id = format!("dinner-{index}");
            engine.add_transaction(expense(&id, Category::Dining, 50.0, days_ago));
        }
        engine.add_transaction(expense("dinner-3", Category::Dining, 50.0, 0));

        let event = engine.events().last().expect("event recorded");
        assert_eq!(event.weight, -3.0);
        assert_eq!(engine.state().cash_on_hand(), -200.0);
    }

    #[test]
    fn goal_updates_upsert_in_place_without_events() {
        let (mut engine, _) = engine();
        engine.update_goal(goal("fund", 100.0));
        engine.update_goal(goal("trip", 0.0));
        engine.update_goal(goal("fund", 800.0));

        let goals = &engine.state().goals;
        assert_eq!(goals.len(), 2);
        assert_eq!(goals[0].id, RecordId::new("fund"));
        assert_eq!(goals[0].current_amount, 800.0);
        assert!(engine.events().is_empty());
        let breakdown = engine.breakdown().expect("recalculated");
        assert_eq!(breakdown.points(ScoreFactor::GoalProgress), Some(4.0));
    }

    #[test]
    fn bulk_update_bypasses_reconciliation_and_events() {
        let (mut engine, _) = engine();
        engine.update_financial_state(StatePatch {
            transactions: Some(vec![income("imported", Category::Salary, 2500.0)]),
            ..StatePatch::default()
        });

        assert_eq!(engine.state().transactions.len(), 1);
        assert_eq!(engine.state().cash_on_hand(), 0.0);
        assert!(engine.events().is_empty());
        assert!(engine.breakdown().is_some());
    }

    #[test]
    fn transactions_without_cash_asset_are_still_recorded() {
        let (mut engine, _) = engine();
        engine.update_financial_state(StatePatch {
            assets: Some(Vec::new()),
            ..StatePatch::default()
        });

        engine.add_transaction(income("pay", Category::Salary, 400.0));

        assert_eq!(engine.state().transactions.len(), 1);
        assert!(engine.state().cash_asset().is_none());
        assert_eq!(engine.events().len(), 1);
    }

    #[test]
    fn reads_do_not_recalculate() {
        let (mut engine, clock) = engine();
        engine.add_asset(asset("brokerage", 5000.0));
        let score = engine.score();

        clock.advance(Duration::days(90));

        assert_eq!(engine.score(), score);
        assert_eq!(engine.financial_state(), engine.financial_state());
    }

    #[test]
    fn event_modifier_decays_between_mutations() {
        let (mut engine, clock) = engine();
        engine.add_asset(asset("brokerage", 5000.0));
        let fresh = engine.breakdown().expect("scored").event_modifier;

        clock.advance(Duration::days(30));
        engine.update_goal(goal("fund", 0.0));
        let aged = engine.breakdown().expect("scored").event_modifier;

        assert_eq!(fresh, 3.0);
        assert!((aged - 3.0 * (-3.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn healthy_profile_scores_high() {
        let (mut engine, _) = engine();
        for month in (0..3).rev() {
            let mut pay = income(&format!("pay-{month}"), Category::Salary, 5000.0);
            pay.date = today() - Duration::days(month * 30 + 5);
            engine.add_transaction(pay);
        }
        engine.add_transaction(expense("rent", Category::Housing, 1500.0, 2));
        engine.add_asset(asset("brokerage", 20_000.0));
        engine.update_goal(goal("fund", 1000.0));

        let breakdown = engine.breakdown().expect("scored");
        assert_eq!(breakdown.points(ScoreFactor::EmergencyFund), Some(20.0));
        assert_eq!(breakdown.points(ScoreFactor::SavingsBehavior), Some(20.0));
        assert_eq!(breakdown.points(ScoreFactor::IncomeStability), Some(10.0));
        assert_eq!(engine.score(), 100);
        assert_eq!(engine.snapshot().band, crate::scoring::snapshot::ScoreBand::Strong);
    }
}
