use serde::{Deserialize, Serialize};

/// Tunable constants of the scoring model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Annual interest rate (percent) above which debt counts as high-interest.
    pub high_interest_threshold: f64,
    /// Exponential decay constant applied per day of event age.
    pub event_decay_per_day: f64,
    /// Symmetric bound on the event modifier.
    pub event_modifier_limit: f64,
    /// Score reported before the first mutation.
    pub initial_score: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            high_interest_threshold: 10.0,
            event_decay_per_day: 0.1,
            event_modifier_limit: 10.0,
            initial_score: 50.0,
        }
    }
}

impl ScoringPolicy {
    pub fn is_high_interest(&self, rate: f64) -> bool {
        rate > self.high_interest_threshold
    }
}
