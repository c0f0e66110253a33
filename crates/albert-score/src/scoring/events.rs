use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::bounded;
use super::config::ScoringPolicy;

pub const ASSET_ADDED: &str = "asset_added";
pub const DEBT_ADDED: &str = "debt_added";
pub const TRANSACTION_RECORDED: &str = "transaction";

const NANOS_PER_DAY: f64 = 86_400_000_000_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A scored user action. Labels are free-form so hosts can record their own kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEvent {
    pub label: String,
    pub weight: f64,
    pub timestamp: DateTime<Utc>,
}

impl UserEvent {
    pub fn new(label: impl Into<String>, weight: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            weight,
            timestamp,
        }
    }

    /// Age in fractional days, floored at zero for events stamped after `now`.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        elapsed_days(self.timestamp, now)
    }

    pub fn decayed_weight(&self, now: DateTime<Utc>, decay_per_day: f64) -> f64 {
        self.weight * (-decay_per_day * self.age_days(now)).exp()
    }
}

fn elapsed_days(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let elapsed = to - from;
    if elapsed <= Duration::zero() {
        return 0.0;
    }
    // Nanosecond count overflows past ~292 years.
    match elapsed.num_nanoseconds() {
        Some(nanos) => nanos as f64 / NANOS_PER_DAY,
        None => elapsed.num_milliseconds() as f64 / MILLIS_PER_DAY,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DecayCheckpoint {
    at: DateTime<Utc>,
    total: f64,
    folded: usize,
}

/// Append-only log of user events.
///
/// The decayed sum is carried forward from the last evaluation instant instead of
/// being rebuilt from every event; when the clock moves backwards, or an event is
/// stamped in the future, the log falls back to a full recomputation.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<UserEvent>,
    latest: Option<DateTime<Utc>>,
    checkpoint: Option<DecayCheckpoint>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: UserEvent) {
        self.latest = Some(match self.latest {
            Some(latest) if latest >= event.timestamp => latest,
            _ => event.timestamp,
        });
        self.events.push(event);
    }

    pub fn events(&self) -> &[UserEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Decayed sum of every event weight, clamped to the policy bound.
    pub fn modifier(&mut self, now: DateTime<Utc>, policy: &ScoringPolicy) -> f64 {
        let total = self.decayed_total(now, policy.event_decay_per_day);
        let limit = policy.event_modifier_limit;
        bounded(total, -limit, limit)
    }

    /// Same value as [`EventLog::modifier`], recomputed from the whole history.
    pub fn modifier_from_scratch(&self, now: DateTime<Utc>, policy: &ScoringPolicy) -> f64 {
        let total = naive_total(&self.events, now, policy.event_decay_per_day);
        let limit = policy.event_modifier_limit;
        bounded(total, -limit, limit)
    }

    fn decayed_total(&mut self, now: DateTime<Utc>, decay_per_day: f64) -> f64 {
        let total = match self.checkpoint {
            Some(checkpoint) if now >= checkpoint.at => {
                let carried =
                    checkpoint.total * (-decay_per_day * elapsed_days(checkpoint.at, now)).exp();
                carried + naive_total(&self.events[checkpoint.folded..], now, decay_per_day)
            }
            _ => naive_total(&self.events, now, decay_per_day),
        };

        self.checkpoint = match self.latest {
            Some(latest) if latest > now => None,
            _ => Some(DecayCheckpoint {
                at: now,
                total,
                folded: self.events.len(),
            }),
        };

        total
    }
}

fn naive_total(events: &[UserEvent], now: DateTime<Utc>, decay_per_day: f64) -> f64 {
    events
        .iter()
        .map(|event| event.decayed_weight(now, decay_per_day))
        .sum()
}
