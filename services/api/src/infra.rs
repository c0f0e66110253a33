use albert_score::scoring::ManualClock;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Pins offline runs to midday UTC on `as_of`, or to the current instant.
pub(crate) fn offline_clock(as_of: Option<NaiveDate>) -> ManualClock {
    let instant: DateTime<Utc> = match as_of {
        Some(date) => date
            .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default())
            .and_utc(),
        None => Utc::now(),
    };
    ManualClock::starting_at(instant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use albert_score::scoring::Clock;

    #[test]
    fn parse_date_reports_the_raw_value() {
        assert_eq!(
            parse_date(" 2025-06-15 "),
            Ok(NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date"))
        );
        let error = parse_date("15/06/2025").expect_err("slashes rejected");
        assert!(error.contains("15/06/2025"));
    }

    #[test]
    fn offline_clock_pins_midday() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date");
        let clock = offline_clock(Some(date));
        assert_eq!(clock.now().date_naive(), date);
        assert_eq!(clock.now().time(), NaiveTime::from_hms_opt(12, 0, 0).expect("valid time"));
    }
}
