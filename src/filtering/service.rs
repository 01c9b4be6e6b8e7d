use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::table::EventTypeTable;
use crate::events::Details;

/// When the per-type threshold counter starts over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterResetPolicy {
    /// Cumulative for the lifetime of the process. Once a type exceeds its
    /// threshold every later occurrence is rejected.
    #[default]
    Never,
    /// The counter restarts once `window_minutes` have passed since the first
    /// occurrence counted in the current window.
    PerWindow,
}

impl FromStr for CounterResetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(CounterResetPolicy::Never),
            "window" | "per_window" => Ok(CounterResetPolicy::PerWindow),
            other => Err(format!("unknown counter reset policy {:?}", other)),
        }
    }
}

impl fmt::Display for CounterResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterResetPolicy::Never => write!(f, "never"),
            CounterResetPolicy::PerWindow => write!(f, "window"),
        }
    }
}

#[derive(Debug, Default)]
struct TypeState {
    count: u64,
    window_started: Option<DateTime<Utc>>,
    last_alert: Option<DateTime<Utc>>,
}

/// Threshold and cooldown gate in front of the publisher
///
/// Counters and cooldown timestamps live behind a single mutex; a decision is
/// taken while holding it, so concurrent callers never interleave on the same
/// event type.
pub struct FilterService {
    table: Arc<EventTypeTable>,
    policy: CounterResetPolicy,
    clock: Arc<dyn Clock>,
    state: Mutex<HashMap<String, TypeState>>,
}

impl FilterService {
    pub fn new(table: Arc<EventTypeTable>, policy: CounterResetPolicy) -> Self {
        Self::with_clock(table, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        table: Arc<EventTypeTable>,
        policy: CounterResetPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            table,
            policy,
            clock,
            state: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> CounterResetPolicy {
        self.policy
    }

    /// Decides whether an event of `event_type` may be created
    ///
    /// Checks, in order:
    /// 1. the type is configured
    /// 2. the incremented counter does not exceed the threshold
    /// 3. the cooldown window since the last accepted event has elapsed
    ///
    /// Accepting an event restarts its cooldown.
    pub fn should_create_event(&self, event_type: &str, _details: &Details) -> bool {
        let Some(config) = self.table.get(event_type) else {
            debug!(event_type, "event type not configured, rejecting");
            return false;
        };

        let now = self.clock.now();
        let window = config.window();
        let mut state = self.state.lock();
        let entry = state.entry(event_type.to_owned()).or_default();

        // A zero window has nothing to reset on, the threshold stays cumulative
        if self.policy == CounterResetPolicy::PerWindow && window > chrono::Duration::zero() {
            match entry.window_started {
                Some(started) if now - started >= window => {
                    entry.count = 0;
                    entry.window_started = Some(now);
                }
                None => entry.window_started = Some(now),
                Some(_) => {}
            }
        }

        entry.count += 1;
        if entry.count > u64::from(config.threshold) {
            debug!(
                event_type,
                count = entry.count,
                threshold = config.threshold,
                "threshold exceeded, rejecting"
            );
            return false;
        }

        if let Some(last_alert) = entry.last_alert {
            if now - last_alert < window {
                debug!(
                    event_type,
                    elapsed_secs = (now - last_alert).num_seconds(),
                    window_minutes = config.window_minutes,
                    "cooldown active, rejecting"
                );
                return false;
            }
        }

        entry.last_alert = Some(now);
        true
    }

    /// Occurrences counted so far for `event_type`
    pub fn count(&self, event_type: &str) -> u64 {
        self.state.lock().get(event_type).map_or(0, |s| s.count)
    }

    pub fn last_alert_time(&self, event_type: &str) -> Option<DateTime<Utc>> {
        self.state.lock().get(event_type).and_then(|s| s.last_alert)
    }

    /// Copy of every counter
    pub fn counts(&self) -> HashMap<String, u64> {
        self.state
            .lock()
            .iter()
            .map(|(event_type, s)| (event_type.clone(), s.count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FnHandler;
    use crate::filtering::{EventTypeConfig, ManualClock};
    use chrono::Duration;

    // Helper building a filter over a single event type
    fn filter_for(
        event_type: &str,
        threshold: u32,
        window_minutes: u32,
        policy: CounterResetPolicy,
    ) -> (FilterService, Arc<ManualClock>) {
        let config = EventTypeConfig {
            queue_name: "monitoring_events".into(),
            threshold,
            window_minutes,
            handler: FnHandler::shared("noop", |_| Ok(())),
        };
        let table = Arc::new(EventTypeTable::from_entries([(event_type.to_owned(), config)]));
        let clock = Arc::new(ManualClock::default());
        let filter = FilterService::with_clock(table, policy, clock.clone());
        (filter, clock)
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let (filter, _) = filter_for("error", 10, 5, CounterResetPolicy::Never);
        assert!(!filter.should_create_event("not_configured", &Details::new()));
        assert_eq!(filter.count("not_configured"), 0);
    }

    #[test]
    fn test_threshold_rejects_occurrence_after_limit() {
        let (filter, _) = filter_for("error", 3, 0, CounterResetPolicy::Never);

        for _ in 0..3 {
            assert!(filter.should_create_event("error", &Details::new()));
        }
        assert!(!filter.should_create_event("error", &Details::new()));
        assert_eq!(filter.count("error"), 4);
    }

    #[test]
    fn test_cooldown_blocks_until_window_elapsed() {
        let (filter, clock) = filter_for("error", 10, 5, CounterResetPolicy::Never);

        assert!(filter.should_create_event("error", &Details::new()));
        let first_alert = filter.last_alert_time("error").unwrap();

        clock.advance(Duration::minutes(4));
        assert!(!filter.should_create_event("error", &Details::new()));
        // a rejected event does not move the cooldown clock
        assert_eq!(filter.last_alert_time("error"), Some(first_alert));

        clock.advance(Duration::minutes(1));
        assert!(filter.should_create_event("error", &Details::new()));
        assert_eq!(filter.last_alert_time("error"), Some(clock.now()));
    }

    #[test]
    fn test_rate_limit_violation_scenario() {
        let (filter, clock) = filter_for("rate_limit_violation", 2, 1, CounterResetPolicy::Never);
        let details = Details::new();

        assert!(filter.should_create_event("rate_limit_violation", &details));
        assert!(!filter.should_create_event("rate_limit_violation", &details));

        clock.advance(Duration::seconds(61));
        // third occurrence: counter is 3 > 2
        assert!(!filter.should_create_event("rate_limit_violation", &details));
        assert!(!filter.should_create_event("rate_limit_violation", &details));
    }

    #[test]
    fn test_never_policy_suppresses_for_good() {
        let (filter, clock) = filter_for("error", 1, 1, CounterResetPolicy::Never);

        assert!(filter.should_create_event("error", &Details::new()));
        clock.advance(Duration::days(1));
        assert!(!filter.should_create_event("error", &Details::new()));
    }

    #[test]
    fn test_per_window_policy_resets_counter() {
        let (filter, clock) = filter_for("error", 1, 1, CounterResetPolicy::PerWindow);

        assert!(filter.should_create_event("error", &Details::new()));
        assert!(!filter.should_create_event("error", &Details::new()));

        clock.advance(Duration::minutes(1));
        assert!(filter.should_create_event("error", &Details::new()));
        assert_eq!(filter.count("error"), 1);
    }

    #[test]
    fn test_per_window_policy_with_zero_window_keeps_threshold() {
        let (filter, clock) = filter_for("error", 1, 0, CounterResetPolicy::PerWindow);

        let accepted = (0..5)
            .filter(|_| {
                clock.advance(Duration::seconds(1));
                filter.should_create_event("error", &Details::new())
            })
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(filter.count("error"), 5);
    }

    #[test]
    fn test_zero_window_only_applies_threshold() {
        let (filter, _) = filter_for("error", 2, 0, CounterResetPolicy::Never);

        assert!(filter.should_create_event("error", &Details::new()));
        assert!(filter.should_create_event("error", &Details::new()));
        assert!(!filter.should_create_event("error", &Details::new()));
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let (filter, _) = filter_for("error", 1_000, 0, CounterResetPolicy::Never);
        let filter = Arc::new(filter);

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let filter = Arc::clone(&filter);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|_| filter.should_create_event("error", &Details::new()))
                        .count()
                })
            })
            .collect();
        let accepted: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();

        assert_eq!(filter.count("error"), 800);
        assert_eq!(accepted, 800);
    }

    #[test]
    fn test_reset_policy_parsing() {
        assert_eq!("never".parse(), Ok(CounterResetPolicy::Never));
        assert_eq!("Window".parse(), Ok(CounterResetPolicy::PerWindow));
        assert!("sometimes".parse::<CounterResetPolicy>().is_err());
    }
}
