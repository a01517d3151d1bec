//! Rate computation from consecutive `/varz` samples.
//!
//! The broker only exposes cumulative counters. Per-second rates are the
//! counter delta between two samples divided by the monotonic time between
//! them. [`RateState`] carries the previous sample across ticks.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::model::{Connz, Varz};

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Compute i64 delta, returning `None` on counter regression (server restart).
pub fn di64(curr: i64, prev: i64) -> Option<i64> {
    (curr >= prev).then(|| curr.saturating_sub(prev))
}

fn per_sec(curr: i64, prev: i64, dt: f64) -> f64 {
    di64(curr, prev).map_or(0.0, |d| d as f64 / dt)
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Per-second throughput derived from two samples. All rates are `>= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateSet {
    pub in_bytes_per_sec: f64,
    pub out_bytes_per_sec: f64,
    pub in_msgs_per_sec: f64,
    pub out_msgs_per_sec: f64,
    /// Window the rates cover. Zero when there was nothing to compare with.
    pub elapsed: Duration,
}

impl RateSet {
    pub fn is_zero(&self) -> bool {
        self.in_bytes_per_sec == 0.0
            && self.out_bytes_per_sec == 0.0
            && self.in_msgs_per_sec == 0.0
            && self.out_msgs_per_sec == 0.0
    }
}

/// Rates between `prev` and `curr` over `elapsed`.
///
/// Zero elapsed time gives all-zero rates. A counter that went backwards
/// contributes a zero rate.
pub fn compute_rates(prev: &Varz, curr: &Varz, elapsed: Duration) -> RateSet {
    if elapsed.is_zero() {
        return RateSet::default();
    }
    let dt = elapsed.as_secs_f64();
    RateSet {
        in_bytes_per_sec: per_sec(curr.in_bytes, prev.in_bytes, dt),
        out_bytes_per_sec: per_sec(curr.out_bytes, prev.out_bytes, dt),
        in_msgs_per_sec: per_sec(curr.in_msgs, prev.in_msgs, dt),
        out_msgs_per_sec: per_sec(curr.out_msgs, prev.out_msgs, dt),
        elapsed,
    }
}

// ---------------------------------------------------------------------------
// Rate state
// ---------------------------------------------------------------------------

/// One successfully fetched pair of reports.
#[derive(Debug, Clone)]
pub struct Sample {
    pub varz: Arc<Varz>,
    pub connz: Arc<Connz>,
    pub taken_at: Instant,
}

/// Rate tracking state: the previous sample, absent before the first tick.
#[derive(Debug, Default)]
pub struct RateState {
    prev: Option<Sample>,
}

impl RateState {
    /// Computes rates for `sample` against the previous one, then makes
    /// `sample` the new previous.
    pub fn update(&mut self, sample: Sample) -> RateSet {
        let rates = match &self.prev {
            Some(prev) => {
                let elapsed = sample.taken_at.saturating_duration_since(prev.taken_at);
                compute_rates(&prev.varz, &sample.varz, elapsed)
            }
            None => RateSet::default(),
        };
        self.prev = Some(sample);
        rates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{connz_json, varz_json};

    fn varz(in_msgs: i64, out_msgs: i64, in_bytes: i64, out_bytes: i64) -> Varz {
        serde_json::from_value(varz_json(in_msgs, out_msgs, in_bytes, out_bytes)).unwrap()
    }

    fn sample(v: Varz, taken_at: Instant) -> Sample {
        Sample {
            varz: Arc::new(v),
            connz: Arc::new(serde_json::from_value(connz_json(1024)).unwrap()),
            taken_at,
        }
    }

    #[test]
    fn test_di64() {
        assert_eq!(di64(10, 4), Some(6));
        assert_eq!(di64(4, 4), Some(0));
        assert_eq!(di64(3, 4), None);
    }

    #[test]
    fn test_compute_rates_fixed_window() {
        let prev = varz(100, 50, 10_000, 4_000);
        let curr = varz(300, 250, 30_480, 6_048);
        let rates = compute_rates(&prev, &curr, Duration::from_secs(2));

        assert_eq!(rates.in_msgs_per_sec, 100.0);
        assert_eq!(rates.out_msgs_per_sec, 100.0);
        assert_eq!(rates.in_bytes_per_sec, 10_240.0);
        assert_eq!(rates.out_bytes_per_sec, 1_024.0);
        assert_eq!(rates.elapsed, Duration::from_secs(2));
    }

    #[test]
    fn test_compute_rates_zero_elapsed() {
        let prev = varz(0, 0, 0, 0);
        let curr = varz(10, 10, 10, 10);
        let rates = compute_rates(&prev, &curr, Duration::ZERO);
        assert!(rates.is_zero());
        assert_eq!(rates.elapsed, Duration::ZERO);
    }

    #[test]
    fn test_compute_rates_counter_regression_is_zero() {
        let prev = varz(1_000, 1_000, 1_000, 1_000);
        let curr = varz(10, 2_000, 10, 1_500);
        let rates = compute_rates(&prev, &curr, Duration::from_millis(500));
        assert_eq!(rates.in_msgs_per_sec, 0.0);
        assert_eq!(rates.in_bytes_per_sec, 0.0);
        assert_eq!(rates.out_msgs_per_sec, 2_000.0);
        assert_eq!(rates.out_bytes_per_sec, 1_000.0);
    }

    #[test]
    fn test_rate_state_first_update_is_zero() {
        let mut state = RateState::default();
        let t0 = Instant::now();
        let rates = state.update(sample(varz(500, 500, 500, 500), t0));
        assert!(rates.is_zero());

        let rates = state.update(sample(varz(600, 500, 500, 500), t0 + Duration::from_secs(1)));
        assert_eq!(rates.in_msgs_per_sec, 100.0);
        assert_eq!(rates.out_msgs_per_sec, 0.0);
    }

    #[test]
    fn test_rate_state_same_instant_is_zero() {
        let mut state = RateState::default();
        let t0 = Instant::now();
        state.update(sample(varz(1, 1, 1, 1), t0));

        let rates = state.update(sample(varz(100, 100, 100, 100), t0));
        assert!(rates.is_zero());
        assert_eq!(rates.elapsed, Duration::ZERO);
    }
}
