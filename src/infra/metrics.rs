//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics so the host can read a snapshot from another task without
//! touching controller state. All counter updates are lock-free; reporting
//! swaps the per-interval counters to zero.
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only and never drive controller decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries (microseconds)
/// Buckets: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200
const BUCKET_BOUNDS: [u64; 10] = [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];
pub const METRICS_NUM_BUCKETS: usize = 11;
const NUM_BUCKETS: usize = METRICS_NUM_BUCKETS;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    // Upper bounds for each bucket (last bucket uses 2x the previous bound)
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200, 102400];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Total events ever processed (monotonic)
    events_total: AtomicU64,
    /// Events since last report (reset on report)
    events_since_report: AtomicU64,
    /// Sum of latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Event processing latency histogram buckets (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Motion samples rejected as malformed (monotonic)
    motion_samples_dropped: AtomicU64,
    /// Shakes the classifier reported (monotonic)
    shakes_detected: AtomicU64,
    /// Shakes that passed the gate and started a session (monotonic)
    shakes_accepted: AtomicU64,
    /// Shakes dropped by the gate (monotonic)
    shakes_dropped: AtomicU64,
    /// Selection triggers of any source (shake, button, permission) that passed the gate (monotonic)
    triggers_accepted: AtomicU64,
    /// Selection triggers of any source dropped by the gate (monotonic)
    triggers_dropped: AtomicU64,
    /// Selection sessions started, any trigger (monotonic)
    sessions_started: AtomicU64,
    /// Selection sessions that delivered a winner (monotonic)
    sessions_completed: AtomicU64,
    /// Start requests refused by the animator (monotonic)
    sessions_rejected: AtomicU64,
    /// Sessions torn down before completion (monotonic)
    sessions_cancelled: AtomicU64,
    /// Idle hints shown (monotonic)
    idle_hints_shown: AtomicU64,
    /// Idle deadlines swallowed because something modal was open (monotonic)
    idle_hints_suppressed: AtomicU64,
    /// Wrong PIN entries (monotonic)
    pin_failures: AtomicU64,
    /// Cart mutations: add, adjust, cascade removal (monotonic)
    cart_mutations: AtomicU64,
    /// Orders placed (monotonic)
    orders_placed: AtomicU64,
    /// Host notifications dropped because the channel was full (monotonic)
    host_events_dropped: AtomicU64,
    /// Last report time (only accessed from reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            events_total: AtomicU64::new(0),
            events_since_report: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            motion_samples_dropped: AtomicU64::new(0),
            shakes_detected: AtomicU64::new(0),
            shakes_accepted: AtomicU64::new(0),
            shakes_dropped: AtomicU64::new(0),
            triggers_accepted: AtomicU64::new(0),
            triggers_dropped: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
            sessions_completed: AtomicU64::new(0),
            sessions_rejected: AtomicU64::new(0),
            sessions_cancelled: AtomicU64::new(0),
            idle_hints_shown: AtomicU64::new(0),
            idle_hints_suppressed: AtomicU64::new(0),
            pin_failures: AtomicU64::new(0),
            cart_mutations: AtomicU64::new(0),
            orders_placed: AtomicU64::new(0),
            host_events_dropped: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record an event was processed with given latency (lock-free)
    #[inline]
    pub fn record_event_processed(&self, latency_us: u64) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
        self.events_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);

        let bucket = bucket_index(latency_us);
        self.latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);

        update_atomic_max(&self.latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_motion_sample_dropped(&self) {
        self.motion_samples_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_shake_detected(&self) {
        self.shakes_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a gate decision. Only physical shakes move the shake counters.
    #[inline]
    pub fn record_trigger_gated(&self, from_shake: bool, accepted: bool) {
        match (from_shake, accepted) {
            (true, true) => self.shakes_accepted.fetch_add(1, Ordering::Relaxed),
            (true, false) => self.shakes_dropped.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };
        if accepted {
            self.triggers_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.triggers_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_session_completed(&self) {
        self.sessions_completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_session_rejected(&self) {
        self.sessions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_session_cancelled(&self) {
        self.sessions_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_idle_hint(&self, shown: bool) {
        if shown {
            self.idle_hints_shown.fetch_add(1, Ordering::Relaxed);
        } else {
            self.idle_hints_suppressed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_pin_failure(&self) {
        self.pin_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cart_mutation(&self) {
        self.cart_mutations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_order_placed(&self) {
        self.orders_placed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_host_event_dropped(&self) {
        self.host_events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total events processed
    #[inline]
    pub fn events_total(&self) -> u64 {
        self.events_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn shakes_dropped(&self) -> u64 {
        self.shakes_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn triggers_dropped(&self) -> u64 {
        self.triggers_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sessions_started(&self) -> u64 {
        self.sessions_started.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sessions_completed(&self) -> u64 {
        self.sessions_completed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn host_events_dropped(&self) -> u64 {
        self.host_events_dropped.load(Ordering::Relaxed)
    }

    /// Report current metrics and reset the per-interval counters
    pub fn report(&self) -> MetricsSummary {
        let events_count = self.events_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let events_per_sec = if elapsed.as_secs_f64() > 0.0 {
            events_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let avg_latency = if events_count > 0 { latency_sum / events_count } else { 0 };

        MetricsSummary {
            events_total: self.events_total.load(Ordering::Relaxed),
            events_per_sec,
            avg_process_latency_us: avg_latency,
            max_process_latency_us: max_latency,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
            lat_buckets,
            motion_samples_dropped: self.motion_samples_dropped.load(Ordering::Relaxed),
            shakes_detected: self.shakes_detected.load(Ordering::Relaxed),
            shakes_accepted: self.shakes_accepted.load(Ordering::Relaxed),
            shakes_dropped: self.shakes_dropped.load(Ordering::Relaxed),
            triggers_accepted: self.triggers_accepted.load(Ordering::Relaxed),
            triggers_dropped: self.triggers_dropped.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_completed: self.sessions_completed.load(Ordering::Relaxed),
            sessions_rejected: self.sessions_rejected.load(Ordering::Relaxed),
            sessions_cancelled: self.sessions_cancelled.load(Ordering::Relaxed),
            idle_hints_shown: self.idle_hints_shown.load(Ordering::Relaxed),
            idle_hints_suppressed: self.idle_hints_suppressed.load(Ordering::Relaxed),
            pin_failures: self.pin_failures.load(Ordering::Relaxed),
            cart_mutations: self.cart_mutations.load(Ordering::Relaxed),
            orders_placed: self.orders_placed.load(Ordering::Relaxed),
            host_events_dropped: self.host_events_dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot returned by [`Metrics::report`]
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub events_total: u64,
    pub events_per_sec: f64,
    pub avg_process_latency_us: u64,
    pub max_process_latency_us: u64,
    /// Bounds: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200 µs
    pub lat_buckets: [u64; NUM_BUCKETS],
    pub lat_p50_us: u64,
    pub lat_p99_us: u64,
    pub motion_samples_dropped: u64,
    pub shakes_detected: u64,
    pub shakes_accepted: u64,
    pub shakes_dropped: u64,
    pub triggers_accepted: u64,
    pub triggers_dropped: u64,
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub sessions_rejected: u64,
    pub sessions_cancelled: u64,
    pub idle_hints_shown: u64,
    pub idle_hints_suppressed: u64,
    pub pin_failures: u64,
    pub cart_mutations: u64,
    pub orders_placed: u64,
    pub host_events_dropped: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            events_total = %self.events_total,
            events_per_sec = format!("{:.1}", self.events_per_sec),
            avg_latency_us = %self.avg_process_latency_us,
            max_latency_us = %self.max_process_latency_us,
            p50_us = %self.lat_p50_us,
            p99_us = %self.lat_p99_us,
            shakes = %self.shakes_detected,
            shakes_dropped = %self.shakes_dropped,
            triggers_dropped = %self.triggers_dropped,
            sessions = %self.sessions_started,
            sessions_done = %self.sessions_completed,
            idle_hints = %self.idle_hints_shown,
            orders = %self.orders_placed,
            host_dropped = %self.host_events_dropped,
            "metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.events_total(), 0);
        assert_eq!(metrics.sessions_started(), 0);
    }

    #[test]
    fn test_record_event() {
        let metrics = Metrics::new();

        metrics.record_event_processed(100);
        assert_eq!(metrics.events_total(), 1);
        assert_eq!(metrics.latency_sum_us.load(Ordering::Relaxed), 100);

        metrics.record_event_processed(200);
        assert_eq!(metrics.events_total(), 2);
        assert_eq!(metrics.latency_sum_us.load(Ordering::Relaxed), 300);
    }

    #[test]
    fn test_bucket_index() {
        assert_eq!(bucket_index(50), 0);
        assert_eq!(bucket_index(100), 0);
        assert_eq!(bucket_index(101), 1);
        assert_eq!(bucket_index(60_000), 10);
    }

    #[test]
    fn test_report_resets_interval_counters() {
        let metrics = Metrics::new();
        metrics.record_event_processed(150);
        metrics.record_event_processed(450);
        metrics.record_shake_detected();
        metrics.record_trigger_gated(true, false);

        let summary = metrics.report();
        assert_eq!(summary.events_total, 2);
        assert_eq!(summary.avg_process_latency_us, 300);
        assert_eq!(summary.max_process_latency_us, 450);
        assert_eq!(summary.lat_buckets[1], 1);
        assert_eq!(summary.lat_buckets[3], 1);
        assert_eq!(summary.shakes_dropped, 1);
        assert_eq!(summary.triggers_dropped, 1);

        let second = metrics.report();
        assert_eq!(second.events_total, 2); // monotonic
        assert_eq!(second.max_process_latency_us, 0);
        assert_eq!(second.lat_buckets.iter().sum::<u64>(), 0);
        assert_eq!(second.shakes_detected, 1);
    }

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile_from_buckets(&[0; NUM_BUCKETS], 0.5), 0);
    }

    #[test]
    fn test_manual_triggers_do_not_count_as_shakes() {
        let metrics = Metrics::new();
        metrics.record_trigger_gated(false, true);
        metrics.record_trigger_gated(false, false);
        metrics.record_trigger_gated(true, true);

        let summary = metrics.report();
        assert_eq!(summary.shakes_accepted, 1);
        assert_eq!(summary.shakes_dropped, 0);
        assert_eq!(summary.triggers_accepted, 2);
        assert_eq!(summary.triggers_dropped, 1);
    }
}
