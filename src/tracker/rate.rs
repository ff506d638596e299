//! Rate tracker: shared byte counter with a sampled transfer speed

use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use crate::config::{DEFAULT_INTERVAL_MS, TrackerConfig};
use crate::tracker::sampler::{self, StopSignal};
use crate::tracker::stat::TransferStat;

/// Counter value the sampler has never observed, so the first tick always computes
const UNOBSERVED: i64 = -1;

/// Thread-safe transfer progress tracker
///
/// Cloning is cheap and every clone observes the same counters. A background
/// sampler recomputes the speed on a fixed interval until `stat` is called
/// or the last handle is dropped.
#[derive(Clone)]
pub struct RateTracker {
    shared: Arc<Shared>,
}

/// State of the most recent rate computation
struct SampleWindow {
    last_time: Instant,
    last_value: i64,
    last_observed: i64,
}

pub(super) struct Shared {
    current: AtomicI64,
    total: AtomicI64,
    // f64 bit pattern
    speed: AtomicU64,
    window: Mutex<SampleWindow>,
    start_time: Instant,
    started_at: DateTime<Utc>,
    interval: Duration,
    log_samples: bool,
    stop: Arc<StopSignal>,
    finished: OnceLock<TransferStat>,
}

impl RateTracker {
    /// Create a tracker with the default sampling interval and start its sampler
    pub fn new(total: i64) -> Self {
        Self::with_config(total, &TrackerConfig::default())
    }

    /// Create a tracker using the sampler settings from `config`
    pub fn with_config(total: i64, config: &TrackerConfig) -> Self {
        let interval = match config.validate() {
            Ok(()) => config.interval(),
            Err(e) => {
                warn!("{e}, using the default {DEFAULT_INTERVAL_MS}ms sample interval");
                Duration::from_millis(DEFAULT_INTERVAL_MS)
            }
        };

        let now = Instant::now();
        let shared = Arc::new(Shared {
            current: AtomicI64::new(0),
            total: AtomicI64::new(total),
            speed: AtomicU64::new(0f64.to_bits()),
            window: Mutex::new(SampleWindow {
                last_time: now,
                last_value: 0,
                last_observed: UNOBSERVED,
            }),
            start_time: now,
            started_at: Utc::now(),
            interval,
            log_samples: config.log_samples(),
            stop: Arc::new(StopSignal::new()),
            finished: OnceLock::new(),
        });

        debug!(
            "Created rate tracker: total {} bytes, interval {:?}",
            total, shared.interval
        );
        sampler::spawn(&shared);

        Self { shared }
    }

    /// Add `n` bytes and return the new count
    ///
    /// When the total is known the count is capped at it, so a retried read
    /// of the same data cannot push progress past 100%.
    pub fn add(&self, n: i64) -> i64 {
        let total = self.shared.total.load(Ordering::SeqCst);
        let advance = |current: i64| {
            let next = current.wrapping_add(n);
            if total > 0 && next > total { total } else { next }
        };

        // Add and clamp in one step so no reader ever sees the overshoot
        let previous = match self.shared.current.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |current| Some(advance(current)),
        ) {
            Ok(previous) | Err(previous) => previous,
        };
        advance(previous)
    }

    /// Overwrite the count, e.g. when resuming at a known offset
    pub fn set(&self, n: i64) -> &Self {
        self.shared.current.store(n, Ordering::SeqCst);
        self
    }

    pub fn get(&self) -> i64 {
        self.shared.current.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> i64 {
        self.shared.total.load(Ordering::SeqCst)
    }

    /// Replace the expected total; does not clamp the current count
    pub fn set_total(&self, n: i64) {
        self.shared.total.store(n, Ordering::SeqCst);
    }

    /// Most recently sampled speed in bytes per second
    pub fn speed(&self) -> f64 {
        self.shared.load_speed()
    }

    /// Recompute the speed if the count moved since the last sample
    ///
    /// This is what the background sampler runs every tick. It does nothing
    /// once the tracker is finished.
    pub fn update(&self) {
        self.shared.update();
    }

    /// Finish the transfer and return its final snapshot
    ///
    /// The first call stops the sampler and computes the snapshot; every
    /// later call, from any thread, returns that same snapshot. Callers that
    /// race the first one block briefly until that snapshot is computed.
    pub fn stat(&self) -> TransferStat {
        self.shared
            .finished
            .get_or_init(|| self.shared.finalize())
            .clone()
    }

    pub fn is_finished(&self) -> bool {
        self.shared.finished.get().is_some()
    }

    /// Progress percentage, 0 when the total is unknown
    pub fn percentage(&self) -> f64 {
        let total = self.total();
        if total <= 0 {
            0.0
        } else {
            (self.get() as f64 / total as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.shared.start_time.elapsed()
    }

    /// Wall-clock time the tracker was created
    pub fn started_at(&self) -> DateTime<Utc> {
        self.shared.started_at
    }
}

impl std::fmt::Debug for RateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateTracker")
            .field("current", &self.get())
            .field("total", &self.total())
            .field("speed", &self.speed())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Shared {
    pub(super) fn interval(&self) -> Duration {
        self.interval
    }

    pub(super) fn stop_signal(&self) -> Arc<StopSignal> {
        Arc::clone(&self.stop)
    }

    fn lock_window(&self) -> MutexGuard<'_, SampleWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_speed(&self) -> f64 {
        f64::from_bits(self.speed.load(Ordering::SeqCst))
    }

    pub(super) fn update(&self) {
        let current = self.current.load(Ordering::SeqCst);
        let mut window = self.lock_window();

        // Checked under the window lock so a tick racing with finalize
        // cannot overwrite the final speed.
        if self.stop.is_fired() {
            return;
        }

        if current != window.last_observed {
            let speed = self.recompute(&mut window, current);
            window.last_observed = current;
            if self.log_samples {
                trace!("Sampled {current} bytes, {speed:.1} B/s");
            }
        }
    }

    /// Speed over the window since the last sample, then move the window forward
    fn recompute(&self, window: &mut SampleWindow, current: i64) -> f64 {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(window.last_time);
        let delta = current.saturating_sub(window.last_value);
        window.last_time = now;
        window.last_value = current;

        let secs = elapsed.as_secs_f64();
        let speed = if secs > 0.0 { delta as f64 / secs } else { 0.0 };
        self.speed.store(speed.to_bits(), Ordering::SeqCst);
        speed
    }

    fn finalize(&self) -> TransferStat {
        self.stop.fire();

        let total = self.total.load(Ordering::SeqCst);
        let transferred = self.current.load(Ordering::SeqCst);
        let speed = {
            let mut window = self.lock_window();
            self.recompute(&mut window, transferred)
        };

        info!(
            "Transfer finished: {} of {} bytes, {:.1} B/s, started {}, took {:?}",
            transferred,
            total,
            speed,
            self.started_at.to_rfc3339(),
            self.start_time.elapsed()
        );
        TransferStat::success(total, transferred, speed)
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.stop.fire();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::testing::init_test_logger;
    use std::thread;

    fn fast_config() -> TrackerConfig {
        let mut config = TrackerConfig::default();
        config.sampler.interval_ms = 10;
        config.sampler.log_samples = true;
        config
    }

    #[test]
    fn test_add_accumulates_with_unknown_total() {
        let tracker = RateTracker::new(0);
        assert_eq!(tracker.add(10), 10);
        assert_eq!(tracker.add(20), 30);
        assert_eq!(tracker.add(0), 30);
        assert_eq!(tracker.get(), 30);
    }

    #[test]
    fn test_add_clamps_to_total() {
        let tracker = RateTracker::new(100);
        assert_eq!(tracker.add(60), 60);
        assert_eq!(tracker.add(60), 100);
        assert_eq!(tracker.get(), 100);
        assert_eq!(tracker.add(1), 100);
        assert_eq!(tracker.get(), 100);
    }

    #[test]
    fn test_negative_add_accepted() {
        let tracker = RateTracker::new(0);
        tracker.add(10);
        assert_eq!(tracker.add(-4), 6);
    }

    #[test]
    fn test_set_overrides_and_chains() {
        let tracker = RateTracker::new(0);
        tracker.add(500);
        assert_eq!(tracker.set(42).get(), 42);
        tracker.set(7);
        assert_eq!(tracker.get(), 7);
    }

    #[test]
    fn test_set_is_not_clamped() {
        let tracker = RateTracker::new(10);
        tracker.set(50);
        assert_eq!(tracker.get(), 50);
    }

    #[test]
    fn test_set_total_does_not_clamp_retroactively() {
        let tracker = RateTracker::new(0);
        tracker.add(100);
        tracker.set_total(50);
        assert_eq!(tracker.get(), 100);
        assert_eq!(tracker.total(), 50);

        // The next add applies the new cap
        assert_eq!(tracker.add(0), 50);
        assert_eq!(tracker.get(), 50);
    }

    #[test]
    fn test_two_halves_reach_total() {
        let tracker = RateTracker::new(1000);
        tracker.add(500);
        tracker.add(500);
        assert_eq!(tracker.get(), 1000);

        let stat = tracker.stat();
        assert_eq!(stat.transferred, 1000);
        assert_eq!(stat.total, 1000);
        assert_eq!(stat.status, "success");
    }

    #[test]
    fn test_speed_is_zero_before_any_data() {
        let tracker = RateTracker::new(1000);
        assert_eq!(tracker.speed(), 0.0);
    }

    #[test]
    fn test_stat_reflects_latest_values() {
        let tracker = RateTracker::new(10);
        tracker.add(3);
        tracker.set_total(20);
        tracker.add(4);

        let stat = tracker.stat();
        assert_eq!(stat.total, 20);
        assert_eq!(stat.transferred, 7);
        assert!(stat.speed >= 0.0);
    }

    #[test]
    fn test_repeated_stat_returns_cached_snapshot() {
        let tracker = RateTracker::new(0);
        tracker.add(64);
        let first = tracker.stat();
        assert!(tracker.is_finished());

        tracker.add(1000);
        tracker.set_total(5000);
        let second = tracker.stat();
        assert_eq!(first, second);
        assert_eq!(second.transferred, 64);
    }

    #[test]
    fn test_update_is_frozen_after_stat() {
        let tracker = RateTracker::with_config(0, &fast_config());
        tracker.add(100);
        let stat = tracker.stat();

        tracker.add(1_000_000);
        tracker.update();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(tracker.speed(), stat.speed);
    }

    #[test]
    fn test_sampler_computes_speed() {
        init_test_logger();
        let tracker = RateTracker::with_config(0, &fast_config());

        // Let the startup sample observe the zero count first
        thread::sleep(Duration::from_millis(30));
        tracker.add(4096);
        thread::sleep(Duration::from_millis(100));

        assert!(tracker.speed() > 0.0);
        tracker.stat();
    }

    #[test]
    fn test_update_skips_unchanged_counter() {
        let mut config = TrackerConfig::default();
        // Keep the background sampler out of the way
        config.sampler.interval_ms = 60_000;
        let tracker = RateTracker::with_config(0, &config);

        tracker.add(10);
        tracker.update();
        let speed = tracker.speed();
        assert!(speed >= 0.0);

        thread::sleep(Duration::from_millis(20));
        tracker.update();
        assert_eq!(tracker.speed(), speed);
    }

    #[test]
    fn test_concurrent_adds_do_not_lose_updates() {
        let tracker = RateTracker::with_config(0, &fast_config());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        tracker.add(3);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.get(), 8 * 1000 * 3);
        assert_eq!(tracker.stat().transferred, 24_000);
    }

    #[test]
    fn test_concurrent_adds_never_exceed_total() {
        let tracker = RateTracker::new(1000);
        tracker.add(1000);

        let adders: Vec<_> = (0..4)
            .map(|_| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for _ in 0..20_000 {
                        assert!(tracker.add(500) <= 1000);
                    }
                })
            })
            .collect();

        // Observe the counter while the adders are still running
        let mut max_seen = 0;
        while adders.iter().any(|h| !h.is_finished()) {
            max_seen = max_seen.max(tracker.get());
        }
        for handle in adders {
            handle.join().unwrap();
        }

        assert!(max_seen <= 1000, "observed {max_seen} with total 1000");
        assert_eq!(tracker.get(), 1000);
    }

    #[test]
    fn test_stat_during_adds_never_exceeds_total() {
        for _ in 0..100 {
            let tracker = RateTracker::new(1000);
            tracker.add(990);

            let adder = {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        tracker.add(7);
                    }
                })
            };
            let stat = tracker.stat();
            adder.join().unwrap();

            assert!(stat.transferred <= stat.total, "{stat:?}");
            assert!(tracker.get() <= 1000);
        }
    }

    #[test]
    fn test_zero_interval_falls_back_to_default() {
        let mut config = TrackerConfig::default();
        config.sampler.interval_ms = 0;
        let tracker = RateTracker::with_config(0, &config);

        assert_eq!(
            tracker.shared.interval(),
            Duration::from_millis(DEFAULT_INTERVAL_MS)
        );
        tracker.stat();
    }

    #[test]
    fn test_concurrent_stat_finalizes_once() {
        let tracker = RateTracker::new(0);
        tracker.add(256);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                thread::spawn(move || tracker.stat())
            })
            .collect();
        let stats: Vec<TransferStat> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(stats.iter().all(|s| *s == stats[0]));
        assert_eq!(stats[0].transferred, 256);
    }

    #[test]
    fn test_drop_stops_sampler() {
        let tracker = RateTracker::with_config(0, &fast_config());
        let stop = tracker.shared.stop_signal();
        assert!(!stop.is_fired());

        // The sampler may briefly hold the last strong reference mid-tick
        drop(tracker);
        assert!(stop.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn test_percentage_and_clock() {
        let tracker = RateTracker::new(200);
        assert_eq!(tracker.percentage(), 0.0);
        tracker.add(50);
        assert_eq!(tracker.percentage(), 25.0);
        assert!(tracker.started_at() <= Utc::now());

        let unknown = RateTracker::new(0);
        unknown.add(50);
        assert_eq!(unknown.percentage(), 0.0);
    }
}
