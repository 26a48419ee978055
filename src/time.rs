//! Time source abstraction for testability.
//!
//! Autosave debounce and interval decisions go through a `TimeSource` so
//! production uses real clocks while tests advance logical time instantly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Abstraction over "what time is it now".
pub trait TimeSource: Send + Sync + std::fmt::Debug {
    /// Current instant for measuring elapsed time.
    fn now(&self) -> Instant;

    /// Elapsed time since an earlier instant.
    fn elapsed_since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}

/// Shared handle to a time source.
pub type SharedTimeSource = Arc<dyn TimeSource>;

/// Production implementation using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeSource;

impl RealTimeSource {
    pub fn shared() -> SharedTimeSource {
        Arc::new(RealTimeSource)
    }
}

impl TimeSource for RealTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Test implementation with manually advanced logical time.
#[derive(Debug)]
pub struct MockTimeSource {
    base: Instant,
    offset_millis: AtomicU64,
}

impl MockTimeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(MockTimeSource {
            base: Instant::now(),
            offset_millis: AtomicU64::new(0),
        })
    }

    /// Advance logical time by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.offset_millis
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_millis.load(Ordering::SeqCst))
    }
}
