//! Wall-clock helpers, the sleep seam, and cooperative stop.
//!
//! The engine never calls `thread::sleep` directly: every suspension goes
//! through the [`Sleeper`] trait so tests can record the exact pause
//! sequence instead of waiting it out. [`StopToken`] is the externally
//! requested stop; the engine checks it at every suspension boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, saturating to 0 on a pre-epoch clock.
#[must_use]
pub fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis() as u64)
}

/// Time-based suspension seam.
pub trait Sleeper {
    /// Suspend the caller for `duration`. No external wakeup.
    fn pause(&mut self, duration: Duration);
}

/// Production sleeper backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Test sleeper that records requested pauses without waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    /// Every pause requested, in order.
    pub pauses: Vec<Duration>,
}

impl Sleeper for RecordingSleeper {
    fn pause(&mut self, duration: Duration) {
        self.pauses.push(duration);
    }
}

/// Shared stop flag, honored at the next suspension boundary.
///
/// Stopping never rolls back persisted records; the record stream stays a
/// valid prefix of the full corpus.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// A fresh, un-stopped token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
