//! Pacing and backpressure state machine.
//!
//! ```text
//!  Pacer::after_case(failure, rng)
//!    ├── final case? ──→ no pauses (nothing left to pace)
//!    ├── RateLimited? ── counter += 1 ──≥ threshold → emit Cooldown, reset
//!    ├── otherwise ───── counter = 0
//!    ├── emit InterCase: base_delay + uniform(0, jitter)
//!    └── batch boundary? → emit BatchPause, reset counter
//! ```
//!
//! The pacer is a pure state machine: it never sleeps, it emits [`Pause`]
//! directives that the engine executes through its sleeper. Three
//! independent mechanisms compose: per-case jitter smooths short-term
//! burstiness, batch pauses smooth medium-term load, and cooldown handles
//! sustained throttling. A cooldown never drops the case that triggered it;
//! that record is already persisted, the cooldown only delays the next one.
//!
//! The pacer never retries a case and no case failure is fatal; only typed
//! [`FailureKind::RateLimited`] outcomes feed the cooldown counter.

use std::fmt;
use std::time::Duration;

use fpace_types::FailureKind;

use crate::config::PacerConfig;
use crate::rng::XorShift64;

/// Why the engine is being asked to suspend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    /// Randomized delay between two consecutive cases.
    InterCase,
    /// Forced suspension after sustained rate limiting.
    Cooldown,
    /// Unconditional pause at a batch boundary.
    BatchPause,
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InterCase => "inter_case",
            Self::Cooldown => "cooldown",
            Self::BatchPause => "batch_pause",
        };
        f.write_str(name)
    }
}

/// One suspension directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pause {
    /// Which mechanism requested the pause.
    pub reason: PauseReason,
    /// How long to suspend.
    pub duration: Duration,
}

/// Pacing controller for one run of a known corpus size.
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacerConfig,
    total_cases: usize,
    executed: usize,
    consecutive_rate_limited: u32,
}

impl Pacer {
    /// Create a controller for `total_cases` cases.
    #[must_use]
    pub fn new(config: PacerConfig, total_cases: usize) -> Self {
        Self {
            config,
            total_cases,
            executed: 0,
            consecutive_rate_limited: 0,
        }
    }

    /// Number of batches the corpus splits into (last possibly smaller).
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.total_cases.div_ceil(self.config.batch_size)
    }

    /// Cases executed so far.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Current consecutive rate-limit counter (for observability).
    #[must_use]
    pub fn consecutive_rate_limited(&self) -> u32 {
        self.consecutive_rate_limited
    }

    /// Account for one completed case and return the pauses to take, in
    /// order, before the next case.
    pub fn after_case(
        &mut self,
        failure: Option<FailureKind>,
        rng: &mut XorShift64,
    ) -> Vec<Pause> {
        self.executed += 1;

        if self.executed >= self.total_cases {
            // Nothing left to pace; a cooldown would only delay a case that
            // does not exist.
            return Vec::new();
        }

        let mut pauses = Vec::new();

        if failure == Some(FailureKind::RateLimited) {
            self.consecutive_rate_limited += 1;
            if self.consecutive_rate_limited >= self.config.cooldown_threshold {
                pauses.push(Pause {
                    reason: PauseReason::Cooldown,
                    duration: self.config.cooldown,
                });
                self.consecutive_rate_limited = 0;
            }
        } else {
            self.consecutive_rate_limited = 0;
        }

        pauses.push(Pause {
            reason: PauseReason::InterCase,
            duration: self.config.base_delay + self.jitter(rng),
        });

        if self.executed % self.config.batch_size == 0 {
            pauses.push(Pause {
                reason: PauseReason::BatchPause,
                duration: self.config.batch_pause,
            });
            // Batch state is ephemeral: the counter does not carry across
            // batch boundaries.
            self.consecutive_rate_limited = 0;
        }

        pauses
    }

    fn jitter(&self, rng: &mut XorShift64) -> Duration {
        let bound_ms = self.config.jitter_bound.as_millis() as u64;
        Duration::from_millis(rng.next_below(bound_ms + 1))
    }
}
