//! Run configuration surface.
//!
//! Defaults mirror the tuning that survived production use against the
//! rate-limited target: 1.5 s base delay with 400 ms jitter, batches of 12
//! with 90 s pauses, and a 90 s cooldown after 2 consecutive rate-limit
//! hits.

use std::path::PathBuf;
use std::time::Duration;

use fpace_error::{PaceError, Result};

/// How many trailing session log lines are kept per record.
pub const LOG_TAIL_LINES: usize = 10;

/// Pacing and backpressure knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacerConfig {
    /// Fixed delay between consecutive cases.
    pub base_delay: Duration,
    /// Upper bound of the uniform random extra delay per case.
    pub jitter_bound: Duration,
    /// Cases per batch; the last batch may be smaller.
    pub batch_size: usize,
    /// Pause between batches (not after the final batch).
    pub batch_pause: Duration,
    /// Consecutive rate-limit hits that trigger a cooldown.
    pub cooldown_threshold: u32,
    /// Cooldown duration once triggered.
    pub cooldown: Duration,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1500),
            jitter_bound: Duration::from_millis(400),
            batch_size: 12,
            batch_pause: Duration::from_secs(90),
            cooldown_threshold: 2,
            cooldown: Duration::from_secs(90),
        }
    }
}

impl PacerConfig {
    /// Validate the pacing knobs.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PaceError::invalid_config("batch_size must be >= 1"));
        }
        if self.cooldown_threshold == 0 {
            return Err(PaceError::invalid_config(
                "cooldown_threshold must be >= 1",
            ));
        }
        Ok(())
    }
}

/// Full configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Requested content kind tokens, as supplied by the operator.
    /// Normalized by the corpus builder.
    pub include: Vec<String>,
    /// Replication factor: each catalog entry appears this many times.
    pub replicates: u32,
    /// Pacing knobs.
    pub pacer: PacerConfig,
    /// Directory receiving the record stream and summary.
    pub out_dir: PathBuf,
    /// Tag embedded in output file names.
    pub tag: String,
    /// Fixed RNG seed; wall-clock entropy when absent.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            include: vec![
                "microcopy".to_owned(),
                "internal_comms".to_owned(),
                "press_release".to_owned(),
            ],
            replicates: 1,
            pacer: PacerConfig::default(),
            out_dir: PathBuf::from("runs_local"),
            tag: "local".to_owned(),
            seed: None,
        }
    }
}

impl RunConfig {
    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<()> {
        if self.replicates == 0 {
            return Err(PaceError::invalid_config("replicates must be >= 1"));
        }
        if self.include.iter().all(|token| token.trim().is_empty()) {
            return Err(PaceError::invalid_config(
                "include must name at least one content kind",
            ));
        }
        if self.tag.is_empty() {
            return Err(PaceError::invalid_config("tag must be non-empty"));
        }
        self.pacer.validate()
    }
}
