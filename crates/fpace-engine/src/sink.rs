//! Result aggregation and durable persistence.
//!
//! Every run record is appended to `runs_<stamp>_<tag>.jsonl` — one
//! self-contained JSON object per line — and flushed plus fsynced before
//! the engine proceeds to pacing. An interrupted run therefore leaves a
//! valid, truncated-but-readable stream with no corrupted trailing entry.
//!
//! The summary is computed from an in-memory [`RunTally`] maintained
//! alongside persistence, never re-read from disk, and written once to
//! `summary_<stamp>_<tag>.json` at finalization.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use fpace_error::{PaceError, Result};
use fpace_types::{
    FailureKind, KindBreakdown, RECORD_SCHEMA_VERSION, RunRecord, RunSummary, Verdict,
};

use crate::clock::unix_time_ms;

/// Incremental aggregation state, fed one record at a time.
///
/// An explicit value rather than ambient state, so the summary logic is
/// testable without touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct RunTally {
    total: u64,
    pass: u64,
    borderline: u64,
    fail: u64,
    by_kind: std::collections::BTreeMap<fpace_types::ContentKind, KindBreakdown>,
    trs_sum: f64,
    trs_count: u64,
    duration_sum_ms: u64,
    rate_limit_hits: u64,
}

impl RunTally {
    /// Fold one persisted record into the tally.
    pub fn observe(&mut self, record: &RunRecord) {
        self.total += 1;
        self.duration_sum_ms += record.duration_ms;

        let entry = self.by_kind.entry(record.kind).or_default();
        entry.count += 1;

        // Summary-level failure notion: a missing or unrecognized verdict
        // counts as fail, while the record's `ok` stays untouched.
        let verdict = record
            .report
            .scoring
            .as_ref()
            .and_then(|s| s.verdict)
            .unwrap_or(Verdict::Fail);
        match verdict {
            Verdict::Pass => {
                self.pass += 1;
                entry.pass += 1;
            }
            Verdict::Borderline => {
                self.borderline += 1;
                entry.borderline += 1;
            }
            Verdict::Fail => {
                self.fail += 1;
                entry.fail += 1;
            }
        }

        if let Some(trs) = record.report.scoring.as_ref().and_then(|s| s.trs) {
            self.trs_sum += trs;
            self.trs_count += 1;
        }

        if FailureKind::classify(&record.report) == Some(FailureKind::RateLimited) {
            self.rate_limit_hits += 1;
        }
    }

    /// Records observed so far.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Build the summary. Deterministic for a given record set and
    /// creation time: same inputs, byte-identical serialization.
    #[must_use]
    pub fn summarize(&self, created_at_unix_ms: u64) -> RunSummary {
        let avg_trs = if self.trs_count == 0 {
            0.0
        } else {
            // Two decimals, matching the record stream's human-scannable
            // precision.
            (self.trs_sum / self.trs_count as f64 * 100.0).round() / 100.0
        };
        let avg_duration_ms = if self.total == 0 {
            0
        } else {
            self.duration_sum_ms / self.total
        };

        RunSummary {
            schema_version: RECORD_SCHEMA_VERSION,
            created_at_unix_ms,
            total_runs: self.total,
            pass: self.pass,
            borderline: self.borderline,
            fail: self.fail,
            by_kind: self.by_kind.clone(),
            avg_trs,
            avg_duration_ms,
            rate_limit_hits: self.rate_limit_hits,
        }
    }
}

/// Append-only record stream plus one-shot summary artifact.
pub struct RecordSink {
    file: File,
    records_path: PathBuf,
    summary_path: PathBuf,
    tally: RunTally,
    created_at_unix_ms: u64,
}

impl RecordSink {
    /// Open a fresh record stream under `dir`, named with an epoch-millis
    /// stamp and the operator tag.
    pub fn create(dir: &Path, tag: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let stamp = unix_time_ms();
        let records_path = dir.join(format!("runs_{stamp}_{tag}.jsonl"));
        let summary_path = dir.join(format!("summary_{stamp}_{tag}.json"));

        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&records_path)
            .map_err(|source| PaceError::Persist {
                path: records_path.clone(),
                source,
            })?;

        info!(path = %records_path.display(), "record stream opened");
        Ok(Self {
            file,
            records_path,
            summary_path,
            tally: RunTally::default(),
            created_at_unix_ms: stamp,
        })
    }

    /// Path of the record stream.
    #[must_use]
    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    /// Path the summary will be written to.
    #[must_use]
    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    /// Records persisted so far.
    #[must_use]
    pub fn persisted(&self) -> u64 {
        self.tally.total()
    }

    /// Append one record and make it durable before returning. Any failure
    /// here is fatal to the run.
    pub fn record(&mut self, record: &RunRecord) -> Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|err| PaceError::serialize(format!("run record encode: {err}")))?;

        self.append_durably(&line)
            .map_err(|source| PaceError::Persist {
                path: self.records_path.clone(),
                source,
            })?;

        self.tally.observe(record);
        Ok(())
    }

    fn append_durably(&mut self, line: &str) -> std::io::Result<()> {
        writeln!(self.file, "{line}")?;
        self.file.flush()?;
        self.file.sync_data()
    }

    /// Compute the summary from the in-memory tally and write it once.
    pub fn finalize(self) -> Result<(RunSummary, PathBuf)> {
        let summary = self.tally.summarize(self.created_at_unix_ms);
        let bytes = serde_json::to_vec_pretty(&summary)
            .map_err(|err| PaceError::serialize(format!("summary encode: {err}")))?;
        fs::write(&self.summary_path, bytes).map_err(|source| PaceError::Persist {
            path: self.summary_path.clone(),
            source,
        })?;
        info!(
            path = %self.summary_path.display(),
            total_runs = summary.total_runs,
            "summary written"
        );
        Ok((summary, self.summary_path))
    }
}
