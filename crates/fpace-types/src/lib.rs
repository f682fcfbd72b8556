//! Shared data model for frankenpace runs.
//!
//! Everything in this crate is plain data: content kinds, test cases, the
//! structured report returned by the target pipeline, the per-case run
//! record appended to the record stream, and the end-of-run summary.
//! All types serialize with `serde`; maps use `BTreeMap` so serialized
//! output has a deterministic key order.
//!
//! The one piece of logic here is [`FailureKind::classify`]: the fixed
//! substring heuristics over error text live at this boundary, and the rest
//! of the engine consumes only the typed classification.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema version for the record stream and summary artifacts.
pub const RECORD_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Content kinds
// ---------------------------------------------------------------------------

/// The kind of content a test case asks the target pipeline to generate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Short UI copy: buttons, error strings, tooltips.
    Microcopy,
    /// Internal announcements: Slack posts and emails.
    InternalComms,
    /// External communications: press releases and customer notes.
    PressRelease,
}

impl ContentKind {
    /// All kinds, in catalog order.
    pub const ALL: [Self; 3] = [Self::Microcopy, Self::InternalComms, Self::PressRelease];

    /// Normalize a user-supplied kind token via the synonym table.
    ///
    /// Returns `None` for tokens that match no known kind; the corpus
    /// builder decides the fallback.
    #[must_use]
    pub fn normalize(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "microcopy" | "micro" | "ui" => Some(Self::Microcopy),
            "internal" | "internal_comms" | "internal-communications" => {
                Some(Self::InternalComms)
            }
            "pr" | "press" | "press_release" | "external" | "pr_external" => {
                Some(Self::PressRelease)
            }
            _ => None,
        }
    }

    /// Stable snake_case name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Microcopy => "microcopy",
            Self::InternalComms => "internal_comms",
            Self::PressRelease => "press_release",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Test cases
// ---------------------------------------------------------------------------

/// One parameterized unit of work submitted to the target pipeline.
///
/// Immutable once built; parameter names vary per kind (microcopy carries
/// `uiContext`/`surface`/`intent`, internal comms `channel`/`title`/
/// `key_update`, press releases `audience`/`headline`/`key_message`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Content kind this case exercises.
    pub kind: ContentKind,
    /// Kind-specific generation parameters.
    pub params: BTreeMap<String, String>,
}

impl TestCase {
    /// Build a case from a slice of parameter pairs.
    #[must_use]
    pub fn new(kind: ContentKind, params: &[(&str, &str)]) -> Self {
        Self {
            kind,
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports and scoring
// ---------------------------------------------------------------------------

/// Coarse quality classification derived from a case's TRS score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Met the pass threshold.
    Pass,
    /// Between the border and pass thresholds.
    Borderline,
    /// Below the border threshold.
    Fail,
}

impl Verdict {
    /// Stable lowercase name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Borderline => "borderline",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One component of the scoring breakdown (e.g. `rules`, `lexicon`,
/// `critic`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakdownScore {
    /// Points awarded by this component.
    pub score: f64,
}

/// Scoring section of a report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scoring {
    /// Total relevance/style score, when the scorer produced a number.
    #[serde(default)]
    pub trs: Option<f64>,
    /// Derived verdict, when recognized.
    #[serde(default)]
    pub verdict: Option<Verdict>,
    /// Per-component score breakdown.
    #[serde(default)]
    pub breakdown: BTreeMap<String, BreakdownScore>,
}

/// Structured outcome of one pipeline invocation, as returned by the
/// target. Owned by the [`RunRecord`] that references it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Report {
    /// Whether the pipeline considered the invocation successful.
    pub ok: bool,
    /// Error description when `ok` is false.
    #[serde(default)]
    pub error: Option<String>,
    /// Generated text, when the pipeline produced one.
    #[serde(default)]
    pub result: Option<String>,
    /// Quality scoring, when the pipeline scored the output.
    #[serde(default)]
    pub scoring: Option<Scoring>,
    /// Internal retry attempts performed by the target itself. Pass-through
    /// diagnostic; this engine never retries.
    #[serde(default)]
    pub attempts: Option<u32>,
}

impl Report {
    /// A failed report carrying only an error description. Used when a
    /// transport-level fault is absorbed into data.
    #[must_use]
    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(detail.into()),
            ..Self::default()
        }
    }

    /// A successful report with generated text and scoring.
    #[must_use]
    pub fn success(result: impl Into<String>, scoring: Scoring) -> Self {
        Self {
            ok: true,
            result: Some(result.into()),
            scoring: Some(scoring),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

/// Typed classification of a failed report.
///
/// Computed once from the report's lower-cased error text; the pacing
/// controller's cooldown logic depends on this tag, never on raw strings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The target reported throttling (429 / "rate limit" / "too many
    /// requests").
    RateLimited,
    /// The call timed out inside the target.
    Timeout,
    /// Connection, network, or navigation failure.
    Transport,
    /// Failed for a reason the classifier does not recognize.
    Unknown,
}

impl FailureKind {
    /// Classify a report. Returns `None` for successful reports.
    #[must_use]
    pub fn classify(report: &Report) -> Option<Self> {
        if report.ok {
            return None;
        }
        let text = report
            .error
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if text.contains("429")
            || text.contains("rate limit")
            || text.contains("too many requests")
        {
            Some(Self::RateLimited)
        } else if text.contains("timeout") || text.contains("timed out") {
            Some(Self::Timeout)
        } else if text.contains("connection")
            || text.contains("network")
            || text.contains("navigation")
        {
            Some(Self::Transport)
        } else {
            Some(Self::Unknown)
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Run records
// ---------------------------------------------------------------------------

/// One executed case, as appended to the record stream.
///
/// Created exactly once per executed case and immutable after creation.
/// Stream order equals execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Opaque token, unique within a run.
    pub id: String,
    /// Wall-clock creation time, milliseconds since the Unix epoch.
    pub created_at_unix_ms: u64,
    /// Content kind of the executed case.
    pub kind: ContentKind,
    /// The case's generation parameters.
    pub params: BTreeMap<String, String>,
    /// Wall-clock duration of the single invocation, inclusive of any
    /// retries the target performed internally.
    pub duration_ms: u64,
    /// Mirror of `report.ok` for line-level scanning.
    pub ok: bool,
    /// The full structured report.
    pub report: Report,
    /// Last few diagnostic log lines from the session, most-recent-last.
    pub log_tail: Vec<String>,
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Verdict counts for one content kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindBreakdown {
    /// Cases executed for this kind.
    pub count: u64,
    /// Verdict `pass` count.
    pub pass: u64,
    /// Verdict `borderline` count.
    pub borderline: u64,
    /// Verdict `fail` count (including records with no recognized verdict).
    pub fail: u64,
}

/// Aggregate over all run records, written once at run completion.
///
/// Note the two distinct failure notions: `fail` counts verdict-level
/// failures (a record lacking a recognized verdict counts as `fail` here),
/// while each record's `ok` field keeps the transport-level truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Summary schema version.
    pub schema_version: u32,
    /// Wall-clock creation time of the run, milliseconds since the Unix
    /// epoch.
    pub created_at_unix_ms: u64,
    /// Total records persisted.
    pub total_runs: u64,
    /// Verdict `pass` count.
    pub pass: u64,
    /// Verdict `borderline` count.
    pub borderline: u64,
    /// Verdict `fail` count (missing verdicts included).
    pub fail: u64,
    /// Per-kind verdict breakdown.
    pub by_kind: BTreeMap<ContentKind, KindBreakdown>,
    /// Mean TRS over records with a numeric score, rounded to 2 decimals.
    /// Zero when no record carried a score.
    pub avg_trs: f64,
    /// Integer mean duration over all records.
    pub avg_duration_ms: u64,
    /// Count of rate-limit classifications observed.
    pub rate_limit_hits: u64,
}
