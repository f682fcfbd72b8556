//! The sequential run engine.
//!
//! ```text
//!  RunEngine::new(config, session, sleeper, stop)
//!    ├── validate config, seed RNG
//!    ├── normalize kinds → expand catalog → shuffle (corpus)
//!    └── open record sink (fatal if the stream cannot be created)
//!  RunEngine::run()
//!    └── for each case:
//!          stop? → break
//!          client.call(case) → record → sink.record (durable)
//!          pacer.after_case → for each pause: stop? → break; sleep
//!  finalize → RunSummary + artifact paths
//! ```
//!
//! Single logical worker, fully sequential: the target is rate-limited per
//! caller, so concurrency would only increase throttling. The stop token is
//! honored at every suspension boundary; already-persisted records are
//! never rolled back, and an interrupted run still gets a summary covering
//! the persisted prefix.

use std::path::PathBuf;

use tracing::{info, warn};

use fpace_error::Result;
use fpace_types::{RunRecord, RunSummary, TestCase};

use crate::clock::{Sleeper, StopToken, unix_time_ms};
use crate::config::RunConfig;
use crate::corpus::{Catalog, build_corpus, normalize_kinds};
use crate::invoke::{InvocationClient, Session};
use crate::pacing::Pacer;
use crate::rng::{XorShift64, seed_from_entropy};
use crate::sink::RecordSink;

/// Everything a finished (or interrupted) run leaves behind.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The aggregate summary, covering exactly the persisted records.
    pub summary: RunSummary,
    /// Path of the JSONL record stream.
    pub records_path: PathBuf,
    /// Path of the summary artifact.
    pub summary_path: PathBuf,
    /// Whether the run stopped early on an external stop request.
    pub interrupted: bool,
}

/// Drives one run: corpus → invocation client → sink → pacer.
pub struct RunEngine<S: Session, Z: Sleeper> {
    client: InvocationClient<S>,
    pacer: Pacer,
    sink: RecordSink,
    rng: XorShift64,
    sleeper: Z,
    stop: StopToken,
    corpus: Vec<TestCase>,
}

impl<S: Session, Z: Sleeper> RunEngine<S, Z> {
    /// Set up a run against the built-in catalog.
    pub fn new(config: &RunConfig, session: S, sleeper: Z, stop: StopToken) -> Result<Self> {
        Self::with_catalog(config, &Catalog::builtin(), session, sleeper, stop)
    }

    /// Set up a run against a caller-supplied catalog.
    pub fn with_catalog(
        config: &RunConfig,
        catalog: &Catalog,
        session: S,
        sleeper: Z,
        stop: StopToken,
    ) -> Result<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(seed_from_entropy);
        let mut rng = XorShift64::new(seed);

        let kinds = normalize_kinds(&config.include);
        let corpus = build_corpus(catalog, &kinds, config.replicates, &mut rng)?;
        let sink = RecordSink::create(&config.out_dir, &config.tag)?;
        let pacer = Pacer::new(config.pacer.clone(), corpus.len());

        info!(
            total = corpus.len(),
            batches = pacer.batch_count(),
            replicates = config.replicates,
            seed,
            "run prepared"
        );

        Ok(Self {
            client: InvocationClient::new(session),
            pacer,
            sink,
            rng,
            sleeper,
            stop,
            corpus,
        })
    }

    /// Number of cases this run will execute.
    #[must_use]
    pub fn corpus_len(&self) -> usize {
        self.corpus.len()
    }

    /// Execute the run to completion (or to the first honored stop).
    pub fn run(self) -> Result<RunOutcome> {
        let Self {
            mut client,
            mut pacer,
            mut sink,
            mut rng,
            mut sleeper,
            stop,
            corpus,
        } = self;

        let total = corpus.len();
        let mut interrupted = false;

        'cases: for (index, case) in corpus.iter().enumerate() {
            if stop.is_stopped() {
                interrupted = true;
                break;
            }

            let outcome = client.call(case);
            let record = RunRecord {
                id: rng.hex_id(),
                created_at_unix_ms: unix_time_ms(),
                kind: case.kind,
                params: case.params.clone(),
                duration_ms: outcome.duration_ms,
                ok: outcome.report.ok,
                report: outcome.report,
                log_tail: outcome.log_tail,
            };
            sink.record(&record)?;

            info!(
                run = index + 1,
                total,
                kind = %case.kind,
                ok = record.ok,
                duration_ms = record.duration_ms,
                "case complete"
            );
            if let Some(kind) = outcome.failure {
                info!(
                    failure = %kind,
                    consecutive_rate_limited = pacer.consecutive_rate_limited(),
                    "case failed"
                );
            }

            for pause in pacer.after_case(outcome.failure, &mut rng) {
                if stop.is_stopped() {
                    interrupted = true;
                    break 'cases;
                }
                info!(
                    reason = %pause.reason,
                    ms = pause.duration.as_millis() as u64,
                    "pacing pause"
                );
                sleeper.pause(pause.duration);
            }
        }

        if interrupted {
            warn!(
                persisted = sink.persisted(),
                total, "stop requested; run interrupted"
            );
        }

        let records_path = sink.records_path().to_path_buf();
        let (summary, summary_path) = sink.finalize()?;
        Ok(RunOutcome {
            summary,
            records_path,
            summary_path,
            interrupted,
        })
    }
}
