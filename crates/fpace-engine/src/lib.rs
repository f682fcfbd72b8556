//! Paced test-case execution engine with rate-limit backpressure.
//!
//! frankenpace drives an external content-generation pipeline through a
//! shuffled corpus of test cases, one invocation at a time over a single
//! long-lived session, and leaves behind a durable JSONL record stream plus
//! a one-shot summary artifact.
//!
//! # Architecture
//!
//! ```text
//!  corpus::build_corpus ──(shuffled cases)──▶ engine::RunEngine
//!    engine loop, per case:
//!      invoke::InvocationClient::call ──▶ fpace_types::RunRecord
//!      sink::RecordSink::record        (append + flush + fsync)
//!      pacing::Pacer::after_case ──▶ [Pause] ──▶ clock::Sleeper
//!  sink::RecordSink::finalize ──▶ fpace_types::RunSummary
//! ```
//!
//! Scheduling is deliberately sequential: the target rate-limits per
//! caller, so the correct strategy is tunable pacing, not concurrency.
//! Randomness ([`rng::XorShift64`]) and time ([`clock::Sleeper`]) are
//! injectable, so tests drive the whole engine deterministically.

pub mod clock;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod invoke;
pub mod pacing;
pub mod rng;
pub mod sink;

pub use clock::{RecordingSleeper, Sleeper, StopToken, ThreadSleeper};
pub use config::{LOG_TAIL_LINES, PacerConfig, RunConfig};
pub use corpus::{Catalog, build_corpus, normalize_kinds};
pub use engine::{RunEngine, RunOutcome};
pub use invoke::{
    CaseOutcome, InvocationClient, PipelineProcess, Session, SessionFault, SessionReply,
};
pub use pacing::{Pacer, Pause, PauseReason};
pub use rng::XorShift64;
pub use sink::{RecordSink, RunTally};
