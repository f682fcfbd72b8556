//! Invocation client over the single long-lived pipeline session.
//!
//! The [`Session`] trait is the invocation boundary: one call in, one
//! structured reply (report plus recent diagnostic log lines) out. The
//! [`InvocationClient`] wraps exactly one session per run, measures
//! wall-clock duration, bounds the retained log tail, and absorbs
//! transport-level faults into failed reports so a single bad case never
//! aborts the run.
//!
//! [`PipelineProcess`] is the production session: a worker subprocess
//! spawned once per run and spoken to over a line-oriented JSON protocol
//! (one request object per line on stdin, one reply object per line on
//! stdout). Spawn failure is fatal setup; per-call failures are data.

use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, warn};

use fpace_error::{PaceError, Result};
use fpace_types::{FailureKind, Report, TestCase};

use crate::config::LOG_TAIL_LINES;

/// Structured reply from one session invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionReply {
    /// The pipeline's report for this case.
    pub report: Report,
    /// Recent diagnostic log lines, oldest first.
    #[serde(default)]
    pub log_lines: Vec<String>,
}

/// Transport-level fault raised by a session implementation.
///
/// Faults are absorbed by the client; they never propagate past it.
#[derive(Debug, Clone)]
pub struct SessionFault {
    /// Human-readable failure description; feeds the report error text.
    pub detail: String,
}

impl SessionFault {
    /// Build a fault from any displayable detail.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SessionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

/// One long-lived connection to the target pipeline.
pub trait Session {
    /// Execute one case. Blocks until the target replies or the target's
    /// own timeout fires; this engine does not renegotiate timeouts per
    /// case.
    fn invoke(&mut self, case: &TestCase) -> std::result::Result<SessionReply, SessionFault>;
}

/// Outcome of one client call, ready to become a run record.
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    /// The (possibly synthesized) report.
    pub report: Report,
    /// Bounded trailing log lines, most-recent-last.
    pub log_tail: Vec<String>,
    /// Wall-clock duration of the invocation in milliseconds.
    pub duration_ms: u64,
    /// Typed failure classification; `None` for successful reports.
    pub failure: Option<FailureKind>,
}

/// Wraps exactly one session for the duration of a run.
pub struct InvocationClient<S: Session> {
    session: S,
    log_tail_lines: usize,
}

impl<S: Session> InvocationClient<S> {
    /// Wrap a session with the default log-tail bound.
    pub fn new(session: S) -> Self {
        Self {
            session,
            log_tail_lines: LOG_TAIL_LINES,
        }
    }

    /// Override the log-tail bound.
    #[must_use]
    pub fn with_log_tail(mut self, lines: usize) -> Self {
        self.log_tail_lines = lines;
        self
    }

    /// Execute one case, absorbing any transport fault into a failed
    /// report.
    pub fn call(&mut self, case: &TestCase) -> CaseOutcome {
        let started = Instant::now();
        let (report, log_lines) = match self.session.invoke(case) {
            Ok(reply) => (reply.report, reply.log_lines),
            Err(fault) => {
                warn!(kind = %case.kind, detail = %fault, "session fault absorbed");
                (Report::failure(fault.detail), Vec::new())
            }
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let skip = log_lines.len().saturating_sub(self.log_tail_lines);
        let log_tail = log_lines.into_iter().skip(skip).collect();

        let failure = FailureKind::classify(&report);
        CaseOutcome {
            report,
            log_tail,
            duration_ms,
            failure,
        }
    }
}

/// Worker subprocess speaking line-oriented JSON.
#[derive(Debug)]
pub struct PipelineProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl PipelineProcess {
    /// Spawn the worker once for the run. Connection setup cost is paid
    /// here, not per case.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|err| {
                PaceError::session_setup(format!("failed to spawn '{program}': {err}"))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            PaceError::session_setup(format!("worker '{program}' has no stdin pipe"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            PaceError::session_setup(format!("worker '{program}' has no stdout pipe"))
        })?;

        debug!(program, "pipeline worker spawned");
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }
}

impl Session for PipelineProcess {
    fn invoke(&mut self, case: &TestCase) -> std::result::Result<SessionReply, SessionFault> {
        let request = serde_json::to_string(case)
            .map_err(|err| SessionFault::new(format!("request encode failure: {err}")))?;
        writeln!(self.stdin, "{request}")
            .and_then(|()| self.stdin.flush())
            .map_err(|err| SessionFault::new(format!("worker write failure: {err}")))?;

        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .map_err(|err| SessionFault::new(format!("worker read failure: {err}")))?;
        if read == 0 {
            return Err(SessionFault::new("worker closed its stdout"));
        }

        serde_json::from_str(&line)
            .map_err(|err| SessionFault::new(format!("malformed worker reply: {err}")))
    }
}

impl Drop for PipelineProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
