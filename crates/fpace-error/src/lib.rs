//! Error taxonomy for frankenpace.
//!
//! Only run-fatal conditions are error variants: a corpus that expands to
//! zero cases, a configuration that cannot describe a valid run, a session
//! that cannot be opened, or a record that cannot be durably persisted.
//! Case-level failures (the target returning `ok = false` for any reason,
//! including rate limiting) are *data* — they live in the run record and
//! never propagate as a `PaceError`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for frankenpace operations.
#[derive(Error, Debug)]
pub enum PaceError {
    /// The corpus expanded to zero test cases; a run with no cases is
    /// invalid.
    #[error("corpus is empty: no cases matched the requested content kinds")]
    EmptyCorpus,

    /// A configuration value rules out a valid run.
    #[error("invalid configuration: {detail}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        detail: String,
    },

    /// The long-lived pipeline session could not be established. Fatal
    /// before any case executes.
    #[error("failed to open pipeline session: {detail}")]
    SessionSetup {
        /// Underlying setup failure description.
        detail: String,
    },

    /// A run record (or the summary artifact) could not be written durably.
    /// Fatal: continuing would silently violate the durable-progress
    /// guarantee.
    #[error("failed to persist to '{path}': {source}")]
    Persist {
        /// The record stream or summary path that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A record or summary could not be serialized.
    #[error("serialization failure: {detail}")]
    Serialize {
        /// Underlying encoder failure description.
        detail: String,
    },

    /// General I/O error outside the persistence path.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PaceError {
    /// Construct an [`PaceError::InvalidConfig`].
    #[must_use]
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }

    /// Construct a [`PaceError::SessionSetup`].
    #[must_use]
    pub fn session_setup(detail: impl Into<String>) -> Self {
        Self::SessionSetup {
            detail: detail.into(),
        }
    }

    /// Construct a [`PaceError::Serialize`].
    #[must_use]
    pub fn serialize(detail: impl Into<String>) -> Self {
        Self::Serialize {
            detail: detail.into(),
        }
    }

    /// Whether this error occurred before any case executed.
    #[must_use]
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::EmptyCorpus | Self::InvalidConfig { .. } | Self::SessionSetup { .. }
        )
    }
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PaceError>;
