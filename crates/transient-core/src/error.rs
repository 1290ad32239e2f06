// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Transient.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all Transient operations.
#[derive(Debug, Error)]
pub enum TransientError {
    // -- Document errors --
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("no valid pages in any requested range")]
    NoValidPages,

    #[error("page order contains no page inside the document")]
    InvalidPageOrder,

    #[error("no documents supplied")]
    NoDocuments,

    // -- Object store errors --
    #[error("object store unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("retention sweep finished with {failed} failed deletion(s) out of {attempted} examined")]
    PartialSweepFailure { failed: usize, attempted: usize },

    // -- Request handling --
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("background task failed: {0}")]
    Task(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification callers use to tell "nothing to do" apart from
/// "bad input" and "upstream failure".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input could not be understood (unparsable bytes, bad config).
    BadInput,
    /// The input was understood but selected nothing.
    NothingToDo,
    /// The external store or a background task failed.
    Upstream,
    /// Some, but not all, of a batch failed.
    Partial,
    /// The operation ran out of time.
    Timeout,
}

impl TransientError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedDocument(_) => "malformed_document",
            Self::NoValidPages => "no_valid_pages",
            Self::InvalidPageOrder => "invalid_page_order",
            Self::NoDocuments => "no_documents",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::ObjectNotFound(_) => "object_not_found",
            Self::IntegrityMismatch { .. } => "integrity_mismatch",
            Self::PartialSweepFailure { .. } => "partial_sweep_failure",
            Self::Timeout(_) => "timeout",
            Self::Task(_) => "task_failed",
            Self::Config(_) => "invalid_config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedDocument(_) | Self::Config(_) | Self::Serialization(_) => {
                ErrorKind::BadInput
            }
            Self::NoValidPages | Self::InvalidPageOrder | Self::NoDocuments => {
                ErrorKind::NothingToDo
            }
            Self::UpstreamUnavailable(_)
            | Self::ObjectNotFound(_)
            | Self::IntegrityMismatch { .. }
            | Self::Task(_)
            | Self::Io(_) => ErrorKind::Upstream,
            Self::PartialSweepFailure { .. } => ErrorKind::Partial,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TransientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_is_distinct_from_bad_input() {
        assert_eq!(TransientError::NoValidPages.kind(), ErrorKind::NothingToDo);
        assert_eq!(TransientError::InvalidPageOrder.kind(), ErrorKind::NothingToDo);
        assert_eq!(
            TransientError::MalformedDocument("trailer missing".into()).kind(),
            ErrorKind::BadInput
        );
        assert_eq!(
            TransientError::UpstreamUnavailable("503".into()).kind(),
            ErrorKind::Upstream
        );
    }

    #[test]
    fn partial_failure_message_carries_counts() {
        let err = TransientError::PartialSweepFailure {
            failed: 1,
            attempted: 4,
        };
        assert_eq!(err.code(), "partial_sweep_failure");
        assert!(err.to_string().contains("1 failed deletion(s) out of 4"));
    }

    #[test]
    fn integrity_mismatch_names_both_digests() {
        let err = TransientError::IntegrityMismatch {
            expected: "abc".into(),
            actual: "def".into(),
        };
        assert_eq!(err.code(), "integrity_mismatch");
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.to_string(), "integrity check failed: expected abc, got def");
    }
}
