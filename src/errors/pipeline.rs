// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the prefetching pipeline and its collaborators.
//!
//! A stop request is not an error. It travels as a control-flow signal
//! ([`QueueClosed`], [`TransferOutcome::Cancelled`](crate::traits::TransferOutcome)).

use std::path::PathBuf;
use thiserror::Error;

/// Returned by a blocking pop on a queue that has been closed for teardown.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("handoff queue closed")]
pub struct QueueClosed;

/// Failure of a data source while filling a batch.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The source could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be parsed.
    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The source holds no records at all.
    #[error("data source {0} contains no records")]
    EmptySource(PathBuf),

    /// A record does not have the width the layer was configured for.
    #[error("record has {actual} values, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Any other failure reported by a custom loader.
    #[error("{0}")]
    Other(String),
}

/// Failure of the secondary device transfer step.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The device context could not be created.
    #[error("device context unavailable: {0}")]
    ContextUnavailable(String),

    /// The transfer started but the device reported a fault.
    #[error("device transfer of batch {batch_id} failed: {reason}")]
    TransferFailed { batch_id: usize, reason: String },

    /// The device dropped the completion signal without reporting.
    #[error("device stream lost while transferring batch {0}")]
    StreamLost(usize),
}

/// Errors surfaced to the consumer side of a [`Prefetcher`](crate::engine::Prefetcher).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A prefetch depth of zero leaves nothing to cycle.
    #[error("prefetch depth must be at least 1")]
    InvalidDepth,

    /// `start` was called twice.
    #[error("pipeline '{0}' is already running")]
    AlreadyStarted(String),

    /// The pipeline has been stopped and cannot be used again.
    #[error("pipeline '{0}' has been stopped")]
    Stopped(String),

    /// `next` was called before `start`.
    #[error("pipeline '{0}' has not been started")]
    NotStarted(String),

    /// The worker thread could not be spawned.
    #[error("failed to spawn prefetch worker for '{pipeline}': {reason}")]
    Spawn { pipeline: String, reason: String },

    /// The device rejected a batch during pre-allocation.
    #[error("device setup failed for pipeline '{pipeline}': {reason}")]
    DeviceSetup { pipeline: String, reason: String },

    /// The worker hit a fatal data-source or device failure.
    #[error("prefetch worker for '{pipeline}' failed: {reason}")]
    WorkerFailed { pipeline: String, reason: String },

    /// The worker thread died without reporting.
    #[error("prefetch worker for '{0}' panicked")]
    WorkerPanicked(String),
}

impl PipelineError {
    /// True for failures of the producer side (data source, device or panic).
    pub fn is_worker_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::WorkerFailed { .. } | PipelineError::WorkerPanicked(_)
        )
    }
}
