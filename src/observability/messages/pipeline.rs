// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the prefetch worker lifecycle and batch handoff.
//!
//! Cancellation is reported at `debug!` only. A stop request is the expected way for a
//! worker to end and must not show up as an error.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A prefetch worker was spawned.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_stagehand::observability::messages::pipeline::PipelineStarted;
///
/// let msg = PipelineStarted {
///     pipeline: "train_data",
///     prefetch_depth: 4,
///     output_labels: true,
///     device: "host",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineStarted<'a> {
    pub pipeline: &'a str,
    pub prefetch_depth: usize,
    pub output_labels: bool,
    pub device: &'a str,
}

impl Display for PipelineStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Prefetch initialized for '{}': depth={}, labels={}, device={}",
            self.pipeline, self.prefetch_depth, self.output_labels, self.device
        )
    }
}

impl StructuredLog for PipelineStarted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            prefetch_depth = self.prefetch_depth,
            output_labels = self.output_labels,
            device = self.device,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "prefetch_worker",
            span_name = name,
            pipeline = self.pipeline,
            prefetch_depth = self.prefetch_depth,
            device = self.device,
        )
    }
}

/// A blocking pop found its queue empty and is about to wait.
///
/// # Log Level
/// `debug!` - Expected whenever the consumer outpaces the producer
pub struct WaitingOnQueue<'a> {
    pub queue: &'a str,
    pub reason: &'a str,
}

impl Display for WaitingOnQueue<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} ({} queue empty)", self.reason, self.queue)
    }
}

impl StructuredLog for WaitingOnQueue<'_> {
    fn log(&self) {
        tracing::debug!(queue = self.queue, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("queue_wait", span_name = name, queue = self.queue)
    }
}

/// A filled batch was published to the full queue.
///
/// # Log Level
/// `trace!` - Once per batch
pub struct BatchReady<'a> {
    pub pipeline: &'a str,
    pub batch_id: usize,
    pub sequence: u64,
}

impl Display for BatchReady<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch slot {} ready in '{}' (sequence {})",
            self.batch_id, self.pipeline, self.sequence
        )
    }
}

impl StructuredLog for BatchReady<'_> {
    fn log(&self) {
        tracing::trace!(
            pipeline = self.pipeline,
            batch_id = self.batch_id,
            sequence = self.sequence,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "batch_ready",
            span_name = name,
            pipeline = self.pipeline,
            batch_id = self.batch_id,
        )
    }
}

/// The device acknowledged a batch copy.
///
/// # Log Level
/// `trace!` - Once per batch when a secondary device is configured
pub struct DeviceTransferCompleted<'a> {
    pub device: &'a str,
    pub batch_id: usize,
    pub duration: Duration,
}

impl Display for DeviceTransferCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch slot {} committed to {} in {:?}",
            self.batch_id, self.device, self.duration
        )
    }
}

impl StructuredLog for DeviceTransferCompleted<'_> {
    fn log(&self) {
        tracing::trace!(
            device = self.device,
            batch_id = self.batch_id,
            duration_us = self.duration.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "device_transfer",
            span_name = name,
            device = self.device,
            batch_id = self.batch_id,
        )
    }
}

/// The worker observed a stop request and exited.
///
/// # Log Level
/// `debug!` - Expected on every shutdown
pub struct WorkerCancelled<'a> {
    pub pipeline: &'a str,
    pub batches_filled: u64,
}

impl Display for WorkerCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Prefetch worker for '{}' stopped after {} batches",
            self.pipeline, self.batches_filled
        )
    }
}

impl StructuredLog for WorkerCancelled<'_> {
    fn log(&self) {
        tracing::debug!(
            pipeline = self.pipeline,
            batches_filled = self.batches_filled,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("worker_cancelled", span_name = name, pipeline = self.pipeline)
    }
}

/// The worker hit a fatal data-source or device failure.
///
/// # Log Level
/// `error!` - The pipeline is dead
pub struct WorkerFailed<'a> {
    pub pipeline: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for WorkerFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Prefetch worker for '{}' failed: {}",
            self.pipeline, self.error
        )
    }
}

impl StructuredLog for WorkerFailed<'_> {
    fn log(&self) {
        tracing::error!(
            pipeline = self.pipeline,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("worker_failed", span_name = name, pipeline = self.pipeline)
    }
}

/// The consumer asked the worker to stop.
///
/// # Log Level
/// `debug!` - Part of normal teardown
pub struct StopRequested<'a> {
    pub pipeline: &'a str,
}

impl Display for StopRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stopping prefetch worker for '{}'", self.pipeline)
    }
}

impl StructuredLog for StopRequested<'_> {
    fn log(&self) {
        tracing::debug!(pipeline = self.pipeline, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("stop_requested", span_name = name, pipeline = self.pipeline)
    }
}

/// The worker thread has been joined.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PipelineStopped<'a> {
    pub pipeline: &'a str,
    pub batches_consumed: u64,
}

impl Display for PipelineStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Prefetch pipeline '{}' stopped; {} batches consumed",
            self.pipeline, self.batches_consumed
        )
    }
}

impl StructuredLog for PipelineStopped<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            batches_consumed = self.batches_consumed,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("pipeline_stopped", span_name = name, pipeline = self.pipeline)
    }
}
