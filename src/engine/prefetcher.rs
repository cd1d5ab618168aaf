// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Double-buffered prefetch pipeline.
//!
//! A [`Prefetcher`] owns a fixed pool of batch slots and two handoff queues. A
//! background worker thread takes free slots, fills them through a
//! [`BatchLoader`], optionally commits them to a secondary device, and publishes them to
//! the full queue. The consumer pulls one ready slot per [`next`](Prefetcher::next) call
//! and hands the previous one back to the worker.
//!
//! ```text
//!            +---------- free ----------+
//!            v                          |
//!   worker: pop -> load -> commit -> push full
//!                                       |
//!   consumer: return current to free <- pop full ("waiting for data")
//! ```
//!
//! Slots are never created or destroyed after construction. Every move of a slot updates
//! one ledger inside the critical section of the queue it enters or leaves, so the free,
//! full, filling and current counts add up to the prefetch depth in every snapshot.
//!
//! # Examples
//!
//! ```rust
//! use the_stagehand::engine::{Batch, PrefetchConfig, Prefetcher};
//! use the_stagehand::traits::loader_fn;
//!
//! let mut counter = 0.0_f32;
//! let loader = loader_fn(move |batch: &mut Batch<f32>| {
//!     batch.payload.reshape(&[1]);
//!     batch.payload.data_mut()[0] = counter;
//!     counter += 1.0;
//!     Ok(())
//! });
//!
//! let config = PrefetchConfig { prefetch_depth: 2, ..PrefetchConfig::default() };
//! let mut pipeline = Prefetcher::new("doc", config).unwrap();
//! pipeline.start(loader, 0).unwrap();
//!
//! for expected in 0..3 {
//!     let staged = pipeline.next().unwrap();
//!     assert_eq!(staged.payload.data(), &[expected as f32]);
//! }
//! pipeline.stop().unwrap();
//! ```

use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{DeviceMode, DEFAULT_PREFETCH_DEPTH};
use crate::engine::device::DeviceFactory;
use crate::engine::handoff_queue::HandoffQueue;
use crate::engine::{Batch, Blob};
use crate::errors::PipelineError;
use crate::observability::messages::pipeline::{
    BatchReady, PipelineStarted, PipelineStopped, StopRequested, WorkerCancelled, WorkerFailed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{BatchLoader, DeviceTransfer, Element, TransferOutcome};

/// Pipeline parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchConfig {
    /// Number of batch slots cycling through the pipeline.
    pub prefetch_depth: usize,
    /// Whether every slot carries a label blob.
    pub output_labels: bool,
    pub device: DeviceMode,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            prefetch_depth: DEFAULT_PREFETCH_DEPTH,
            output_labels: false,
            device: DeviceMode::Host,
        }
    }
}

/// Worker lifecycle. `Stopped` is terminal; a stopped pipeline cannot be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    StopRequested,
    Stopped,
}

/// Where the batch slots are at the moment of observation. Always totals the depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferAccounting {
    pub free: usize,
    pub full: usize,
    pub filling: usize,
    pub current: usize,
}

impl BufferAccounting {
    pub fn total(&self) -> usize {
        self.free + self.full + self.filling + self.current
    }
}

/// The ready batch exposed to the consumer.
///
/// Borrows the pipeline, so it cannot be held across the next call to
/// [`Prefetcher::next`], which recycles the slot.
#[derive(Debug, Clone, Copy)]
pub struct StagedBatch<'a, T: Element> {
    pub payload: &'a Blob<T>,
    pub label: Option<&'a Blob<T>>,
    /// Fill order stamped by the worker, starting at zero.
    pub sequence: u64,
    pub slot: usize,
}

impl<'a, T: Element> StagedBatch<'a, T> {
    fn from_batch(batch: &'a Batch<T>) -> Self {
        Self {
            payload: &batch.payload,
            label: batch.label.as_ref(),
            sequence: batch.sequence,
            slot: batch.id,
        }
    }
}

/// State shared between the consumer and the worker thread.
struct Shared<T: Element> {
    name: String,
    free: HandoffQueue<Box<Batch<T>>>,
    full: HandoffQueue<Box<Batch<T>>>,
    /// Lock order: a queue's lock, then this one.
    slots: Mutex<BufferAccounting>,
    failure: Mutex<Option<PipelineError>>,
    cancel: CancellationToken,
}

impl<T: Element> Shared<T> {
    fn tally(&self, update: impl FnOnce(&mut BufferAccounting)) {
        update(&mut *self.slots.lock());
    }

    /// Hand a slot back to the free queue; `leave` takes it off the count it was on.
    fn release(&self, batch: Box<Batch<T>>, leave: impl FnOnce(&mut BufferAccounting)) {
        self.free.push_then(batch, || {
            self.tally(|slots| {
                leave(slots);
                slots.free += 1;
            })
        });
    }

    fn record_failure(&self, error: PipelineError) {
        let mut failure = self.failure.lock();
        if failure.is_none() {
            *failure = Some(error);
        }
        drop(failure);
        self.full.close();
    }

    fn failure(&self) -> Option<PipelineError> {
        self.failure.lock().clone()
    }
}

/// Background producer of staged batches.
pub struct Prefetcher<T: Element> {
    shared: Arc<Shared<T>>,
    config: PrefetchConfig,
    device: Arc<dyn DeviceTransfer<T>>,
    current: Option<Box<Batch<T>>>,
    worker: Option<JoinHandle<()>>,
    state: PipelineState,
    consumed: u64,
}

impl<T: Element> Prefetcher<T> {
    /// Build an idle pipeline with the device named by `config.device`.
    pub fn new(name: &str, config: PrefetchConfig) -> Result<Self, PipelineError> {
        let device = DeviceFactory::from_mode::<T>(config.device).map_err(|e| {
            PipelineError::DeviceSetup {
                pipeline: name.to_string(),
                reason: e.to_string(),
            }
        })?;
        Self::with_device(name, config, device)
    }

    /// Build an idle pipeline around a caller-supplied device transfer step.
    ///
    /// All slots are allocated and prepared on the device here, on the calling thread.
    pub fn with_device(
        name: &str,
        config: PrefetchConfig,
        device: Arc<dyn DeviceTransfer<T>>,
    ) -> Result<Self, PipelineError> {
        if config.prefetch_depth == 0 {
            return Err(PipelineError::InvalidDepth);
        }

        let shared = Arc::new(Shared {
            name: name.to_string(),
            free: HandoffQueue::new("free"),
            full: HandoffQueue::new("full"),
            slots: Mutex::new(BufferAccounting {
                free: 0,
                full: 0,
                filling: 0,
                current: 0,
            }),
            failure: Mutex::new(None),
            cancel: CancellationToken::new(),
        });

        for id in 0..config.prefetch_depth {
            let batch = Box::new(Batch::new(id, config.output_labels));
            device
                .prepare(&batch)
                .map_err(|e| PipelineError::DeviceSetup {
                    pipeline: name.to_string(),
                    reason: e.to_string(),
                })?;
            shared
                .free
                .push_then(batch, || shared.tally(|slots| slots.free += 1));
        }

        Ok(Self {
            shared,
            config,
            device,
            current: None,
            worker: None,
            state: PipelineState::Idle,
            consumed: 0,
        })
    }

    /// Seed the loader and spawn the worker thread.
    pub fn start<L: BatchLoader<T>>(&mut self, mut loader: L, seed: u64) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Idle => {}
            PipelineState::Running | PipelineState::StopRequested => {
                return Err(PipelineError::AlreadyStarted(self.shared.name.clone()))
            }
            PipelineState::Stopped => return Err(PipelineError::Stopped(self.shared.name.clone())),
        }

        loader.init_random_state(seed);

        let message = PipelineStarted {
            pipeline: &self.shared.name,
            prefetch_depth: self.config.prefetch_depth,
            output_labels: self.config.output_labels,
            device: self.device.name(),
        };
        message.log();
        let span = message.span("prefetch_worker");

        let shared = Arc::clone(&self.shared);
        let device = Arc::clone(&self.device);
        let handle = std::thread::Builder::new()
            .name(format!("prefetch-{}", self.shared.name))
            .spawn(move || {
                let _entered = span.enter();
                run_worker(&shared, device.as_ref(), loader);
            })
            .map_err(|e| PipelineError::Spawn {
                pipeline: self.shared.name.clone(),
                reason: e.to_string(),
            })?;

        self.worker = Some(handle);
        self.state = PipelineState::Running;
        Ok(())
    }

    /// Recycle the previous batch and block until the next one is ready.
    ///
    /// A worker failure is reported on the first call after it happens, even if filled
    /// batches are still queued.
    pub fn next(&mut self) -> Result<StagedBatch<'_, T>, PipelineError> {
        match self.state {
            PipelineState::Running => {}
            PipelineState::Idle => return Err(PipelineError::NotStarted(self.shared.name.clone())),
            PipelineState::StopRequested | PipelineState::Stopped => {
                return Err(PipelineError::Stopped(self.shared.name.clone()))
            }
        }

        if let Some(error) = self.shared.failure() {
            return Err(error);
        }

        if let Some(previous) = self.current.take() {
            self.shared.release(previous, |slots| slots.current -= 1);
        }

        let shared = &self.shared;
        let batch = shared
            .full
            .pop_then(Some("waiting for data"), || {
                shared.tally(|slots| {
                    slots.full -= 1;
                    slots.current += 1;
                })
            })
            .map_err(|_| {
                self.shared
                    .failure()
                    .unwrap_or_else(|| PipelineError::Stopped(self.shared.name.clone()))
            })?;

        self.consumed += 1;
        let batch = self.current.insert(batch);
        Ok(StagedBatch::from_batch(batch))
    }

    /// The batch returned by the last [`next`](Self::next), if any.
    pub fn current(&self) -> Option<StagedBatch<'_, T>> {
        self.current.as_deref().map(StagedBatch::from_batch)
    }

    /// Cancel the worker, wake every blocked queue wait and join the thread.
    ///
    /// Idempotent. Also run when the pipeline is dropped.
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        if self.state == PipelineState::Stopped {
            return Ok(());
        }

        let was_running = self.state == PipelineState::Running;
        self.state = PipelineState::StopRequested;
        if was_running {
            StopRequested {
                pipeline: &self.shared.name,
            }
            .log();
        }

        self.shared.cancel.cancel();
        self.shared.free.close();
        self.shared.full.close();

        let joined = match self.worker.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        };
        self.state = PipelineState::Stopped;

        if was_running {
            PipelineStopped {
                pipeline: &self.shared.name,
                batches_consumed: self.consumed,
            }
            .log();
        }

        joined.map_err(|_| PipelineError::WorkerPanicked(self.shared.name.clone()))
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &PrefetchConfig {
        &self.config
    }

    /// The failure that killed the worker, if any.
    pub fn last_error(&self) -> Option<PipelineError> {
        self.shared.failure()
    }

    pub fn batches_consumed(&self) -> u64 {
        self.consumed
    }

    /// Consistent snapshot of slot locations, taken under one lock.
    pub fn accounting(&self) -> BufferAccounting {
        *self.shared.slots.lock()
    }
}

impl<T: Element> Drop for Prefetcher<T> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(pipeline = %self.shared.name, error = %err, "prefetch worker ended abnormally");
        }
    }
}

enum FillOutcome {
    Ready,
    Cancelled,
    Failed(PipelineError),
}

fn run_worker<T: Element, L: BatchLoader<T>>(shared: &Shared<T>, device: &dyn DeviceTransfer<T>, mut loader: L) {
    let mut sequence = 0_u64;

    while !shared.cancel.is_cancelled() {
        let popped = shared.free.pop_then(None, || {
            shared.tally(|slots| {
                slots.free -= 1;
                slots.filling += 1;
            })
        });
        let Ok(mut batch) = popped else {
            break;
        };

        match fill_batch(shared, device, &mut loader, &mut batch, sequence) {
            FillOutcome::Ready => {
                BatchReady {
                    pipeline: &shared.name,
                    batch_id: batch.id,
                    sequence,
                }
                .log();
                shared.full.push_then(batch, || {
                    shared.tally(|slots| {
                        slots.filling -= 1;
                        slots.full += 1;
                    })
                });
                sequence += 1;
            }
            FillOutcome::Cancelled => {
                shared.release(batch, |slots| slots.filling -= 1);
                break;
            }
            FillOutcome::Failed(error) => {
                shared.release(batch, |slots| slots.filling -= 1);
                shared.record_failure(error);
                return;
            }
        }
    }

    WorkerCancelled {
        pipeline: &shared.name,
        batches_filled: sequence,
    }
    .log();
}

fn fill_batch<T: Element, L: BatchLoader<T>>(
    shared: &Shared<T>,
    device: &dyn DeviceTransfer<T>,
    loader: &mut L,
    batch: &mut Batch<T>,
    sequence: u64,
) -> FillOutcome {
    let loaded = panic::catch_unwind(AssertUnwindSafe(|| loader.load_batch(batch)));
    match loaded {
        Ok(Ok(())) => {}
        Ok(Err(error)) => return fail(shared, &error),
        Err(_) => {
            let error = PipelineError::WorkerPanicked(shared.name.clone());
            WorkerFailed {
                pipeline: &shared.name,
                error: &error,
            }
            .log();
            return FillOutcome::Failed(error);
        }
    }
    batch.sequence = sequence;

    match device.commit(batch, &shared.cancel) {
        Ok(TransferOutcome::Committed) => FillOutcome::Ready,
        Ok(TransferOutcome::Cancelled) => FillOutcome::Cancelled,
        Err(error) => fail(shared, &error),
    }
}

fn fail(shared: &Shared<impl Element>, error: &dyn std::error::Error) -> FillOutcome {
    WorkerFailed {
        pipeline: &shared.name,
        error,
    }
    .log();
    FillOutcome::Failed(PipelineError::WorkerFailed {
        pipeline: shared.name.clone(),
        reason: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HostOnly;
    use crate::traits::loader_fn;

    fn counting_loader() -> impl BatchLoader<f32> {
        let mut next = 0.0_f32;
        loader_fn(move |batch: &mut Batch<f32>| {
            batch.payload.reshape(&[1]);
            batch.payload.data_mut()[0] = next;
            next += 1.0;
            Ok(())
        })
    }

    fn depth(prefetch_depth: usize) -> PrefetchConfig {
        PrefetchConfig {
            prefetch_depth,
            ..PrefetchConfig::default()
        }
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let result = Prefetcher::<f32>::new("zero", depth(0));
        assert!(matches!(result, Err(PipelineError::InvalidDepth)));
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut pipeline = Prefetcher::<f32>::new("lifecycle", depth(2)).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert!(matches!(pipeline.next(), Err(PipelineError::NotStarted(_))));

        pipeline.start(counting_loader(), 0).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);
        assert!(matches!(
            pipeline.start(counting_loader(), 0),
            Err(PipelineError::AlreadyStarted(_))
        ));

        pipeline.stop().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert!(matches!(pipeline.next(), Err(PipelineError::Stopped(_))));
        assert!(matches!(
            pipeline.start(counting_loader(), 0),
            Err(PipelineError::Stopped(_))
        ));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut pipeline = Prefetcher::<f32>::new("idempotent", depth(1)).unwrap();
        pipeline.start(counting_loader(), 0).unwrap();
        pipeline.stop().unwrap();
        pipeline.stop().unwrap();
    }

    #[test]
    fn test_stop_before_start() {
        let mut pipeline = Prefetcher::<f32>::new("never_started", depth(3)).unwrap();
        pipeline.stop().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert_eq!(pipeline.accounting().total(), 3);
    }

    #[test]
    fn test_labels_follow_config() {
        let config = PrefetchConfig {
            prefetch_depth: 2,
            output_labels: true,
            device: DeviceMode::Host,
        };
        let mut pipeline = Prefetcher::with_device("labels", config, Arc::new(HostOnly)).unwrap();
        pipeline
            .start(
                loader_fn(|batch: &mut Batch<f32>| {
                    batch.payload.reshape(&[2]);
                    if let Some(label) = batch.label.as_mut() {
                        label.reshape(&[1]);
                        label.data_mut()[0] = 7.0;
                    }
                    Ok(())
                }),
                0,
            )
            .unwrap();

        let staged = pipeline.next().unwrap();
        assert_eq!(staged.payload.count(), 2);
        assert_eq!(staged.label.map(|l| l.data().to_vec()), Some(vec![7.0]));
    }

    #[test]
    fn test_current_tracks_last_batch() {
        let mut pipeline = Prefetcher::<f32>::new("current", depth(2)).unwrap();
        assert!(pipeline.current().is_none());
        pipeline.start(counting_loader(), 0).unwrap();

        let sequence = pipeline.next().unwrap().sequence;
        assert_eq!(pipeline.current().map(|b| b.sequence), Some(sequence));
        assert_eq!(pipeline.batches_consumed(), 1);
    }
}
