// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::DeviceMode;
use crate::engine::Batch;
use crate::errors::DeviceError;
use crate::observability::messages::pipeline::DeviceTransferCompleted;
use crate::observability::messages::StructuredLog;
use crate::traits::{DeviceTransfer, Element, TransferOutcome};

/// Factory for device transfer steps from configuration
pub struct DeviceFactory;

impl DeviceFactory {
    /// Create the transfer step for a device mode
    pub fn from_mode<T: Element>(mode: DeviceMode) -> Result<Arc<dyn DeviceTransfer<T>>, DeviceError> {
        match mode {
            DeviceMode::Host => Ok(Arc::new(HostOnly)),
            DeviceMode::Mirrored => Ok(Arc::new(MirroredDevice::<T>::new()?)),
        }
    }
}

/// Host execution only; the host buffer is the one the consumer reads.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostOnly;

impl<T: Element> DeviceTransfer<T> for HostOnly {
    fn name(&self) -> &'static str {
        "host"
    }

    fn commit(&self, _batch: &Batch<T>, _cancel: &CancellationToken) -> Result<TransferOutcome, DeviceError> {
        Ok(TransferOutcome::Committed)
    }
}

/// Secondary device backed by its own async runtime.
///
/// Each commit snapshots the payload, copies it on the device runtime and signals
/// completion over a oneshot channel. The worker blocks on that signal, or on the
/// pipeline's cancellation token, whichever comes first. The latest mirrored payload
/// per batch slot is kept so callers can inspect what the device holds.
pub struct MirroredDevice<T: Element> {
    runtime: Runtime,
    mirrors: Arc<Mutex<HashMap<usize, Vec<T>>>>,
}

impl<T: Element> MirroredDevice<T> {
    pub fn new() -> Result<Self, DeviceError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("stagehand-device")
            .enable_all()
            .build()
            .map_err(|e| DeviceError::ContextUnavailable(e.to_string()))?;

        Ok(Self {
            runtime,
            mirrors: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Payload the device holds for a batch slot, if it has received one.
    pub fn mirror(&self, batch_id: usize) -> Option<Vec<T>> {
        self.mirrors.lock().get(&batch_id).cloned()
    }

    /// Number of batch slots with device storage.
    pub fn slot_count(&self) -> usize {
        self.mirrors.lock().len()
    }
}

impl<T: Element> DeviceTransfer<T> for MirroredDevice<T> {
    fn name(&self) -> &'static str {
        "mirrored"
    }

    fn prepare(&self, batch: &Batch<T>) -> Result<(), DeviceError> {
        self.mirrors.lock().entry(batch.id).or_default();
        Ok(())
    }

    fn commit(&self, batch: &Batch<T>, cancel: &CancellationToken) -> Result<TransferOutcome, DeviceError> {
        let batch_id = batch.id;
        let snapshot = batch.payload.data().to_vec();
        let mirrors = Arc::clone(&self.mirrors);
        let (done_tx, done_rx) = oneshot::channel();
        let started = Instant::now();

        self.runtime.spawn(async move {
            let mut mirrors = mirrors.lock();
            let Some(slot) = mirrors.get_mut(&batch_id) else {
                let _ = done_tx.send(Err(DeviceError::TransferFailed {
                    batch_id,
                    reason: "no device storage prepared for this slot".to_string(),
                }));
                return;
            };
            slot.clear();
            slot.extend_from_slice(&snapshot);
            drop(mirrors);
            let _ = done_tx.send(Ok(()));
        });

        let outcome = self.runtime.block_on(async {
            tokio::select! {
                done = done_rx => match done {
                    Ok(Ok(())) => Ok(TransferOutcome::Committed),
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(DeviceError::StreamLost(batch_id)),
                },
                _ = cancel.cancelled() => Ok(TransferOutcome::Cancelled),
            }
        })?;

        if outcome == TransferOutcome::Committed {
            DeviceTransferCompleted {
                device: "mirrored",
                batch_id,
                duration: started.elapsed(),
            }
            .log();
        }
        Ok(outcome)
    }
}
