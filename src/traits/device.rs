// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio_util::sync::CancellationToken;

use crate::engine::Batch;
use crate::errors::DeviceError;
use crate::traits::Element;

/// How a device commit ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The device holds a consistent copy of the batch.
    Committed,
    /// A stop request arrived while waiting on the device.
    Cancelled,
}

/// Copies a filled batch to a secondary execution device.
///
/// `commit` is a barrier: it returns only once the device acknowledges a consistent
/// copy, or once `cancel` fires. The pipeline does not publish a batch as ready until
/// its commit has returned [`TransferOutcome::Committed`].
pub trait DeviceTransfer<T: Element>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Reserve device storage for a batch slot. Called on the consumer thread for every
    /// slot before the worker starts, so the worker never allocates on the device
    /// concurrently with the consumer.
    fn prepare(&self, _batch: &Batch<T>) -> Result<(), DeviceError> {
        Ok(())
    }

    fn commit(&self, batch: &Batch<T>, cancel: &CancellationToken) -> Result<TransferOutcome, DeviceError>;
}
