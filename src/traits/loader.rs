// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::Batch;
use crate::errors::LoadError;
use crate::traits::Element;

/// Fills staging batches on the prefetch worker thread.
///
/// A loader is moved onto the worker when the pipeline starts and is only ever called
/// from that thread. `load_batch` owns the batch exclusively for the duration of the
/// call and must leave `payload` (and `label`, when present) shaped to the batch it
/// produced. It may block on I/O.
pub trait BatchLoader<T: Element>: Send + 'static {
    /// Seed any randomness the fill step uses. Called once, on the consumer thread,
    /// before the worker starts. The same seed must produce the same batch sequence.
    fn init_random_state(&mut self, _seed: u64) {}

    fn load_batch(&mut self, batch: &mut Batch<T>) -> Result<(), LoadError>;
}

/// Adapts a closure into a [`BatchLoader`].
pub struct FnLoader<F>(pub F);

impl<T, F> BatchLoader<T> for FnLoader<F>
where
    T: Element,
    F: FnMut(&mut Batch<T>) -> Result<(), LoadError> + Send + 'static,
{
    fn load_batch(&mut self, batch: &mut Batch<T>) -> Result<(), LoadError> {
        (self.0)(batch)
    }
}

/// Build a loader from a closure.
///
/// ```
/// use the_stagehand::engine::Batch;
/// use the_stagehand::traits::{loader_fn, BatchLoader};
///
/// let mut next = 0.0_f32;
/// let mut loader = loader_fn(move |batch: &mut Batch<f32>| {
///     batch.payload.reshape(&[1]);
///     batch.payload.data_mut()[0] = next;
///     next += 1.0;
///     Ok(())
/// });
///
/// let mut batch = Batch::new(0, false);
/// loader.load_batch(&mut batch).unwrap();
/// loader.load_batch(&mut batch).unwrap();
/// assert_eq!(batch.payload.data(), &[1.0]);
/// ```
pub fn loader_fn<T, F>(f: F) -> FnLoader<F>
where
    T: Element,
    F: FnMut(&mut Batch<T>) -> Result<(), LoadError> + Send + 'static,
{
    FnLoader(f)
}
