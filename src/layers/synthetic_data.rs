// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::marker::PhantomData;

use crate::config::DataParam;
use crate::engine::Batch;
use crate::errors::{LayerError, LoadError};
use crate::layers::{DataSource, PrefetchingDataLayer};
use crate::traits::{BatchLoader, Element};

/// Data layer producing seeded random batches; registered as `SyntheticData`.
pub type SyntheticDataLayer<T> = PrefetchingDataLayer<T, SyntheticSource<T>>;

/// Uniform `[0, 1)` payload of shape `[batch_size, channels]` and, when labels are
/// enabled, one class index in `[0, classes)` per row.
pub struct SyntheticSource<T: Element> {
    batch_size: usize,
    channels: usize,
    classes: usize,
    rng: StdRng,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> DataSource<T> for SyntheticSource<T> {
    const TYPE_NAME: &'static str = "SyntheticData";

    fn from_config(layer: &str, data: &DataParam, output_labels: bool) -> Result<Self, LayerError> {
        if output_labels && data.classes == 0 {
            return Err(LayerError::InvalidParam {
                layer: layer.to_string(),
                reason: "labels need at least one class".to_string(),
            });
        }

        Ok(Self {
            batch_size: data.batch_size,
            channels: data.channels,
            classes: data.classes,
            rng: StdRng::seed_from_u64(0),
            _element: PhantomData,
        })
    }
}

impl<T: Element> BatchLoader<T> for SyntheticSource<T> {
    fn init_random_state(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn load_batch(&mut self, batch: &mut Batch<T>) -> Result<(), LoadError> {
        batch.payload.reshape(&[self.batch_size, self.channels]);
        for value in batch.payload.data_mut() {
            *value = T::from_f64(self.rng.random::<f64>());
        }

        if let Some(label) = batch.label.as_mut() {
            label.reshape(&[self.batch_size]);
            for value in label.data_mut() {
                *value = T::from_f64(self.rng.random_range(0..self.classes) as f64);
            }
        }
        Ok(())
    }
}
