// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::DEFAULT_SEED;
use crate::config::{DataParam, LayerConfig};
use crate::engine::{Blob, PrefetchConfig, Prefetcher};
use crate::errors::{LayerError, PipelineError};
use crate::traits::{BatchLoader, Element, Layer};

/// A batch loader that can be built from a layer's `data` block.
pub trait DataSource<T: Element>: BatchLoader<T> + Sized {
    /// Registered type name of the layer wrapping this source.
    const TYPE_NAME: &'static str;

    /// Build the source on the consumer thread during layer setup.
    fn from_config(layer: &str, data: &DataParam, output_labels: bool) -> Result<Self, LayerError>;
}

/// Data layer that serves batches from a background prefetch pipeline.
///
/// Setup decides whether labels are produced from the number of tops (one top: data
/// only; two: data and label), builds the source, seeds it and starts the worker.
/// Each forward call hands out the next ready batch by reference.
pub struct PrefetchingDataLayer<T: Element, S: DataSource<T>> {
    name: String,
    data: DataParam,
    prefetcher: Option<Prefetcher<T>>,
    _source: std::marker::PhantomData<fn() -> S>,
}

impl<T: Element, S: DataSource<T>> PrefetchingDataLayer<T, S> {
    pub fn new(config: &LayerConfig) -> Result<Self, LayerError> {
        let data = config.data.clone().ok_or_else(|| LayerError::MissingParam {
            layer: config.name.clone(),
            block: "data",
        })?;
        if data.batch_size == 0 {
            return Err(LayerError::InvalidParam {
                layer: config.name.clone(),
                reason: "batch_size must be at least 1".to_string(),
            });
        }

        Ok(Self {
            name: config.name.clone(),
            data,
            prefetcher: None,
            _source: std::marker::PhantomData,
        })
    }

    /// The pipeline behind the layer, once set up.
    pub fn prefetcher(&self) -> Option<&Prefetcher<T>> {
        self.prefetcher.as_ref()
    }
}

impl<T: Element, S: DataSource<T>> Layer<T> for PrefetchingDataLayer<T, S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        S::TYPE_NAME
    }

    fn exact_num_bottom_blobs(&self) -> Option<usize> {
        Some(0)
    }

    fn max_top_blobs(&self) -> usize {
        2
    }

    fn setup(&mut self, top_count: usize) -> Result<(), LayerError> {
        if self.prefetcher.is_some() {
            return Err(PipelineError::AlreadyStarted(self.name.clone()).into());
        }

        let output_labels = top_count > 1;
        let source = S::from_config(&self.name, &self.data, output_labels)?;
        let config = PrefetchConfig {
            prefetch_depth: self.data.prefetch,
            output_labels,
            device: self.data.device.unwrap_or_default(),
        };

        let mut prefetcher = Prefetcher::new(&self.name, config)?;
        prefetcher.start(source, self.data.seed.unwrap_or(DEFAULT_SEED))?;
        self.prefetcher = Some(prefetcher);
        Ok(())
    }

    fn forward<'a>(&'a mut self, _bottom: &[&Blob<T>]) -> Result<Vec<&'a Blob<T>>, LayerError> {
        let prefetcher = self
            .prefetcher
            .as_mut()
            .ok_or_else(|| LayerError::NotSetUp(self.name.clone()))?;

        let staged = prefetcher.next()?;
        let mut tops = vec![staged.payload];
        tops.extend(staged.label);
        Ok(tops)
    }

    fn teardown(&mut self) -> Result<(), LayerError> {
        if let Some(prefetcher) = self.prefetcher.as_mut() {
            prefetcher.stop()?;
        }
        Ok(())
    }
}
