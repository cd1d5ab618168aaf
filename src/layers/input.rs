// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::LayerConfig;
use crate::engine::Blob;
use crate::errors::LayerError;
use crate::traits::{Element, Layer};

/// Holds blobs that the caller assigns directly.
///
/// Forward does no work; it returns references to the held blobs. Shapes come from the
/// `input` block: one shape shared by every top, or one shape per top.
pub struct InputLayer<T: Element> {
    name: String,
    shapes: Vec<Vec<usize>>,
    tops: Vec<Blob<T>>,
}

impl<T: Element> InputLayer<T> {
    pub fn new(config: &LayerConfig) -> Result<Self, LayerError> {
        let input = config.input.as_ref().ok_or_else(|| LayerError::MissingParam {
            layer: config.name.clone(),
            block: "input",
        })?;
        if input.shape.is_empty() {
            return Err(LayerError::InvalidParam {
                layer: config.name.clone(),
                reason: "input block declares no shapes".to_string(),
            });
        }

        Ok(Self {
            name: config.name.clone(),
            shapes: input.shape.clone(),
            tops: Vec::new(),
        })
    }
}

impl<T: Element> Layer<T> for InputLayer<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        "Input"
    }

    fn exact_num_bottom_blobs(&self) -> Option<usize> {
        Some(0)
    }

    fn setup(&mut self, top_count: usize) -> Result<(), LayerError> {
        let shapes = self.shapes.len();
        if shapes != 1 && shapes != top_count {
            return Err(LayerError::InvalidParam {
                layer: self.name.clone(),
                reason: format!("{shapes} shapes for {top_count} tops"),
            });
        }

        self.tops = (0..top_count)
            .map(|i| Blob::new(&self.shapes[if shapes == 1 { 0 } else { i }]))
            .collect();
        Ok(())
    }

    fn forward<'a>(&'a mut self, _bottom: &[&Blob<T>]) -> Result<Vec<&'a Blob<T>>, LayerError> {
        Ok(self.tops.iter().collect())
    }

    fn assignable_tops(&mut self) -> Option<&mut [Blob<T>]> {
        Some(self.tops.as_mut_slice())
    }
}
