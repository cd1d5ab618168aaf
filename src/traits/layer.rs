// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::Blob;
use crate::errors::LayerError;
use crate::traits::Element;

/// A computational layer as seen by the runtime.
///
/// The runtime never looks inside a layer's math. It only needs to set a layer up once
/// the number of outputs ("tops") is known, and to run a forward step that returns
/// references to the layer's outputs. Outputs are borrowed from the layer for as long
/// as the caller holds them, so a data layer can hand out its staged batch without a
/// copy and cannot recycle it while it is still being read.
pub trait Layer<T: Element>: Send {
    /// Instance name from the configuration.
    fn name(&self) -> &str;

    /// Registered type name (`"Input"`, `"SyntheticData"`, ...).
    fn type_name(&self) -> &'static str;

    /// Number of inputs the layer requires, if fixed.
    fn exact_num_bottom_blobs(&self) -> Option<usize> {
        None
    }

    fn min_top_blobs(&self) -> usize {
        1
    }

    fn max_top_blobs(&self) -> usize {
        usize::MAX
    }

    /// One-time setup once the net knows how many tops the layer feeds.
    fn setup(&mut self, top_count: usize) -> Result<(), LayerError>;

    /// Run one step and return references to the produced tops.
    fn forward<'a>(&'a mut self, bottom: &[&Blob<T>]) -> Result<Vec<&'a Blob<T>>, LayerError>;

    /// Tops the caller may write into directly, for layers that only hold assigned data.
    fn assignable_tops(&mut self) -> Option<&mut [Blob<T>]> {
        None
    }

    /// Release threads and other resources. Called once, before the layer is dropped.
    fn teardown(&mut self) -> Result<(), LayerError> {
        Ok(())
    }
}

/// Box a concrete layer as a trait object; used by the registration macros.
pub fn boxed_layer<T: Element, L: Layer<T> + 'static>(layer: L) -> Box<dyn Layer<T>> {
    Box::new(layer)
}

/// Check a top count against the bounds a layer declares.
pub fn check_top_count<T: Element>(layer: &dyn Layer<T>, top_count: usize) -> Result<(), LayerError> {
    let (min, max) = (layer.min_top_blobs(), layer.max_top_blobs());
    if top_count < min || top_count > max {
        return Err(LayerError::TopCount {
            layer: layer.name().to_string(),
            min,
            max,
            actual: top_count,
        });
    }
    Ok(())
}

/// Check a bottom count against the exact count a layer declares, if any.
pub fn check_bottom_count<T: Element>(layer: &dyn Layer<T>, bottom_count: usize) -> Result<(), LayerError> {
    match layer.exact_num_bottom_blobs() {
        Some(expected) if expected != bottom_count => Err(LayerError::BottomCount {
            layer: layer.name().to_string(),
            expected,
            actual: bottom_count,
        }),
        _ => Ok(()),
    }
}
