// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::config::{LayerConfig, NetConfig};
use crate::engine::Blob;
use crate::errors::NetError;
use crate::observability::messages::net::{LayerSetUp, NetInitialized};
use crate::observability::messages::StructuredLog;
use crate::registry::LayerRegistry;
use crate::traits::{check_bottom_count, check_top_count, Element, Layer};

/// An ordered chain of layers built from configuration.
///
/// Layers are instantiated through the layer registry in declaration order and set up
/// once their top counts are known. A forward pass hands each layer references to the
/// tops its bottoms name, so no blob is copied between layers.
pub struct Net<T: Element> {
    name: String,
    layers: Vec<Box<dyn Layer<T>>>,
    names: Vec<String>,
    /// For each layer, the (producer layer, top index) of every bottom.
    bottoms: Vec<Vec<(usize, usize)>>,
    tops: Vec<Vec<String>>,
    torn_down: bool,
}

impl<T: Element> Net<T> {
    /// Assemble a net with the process-wide registry for `T`.
    pub fn from_config(config: &NetConfig) -> Result<Self, NetError> {
        Self::with_registry(&config.name, &config.resolved_layers(), T::layer_registry())
    }

    /// Assemble a net from layer configs using an explicit registry.
    pub fn with_registry(
        name: &str,
        layer_configs: &[LayerConfig],
        registry: &LayerRegistry<T>,
    ) -> Result<Self, NetError> {
        if layer_configs.is_empty() {
            return Err(NetError::Empty(name.to_string()));
        }

        let bottoms = resolve_bottoms(layer_configs)?;
        let mut net = Self {
            name: name.to_string(),
            layers: Vec::with_capacity(layer_configs.len()),
            names: Vec::with_capacity(layer_configs.len()),
            bottoms,
            tops: layer_configs.iter().map(|c| c.top.clone()).collect(),
            torn_down: false,
        };

        for (config, bottoms) in layer_configs.iter().zip(&net.bottoms) {
            let mut layer = registry.create(config)?;
            let top_count = config.top.len();
            let setup = check_bottom_count(layer.as_ref(), bottoms.len())
                .and_then(|()| check_top_count(layer.as_ref(), top_count))
                .and_then(|()| layer.setup(top_count));
            let type_name = layer.type_name();

            // Kept even when setup fails so dropping the net tears it down.
            net.layers.push(layer);
            net.names.push(config.name.clone());
            setup.map_err(|source| NetError::Setup {
                layer: config.name.clone(),
                source,
            })?;

            LayerSetUp {
                layer: &config.name,
                type_name,
                top_count,
            }
            .log();
        }

        NetInitialized {
            net: &net.name,
            layer_count: net.layers.len(),
            element: T::NAME,
        }
        .log();

        Ok(net)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer_names(&self) -> &[String] {
        &self.names
    }

    /// Top names of the last layer, matching what [`forward`](Self::forward) returns.
    pub fn output_names(&self) -> &[String] {
        self.tops.last().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn layer(&self, name: &str) -> Option<&dyn Layer<T>> {
        let index = self.index_of(name)?;
        Some(self.layers[index].as_ref())
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut (dyn Layer<T> + 'static)> {
        let index = self.index_of(name)?;
        Some(self.layers[index].as_mut())
    }

    /// Writable tops of a layer that holds assigned data, such as an input layer.
    pub fn assignable_tops(&mut self, name: &str) -> Option<&mut [Blob<T>]> {
        self.layer_mut(name)?.assignable_tops()
    }

    /// Run every layer once and return the last layer's tops.
    pub fn forward(&mut self) -> Result<Vec<&Blob<T>>, NetError> {
        let mut outputs: Vec<Vec<&Blob<T>>> = Vec::with_capacity(self.layers.len());

        for ((layer, wiring), name) in self.layers.iter_mut().zip(&self.bottoms).zip(&self.names) {
            let bottom: Vec<&Blob<T>> = wiring
                .iter()
                .map(|&(producer, top)| outputs[producer][top])
                .collect();

            let tops = layer
                .forward(&bottom)
                .map_err(|source| NetError::Forward {
                    layer: name.clone(),
                    source,
                })?;
            outputs.push(tops);
        }

        Ok(outputs.pop().unwrap_or_default())
    }

    /// Tear layers down in reverse order. Idempotent; also run on drop.
    pub fn teardown(&mut self) -> Result<(), NetError> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;

        let mut first_error = None;
        for (layer, name) in self.layers.iter_mut().zip(&self.names).rev() {
            if let Err(source) = layer.teardown() {
                tracing::warn!(net = %self.name, layer = %name, error = %source, "layer teardown failed");
                first_error.get_or_insert(NetError::Teardown {
                    layer: name.clone(),
                    source,
                });
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl<T: Element> Drop for Net<T> {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

/// Map every bottom to the latest earlier top of the same name.
fn resolve_bottoms(layer_configs: &[LayerConfig]) -> Result<Vec<Vec<(usize, usize)>>, NetError> {
    let mut producers: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut wiring = Vec::with_capacity(layer_configs.len());

    for (index, config) in layer_configs.iter().enumerate() {
        let bottoms = config
            .bottom
            .iter()
            .map(|bottom| {
                producers
                    .get(bottom.as_str())
                    .copied()
                    .ok_or_else(|| NetError::UnresolvedBottom {
                        layer: config.name.clone(),
                        bottom: bottom.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        wiring.push(bottoms);

        for (top_index, top) in config.top.iter().enumerate() {
            producers.insert(top.as_str(), (index, top_index));
        }
    }

    Ok(wiring)
}
