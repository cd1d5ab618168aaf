// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{PipelineError, RegistryError};
use thiserror::Error;

/// Errors raised while setting up or running a layer.
#[derive(Error, Debug)]
pub enum LayerError {
    /// The layer configuration is missing a block the layer requires.
    #[error("layer '{layer}' is missing its '{block}' configuration")]
    MissingParam { layer: String, block: &'static str },

    /// A configuration value is outside the range the layer accepts.
    #[error("layer '{layer}': {reason}")]
    InvalidParam { layer: String, reason: String },

    /// The layer was wired with a number of outputs it cannot produce.
    #[error("layer '{layer}' produces between {min} and {max} tops, got {actual}")]
    TopCount {
        layer: String,
        min: usize,
        max: usize,
        actual: usize,
    },

    /// The layer was wired with a number of inputs it cannot consume.
    #[error("layer '{layer}' takes exactly {expected} bottoms, got {actual}")]
    BottomCount {
        layer: String,
        expected: usize,
        actual: usize,
    },

    /// `forward` was called before `setup`.
    #[error("layer '{0}' used before setup")]
    NotSetUp(String),

    /// The data pipeline behind the layer failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Errors raised while assembling or driving a net.
#[derive(Error, Debug)]
pub enum NetError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("setup of layer '{layer}' failed: {source}")]
    Setup {
        layer: String,
        #[source]
        source: LayerError,
    },

    #[error("forward pass through layer '{layer}' failed: {source}")]
    Forward {
        layer: String,
        #[source]
        source: LayerError,
    },

    #[error("layer '{layer}' consumes '{bottom}' which no earlier layer produces")]
    UnresolvedBottom { layer: String, bottom: String },

    #[error("teardown of layer '{layer}' failed: {source}")]
    Teardown {
        layer: String,
        #[source]
        source: LayerError,
    },

    #[error("net '{0}' has no layers")]
    Empty(String),
}

/// Errors raised while constructing a solver.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("solver '{solver}': {reason}")]
    InvalidParam { solver: String, reason: String },
}
