// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during net configuration validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The net declares no layers at all
    EmptyNet {
        /// Name of the offending net
        net: String,
    },
    /// Two layers share a name
    DuplicateLayerName {
        /// The duplicate layer name
        layer: String,
    },
    /// A layer consumes a blob no earlier layer produces
    UnresolvedBottom {
        /// The layer with the dangling input
        layer: String,
        /// The blob name that could not be resolved
        bottom: String,
    },
    /// A data layer has no `data` block
    MissingDataParam {
        /// The data layer missing its parameters
        layer: String,
    },
    /// A data layer asks for zero prefetch slots
    InvalidPrefetchDepth {
        /// The offending layer
        layer: String,
    },
    /// A data layer asks for empty batches
    InvalidBatchSize {
        /// The offending layer
        layer: String,
    },
    /// An input layer's shapes do not line up with its tops
    InputShapeMismatch {
        /// The offending layer
        layer: String,
        /// Number of shapes declared
        shapes: usize,
        /// Number of tops declared
        tops: usize,
    },
    /// A step learning-rate policy with a zero step size
    InvalidStepSize {
        /// Solver type name
        solver: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyNet { net } => write!(f, "Net '{}' declares no layers", net),
            ValidationError::DuplicateLayerName { layer } => {
                write!(f, "Duplicate layer name: '{}'", layer)
            }
            ValidationError::UnresolvedBottom { layer, bottom } => {
                write!(
                    f,
                    "Layer '{}' consumes '{}' which no earlier layer produces",
                    layer, bottom
                )
            }
            ValidationError::MissingDataParam { layer } => {
                write!(f, "Data layer '{}' has no 'data' block", layer)
            }
            ValidationError::InvalidPrefetchDepth { layer } => {
                write!(f, "Data layer '{}' must prefetch at least one batch", layer)
            }
            ValidationError::InvalidBatchSize { layer } => {
                write!(f, "Data layer '{}' must use a batch size of at least 1", layer)
            }
            ValidationError::InputShapeMismatch {
                layer,
                shapes,
                tops,
            } => {
                write!(
                    f,
                    "Input layer '{}' declares {} shapes for {} tops; give one shape, or one per top",
                    layer, shapes, tops
                )
            }
            ValidationError::InvalidStepSize { solver } => {
                write!(f, "Solver '{}' uses the step policy with a step size of 0", solver)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported configuration format '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(String),

    #[error("Configuration validation failed:\n{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n"))]
    Invalid(Vec<ValidationError>),
}
