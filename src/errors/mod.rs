// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod layer;
mod pipeline;
mod registry;

pub use config::{ConfigError, ValidationError};
pub use layer::{LayerError, NetError, SolverError};
pub use pipeline::{DeviceError, LoadError, PipelineError, QueueClosed};
pub use registry::{FactoryError, RegistryError};
