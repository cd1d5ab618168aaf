// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod validation;

pub mod consts;

pub use consts::DEFAULT_PREFETCH_DEPTH;
pub use loader::{
    load_and_validate_config, load_config, DataParam, DeviceConfig, DeviceMode, InputParam,
    LayerConfig, LrPolicy, NetConfig, Precision, SolverConfig,
};
pub use validation::validate_net_config;
