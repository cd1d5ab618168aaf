// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::RegistryError;
use crate::layers::{InputLayer, RecordDataLayer, SyntheticDataLayer};
use crate::registry::{LayerRegistry, SolverRegistry};
use crate::solvers::SGDSolver;
use crate::traits::Element;

/// Register the layer types shipped with the crate.
pub fn register_builtin_layers<T: Element>(registry: &LayerRegistry<T>) -> Result<(), RegistryError> {
    crate::register_layer_class!(registry, Input)?;
    crate::register_layer_class!(registry, SyntheticData)?;
    crate::register_layer_class!(registry, RecordData)?;
    Ok(())
}

/// Register the solver types shipped with the crate.
pub fn register_builtin_solvers<T: Element>(
    registry: &SolverRegistry<T>,
) -> Result<(), RegistryError> {
    crate::register_solver_class!(registry, SGD)?;
    Ok(())
}
