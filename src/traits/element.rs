// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::Debug;
use std::sync::OnceLock;

use crate::registry::{register_builtin_layers, register_builtin_solvers, LayerRegistry, SolverRegistry};

/// Numeric element type a net computes in.
///
/// Every registry exists once per element type: a layer registered for `f32` is not
/// visible to an `f64` net. The registries are created on first access, receive the
/// built-in registrations in a fixed order, and then live for the rest of the process.
pub trait Element: Copy + Default + Debug + PartialEq + PartialOrd + Send + Sync + 'static {
    /// Short name used in logs and configuration (`"f32"`, `"f64"`).
    const NAME: &'static str;

    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64;

    /// Process-wide layer registry for this element type.
    fn layer_registry() -> &'static LayerRegistry<Self>;

    /// Process-wide solver registry for this element type.
    fn solver_registry() -> &'static SolverRegistry<Self>;
}

macro_rules! impl_element {
    ($ty:ty, $name:literal) => {
        impl Element for $ty {
            const NAME: &'static str = $name;

            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            #[allow(clippy::unnecessary_cast)]
            fn to_f64(self) -> f64 {
                self as f64
            }

            fn layer_registry() -> &'static LayerRegistry<Self> {
                static REGISTRY: OnceLock<LayerRegistry<$ty>> = OnceLock::new();
                REGISTRY.get_or_init(|| {
                    let registry = LayerRegistry::new("layer", $name);
                    if let Err(err) = register_builtin_layers(&registry) {
                        tracing::error!(%err, element = $name, "built-in layer registration failed");
                    }
                    registry
                })
            }

            fn solver_registry() -> &'static SolverRegistry<Self> {
                static REGISTRY: OnceLock<SolverRegistry<$ty>> = OnceLock::new();
                REGISTRY.get_or_init(|| {
                    let registry = SolverRegistry::new("solver", $name);
                    if let Err(err) = register_builtin_solvers(&registry) {
                        tracing::error!(%err, element = $name, "built-in solver registration failed");
                    }
                    registry
                })
            }
        }
    };
}

impl_element!(f32, "f32");
impl_element!(f64, "f64");
