// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Extensible type registries.
//!
//! A registry maps a type name from the configuration to a factory that builds an
//! instance of a polymorphic component. Concrete components are linked into the binary
//! but never named by the code that instantiates them; the configuration text is the
//! only coupling point.
//!
//! There is one registry per component family (layers, solvers) and element type. Each
//! is created on first access, filled by an explicit registration step
//! ([`register_builtin_layers`], [`register_builtin_solvers`]), and lives for the rest of
//! the process. Components defined outside this crate register through the same API,
//! usually with [`register_layer_class!`](crate::register_layer_class) during startup.

mod builtin;
mod macros;
mod type_registry;

pub use builtin::{register_builtin_layers, register_builtin_solvers};
pub use type_registry::{ComponentConfig, Factory, TypeRegistry};

#[doc(hidden)]
pub use paste::paste as __paste;

use crate::config::{LayerConfig, SolverConfig};
use crate::traits::{Layer, Solver};

/// Registry of layer factories for element type `T`.
pub type LayerRegistry<T> = TypeRegistry<dyn Layer<T>, LayerConfig>;

/// Registry of solver factories for element type `T`.
pub type SolverRegistry<T> = TypeRegistry<dyn Solver<T>, SolverConfig>;
