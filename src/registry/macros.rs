// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Registration shorthands.
//!
//! Every form has a registry-less variant that registers into the global registries of
//! both element types (`f32` and `f64`) and a variant taking an explicit registry.
//! Registry-less forms evaluate to `Result<(), RegistryError>` and stop at the first
//! failure. The `_class` forms expect a type named `<Name>Layer` or `<Name>Solver` in
//! scope, generic over the element type, with a `new(&config) -> Result<Self, _>`
//! constructor.

/// Register a layer type by name using its `<Name>Layer::new` constructor.
///
/// ```rust,ignore
/// register_layer_class!(Scale)?;             // both precisions
/// register_layer_class!(registry, Scale)?;   // one registry
/// ```
#[macro_export]
macro_rules! register_layer_class {
    ($name:ident) => {
        $crate::register_layer_class!(
            <f32 as $crate::traits::Element>::layer_registry(),
            $name
        )
        .and_then(|()| {
            $crate::register_layer_class!(
                <f64 as $crate::traits::Element>::layer_registry(),
                $name
            )
        })
    };
    ($registry:expr, $name:ident) => {
        $crate::registry::__paste! {
            $registry.register(
                stringify!($name),
                |config: &$crate::config::LayerConfig| {
                    let layer = <[<$name Layer>]<_>>::new(config)?;
                    Ok($crate::traits::boxed_layer(layer))
                },
            )
        }
    };
}

/// Register a layer creator function under a type name.
///
/// The creator must be generic over the element type when the registry-less form is
/// used, so it can be instantiated for both precisions.
#[macro_export]
macro_rules! register_layer_creator {
    ($name:ident, $creator:path) => {
        $crate::register_layer_creator!(
            <f32 as $crate::traits::Element>::layer_registry(),
            $name,
            $creator
        )
        .and_then(|()| {
            $crate::register_layer_creator!(
                <f64 as $crate::traits::Element>::layer_registry(),
                $name,
                $creator
            )
        })
    };
    ($registry:expr, $name:ident, $creator:path) => {
        $registry.register(stringify!($name), $creator)
    };
}

/// Register a solver type by name using its `<Name>Solver::new` constructor.
#[macro_export]
macro_rules! register_solver_class {
    ($name:ident) => {
        $crate::register_solver_class!(
            <f32 as $crate::traits::Element>::solver_registry(),
            $name
        )
        .and_then(|()| {
            $crate::register_solver_class!(
                <f64 as $crate::traits::Element>::solver_registry(),
                $name
            )
        })
    };
    ($registry:expr, $name:ident) => {
        $crate::registry::__paste! {
            $registry.register(
                stringify!($name),
                |config: &$crate::config::SolverConfig| {
                    let solver = <[<$name Solver>]<_>>::new(config)?;
                    Ok($crate::traits::boxed_solver(solver))
                },
            )
        }
    };
}

/// Register a solver creator function under a type name.
#[macro_export]
macro_rules! register_solver_creator {
    ($name:ident, $creator:path) => {
        $crate::register_solver_creator!(
            <f32 as $crate::traits::Element>::solver_registry(),
            $name,
            $creator
        )
        .and_then(|()| {
            $crate::register_solver_creator!(
                <f64 as $crate::traits::Element>::solver_registry(),
                $name,
                $creator
            )
        })
    };
    ($registry:expr, $name:ident, $creator:path) => {
        $registry.register(stringify!($name), $creator)
    };
}
