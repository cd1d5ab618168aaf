// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for type registration and component instantiation.

use thiserror::Error;

/// Error type a factory may return when it declines to build an instance.
///
/// Boxed so that every component family can surface its own error type
/// (`LayerError`, `std::io::Error`, ...) through the same registry.
pub type FactoryError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Configuration errors raised by a [`TypeRegistry`](crate::registry::TypeRegistry).
///
/// Duplicate registrations and unknown type requests are configuration bugs. They are
/// reported synchronously to the caller that registered or requested the type and the
/// registry is left untouched.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A factory is already registered under this name.
    #[error("{family} type {type_name} already registered.")]
    DuplicateType {
        family: &'static str,
        type_name: String,
    },

    /// No factory is registered under this name.
    #[error("Unknown {family} type: {type_name} (known types: {})", known.join(", "))]
    UnknownType {
        family: &'static str,
        type_name: String,
        known: Vec<String>,
    },

    /// The factory was found but refused the configuration it was handed.
    #[error("Failed to create {family} '{instance}' of type {type_name}: {source}")]
    CreationFailed {
        family: &'static str,
        type_name: String,
        instance: String,
        #[source]
        source: FactoryError,
    },
}

impl RegistryError {
    /// Type name the error refers to.
    pub fn type_name(&self) -> &str {
        match self {
            RegistryError::DuplicateType { type_name, .. }
            | RegistryError::UnknownType { type_name, .. }
            | RegistryError::CreationFailed { type_name, .. } => type_name,
        }
    }
}
