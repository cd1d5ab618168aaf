// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for type registration and component creation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A factory was added to a registry.
///
/// # Log Level
/// `debug!` - Happens once per type per precision at startup
pub struct TypeRegistered<'a> {
    pub family: &'a str,
    pub type_name: &'a str,
    pub element: &'a str,
}

impl Display for TypeRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered {} type '{}' for element type {}",
            self.family, self.type_name, self.element
        )
    }
}

impl StructuredLog for TypeRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            family = self.family,
            type_name = self.type_name,
            element = self.element,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "type_registered",
            span_name = name,
            family = self.family,
            type_name = self.type_name,
        )
    }
}

/// A registration was refused because the name is taken.
///
/// # Log Level
/// `error!` - Two components claim the same type name
///
/// # Example
/// ```
/// use the_stagehand::observability::messages::registry::DuplicateTypeRejected;
///
/// let msg = DuplicateTypeRejected {
///     family: "layer",
///     type_name: "Input",
///     element: "f32",
/// };
///
/// assert_eq!(msg.to_string(), "layer type Input already registered for f32; keeping the existing factory");
/// ```
pub struct DuplicateTypeRejected<'a> {
    pub family: &'a str,
    pub type_name: &'a str,
    pub element: &'a str,
}

impl Display for DuplicateTypeRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} type {} already registered for {}; keeping the existing factory",
            self.family, self.type_name, self.element
        )
    }
}

impl StructuredLog for DuplicateTypeRejected<'_> {
    fn log(&self) {
        tracing::error!(
            family = self.family,
            type_name = self.type_name,
            element = self.element,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "duplicate_type",
            span_name = name,
            family = self.family,
            type_name = self.type_name,
        )
    }
}

/// A creation request named a type nobody registered.
///
/// # Log Level
/// `error!` - Configuration refers to a missing component
pub struct UnknownTypeRequested<'a> {
    pub family: &'a str,
    pub type_name: &'a str,
    pub instance: &'a str,
    pub known: &'a [String],
}

impl Display for UnknownTypeRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unknown {} type '{}' requested for '{}' (known types: {})",
            self.family,
            self.type_name,
            self.instance,
            self.known.join(", ")
        )
    }
}

impl StructuredLog for UnknownTypeRequested<'_> {
    fn log(&self) {
        tracing::error!(
            family = self.family,
            type_name = self.type_name,
            instance = self.instance,
            known_count = self.known.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "unknown_type",
            span_name = name,
            family = self.family,
            type_name = self.type_name,
        )
    }
}

/// A component instance was produced by its factory.
///
/// # Log Level
/// `info!` - One line per layer or solver when a net is assembled
pub struct ComponentCreated<'a> {
    pub family: &'a str,
    pub type_name: &'a str,
    pub instance: &'a str,
}

impl Display for ComponentCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Creating {} {} ({})",
            self.family, self.instance, self.type_name
        )
    }
}

impl StructuredLog for ComponentCreated<'_> {
    fn log(&self) {
        tracing::info!(
            family = self.family,
            type_name = self.type_name,
            instance = self.instance,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "component_created",
            span_name = name,
            family = self.family,
            type_name = self.type_name,
            instance = self.instance,
        )
    }
}
