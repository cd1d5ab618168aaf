// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Messages are organized by subsystem:
//!
//! * `registry` - type registration and component creation
//! * `pipeline` - prefetch worker lifecycle and batch handoff
//! * `net` - net assembly and solver progress
//! * `validation` - configuration validation

use tracing::Span;

pub mod net;
pub mod pipeline;
pub mod registry;
pub mod validation;

/// A message that knows how to log itself with structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event at its natural level.
    fn log(&self);

    /// Build a span carrying the message fields.
    fn span(&self, name: &str) -> Span;
}
