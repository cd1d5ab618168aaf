// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for net assembly and solver progress.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A net finished assembling and setting up its layers.
///
/// # Log Level
/// `info!` - Important operational event
pub struct NetInitialized<'a> {
    pub net: &'a str,
    pub layer_count: usize,
    pub element: &'a str,
}

impl Display for NetInitialized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Net '{}' initialized with {} layers ({})",
            self.net, self.layer_count, self.element
        )
    }
}

impl StructuredLog for NetInitialized<'_> {
    fn log(&self) {
        tracing::info!(
            net = self.net,
            layer_count = self.layer_count,
            element = self.element,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "net",
            span_name = name,
            net = self.net,
            element = self.element,
        )
    }
}

/// A layer's setup phase returned.
///
/// # Log Level
/// `debug!` - One line per layer
pub struct LayerSetUp<'a> {
    pub layer: &'a str,
    pub type_name: &'a str,
    pub top_count: usize,
}

impl Display for LayerSetUp<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Set up layer '{}' ({}) with {} tops",
            self.layer, self.type_name, self.top_count
        )
    }
}

impl StructuredLog for LayerSetUp<'_> {
    fn log(&self) {
        tracing::debug!(
            layer = self.layer,
            type_name = self.type_name,
            top_count = self.top_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("layer_setup", span_name = name, layer = self.layer)
    }
}

/// A solver finished a run of iterations.
///
/// # Log Level
/// `info!` - Progress report
///
/// # Example
/// ```
/// use the_stagehand::observability::messages::net::SolverProgress;
///
/// let msg = SolverProgress {
///     solver: "SGD",
///     iteration: 100,
///     learning_rate: 0.01,
/// };
///
/// assert_eq!(msg.to_string(), "Iteration 100 (SGD), lr = 0.01");
/// ```
pub struct SolverProgress<'a> {
    pub solver: &'a str,
    pub iteration: usize,
    pub learning_rate: f64,
}

impl Display for SolverProgress<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Iteration {} ({}), lr = {}",
            self.iteration, self.solver, self.learning_rate
        )
    }
}

impl StructuredLog for SolverProgress<'_> {
    fn log(&self) {
        tracing::info!(
            solver = self.solver,
            iteration = self.iteration,
            learning_rate = self.learning_rate,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "solver",
            span_name = name,
            solver = self.solver,
            iteration = self.iteration,
        )
    }
}
