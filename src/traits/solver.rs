// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::Net;
use crate::errors::NetError;
use crate::traits::Element;

/// Progress summary returned by a solver run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverStats {
    /// Iterations executed by this call.
    pub iterations: usize,
    /// Total number of values pulled through the net's first output.
    pub values_seen: usize,
    /// Learning rate in effect after the last iteration.
    pub learning_rate: f64,
}

/// Drives a net through training iterations.
///
/// The update rule is the solver's own business. The runtime only asks a solver to run
/// some iterations against a net and to report where it is.
pub trait Solver<T: Element>: Send {
    fn type_name(&self) -> &'static str;

    /// Iterations completed so far.
    fn iteration(&self) -> usize;

    /// Iteration count at which `solve` stops.
    fn max_iter(&self) -> usize;

    /// Learning rate for the current iteration.
    fn learning_rate(&self) -> f64;

    /// Run `iterations` more iterations.
    fn step(&mut self, net: &mut Net<T>, iterations: usize) -> Result<SolverStats, NetError>;

    /// Run until `max_iter`.
    fn solve(&mut self, net: &mut Net<T>) -> Result<SolverStats, NetError> {
        let remaining = self.max_iter().saturating_sub(self.iteration());
        self.step(net, remaining)
    }
}

/// Box a concrete solver as a trait object; used by the registration macros.
pub fn boxed_solver<T: Element, S: Solver<T> + 'static>(solver: S) -> Box<dyn Solver<T>> {
    Box::new(solver)
}
