// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::marker::PhantomData;

use crate::config::{LrPolicy, SolverConfig};
use crate::engine::Net;
use crate::errors::{NetError, SolverError};
use crate::observability::messages::net::SolverProgress;
use crate::observability::messages::StructuredLog;
use crate::traits::{Element, Solver, SolverStats};

/// Stochastic gradient descent driver; registered as `SGD`.
///
/// Runs one forward pass per iteration and tracks the learning-rate schedule. The
/// parameter update itself belongs to the layers' kernels and is not modelled here.
pub struct SGDSolver<T: Element> {
    config: SolverConfig,
    iteration: usize,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> SGDSolver<T> {
    pub fn new(config: &SolverConfig) -> Result<Self, SolverError> {
        if config.lr_policy == LrPolicy::Step && config.stepsize == 0 {
            return Err(SolverError::InvalidParam {
                solver: config.type_name.clone(),
                reason: "step policy needs a non-zero stepsize".to_string(),
            });
        }
        if !(config.base_lr.is_finite() && config.base_lr >= 0.0) {
            return Err(SolverError::InvalidParam {
                solver: config.type_name.clone(),
                reason: format!("base_lr must be a non-negative number, got {}", config.base_lr),
            });
        }

        Ok(Self {
            config: config.clone(),
            iteration: 0,
            _element: PhantomData,
        })
    }
}

impl<T: Element> Solver<T> for SGDSolver<T> {
    fn type_name(&self) -> &'static str {
        "SGD"
    }

    fn iteration(&self) -> usize {
        self.iteration
    }

    fn max_iter(&self) -> usize {
        self.config.max_iter
    }

    fn learning_rate(&self) -> f64 {
        match self.config.lr_policy {
            LrPolicy::Fixed => self.config.base_lr,
            LrPolicy::Step => {
                let steps = (self.iteration / self.config.stepsize) as i32;
                self.config.base_lr * self.config.gamma.powi(steps)
            }
        }
    }

    fn step(&mut self, net: &mut Net<T>, iterations: usize) -> Result<SolverStats, NetError> {
        let mut values_seen = 0;

        for _ in 0..iterations {
            let outputs = net.forward()?;
            values_seen += outputs.first().map_or(0, |blob| blob.count());
            self.iteration += 1;

            if self.config.display > 0 && self.iteration % self.config.display == 0 {
                SolverProgress {
                    solver: "SGD",
                    iteration: self.iteration,
                    learning_rate: Solver::<T>::learning_rate(self),
                }
                .log();
            }
        }

        Ok(SolverStats {
            iterations,
            values_seen,
            learning_rate: Solver::<T>::learning_rate(self),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataParam, LayerConfig};

    fn solver(policy: LrPolicy, stepsize: usize) -> SGDSolver<f32> {
        SGDSolver::new(&SolverConfig {
            base_lr: 0.1,
            lr_policy: policy,
            gamma: 0.5,
            stepsize,
            max_iter: 10,
            ..SolverConfig::default()
        })
        .unwrap()
    }

    fn net() -> Net<f32> {
        let mut data = DataParam::new(2, 3);
        data.prefetch = 2;
        data.seed = Some(5);
        let layers = vec![LayerConfig::new("data", "SyntheticData").with_data(data)];
        Net::with_registry("sgd_test", &layers, f32::layer_registry()).unwrap()
    }

    #[test]
    fn test_learning_rate_schedule() {
        struct TestCase {
            name: &'static str,
            policy: LrPolicy,
            stepsize: usize,
            iteration: usize,
            expected: f64,
        }

        let test_cases = vec![
            TestCase { name: "fixed start", policy: LrPolicy::Fixed, stepsize: 0, iteration: 0, expected: 0.1 },
            TestCase { name: "fixed late", policy: LrPolicy::Fixed, stepsize: 0, iteration: 500, expected: 0.1 },
            TestCase { name: "step before first", policy: LrPolicy::Step, stepsize: 4, iteration: 3, expected: 0.1 },
            TestCase { name: "step at first", policy: LrPolicy::Step, stepsize: 4, iteration: 4, expected: 0.05 },
            TestCase { name: "step twice", policy: LrPolicy::Step, stepsize: 4, iteration: 9, expected: 0.025 },
        ];

        for test_case in test_cases {
            let mut solver = solver(test_case.policy, test_case.stepsize);
            solver.iteration = test_case.iteration;
            let lr = Solver::<f32>::learning_rate(&solver);
            assert!((lr - test_case.expected).abs() < 1e-12, "Test case '{}': {}", test_case.name, lr);
        }
    }

    #[test]
    fn test_step_drives_forward_passes() {
        let mut net = net();
        let mut solver = solver(LrPolicy::Step, 3);

        let stats = solver.step(&mut net, 4).unwrap();
        assert_eq!(stats.iterations, 4);
        assert_eq!(stats.values_seen, 4 * 6);
        assert_eq!(Solver::<f32>::iteration(&solver), 4);
        assert!((stats.learning_rate - 0.05).abs() < 1e-12);

        let stats = solver.solve(&mut net).unwrap();
        assert_eq!(stats.iterations, 6);
        assert_eq!(Solver::<f32>::iteration(&solver), 10);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let zero_step = SolverConfig {
            lr_policy: LrPolicy::Step,
            stepsize: 0,
            ..SolverConfig::default()
        };
        assert!(SGDSolver::<f64>::new(&zero_step).is_err());

        let negative = SolverConfig {
            base_lr: -1.0,
            ..SolverConfig::default()
        };
        assert!(SGDSolver::<f64>::new(&negative).is_err());
    }

    #[test]
    fn test_created_through_registry() {
        let solver = f64::solver_registry().create(&SolverConfig::default()).unwrap();
        assert_eq!(solver.type_name(), "SGD");
        assert_eq!(solver.max_iter(), SolverConfig::default().max_iter);
    }
}
