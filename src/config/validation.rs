// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation for net wiring and layer parameters.
//!
//! Validation runs every check and accumulates the failures, so a user sees all the
//! problems in a config at once rather than fixing them one by one:
//!
//! 1. **Non-empty**: the net declares at least one layer
//! 2. **Uniqueness**: layer names are unique
//! 3. **Wiring**: every `bottom` is a `top` of an earlier layer
//! 4. **Data parameters**: built-in data layers carry a `data` block with a non-zero
//!    batch size and prefetch depth
//! 5. **Input shapes**: input layers give one shape, or one shape per top
//! 6. **Solver**: a `step` learning-rate policy has a non-zero step size
//!
//! Layers are validated in declaration order, which is also execution order, so a
//! layer can only consume what has already been produced.
//!
//! # Examples
//!
//! ```rust
//! use the_stagehand::config::{validate_net_config, DataParam, LayerConfig, NetConfig};
//! use the_stagehand::errors::ValidationError;
//!
//! let config = NetConfig {
//!     name: "example".to_string(),
//!     precision: Default::default(),
//!     device: Default::default(),
//!     seed: None,
//!     layers: vec![
//!         LayerConfig::new("data", "SyntheticData").with_data(DataParam::new(0, 4)),
//!         LayerConfig::new("consumer", "Custom").with_bottoms(&["missing"]),
//!     ],
//!     solver: None,
//! };
//!
//! let errors = validate_net_config(&config).unwrap_err();
//! assert_eq!(errors.len(), 2);
//! assert!(matches!(errors[0], ValidationError::UnresolvedBottom { .. }));
//! assert!(matches!(errors[1], ValidationError::InvalidBatchSize { .. }));
//! ```

use std::collections::HashSet;

use crate::config::consts::{DATA_LAYER_TYPES, INPUT_LAYER_TYPE};
use crate::config::{LayerConfig, LrPolicy, NetConfig};
use crate::errors::ValidationError;
use crate::observability::messages::validation::ValidationStarted;
use crate::observability::messages::StructuredLog;

/// Validates a net configuration.
///
/// # Returns
///
/// * `Ok(())` - The config can be assembled into a net
/// * `Err(Vec<ValidationError>)` - Every problem found, in check order
pub fn validate_net_config(config: &NetConfig) -> Result<(), Vec<ValidationError>> {
    ValidationStarted {
        net: &config.name,
        layer_count: config.layers.len(),
    }
    .log();

    let mut errors = Vec::new();

    if config.layers.is_empty() {
        errors.push(ValidationError::EmptyNet {
            net: config.name.clone(),
        });
    }
    errors.extend(validate_unique_layer_names(&config.layers));
    errors.extend(validate_bottom_references(&config.layers));
    for layer in &config.layers {
        errors.extend(validate_layer_params(layer));
    }

    if let Some(solver) = &config.solver {
        if solver.lr_policy == LrPolicy::Step && solver.stepsize == 0 {
            errors.push(ValidationError::InvalidStepSize {
                solver: solver.type_name.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_layer_names(layers: &[LayerConfig]) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    layers
        .iter()
        .filter(|layer| !seen.insert(layer.name.as_str()))
        .map(|layer| ValidationError::DuplicateLayerName {
            layer: layer.name.clone(),
        })
        .collect()
}

/// A bottom must name a top produced by an earlier layer. A layer may list its own
/// bottom as a top to update the blob in place, but never consume its own output.
fn validate_bottom_references(layers: &[LayerConfig]) -> Vec<ValidationError> {
    let mut produced: HashSet<&str> = HashSet::new();
    let mut errors = Vec::new();

    for layer in layers {
        for bottom in &layer.bottom {
            if !produced.contains(bottom.as_str()) {
                errors.push(ValidationError::UnresolvedBottom {
                    layer: layer.name.clone(),
                    bottom: bottom.clone(),
                });
            }
        }
        if layer.top.is_empty() {
            produced.insert(layer.name.as_str());
        } else {
            produced.extend(layer.top.iter().map(String::as_str));
        }
    }

    errors
}

fn validate_layer_params(layer: &LayerConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if DATA_LAYER_TYPES.contains(&layer.type_name.as_str()) && layer.data.is_none() {
        errors.push(ValidationError::MissingDataParam {
            layer: layer.name.clone(),
        });
    }

    if let Some(data) = &layer.data {
        if data.batch_size == 0 {
            errors.push(ValidationError::InvalidBatchSize {
                layer: layer.name.clone(),
            });
        }
        if data.prefetch == 0 {
            errors.push(ValidationError::InvalidPrefetchDepth {
                layer: layer.name.clone(),
            });
        }
    }

    if layer.type_name == INPUT_LAYER_TYPE {
        let shapes = layer.input.as_ref().map_or(0, |input| input.shape.len());
        let tops = layer.top.len().max(1);
        if shapes != 1 && shapes != tops {
            errors.push(ValidationError::InputShapeMismatch {
                layer: layer.name.clone(),
                shapes,
                tops,
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataParam, InputParam, SolverConfig};

    fn net(layers: Vec<LayerConfig>) -> NetConfig {
        NetConfig {
            name: "test_net".to_string(),
            precision: Default::default(),
            device: Default::default(),
            seed: None,
            layers,
            solver: None,
        }
    }

    fn data_layer(name: &str) -> LayerConfig {
        LayerConfig::new(name, "SyntheticData")
            .with_tops(&[name, "label"])
            .with_data(DataParam::new(4, 2))
    }

    fn input_layer(name: &str, tops: &[&str], shapes: Vec<Vec<usize>>) -> LayerConfig {
        LayerConfig::new(name, "Input")
            .with_tops(tops)
            .with_input(InputParam { shape: shapes })
    }

    #[test]
    fn test_valid_configs() {
        struct TestCase {
            name: &'static str,
            layers: Vec<LayerConfig>,
        }

        let test_cases = vec![
            TestCase {
                name: "single data layer",
                layers: vec![data_layer("data")],
            },
            TestCase {
                name: "chained consumer",
                layers: vec![
                    data_layer("data"),
                    LayerConfig::new("scale", "Custom").with_bottoms(&["data", "label"]),
                ],
            },
            TestCase {
                name: "in-place update",
                layers: vec![
                    data_layer("data"),
                    LayerConfig::new("relu", "Custom")
                        .with_bottoms(&["data"])
                        .with_tops(&["data"]),
                ],
            },
            TestCase {
                name: "input with shared shape",
                layers: vec![input_layer("in", &["a", "b"], vec![vec![2, 2]])],
            },
            TestCase {
                name: "input with shape per top",
                layers: vec![input_layer("in", &["a", "b"], vec![vec![2], vec![3]])],
            },
        ];

        for test_case in test_cases {
            let result = validate_net_config(&net(test_case.layers));
            assert!(result.is_ok(), "Test case '{}': {:?}", test_case.name, result);
        }
    }

    #[test]
    fn test_invalid_configs() {
        struct TestCase {
            name: &'static str,
            layers: Vec<LayerConfig>,
            expected: Vec<ValidationError>,
        }

        let mut zero_prefetch = data_layer("data");
        if let Some(data) = zero_prefetch.data.as_mut() {
            data.prefetch = 0;
        }

        let test_cases = vec![
            TestCase {
                name: "empty net",
                layers: vec![],
                expected: vec![ValidationError::EmptyNet {
                    net: "test_net".to_string(),
                }],
            },
            TestCase {
                name: "duplicate names",
                layers: vec![data_layer("data"), data_layer("data")],
                expected: vec![ValidationError::DuplicateLayerName {
                    layer: "data".to_string(),
                }],
            },
            TestCase {
                name: "consumer before producer",
                layers: vec![
                    LayerConfig::new("early", "Custom").with_bottoms(&["late"]),
                    LayerConfig::new("late", "Custom"),
                ],
                expected: vec![ValidationError::UnresolvedBottom {
                    layer: "early".to_string(),
                    bottom: "late".to_string(),
                }],
            },
            TestCase {
                name: "self-consumption",
                layers: vec![LayerConfig::new("loop", "Custom").with_bottoms(&["loop"])],
                expected: vec![ValidationError::UnresolvedBottom {
                    layer: "loop".to_string(),
                    bottom: "loop".to_string(),
                }],
            },
            TestCase {
                name: "data layer without data block",
                layers: vec![LayerConfig::new("records", "RecordData")],
                expected: vec![ValidationError::MissingDataParam {
                    layer: "records".to_string(),
                }],
            },
            TestCase {
                name: "zero prefetch",
                layers: vec![zero_prefetch],
                expected: vec![ValidationError::InvalidPrefetchDepth {
                    layer: "data".to_string(),
                }],
            },
            TestCase {
                name: "input shape count",
                layers: vec![input_layer("in", &["a", "b", "c"], vec![vec![1], vec![2]])],
                expected: vec![ValidationError::InputShapeMismatch {
                    layer: "in".to_string(),
                    shapes: 2,
                    tops: 3,
                }],
            },
        ];

        for test_case in test_cases {
            let errors = validate_net_config(&net(test_case.layers)).unwrap_err();
            assert_eq!(errors, test_case.expected, "Test case '{}'", test_case.name);
        }
    }

    #[test]
    fn test_step_policy_needs_step_size() {
        let mut config = net(vec![data_layer("data")]);
        config.solver = Some(SolverConfig {
            lr_policy: LrPolicy::Step,
            ..SolverConfig::default()
        });

        let errors = validate_net_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidStepSize {
                solver: "SGD".to_string()
            }]
        );
    }

    #[test]
    fn test_errors_accumulate() {
        let layers = vec![
            LayerConfig::new("a", "RecordData").with_bottoms(&["x"]),
            LayerConfig::new("a", "Custom").with_bottoms(&["y"]),
        ];

        let errors = validate_net_config(&net(layers)).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::DuplicateLayerName { .. }));
    }
}
