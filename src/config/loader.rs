// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_BASE_LR, DEFAULT_CHANNELS, DEFAULT_CLASSES, DEFAULT_GAMMA, DEFAULT_MAX_ITER,
    DEFAULT_PREFETCH_DEPTH, DEFAULT_SEED, DEFAULT_SOLVER_TYPE,
};
use crate::errors::ConfigError;
use crate::observability::messages::validation::{ValidationFailed, ValidationIssue};
use crate::observability::messages::StructuredLog;
use crate::registry::ComponentConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration of a net.
///
/// Layers are listed in execution order. Each layer names the registered type that
/// implements it, so adding a layer type never requires touching this schema.
///
/// # Example
/// ```yaml
/// name: mnist_like
/// precision: f32
/// seed: 42
/// device:
///   mode: mirrored
/// layers:
///   - name: data
///     type: SyntheticData
///     top: [data, label]
///     data:
///       batch_size: 64
///       channels: 784
///       prefetch: 4
/// solver:
///   type: SGD
///   base_lr: 0.01
///   lr_policy: step
///   gamma: 0.1
///   stepsize: 1000
///   max_iter: 5000
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NetConfig {
    pub name: String,
    #[serde(default)]
    pub precision: Precision,
    #[serde(default)]
    pub device: DeviceConfig,
    /// Seed inherited by every data layer that does not set its own.
    #[serde(default)]
    pub seed: Option<u64>,
    pub layers: Vec<LayerConfig>,
    #[serde(default)]
    pub solver: Option<SolverConfig>,
}

impl NetConfig {
    /// Layer configs with net-level defaults (seed, device) pushed down into each data
    /// block that leaves them unset. A layer without tops gets one named after itself.
    pub fn resolved_layers(&self) -> Vec<LayerConfig> {
        let seed = self.seed.unwrap_or(DEFAULT_SEED);
        self.layers
            .iter()
            .map(|layer| {
                let mut layer = layer.clone();
                if layer.top.is_empty() {
                    layer.top.push(layer.name.clone());
                }
                if let Some(data) = layer.data.as_mut() {
                    data.seed.get_or_insert(seed);
                    data.device.get_or_insert(self.device.mode);
                }
                layer
            })
            .collect()
    }
}

/// Element type the net computes in.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    #[default]
    F32,
    F64,
}

/// Where staged batches are consumed.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DeviceConfig {
    #[serde(default)]
    pub mode: DeviceMode,
}

/// Execution device for staged batches.
///
/// * `Host` - The consumer reads host memory; no transfer step
/// * `Mirrored` - Each batch is copied to a secondary device before it is published
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    #[default]
    Host,
    Mirrored,
}

/// Configuration for a single layer.
///
/// # Example
/// ```yaml
/// name: data
/// type: RecordData
/// top: [data, label]
/// data:
///   source: data/train.csv
///   batch_size: 32
///   channels: 4
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LayerConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub top: Vec<String>,
    #[serde(default)]
    pub bottom: Vec<String>,
    #[serde(default)]
    pub data: Option<DataParam>,
    #[serde(default)]
    pub input: Option<InputParam>,
    /// Free-form parameters for layer types registered outside this crate. Built-in
    /// layers read only `data` and `input`; a custom factory reads whatever it needs here.
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>,
}

impl LayerConfig {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            top: vec![name.to_string()],
            bottom: Vec::new(),
            data: None,
            input: None,
            options: HashMap::new(),
        }
    }

    pub fn with_tops(mut self, tops: &[&str]) -> Self {
        self.top = tops.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_bottoms(mut self, bottoms: &[&str]) -> Self {
        self.bottom = bottoms.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn with_data(mut self, data: DataParam) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_input(mut self, input: InputParam) -> Self {
        self.input = Some(input);
        self
    }
}

impl ComponentConfig for LayerConfig {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn instance_name(&self) -> &str {
        &self.name
    }
}

/// Parameters shared by data layers.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DataParam {
    pub batch_size: usize,
    #[serde(default = "default_prefetch")]
    pub prefetch: usize,
    /// Record file for file-backed layers.
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Values per record.
    #[serde(default = "default_channels")]
    pub channels: usize,
    /// Label classes for generated data.
    #[serde(default = "default_classes")]
    pub classes: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub device: Option<DeviceMode>,
}

impl DataParam {
    pub fn new(batch_size: usize, channels: usize) -> Self {
        Self {
            batch_size,
            prefetch: DEFAULT_PREFETCH_DEPTH,
            source: None,
            channels,
            classes: DEFAULT_CLASSES,
            seed: None,
            device: None,
        }
    }
}

fn default_prefetch() -> usize {
    DEFAULT_PREFETCH_DEPTH
}

fn default_channels() -> usize {
    DEFAULT_CHANNELS
}

fn default_classes() -> usize {
    DEFAULT_CLASSES
}

/// Shapes for an input layer: one shared by every top, or one per top.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct InputParam {
    #[serde(default)]
    pub shape: Vec<Vec<usize>>,
}

/// Solver configuration.
///
/// # Example
/// ```yaml
/// type: SGD
/// base_lr: 0.01
/// lr_policy: step
/// gamma: 0.5
/// stepsize: 100
/// max_iter: 1000
/// display: 100
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SolverConfig {
    #[serde(rename = "type", default = "default_solver_type")]
    pub type_name: String,
    #[serde(default = "default_base_lr")]
    pub base_lr: f64,
    #[serde(default)]
    pub lr_policy: LrPolicy,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default)]
    pub stepsize: usize,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Log progress every `display` iterations; 0 disables it.
    #[serde(default)]
    pub display: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            type_name: default_solver_type(),
            base_lr: DEFAULT_BASE_LR,
            lr_policy: LrPolicy::default(),
            gamma: DEFAULT_GAMMA,
            stepsize: 0,
            max_iter: DEFAULT_MAX_ITER,
            display: 0,
        }
    }
}

impl ComponentConfig for SolverConfig {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn instance_name(&self) -> &str {
        &self.type_name
    }
}

fn default_solver_type() -> String {
    DEFAULT_SOLVER_TYPE.to_string()
}

fn default_base_lr() -> f64 {
    DEFAULT_BASE_LR
}

fn default_gamma() -> f64 {
    DEFAULT_GAMMA
}

fn default_max_iter() -> usize {
    DEFAULT_MAX_ITER
}

/// Learning-rate schedule.
///
/// * `Fixed` - `base_lr` throughout
/// * `Step` - `base_lr * gamma ^ (iter / stepsize)`
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LrPolicy {
    #[default]
    Fixed,
    Step,
}

/// Load a net config from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<NetConfig, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match extension.as_str() {
        "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
        "toml" => Ok(toml::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Load and validate a net config
///
/// Every validation failure is logged and returned, not just the first.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<NetConfig, ConfigError> {
    let cfg = load_config(path)?;

    if let Err(errors) = crate::config::validate_net_config(&cfg) {
        for error in &errors {
            ValidationIssue { error }.log();
        }
        ValidationFailed {
            error_count: errors.len(),
        }
        .log();
        return Err(ConfigError::Invalid(errors));
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
name: basic
layers:
  - name: data
    type: SyntheticData
    top: [data, label]
    data:
      batch_size: 8
      channels: 3
  - name: probe
    type: Input
    top: [probe]
    input:
      shape: [[1, 3]]
"#;

        let cfg: NetConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.name, "basic");
        assert_eq!(cfg.precision, Precision::F32);
        assert_eq!(cfg.device.mode, DeviceMode::Host);
        assert_eq!(cfg.layers.len(), 2);
        assert_eq!(cfg.layers[0].top, vec!["data", "label"]);
        assert!(cfg.solver.is_none());

        let data = cfg.layers[0].data.as_ref().unwrap();
        assert_eq!(data.prefetch, DEFAULT_PREFETCH_DEPTH);
        assert_eq!(data.classes, DEFAULT_CLASSES);
        assert_eq!(cfg.layers[1].input.as_ref().unwrap().shape, vec![vec![1, 3]]);
    }

    #[test]
    fn test_parse_layer_with_options() {
        let yaml = r#"
name: with_options
layers:
  - name: custom
    type: Custom
    options:
      mode: upper
      scale: 2.5
      enabled: true
"#;

        let cfg: NetConfig = serde_yaml::from_str(yaml).unwrap();
        let layer = &cfg.layers[0];

        assert_eq!(layer.options.len(), 3);
        assert!(layer.options.contains_key("mode"));
        assert!(layer.options.contains_key("scale"));
        assert!(layer.options.contains_key("enabled"));
    }

    #[test]
    fn test_solver_defaults() {
        let yaml = r#"
name: solver_defaults
layers: []
solver: {}
"#;

        let cfg: NetConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.solver, Some(SolverConfig::default()));
    }

    #[test]
    fn test_resolved_layers_inherit_net_defaults() {
        struct TestCase {
            name: &'static str,
            net_seed: Option<u64>,
            layer_seed: Option<u64>,
            layer_device: Option<DeviceMode>,
            expected_seed: u64,
            expected_device: DeviceMode,
        }

        let test_cases = vec![
            TestCase {
                name: "nothing set",
                net_seed: None,
                layer_seed: None,
                layer_device: None,
                expected_seed: DEFAULT_SEED,
                expected_device: DeviceMode::Mirrored,
            },
            TestCase {
                name: "net seed inherited",
                net_seed: Some(7),
                layer_seed: None,
                layer_device: None,
                expected_seed: 7,
                expected_device: DeviceMode::Mirrored,
            },
            TestCase {
                name: "layer overrides win",
                net_seed: Some(7),
                layer_seed: Some(99),
                layer_device: Some(DeviceMode::Host),
                expected_seed: 99,
                expected_device: DeviceMode::Host,
            },
        ];

        for test_case in test_cases {
            let mut data = DataParam::new(4, 2);
            data.seed = test_case.layer_seed;
            data.device = test_case.layer_device;

            let cfg = NetConfig {
                name: "net".to_string(),
                precision: Precision::F64,
                device: DeviceConfig {
                    mode: DeviceMode::Mirrored,
                },
                seed: test_case.net_seed,
                layers: vec![LayerConfig::new("data", "SyntheticData").with_data(data)],
                solver: None,
            };

            let resolved = cfg.resolved_layers();
            let data = resolved[0].data.as_ref().unwrap();
            assert_eq!(data.seed, Some(test_case.expected_seed), "Test case '{}'", test_case.name);
            assert_eq!(data.device, Some(test_case.expected_device), "Test case '{}'", test_case.name);
        }
    }

    #[test]
    fn test_resolved_layers_default_top_to_layer_name() {
        let yaml = r#"
name: net
layers:
  - name: data
    type: SyntheticData
    data:
      batch_size: 2
  - name: scores
    type: Input
    top: [a, b]
    input:
      shape: [[1]]
"#;
        let cfg: NetConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.layers[0].top.is_empty());

        let resolved = cfg.resolved_layers();
        assert_eq!(resolved[0].top, vec!["data"]);
        assert_eq!(resolved[1].top, vec!["a", "b"]);
    }

    #[test]
    fn test_load_yaml_and_toml_agree() {
        let yaml = write_temp(
            ".yaml",
            r#"
name: twin
precision: f64
seed: 3
layers:
  - name: data
    type: SyntheticData
    top: [data]
    data:
      batch_size: 2
"#,
        );
        let toml = write_temp(
            ".toml",
            r#"
name = "twin"
precision = "f64"
seed = 3

[[layers]]
name = "data"
type = "SyntheticData"
top = ["data"]

[layers.data]
batch_size = 2
"#,
        );

        let from_yaml = load_config(yaml.path()).unwrap();
        let from_toml = load_config(toml.path()).unwrap();
        assert_eq!(from_yaml, from_toml);
        assert_eq!(from_toml.precision, Precision::F64);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = write_temp(".json", "{}");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = load_config("does/not/exist.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_and_validate_unresolved_bottom() {
        let file = write_temp(
            ".yaml",
            r#"
name: dangling
layers:
  - name: consumer
    type: Input
    bottom: [nonexistent]
    input:
      shape: [[1]]
"#,
        );

        let result = load_and_validate_config(file.path());
        let error_msg = result.unwrap_err().to_string();
        assert!(error_msg.contains("Configuration validation failed"));
        assert!(error_msg.contains("consumes 'nonexistent' which no earlier layer produces"));
    }
}
