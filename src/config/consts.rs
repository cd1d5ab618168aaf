/// Number of batch slots a data layer prefetches when its config does not say
pub const DEFAULT_PREFETCH_DEPTH: usize = 4;
/// Values per record when a data layer does not say
pub const DEFAULT_CHANNELS: usize = 1;
/// Label classes drawn by the synthetic data layer
pub const DEFAULT_CLASSES: usize = 10;
/// Seed used when neither the layer nor the net sets one
pub const DEFAULT_SEED: u64 = 1701;

/// Solver registered under this name when the config omits `type`
pub const DEFAULT_SOLVER_TYPE: &str = "SGD";
pub const DEFAULT_BASE_LR: f64 = 0.01;
pub const DEFAULT_GAMMA: f64 = 0.1;
pub const DEFAULT_MAX_ITER: usize = 100;

/// Built-in layer types that pull batches through a prefetch pipeline
pub const DATA_LAYER_TYPES: &[&str] = &["SyntheticData", "RecordData"];
/// Built-in layer type holding caller-assigned blobs
pub const INPUT_LAYER_TYPE: &str = "Input";
