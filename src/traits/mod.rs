// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod device;
pub mod element;
pub mod layer;
pub mod loader;
pub mod solver;

pub use device::{DeviceTransfer, TransferOutcome};
pub use element::Element;
pub use layer::{boxed_layer, check_bottom_count, check_top_count, Layer};
pub use loader::{loader_fn, BatchLoader, FnLoader};
pub use solver::{boxed_solver, Solver, SolverStats};
