// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // net config loading + validation
pub mod engine;     // blobs, handoff queues, prefetcher, net
pub mod errors;     // error handling
pub mod layers;     // built-in layers
pub mod observability;
pub mod registry;   // per-element type registries
pub mod solvers;    // built-in solvers
pub mod traits;     // unified abstractions
