// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod batch;
mod blob;
pub mod device;
pub mod handoff_queue;
mod net;
pub mod prefetcher;
#[cfg(test)]
mod integration_tests;

pub use batch::Batch;
pub use blob::Blob;
pub use device::{DeviceFactory, HostOnly, MirroredDevice};
pub use handoff_queue::HandoffQueue;
pub use net::Net;
pub use prefetcher::{BufferAccounting, PipelineState, PrefetchConfig, Prefetcher, StagedBatch};
