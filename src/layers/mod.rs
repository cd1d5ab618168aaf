// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in layers.
//!
//! * `Input` - holds caller-assigned blobs
//! * `SyntheticData` - seeded random batches through a prefetch pipeline
//! * `RecordData` - file-backed batches through a prefetch pipeline
//!
//! Data layers share [`PrefetchingDataLayer`]; a new data layer only has to provide a
//! [`DataSource`].

mod base_data;
mod input;
mod record_data;
mod synthetic_data;

pub use base_data::{DataSource, PrefetchingDataLayer};
pub use input::InputLayer;
pub use record_data::{RecordDataLayer, RecordSource};
pub use synthetic_data::{SyntheticDataLayer, SyntheticSource};
