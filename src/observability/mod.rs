// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic and operational logging in the crate goes through message types
//! defined here. Each message is a small struct with a `Display` implementation and a
//! [`StructuredLog`](messages::StructuredLog) implementation that emits a `tracing` event
//! carrying the same data as fields. This keeps log wording in one place and keeps the
//! fields stable for anything consuming the logs downstream.
//!
//! # Usage
//!
//! ```rust
//! use the_stagehand::observability::messages::pipeline::StopRequested;
//! use the_stagehand::observability::messages::StructuredLog;
//!
//! StopRequested { pipeline: "train_data" }.log();
//! ```

pub mod messages;
