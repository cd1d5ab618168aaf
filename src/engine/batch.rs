// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::Blob;
use crate::traits::Element;

/// One staging slot of a prefetch pipeline.
///
/// Slots are allocated once when the pipeline starts and recycled for its whole life.
/// `id` identifies the slot; `sequence` is stamped by the worker each time the slot is
/// filled, so consumers can check ordering.
#[derive(Debug)]
pub struct Batch<T: Element> {
    pub id: usize,
    pub payload: Blob<T>,
    /// Present only when the pipeline outputs labels.
    pub label: Option<Blob<T>>,
    pub sequence: u64,
}

impl<T: Element> Batch<T> {
    pub fn new(id: usize, with_label: bool) -> Self {
        Self {
            id,
            payload: Blob::empty(),
            label: with_label.then(Blob::empty),
            sequence: 0,
        }
    }

    pub fn has_label(&self) -> bool {
        self.label.is_some()
    }
}
