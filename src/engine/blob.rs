// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::traits::Element;

/// A shaped, contiguous n-dimensional array of elements.
///
/// The shape and the storage always agree: `count()` is the product of the shape and
/// the storage holds exactly that many elements. Reshaping keeps the existing
/// allocation when it is large enough, which lets recycled batch slots reuse memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob<T: Element> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: Element> Blob<T> {
    /// Zero-filled blob of the given shape.
    pub fn new(shape: &[usize]) -> Self {
        let mut blob = Self::empty();
        blob.reshape(shape);
        blob
    }

    /// Blob with no shape and no elements.
    pub fn empty() -> Self {
        Self {
            shape: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Change the shape. New elements are zero; surviving elements keep their values.
    pub fn reshape(&mut self, shape: &[usize]) {
        self.shape.clear();
        self.shape.extend_from_slice(shape);
        let count = if shape.is_empty() { 0 } else { shape.iter().product() };
        self.data.resize(count, T::default());
    }

    pub fn reshape_like(&mut self, other: &Blob<T>) {
        self.reshape(&other.shape);
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Copy shape and contents from `other`.
    pub fn copy_from(&mut self, other: &Blob<T>) {
        self.reshape_like(other);
        self.data.copy_from_slice(&other.data);
    }
}

impl<T: Element> Default for Blob<T> {
    fn default() -> Self {
        Self::empty()
    }
}
