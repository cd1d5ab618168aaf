// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::PathBuf;

use crate::config::DataParam;
use crate::engine::Batch;
use crate::errors::{LayerError, LoadError};
use crate::layers::{DataSource, PrefetchingDataLayer};
use crate::traits::{BatchLoader, Element};

/// Data layer reading records from a text file; registered as `RecordData`.
pub type RecordDataLayer<T> = PrefetchingDataLayer<T, RecordSource<T>>;

/// Reads one record per line, `label,v1,v2,...,vN` with `N == channels`.
///
/// Blank lines and lines starting with `#` are skipped. The file is read sequentially
/// and rewound at end of file, so a batch may span the wrap. A malformed record fails
/// the pipeline; it is never skipped.
pub struct RecordSource<T: Element> {
    path: PathBuf,
    batch_size: usize,
    channels: usize,
    reader: BufReader<File>,
    line_number: usize,
    records_this_pass: usize,
    line: String,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> DataSource<T> for RecordSource<T> {
    const TYPE_NAME: &'static str = "RecordData";

    fn from_config(layer: &str, data: &DataParam, _output_labels: bool) -> Result<Self, LayerError> {
        let path = data.source.clone().ok_or_else(|| LayerError::InvalidParam {
            layer: layer.to_string(),
            reason: "RecordData needs a 'source' file".to_string(),
        })?;
        let file = File::open(&path).map_err(|e| LayerError::InvalidParam {
            layer: layer.to_string(),
            reason: format!("cannot open {}: {}", path.display(), e),
        })?;

        Ok(Self {
            path,
            batch_size: data.batch_size,
            channels: data.channels,
            reader: BufReader::new(file),
            line_number: 0,
            records_this_pass: 0,
            line: String::new(),
            _element: PhantomData,
        })
    }
}

impl<T: Element> RecordSource<T> {
    fn io_error(&self, source: std::io::Error) -> LoadError {
        LoadError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn parse_error(&self, reason: String) -> LoadError {
        LoadError::Parse {
            path: self.path.clone(),
            line: self.line_number,
            reason,
        }
    }

    fn rewind(&mut self) -> Result<(), LoadError> {
        if self.records_this_pass == 0 {
            return Err(LoadError::EmptySource(self.path.clone()));
        }
        self.reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| self.io_error(e))?;
        self.line_number = 0;
        self.records_this_pass = 0;
        Ok(())
    }

    /// Read the next record into `values` and return its label.
    fn next_record(&mut self, values: &mut [T]) -> Result<T, LoadError> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| self.io_error(e))?;
            if read == 0 {
                self.rewind()?;
                continue;
            }
            self.line_number += 1;

            let record = self.line.trim();
            if record.is_empty() || record.starts_with('#') {
                continue;
            }

            let mut fields = record.split(',').map(str::trim);
            let label = fields.next().unwrap_or_default();
            let label = label
                .parse::<f64>()
                .map_err(|e| self.parse_error(format!("bad label '{label}': {e}")))?;

            let mut count = 0;
            for field in fields {
                let value = field
                    .parse::<f64>()
                    .map_err(|e| self.parse_error(format!("bad value '{field}': {e}")))?;
                if let Some(slot) = values.get_mut(count) {
                    *slot = T::from_f64(value);
                }
                count += 1;
            }
            if count != self.channels {
                return Err(LoadError::ShapeMismatch {
                    expected: self.channels,
                    actual: count,
                });
            }

            self.records_this_pass += 1;
            return Ok(T::from_f64(label));
        }
    }
}

impl<T: Element> BatchLoader<T> for RecordSource<T> {
    fn load_batch(&mut self, batch: &mut Batch<T>) -> Result<(), LoadError> {
        batch.payload.reshape(&[self.batch_size, self.channels]);
        if let Some(label) = batch.label.as_mut() {
            label.reshape(&[self.batch_size]);
        }

        for row in 0..self.batch_size {
            let start = row * self.channels;
            let values = &mut batch.payload.data_mut()[start..start + self.channels];
            let label = self.next_record(values)?;
            if let Some(labels) = batch.label.as_mut() {
                labels.data_mut()[row] = label;
            }
        }
        Ok(())
    }
}
