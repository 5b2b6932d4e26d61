// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! csv crate adapters and one-shot entry points.

use std::io;

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::{BoxError, Error, Result};
use crate::io::{Position, Reader, Writer};
use crate::value::Record;

/// [`Reader`] over a `csv::Reader` that keeps the last record for positions.
///
/// Build the inner reader with `has_headers(false)`: the header row is read
/// by the decoder like any other row.
#[derive(Debug)]
pub struct CsvReader<R> {
    inner: csv::Reader<R>,
    record: csv::StringRecord,
}

impl<R: io::Read> CsvReader<R> {
    pub fn new(inner: csv::Reader<R>) -> Self {
        Self {
            inner,
            record: csv::StringRecord::new(),
        }
    }

    /// Reader with default settings, no header handling and flexible row
    /// lengths so count mismatches surface as [`Error::FieldCount`].
    pub fn from_reader(rdr: R) -> Self {
        Self::new(
            csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(rdr),
        )
    }

    pub fn get_ref(&self) -> &csv::Reader<R> {
        &self.inner
    }

    pub fn into_inner(self) -> csv::Reader<R> {
        self.inner
    }
}

impl<R: io::Read> Reader for CsvReader<R> {
    fn read(&mut self) -> std::result::Result<Option<Vec<String>>, BoxError> {
        if !self.inner.read_record(&mut self.record)? {
            return Ok(None);
        }
        Ok(Some(self.record.iter().map(str::to_string).collect()))
    }

    fn field_pos(&self, index: usize) -> Option<Position> {
        let pos = self.record.position()?;
        let range = self.record.range(index)?;
        // unquoted field data plus one separator per preceding field
        Some(Position {
            line: pos.line(),
            column: (range.start + index) as u64 + 1,
        })
    }
}

/// Plain `csv::Reader`, without field positions.
impl<R: io::Read> Reader for csv::Reader<R> {
    fn read(&mut self) -> std::result::Result<Option<Vec<String>>, BoxError> {
        let mut record = csv::StringRecord::new();
        if !self.read_record(&mut record)? {
            return Ok(None);
        }
        Ok(Some(record.iter().map(str::to_string).collect()))
    }
}

impl<W: io::Write> Writer for csv::Writer<W> {
    fn write(&mut self, row: &[String]) -> std::result::Result<(), BoxError> {
        self.write_record(row)?;
        Ok(())
    }
}

/// Encode `values` as CSV text, header first.
///
/// The header is written even when `values` is empty.
pub fn marshal<T: Record>(values: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    Encoder::new(&mut writer).encode_all(values)?;
    writer.flush().map_err(|e| Error::Write(Box::new(e)))?;
    writer
        .into_inner()
        .map_err(|e| Error::Write(Box::new(e.into_error())))
}

/// Decode CSV text whose first row is the header.
///
/// Empty input yields an empty vector.
pub fn unmarshal<T: Record + Default>(data: &[u8]) -> Result<Vec<T>> {
    let mut decoder = match Decoder::new(CsvReader::from_reader(data)) {
        Ok(decoder) => decoder,
        Err(Error::Eof) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut out = Vec::new();
    decoder.decode_all(&mut out)?;
    Ok(out)
}
