// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Row-level stream boundary.
//!
//! The codec never splits or quotes text itself: a [`Reader`] hands it one
//! row of fields at a time and a [`Writer`] receives finished rows. With the
//! `csv` feature the csv crate provides both ends.

use std::collections::VecDeque;

use crate::error::BoxError;

/// 1-indexed location of a field in the underlying text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u64,
    pub column: u64,
}

/// Source of rows.
pub trait Reader {
    /// Next row, or `Ok(None)` once the stream is exhausted.
    fn read(&mut self) -> Result<Option<Vec<String>>, BoxError>;

    /// Position of field `index` of the last row read, when known.
    fn field_pos(&self, _index: usize) -> Option<Position> {
        None
    }
}

/// Sink of rows. Writers that buffer are flushed by their owner.
pub trait Writer {
    fn write(&mut self, row: &[String]) -> Result<(), BoxError>;
}

impl<R: Reader + ?Sized> Reader for &mut R {
    fn read(&mut self) -> Result<Option<Vec<String>>, BoxError> {
        (**self).read()
    }

    fn field_pos(&self, index: usize) -> Option<Position> {
        (**self).field_pos(index)
    }
}

impl<R: Reader + ?Sized> Reader for Box<R> {
    fn read(&mut self) -> Result<Option<Vec<String>>, BoxError> {
        (**self).read()
    }

    fn field_pos(&self, index: usize) -> Option<Position> {
        (**self).field_pos(index)
    }
}

impl<W: Writer + ?Sized> Writer for &mut W {
    fn write(&mut self, row: &[String]) -> Result<(), BoxError> {
        (**self).write(row)
    }
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    fn write(&mut self, row: &[String]) -> Result<(), BoxError> {
        (**self).write(row)
    }
}

/// In-memory rows collected verbatim.
impl Writer for Vec<Vec<String>> {
    fn write(&mut self, row: &[String]) -> Result<(), BoxError> {
        self.push(row.to_vec());
        Ok(())
    }
}

/// In-memory [`Reader`] over pre-split rows.
///
/// Positions assume one row per line, fields joined by a one-byte separator
/// and no quoting.
#[derive(Debug, Clone, Default)]
pub struct RowReader {
    rows: VecDeque<Vec<String>>,
    line: u64,
    last: Vec<String>,
}

impl RowReader {
    pub fn new<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
            line: 0,
            last: Vec::new(),
        }
    }

    /// Rows not read yet.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Reader for RowReader {
    fn read(&mut self) -> Result<Option<Vec<String>>, BoxError> {
        let Some(row) = self.rows.pop_front() else {
            return Ok(None);
        };
        self.line += 1;
        self.last.clone_from(&row);
        Ok(Some(row))
    }

    fn field_pos(&self, index: usize) -> Option<Position> {
        if self.line == 0 || index >= self.last.len() {
            return None;
        }
        let offset: usize = self.last[..index].iter().map(|f| f.len() + 1).sum();
        Some(Position {
            line: self.line,
            column: offset as u64 + 1,
        })
    }
}
