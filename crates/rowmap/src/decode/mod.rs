// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Row to record decoding.
//!
//! A [`Decoder`] owns the header (read from the stream or given up front) and
//! maps each header position to a schema column the first time a record type
//! is decoded. Every mapped cell then goes through:
//!
//! 1. the normalization hook, if any
//! 2. empty text: optional fields become absent, `omitempty` fields are left alone
//! 3. registered function for the exact type, then registered capabilities
//! 4. optional: decode into the (allocated) inner value
//! 5. [`Unmarshaler`](crate::Unmarshaler), then [`TextUnmarshaler`](crate::TextUnmarshaler)
//! 6. built-in primitive rule (case-insensitive `NaN`, base64 bytes, ...)

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::DecoderConfig;
use crate::dispatch::Unmarshalers;
use crate::error::{BoxError, DecodeError, Error, MissingColumnsError, Result};
use crate::io::Reader;
use crate::schema::{Column, Schema, SchemaCache, TypeInfo};
use crate::value::{Record, Value};

/// Normalization hook: `(text, column, zero value of the field type) -> text`.
pub type MapFn = Box<dyn Fn(&str, &str, &dyn Any) -> String + Send + Sync>;

/// Header-to-schema mapping for one record type.
#[derive(Debug)]
struct Plan {
    type_id: TypeId,
    schema: Arc<Schema>,
    /// Per header position, the schema column it feeds.
    mapping: Vec<Option<usize>>,
    unused: Vec<usize>,
}

/// Why a single cell could not be stored.
enum CellError {
    Unsupported(&'static str),
    Convert(BoxError),
}

/// Reads rows and decodes them into records.
pub struct Decoder<R: Reader> {
    reader: R,
    config: DecoderConfig,
    unmarshalers: Unmarshalers,
    cache: Arc<SchemaCache>,
    map: Option<MapFn>,
    header: Vec<String>,
    record: Vec<String>,
    unused: Vec<usize>,
    started: bool,
    plan: Option<Arc<Plan>>,
}

impl<R: Reader> Decoder<R> {
    /// Decoder whose header is the first row of `reader`.
    ///
    /// Fails with [`Error::Eof`] when the reader holds no row at all.
    pub fn new(mut reader: R) -> Result<Self> {
        let header = reader.read().map_err(Error::Read)?.ok_or(Error::Eof)?;
        log::debug!("[rowmap::decode] header read: {} column(s)", header.len());
        Ok(Self::build(reader, header))
    }

    /// Decoder with an explicit header; every row of `reader` is data.
    ///
    /// An empty `header` falls back to reading it from `reader`.
    pub fn with_header(reader: R, header: Vec<String>) -> Result<Self> {
        if header.is_empty() {
            return Self::new(reader);
        }
        Ok(Self::build(reader, header))
    }

    fn build(reader: R, header: Vec<String>) -> Self {
        Self {
            reader,
            config: DecoderConfig::default(),
            unmarshalers: Unmarshalers::default(),
            cache: SchemaCache::global(),
            map: None,
            header,
            record: Vec::new(),
            unused: Vec::new(),
            started: false,
            plan: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self.plan = None;
        self
    }

    /// Annotation key read from record fields (default `csv`).
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.config.tag = tag.into();
        self.plan = None;
        self
    }

    /// Fail before the first record when a schema column is not in the header.
    #[must_use]
    pub fn disallow_missing_columns(mut self, enabled: bool) -> Self {
        self.config.disallow_missing_columns = enabled;
        self.plan = None;
        self
    }

    /// Install a normalization hook run on every mapped cell before conversion.
    ///
    /// The hook receives the raw text, the column name and a zero value of
    /// the field type; returning the text unchanged means "no normalization".
    #[must_use]
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str, &dyn Any) -> String + Send + Sync + 'static,
    {
        self.map = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_unmarshalers(mut self, unmarshalers: Unmarshalers) -> Self {
        self.unmarshalers = unmarshalers;
        self
    }

    /// Resolve schemas through `cache` instead of the process-wide one.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.cache = cache;
        self.plan = None;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Last row read. Valid until the next decode call.
    pub fn record(&self) -> &[String] {
        &self.record
    }

    /// Header positions not mapped to any field by the most recent decode.
    pub fn unused(&self) -> &[usize] {
        &self.unused
    }

    /// Rename every header column with `f`.
    ///
    /// Only allowed before the first decode. Fails when two columns end up
    /// with the same name; the header is left unchanged in that case.
    pub fn normalize_header<F>(&mut self, f: F) -> Result<()>
    where
        F: Fn(&str) -> String,
    {
        if self.started {
            return Err(Error::HeaderFrozen);
        }
        let mut seen = HashSet::with_capacity(self.header.len());
        let mut header = Vec::with_capacity(self.header.len());
        for name in &self.header {
            let renamed = f(name);
            if !seen.insert(renamed.clone()) {
                return Err(Error::DuplicateColumn(renamed));
            }
            header.push(renamed);
        }
        self.header = header;
        self.plan = None;
        Ok(())
    }

    /// Decode the next row into `value`.
    ///
    /// Fields without a header column are left untouched. Returns
    /// [`Error::Eof`] once the reader is exhausted.
    pub fn decode<T: Record>(&mut self, value: &mut T) -> Result<()> {
        let plan = self.plan_for(&T::type_info())?;
        self.decode_row(&plan, value)
    }

    /// Replace the contents of `out` with every remaining row.
    pub fn decode_all<T: Record + Default>(&mut self, out: &mut Vec<T>) -> Result<()> {
        out.clear();
        loop {
            let mut value = T::default();
            match self.decode(&mut value) {
                Ok(()) => out.push(value),
                Err(Error::Eof) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    /// Decode rows into successive slots of `out`, stopping when it is full.
    ///
    /// Slots after the last decoded row are reset to `T::default()`. Returns
    /// the number of decoded rows, or [`Error::Eof`] if there was none.
    pub fn decode_slice<T: Record + Default>(&mut self, out: &mut [T]) -> Result<usize> {
        let mut decoded = 0;
        for slot in out.iter_mut() {
            match self.decode(slot) {
                Ok(()) => decoded += 1,
                Err(Error::Eof) => break,
                Err(e) => return Err(e),
            }
        }
        if decoded == 0 && !out.is_empty() {
            return Err(Error::Eof);
        }
        for slot in &mut out[decoded..] {
            *slot = T::default();
        }
        Ok(decoded)
    }

    /// Iterate over the remaining rows as `T` values.
    pub fn records<T: Record + Default>(&mut self) -> Records<'_, R, T> {
        Records {
            decoder: self,
            done: false,
            _marker: PhantomData,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn plan_for(&mut self, info: &TypeInfo) -> Result<Arc<Plan>> {
        if let Some(plan) = self.plan.as_ref().filter(|p| p.type_id == info.id) {
            return Ok(Arc::clone(plan));
        }

        let schema = self.cache.get_or_resolve(info, &self.config.tag)?;
        let mut mapping = vec![None; self.header.len()];
        let mut unused = Vec::new();
        let mut matched = HashSet::new();
        for (i, name) in self.header.iter().enumerate() {
            match schema.position(name) {
                // later duplicates of a header name stay unmapped
                Some(column) if matched.insert(column) => mapping[i] = Some(column),
                _ => unused.push(i),
            }
        }

        if self.config.disallow_missing_columns {
            let missing: Vec<String> = schema
                .columns()
                .iter()
                .enumerate()
                .filter(|(i, _)| !matched.contains(i))
                .map(|(_, c)| c.name().to_string())
                .collect();
            if !missing.is_empty() {
                return Err(MissingColumnsError { columns: missing }.into());
            }
        }

        log::debug!(
            "[rowmap::decode] {} mapped to header: {} of {} column(s) used",
            schema.type_name(),
            self.header.len() - unused.len(),
            self.header.len()
        );
        let plan = Arc::new(Plan {
            type_id: info.id,
            schema,
            mapping,
            unused,
        });
        self.plan = Some(Arc::clone(&plan));
        self.started = true;
        Ok(plan)
    }

    fn decode_row(&mut self, plan: &Plan, value: &mut dyn Record) -> Result<()> {
        let row = self.reader.read().map_err(Error::Read)?.ok_or(Error::Eof)?;
        self.record = row;
        self.unused.clone_from(&plan.unused);

        if self.record.len() != self.header.len() {
            return Err(Error::FieldCount {
                expected: self.header.len(),
                got: self.record.len(),
            });
        }

        for (i, slot) in plan.mapping.iter().enumerate() {
            let Some(column) = slot.and_then(|c| plan.schema.column(c)) else {
                continue;
            };
            let Some(field) = column.get_mut(value) else {
                log::debug!("[rowmap::decode] no field at path {:?}", column.path());
                continue;
            };

            let raw = self.record[i].as_str();
            let mapped;
            let text = match &self.map {
                Some(map) => {
                    let zero = zero_value(column.type_info());
                    mapped = map(raw, &self.header[i], zero.as_ref());
                    mapped.as_str()
                }
                None => raw,
            };

            match decode_cell(&self.unmarshalers, column, field, text) {
                Ok(()) => {}
                Err(CellError::Unsupported(type_name)) => {
                    return Err(Error::UnsupportedType { type_name })
                }
                Err(CellError::Convert(source)) => {
                    let pos = self.reader.field_pos(i);
                    return Err(DecodeError {
                        field: column.name().to_string(),
                        line: pos.map(|p| p.line),
                        column: pos.map(|p| p.column),
                        source,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

impl<R: Reader + std::fmt::Debug> std::fmt::Debug for Decoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("reader", &self.reader)
            .field("config", &self.config)
            .field("header", &self.header)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

/// Zero value handed to the normalization hook; `()` for types without one.
fn zero_value(info: &TypeInfo) -> Box<dyn Any> {
    match info.zero {
        Some(zero) => zero(),
        None => Box::new(()),
    }
}

fn decode_cell(
    unmarshalers: &Unmarshalers,
    column: &Column,
    field: &mut dyn Value,
    text: &str,
) -> std::result::Result<(), CellError> {
    if text.is_empty() {
        if field.clear() {
            return Ok(());
        }
        if column.options().omit_empty {
            return Ok(());
        }
    }
    decode_value(unmarshalers, field, text)
}

fn decode_value(
    unmarshalers: &Unmarshalers,
    field: &mut dyn Value,
    text: &str,
) -> std::result::Result<(), CellError> {
    if let Some(result) = unmarshalers.unmarshal(text.as_bytes(), field) {
        return result.map_err(CellError::Convert);
    }
    let type_name = field.type_name();
    if let Some(inner) = field.present_mut() {
        return decode_value(unmarshalers, inner, text);
    }
    if let Some(result) = field.unmarshal_csv(text.as_bytes()) {
        return result.map_err(CellError::Convert);
    }
    if let Some(result) = field.unmarshal_text(text) {
        return result.map_err(CellError::Convert);
    }
    match field.decode_builtin(text) {
        Some(result) => result.map_err(|e| CellError::Convert(Box::new(e))),
        None => Err(CellError::Unsupported(type_name)),
    }
}

/// Iterator returned by [`Decoder::records`].
///
/// Yields one `Result` per row and ends at end-of-stream, after a read
/// failure, or after a schema or missing-column error. Conversion and
/// field-count errors do not end the iteration.
pub struct Records<'a, R: Reader, T> {
    decoder: &'a mut Decoder<R>,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<R: Reader, T: Record + Default> Iterator for Records<'_, R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        // schema and header problems repeat on every call
        let plan = match self.decoder.plan_for(&T::type_info()) {
            Ok(plan) => plan,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let mut value = T::default();
        match self.decoder.decode_row(&plan, &mut value) {
            Ok(()) => Some(Ok(value)),
            Err(Error::Eof) => {
                self.done = true;
                None
            }
            Err(e @ Error::Read(_)) => {
                self.done = true;
                Some(Err(e))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
