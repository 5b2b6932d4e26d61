// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record to row encoding.
//!
//! An [`Encoder`] writes one header row followed by one row per record:
//!
//! ```text
//! NoHeader --encode / encode_header--> HeaderWritten
//! ```
//!
//! Each cell is produced by the first strategy that applies:
//!
//! 1. `omitempty` column holding a zero value: empty text
//! 2. registered function for the exact type, then registered capabilities
//! 3. optional: empty text when absent, else the inner value
//! 4. [`Marshaler`](crate::Marshaler), then [`TextMarshaler`](crate::TextMarshaler)
//! 5. built-in primitive rule
//!
//! The writer is never flushed by the encoder.

use std::any::TypeId;
use std::sync::Arc;

use crate::config::EncoderConfig;
use crate::dispatch::Marshalers;
use crate::error::{BoxError, Error, MarshalerError, Result, Strategy};
use crate::io::Writer;
use crate::schema::{Column, Schema, SchemaCache, TypeInfo};
use crate::value::{Record, Value};

/// Output layout for one record type.
#[derive(Debug)]
struct Plan {
    type_id: TypeId,
    schema: Arc<Schema>,
    /// Per output column, the schema column it shows (None = always empty).
    columns: Vec<Option<usize>>,
    header: Vec<String>,
}

/// Writes records as rows.
pub struct Encoder<W: Writer> {
    writer: W,
    config: EncoderConfig,
    marshalers: Marshalers,
    cache: Arc<SchemaCache>,
    header_override: Option<Vec<String>>,
    header_written: bool,
    rows_written: u64,
    plan: Option<Plan>,
}

impl<W: Writer> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, EncoderConfig::default())
    }

    pub fn with_config(writer: W, config: EncoderConfig) -> Self {
        Self {
            writer,
            config,
            marshalers: Marshalers::default(),
            cache: SchemaCache::global(),
            header_override: None,
            header_written: false,
            rows_written: 0,
            plan: None,
        }
    }

    /// Annotation key read from record fields (default `csv`).
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.config.tag = tag.into();
        self.plan = None;
        self
    }

    /// Write the header automatically before the first record (default on).
    #[must_use]
    pub fn auto_header(mut self, enabled: bool) -> Self {
        self.config.auto_header = enabled;
        self
    }

    #[must_use]
    pub fn with_marshalers(mut self, marshalers: Marshalers) -> Self {
        self.marshalers = marshalers;
        self
    }

    /// Resolve schemas through `cache` instead of the process-wide one.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.cache = cache;
        self.plan = None;
        self
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Replace the header with `header`: schema columns are written in that
    /// order, unknown names as empty cells, and unlisted columns are skipped.
    ///
    /// Has no effect once anything was written.
    pub fn set_header(&mut self, header: Vec<String>) {
        if self.header_written || self.rows_written > 0 {
            log::debug!("[rowmap::encode] set_header after first write ignored");
            return;
        }
        self.header_override = Some(header);
        self.plan = None;
    }

    /// Write the header of record type `T`.
    pub fn encode_header<T: Record>(&mut self) -> Result<()> {
        if self.header_written {
            return Err(Error::HeaderWritten);
        }
        self.plan_for(&T::type_info())?;
        self.write_header()
    }

    /// Encode one record, writing the header first when due.
    pub fn encode<T: Record>(&mut self, value: &T) -> Result<()> {
        self.plan_for(&T::type_info())?;
        if !self.header_written && self.config.auto_header {
            self.write_header()?;
        }
        self.write_record(value)
    }

    /// Encode every record of `values` in order.
    ///
    /// With auto-header on, the header is written even when `values` is empty.
    pub fn encode_all<T: Record>(&mut self, values: &[T]) -> Result<()> {
        self.plan_for(&T::type_info())?;
        if !self.header_written && self.config.auto_header {
            self.write_header()?;
        }
        for value in values {
            self.write_record(value)?;
        }
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn plan_for(&mut self, info: &TypeInfo) -> Result<()> {
        if self.plan.as_ref().is_some_and(|p| p.type_id == info.id) {
            return Ok(());
        }

        let schema = self.cache.get_or_resolve(info, &self.config.tag)?;
        let (columns, header) = match &self.header_override {
            Some(names) => (
                names.iter().map(|n| schema.position(n)).collect(),
                names.clone(),
            ),
            None => ((0..schema.len()).map(Some).collect(), schema.names()),
        };
        self.plan = Some(Plan {
            type_id: info.id,
            schema,
            columns,
            header,
        });
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        let Some(plan) = &self.plan else {
            return Ok(());
        };
        self.writer.write(&plan.header).map_err(Error::Write)?;
        self.header_written = true;
        log::debug!(
            "[rowmap::encode] header written for {}: {} column(s)",
            plan.schema.type_name(),
            plan.header.len()
        );
        Ok(())
    }

    fn write_record(&mut self, value: &dyn Record) -> Result<()> {
        let Some(plan) = &self.plan else {
            return Ok(());
        };

        let mut row = Vec::with_capacity(plan.columns.len());
        for slot in &plan.columns {
            let text = match slot.and_then(|i| plan.schema.column(i)) {
                Some(column) => encode_column(&self.marshalers, column, value)?,
                None => String::new(),
            };
            row.push(text);
        }

        self.writer.write(&row).map_err(Error::Write)?;
        self.rows_written += 1;
        Ok(())
    }
}

impl<W: Writer + std::fmt::Debug> std::fmt::Debug for Encoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("writer", &self.writer)
            .field("config", &self.config)
            .field("header_written", &self.header_written)
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}

fn encode_column(marshalers: &Marshalers, column: &Column, record: &dyn Record) -> Result<String> {
    let Some(value) = column.get(record) else {
        log::debug!("[rowmap::encode] no value at path {:?}", column.path());
        return Ok(String::new());
    };
    if column.options().omit_empty && value.is_zero() {
        return Ok(String::new());
    }
    encode_value(marshalers, value, column.name())
}

fn encode_value(marshalers: &Marshalers, value: &dyn Value, field: &str) -> Result<String> {
    let wrap = |via: Strategy, source: BoxError| {
        Error::Marshal(MarshalerError {
            field: field.to_string(),
            type_name: value.type_name(),
            via,
            source,
        })
    };
    let utf8 = |bytes: Vec<u8>| String::from_utf8(bytes).map_err(|e| Box::new(e) as BoxError);

    if let Some((via, result)) = marshalers.marshal(value) {
        return result.and_then(utf8).map_err(|e| wrap(via, e));
    }
    if let Some(present) = value.optional() {
        return match present {
            Some(inner) => encode_value(marshalers, inner, field),
            None => Ok(String::new()),
        };
    }
    if let Some(result) = value.marshal_csv() {
        return result
            .and_then(utf8)
            .map_err(|e| wrap(Strategy::Marshaler, e));
    }
    if let Some(result) = value.marshal_text() {
        return result.map_err(|e| wrap(Strategy::TextMarshaler, e));
    }
    value.encode_builtin().ok_or(Error::UnsupportedType {
        type_name: value.type_name(),
    })
}
