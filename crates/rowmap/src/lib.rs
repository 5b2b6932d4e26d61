// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # rowmap - typed records over tabular text
//!
//! Bidirectional mapping between rows of text fields (CSV and friends) and
//! plain Rust structs. Column names, ordering and options come from field
//! annotations; conversions come from the field types themselves, from
//! user-registered functions, or from built-in rules.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rowmap::{Decoder, Encoder, Record, Result, RowReader};
//!
//! #[derive(Record, Default)]
//! pub struct User {
//!     #[csv = "name"]
//!     pub name: String,
//!     #[csv = "age,omitempty"]
//!     pub age: u32,
//! }
//!
//! fn main() -> Result<()> {
//!     let mut enc = Encoder::new(Vec::<Vec<String>>::new());
//!     enc.encode(&User { name: "alice".into(), age: 0 })?;
//!     // [["name", "age"], ["alice", ""]]
//!
//!     let mut dec = Decoder::new(RowReader::new(enc.into_inner()))?;
//!     let mut users = Vec::new();
//!     dec.decode_all::<User>(&mut users)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |            Encoder  /  Decoder  (header, rows, hooks)         |
//! +-------------------------------+-------------------------------+
//! |  SchemaCache -> resolve()     |  Marshalers / Unmarshalers    |
//! |  (Shape -> flat Column list)  |  (registered conversions)     |
//! +-------------------------------+-------------------------------+
//! |        Value / Record  (derive-generated type shapes)         |
//! +---------------------------------------------------------------+
//! |        Reader / Writer  (RowReader, csv::Reader / Writer)     |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Encoder`] | Writes a header and one row per record |
//! | [`Decoder`] | Maps a header onto a record type and fills records from rows |
//! | [`schema::Schema`] | Flat, ordered column list of one record type |
//! | [`schema::SchemaCache`] | Memoized schemas keyed by type and annotation key |
//! | [`Marshalers`] / [`Unmarshalers`] | Registered conversion functions |
//! | [`Dynamic`] | Field holding any primitive, typed on first assignment |
//!
//! ## Features
//!
//! - **`csv`** (default): `Reader`/`Writer` for the csv crate, [`marshal`] and [`unmarshal`]
//! - **`chrono`** (default): date and time field types
//! - **`serde`**: (de)serializable [`EncoderConfig`] / [`DecoderConfig`]

// Allow the derive macros to work inside this crate's tests
extern crate self as rowmap;

/// Registered conversion functions and capabilities.
pub mod dispatch;
/// Row-level Reader/Writer boundary.
pub mod io;
/// Type shapes, column resolution and the schema cache.
pub mod schema;

mod config;
#[cfg(feature = "csv")]
mod csv_support;
mod decode;
mod encode;
mod error;
mod value;

pub use rowmap_codegen::{Record, Value};

pub use config::{DecoderConfig, EncoderConfig};
pub use decode::{Decoder, MapFn, Records};
pub use dispatch::{
    marshal_capability, marshal_func, unmarshal_capability, unmarshal_func, Capability,
    Marshalers, Unmarshalers,
};
pub use encode::Encoder;
pub use error::{
    BoxError, DecodeError, Error, MarshalerError, MissingColumnsError, Result, Strategy,
    UnmarshalTypeError,
};
pub use io::{Position, Reader, RowReader, Writer};
pub use value::{
    AsAny, Dynamic, Marshaler, Record, TextMarshaler, TextUnmarshaler, Unmarshaler, Value,
};

#[cfg(feature = "csv")]
pub use csv_support::{marshal, unmarshal, CsvReader};

/// Column names of `T` under annotation key `key`, in header order.
///
/// Resolved through the process-wide [`schema::SchemaCache`].
pub fn header<T: Record>(key: &str) -> Result<Vec<String>> {
    Ok(schema::SchemaCache::global().schema::<T>(key)?.names())
}
