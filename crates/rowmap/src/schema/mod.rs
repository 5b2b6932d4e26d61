// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static type shapes and resolved column schemas.
//!
//! `#[derive(Record)]` emits a [`Shape`] for every composite type: the ordered
//! list of declared fields with their annotations and a [`TypeInfo`] getter.
//! The resolver flattens a shape into a [`Schema`] for one annotation key, and
//! [`SchemaCache`] memoizes that result per `(type, key)`.
//!
//! ```text
//! #[derive(Record)] --> Shape --resolve(key)--> Schema --> Encoder / Decoder
//!                                   ^
//!                              SchemaCache
//! ```

mod cache;
mod resolver;
mod tag;

pub use cache::{LookupStats, SchemaCache};
pub use resolver::resolve;
pub use tag::Tag;

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::value::{Record, Value};

/// Annotation key used when none is configured.
pub const DEFAULT_TAG: &str = "csv";

/// Element type classification of a field.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    /// Byte sequence, base64 in text form.
    Bytes,
    Time,
    /// User type converted through capabilities or registered functions.
    Custom,
    /// Pointer-like optional wrapping another value type.
    Optional(fn() -> TypeInfo),
    /// Generic value whose concrete variant is decided at runtime.
    Dynamic,
    /// Composite record type.
    Record(fn() -> &'static Shape),
}

impl Kind {
    /// Short label used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Time => "time",
            Kind::Custom => "custom",
            Kind::Optional(_) => "optional",
            Kind::Dynamic => "dynamic",
            Kind::Record(_) => "record",
        }
    }
}

/// Runtime description of a value type.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
    pub kind: Kind,
    /// Builds the zero value handed to normalization hooks.
    pub zero: Option<fn() -> Box<dyn Any>>,
}

fn boxed_default<T: Default + Any>() -> Box<dyn Any> {
    Box::new(T::default())
}

impl TypeInfo {
    /// Describe a leaf value type whose zero value is `T::default()`.
    pub fn new<T: Value + Default>(kind: Kind) -> Self {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
            kind,
            zero: Some(boxed_default::<T>),
        }
    }

    /// Describe a composite record type.
    pub fn record<T: Record>() -> Self {
        Self {
            name: T::shape().name,
            id: TypeId::of::<T>(),
            kind: Kind::Record(T::shape),
            zero: None,
        }
    }

    /// Describe `Option<T>`; its zero value is the zero value of `T`.
    pub fn optional<T: Value>() -> Self {
        let inner = T::type_info();
        Self {
            name: std::any::type_name::<Option<T>>(),
            id: TypeId::of::<Option<T>>(),
            kind: Kind::Optional(T::type_info),
            zero: inner.zero,
        }
    }

    /// Override the zero value factory.
    #[must_use]
    pub fn with_zero(mut self, zero: fn() -> Box<dyn Any>) -> Self {
        self.zero = Some(zero);
        self
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, Kind::Record(_))
    }
}

/// Declared shape of a composite type (generated by `#[derive(Record)]`).
#[derive(Debug)]
pub struct Shape {
    pub name: &'static str,
    pub fields: &'static [FieldShape],
}

/// One declared field of a composite type.
#[derive(Debug)]
pub struct FieldShape {
    pub name: &'static str,
    /// Declaration index, the unit of access paths.
    pub index: usize,
    /// `pub` fields only; other fields are invisible to the resolver.
    pub exported: bool,
    /// `(annotation key, annotation)` pairs.
    pub tags: &'static [(&'static str, &'static str)],
    pub ty: fn() -> TypeInfo,
}

impl FieldShape {
    /// Raw annotation for `key`, if the field carries one.
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find_map(|(k, v)| (*k == key).then_some(*v))
    }
}

/// Options attached to a resolved column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnOptions {
    pub omit_empty: bool,
    /// Accumulated prefix of the inline fields this column was reached through.
    pub inline_prefix: Option<String>,
}

/// Resolved column descriptor. Immutable once built.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    path: Vec<usize>,
    ty: TypeInfo,
    options: ColumnOptions,
    tagged: bool,
}

impl Column {
    pub(crate) fn new(
        name: String,
        path: Vec<usize>,
        ty: TypeInfo,
        options: ColumnOptions,
        tagged: bool,
    ) -> Self {
        Self {
            name,
            path,
            ty,
            options,
            tagged,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field indices from the record root down to this column's value.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.ty
    }

    pub fn options(&self) -> &ColumnOptions {
        &self.options
    }

    /// True when the name came from an annotation rather than the field name.
    pub fn is_tagged(&self) -> bool {
        self.tagged
    }

    /// Nesting depth (1 for a field declared on the root record).
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Fetch this column's value out of `record`.
    pub fn get<'a>(&self, record: &'a dyn Record) -> Option<&'a dyn Value> {
        let (first, rest) = self.path.split_first()?;
        let mut current = record.field(*first)?;
        for index in rest {
            current = current.as_record()?.field(*index)?;
        }
        Some(current)
    }

    /// Mutable counterpart of [`Column::get`].
    pub fn get_mut<'a>(&self, record: &'a mut dyn Record) -> Option<&'a mut dyn Value> {
        let (first, rest) = self.path.split_first()?;
        let mut current = record.field_mut(*first)?;
        for index in rest {
            current = current.as_record_mut()?.field_mut(*index)?;
        }
        Some(current)
    }
}

/// Ordered column descriptors of one type under one annotation key.
///
/// Column names are unique.
#[derive(Debug, Clone)]
pub struct Schema {
    type_name: &'static str,
    columns: Vec<Column>,
    positions: HashMap<String, usize>,
}

impl Schema {
    pub(crate) fn new(type_name: &'static str, columns: Vec<Column>) -> Self {
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self {
            type_name,
            columns,
            positions,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Column names in schema order, i.e. the default header.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Index of the column called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
