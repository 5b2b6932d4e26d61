// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value access layer.
//!
//! Every field type implements [`Value`]; composite types additionally
//! implement [`Record`]. Both are object safe so the encoder and decoder walk
//! records through `&dyn Value` without knowing concrete types.
//!
//! # Conversion capabilities
//!
//! A type may convert itself through one of two capabilities, wired into
//! [`Value`] by `#[derive(Value)]`:
//!
//! | Capability | Traits | Priority |
//! |------------|--------|----------|
//! | self-describing | [`Marshaler`] / [`Unmarshaler`] | higher |
//! | generic text | [`TextMarshaler`] / [`TextUnmarshaler`] | lower |
//!
//! Both rank below registered functions (see [`crate::dispatch`]) and above
//! the built-in primitive rules.

mod builtin;
mod dynamic;
#[cfg(feature = "chrono")]
mod time;

pub use dynamic::Dynamic;

use std::any::Any;

use crate::error::{BoxError, UnmarshalTypeError};
use crate::schema::{Shape, TypeInfo};

/// Upcast helper implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A type that can appear as a record field.
///
/// Only [`Value::type_info`] is required; every other method defaults to
/// "not supported" and is overridden by the implementations that need it.
pub trait Value: AsAny {
    /// Static description of the type.
    fn type_info() -> TypeInfo
    where
        Self: Sized;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Zero/default/empty test used by `omitempty`.
    fn is_zero(&self) -> bool {
        false
    }

    fn as_record(&self) -> Option<&dyn Record> {
        None
    }

    fn as_record_mut(&mut self) -> Option<&mut dyn Record> {
        None
    }

    /// `Some(present)` for optional types, `None` for everything else.
    fn optional(&self) -> Option<Option<&dyn Value>> {
        None
    }

    /// Mark an optional value absent. Returns false for non-optional types.
    fn clear(&mut self) -> bool {
        false
    }

    /// Inner value of an optional, allocated with its default when absent.
    fn present_mut(&mut self) -> Option<&mut dyn Value> {
        None
    }

    /// Self-describing capability, encode side.
    fn marshal_csv(&self) -> Option<Result<Vec<u8>, BoxError>> {
        None
    }

    /// Self-describing capability, decode side.
    fn unmarshal_csv(&mut self, _data: &[u8]) -> Option<Result<(), BoxError>> {
        None
    }

    /// Generic text capability, encode side.
    fn marshal_text(&self) -> Option<Result<String, BoxError>> {
        None
    }

    /// Generic text capability, decode side.
    fn unmarshal_text(&mut self, _text: &str) -> Option<Result<(), BoxError>> {
        None
    }

    /// Built-in primitive encoding rule.
    fn encode_builtin(&self) -> Option<String> {
        None
    }

    /// Built-in primitive decoding rule.
    fn decode_builtin(&mut self, _text: &str) -> Option<Result<(), UnmarshalTypeError>> {
        None
    }
}

/// A composite type: an ordered set of named fields.
pub trait Record: Value {
    fn shape() -> &'static Shape
    where
        Self: Sized;

    /// Field at declaration `index`.
    fn field(&self, index: usize) -> Option<&dyn Value>;

    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Value>;
}

/// A type that encodes itself into one column.
pub trait Marshaler {
    fn marshal_csv(&self) -> Result<Vec<u8>, BoxError>;
}

/// A type that decodes itself from one column.
pub trait Unmarshaler {
    fn unmarshal_csv(&mut self, data: &[u8]) -> Result<(), BoxError>;
}

/// Generic text encoding, used when [`Marshaler`] is not implemented.
pub trait TextMarshaler {
    fn marshal_text(&self) -> Result<String, BoxError>;
}

/// Generic text decoding, used when [`Unmarshaler`] is not implemented.
pub trait TextUnmarshaler {
    fn unmarshal_text(&mut self, text: &str) -> Result<(), BoxError>;
}

impl<T: Value + Default> Value for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::optional::<T>()
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn optional(&self) -> Option<Option<&dyn Value>> {
        Some(self.as_ref().map(|v| v as &dyn Value))
    }

    fn clear(&mut self) -> bool {
        *self = None;
        true
    }

    fn present_mut(&mut self) -> Option<&mut dyn Value> {
        Some(self.get_or_insert_with(T::default))
    }
}
