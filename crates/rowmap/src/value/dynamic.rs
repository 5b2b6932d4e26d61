// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic field value whose variant is decided at runtime.

use std::any::Any;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::builtin::{format_bool, format_float, parse_bool};
use super::Value;
use crate::error::UnmarshalTypeError;
use crate::schema::{Kind, TypeInfo};

/// Value of a generic ("any") field.
///
/// Encoding writes the held variant with the built-in rules. Decoding into
/// `Null` or `String` stores the raw text; any other variant parses the text
/// into that same variant, so a pre-populated record controls the target type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dynamic {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Dynamic {
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    /// Variant name, used in logs and conversion errors.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) => "i64",
            Dynamic::Uint(_) => "u64",
            Dynamic::Float(_) => "f64",
            Dynamic::String(_) => "string",
            Dynamic::Bytes(_) => "bytes",
        }
    }

    fn text(&self) -> String {
        match self {
            Dynamic::Null => String::new(),
            Dynamic::Bool(v) => format_bool(*v),
            Dynamic::Int(v) => v.to_string(),
            Dynamic::Uint(v) => v.to_string(),
            Dynamic::Float(v) => format_float(*v),
            Dynamic::String(v) => v.clone(),
            Dynamic::Bytes(v) => STANDARD.encode(v),
        }
    }

    fn parse_as_current(&mut self, text: &str) -> Result<(), UnmarshalTypeError> {
        let name = self.variant_name();
        let err = || UnmarshalTypeError::new(text, name);
        let parsed = match *self {
            Dynamic::Null | Dynamic::String(_) => Dynamic::String(text.to_string()),
            Dynamic::Bool(_) => Dynamic::Bool(parse_bool(text).ok_or_else(err)?),
            Dynamic::Int(_) => Dynamic::Int(text.parse().map_err(|_| err())?),
            Dynamic::Uint(_) => Dynamic::Uint(text.parse().map_err(|_| err())?),
            Dynamic::Float(_) => {
                if text.eq_ignore_ascii_case("nan") {
                    Dynamic::Float(f64::NAN)
                } else {
                    Dynamic::Float(text.parse().map_err(|_| err())?)
                }
            }
            Dynamic::Bytes(_) => Dynamic::Bytes(STANDARD.decode(text).map_err(|_| err())?),
        };
        *self = parsed;
        Ok(())
    }
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

fn empty_string() -> Box<dyn Any> {
    Box::new(String::new())
}

impl Value for Dynamic {
    fn type_info() -> TypeInfo {
        // Normalization hooks see an empty string for generic fields.
        TypeInfo::new::<Self>(Kind::Dynamic).with_zero(empty_string)
    }

    fn is_zero(&self) -> bool {
        self.is_null()
    }

    fn encode_builtin(&self) -> Option<String> {
        Some(self.text())
    }

    fn decode_builtin(&mut self, text: &str) -> Option<Result<(), UnmarshalTypeError>> {
        Some(self.parse_as_current(text))
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for Dynamic {
                fn from(v: $ty) -> Self {
                    Dynamic::$variant(v.into())
                }
            }
        )+
    };
}

impl_from!(
    bool => Bool,
    i64 => Int,
    i32 => Int,
    u64 => Uint,
    u32 => Uint,
    f64 => Float,
    String => String,
    &str => String,
    Vec<u8> => Bytes,
);
