// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types.
//!
//! Every fallible operation returns [`Result`]. Per-field conversion failures
//! are wrapped in [`DecodeError`] / [`MarshalerError`]; the underlying cause
//! stays reachable through [`std::error::Error::source`].

use std::fmt;

use thiserror::Error;

/// Boxed error produced by collaborators and conversion functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

/// Crate error.
#[derive(Debug, Error)]
pub enum Error {
    /// A type matches no conversion strategy, or is not a record where one
    /// is required.
    #[error("unsupported type: {type_name}")]
    UnsupportedType { type_name: &'static str },

    #[error("inline field of type {type_name} contains itself")]
    CyclicInline { type_name: &'static str },

    #[error("wrong number of fields in record: expected {expected}, got {got}")]
    FieldCount { expected: usize, got: usize },

    #[error(transparent)]
    MissingColumns(#[from] MissingColumnsError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Marshal(#[from] MarshalerError),

    #[error("duplicate column name '{0}' in header")]
    DuplicateColumn(String),

    #[error("header can no longer change once decoding has started")]
    HeaderFrozen,

    #[error("header already written")]
    HeaderWritten,

    #[error("read error: {0}")]
    Read(#[source] BoxError),

    #[error("write error: {0}")]
    Write(#[source] BoxError),

    /// End of the row stream. Not a failure.
    #[error("end of stream")]
    Eof,
}

impl Error {
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Eof)
    }
}

/// Failure to decode one field of one row.
#[derive(Debug)]
pub struct DecodeError {
    /// Display name of the column.
    pub field: String,
    /// 1-indexed line, when the reader exposes positions.
    pub line: Option<u64>,
    /// 1-indexed column, when the reader exposes positions.
    pub column: Option<u64>,
    pub source: BoxError,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(
                f,
                "error on line {} column {} in field {:?}: {}",
                line, column, self.field, self.source
            ),
            _ => write!(f, "error in field {:?}: {}", self.field, self.source),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Conversion path that produced a [`MarshalerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Function registered for the exact type.
    Function,
    /// Function registered for a capability.
    Capability,
    /// The type's own [`Marshaler`](crate::Marshaler).
    Marshaler,
    /// The type's own [`TextMarshaler`](crate::TextMarshaler).
    TextMarshaler,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Function => "registered function",
            Strategy::Capability => "registered capability",
            Strategy::Marshaler => "marshal_csv",
            Strategy::TextMarshaler => "marshal_text",
        })
    }
}

/// Failure of a user conversion while encoding one field.
#[derive(Debug, Error)]
#[error("error calling {via} for field {field:?} of type {type_name}: {source}")]
pub struct MarshalerError {
    pub field: String,
    pub type_name: &'static str,
    pub via: Strategy,
    #[source]
    pub source: BoxError,
}

/// Strict-mode failure listing every schema column absent from the header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct MissingColumnsError {
    pub columns: Vec<String>,
}

impl fmt::Display for MissingColumnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.columns.iter().map(|c| format!("{c:?}")).collect();
        write!(f, "header does not contain column(s): {}", quoted.join(", "))
    }
}

/// Text that does not parse as the target primitive type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot decode {value:?} as {type_name}")]
pub struct UnmarshalTypeError {
    pub value: String,
    pub type_name: &'static str,
}

impl UnmarshalTypeError {
    pub fn new(value: impl Into<String>, type_name: &'static str) -> Self {
        Self {
            value: value.into(),
            type_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn decode_error_display_with_position() {
        let err = DecodeError {
            field: "age".into(),
            line: Some(3),
            column: Some(7),
            source: Box::new(UnmarshalTypeError::new("x", "u32")),
        };
        assert_eq!(
            err.to_string(),
            "error on line 3 column 7 in field \"age\": cannot decode \"x\" as u32"
        );

        let err = DecodeError { line: None, ..err };
        assert_eq!(
            err.to_string(),
            "error in field \"age\": cannot decode \"x\" as u32"
        );
    }

    #[test]
    fn decode_error_chain_reaches_cause() {
        let err = Error::from(DecodeError {
            field: "f".into(),
            line: None,
            column: None,
            source: Box::new(UnmarshalTypeError::new("nope", "bool")),
        });
        // transparent: the crate error forwards to the decode error's source
        let cause = err.source().expect("decode error source");
        let cause = cause
            .downcast_ref::<UnmarshalTypeError>()
            .expect("unmarshal type error");
        assert_eq!(cause.value, "nope");
    }

    #[test]
    fn missing_columns_lists_all() {
        let err = MissingColumnsError {
            columns: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "header does not contain column(s): \"a\", \"b\"");
    }

    #[test]
    fn eof_is_sentinel() {
        assert!(Error::Eof.is_eof());
        assert!(!Error::HeaderFrozen.is_eof());
    }
}
