// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in primitive rules: booleans, integers, floats, strings, bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::Value;
use crate::error::UnmarshalTypeError;
use crate::schema::{Kind, TypeInfo};

pub(crate) fn format_bool(v: bool) -> String {
    if v { "true" } else { "false" }.to_string()
}

/// Accepts `1 t T TRUE true True 0 f F FALSE false False`.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Shortest representation that parses back to the same value; NaN is `NaN`.
///
/// Positional and exponent forms both round-trip, the shorter one is kept
/// (positional on a tie).
pub(crate) fn format_float<F>(v: F) -> String
where
    F: Into<f64> + std::fmt::Display + std::fmt::LowerExp + Copy,
{
    let wide: f64 = v.into();
    if wide.is_nan() {
        return "NaN".to_string();
    }
    let plain = v.to_string();
    let exp = format!("{v:e}");
    if exp.len() < plain.len() {
        exp
    } else {
        plain
    }
}

fn parse_float<F: std::str::FromStr>(text: &str, nan: F) -> Option<F> {
    if text.eq_ignore_ascii_case("nan") {
        return Some(nan);
    }
    text.parse().ok()
}

impl Value for bool {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Kind::Bool)
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn encode_builtin(&self) -> Option<String> {
        Some(format_bool(*self))
    }

    fn decode_builtin(&mut self, text: &str) -> Option<Result<(), UnmarshalTypeError>> {
        Some(match parse_bool(text) {
            Some(v) => {
                *self = v;
                Ok(())
            }
            None => Err(UnmarshalTypeError::new(text, "bool")),
        })
    }
}

macro_rules! impl_integer {
    ($kind:ident: $($ty:ty),+ $(,)?) => {
        $(
            impl Value for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::new::<Self>(Kind::$kind)
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }

                fn encode_builtin(&self) -> Option<String> {
                    Some(self.to_string())
                }

                fn decode_builtin(&mut self, text: &str) -> Option<Result<(), UnmarshalTypeError>> {
                    Some(match text.parse::<$ty>() {
                        Ok(v) => {
                            *self = v;
                            Ok(())
                        }
                        Err(_) => Err(UnmarshalTypeError::new(text, stringify!($ty))),
                    })
                }
            }
        )+
    };
}

impl_integer!(Int: i8, i16, i32, i64, i128, isize);
impl_integer!(Uint: u8, u16, u32, u64, u128, usize);

macro_rules! impl_float {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl Value for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::new::<Self>(Kind::Float)
                }

                fn is_zero(&self) -> bool {
                    *self == 0.0
                }

                fn encode_builtin(&self) -> Option<String> {
                    Some(format_float(*self))
                }

                fn decode_builtin(&mut self, text: &str) -> Option<Result<(), UnmarshalTypeError>> {
                    Some(match parse_float(text, $ty::NAN) {
                        Some(v) => {
                            *self = v;
                            Ok(())
                        }
                        None => Err(UnmarshalTypeError::new(text, stringify!($ty))),
                    })
                }
            }
        )+
    };
}

impl_float!(f32, f64);

impl Value for String {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Kind::String)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn encode_builtin(&self) -> Option<String> {
        Some(self.clone())
    }

    fn decode_builtin(&mut self, text: &str) -> Option<Result<(), UnmarshalTypeError>> {
        text.clone_into(self);
        Some(Ok(()))
    }
}

impl Value for Vec<u8> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Kind::Bytes)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn encode_builtin(&self) -> Option<String> {
        Some(STANDARD.encode(self))
    }

    fn decode_builtin(&mut self, text: &str) -> Option<Result<(), UnmarshalTypeError>> {
        Some(match STANDARD.decode(text) {
            Ok(bytes) => {
                *self = bytes;
                Ok(())
            }
            Err(_) => Err(UnmarshalTypeError::new(text, "Vec<u8>")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_rules() {
        assert_eq!(true.encode_builtin().as_deref(), Some("true"));
        assert_eq!(false.encode_builtin().as_deref(), Some("false"));

        for text in ["1", "t", "T", "TRUE", "true", "True"] {
            let mut v = false;
            v.decode_builtin(text).expect("bool rule").expect("parse");
            assert!(v, "{text}");
        }
        let mut v = true;
        v.decode_builtin("F").expect("bool rule").expect("parse");
        assert!(!v);
        assert!(v.decode_builtin("yes").expect("bool rule").is_err());
    }

    #[test]
    fn test_integer_rules() {
        let mut n = 0i32;
        n.decode_builtin("-42").expect("int rule").expect("parse");
        assert_eq!(n, -42);
        assert_eq!(n.encode_builtin().as_deref(), Some("-42"));

        let mut u = 0u8;
        let err = u.decode_builtin("256").expect("int rule").unwrap_err();
        assert_eq!(err.value, "256");
        assert_eq!(err.type_name, "u8");
    }

    #[test]
    fn test_float_nan_any_case() {
        assert_eq!(f64::NAN.encode_builtin().as_deref(), Some("NaN"));
        assert_eq!(f32::NAN.encode_builtin().as_deref(), Some("NaN"));

        for text in ["NaN", "nan", "NAN", "nAn"] {
            let mut f = 1.0f64;
            f.decode_builtin(text).expect("float rule").expect("parse");
            assert!(f.is_nan(), "{text}");
        }
    }

    #[test]
    fn test_float_shortest_roundtrip() {
        for v in [0.1f64, 1.0 / 3.0, 1e300, -2.5e-10, 123_456.789] {
            let text = v.encode_builtin().expect("float rule");
            let mut back = 0.0f64;
            back.decode_builtin(&text).expect("float rule").expect("parse");
            assert_eq!(back, v);
        }
        assert_eq!(0.1f32.encode_builtin().as_deref(), Some("0.1"));
        assert_eq!(2.0f64.encode_builtin().as_deref(), Some("2"));
        assert_eq!(123_456.789f64.encode_builtin().as_deref(), Some("123456.789"));
    }

    #[test]
    fn test_float_large_exponents_use_exponent_form() {
        assert_eq!(1e300f64.encode_builtin().as_deref(), Some("1e300"));
        assert_eq!(1e-300f64.encode_builtin().as_deref(), Some("1e-300"));
        assert_eq!((-2.5e-10f64).encode_builtin().as_deref(), Some("-2.5e-10"));
        assert_eq!(1e-45f32.encode_builtin().as_deref(), Some("1e-45"));
        assert_eq!(3e38f32.encode_builtin().as_deref(), Some("3e38"));

        let text = f64::MAX.encode_builtin().expect("float rule");
        assert!(text.len() < 30, "{text}");
        let mut back = 0.0f64;
        back.decode_builtin(&text).expect("float rule").expect("parse");
        assert_eq!(back, f64::MAX);
    }

    #[test]
    fn test_bytes_base64() {
        let bytes = b"hello".to_vec();
        assert_eq!(bytes.encode_builtin().as_deref(), Some("aGVsbG8="));

        let mut back: Vec<u8> = Vec::new();
        back.decode_builtin("aGVsbG8=").expect("bytes rule").expect("decode");
        assert_eq!(back, b"hello");
        assert!(back.decode_builtin("***").expect("bytes rule").is_err());
    }

    #[test]
    fn test_zero_values() {
        assert!(0u64.is_zero());
        assert!(!7i16.is_zero());
        assert!(String::new().is_zero());
        assert!(0.0f64.is_zero());
        assert!(!f64::NAN.is_zero());
        assert!(!true.is_zero());
    }
}
