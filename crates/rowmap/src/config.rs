// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encoder and decoder settings.
//!
//! Settings are fixed before the first conversion. With the `serde` feature
//! both structs load from any serde format; missing keys keep their defaults.

use crate::schema::DEFAULT_TAG;

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EncoderConfig {
    /// Annotation key holding column names and options.
    pub tag: String,
    /// Write the header before the first record when none was written yet.
    pub auto_header: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            auto_header: true,
        }
    }
}

/// Decoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DecoderConfig {
    /// Annotation key holding column names and options.
    pub tag: String,
    /// Fail before the first record when a schema column is absent from the header.
    pub disallow_missing_columns: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            disallow_missing_columns: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let enc = EncoderConfig::default();
        assert_eq!(enc.tag, "csv");
        assert!(enc.auto_header);

        let dec = DecoderConfig::default();
        assert_eq!(dec.tag, "csv");
        assert!(!dec.disallow_missing_columns);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_config_keeps_defaults() {
        let dec: DecoderConfig =
            serde_json::from_str(r#"{"disallow_missing_columns": true}"#).expect("parse");
        assert_eq!(dec.tag, "csv");
        assert!(dec.disallow_missing_columns);

        let enc: EncoderConfig = serde_json::from_str(r#"{"tag": "db"}"#).expect("parse");
        assert_eq!(enc.tag, "db");
        assert!(enc.auto_header);
    }
}
