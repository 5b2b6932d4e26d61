// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! chrono types, converted through the generic text capability.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use super::Value;
use crate::error::BoxError;
use crate::schema::{Kind, TypeInfo};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

impl Value for DateTime<Utc> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Kind::Time)
    }

    fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    fn marshal_text(&self) -> Option<Result<String, BoxError>> {
        Some(Ok(self.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
    }

    fn unmarshal_text(&mut self, text: &str) -> Option<Result<(), BoxError>> {
        Some(
            DateTime::parse_from_rfc3339(text)
                .map(|t| *self = t.with_timezone(&Utc))
                .map_err(Into::into),
        )
    }
}

impl Value for DateTime<FixedOffset> {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Kind::Time)
    }

    fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    fn marshal_text(&self) -> Option<Result<String, BoxError>> {
        Some(Ok(self.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
    }

    fn unmarshal_text(&mut self, text: &str) -> Option<Result<(), BoxError>> {
        Some(
            DateTime::parse_from_rfc3339(text)
                .map(|t| *self = t)
                .map_err(Into::into),
        )
    }
}

impl Value for NaiveDateTime {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Kind::Time)
    }

    fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    fn marshal_text(&self) -> Option<Result<String, BoxError>> {
        Some(Ok(self.format(NAIVE_FORMAT).to_string()))
    }

    fn unmarshal_text(&mut self, text: &str) -> Option<Result<(), BoxError>> {
        Some(
            text.parse::<NaiveDateTime>()
                .map(|t| *self = t)
                .map_err(Into::into),
        )
    }
}

impl Value for NaiveDate {
    fn type_info() -> TypeInfo {
        TypeInfo::new::<Self>(Kind::Time)
    }

    fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    fn marshal_text(&self) -> Option<Result<String, BoxError>> {
        Some(Ok(self.to_string()))
    }

    fn unmarshal_text(&mut self, text: &str) -> Option<Result<(), BoxError>> {
        Some(text.parse::<NaiveDate>().map(|d| *self = d).map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_rfc3339() {
        let t = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
            .expect("parse")
            .with_timezone(&Utc);
        let text = t.marshal_text().expect("text rule").expect("format");
        assert_eq!(text, "2024-03-01T12:30:00Z");

        let mut back = DateTime::<Utc>::default();
        assert!(back.is_zero());
        back.unmarshal_text(&text).expect("text rule").expect("parse");
        assert_eq!(back, t);
        assert!(!back.is_zero());
    }

    #[test]
    fn test_fixed_offset_keeps_offset() {
        let mut t = DateTime::<FixedOffset>::default();
        t.unmarshal_text("2024-03-01T12:30:00.5+02:00")
            .expect("text rule")
            .expect("parse");
        assert_eq!(
            t.marshal_text().expect("text rule").expect("format"),
            "2024-03-01T12:30:00.500+02:00"
        );
    }

    #[test]
    fn test_naive_forms() {
        let mut d = NaiveDate::default();
        d.unmarshal_text("2023-12-31").expect("text rule").expect("parse");
        assert_eq!(d.marshal_text().expect("text rule").expect("format"), "2023-12-31");
        assert!(d.unmarshal_text("31/12/2023").expect("text rule").is_err());

        let mut dt = NaiveDateTime::default();
        dt.unmarshal_text("2023-12-31T23:59:01").expect("text rule").expect("parse");
        assert_eq!(
            dt.marshal_text().expect("text rule").expect("format"),
            "2023-12-31T23:59:01"
        );
    }
}
