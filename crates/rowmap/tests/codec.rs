// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end encode/decode through the public API.
//!
//! Covers:
//! - nested inline records with prefixes
//! - csv text in and out, including field positions in errors
//! - registered conversions shared by both directions
//! - header-only helpers

#![cfg(feature = "csv")]
#![allow(clippy::float_cmp)] // Exact values round-trip through text

use rowmap::{
    header, marshal, marshal_func, unmarshal, unmarshal_func, BoxError, CsvReader, Decoder,
    Dynamic, Encoder, Error, Record, RowReader, UnmarshalTypeError,
};

#[derive(Record, Default, Debug, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    #[csv = "zip,omitempty"]
    pub zip: u32,
}

#[derive(Record, Default, Debug, Clone, PartialEq)]
pub struct Audit {
    #[csv = "created_by"]
    pub created_by: String,
    pub revision: u16,
}

#[derive(Record, Default, Debug, Clone, PartialEq)]
pub struct Customer {
    #[csv = "id"]
    pub id: u64,
    #[csv = "name"]
    pub name: String,
    #[csv = "home_,inline"]
    pub home: Address,
    #[csv = "work,inline:office_"]
    pub work: Address,
    #[csv = ",inline"]
    pub audit: Audit,
    #[csv = "score,omitempty"]
    pub score: Option<f64>,
    #[csv = "-"]
    pub scratch: String,
    pub secret: String,
}

fn sample() -> Customer {
    Customer {
        id: 7,
        name: "Ada, Countess".into(),
        home: Address {
            street: "1 Main St".into(),
            zip: 12345,
        },
        work: Address {
            street: "Lab \"B\"".into(),
            zip: 0,
        },
        audit: Audit {
            created_by: "ops".into(),
            revision: 3,
        },
        score: Some(0.5),
        scratch: "not written".into(),
        secret: "hidden".into(),
    }
}

#[test]
fn header_lists_flattened_columns() {
    let names = header::<Customer>("csv").expect("header");
    assert_eq!(
        names,
        [
            "id",
            "name",
            "home_street",
            "home_zip",
            "office_street",
            "office_zip",
            "created_by",
            "revision",
            "score",
            "secret",
        ]
    );
}

#[test]
fn csv_round_trip() {
    let text = marshal(&[sample()]).expect("marshal");
    let text = String::from_utf8(text).expect("utf8");
    assert_eq!(
        text,
        "id,name,home_street,home_zip,office_street,office_zip,created_by,revision,score,secret\n\
         7,\"Ada, Countess\",1 Main St,12345,\"Lab \"\"B\"\"\",,ops,3,0.5,hidden\n"
    );

    let back: Vec<Customer> = unmarshal(text.as_bytes()).expect("unmarshal");
    let mut expected = sample();
    expected.scratch.clear();
    assert_eq!(back, vec![expected]);
}

#[test]
fn empty_input_and_header_only() {
    assert!(unmarshal::<Customer>(b"").expect("unmarshal").is_empty());

    let text = marshal::<Address>(&[]).expect("marshal");
    assert_eq!(text, b"street,zip\n");
    assert!(unmarshal::<Address>(&text).expect("unmarshal").is_empty());
}

#[test]
fn reordered_and_partial_header() {
    let text = "zip,extra,street\n99,?,Elm\n,?,Oak\n";
    let mut dec = Decoder::new(CsvReader::from_reader(text.as_bytes())).expect("header");

    let rows: Vec<Address> = dec.records().collect::<Result<_, _>>().expect("decode");
    assert_eq!(
        rows,
        [
            Address {
                street: "Elm".into(),
                zip: 99
            },
            Address {
                street: "Oak".into(),
                zip: 0
            },
        ]
    );
    assert_eq!(dec.unused(), [1]);
}

#[test]
fn csv_positions_in_decode_errors() {
    let text = "street,zip\nElm,12\nOak,twelve\n";
    let mut dec = Decoder::new(CsvReader::from_reader(text.as_bytes())).expect("header");

    let mut addr = Address::default();
    dec.decode(&mut addr).expect("first row");
    let err = dec.decode(&mut addr).unwrap_err();
    assert_eq!(
        err.to_string(),
        "error on line 3 column 5 in field \"zip\": cannot decode \"twelve\" as u32"
    );

    let Error::Decode(decode) = err else {
        panic!("expected decode error");
    };
    let cause = decode
        .source
        .downcast_ref::<UnmarshalTypeError>()
        .expect("built-in parse failure");
    assert_eq!(cause.value, "twelve");
}

#[test]
fn csv_row_length_mismatch() {
    let text = "street,zip\nElm\nOak,1\n";
    let mut dec = Decoder::new(CsvReader::from_reader(text.as_bytes())).expect("header");
    let mut addr = Address::default();
    assert!(matches!(
        dec.decode(&mut addr),
        Err(Error::FieldCount {
            expected: 2,
            got: 1
        })
    ));
    dec.decode(&mut addr).expect("stream still usable");
    assert_eq!(addr.street, "Oak");
}

#[test]
fn malformed_csv_is_a_read_error() {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader("a,b\n1,2\n3\n".as_bytes());
    let mut dec = Decoder::new(&mut rdr).expect("header");

    #[derive(Record, Default)]
    pub struct Ab {
        pub a: i8,
        pub b: i8,
    }

    let results: Vec<_> = dec.records::<Ab>().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::Read(_))));
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Record, Default, Debug, PartialEq)]
pub struct Pixel {
    pub at: Dynamic,
    pub color: Rgb,
}

impl rowmap::Value for Rgb {
    fn type_info() -> rowmap::schema::TypeInfo {
        rowmap::schema::TypeInfo::new::<Self>(rowmap::schema::Kind::Custom)
    }
}

#[test]
fn registered_conversions_both_ways() {
    let ms = marshal_func(|c: &Rgb| {
        Ok::<_, BoxError>(format!("#{:02x}{:02x}{:02x}", c.0, c.1, c.2).into_bytes())
    });
    let us = unmarshal_func(|data: &[u8], c: &mut Rgb| -> Result<(), BoxError> {
        let text = std::str::from_utf8(data)?;
        let hex = text.strip_prefix('#').ok_or("missing #")?;
        let n = u32::from_str_radix(hex, 16)?;
        *c = Rgb((n >> 16) as u8, (n >> 8) as u8, n as u8);
        Ok(())
    });

    let mut enc = Encoder::new(Vec::<Vec<String>>::new()).with_marshalers(ms);
    enc.encode(&Pixel {
        at: Dynamic::Uint(3),
        color: Rgb(255, 16, 0),
    })
    .expect("encode");
    let rows = enc.into_inner();
    assert_eq!(rows[1], ["3", "#ff1000"]);

    let mut dec = Decoder::new(RowReader::new(rows))
        .expect("header")
        .with_unmarshalers(us);
    let mut px = Pixel::default();
    dec.decode(&mut px).expect("decode");
    assert_eq!(
        px,
        Pixel {
            at: Dynamic::String("3".into()),
            color: Rgb(255, 16, 0),
        }
    );
}

#[test]
fn custom_annotation_key() {
    #[derive(Record, Default, Debug, PartialEq)]
    pub struct Row {
        #[rowmap(csv = "key", db = "pk")]
        pub key: String,
        #[rowmap(db = "-")]
        pub note: String,
    }

    assert_eq!(header::<Row>("csv").expect("header"), ["key", "note"]);
    assert_eq!(header::<Row>("db").expect("header"), ["pk"]);

    let mut dec = Decoder::new(RowReader::new([["pk", "note"], ["1", "n"]]))
        .expect("header")
        .tag("db");
    let mut row = Row::default();
    dec.decode(&mut row).expect("decode");
    assert_eq!(
        row,
        Row {
            key: "1".into(),
            note: String::new(),
        }
    );
    assert_eq!(dec.unused(), [1]);
}

#[cfg(feature = "chrono")]
#[test]
fn time_fields() {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    #[derive(Record, Default, Debug, PartialEq)]
    pub struct Event {
        pub at: DateTime<Utc>,
        pub day: NaiveDate,
        pub until: Option<NaiveDate>,
    }

    let event = Event {
        at: Utc.with_ymd_and_hms(2024, 2, 29, 12, 30, 0).single().expect("valid"),
        day: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid"),
        until: None,
    };
    let text = marshal(std::slice::from_ref(&event)).expect("marshal");
    assert_eq!(
        String::from_utf8(text.clone()).expect("utf8"),
        "at,day,until\n2024-02-29T12:30:00Z,2024-03-01,\n"
    );
    assert_eq!(unmarshal::<Event>(&text).expect("unmarshal"), vec![event]);
}
