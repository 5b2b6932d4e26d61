// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//! Tests for the field path resolver.

use super::*;
use crate::schema::{FieldShape, DEFAULT_TAG};
use crate::value::{Record, Value};

fn names<T: Record>(key: &str) -> Vec<String> {
    resolve(&T::type_info(), key).expect("resolve").names()
}

#[derive(crate::Record, Default)]
pub struct User {
    #[csv = "name"]
    pub name: String,
    #[csv = "age,omitempty"]
    pub age: i64,
}

#[derive(crate::Record, Default)]
pub struct Geo {
    pub lat: f64,
    pub lng: f64,
}

#[derive(crate::Record, Default)]
pub struct Address {
    pub street: String,
    #[csv = "geo_,inline"]
    pub geo: Geo,
}

#[derive(crate::Record, Default)]
pub struct Person {
    pub name: String,
    #[csv = "home_,inline"]
    pub home: Address,
    #[csv = "addr,inline:work_"]
    pub work: Address,
}

#[test]
fn annotated_names_and_options() {
    let schema = resolve(&User::type_info(), DEFAULT_TAG).expect("resolve");
    assert_eq!(schema.names(), vec!["name", "age"]);
    assert_eq!(schema.type_name(), "User");

    let age = schema.column(1).expect("age column");
    assert!(age.options().omit_empty);
    assert!(age.is_tagged());
    assert_eq!(age.path(), &[1]);
    assert!(matches!(age.type_info().kind, Kind::Int));
    assert_eq!(schema.position("age"), Some(1));
    assert_eq!(schema.position("missing"), None);
}

#[test]
fn inline_prefixes_nest() {
    assert_eq!(
        names::<Person>(DEFAULT_TAG),
        vec![
            "name",
            "home_street",
            "home_geo_lat",
            "home_geo_lng",
            "work_street",
            "work_geo_lat",
            "work_geo_lng",
        ]
    );

    let schema = resolve(&Person::type_info(), DEFAULT_TAG).expect("resolve");
    let lat = &schema.columns()[2];
    assert_eq!(lat.path(), &[1, 1, 0]);
    assert_eq!(lat.options().inline_prefix.as_deref(), Some("home_geo_"));
    assert_eq!(lat.depth(), 3);
}

#[derive(crate::Record, Default)]
pub struct Audit {
    pub id: i64,
    pub note: String,
}

#[derive(crate::Record, Default)]
pub struct Stamp {
    pub id: i64,
    pub at: String,
}

#[derive(crate::Record, Default)]
pub struct Collide {
    pub audit: Audit,
    pub stamp: Stamp,
}

#[derive(crate::Record, Default)]
pub struct Shadow {
    pub id: String,
    pub audit: Audit,
}

#[test]
fn same_depth_ambiguity_drops_all() {
    // both embedded `id`s sit at depth 2 with no tag: neither survives
    assert_eq!(names::<Collide>(DEFAULT_TAG), vec!["note", "at"]);
}

#[test]
fn shallower_field_wins() {
    let schema = resolve(&Shadow::type_info(), DEFAULT_TAG).expect("resolve");
    assert_eq!(schema.names(), vec!["id", "note"]);
    assert!(matches!(schema.columns()[0].type_info().kind, Kind::String));
}

#[derive(crate::Record, Default)]
pub struct TaggedX {
    #[csv = "x"]
    pub a: i64,
}

#[derive(crate::Record, Default)]
pub struct PlainX {
    pub x: i64,
    pub y: i64,
}

#[derive(crate::Record, Default)]
pub struct TagWins {
    pub plain: PlainX,
    pub tagged: TaggedX,
}

#[derive(crate::Record, Default)]
pub struct BothTagged {
    pub first: TaggedX,
    pub second: TaggedX,
}

#[test]
fn tagged_beats_untagged_at_same_depth() {
    let schema = resolve(&TagWins::type_info(), DEFAULT_TAG).expect("resolve");
    assert_eq!(schema.names(), vec!["y", "x"]);
    assert_eq!(schema.column(1).expect("x").path(), &[1, 0]);
}

#[test]
fn equally_tagged_are_dropped() {
    assert!(names::<BothTagged>(DEFAULT_TAG).is_empty());
}

#[derive(crate::Record, Default)]
pub struct Visibility {
    pub shown: i64,
    hidden: i64,
    #[csv = "-"]
    pub skipped: i64,
    #[rowmap(csv = "renamed", db = "-")]
    pub other: i64,
}

#[test]
fn private_and_excluded_fields_are_skipped() {
    assert_eq!(names::<Visibility>(DEFAULT_TAG), vec!["shown", "renamed"]);
    assert_eq!(names::<Visibility>("db"), vec!["shown", "skipped"]);
}

#[derive(crate::Record, Default)]
pub struct Outer {
    pub a: i64,
    #[csv = "addr"]
    pub addr: Geo,
    #[csv = ",inline"]
    pub mid: Audit,
    pub d: bool,
}

#[test]
fn named_record_is_one_column_and_inline_keeps_place() {
    let schema = resolve(&Outer::type_info(), DEFAULT_TAG).expect("resolve");
    assert_eq!(schema.names(), vec!["a", "addr", "id", "note", "d"]);
    assert!(schema.column(1).expect("addr").type_info().is_record());
}

#[test]
fn resolution_is_deterministic() {
    let first = resolve(&Person::type_info(), DEFAULT_TAG).expect("resolve");
    let second = resolve(&Person::type_info(), DEFAULT_TAG).expect("resolve");
    let paths = |s: &Schema| -> Vec<Vec<usize>> {
        s.columns().iter().map(|c| c.path().to_vec()).collect()
    };
    assert_eq!(first.names(), second.names());
    assert_eq!(paths(&first), paths(&second));
}

#[test]
fn non_record_is_unsupported() {
    let err = resolve(&u32::type_info(), DEFAULT_TAG).unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { type_name: "u32" }));
}

// Hand-written shapes: a derived struct cannot contain itself by value.

pub struct Node {
    pub id: i64,
}

static NODE_SHAPE: Shape = Shape {
    name: "Node",
    fields: &[
        FieldShape {
            name: "id",
            index: 0,
            exported: true,
            tags: &[],
            ty: <i64 as Value>::type_info,
        },
        FieldShape {
            name: "next",
            index: 1,
            exported: true,
            tags: &[("csv", "n_,inline")],
            ty: <Node as Value>::type_info,
        },
        FieldShape {
            name: "again",
            index: 2,
            exported: true,
            tags: &[("db", "")],
            ty: <Node as Value>::type_info,
        },
    ],
};

impl Value for Node {
    fn type_info() -> TypeInfo {
        TypeInfo::record::<Self>()
    }
}

impl Record for Node {
    fn shape() -> &'static Shape {
        &NODE_SHAPE
    }

    fn field(&self, index: usize) -> Option<&dyn Value> {
        match index {
            0 => Some(&self.id),
            _ => None,
        }
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Value> {
        match index {
            0 => Some(&mut self.id),
            _ => None,
        }
    }
}

#[test]
fn prefixed_self_inline_fails_fast() {
    let err = resolve(&Node::type_info(), DEFAULT_TAG).unwrap_err();
    assert!(matches!(err, Error::CyclicInline { type_name: "Node" }));
}

#[test]
fn unprefixed_self_embedding_is_skipped() {
    // under "db" `next` and `again` are plain embeddings of Node itself
    assert_eq!(names::<Node>("db"), vec!["id"]);
}
