// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field path resolution: flatten a record shape into ordered columns.
//!
//! Breadth-first over nesting depth, mirroring field shadowing rules:
//!
//! 1. Visit fields in declaration order, skipping non-`pub` and `-` fields.
//! 2. Inline records (and un-named records) are expanded one level deeper,
//!    with their prefix prepended to every descendant name.
//! 3. Every other field yields one column.
//! 4. Per name, the shallowest column wins. At equal depth a single named
//!    (tagged) column beats untagged ones; any other tie drops the whole group.
//! 5. Survivors are ordered by access path, i.e. declaration order with
//!    inline sub-schemas substituted in place.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use super::{Column, ColumnOptions, Kind, Schema, Shape, Tag, TypeInfo};
use crate::error::{Error, Result};

/// Record reached during the walk, waiting for its fields to be visited.
struct Pending {
    shape: &'static Shape,
    path: Vec<usize>,
    prefix: String,
    /// Types on the inline chain from the root to this record (inclusive).
    chain: Vec<TypeId>,
}

/// Resolve the schema of `info` under annotation `key`.
///
/// Fails with [`Error::UnsupportedType`] when `info` is not a record and with
/// [`Error::CyclicInline`] when a prefixed inline field re-enters one of its
/// own ancestors.
pub fn resolve(info: &TypeInfo, key: &str) -> Result<Schema> {
    let Kind::Record(shape_fn) = info.kind else {
        return Err(Error::UnsupportedType {
            type_name: info.name,
        });
    };
    let root = shape_fn();

    // (type, prefix) pairs expanded on shallower levels; their names are shadowed
    let mut visited: HashSet<(TypeId, String)> = HashSet::new();
    visited.insert((info.id, String::new()));

    let mut current = vec![Pending {
        shape: root,
        path: Vec::new(),
        prefix: String::new(),
        chain: vec![info.id],
    }];
    let mut candidates: Vec<Column> = Vec::new();

    while !current.is_empty() {
        let mut next = Vec::new();
        let mut level: HashSet<(TypeId, String)> = HashSet::new();

        for pending in current {
            for field in pending.shape.fields {
                if !field.exported {
                    continue;
                }
                let tag = Tag::parse(field.tag(key));
                if tag.ignore {
                    continue;
                }

                let ty = (field.ty)();
                let mut path = pending.path.clone();
                path.push(field.index);

                if let Kind::Record(sub_shape) = ty.kind {
                    if tag.inline || !tag.is_named() {
                        let prefix = format!("{}{}", pending.prefix, tag.prefix);
                        if pending.chain.contains(&ty.id) {
                            if !tag.prefix.is_empty() {
                                return Err(Error::CyclicInline {
                                    type_name: ty.name,
                                });
                            }
                            log::debug!(
                                "[rowmap::schema] {}.{} re-enters {}; skipped",
                                pending.shape.name,
                                field.name,
                                ty.name
                            );
                            continue;
                        }
                        let key = (ty.id, prefix.clone());
                        if visited.contains(&key) {
                            continue;
                        }
                        level.insert(key);

                        let mut chain = pending.chain.clone();
                        chain.push(ty.id);
                        next.push(Pending {
                            shape: sub_shape(),
                            path,
                            prefix,
                            chain,
                        });
                        continue;
                    }
                }

                let name = format!("{}{}", pending.prefix, tag.name.unwrap_or(field.name));
                let options = ColumnOptions {
                    omit_empty: tag.omit_empty,
                    inline_prefix: (!pending.prefix.is_empty()).then(|| pending.prefix.clone()),
                };
                candidates.push(Column::new(name, path, ty, options, tag.is_named()));
            }
        }

        visited.extend(level);
        current = next;
    }

    let mut columns = dominant_columns(candidates);
    columns.sort_by(|a, b| a.path().cmp(b.path()));

    log::debug!(
        "[rowmap::schema] resolved {} under '{}': {} column(s)",
        root.name,
        key,
        columns.len()
    );
    Ok(Schema::new(root.name, columns))
}

/// Apply the shadowing rule to every group of equally named candidates.
fn dominant_columns(candidates: Vec<Column>) -> Vec<Column> {
    let mut groups: HashMap<String, Vec<Column>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for column in candidates {
        let name = column.name().to_string();
        let group = groups.entry(name.clone()).or_default();
        if group.is_empty() {
            order.push(name);
        }
        group.push(column);
    }

    let mut out = Vec::with_capacity(order.len());
    for name in order {
        let Some(group) = groups.remove(&name) else {
            continue;
        };
        match dominant(group) {
            Some(column) => out.push(column),
            None => log::debug!("[rowmap::schema] ambiguous column '{}' dropped", name),
        }
    }
    out
}

fn dominant(mut group: Vec<Column>) -> Option<Column> {
    let min_depth = group.iter().map(Column::depth).min()?;
    group.retain(|c| c.depth() == min_depth);
    if group.len() == 1 {
        return group.pop();
    }

    let mut tagged: Vec<Column> = group.into_iter().filter(Column::is_tagged).collect();
    if tagged.len() == 1 {
        tagged.pop()
    } else {
        None
    }
}

#[cfg(test)]
mod tests;
