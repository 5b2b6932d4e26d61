// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field annotation mini-language: `name[,option[,option...]]`.
//!
//! | Annotation | Meaning |
//! |------------|---------|
//! | `-` | field excluded |
//! | `name` | column called `name` |
//! | `,omitempty` | declared field name, empty text <-> zero value |
//! | `p_,inline` | flatten the nested record, prefixing its columns with `p_` |
//! | `,inline:p_` | same, prefix given explicitly |

/// Parsed field annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Explicit column name (never empty).
    pub name: Option<&'a str>,
    pub omit_empty: bool,
    pub inline: bool,
    /// Prefix applied to inlined columns (empty = none).
    pub prefix: &'a str,
    pub ignore: bool,
}

impl<'a> Tag<'a> {
    /// Parse an optional raw annotation. Unknown options are ignored.
    pub fn parse(raw: Option<&'a str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        if raw == "-" {
            return Self {
                ignore: true,
                ..Self::default()
            };
        }

        let mut parts = raw.split(',');
        let name = parts.next().filter(|n| !n.is_empty());
        let mut tag = Self {
            name,
            ..Self::default()
        };

        let mut explicit_prefix = None;
        for option in parts {
            match option {
                "omitempty" => tag.omit_empty = true,
                "inline" => tag.inline = true,
                _ => {
                    if let Some(prefix) = option.strip_prefix("inline:") {
                        tag.inline = true;
                        explicit_prefix = Some(prefix);
                    }
                }
            }
        }

        if tag.inline {
            match explicit_prefix {
                Some(prefix) => tag.prefix = prefix,
                // `p_,inline`: the name part is the prefix
                None => {
                    tag.prefix = tag.name.unwrap_or("");
                    tag.name = None;
                }
            }
        }

        tag
    }

    /// True when the annotation names the column.
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}
