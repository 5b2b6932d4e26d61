// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent memoization of resolved schemas.
//!
//! The SchemaCache ensures that field path resolution happens only once per
//! `(type, annotation key)` combination. Lookups take the read lock; a miss
//! upgrades to the write lock, checks again and resolves while holding it, so
//! concurrent sessions asking for the same key never resolve twice.

use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use super::{resolve, Schema, TypeInfo};
use crate::error::Result;
use crate::value::Record;

type SchemaKey = (TypeId, String);

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
    /// Resolution time of the most recent miss.
    pub last_miss_ns: u64,
}

/// Read-through cache of [`Schema`]s keyed by type identity and annotation key.
#[derive(Debug, Default)]
pub struct SchemaCache {
    inner: RwLock<HashMap<SchemaKey, Arc<Schema>>>,
    stats: RwLock<LookupStats>,
}

impl SchemaCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache used by encoders and decoders unless one is injected.
    pub fn global() -> Arc<SchemaCache> {
        static GLOBAL: OnceLock<Arc<SchemaCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(SchemaCache::new())).clone()
    }

    /// Schema of record type `T` under annotation `key`.
    pub fn schema<T: Record>(&self, key: &str) -> Result<Arc<Schema>> {
        self.get_or_resolve(&T::type_info(), key)
    }

    /// Schema of `info` under `key`, resolving it on first use.
    ///
    /// Resolution errors are returned to the caller and not cached.
    pub fn get_or_resolve(&self, info: &TypeInfo, key: &str) -> Result<Arc<Schema>> {
        let cache_key = (info.id, key.to_string());

        if let Some(hit) = self.try_peek(&cache_key) {
            self.record_hit();
            return Ok(hit);
        }

        let mut cache = self.inner.write();
        if let Some(hit) = cache.get(&cache_key) {
            self.record_hit();
            return Ok(Arc::clone(hit));
        }

        let start = Instant::now();
        log::debug!("[rowmap::cache] miss for {} under '{}'", info.name, key);
        let built = Arc::new(resolve(info, key)?);
        cache.insert(cache_key, Arc::clone(&built));
        self.record_miss(start);
        Ok(built)
    }

    #[must_use]
    pub fn stats(&self) -> LookupStats {
        *self.stats.read()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Drop every cached schema. Statistics are kept.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    fn try_peek(&self, key: &SchemaKey) -> Option<Arc<Schema>> {
        self.inner.read().get(key).map(Arc::clone)
    }

    fn record_hit(&self) {
        let mut stats = self.stats.write();
        stats.hits = stats.hits.saturating_add(1);
    }

    fn record_miss(&self, start: Instant) {
        let mut stats = self.stats.write();
        stats.misses = stats.misses.saturating_add(1);
        stats.last_miss_ns = start.elapsed().as_nanos() as u64;
    }
}
