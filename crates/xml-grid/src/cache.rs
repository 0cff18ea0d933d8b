/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Two-level cache of synthesized deserializers: type → signature →
//! [`Deserializer`].
//!
//! The outer table is only locked to find or insert a type's inner table;
//! the type's shape is resolved before that lock is taken.
//! Synthesis runs under the inner table's write lock, so concurrent readers
//! of the same (type, signature) build it at most once, and work on one type
//! never blocks lookups for another. Entries are never replaced or evicted:
//! memory grows with the number of distinct shapes actually seen.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use crate::binding::Deserializer;
use crate::lock;
use crate::shape::{GridRow, TargetShape};
use crate::signature::ColumnSignature;
use crate::Result;

/// Per-type table: the resolved shape plus one deserializer per signature.
struct TypeTable<T> {
    shape: TargetShape<T>,
    entries: RwLock<HashMap<ColumnSignature, Arc<Deserializer<T>>>>,
}

#[derive(Default)]
pub struct DeserializerCache {
    tables: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl DeserializerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The deserializer for `T` and `signature`, calling `build` with the
    /// type's shape if there is none yet.
    ///
    /// A failed build is not cached.
    pub fn get_or_insert_with<T, F>(
        &self,
        signature: &ColumnSignature,
        build: F,
    ) -> Result<Arc<Deserializer<T>>>
    where
        T: GridRow,
        F: FnOnce(&TargetShape<T>) -> Result<Deserializer<T>>,
    {
        let table = self.table::<T>();

        if let Some(found) = lock::read(&table.entries).get(signature) {
            trace!(
                target_type = std::any::type_name::<T>(),
                %signature,
                "deserializer cache hit"
            );
            return Ok(Arc::clone(found));
        }

        let mut entries = lock::write(&table.entries);
        if let Some(found) = entries.get(signature) {
            return Ok(Arc::clone(found));
        }

        let built = Arc::new(build(&table.shape)?);
        debug!(
            target_type = std::any::type_name::<T>(),
            %signature,
            strategy = %built.strategy(),
            "synthesized deserializer"
        );
        entries.insert(signature.clone(), Arc::clone(&built));
        Ok(built)
    }

    /// Whether a deserializer for `T` and `signature` is cached.
    pub fn contains<T: GridRow>(&self, signature: &ColumnSignature) -> bool {
        let Some(table) = self.existing_table::<T>() else {
            return false;
        };
        let entries = lock::read(&table.entries);
        entries.contains_key(signature)
    }

    /// Number of cached signatures for `T`.
    pub fn signature_count<T: GridRow>(&self) -> usize {
        let Some(table) = self.existing_table::<T>() else {
            return 0;
        };
        let entries = lock::read(&table.entries);
        entries.len()
    }

    /// Number of types with a table.
    pub fn type_count(&self) -> usize {
        lock::read(&self.tables).len()
    }

    fn existing_table<T: GridRow>(&self) -> Option<Arc<TypeTable<T>>> {
        lock::read(&self.tables)
            .get(&TypeId::of::<T>())
            .map(|table| downcast::<T>(Arc::clone(table)))
    }

    fn table<T: GridRow>(&self) -> Arc<TypeTable<T>> {
        if let Some(table) = self.existing_table::<T>() {
            return table;
        }

        // `T::shape()` is user code and may itself consult this cache, so it
        // runs before the outer lock is taken. A racing thread may resolve the
        // same shape; the first one inserted wins.
        trace!(target_type = std::any::type_name::<T>(), "resolving target shape");
        let built = Arc::new(TypeTable {
            shape: T::shape(),
            entries: RwLock::new(HashMap::new()),
        }) as Arc<dyn Any + Send + Sync>;

        let mut tables = lock::write(&self.tables);
        let table = tables.entry(TypeId::of::<T>()).or_insert(built);
        downcast::<T>(Arc::clone(table))
    }
}

impl std::fmt::Debug for DeserializerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeserializerCache")
            .field("types", &self.type_count())
            .finish()
    }
}

fn downcast<T: GridRow>(table: Arc<dyn Any + Send + Sync>) -> Arc<TypeTable<T>> {
    table
        .downcast::<TypeTable<T>>()
        .unwrap_or_else(|_| unreachable!("type table stored under a mismatched TypeId"))
}
