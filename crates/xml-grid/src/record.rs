/*
 * record.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Schema-free rows.

use indexmap::IndexMap;

use crate::row::RowBuffer;

/// One row as an ordered column name → raw text mapping.
///
/// Columns keep document order. If a row repeats a column name, the
/// column stays at its first position and holds the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: IndexMap<String, String>,
}

impl Record {
    /// Raw text of column `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Column names in document order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> IndexMap<String, String> {
        self.values
    }
}

impl From<&RowBuffer> for Record {
    fn from(row: &RowBuffer) -> Self {
        let mut values = IndexMap::with_capacity(row.len());
        for (name, value) in row.iter() {
            values.insert(name.to_string(), value.to_string());
        }
        Self { values }
    }
}

impl From<Record> for IndexMap<String, String> {
    fn from(record: Record) -> Self {
        record.values
    }
}
