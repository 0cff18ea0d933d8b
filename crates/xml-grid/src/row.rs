/*
 * row.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Buffered column values for the row currently being read.

use crate::signature::ColumnSignature;

/// The `(column name, raw text)` pairs of one row, in document order.
///
/// The cursor is single-pass, so a row is fully materialized here before
/// any binding happens. The buffer is reused from row to row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowBuffer {
    columns: Vec<(String, String)>,
}

impl RowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.columns.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Name of the column at `index`.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|(name, _)| name.as_str())
    }

    /// Raw text of the column at `index`.
    pub fn value(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|(_, value)| value.as_str())
    }

    /// Column names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// The column signature of this row.
    pub fn signature(&self) -> ColumnSignature {
        ColumnSignature::new(self.names())
    }

    /// Whether this row has exactly the columns of `signature`, in order.
    pub fn matches(&self, signature: &ColumnSignature) -> bool {
        self.len() == signature.len() && self.names().eq(signature.names().iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_row() -> RowBuffer {
        let mut row = RowBuffer::new();
        row.push("Title", "Dune");
        row.push("NumberOfPages", "412");
        row
    }

    #[test]
    fn test_accessors() {
        let row = book_row();
        assert_eq!(row.len(), 2);
        assert_eq!(row.name(1), Some("NumberOfPages"));
        assert_eq!(row.value(0), Some("Dune"));
        assert_eq!(row.value(2), None);
    }

    #[test]
    fn test_signature_follows_document_order() {
        let row = book_row();
        assert_eq!(
            row.signature(),
            ColumnSignature::new(["Title", "NumberOfPages"])
        );
    }

    #[test]
    fn test_matches() {
        let row = book_row();
        assert!(row.matches(&ColumnSignature::new(["Title", "NumberOfPages"])));
        assert!(!row.matches(&ColumnSignature::new(["NumberOfPages", "Title"])));
        assert!(!row.matches(&ColumnSignature::new(["Title"])));
    }

    #[test]
    fn test_clear_reuses_buffer() {
        let mut row = book_row();
        row.clear();
        assert!(row.is_empty());
        row.push("A", "");
        assert_eq!(row.iter().collect::<Vec<_>>(), vec![("A", "")]);
    }
}
