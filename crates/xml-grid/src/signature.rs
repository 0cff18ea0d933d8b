/*
 * signature.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Column signatures: the cache key for binding synthesis.

use std::fmt;
use std::sync::Arc;

/// The ordered column names observed in a row.
///
/// Two signatures are equal iff they have the same names in the same order.
/// Cloning is cheap; the names are shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnSignature {
    names: Arc<[String]>,
}

impl ColumnSignature {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of the first column called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// First column name that occurs more than once.
    pub fn first_duplicate(&self) -> Option<&str> {
        self.names
            .iter()
            .enumerate()
            .find(|(i, name)| self.names[..*i].contains(*name))
            .map(|(_, name)| name.as_str())
    }
}

impl fmt::Display for ColumnSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}
