/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Reader configuration.

use serde::{Deserialize, Serialize};

/// Options controlling how a grid document is read.
///
/// All fields have defaults, so a partial TOML or JSON table is enough:
///
/// ```rust
/// use xml_grid::GridOptions;
///
/// let options: GridOptions = serde_json::from_str(r#"{ "trim_values": true }"#).unwrap();
/// assert!(options.trim_values);
/// assert!(options.check_end_names);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Trim leading and trailing whitespace from column text.
    ///
    /// Applies to typed reads and to records alike. Whitespace-only column
    /// text is always read as the empty string.
    pub trim_values: bool,

    /// Reject end tags whose name does not match the open element.
    pub check_end_names: bool,

    /// Maximum number of rows a document may contain.
    pub max_rows: Option<usize>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            trim_values: false,
            check_end_names: true,
            max_rows: None,
        }
    }
}

impl GridOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trim_values(mut self, trim_values: bool) -> Self {
        self.trim_values = trim_values;
        self
    }

    pub fn with_check_end_names(mut self, check_end_names: bool) -> Self {
        self.check_end_names = check_end_names;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }
}
