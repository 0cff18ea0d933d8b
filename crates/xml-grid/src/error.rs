/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for grid reading.
//!
//! Every failure aborts the whole read: callers get exactly one error
//! describing the first offending row and column, never partial results.

use thiserror::Error;

/// Boxed error produced by value converters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for xml-grid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a grid.
#[derive(Debug, Error)]
pub enum Error {
    /// The document itself is missing or unusable as input.
    #[error("Invalid argument: {message}")]
    Argument { message: String },

    /// Malformed XML or a document that is not shaped like a grid.
    #[error("XML parse error: {message}{}", .position.map(|p| format!(" at byte {}", p)).unwrap_or_default())]
    Parse {
        message: String,
        /// Byte offset where the error was detected, when known.
        position: Option<u64>,
    },

    /// A row element with no column children.
    #[error("Row {row} has no columns")]
    EmptyRow { row: usize },

    /// The column shape of a row cannot be mapped onto the target type.
    #[error("Cannot bind {type_name} to columns {signature}{}: {message}", .row.map(|r| format!(" in row {}", r)).unwrap_or_default())]
    Binding {
        type_name: &'static str,
        signature: String,
        message: String,
        /// The first row with this column shape, once known.
        row: Option<usize>,
    },

    /// A column value could not be converted to its destination type.
    #[error("Row {row}, column '{column}': cannot convert {raw:?} to {type_name}: {source}")]
    Conversion {
        type_name: &'static str,
        column: String,
        raw: String,
        row: usize,
        source: BoxError,
    },
}

impl Error {
    pub(crate) fn parse(message: impl Into<String>, position: u64) -> Self {
        Error::Parse {
            message: message.into(),
            position: Some(position),
        }
    }

    /// Attach the row being read to a binding error that has none yet.
    pub(crate) fn at_row(self, row_number: usize) -> Self {
        match self {
            Error::Binding {
                type_name,
                signature,
                message,
                row: None,
            } => Error::Binding {
                type_name,
                signature,
                message,
                row: Some(row_number),
            },
            other => other,
        }
    }

    /// The 1-based row number for errors raised while reading a specific row.
    pub fn row(&self) -> Option<usize> {
        match self {
            Error::EmptyRow { row } | Error::Conversion { row, .. } => Some(*row),
            Error::Binding { row, .. } => *row,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_with_position() {
        let err = Error::parse("unexpected end of input", 42);
        assert_eq!(
            err.to_string(),
            "XML parse error: unexpected end of input at byte 42"
        );
    }

    #[test]
    fn test_parse_error_display_without_position() {
        let err = Error::Parse {
            message: "bad".to_string(),
            position: None,
        };
        assert_eq!(err.to_string(), "XML parse error: bad");
    }

    #[test]
    fn test_binding_error_gains_row() {
        let err = Error::Binding {
            type_name: "Book",
            signature: "[Title, Author]".to_string(),
            message: "no member matches column 'Author'".to_string(),
            row: None,
        };
        assert_eq!(err.row(), None);
        assert_eq!(
            err.to_string(),
            "Cannot bind Book to columns [Title, Author]: no member matches column 'Author'"
        );

        let err = err.at_row(3).at_row(7);
        assert_eq!(err.row(), Some(3));
        assert_eq!(
            err.to_string(),
            "Cannot bind Book to columns [Title, Author] in row 3: no member matches column 'Author'"
        );
    }

    #[test]
    fn test_conversion_error_keeps_source() {
        let source: BoxError = "invalid digit found in string".into();
        let err = Error::Conversion {
            type_name: "i32",
            column: "NumberOfPages".to_string(),
            raw: "abc".to_string(),
            row: 3,
            source,
        };

        assert_eq!(err.row(), Some(3));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(
            err.to_string(),
            "Row 3, column 'NumberOfPages': cannot convert \"abc\" to i32: invalid digit found in string"
        );
    }
}
