/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Schema-free deserialization of row-oriented XML grids.
//!
//! A grid is a root element holding repeated row elements, each holding
//! named column elements with text content:
//!
//! ```xml
//! <Books>
//!   <Book><Title>Dune</Title><Pages>412</Pages></Book>
//!   <Book><Pages>474</Pages><Title>Emma</Title></Book>
//! </Books>
//! ```
//!
//! Rows are read into any type implementing [`GridRow`]. The column shape
//! of each row is discovered from the document; for every distinct
//! (type, column order) pair a [`Deserializer`] is synthesized once and
//! cached, so reading many rows of the same shape costs one name lookup
//! per document rather than one per value.
//!
//! ```rust
//! use xml_grid::GridRow;
//!
//! #[derive(Debug, Default, PartialEq, GridRow)]
//! #[grid(rename_all = "PascalCase")]
//! struct Book {
//!     title: String,
//!     pages: u32,
//! }
//!
//! let books: Vec<Book> = xml_grid::read(
//!     "<Books>
//!        <Book><Title>Dune</Title><Pages>412</Pages></Book>
//!        <Book><Pages>474</Pages><Title>Emma</Title></Book>
//!      </Books>",
//! )?;
//! assert_eq!(books[1], Book { title: "Emma".into(), pages: 474 });
//! # Ok::<(), xml_grid::Error>(())
//! ```
//!
//! Types without a fixed schema can be read as [`Record`]s instead.

// Lets `#[derive(GridRow)]` output, which names `::xml_grid`, build inside this crate.
extern crate self as xml_grid;

pub mod binding;
pub mod cache;
pub mod convert;
pub mod cursor;
pub mod error;
mod lock;
pub mod options;
pub mod reader;
pub mod record;
pub mod row;
pub mod shape;
pub mod signature;

pub use binding::{BindingStrategy, Deserializer, synthesize};
pub use cache::DeserializerCache;
pub use convert::{Converter, ConverterRegistry, GridValue};
pub use cursor::GridCursor;
pub use error::{BoxError, Error, Result};
pub use options::GridOptions;
pub use reader::GridReader;
pub use record::Record;
pub use row::RowBuffer;
pub use shape::{Arguments, BuildFn, GridRow, Member, Parameter, TargetShape};
pub use signature::ColumnSignature;

#[cfg(feature = "derive")]
pub use xml_grid_derive::GridRow;

/// Read every row of `xml` as a `T` with the process-wide [`GridReader`].
pub fn read<T: GridRow>(xml: &str) -> Result<Vec<T>> {
    GridReader::global().read(xml)
}

/// Read every row of `xml` as a [`Record`] with the process-wide [`GridReader`].
pub fn read_records(xml: &str) -> Result<Vec<Record>> {
    GridReader::global().read_records(xml)
}
