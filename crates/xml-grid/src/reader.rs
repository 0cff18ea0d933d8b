/*
 * reader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The public entry point: drive a cursor over a document and materialize
//! its rows.

use std::io::BufRead;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::binding::{Deserializer, synthesize};
use crate::cache::DeserializerCache;
use crate::convert::ConverterRegistry;
use crate::cursor::GridCursor;
use crate::options::GridOptions;
use crate::record::Record;
use crate::row::RowBuffer;
use crate::shape::GridRow;
use crate::{Error, Result};

static GLOBAL: Lazy<GridReader> = Lazy::new(GridReader::new);

/// Reads grid documents into typed rows or [`Record`]s.
///
/// A reader owns its converter registry and deserializer cache, so
/// synthesis for a given (type, column order) happens once per reader no
/// matter how many documents it reads. Readers are `Sync`; share one across
/// threads rather than creating one per call.
///
/// ```rust
/// use xml_grid::GridReader;
///
/// let reader = GridReader::new();
/// let titles: Vec<String> =
///     reader.read("<Data><Row><Title>Dune</Title></Row><Row><Title>Emma</Title></Row></Data>")?;
/// assert_eq!(titles, ["Dune", "Emma"]);
/// # Ok::<(), xml_grid::Error>(())
/// ```
#[derive(Debug)]
pub struct GridReader {
    options: GridOptions,
    registry: Arc<ConverterRegistry>,
    cache: DeserializerCache,
}

impl Default for GridReader {
    fn default() -> Self {
        Self::new()
    }
}

impl GridReader {
    pub fn new() -> Self {
        Self::with_options(GridOptions::default())
    }

    pub fn with_options(options: GridOptions) -> Self {
        Self::with_registry(options, Arc::new(ConverterRegistry::new()))
    }

    /// A reader using `registry` for value conversion, which may be shared
    /// with other readers.
    pub fn with_registry(options: GridOptions, registry: Arc<ConverterRegistry>) -> Self {
        Self {
            options,
            registry,
            cache: DeserializerCache::new(),
        }
    }

    /// The process-wide reader behind [`crate::read`] and [`crate::read_records`],
    /// created on first use with default options.
    pub fn global() -> &'static GridReader {
        &GLOBAL
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &DeserializerCache {
        &self.cache
    }

    /// Read every row of `xml` as a `T`, in document order.
    ///
    /// A grid without rows yields an empty vector without binding `T` at
    /// all. Otherwise the first failure aborts the read.
    pub fn read<T: GridRow>(&self, xml: &str) -> Result<Vec<T>> {
        self.read_rows(GridCursor::from_str(xml, &self.options))
    }

    /// Like [`read`](Self::read), over a buffered stream. The stream is
    /// dropped when the call returns.
    pub fn read_from<T: GridRow, R: BufRead>(&self, reader: R) -> Result<Vec<T>> {
        self.read_rows(GridCursor::from_reader(reader, &self.options))
    }

    /// Like [`read`](Self::read), for UTF-16 text.
    pub fn read_utf16<T: GridRow>(&self, xml: &[u16]) -> Result<Vec<T>> {
        self.read(&decode_utf16(xml)?)
    }

    /// Read every row of `xml` as a [`Record`], in document order.
    pub fn read_records(&self, xml: &str) -> Result<Vec<Record>> {
        self.collect_records(GridCursor::from_str(xml, &self.options))
    }

    pub fn read_records_from<R: BufRead>(&self, reader: R) -> Result<Vec<Record>> {
        self.collect_records(GridCursor::from_reader(reader, &self.options))
    }

    fn read_rows<T: GridRow, R: BufRead>(&self, mut cursor: GridCursor<R>) -> Result<Vec<T>> {
        let mut items = Vec::new();
        if !cursor.move_to_grid()? {
            debug!(target_type = std::any::type_name::<T>(), rows = 0, "read grid");
            return Ok(items);
        }

        let mut row = RowBuffer::new();
        let mut current: Option<Arc<Deserializer<T>>> = None;

        while cursor.read_row(&mut row)? {
            let deserializer = match current.take() {
                Some(d) if row.matches(d.signature()) => d,
                previous => {
                    if let Some(previous) = previous {
                        trace!(
                            target_type = std::any::type_name::<T>(),
                            row = cursor.rows_read(),
                            from = %previous.signature(),
                            "row shape changed"
                        );
                    }
                    self.deserializer_for::<T>(&row)
                        .map_err(|err| err.at_row(cursor.rows_read()))?
                }
            };
            items.push(deserializer.deserialize(&row, cursor.rows_read())?);
            current = Some(deserializer);
        }

        debug!(
            target_type = std::any::type_name::<T>(),
            rows = items.len(),
            "read grid"
        );
        Ok(items)
    }

    fn deserializer_for<T: GridRow>(&self, row: &RowBuffer) -> Result<Arc<Deserializer<T>>> {
        let signature = row.signature();
        self.cache.get_or_insert_with(&signature, |shape| {
            synthesize(shape, &signature, &self.registry)
        })
    }

    fn collect_records<R: BufRead>(&self, mut cursor: GridCursor<R>) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        if cursor.move_to_grid()? {
            let mut row = RowBuffer::new();
            while cursor.read_row(&mut row)? {
                records.push(Record::from(&row));
            }
        }
        debug!(rows = records.len(), "read records");
        Ok(records)
    }
}

fn decode_utf16(xml: &[u16]) -> Result<String> {
    String::from_utf16(xml).map_err(|err| Error::Argument {
        message: format!("input is not valid UTF-16: {}", err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Arguments, BuildFn, Member, TargetShape};

    #[derive(Debug, Default, PartialEq)]
    struct Book {
        title: String,
        pages: i32,
    }

    impl GridRow for Book {
        fn shape() -> TargetShape<Self> {
            TargetShape::properties(
                Book::default,
                vec![
                    Member::new::<String>("Title", |b: &mut Book, v| b.title = v),
                    Member::new::<i32>("Pages", |b: &mut Book, v| b.pages = v),
                ],
            )
        }
    }

    /// Constructor-bound with no parameters: no row with columns binds.
    #[derive(Debug, PartialEq)]
    struct Unbindable;

    impl GridRow for Unbindable {
        fn shape() -> TargetShape<Self> {
            TargetShape::constructor(Vec::new(), |_: &ConverterRegistry| -> BuildFn<Unbindable> {
                Box::new(|_: &mut Arguments<'_>| -> Result<Unbindable> { Ok(Unbindable) })
            })
        }
    }

    fn book(title: &str, pages: i32) -> Book {
        Book {
            title: title.to_string(),
            pages,
        }
    }

    #[test]
    fn test_scalar_rows() {
        let reader = GridReader::new();
        let values: Vec<String> = reader
            .read("<Root><Row><Col1>a</Col1></Row><Row><Col1>b</Col1></Row></Root>")
            .unwrap();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_grid_never_binds() {
        let reader = GridReader::new();
        assert!(reader.read::<Unbindable>("<Root/>").unwrap().is_empty());
        assert!(reader.read::<Unbindable>("<Root></Root>").unwrap().is_empty());
        assert_eq!(reader.cache().type_count(), 0);

        let err = reader
            .read::<Unbindable>("<Root><Row><A>1</A></Row></Root>")
            .unwrap_err();
        assert!(matches!(err, Error::Binding { .. }));
        assert_eq!(err.row(), Some(1));
    }

    #[test]
    fn test_row_shape_change_rebinds() {
        let reader = GridReader::new();
        let books: Vec<Book> = reader
            .read(
                "<Data>\
                   <Row><Title>Dune</Title><Pages>412</Pages></Row>\
                   <Row><Pages>474</Pages><Title>Emma</Title></Row>\
                   <Row><Title>Ulysses</Title></Row>\
                 </Data>",
            )
            .unwrap();

        assert_eq!(
            books,
            vec![book("Dune", 412), book("Emma", 474), book("Ulysses", 0)]
        );
        assert_eq!(reader.cache().signature_count::<Book>(), 3);
    }

    #[test]
    fn test_first_error_aborts_read() {
        let reader = GridReader::new();
        let err = reader
            .read::<Book>(
                "<Data><Row><Title>Dune</Title><Pages>412</Pages></Row>\
                 <Row><Title>Emma</Title><Pages>many</Pages></Row></Data>",
            )
            .unwrap_err();
        assert_eq!(err.row(), Some(2));
        assert!(matches!(err, Error::Conversion { .. }));

        let err = reader
            .read::<Book>(
                "<Data><Row><Title>Dune</Title></Row>\
                 <Row><Title>Emma</Title></Row>\
                 <Row><Title>Ulysses</Title><Author>Joyce</Author></Row></Data>",
            )
            .unwrap_err();
        assert_eq!(err.row(), Some(3));
        assert!(matches!(err, Error::Binding { .. }));
        assert!(err.to_string().contains("in row 3"), "{err}");
    }

    #[test]
    fn test_binding_error_is_not_cached() {
        let reader = GridReader::new();
        let xml = "<Data><Row><Author>Herbert</Author></Row></Data>";
        assert!(matches!(reader.read::<Book>(xml), Err(Error::Binding { .. })));
        assert!(matches!(reader.read::<Book>(xml), Err(Error::Binding { .. })));
        assert_eq!(reader.cache().signature_count::<Book>(), 0);
    }

    #[test]
    fn test_empty_document_is_argument_error() {
        let reader = GridReader::new();
        assert!(matches!(reader.read::<String>(""), Err(Error::Argument { .. })));
        assert!(matches!(reader.read_records(" \n"), Err(Error::Argument { .. })));
    }

    #[test]
    fn test_read_from_stream() {
        let reader = GridReader::new();
        let input = std::io::Cursor::new("<Data><Row><Pages>9</Pages><Title>X</Title></Row></Data>");
        let books: Vec<Book> = reader.read_from(input).unwrap();
        assert_eq!(books, vec![book("X", 9)]);
    }

    #[test]
    fn test_read_utf16() {
        let reader = GridReader::new();
        let xml: Vec<u16> = "<Data><Row><N>7</N></Row></Data>".encode_utf16().collect();
        assert_eq!(reader.read_utf16::<u8>(&xml).unwrap(), vec![7]);

        let invalid = [0xD800u16, 0x003C];
        assert!(matches!(
            reader.read_utf16::<u8>(&invalid),
            Err(Error::Argument { .. })
        ));
    }

    #[test]
    fn test_records() {
        let reader = GridReader::new();
        let records = reader
            .read_records("<Data><Row><B>2</B><A>1</A></Row><Row><C/></Row></Data>")
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].columns().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(records[1].get("C"), Some(""));
    }

    #[test]
    fn test_records_from_empty_grid() {
        let reader = GridReader::new();
        assert!(reader.read_records("<Root/>").unwrap().is_empty());
        let input = std::io::Cursor::new(b"<Root></Root>".to_vec());
        assert!(reader.read_records_from(input).unwrap().is_empty());
    }

    #[test]
    fn test_registered_converter_is_used() {
        let registry = Arc::new(ConverterRegistry::new());
        registry.register::<bool, _>(|text| Ok(text == "Y"));
        let reader = GridReader::with_registry(GridOptions::default(), registry);

        let flags: Vec<bool> = reader
            .read("<Data><Row><F>Y</F></Row><Row><F>N</F></Row></Data>")
            .unwrap();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn test_trim_values_option() {
        let reader = GridReader::with_options(GridOptions::new().with_trim_values(true));
        let values: Vec<String> = reader.read("<Data><Row><A>  x  </A></Row></Data>").unwrap();
        assert_eq!(values, vec!["x"]);
    }
}
