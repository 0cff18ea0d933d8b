/*
 * cursor.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pull-style cursor over the grid structure.
//!
//! A grid is a root element whose children are rows and whose grandchildren
//! are columns with text content. Element names at the root and row level are
//! irrelevant; column names are whatever the document contains. The cursor is
//! single-pass: exactly one row is current at a time.

use std::borrow::Cow;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;

use crate::options::GridOptions;
use crate::row::RowBuffer;
use crate::{Error, Result};

/// A structural token, with everything the cursor ignores already skipped.
enum Token {
    Start(String),
    Empty(String),
    End,
    Text(String),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// The root element has not been reached yet.
    Unopened,
    /// Positioned on a row start tag.
    AtRow { self_closing: bool },
    /// The root element is closed (or was self-closing).
    Finished,
}

/// Sequential reader of grid rows.
pub struct GridCursor<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    state: State,
    rows_read: usize,
    saw_markup: bool,
    trim_values: bool,
    max_rows: Option<usize>,
}

impl<'a> GridCursor<&'a [u8]> {
    /// Create a cursor over an in-memory document.
    pub fn from_str(xml: &'a str, options: &GridOptions) -> Self {
        Self::new(Reader::from_str(xml), options)
    }
}

impl<R: BufRead> GridCursor<R> {
    /// Create a cursor over a buffered stream. The stream is owned by the
    /// cursor and released when the cursor is dropped.
    pub fn from_reader(reader: R, options: &GridOptions) -> Self {
        Self::new(Reader::from_reader(reader), options)
    }

    fn new(mut reader: Reader<R>, options: &GridOptions) -> Self {
        let config = reader.config_mut();
        config.trim_text_start = false;
        config.trim_text_end = false;
        config.check_end_names = options.check_end_names;
        config.expand_empty_elements = false;

        Self {
            reader,
            buf: Vec::new(),
            state: State::Unopened,
            rows_read: 0,
            saw_markup: false,
            trim_values: options.trim_values,
            max_rows: options.max_rows,
        }
    }

    /// Position on the first row, if there is one.
    ///
    /// Returns `false` for a root element without rows (`<Root/>` or
    /// `<Root></Root>`), which is a valid, empty grid.
    pub fn move_to_grid(&mut self) -> Result<bool> {
        if self.state == State::Unopened {
            self.open_root()?;
        }
        Ok(matches!(self.state, State::AtRow { .. }))
    }

    /// Consume the current row into `row` and advance to the next row or to
    /// the end of the grid.
    ///
    /// Returns `false` once no rows remain; `row` is left empty in that case.
    pub fn read_row(&mut self, row: &mut RowBuffer) -> Result<bool> {
        row.clear();

        if self.state == State::Unopened {
            self.open_root()?;
        }
        let self_closing = match self.state {
            State::AtRow { self_closing } => self_closing,
            State::Unopened | State::Finished => return Ok(false),
        };

        let number = self.rows_read + 1;
        if let Some(max_rows) = self.max_rows {
            if number > max_rows {
                return Err(self.error(format!(
                    "document has more than {} rows",
                    max_rows
                )));
            }
        }

        if self_closing {
            return Err(Error::EmptyRow { row: number });
        }

        loop {
            match self.next_token()? {
                Token::Start(name) => {
                    let value = self.read_column_text(&name)?;
                    row.push(name, value);
                }
                Token::Empty(name) => row.push(name, String::new()),
                Token::End => break,
                Token::Text(text) if is_blank(&text) => {}
                Token::Text(_) => {
                    return Err(self.error(format!("text content directly inside row {}", number)));
                }
                Token::Eof => {
                    return Err(self.error(format!("unexpected end of input inside row {}", number)));
                }
            }
        }

        if row.is_empty() {
            return Err(Error::EmptyRow { row: number });
        }

        self.rows_read = number;
        self.advance_to_row()?;
        Ok(true)
    }

    /// Number of rows consumed so far; also the 1-based number of the last row read.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Byte offset of the cursor in the input.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position()
    }

    fn open_root(&mut self) -> Result<()> {
        loop {
            match self.next_token()? {
                Token::Start(_) => return self.advance_to_row(),
                Token::Empty(_) => return self.finish_document(),
                Token::Text(text) if is_blank(&text) => {}
                Token::Text(_) => {
                    return Err(self.error("text content outside the root element"));
                }
                Token::End => {
                    return Err(self.error("closing tag before the root element"));
                }
                Token::Eof if !self.saw_markup => {
                    return Err(Error::Argument {
                        message: "no document: input is empty".to_string(),
                    });
                }
                Token::Eof => return Err(self.error("no root element found")),
            }
        }
    }

    fn advance_to_row(&mut self) -> Result<()> {
        loop {
            match self.next_token()? {
                Token::Start(_) => {
                    self.state = State::AtRow {
                        self_closing: false,
                    };
                    return Ok(());
                }
                Token::Empty(_) => {
                    self.state = State::AtRow { self_closing: true };
                    return Ok(());
                }
                Token::End => return self.finish_document(),
                Token::Text(text) if is_blank(&text) => {}
                Token::Text(_) => return Err(self.error("text content between rows")),
                Token::Eof => {
                    return Err(self.error("unexpected end of input: root element is not closed"));
                }
            }
        }
    }

    fn finish_document(&mut self) -> Result<()> {
        loop {
            match self.next_token()? {
                Token::Eof => {
                    self.state = State::Finished;
                    return Ok(());
                }
                Token::Text(text) if is_blank(&text) => {}
                Token::Start(_) | Token::Empty(_) => {
                    return Err(self.error("multiple root elements"));
                }
                Token::Text(_) => {
                    return Err(self.error("text content after the root element"));
                }
                Token::End => {
                    return Err(self.error("closing tag after the root element"));
                }
            }
        }
    }

    fn read_column_text(&mut self, column: &str) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                Token::Text(content) => text.push_str(&content),
                Token::End => break,
                Token::Start(child) | Token::Empty(child) => {
                    return Err(self.error(format!(
                        "element <{}> nested inside column <{}>",
                        child, column
                    )));
                }
                Token::Eof => {
                    return Err(self.error(format!(
                        "unexpected end of input inside column <{}>",
                        column
                    )));
                }
            }
        }

        if is_blank(&text) {
            text.clear();
        } else if self.trim_values {
            text = text.trim().to_string();
        }
        Ok(text)
    }

    fn next_token(&mut self) -> Result<Token> {
        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|err| Error::parse(err.to_string(), self.reader.error_position()))?;

            let token = match event {
                Event::Start(e) => Token::Start(decode_name(e.name().as_ref(), position)?),
                Event::Empty(e) => Token::Empty(decode_name(e.name().as_ref(), position)?),
                Event::End(_) => Token::End,
                Event::Text(e) => {
                    // Line ends are normalized before unescaping so that an
                    // escaped `&#13;` still reads as a carriage return.
                    let raw = normalize_line_ends(&e);
                    let text = std::str::from_utf8(&raw)
                        .map_err(|err| err.to_string())
                        .and_then(|text| unescape(text).map_err(|err| err.to_string()))
                        .map_err(|err| {
                            Error::parse(format!("invalid text content: {}", err), position)
                        })?;
                    Token::Text(text.into_owned())
                }
                Event::CData(e) => {
                    let raw = normalize_line_ends(&e);
                    let text = std::str::from_utf8(&raw).map_err(|err| {
                        Error::parse(format!("invalid CDATA content: {}", err), position)
                    })?;
                    Token::Text(text.to_string())
                }
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {
                    self.saw_markup = true;
                    continue;
                }
                Event::Eof => Token::Eof,
            };

            if !matches!(token, Token::Text(_) | Token::Eof) {
                self.saw_markup = true;
            }
            return Ok(token);
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(message, self.position())
    }
}

fn decode_name(name: &[u8], position: u64) -> Result<String> {
    std::str::from_utf8(name)
        .map(str::to_string)
        .map_err(|err| Error::parse(format!("invalid element name: {}", err), position))
}

/// XML whitespace only (space, tab, CR, LF); also true for the empty string.
fn is_blank(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}

/// XML end-of-line handling: `\r\n` and a lone `\r` both become `\n`.
fn normalize_line_ends(raw: &[u8]) -> Cow<'_, [u8]> {
    if !raw.contains(&b'\r') {
        return Cow::Borrowed(raw);
    }

    let mut normalized = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        if b == b'\r' {
            normalized.push(b'\n');
            bytes.next_if_eq(&b'\n');
        } else {
            normalized.push(b);
        }
    }
    Cow::Owned(normalized)
}
