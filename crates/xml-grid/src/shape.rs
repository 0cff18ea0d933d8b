/*
 * shape.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Target types and their binding shapes.
//!
//! A type readable from a grid implements [`GridRow`], describing once how
//! its instances are built: from a single column ([`TargetShape::Scalar`]),
//! from positional constructor arguments ([`TargetShape::Constructor`]), or
//! by assigning named members of a default instance
//! ([`TargetShape::Properties`]). `#[derive(GridRow)]` writes this
//! description for structs.
//!
//! ```rust
//! use xml_grid::{GridRow, Member, TargetShape};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Book {
//!     title: String,
//!     pages: i32,
//! }
//!
//! impl GridRow for Book {
//!     fn shape() -> TargetShape<Self> {
//!         TargetShape::properties(
//!             Book::default,
//!             vec![
//!                 Member::new::<String>("Title", |book: &mut Book, value| book.title = value),
//!                 Member::new::<i32>("Pages", |book: &mut Book, value| book.pages = value),
//!             ],
//!         )
//!     }
//! }
//!
//! let books: Vec<Book> =
//!     xml_grid::read("<Data><Row><Pages>412</Pages><Title>Dune</Title></Row></Data>").unwrap();
//! assert_eq!(books, vec![Book { title: "Dune".into(), pages: 412 }]);
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::convert::{Converter, ConverterRegistry, GridValue};
use crate::error::BoxError;
use crate::row::RowBuffer;
use crate::signature::ColumnSignature;
use crate::{Error, Result};

/// A type that can be built from one grid row.
pub trait GridRow: Sized + Send + 'static {
    /// How instances are built. Called once per type per cache.
    fn shape() -> TargetShape<Self>;
}

/// The binding requirements of a target type.
pub enum TargetShape<T> {
    /// The single column of a row converts directly into `T`.
    Scalar(Scalar<T>),
    /// Columns map positionally onto constructor parameters.
    Constructor(Constructor<T>),
    /// Columns map by name onto members of a default instance.
    Properties(Properties<T>),
}

impl<T: GridValue> TargetShape<T> {
    pub fn scalar() -> Self {
        TargetShape::Scalar(Scalar {
            type_name: T::type_name(),
            compile: |registry: &ConverterRegistry| registry.converter_for::<T>(),
        })
    }
}

impl<T> TargetShape<T> {
    pub fn constructor(parameters: Vec<Parameter>, compile: fn(&ConverterRegistry) -> BuildFn<T>) -> Self {
        TargetShape::Constructor(Constructor {
            parameters,
            compile,
        })
    }

    pub fn properties(init: fn() -> T, members: Vec<Member<T>>) -> Self {
        TargetShape::Properties(Properties { init, members })
    }
}

pub struct Scalar<T> {
    pub(crate) type_name: &'static str,
    pub(crate) compile: fn(&ConverterRegistry) -> Converter<T>,
}

/// A constructor parameter: its name and destination type, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: &'static str,
    pub type_name: &'static str,
}

impl Parameter {
    pub fn of<V: GridValue>(name: &'static str) -> Self {
        Self {
            name,
            type_name: V::type_name(),
        }
    }
}

/// Builds an instance from the positional arguments of one row.
pub type BuildFn<T> = Box<dyn Fn(&mut Arguments<'_>) -> Result<T> + Send + Sync>;

pub struct Constructor<T> {
    pub(crate) parameters: Vec<Parameter>,
    /// Resolves converters once and returns the per-row build function.
    pub(crate) compile: fn(&ConverterRegistry) -> BuildFn<T>,
}

impl<T> Constructor<T> {
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

/// Assigns one converted column value to an instance.
pub(crate) type Setter<T> = Box<dyn Fn(&mut T, &str) -> std::result::Result<(), BoxError> + Send + Sync>;

/// A settable member of a property-bound type.
pub struct Member<T> {
    name: &'static str,
    type_name: &'static str,
    required: bool,
    compile: Box<dyn Fn(&ConverterRegistry) -> Setter<T> + Send + Sync>,
}

impl<T: 'static> Member<T> {
    /// A member bound from the column called `name`.
    pub fn new<V: GridValue>(name: &'static str, assign: fn(&mut T, V)) -> Self {
        Self {
            name,
            type_name: V::type_name(),
            required: false,
            compile: Box::new(move |registry: &ConverterRegistry| -> Setter<T> {
                let convert = registry.converter_for::<V>();
                Box::new(move |target: &mut T, raw: &str| -> std::result::Result<(), BoxError> {
                    assign(target, convert(raw)?);
                    Ok(())
                })
            }),
        }
    }
}

impl<T> Member<T> {
    /// Make a missing column a binding error instead of keeping the default.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn compile(&self, registry: &ConverterRegistry) -> Setter<T> {
        (self.compile)(registry)
    }
}

pub struct Properties<T> {
    pub(crate) init: fn() -> T,
    pub(crate) members: Vec<Member<T>>,
}

impl<T> Properties<T> {
    pub fn members(&self) -> &[Member<T>] {
        &self.members
    }

    /// The member bound from column `name`; names are case-sensitive.
    pub fn member(&self, name: &str) -> Option<&Member<T>> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Positional access to the values of one row during construction.
pub struct Arguments<'a> {
    row: &'a RowBuffer,
    signature: &'a ColumnSignature,
    row_number: usize,
    next: usize,
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(row: &'a RowBuffer, signature: &'a ColumnSignature, row_number: usize) -> Self {
        Self {
            row,
            signature,
            row_number,
            next: 0,
        }
    }

    /// Convert the next column value with `converter`.
    pub fn convert<V: GridValue>(&mut self, converter: &Converter<V>) -> Result<V> {
        let index = self.next;
        let (Some(column), Some(raw)) = (self.row.name(index), self.row.value(index)) else {
            return Err(Error::Binding {
                type_name: V::type_name(),
                signature: self.signature.to_string(),
                message: format!("constructor argument {} has no column", index + 1),
                row: Some(self.row_number),
            });
        };
        self.next += 1;

        converter(raw).map_err(|source| Error::Conversion {
            type_name: V::type_name(),
            column: column.to_string(),
            raw: raw.to_string(),
            row: self.row_number,
            source,
        })
    }

    /// Number of values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.row.len().saturating_sub(self.next)
    }
}

macro_rules! scalar_rows {
    ($($t:ty),* $(,)?) => {
        $(
            impl GridRow for $t {
                fn shape() -> TargetShape<Self> {
                    TargetShape::scalar()
                }
            }
        )*
    };
}

scalar_rows!(
    String,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    DateTime<FixedOffset>,
    DateTime<Utc>,
    NaiveDateTime,
    NaiveDate,
    NaiveTime,
);

impl<T: GridValue> GridRow for Option<T> {
    fn shape() -> TargetShape<Self> {
        TargetShape::scalar()
    }
}
