/*
 * convert.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conversion of raw column text into typed values.
//!
//! Every destination type with a textual representation implements
//! [`GridValue`]. The [`ConverterRegistry`] hands out one shared
//! [`Converter`] per type, built on first request, and lets callers replace
//! the built-in conversion for a type before it is first used.
//!
//! Conversions are culture-invariant: numbers use `.` as the decimal
//! separator and no grouping, and date/time values use the ISO 8601 /
//! RFC 3339 round-trip format.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::BoxError;
use crate::lock;

/// A shared conversion function from raw text to `T`.
pub type Converter<T> = Arc<dyn Fn(&str) -> Result<T, BoxError> + Send + Sync>;

/// A type that can be read from the text of a single column.
pub trait GridValue: Sized + Send + Sync + 'static {
    /// Name used in error messages.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Parse a value from raw column text.
    fn from_grid_text(text: &str) -> Result<Self, BoxError>;
}

impl GridValue for String {
    fn type_name() -> &'static str {
        "String"
    }

    fn from_grid_text(text: &str) -> Result<Self, BoxError> {
        Ok(text.to_string())
    }
}

macro_rules! parsed_values {
    ($($t:ty),* $(,)?) => {
        $(
            impl GridValue for $t {
                fn type_name() -> &'static str {
                    stringify!($t)
                }

                fn from_grid_text(text: &str) -> Result<Self, BoxError> {
                    Ok(text.trim().parse::<$t>()?)
                }
            }
        )*
    };
}

parsed_values!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

impl GridValue for bool {
    fn type_name() -> &'static str {
        "bool"
    }

    fn from_grid_text(text: &str) -> Result<Self, BoxError> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("true") || text == "1" {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") || text == "0" {
            Ok(false)
        } else {
            Err("expected true, false, 1 or 0".into())
        }
    }
}

impl GridValue for char {
    fn type_name() -> &'static str {
        "char"
    }

    fn from_grid_text(text: &str) -> Result<Self, BoxError> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err("expected exactly one character".into()),
        }
    }
}

impl GridValue for DateTime<FixedOffset> {
    fn type_name() -> &'static str {
        "DateTime<FixedOffset>"
    }

    fn from_grid_text(text: &str) -> Result<Self, BoxError> {
        Ok(DateTime::parse_from_rfc3339(text.trim())?)
    }
}

impl GridValue for DateTime<Utc> {
    fn type_name() -> &'static str {
        "DateTime<Utc>"
    }

    fn from_grid_text(text: &str) -> Result<Self, BoxError> {
        Ok(DateTime::parse_from_rfc3339(text.trim())?.with_timezone(&Utc))
    }
}

impl GridValue for NaiveDateTime {
    fn type_name() -> &'static str {
        "NaiveDateTime"
    }

    /// Accepts the round-trip format with or without an offset; an offset
    /// is dropped, keeping the local wall-clock time.
    fn from_grid_text(text: &str) -> Result<Self, BoxError> {
        let text = text.trim();
        let parsed = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.naive_local()))?;
        Ok(parsed)
    }
}

impl GridValue for NaiveDate {
    fn type_name() -> &'static str {
        "NaiveDate"
    }

    fn from_grid_text(text: &str) -> Result<Self, BoxError> {
        Ok(NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")?)
    }
}

impl GridValue for NaiveTime {
    fn type_name() -> &'static str {
        "NaiveTime"
    }

    fn from_grid_text(text: &str) -> Result<Self, BoxError> {
        Ok(NaiveTime::parse_from_str(text.trim(), "%H:%M:%S%.f")?)
    }
}

/// Empty or whitespace-only text reads as `None`.
impl<T: GridValue> GridValue for Option<T> {
    fn from_grid_text(text: &str) -> Result<Self, BoxError> {
        if text.trim().is_empty() {
            Ok(None)
        } else {
            T::from_grid_text(text).map(Some)
        }
    }
}

/// Per-type cache of converters.
///
/// Safe to populate from many threads: two threads racing on the same type
/// may both build a converter, but only the first one inserted survives.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The converter for `T`, building and storing it on first request.
    pub fn converter_for<T: GridValue>(&self) -> Converter<T> {
        let key = TypeId::of::<T>();
        if let Some(entry) = lock::read(&self.converters).get(&key) {
            return downcast::<T>(entry);
        }

        let built: Converter<T> = Arc::new(T::from_grid_text);
        let mut converters = lock::write(&self.converters);
        let entry = converters
            .entry(key)
            .or_insert_with(|| Arc::new(built) as Arc<dyn Any + Send + Sync>);
        downcast::<T>(entry)
    }

    /// Replace the conversion used for `T`.
    ///
    /// Deserializers already synthesized keep the converter they captured,
    /// so register custom converters before the first read that needs them.
    pub fn register<T, F>(&self, converter: F)
    where
        T: GridValue,
        F: Fn(&str) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let converter: Converter<T> = Arc::new(converter);
        lock::write(&self.converters).insert(TypeId::of::<T>(), Arc::new(converter));
    }

    /// Whether a converter for `T` has been built or registered.
    pub fn contains<T: GridValue>(&self) -> bool {
        lock::read(&self.converters).contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        lock::read(&self.converters).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("converters", &self.len())
            .finish()
    }
}

fn downcast<T: GridValue>(entry: &Arc<dyn Any + Send + Sync>) -> Converter<T> {
    let entry: &(dyn Any + Send + Sync) = &**entry;
    entry
        .downcast_ref::<Converter<T>>()
        .cloned()
        .unwrap_or_else(|| unreachable!("converter stored under a mismatched TypeId"))
}
