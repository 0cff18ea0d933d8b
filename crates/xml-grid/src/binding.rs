/*
 * binding.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Binding synthesis: turning a target shape and a column signature into a
//! reusable [`Deserializer`].
//!
//! All name resolution and converter lookup happens here, once per
//! (type, signature) pair. Applying a deserializer to a row walks
//! pre-resolved, position-indexed plans only.

use std::fmt;

use crate::convert::{Converter, ConverterRegistry};
use crate::row::RowBuffer;
use crate::shape::{BuildFn, Setter, TargetShape};
use crate::signature::ColumnSignature;
use crate::{Error, Result};

/// How a deserializer maps columns onto an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingStrategy {
    /// The only column converts into the target type.
    Scalar,
    /// Columns are constructor arguments, in document order.
    Positional,
    /// Columns are assigned to the members with the same names.
    ByName,
}

impl fmt::Display for BindingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingStrategy::Scalar => "scalar",
            BindingStrategy::Positional => "constructor-positional",
            BindingStrategy::ByName => "property-by-name",
        };
        f.write_str(name)
    }
}

struct BoundMember<T> {
    type_name: &'static str,
    setter: Setter<T>,
}

enum Plan<T> {
    Scalar {
        type_name: &'static str,
        convert: Converter<T>,
    },
    Positional {
        build: BuildFn<T>,
    },
    ByName {
        init: fn() -> T,
        /// One entry per column, in signature order.
        members: Vec<BoundMember<T>>,
    },
}

/// A compiled mapping from one row's buffered values to a `T`.
///
/// Bound to exactly one column signature; immutable once built.
pub struct Deserializer<T> {
    signature: ColumnSignature,
    plan: Plan<T>,
}

impl<T> Deserializer<T> {
    pub fn signature(&self) -> &ColumnSignature {
        &self.signature
    }

    pub fn strategy(&self) -> BindingStrategy {
        match self.plan {
            Plan::Scalar { .. } => BindingStrategy::Scalar,
            Plan::Positional { .. } => BindingStrategy::Positional,
            Plan::ByName { .. } => BindingStrategy::ByName,
        }
    }

    /// Build an instance from `row`, whose columns must match this
    /// deserializer's signature. `row_number` is 1-based and only used in
    /// error reports.
    pub fn deserialize(&self, row: &RowBuffer, row_number: usize) -> Result<T> {
        debug_assert!(row.matches(&self.signature));

        match &self.plan {
            Plan::Scalar { type_name, convert } => {
                let (Some(column), Some(raw)) = (row.name(0), row.value(0)) else {
                    return Err(Error::EmptyRow { row: row_number });
                };
                convert(raw).map_err(|source| Error::Conversion {
                    type_name: *type_name,
                    column: column.to_string(),
                    raw: raw.to_string(),
                    row: row_number,
                    source,
                })
            }
            Plan::Positional { build } => {
                let mut args = crate::shape::Arguments::new(row, &self.signature, row_number);
                build(&mut args)
            }
            Plan::ByName { init, members } => {
                let mut instance = init();
                for (member, (column, raw)) in members.iter().zip(row.iter()) {
                    (member.setter)(&mut instance, raw).map_err(|source| Error::Conversion {
                        type_name: member.type_name,
                        column: column.to_string(),
                        raw: raw.to_string(),
                        row: row_number,
                        source,
                    })?;
                }
                Ok(instance)
            }
        }
    }
}

impl<T> fmt::Debug for Deserializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deserializer")
            .field("type", &std::any::type_name::<T>())
            .field("signature", &self.signature)
            .field("strategy", &self.strategy())
            .finish()
    }
}

/// Synthesize the deserializer for `T` and `signature`.
///
/// Fails with [`Error::Binding`] when the columns cannot be mapped onto the
/// shape: more than one column for a scalar, a column count different from
/// the constructor's parameter count, or, for property-bound types, an
/// unknown or repeated column name or a missing required member.
pub fn synthesize<T>(
    shape: &TargetShape<T>,
    signature: &ColumnSignature,
    registry: &ConverterRegistry,
) -> Result<Deserializer<T>> {
    let binding_error = |message: String| Error::Binding {
        type_name: std::any::type_name::<T>(),
        signature: signature.to_string(),
        message,
        row: None,
    };

    if signature.is_empty() {
        return Err(binding_error("no columns".to_string()));
    }

    let plan = match shape {
        TargetShape::Scalar(scalar) => {
            if signature.len() != 1 {
                return Err(binding_error(format!(
                    "a scalar target reads exactly one column, found {}",
                    signature.len()
                )));
            }
            Plan::Scalar {
                type_name: scalar.type_name,
                convert: (scalar.compile)(registry),
            }
        }
        TargetShape::Constructor(constructor) => {
            let expected = constructor.parameters.len();
            if expected != signature.len() {
                return Err(binding_error(format!(
                    "constructor takes {} parameters but the row has {} columns",
                    expected,
                    signature.len()
                )));
            }
            // Columns are taken in document order; names are not reconciled
            // with parameter names.
            Plan::Positional {
                build: (constructor.compile)(registry),
            }
        }
        TargetShape::Properties(properties) => {
            if let Some(name) = signature.first_duplicate() {
                return Err(binding_error(format!("column '{}' appears more than once", name)));
            }

            let mut members = Vec::with_capacity(signature.len());
            for column in signature.names() {
                let member = properties.member(column).ok_or_else(|| {
                    binding_error(format!("no member matches column '{}'", column))
                })?;
                members.push(BoundMember {
                    type_name: member.type_name(),
                    setter: member.compile(registry),
                });
            }

            if let Some(missing) = properties
                .members()
                .iter()
                .find(|m| m.is_required() && signature.position(m.name()).is_none())
            {
                return Err(binding_error(format!(
                    "required member '{}' has no column",
                    missing.name()
                )));
            }

            Plan::ByName {
                init: properties.init,
                members,
            }
        }
    };

    Ok(Deserializer {
        signature: signature.clone(),
        plan,
    })
}
