/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * This file is part of the Eclair WASM Bindings.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 *
 * 1. OPEN SOURCE: You may use this file under the terms of the GNU Affero
 * General Public License v3.0. If you link to this code, your ENTIRE
 * application must be open-sourced under AGPLv3.
 *
 * 2. COMMERCIAL: For proprietary use, you must obtain a Commercial License
 * from Sovereign Systems.
 *
 * PATENT NOTICE: Protected by US Patent App #63/935,467.
 * NO IMPLIED LICENSE to rights of Mohamad Al-Zawahreh or Sovereign Systems.
 */

use crate::error::{Error, Result};
use crate::types::{Direction, FieldType, Relation, Value};
use std::marker::PhantomData;

/// A Rust type that can occupy one column of a fact.
pub trait Column: Sized {
    const FIELD: FieldType;

    fn to_value(&self) -> Value;
    fn from_value(value: Value) -> Result<Self>;
}

impl Column for u32 {
    const FIELD: FieldType = FieldType::Number;

    fn to_value(&self) -> Value {
        Value::Number(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Number(n) => Ok(n),
            other => Err(Error::ValueType {
                expected: FieldType::Number,
                found: other.field_type(),
            }),
        }
    }
}

impl Column for String {
    const FIELD: FieldType = FieldType::String;

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(Error::ValueType {
                expected: FieldType::String,
                found: other.field_type(),
            }),
        }
    }
}

/// A whole fact as a Rust tuple. The tuple's element types fix the relation's
/// shape, e.g. `(u32, String)` is `[NUMBER, STRING]`.
pub trait FactValue: Sized {
    fn shape() -> Vec<FieldType>;
    fn to_values(&self) -> Vec<Value>;
    fn from_values(values: Vec<Value>) -> Result<Self>;
}

/// Take column `index` of a row holding `expected` values.
fn next_column<C: Column>(values: &mut std::vec::IntoIter<Value>, expected: usize, index: usize) -> Result<C> {
    let value = values.next().ok_or(Error::TupleArity { expected, found: index })?;
    C::from_value(value)
}

macro_rules! impl_fact_value {
    ($($column:ident : $index:tt),+) => {
        impl<$($column: Column),+> FactValue for ($($column,)+) {
            fn shape() -> Vec<FieldType> {
                vec![$(<$column as Column>::FIELD),+]
            }

            fn to_values(&self) -> Vec<Value> {
                vec![$(self.$index.to_value()),+]
            }

            fn from_values(values: Vec<Value>) -> Result<Self> {
                let expected = Self::shape().len();
                if values.len() != expected {
                    return Err(Error::TupleArity { expected, found: values.len() });
                }
                let mut values = values.into_iter();
                Ok(($(next_column::<$column>(&mut values, expected, $index)?,)+))
            }
        }
    };
}

impl_fact_value!(A: 0);
impl_fact_value!(A: 0, B: 1);
impl_fact_value!(A: 0, B: 1, C: 2);
impl_fact_value!(A: 0, B: 1, C: 2, D: 3);
impl_fact_value!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_fact_value!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_fact_value!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_fact_value!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

// =============================================================================
// Direction markers
// =============================================================================

/// Type-level relation direction.
pub trait DirectionMarker {
    const DIRECTION: Direction;
}

/// Directions that accept `add_fact` / `add_facts`.
pub trait Insert: DirectionMarker {}

/// Directions that allow `get_facts`.
pub trait Retrieve: DirectionMarker {}

#[derive(Debug, Clone, Copy)]
pub struct Input;

#[derive(Debug, Clone, Copy)]
pub struct Output;

#[derive(Debug, Clone, Copy)]
pub struct InputOutput;

impl DirectionMarker for Input {
    const DIRECTION: Direction = Direction::Input;
}

impl DirectionMarker for Output {
    const DIRECTION: Direction = Direction::Output;
}

impl DirectionMarker for InputOutput {
    const DIRECTION: Direction = Direction::InputOutput;
}

impl Insert for Input {}
impl Insert for InputOutput {}
impl Retrieve for Output {}
impl Retrieve for InputOutput {}

/// A relation declaration whose direction and tuple type are known statically.
#[derive(Debug, Clone)]
pub struct Fact<D, T> {
    relation: Relation,
    _marker: PhantomData<fn() -> (D, T)>,
}

impl<D: DirectionMarker, T: FactValue> Fact<D, T> {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Ok(Fact {
            relation: Relation::new(name, D::DIRECTION, T::shape())?,
            _marker: PhantomData,
        })
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    pub fn name(&self) -> &str {
        self.relation.name()
    }
}
