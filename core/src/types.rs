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
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column type of a relation. Every column is a single `u32` word on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    /// Unsigned 32-bit integer, passed through unchanged.
    Number,
    /// Host string, interned by the module and passed as its symbol index.
    String,
}

impl FieldType {
    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::Number => "NUMBER",
            FieldType::String => "STRING",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "NUMBER" => Ok(FieldType::Number),
            "STRING" => Ok(FieldType::String),
            other => Err(Error::UnknownFieldType(other.to_string())),
        }
    }
}

/// Which side of the program a relation's facts flow through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Input,
    Output,
    InputOutput,
}

impl Direction {
    pub fn tag(&self) -> &'static str {
        match self {
            Direction::Input => "INPUT",
            Direction::Output => "OUTPUT",
            Direction::InputOutput => "INPUT_OUTPUT",
        }
    }

    /// True if facts can be added to relations with this direction.
    pub fn accepts_input(&self) -> bool {
        matches!(self, Direction::Input | Direction::InputOutput)
    }

    /// True if facts can be read back from relations with this direction.
    pub fn produces_output(&self) -> bool {
        matches!(self, Direction::Output | Direction::InputOutput)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "INPUT" => Ok(Direction::Input),
            "OUTPUT" => Ok(Direction::Output),
            "INPUT_OUTPUT" => Ok(Direction::InputOutput),
            other => Err(Error::UnknownDirection(other.to_string())),
        }
    }
}

/// A single column value on the host side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Number(u32),
    String(String),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Number(_) => FieldType::Number,
            Value::String(_) => FieldType::String,
        }
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// Declaration of a relation: its name, direction and ordered column types.
///
/// Column order is part of the wire layout. A `Relation` is validated once on
/// construction and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RelationDef")]
pub struct Relation {
    name: String,
    direction: Direction,
    fields: Vec<FieldType>,
}

#[derive(Deserialize)]
struct RelationDef {
    name: String,
    direction: Direction,
    fields: Vec<FieldType>,
}

impl TryFrom<RelationDef> for Relation {
    type Error = Error;

    fn try_from(def: RelationDef) -> Result<Self> {
        Relation::new(def.name, def.direction, def.fields)
    }
}

impl Relation {
    pub fn new(
        name: impl Into<String>,
        direction: Direction,
        fields: impl Into<Vec<FieldType>>,
    ) -> Result<Self> {
        let name = name.into();
        let fields = fields.into();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        if fields.is_empty() {
            return Err(Error::EmptyShape(name));
        }
        Ok(Relation {
            name,
            direction,
            fields,
        })
    }

    /// Build a relation from textual tags, e.g. `("edge", "INPUT", ["NUMBER", "NUMBER"])`.
    pub fn from_tags(name: &str, direction: &str, fields: &[&str]) -> Result<Self> {
        let direction = direction.parse()?;
        let fields = fields
            .iter()
            .map(|tag| tag.parse())
            .collect::<Result<Vec<FieldType>>>()?;
        Relation::new(name, direction, fields)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn fields(&self) -> &[FieldType] {
        &self.fields
    }

    /// Number of columns, which is also the number of `u32` words per row.
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Size in bytes of one encoded row.
    pub fn row_bytes(&self) -> usize {
        self.fields.len() * std::mem::size_of::<u32>()
    }
}
