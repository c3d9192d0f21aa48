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

use crate::types::{Direction, FieldType};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    // Declaration / derivation time
    #[error("Relation name must not be empty")]
    EmptyName,
    #[error("Relation '{0}' declares no fields")]
    EmptyShape(String),
    #[error("Unknown field type '{0}' (expected NUMBER or STRING)")]
    UnknownFieldType(String),
    #[error("Unknown direction '{0}' (expected INPUT, OUTPUT or INPUT_OUTPUT)")]
    UnknownDirection(String),
    #[error("Relation '{0}' is declared more than once")]
    DuplicateRelation(String),
    #[error("Relation '{0}' is not declared in this program")]
    UnknownRelation(String),
    #[error("Relation '{name}' is {direction} and has no {operation} operations")]
    DirectionMismatch {
        name: String,
        direction: Direction,
        operation: &'static str,
    },

    // Module binding
    #[error("Module does not export '{0}'")]
    MissingExport(String),
    #[error("Export '{name}' has the wrong signature: {message}")]
    ExportSignature { name: String, message: String },
    #[error("Module neither imports '{module}.{name}' nor exports a memory named '{name}'")]
    MissingMemory { module: String, name: String },
    #[error("Invalid WASM binary: {0}")]
    InvalidBinary(String),
    #[error("[{context}] {message}")]
    Instantiate { context: String, message: String },

    // Tuple shape at the host boundary
    #[error("Fact for '{relation}' has {found} columns, expected {expected}")]
    Arity {
        relation: String,
        expected: usize,
        found: usize,
    },
    #[error("Column {column} of '{relation}' is {expected}, got a {found} value")]
    ColumnType {
        relation: String,
        column: usize,
        expected: FieldType,
        found: FieldType,
    },
    #[error("Row has {found} columns, tuple expects {expected}")]
    TupleArity { expected: usize, found: usize },
    #[error("Expected a {expected} value, got {found}")]
    ValueType { expected: FieldType, found: FieldType },

    // Module calls and linear memory
    #[error("Program {0} is borrowed elsewhere and cannot call into the module")]
    ProgramBusy(u32),
    #[error("Call to '{export}' failed: {message}")]
    Module { export: String, message: String },
    #[error("Linear memory access out of bounds: address {address}, length {length}")]
    MemoryAccess { address: u32, length: u64 },
    #[error("Buffer of {0} bytes does not fit in 32-bit linear memory")]
    BufferTooLarge(u64),
    #[error("Symbol {index} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        index: u32,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("JSON Parse Error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn module(export: &str, cause: impl std::fmt::Display) -> Self {
        Error::Module {
            export: export.to_string(),
            message: cause.to_string(),
        }
    }
}
