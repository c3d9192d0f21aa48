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

pub mod codec;
pub mod contract;
pub mod error;
pub mod exports;
pub mod fact;
pub mod handlers;
pub mod loader;
pub mod memory;
pub mod program;
pub mod strings;
pub mod types;
pub mod wasm_runner;

#[cfg(test)]
mod fixture;
#[cfg(test)]
mod testing;

pub use contract::{inspect, ContractReport, MemorySource};
pub use error::{Error, Result};
pub use exports::ProgramExports;
pub use fact::{Column, DirectionMarker, Fact, FactValue, Input, InputOutput, Insert, Output, Retrieve};
pub use handlers::{FactHandlers, Handler, InputFacts, OutputFacts};
pub use loader::load_relations;
pub use program::{with_program, Handle, Program};
pub use types::{Direction, FieldType, Relation, Value};
pub use wasm_runner::{ModuleConfig, WasmInstance};

pub const U32: FieldType = FieldType::Number;
pub const STRING: FieldType = FieldType::String;
pub const INPUT: Direction = Direction::Input;
pub const OUTPUT: Direction = Direction::Output;
pub const INPUT_OUTPUT: Direction = Direction::InputOutput;

/// Declare a relation: `fact("edge", INPUT, [U32, U32])`.
pub fn fact(name: impl Into<String>, direction: Direction, fields: impl Into<Vec<FieldType>>) -> Result<Relation> {
    Relation::new(name, direction, fields)
}
