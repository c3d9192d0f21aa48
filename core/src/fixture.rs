/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * Test module builder.
 *
 * Emits a minimal WASM module that satisfies the export contract so the
 * wasmtime backend and the contract inspector can be exercised without a
 * compiled Eclair program on disk. The module does no datalog work:
 *
 *   malloc         bump allocator over a mutable global, 8-byte aligned
 *   encode_string  copies the bytes and returns the address of [len, ptr]
 *   decode_string  returns its symbol, which is already a record address
 *   get_facts      returns an empty buffer, fact_count returns 0
 *   everything else is a no-op
 *
 * Without a memory, encode_string returns 0 instead.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 */

use wasm_encoder::{
    CodeSection, ConstExpr, EntityType, ExportKind, ExportSection, Function, FunctionSection,
    GlobalSection, GlobalType, ImportSection, Instruction, MemArg, MemorySection, MemoryType, Module,
    TypeSection, ValType,
};

const HEAP_START: i32 = 1024;

const MALLOC_IDX: u32 = 0;

// Type indices
const T_HANDLE: u32 = 0; // () -> i32
const T_UNARY: u32 = 1; // (i32) -> ()
const T_ADD_FACT: u32 = 2; // (i32, i32, i32) -> ()
const T_ADD_FACTS: u32 = 3; // (i32, i32, i32, i32) -> ()
const T_QUERY: u32 = 4; // (i32, i32) -> i32
const T_ENCODE: u32 = 5; // (i32, i32, i32) -> i32
const T_ALLOC: u32 = 6; // (i32) -> i32

/// Where the fixture's linear memory comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FixtureMemory {
    /// Imports `env.memory`, which the host has to supply.
    Imported,
    /// Declares and exports its own memory, as `memory` unless renamed.
    Exported,
    /// No memory at all.
    None,
}

pub(crate) struct FixtureBuilder {
    prefix: String,
    memory: FixtureMemory,
    memory_export: &'static str,
    omit: Vec<&'static str>,
    mistyped_free: bool,
}

impl FixtureBuilder {
    pub(crate) fn new() -> Self {
        FixtureBuilder {
            prefix: "eclair_".to_string(),
            memory: FixtureMemory::Imported,
            memory_export: "memory",
            omit: Vec::new(),
            mistyped_free: false,
        }
    }

    pub(crate) fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub(crate) fn memory(mut self, memory: FixtureMemory) -> Self {
        self.memory = memory;
        self
    }

    /// Export name of an `Exported` memory.
    pub(crate) fn memory_export(mut self, name: &'static str) -> Self {
        self.memory_export = name;
        self
    }

    /// Leave `name` (without prefix) out of the export section.
    pub(crate) fn omit(mut self, name: &'static str) -> Self {
        self.omit.push(name);
        self
    }

    /// Give `free` a result it should not have.
    pub(crate) fn mistyped_free(mut self) -> Self {
        self.mistyped_free = true;
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut module = Module::new();

        let i32x = |n: usize| vec![ValType::I32; n];
        let mut types = TypeSection::new();
        types.ty().function(i32x(0), i32x(1)); // T_HANDLE
        types.ty().function(i32x(1), i32x(0)); // T_UNARY
        types.ty().function(i32x(3), i32x(0)); // T_ADD_FACT
        types.ty().function(i32x(4), i32x(0)); // T_ADD_FACTS
        types.ty().function(i32x(2), i32x(1)); // T_QUERY
        types.ty().function(i32x(3), i32x(1)); // T_ENCODE
        types.ty().function(i32x(1), i32x(1)); // T_ALLOC
        module.section(&types);

        if self.memory == FixtureMemory::Imported {
            let mut imports = ImportSection::new();
            imports.import("env", "memory", EntityType::Memory(memory_type()));
            module.section(&imports);
        }

        let bodies = self.bodies();

        let mut functions = FunctionSection::new();
        for (_, type_idx, _) in &bodies {
            functions.function(*type_idx);
        }
        module.section(&functions);

        if self.memory == FixtureMemory::Exported {
            let mut memories = MemorySection::new();
            memories.memory(memory_type());
            module.section(&memories);
        }

        let mut globals = GlobalSection::new();
        globals.global(
            GlobalType {
                val_type: ValType::I32,
                mutable: true,
                shared: false,
            },
            &ConstExpr::i32_const(HEAP_START),
        );
        module.section(&globals);

        let mut exports = ExportSection::new();
        if self.memory == FixtureMemory::Exported {
            exports.export(self.memory_export, ExportKind::Memory, 0);
        }
        for (func_idx, (name, _, _)) in bodies.iter().enumerate() {
            if self.omit.contains(name) {
                continue;
            }
            let export = format!("{}{}", self.prefix, name);
            exports.export(&export, ExportKind::Func, func_idx as u32);
        }
        module.section(&exports);

        let mut codes = CodeSection::new();
        for (_, _, func) in &bodies {
            codes.function(func);
        }
        module.section(&codes);

        module.finish()
    }

    fn bodies(&self) -> Vec<(&'static str, u32, Function)> {
        let free = if self.mistyped_free {
            ("free", T_ALLOC, body(&[], &[Instruction::LocalGet(0)]))
        } else {
            ("free", T_UNARY, body(&[], &[]))
        };

        let encode = if self.memory == FixtureMemory::None {
            body(&[], &[Instruction::I32Const(0)])
        } else {
            encode_string()
        };

        // malloc must stay at MALLOC_IDX.
        vec![
            ("malloc", T_ALLOC, malloc()),
            ("program_init", T_HANDLE, body(&[], &[Instruction::I32Const(4), Instruction::Call(MALLOC_IDX)])),
            ("program_run", T_UNARY, body(&[], &[])),
            ("program_destroy", T_UNARY, body(&[], &[])),
            ("add_fact", T_ADD_FACT, body(&[], &[])),
            ("add_facts", T_ADD_FACTS, body(&[], &[])),
            ("fact_count", T_QUERY, body(&[], &[Instruction::I32Const(0)])),
            ("get_facts", T_QUERY, body(&[], &[Instruction::I32Const(0), Instruction::Call(MALLOC_IDX)])),
            ("free_buffer", T_UNARY, body(&[], &[])),
            ("encode_string", T_ENCODE, encode),
            ("decode_string", T_QUERY, body(&[], &[Instruction::LocalGet(1)])),
            free,
        ]
    }
}

fn memory_type() -> MemoryType {
    MemoryType {
        minimum: 1,
        maximum: None,
        memory64: false,
        shared: false,
        page_size_log2: None,
    }
}

fn body(locals: &[(u32, ValType)], instructions: &[Instruction]) -> Function {
    let mut func = Function::new(locals.iter().copied());
    for instr in instructions {
        func.instruction(instr);
    }
    func.instruction(&Instruction::End);
    func
}

/// `(size) -> ptr`: hand out the current heap pointer and bump it by the
/// size rounded up to 8.
fn malloc() -> Function {
    body(
        &[],
        &[
            Instruction::GlobalGet(0),
            Instruction::GlobalGet(0),
            Instruction::LocalGet(0),
            Instruction::I32Const(7),
            Instruction::I32Add,
            Instruction::I32Const(!7),
            Instruction::I32And,
            Instruction::I32Add,
            Instruction::GlobalSet(0),
        ],
    )
}

/// `(handle, len, src) -> record`. Locals: 3 = data copy, 4 = record.
fn encode_string() -> Function {
    let word = |offset| MemArg {
        offset,
        align: 2,
        memory_index: 0,
    };
    body(
        &[(2, ValType::I32)],
        &[
            Instruction::LocalGet(1),
            Instruction::Call(MALLOC_IDX),
            Instruction::LocalSet(3),
            Instruction::LocalGet(3),
            Instruction::LocalGet(2),
            Instruction::LocalGet(1),
            Instruction::MemoryCopy {
                src_mem: 0,
                dst_mem: 0,
            },
            Instruction::I32Const(8),
            Instruction::Call(MALLOC_IDX),
            Instruction::LocalSet(4),
            Instruction::LocalGet(4),
            Instruction::LocalGet(1),
            Instruction::I32Store(word(0)),
            Instruction::LocalGet(4),
            Instruction::LocalGet(3),
            Instruction::I32Store(word(4)),
            Instruction::LocalGet(4),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_validates() {
        for memory in [FixtureMemory::Imported, FixtureMemory::Exported, FixtureMemory::None] {
            let bytes = FixtureBuilder::new().memory(memory).build();
            let valid = wasmparser::Validator::new().validate_all(&bytes);
            assert!(valid.is_ok(), "{:?} fixture failed validation: {:?}", memory, valid.err());
        }
    }
}
