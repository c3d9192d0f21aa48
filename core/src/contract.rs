/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * Export contract inspection.
 *
 * Walks a WASM binary's type, import, function and export sections with
 * wasmparser and checks it against the export contract the bindings need,
 * without instantiating anything. Useful for rejecting the wrong binary
 * before a store or engine is created.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 */

use crate::error::{Error, Result};
use crate::wasm_runner::{DEFAULT_MEMORY_MODULE, DEFAULT_MEMORY_NAME};
use std::collections::HashMap;
use std::fmt;
use wasmparser::{CompositeInnerType, ExternalKind, Parser, Payload, TypeRef, ValType};

/// Every export the bindings call, unprefixed, with its parameter and result
/// counts. All parameters and results are `i32`.
pub const EXPORT_SIGNATURES: [(&str, usize, usize); 12] = [
    ("program_init", 0, 1),
    ("program_run", 1, 0),
    ("program_destroy", 1, 0),
    ("add_fact", 3, 0),
    ("add_facts", 4, 0),
    ("fact_count", 2, 1),
    ("get_facts", 2, 1),
    ("free_buffer", 1, 0),
    ("encode_string", 3, 1),
    ("decode_string", 2, 1),
    ("malloc", 1, 1),
    ("free", 1, 0),
];

/// A function signature as value type names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<&'static str>,
    pub results: Vec<&'static str>,
}

impl Signature {
    fn all_i32(params: usize, results: usize) -> Self {
        Signature {
            params: vec!["i32"; params],
            results: vec!["i32"; results],
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}) -> ({})", self.params.join(", "), self.results.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub export: String,
    pub expected: Signature,
    pub found: Signature,
}

/// Where the module's linear memory comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemorySource {
    Imported { module: String, name: String },
    Exported(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractReport {
    /// Prefixed names of exports that are absent, or present but not functions.
    pub missing: Vec<String>,
    pub mistyped: Vec<Mismatch>,
    pub memory: MemorySource,
}

impl ContractReport {
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty() && self.mistyped.is_empty() && self.memory != MemorySource::Missing
    }

    /// The first violation as an error, in the order missing, mistyped, memory.
    pub fn into_result(self) -> Result<()> {
        if let Some(name) = self.missing.into_iter().next() {
            return Err(Error::MissingExport(name));
        }
        if let Some(mismatch) = self.mistyped.into_iter().next() {
            return Err(Error::ExportSignature {
                name: mismatch.export,
                message: format!("expected {}, found {}", mismatch.expected, mismatch.found),
            });
        }
        if self.memory == MemorySource::Missing {
            return Err(Error::MissingMemory {
                module: DEFAULT_MEMORY_MODULE.to_string(),
                name: DEFAULT_MEMORY_NAME.to_string(),
            });
        }
        Ok(())
    }
}

/// Check `bytes` against the export contract, with every export name carrying
/// `prefix`.
pub fn inspect(bytes: &[u8], prefix: &str) -> Result<ContractReport> {
    let mut types: Vec<Option<Signature>> = Vec::new();
    // Function index space: imported functions first, then defined ones.
    let mut functions: Vec<u32> = Vec::new();
    let mut func_exports: HashMap<String, u32> = HashMap::new();
    let mut memory = MemorySource::Missing;

    for payload in Parser::new(0).parse_all(bytes) {
        match payload.map_err(invalid)? {
            Payload::TypeSection(reader) => {
                for group in reader {
                    for sub_type in group.map_err(invalid)?.into_types() {
                        let signature = match &sub_type.composite_type.inner {
                            CompositeInnerType::Func(func) => Some(Signature {
                                params: func.params().iter().map(type_name).collect(),
                                results: func.results().iter().map(type_name).collect(),
                            }),
                            _ => None,
                        };
                        types.push(signature);
                    }
                }
            }
            Payload::ImportSection(reader) => {
                for import in reader {
                    let import = import.map_err(invalid)?;
                    match import.ty {
                        TypeRef::Func(type_idx) => functions.push(type_idx),
                        TypeRef::Memory(_) => {
                            memory = MemorySource::Imported {
                                module: import.module.to_string(),
                                name: import.name.to_string(),
                            };
                        }
                        _ => {}
                    }
                }
            }
            Payload::FunctionSection(reader) => {
                for type_idx in reader {
                    functions.push(type_idx.map_err(invalid)?);
                }
            }
            Payload::ExportSection(reader) => {
                for export in reader {
                    let export = export.map_err(invalid)?;
                    match export.kind {
                        ExternalKind::Func => {
                            func_exports.insert(export.name.to_string(), export.index);
                        }
                        ExternalKind::Memory if memory == MemorySource::Missing => {
                            memory = MemorySource::Exported(export.name.to_string());
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    let mut report = ContractReport {
        missing: Vec::new(),
        mistyped: Vec::new(),
        memory,
    };
    for (name, params, results) in EXPORT_SIGNATURES {
        let export = format!("{}{}", prefix, name);
        let Some(&func_idx) = func_exports.get(&export) else {
            report.missing.push(export);
            continue;
        };
        let found = functions
            .get(func_idx as usize)
            .and_then(|type_idx| types.get(*type_idx as usize))
            .cloned()
            .flatten()
            .ok_or_else(|| Error::InvalidBinary(format!("export '{}' has no function type", export)))?;
        let expected = Signature::all_i32(params, results);
        if found != expected {
            report.mistyped.push(Mismatch {
                export,
                expected,
                found,
            });
        }
    }

    tracing::debug!(
        missing = report.missing.len(),
        mistyped = report.mistyped.len(),
        memory = ?report.memory,
        "inspected module exports"
    );
    Ok(report)
}

fn type_name(ty: &ValType) -> &'static str {
    match ty {
        ValType::I32 => "i32",
        ValType::I64 => "i64",
        ValType::F32 => "f32",
        ValType::F64 => "f64",
        ValType::V128 => "v128",
        _ => "ref",
    }
}

fn invalid(e: wasmparser::BinaryReaderError) -> Error {
    Error::InvalidBinary(e.to_string())
}
