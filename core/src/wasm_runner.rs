/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * Wasmtime backend for compiled Eclair programs.
 *
 * Loads an Eclair .wasm binary, supplies its linear memory and resolves the
 * export contract to typed functions once, at construction. After that every
 * `ProgramExports` call is a direct typed call into the instance.
 *
 * The compiled module usually imports its memory:
 *   env::memory  (host creates `memory_pages` pages and links it)
 * Modules that declare their own memory are accepted if they export it
 * under `memory_name`.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 */

use crate::error::{Error, Result};
use crate::exports::{checked_range, ProgramExports};
use serde::{Deserialize, Serialize};
use wasmtime::{
    Engine, ExternType, Instance, Linker, Memory, MemoryType, Module, Store, TypedFunc, WasmParams,
    WasmResults,
};

pub const DEFAULT_EXPORT_PREFIX: &str = "eclair_";
pub const DEFAULT_MEMORY_MODULE: &str = "env";
pub const DEFAULT_MEMORY_NAME: &str = "memory";
pub const DEFAULT_MEMORY_PAGES: u32 = 10;

// =============================================================================
// Configuration
// =============================================================================

/// How to bind a module: export naming and where its memory comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Prepended to every export name, e.g. `eclair_` + `add_fact`.
    pub export_prefix: String,
    pub memory_module: String,
    pub memory_name: String,
    /// Initial size of a host-supplied memory, in 64 KiB pages.
    pub memory_pages: u32,
    pub max_memory_pages: Option<u32>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        ModuleConfig {
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            memory_module: DEFAULT_MEMORY_MODULE.to_string(),
            memory_name: DEFAULT_MEMORY_NAME.to_string(),
            memory_pages: DEFAULT_MEMORY_PAGES,
            max_memory_pages: None,
        }
    }
}

impl ModuleConfig {
    /// Parse a config; fields left out keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn export_name(&self, name: &str) -> String {
        format!("{}{}", self.export_prefix, name)
    }
}

// =============================================================================
// Resolved exports
// =============================================================================

struct Export<P, R> {
    name: String,
    func: TypedFunc<P, R>,
}

impl<P: WasmParams, R: WasmResults> Export<P, R> {
    fn resolve(
        instance: &Instance,
        store: &mut Store<()>,
        config: &ModuleConfig,
        name: &str,
    ) -> Result<Self> {
        let name = config.export_name(name);
        let func = instance
            .get_func(&mut *store, &name)
            .ok_or_else(|| Error::MissingExport(name.clone()))?;
        let func = func.typed::<P, R>(&*store).map_err(|e| Error::ExportSignature {
            name: name.clone(),
            message: e.to_string(),
        })?;
        Ok(Export { name, func })
    }

    fn call(&self, store: &mut Store<()>, params: P) -> Result<R> {
        tracing::trace!(export = %self.name, "call");
        self.func
            .call(store, params)
            .map_err(|e| Error::module(&self.name, e))
    }
}

struct Exports {
    program_init: Export<(), u32>,
    program_run: Export<u32, ()>,
    program_destroy: Export<u32, ()>,
    add_fact: Export<(u32, u32, u32), ()>,
    add_facts: Export<(u32, u32, u32, u32), ()>,
    fact_count: Export<(u32, u32), u32>,
    get_facts: Export<(u32, u32), u32>,
    free_buffer: Export<u32, ()>,
    encode_string: Export<(u32, u32, u32), u32>,
    decode_string: Export<(u32, u32), u32>,
    malloc: Export<u32, u32>,
    free: Export<u32, ()>,
}

impl Exports {
    fn resolve(instance: &Instance, store: &mut Store<()>, config: &ModuleConfig) -> Result<Self> {
        Ok(Exports {
            program_init: Export::resolve(instance, store, config, "program_init")?,
            program_run: Export::resolve(instance, store, config, "program_run")?,
            program_destroy: Export::resolve(instance, store, config, "program_destroy")?,
            add_fact: Export::resolve(instance, store, config, "add_fact")?,
            add_facts: Export::resolve(instance, store, config, "add_facts")?,
            fact_count: Export::resolve(instance, store, config, "fact_count")?,
            get_facts: Export::resolve(instance, store, config, "get_facts")?,
            free_buffer: Export::resolve(instance, store, config, "free_buffer")?,
            encode_string: Export::resolve(instance, store, config, "encode_string")?,
            decode_string: Export::resolve(instance, store, config, "decode_string")?,
            malloc: Export::resolve(instance, store, config, "malloc")?,
            free: Export::resolve(instance, store, config, "free")?,
        })
    }
}

// =============================================================================
// Instance
// =============================================================================

/// One instantiated Eclair module with its own store and memory.
pub struct WasmInstance {
    store: Store<()>,
    memory: Memory,
    exports: Exports,
}

impl WasmInstance {
    /// Compile `bytes` on a fresh engine and instantiate it.
    pub fn from_binary(bytes: &[u8], config: &ModuleConfig) -> Result<Self> {
        let engine = Engine::default();
        let module = Module::from_binary(&engine, bytes).map_err(|e| Error::Instantiate {
            context: "from_binary::load".to_string(),
            message: format!("Failed to load WASM module: {}", e),
        })?;
        Self::new(&engine, &module, config)
    }

    /// Instantiate an already compiled module. Each call gets a separate store,
    /// so instances never share memory.
    pub fn new(engine: &Engine, module: &Module, config: &ModuleConfig) -> Result<Self> {
        let mut store = Store::new(engine, ());
        let mut linker = Linker::<()>::new(engine);

        let imports_memory = module.imports().any(|import| {
            import.module() == config.memory_module
                && import.name() == config.memory_name
                && matches!(import.ty(), ExternType::Memory(_))
        });

        let host_memory = if imports_memory {
            let ty = MemoryType::new(config.memory_pages, config.max_memory_pages);
            let memory = Memory::new(&mut store, ty).map_err(|e| Error::Instantiate {
                context: "new::memory".to_string(),
                message: format!("Failed to create memory: {}", e),
            })?;
            linker
                .define(&store, &config.memory_module, &config.memory_name, memory)
                .map_err(|e| Error::Instantiate {
                    context: "new::link".to_string(),
                    message: format!("Failed to link memory: {}", e),
                })?;
            Some(memory)
        } else {
            None
        };

        let instance = linker
            .instantiate(&mut store, module)
            .map_err(|e| Error::Instantiate {
                context: "new::instantiate".to_string(),
                message: format!("Failed to instantiate: {}", e),
            })?;

        let memory = match host_memory {
            Some(memory) => memory,
            None => instance
                .get_memory(&mut store, &config.memory_name)
                .ok_or_else(|| Error::MissingMemory {
                    module: config.memory_module.clone(),
                    name: config.memory_name.clone(),
                })?,
        };

        let exports = Exports::resolve(&instance, &mut store, config)?;
        tracing::debug!(
            imported_memory = imports_memory,
            memory_bytes = memory.data_size(&store),
            "eclair module instantiated"
        );

        Ok(WasmInstance {
            store,
            memory,
            exports,
        })
    }

    /// Current size of linear memory in bytes.
    pub fn memory_size(&self) -> usize {
        self.memory.data_size(&self.store)
    }
}

impl ProgramExports for WasmInstance {
    fn program_init(&mut self) -> Result<u32> {
        self.exports.program_init.call(&mut self.store, ())
    }

    fn program_run(&mut self, handle: u32) -> Result<()> {
        self.exports.program_run.call(&mut self.store, handle)
    }

    fn program_destroy(&mut self, handle: u32) -> Result<()> {
        self.exports.program_destroy.call(&mut self.store, handle)
    }

    fn add_fact(&mut self, handle: u32, fact_type: u32, row: u32) -> Result<()> {
        self.exports
            .add_fact
            .call(&mut self.store, (handle, fact_type, row))
    }

    fn add_facts(&mut self, handle: u32, fact_type: u32, rows: u32, count: u32) -> Result<()> {
        self.exports
            .add_facts
            .call(&mut self.store, (handle, fact_type, rows, count))
    }

    fn fact_count(&mut self, handle: u32, fact_type: u32) -> Result<u32> {
        self.exports
            .fact_count
            .call(&mut self.store, (handle, fact_type))
    }

    fn get_facts(&mut self, handle: u32, fact_type: u32) -> Result<u32> {
        self.exports
            .get_facts
            .call(&mut self.store, (handle, fact_type))
    }

    fn free_buffer(&mut self, address: u32) -> Result<()> {
        self.exports.free_buffer.call(&mut self.store, address)
    }

    fn encode_string(&mut self, handle: u32, byte_len: u32, bytes: u32) -> Result<u32> {
        self.exports
            .encode_string
            .call(&mut self.store, (handle, byte_len, bytes))
    }

    fn decode_string(&mut self, handle: u32, symbol: u32) -> Result<u32> {
        self.exports
            .decode_string
            .call(&mut self.store, (handle, symbol))
    }

    fn malloc(&mut self, byte_count: u32) -> Result<u32> {
        self.exports.malloc.call(&mut self.store, byte_count)
    }

    fn free(&mut self, address: u32) -> Result<()> {
        self.exports.free.call(&mut self.store, address)
    }

    fn read_bytes(&self, address: u32, len: u32) -> Result<Vec<u8>> {
        let data = self.memory.data(&self.store);
        let range = checked_range(data.len(), address, len)?;
        Ok(data[range].to_vec())
    }

    fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| Error::BufferTooLarge(bytes.len() as u64))?;
        let data = self.memory.data_mut(&mut self.store);
        let range = checked_range(data.len(), address, len)?;
        data[range].copy_from_slice(bytes);
        Ok(())
    }
}
