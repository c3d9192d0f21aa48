/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * In-process stand-in for a compiled Eclair module (tests only).
 *
 * Implements the export table over a plain byte vector. Strings are interned
 * with "edge" = 0 and "reachable" = 1 pre-seeded, `program_run` derives
 * `reachable` as the transitive closure of `edge`, and every host allocation
 * and result buffer is tracked so tests can assert nothing leaks.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 */

use crate::error::{Error, Result};
use crate::exports::{checked_range, ProgramExports};
use std::collections::{BTreeSet, HashMap, HashSet};

const MEMORY_BYTES: usize = 1 << 20;
const HEAP_START: u32 = 1024;

pub const EDGE: u32 = 0;
pub const REACHABLE: u32 = 1;

#[derive(Default)]
struct Database {
    facts: HashMap<u32, Vec<Vec<u32>>>,
}

impl Database {
    fn insert(&mut self, fact_type: u32, row: Vec<u32>) {
        let rows = self.facts.entry(fact_type).or_default();
        if !rows.contains(&row) {
            rows.push(row);
        }
    }
}

pub struct MockModule {
    memory: Vec<u8>,
    heap: u32,
    live: HashMap<u32, u32>,
    buffers: HashSet<u32>,
    mallocs: usize,
    frees: usize,
    calls: usize,
    symbols: HashMap<String, u32>,
    records: Vec<u32>,
    arities: HashMap<u32, usize>,
    programs: HashMap<u32, Database>,
    pub fail_free: bool,
    pub fail_encode: bool,
    pub fail_add: bool,
}

impl MockModule {
    pub fn new() -> Self {
        let mut module = MockModule {
            memory: vec![0; MEMORY_BYTES],
            heap: HEAP_START,
            live: HashMap::new(),
            buffers: HashSet::new(),
            mallocs: 0,
            frees: 0,
            calls: 0,
            symbols: HashMap::new(),
            records: Vec::new(),
            arities: HashMap::new(),
            programs: HashMap::new(),
            fail_free: false,
            fail_encode: false,
            fail_add: false,
        };
        module.declare("edge", 2);
        module.declare("reachable", 2);
        module
    }

    /// Compile-time knowledge of a relation: intern its name and fix its arity.
    pub fn declare(&mut self, name: &str, arity: usize) -> u32 {
        let symbol = self.intern(name.as_bytes());
        self.arities.insert(symbol, arity);
        symbol
    }

    pub fn mallocs(&self) -> usize {
        self.mallocs
    }

    pub fn frees(&self) -> usize {
        self.frees
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    pub fn outstanding_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn active_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn assert_balanced(&self) {
        assert_eq!(self.mallocs, self.frees, "every malloc needs a free");
        assert!(self.live.is_empty(), "live allocations: {:?}", self.live);
        assert!(self.buffers.is_empty(), "unreleased buffers: {:?}", self.buffers);
    }

    fn bump(&mut self, size: u32) -> u32 {
        let size = size.max(8).next_multiple_of(8);
        let address = self.heap;
        self.heap += size;
        address
    }

    fn intern(&mut self, bytes: &[u8]) -> u32 {
        let text = String::from_utf8_lossy(bytes).into_owned();
        if let Some(symbol) = self.symbols.get(&text) {
            return *symbol;
        }
        let data = self.bump(bytes.len() as u32);
        self.memory[data as usize..data as usize + bytes.len()].copy_from_slice(bytes);
        let record = self.bump(8);
        let len = bytes.len() as u32;
        self.memory[record as usize..record as usize + 4].copy_from_slice(&len.to_le_bytes());
        self.memory[record as usize + 4..record as usize + 8].copy_from_slice(&data.to_le_bytes());

        let symbol = self.records.len() as u32;
        self.records.push(record);
        self.symbols.insert(text, symbol);
        symbol
    }

    fn database(&mut self, handle: u32, export: &str) -> Result<&mut Database> {
        self.programs
            .get_mut(&handle)
            .ok_or_else(|| Error::module(export, format!("invalid handle {}", handle)))
    }

    fn arity(&self, fact_type: u32, export: &str) -> Result<usize> {
        self.arities
            .get(&fact_type)
            .copied()
            .ok_or_else(|| Error::module(export, format!("unknown fact type {}", fact_type)))
    }

    fn read_rows(&self, address: u32, arity: usize, count: usize) -> Result<Vec<Vec<u32>>> {
        let words = self.read_words(address, arity * count)?;
        Ok(words.chunks(arity).map(|row| row.to_vec()).collect())
    }
}

impl ProgramExports for MockModule {
    fn program_init(&mut self) -> Result<u32> {
        self.calls += 1;
        let handle = self.bump(8);
        self.programs.insert(handle, Database::default());
        Ok(handle)
    }

    fn program_run(&mut self, handle: u32) -> Result<()> {
        self.calls += 1;
        let db = self.database(handle, "eclair_program_run")?;
        let edges: Vec<(u32, u32)> = db
            .facts
            .get(&EDGE)
            .map(|rows| rows.iter().map(|r| (r[0], r[1])).collect())
            .unwrap_or_default();

        let mut reachable: BTreeSet<(u32, u32)> = edges.iter().copied().collect();
        loop {
            let derived: Vec<(u32, u32)> = edges
                .iter()
                .flat_map(|(x, y)| {
                    reachable
                        .iter()
                        .filter(move |(from, _)| from == y)
                        .map(move |(_, z)| (*x, *z))
                })
                .filter(|pair| !reachable.contains(pair))
                .collect();
            if derived.is_empty() {
                break;
            }
            reachable.extend(derived);
        }

        let rows = reachable.into_iter().map(|(x, y)| vec![x, y]).collect();
        db.facts.insert(REACHABLE, rows);
        Ok(())
    }

    fn program_destroy(&mut self, handle: u32) -> Result<()> {
        self.calls += 1;
        self.programs
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| Error::module("eclair_program_destroy", "handle already destroyed"))
    }

    fn add_fact(&mut self, handle: u32, fact_type: u32, row: u32) -> Result<()> {
        self.calls += 1;
        if self.fail_add {
            return Err(Error::module("eclair_add_fact", "rejected"));
        }
        let arity = self.arity(fact_type, "eclair_add_fact")?;
        let rows = self.read_rows(row, arity, 1)?;
        let db = self.database(handle, "eclair_add_fact")?;
        for row in rows {
            db.insert(fact_type, row);
        }
        Ok(())
    }

    fn add_facts(&mut self, handle: u32, fact_type: u32, rows: u32, count: u32) -> Result<()> {
        self.calls += 1;
        if self.fail_add {
            return Err(Error::module("eclair_add_facts", "rejected"));
        }
        let arity = self.arity(fact_type, "eclair_add_facts")?;
        let rows = self.read_rows(rows, arity, count as usize)?;
        let db = self.database(handle, "eclair_add_facts")?;
        for row in rows {
            db.insert(fact_type, row);
        }
        Ok(())
    }

    fn fact_count(&mut self, handle: u32, fact_type: u32) -> Result<u32> {
        self.calls += 1;
        let db = self.database(handle, "eclair_fact_count")?;
        Ok(db.facts.get(&fact_type).map_or(0, |rows| rows.len() as u32))
    }

    fn get_facts(&mut self, handle: u32, fact_type: u32) -> Result<u32> {
        self.calls += 1;
        let db = self.database(handle, "eclair_get_facts")?;
        let words: Vec<u32> = db
            .facts
            .get(&fact_type)
            .map(|rows| rows.iter().flatten().copied().collect())
            .unwrap_or_default();
        let address = self.bump((words.len() * 4) as u32);
        self.write_words(address, &words)?;
        self.buffers.insert(address);
        Ok(address)
    }

    fn free_buffer(&mut self, address: u32) -> Result<()> {
        self.calls += 1;
        if self.buffers.remove(&address) {
            Ok(())
        } else {
            Err(Error::module("eclair_free_buffer", format!("unknown buffer {}", address)))
        }
    }

    fn encode_string(&mut self, _handle: u32, byte_len: u32, bytes: u32) -> Result<u32> {
        self.calls += 1;
        if self.fail_encode {
            return Err(Error::module("eclair_encode_string", "out of symbols"));
        }
        let data = self.read_bytes(bytes, byte_len)?;
        Ok(self.intern(&data))
    }

    fn decode_string(&mut self, _handle: u32, symbol: u32) -> Result<u32> {
        self.calls += 1;
        self.records
            .get(symbol as usize)
            .copied()
            .ok_or_else(|| Error::module("eclair_decode_string", format!("unknown symbol {}", symbol)))
    }

    fn malloc(&mut self, byte_count: u32) -> Result<u32> {
        self.calls += 1;
        let address = self.bump(byte_count);
        self.live.insert(address, byte_count);
        self.mallocs += 1;
        Ok(address)
    }

    fn free(&mut self, address: u32) -> Result<()> {
        self.calls += 1;
        if self.live.remove(&address).is_none() {
            return Err(Error::module("eclair_free", format!("double free of {}", address)));
        }
        self.frees += 1;
        if self.fail_free {
            return Err(Error::module("eclair_free", "allocator corrupted"));
        }
        Ok(())
    }

    fn read_bytes(&self, address: u32, len: u32) -> Result<Vec<u8>> {
        let range = checked_range(self.memory.len(), address, len)?;
        Ok(self.memory[range].to_vec())
    }

    fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        let range = checked_range(self.memory.len(), address, bytes.len() as u32)?;
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }
}
