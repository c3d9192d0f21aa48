/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * Export table of a compiled Eclair program.
 *
 * Every Eclair module exposes the same fixed set of functions. All arguments
 * and results are 32-bit words; addresses point into the module's linear
 * memory, which the host may read and write directly:
 *
 *   program_init() -> handle
 *   program_run(handle)
 *   program_destroy(handle)
 *   add_fact(handle, fact_type, row_ptr)
 *   add_facts(handle, fact_type, rows_ptr, count)
 *   fact_count(handle, fact_type) -> n
 *   get_facts(handle, fact_type) -> rows_ptr      (release with free_buffer)
 *   free_buffer(ptr)
 *   encode_string(handle, byte_len, bytes_ptr) -> symbol
 *   decode_string(handle, symbol) -> record_ptr   (record = [len, data_ptr])
 *   malloc(byte_count) -> ptr
 *   free(ptr)
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 */

use crate::error::{Error, Result};

/// Size of one wire word in bytes.
pub const WORD: usize = std::mem::size_of::<u32>();

/// Host view of an Eclair module instance and its linear memory.
///
/// Implementations forward each call to the module unchanged; any failure the
/// module reports comes back as [`Error::Module`].
pub trait ProgramExports {
    fn program_init(&mut self) -> Result<u32>;
    fn program_run(&mut self, handle: u32) -> Result<()>;
    fn program_destroy(&mut self, handle: u32) -> Result<()>;

    fn add_fact(&mut self, handle: u32, fact_type: u32, row: u32) -> Result<()>;
    fn add_facts(&mut self, handle: u32, fact_type: u32, rows: u32, count: u32) -> Result<()>;
    fn fact_count(&mut self, handle: u32, fact_type: u32) -> Result<u32>;
    fn get_facts(&mut self, handle: u32, fact_type: u32) -> Result<u32>;
    fn free_buffer(&mut self, address: u32) -> Result<()>;

    fn encode_string(&mut self, handle: u32, byte_len: u32, bytes: u32) -> Result<u32>;
    fn decode_string(&mut self, handle: u32, symbol: u32) -> Result<u32>;

    fn malloc(&mut self, byte_count: u32) -> Result<u32>;
    fn free(&mut self, address: u32) -> Result<()>;

    /// Copy `len` bytes out of linear memory.
    fn read_bytes(&self, address: u32, len: u32) -> Result<Vec<u8>>;

    /// Copy `bytes` into linear memory starting at `address`.
    fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()>;

    /// Read `count` little-endian words starting at `address`.
    fn read_words(&self, address: u32, count: usize) -> Result<Vec<u32>> {
        let len = byte_len(count)?;
        let bytes = self.read_bytes(address, len)?;
        Ok(bytes
            .chunks_exact(WORD)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }

    /// Write `words` as little-endian `u32`s starting at `address`.
    fn write_words(&mut self, address: u32, words: &[u32]) -> Result<()> {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.write_bytes(address, &bytes)
    }
}

/// Byte size of `words` wire words, checked against the 32-bit address space.
pub(crate) fn byte_len(words: usize) -> Result<u32> {
    let bytes = (words as u64).saturating_mul(WORD as u64);
    u32::try_from(bytes).map_err(|_| Error::BufferTooLarge(bytes))
}

/// Bounds-checked range of a linear memory of `size` bytes.
pub(crate) fn checked_range(size: usize, address: u32, len: u32) -> Result<std::ops::Range<usize>> {
    let start = address as usize;
    let end = start
        .checked_add(len as usize)
        .filter(|end| *end <= size)
        .ok_or(Error::MemoryAccess {
            address,
            length: len as u64,
        })?;
    Ok(start..end)
}

impl<M: ProgramExports + ?Sized> ProgramExports for &mut M {
    fn program_init(&mut self) -> Result<u32> {
        (**self).program_init()
    }

    fn program_run(&mut self, handle: u32) -> Result<()> {
        (**self).program_run(handle)
    }

    fn program_destroy(&mut self, handle: u32) -> Result<()> {
        (**self).program_destroy(handle)
    }

    fn add_fact(&mut self, handle: u32, fact_type: u32, row: u32) -> Result<()> {
        (**self).add_fact(handle, fact_type, row)
    }

    fn add_facts(&mut self, handle: u32, fact_type: u32, rows: u32, count: u32) -> Result<()> {
        (**self).add_facts(handle, fact_type, rows, count)
    }

    fn fact_count(&mut self, handle: u32, fact_type: u32) -> Result<u32> {
        (**self).fact_count(handle, fact_type)
    }

    fn get_facts(&mut self, handle: u32, fact_type: u32) -> Result<u32> {
        (**self).get_facts(handle, fact_type)
    }

    fn free_buffer(&mut self, address: u32) -> Result<()> {
        (**self).free_buffer(address)
    }

    fn encode_string(&mut self, handle: u32, byte_len: u32, bytes: u32) -> Result<u32> {
        (**self).encode_string(handle, byte_len, bytes)
    }

    fn decode_string(&mut self, handle: u32, symbol: u32) -> Result<u32> {
        (**self).decode_string(handle, symbol)
    }

    fn malloc(&mut self, byte_count: u32) -> Result<u32> {
        (**self).malloc(byte_count)
    }

    fn free(&mut self, address: u32) -> Result<()> {
        (**self).free(address)
    }

    fn read_bytes(&self, address: u32, len: u32) -> Result<Vec<u8>> {
        (**self).read_bytes(address, len)
    }

    fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(address, bytes)
    }
}
