/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * String interning bridge.
 *
 * Strings never cross the boundary as text inside a fact. The host copies the
 * UTF-8 bytes into a transient buffer and the module interns them, returning a
 * symbol index that stays stable for the lifetime of the program. Decoding
 * reads back the module's record for a symbol:
 *
 *   record_ptr -> [ len: u32 | data_ptr: u32 ]
 *   data_ptr   -> len bytes of UTF-8
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 */

use crate::error::{Error, Result};
use crate::exports::ProgramExports;
use crate::memory::with_allocation;
use crate::program::Handle;

/// Intern `text` in the module and return its symbol index.
///
/// A Rust `&str` is already UTF-8, so the buffer is sized to exactly
/// `text.len()` bytes and the full length is passed to the module.
pub fn encode_string<M>(exports: &mut M, handle: Handle, text: &str) -> Result<u32>
where
    M: ProgramExports + ?Sized,
{
    let bytes = text.as_bytes();
    let byte_len = u32::try_from(bytes.len()).map_err(|_| Error::BufferTooLarge(bytes.len() as u64))?;

    let symbol = with_allocation(exports, byte_len, |m, address| {
        m.write_bytes(address, bytes)?;
        m.encode_string(handle.address(), byte_len, address)
    })?;
    tracing::trace!(symbol, text, "encode_string");
    Ok(symbol)
}

/// Look up the text behind a symbol index.
///
/// The symbol must have been interned on this handle (or be one the module
/// ships pre-interned); other indices are whatever the module makes of them.
pub fn decode_string<M>(exports: &mut M, handle: Handle, symbol: u32) -> Result<String>
where
    M: ProgramExports + ?Sized,
{
    let record = exports.decode_string(handle.address(), symbol)?;
    let header = exports.read_words(record, 2)?;
    let (len, data) = (header[0], header[1]);
    let bytes = exports.read_bytes(data, len)?;
    String::from_utf8(bytes).map_err(|source| Error::InvalidUtf8 {
        index: symbol,
        source,
    })
}
