/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * Scoped transient buffers in module linear memory.
 *
 * The module never reclaims memory the host asked for. Every buffer acquired
 * here is released exactly once, on the success path and the error path.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 */

use crate::error::Result;
use crate::exports::ProgramExports;

/// Allocate `byte_count` bytes with the module's `malloc`, run `body` with the
/// address, then `free` it.
///
/// If `body` fails, that error wins over a failing `free`.
pub fn with_allocation<M, T, F>(exports: &mut M, byte_count: u32, body: F) -> Result<T>
where
    M: ProgramExports + ?Sized,
    F: FnOnce(&mut M, u32) -> Result<T>,
{
    let address = exports.malloc(byte_count)?;
    tracing::trace!(address, byte_count, "malloc");
    let outcome = body(exports, address);
    let released = exports.free(address);
    tracing::trace!(address, "free");
    settle(outcome, released, "free", address)
}

/// Run `body` over a result buffer the module handed out, then release it with
/// `free_buffer`.
pub fn with_result_buffer<M, T, F>(exports: &mut M, address: u32, body: F) -> Result<T>
where
    M: ProgramExports + ?Sized,
    F: FnOnce(&mut M, u32) -> Result<T>,
{
    let outcome = body(exports, address);
    let released = exports.free_buffer(address);
    tracing::trace!(address, "free_buffer");
    settle(outcome, released, "free_buffer", address)
}

fn settle<T>(outcome: Result<T>, released: Result<()>, release: &str, address: u32) -> Result<T> {
    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(release_err)) => {
            tracing::warn!(address, %release_err, "{} failed while unwinding", release);
            Err(err)
        }
    }
}
