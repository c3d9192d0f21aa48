/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * Program lifecycle.
 *
 *   Program::init  ->  Active  --run()*-->  Active  --destroy()-->  (consumed)
 *
 * A `Program` owns the module-side handle for as long as it lives. `destroy`
 * consumes it, so a destroyed handle cannot be reached again; dropping an
 * active program destroys it as well.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 */

use crate::codec;
use crate::error::{Error, Result};
use crate::exports::ProgramExports;
use crate::strings;
use crate::types::{Relation, Value};
use std::cell::{Ref, RefCell, RefMut};

/// Address of a program's database inside module memory. Only ever passed back
/// to the module, never dereferenced by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u32);

impl Handle {
    pub(crate) fn new(address: u32) -> Self {
        Handle(address)
    }

    pub fn address(&self) -> u32 {
        self.0
    }
}

/// An active Eclair program bound to one module instance.
///
/// Calls go through a `RefCell` so that several fact handlers can share the
/// program. Every call releases its borrow before returning; only a live
/// `exports()` borrow can block a call.
pub struct Program<M: ProgramExports> {
    exports: RefCell<M>,
    handle: Handle,
    active: bool,
}

impl<M: ProgramExports> Program<M> {
    /// Create a fresh database in the module.
    pub fn init(mut exports: M) -> Result<Self> {
        let handle = Handle::new(exports.program_init()?);
        tracing::debug!(handle = handle.address(), "program initialized");
        Ok(Program {
            exports: RefCell::new(exports),
            handle,
            active: true,
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Borrow the underlying module. Calls made on the program while the
    /// borrow is held fail with `Error::ProgramBusy`.
    pub fn exports(&self) -> Ref<'_, M> {
        self.exports.borrow()
    }

    fn module(&self) -> Result<RefMut<'_, M>> {
        self.exports
            .try_borrow_mut()
            .map_err(|_| Error::ProgramBusy(self.handle.address()))
    }

    /// Evaluate the program to a fixed point over the current facts. May be
    /// called any number of times.
    pub fn run(&self) -> Result<()> {
        tracing::debug!(handle = self.handle.address(), "program run");
        self.module()?.program_run(self.handle.address())
    }

    /// Release the module-side database.
    pub fn destroy(mut self) -> Result<()> {
        self.active = false;
        tracing::debug!(handle = self.handle.address(), "program destroyed");
        self.exports.get_mut().program_destroy(self.handle.address())
    }

    pub fn encode_string(&self, text: &str) -> Result<u32> {
        strings::encode_string(&mut *self.module()?, self.handle, text)
    }

    pub fn decode_string(&self, symbol: u32) -> Result<String> {
        strings::decode_string(&mut *self.module()?, self.handle, symbol)
    }

    pub fn add_fact(&self, relation: &Relation, fact: &[Value]) -> Result<()> {
        codec::add_fact(&mut *self.module()?, self.handle, relation, fact)
    }

    pub fn add_facts<F: AsRef<[Value]>>(&self, relation: &Relation, facts: &[F]) -> Result<()> {
        codec::add_facts(&mut *self.module()?, self.handle, relation, facts)
    }

    pub fn get_facts(&self, relation: &Relation) -> Result<Vec<Vec<Value>>> {
        codec::get_facts(&mut *self.module()?, self.handle, relation)
    }
}

impl<M: ProgramExports> Drop for Program<M> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = self.exports.get_mut().program_destroy(self.handle.address()) {
            tracing::warn!(handle = self.handle.address(), error = %e, "failed to destroy program on drop");
        }
    }
}

/// Run `body` against a fresh program and destroy the program afterwards,
/// whether `body` succeeded or not.
///
/// An error from `body` takes precedence over an error from teardown.
pub fn with_program<M, T, E, F>(exports: M, body: F) -> Result<T, E>
where
    M: ProgramExports,
    E: From<Error>,
    F: FnOnce(&Program<M>) -> Result<T, E>,
{
    let program = Program::init(exports)?;
    let outcome = body(&program);
    let destroyed = program.destroy();
    match (outcome, destroyed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), _) => Err(e),
    }
}
