/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * Field and fact codecs.
 *
 * A fact is laid out as one row of `u32` words, one word per column, in
 * declaration order. NUMBER columns are stored as-is; STRING columns hold the
 * symbol index the module assigned to the text. Batches are rows packed back
 * to back:
 *
 *   [ row 0: c0 c1 .. cN | row 1: c0 c1 .. cN | ... ]
 *
 * Relations are identified on the wire by the interned symbol of their name.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 */

use crate::error::{Error, Result};
use crate::exports::{byte_len, ProgramExports};
use crate::memory::{with_allocation, with_result_buffer};
use crate::program::Handle;
use crate::strings::{decode_string, encode_string};
use crate::types::{FieldType, Relation, Value};

// =============================================================================
// Field Codec
// =============================================================================

/// Encode one column value into its wire word.
pub fn serialize_field<M>(exports: &mut M, handle: Handle, field: FieldType, value: &Value) -> Result<u32>
where
    M: ProgramExports + ?Sized,
{
    match (field, value) {
        (FieldType::Number, Value::Number(n)) => Ok(*n),
        (FieldType::String, Value::String(s)) => encode_string(exports, handle, s),
        (expected, found) => Err(Error::ValueType {
            expected,
            found: found.field_type(),
        }),
    }
}

/// Decode one wire word into a column value.
pub fn deserialize_field<M>(exports: &mut M, handle: Handle, field: FieldType, word: u32) -> Result<Value>
where
    M: ProgramExports + ?Sized,
{
    match field {
        FieldType::Number => Ok(Value::Number(word)),
        FieldType::String => decode_string(exports, handle, word).map(Value::String),
    }
}

// =============================================================================
// Fact Codec
// =============================================================================

/// Check a host tuple against the relation's declared shape.
///
/// Runs before any module call, so a malformed tuple never leaves interned
/// strings or buffers behind.
pub fn check_shape(relation: &Relation, fact: &[Value]) -> Result<()> {
    if fact.len() != relation.arity() {
        return Err(Error::Arity {
            relation: relation.name().to_string(),
            expected: relation.arity(),
            found: fact.len(),
        });
    }
    for (column, (field, value)) in relation.fields().iter().zip(fact).enumerate() {
        if value.field_type() != *field {
            return Err(Error::ColumnType {
                relation: relation.name().to_string(),
                column,
                expected: *field,
                found: value.field_type(),
            });
        }
    }
    Ok(())
}

/// Serialize one fact into a row of `relation.arity()` words. Column `i` of the
/// tuple always lands in slot `i`.
pub fn serialize_fact<M>(exports: &mut M, handle: Handle, relation: &Relation, fact: &[Value]) -> Result<Vec<u32>>
where
    M: ProgramExports + ?Sized,
{
    check_shape(relation, fact)?;
    relation
        .fields()
        .iter()
        .zip(fact)
        .map(|(field, value)| serialize_field(&mut *exports, handle, *field, value))
        .collect()
}

/// Decode one row of words into a fact.
pub fn deserialize_fact<M>(exports: &mut M, handle: Handle, relation: &Relation, row: &[u32]) -> Result<Vec<Value>>
where
    M: ProgramExports + ?Sized,
{
    relation
        .fields()
        .iter()
        .zip(row)
        .map(|(field, word)| deserialize_field(&mut *exports, handle, *field, *word))
        .collect()
}

/// Symbol identifying `relation` on the wire.
fn fact_type<M>(exports: &mut M, handle: Handle, relation: &Relation) -> Result<u32>
where
    M: ProgramExports + ?Sized,
{
    encode_string(exports, handle, relation.name())
}

/// Insert a single fact.
pub fn add_fact<M>(exports: &mut M, handle: Handle, relation: &Relation, fact: &[Value]) -> Result<()>
where
    M: ProgramExports + ?Sized,
{
    let row = serialize_fact(exports, handle, relation, fact)?;
    let fact_type = fact_type(exports, handle, relation)?;
    with_allocation(exports, byte_len(row.len())?, |m, address| {
        m.write_words(address, &row)?;
        m.add_fact(handle.address(), fact_type, address)
    })?;
    tracing::trace!(relation = relation.name(), "add_fact");
    Ok(())
}

/// Insert a batch of facts with one module call. Rows are packed in the order
/// given.
pub fn add_facts<M, F>(exports: &mut M, handle: Handle, relation: &Relation, facts: &[F]) -> Result<()>
where
    M: ProgramExports + ?Sized,
    F: AsRef<[Value]>,
{
    for fact in facts {
        check_shape(relation, fact.as_ref())?;
    }
    let mut words = Vec::with_capacity(facts.len() * relation.arity());
    for fact in facts {
        words.extend(serialize_fact(exports, handle, relation, fact.as_ref())?);
    }
    let count = u32::try_from(facts.len()).map_err(|_| Error::BufferTooLarge(facts.len() as u64))?;
    let fact_type = fact_type(exports, handle, relation)?;
    with_allocation(exports, byte_len(words.len())?, |m, address| {
        m.write_words(address, &words)?;
        m.add_facts(handle.address(), fact_type, address, count)
    })?;
    tracing::trace!(relation = relation.name(), count, "add_facts");
    Ok(())
}

/// Read every fact the module currently holds for `relation`, in the module's
/// own enumeration order.
///
/// The result buffer holds `count * arity` words; row `i` starts at word
/// `i * arity`.
pub fn get_facts<M>(exports: &mut M, handle: Handle, relation: &Relation) -> Result<Vec<Vec<Value>>>
where
    M: ProgramExports + ?Sized,
{
    let fact_type = fact_type(exports, handle, relation)?;
    let address = exports.get_facts(handle.address(), fact_type)?;
    let facts = with_result_buffer(exports, address, |m, address| {
        let count = m.fact_count(handle.address(), fact_type)? as usize;
        let arity = relation.arity();
        let words = m.read_words(address, count * arity)?;
        words
            .chunks_exact(arity)
            .map(|row| deserialize_fact(&mut *m, handle, relation, row))
            .collect::<Result<Vec<_>>>()
    })?;
    tracing::trace!(relation = relation.name(), count = facts.len(), "get_facts");
    Ok(facts)
}
