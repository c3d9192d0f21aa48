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

use crate::error::{Error, Result};
use crate::types::Relation;
use serde_json::from_str;
use std::collections::HashSet;

/// Parse a JSON array of relation declarations:
///
/// ```json
/// [
///   { "name": "edge", "direction": "INPUT", "fields": ["NUMBER", "NUMBER"] },
///   { "name": "reachable", "direction": "OUTPUT", "fields": ["NUMBER", "NUMBER"] }
/// ]
/// ```
pub fn load_relations(json: &str) -> Result<Vec<Relation>> {
    let relations: Vec<Relation> = from_str(json)?;
    verify_unique_names(&relations)?;
    Ok(relations)
}

fn verify_unique_names(relations: &[Relation]) -> Result<()> {
    let mut seen = HashSet::new();
    for relation in relations {
        if !seen.insert(relation.name()) {
            return Err(Error::DuplicateRelation(relation.name().to_string()));
        }
    }
    Ok(())
}
