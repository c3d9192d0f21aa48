/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * Fact handlers derived from relation declarations.
 *
 * A relation's direction decides which operations exist for it:
 *
 *   INPUT         -> add_fact, add_facts
 *   OUTPUT        -> get_facts
 *   INPUT_OUTPUT  -> add_fact, add_facts, get_facts
 *
 * Two ways in. `Program::facts` takes a runtime list of `Relation`s and hands
 * out `InputFacts` / `OutputFacts` by name, checking direction when asked.
 * `Program::handler` and the `eclair_program!` macro use `Fact<D, T>` so that
 * direction and tuple type are checked by the compiler.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 */

use crate::error::{Error, Result};
use crate::exports::ProgramExports;
use crate::fact::{DirectionMarker, Fact, FactValue, Insert, Retrieve};
use crate::program::Program;
use crate::types::{Relation, Value};
use std::collections::HashMap;

// =============================================================================
// Runtime-shaped handlers
// =============================================================================

/// Name-indexed handlers for a program's relations.
pub struct FactHandlers<'p, M: ProgramExports> {
    program: &'p Program<M>,
    relations: HashMap<String, Relation>,
}

impl<M: ProgramExports> Program<M> {
    /// Derive handlers for `relations`. Names must be unique.
    pub fn facts(&self, relations: &[Relation]) -> Result<FactHandlers<'_, M>> {
        let mut by_name = HashMap::with_capacity(relations.len());
        for relation in relations {
            if by_name
                .insert(relation.name().to_string(), relation.clone())
                .is_some()
            {
                return Err(Error::DuplicateRelation(relation.name().to_string()));
            }
        }
        Ok(FactHandlers {
            program: self,
            relations: by_name,
        })
    }

    /// Typed handler for a statically declared relation.
    pub fn handler<D, T>(&self, fact: Fact<D, T>) -> Handler<'_, M, D, T>
    where
        D: DirectionMarker,
        T: FactValue,
    {
        Handler { program: self, fact }
    }
}

impl<'p, M: ProgramExports> FactHandlers<'p, M> {
    pub fn run(&self) -> Result<()> {
        self.program.run()
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    /// Insert operations for `name`. Fails for OUTPUT relations.
    pub fn input(&self, name: &str) -> Result<InputFacts<'_, M>> {
        let relation = self.lookup(name)?;
        if !relation.direction().accepts_input() {
            return Err(Error::DirectionMismatch {
                name: name.to_string(),
                direction: relation.direction(),
                operation: "input",
            });
        }
        Ok(InputFacts {
            program: self.program,
            relation,
        })
    }

    /// Retrieval operations for `name`. Fails for INPUT relations.
    pub fn output(&self, name: &str) -> Result<OutputFacts<'_, M>> {
        let relation = self.lookup(name)?;
        if !relation.direction().produces_output() {
            return Err(Error::DirectionMismatch {
                name: name.to_string(),
                direction: relation.direction(),
                operation: "output",
            });
        }
        Ok(OutputFacts {
            program: self.program,
            relation,
        })
    }

    fn lookup(&self, name: &str) -> Result<&Relation> {
        self.relations
            .get(name)
            .ok_or_else(|| Error::UnknownRelation(name.to_string()))
    }
}

/// Insert side of an INPUT or INPUT_OUTPUT relation.
pub struct InputFacts<'a, M: ProgramExports> {
    program: &'a Program<M>,
    relation: &'a Relation,
}

impl<M: ProgramExports> InputFacts<'_, M> {
    pub fn add_fact(&self, fact: &[Value]) -> Result<()> {
        self.program.add_fact(self.relation, fact)
    }

    pub fn add_facts<F: AsRef<[Value]>>(&self, facts: &[F]) -> Result<()> {
        self.program.add_facts(self.relation, facts)
    }
}

/// Retrieval side of an OUTPUT or INPUT_OUTPUT relation.
pub struct OutputFacts<'a, M: ProgramExports> {
    program: &'a Program<M>,
    relation: &'a Relation,
}

impl<M: ProgramExports> OutputFacts<'_, M> {
    pub fn get_facts(&self) -> Result<Vec<Vec<Value>>> {
        self.program.get_facts(self.relation)
    }
}

// =============================================================================
// Statically typed handlers
// =============================================================================

/// Handler for one relation with a compile-time direction `D` and tuple type `T`.
///
/// Only INPUT and INPUT_OUTPUT handlers can insert:
///
/// ```compile_fail
/// use eclair_wasm_bindings::{Fact, Output, Program, ProgramExports, Result};
///
/// fn insert_into_output<M: ProgramExports>(program: &Program<M>) -> Result<()> {
///     let reachable = program.handler(Fact::<Output, (u32, u32)>::new("reachable")?);
///     reachable.add_fact(&(1, 2))
/// }
/// ```
///
/// Only OUTPUT and INPUT_OUTPUT handlers can be read:
///
/// ```compile_fail
/// use eclair_wasm_bindings::{Fact, Input, Program, ProgramExports, Result};
///
/// fn read_from_input<M: ProgramExports>(program: &Program<M>) -> Result<Vec<(u32, u32)>> {
///     let edge = program.handler(Fact::<Input, (u32, u32)>::new("edge")?);
///     edge.get_facts()
/// }
/// ```
///
/// INPUT_OUTPUT handlers do both:
///
/// ```
/// use eclair_wasm_bindings::{Fact, InputOutput, Program, ProgramExports, Result};
///
/// fn echo<M: ProgramExports>(program: &Program<M>) -> Result<Vec<(u32, String)>> {
///     let label = program.handler(Fact::<InputOutput, (u32, String)>::new("label")?);
///     label.add_fact(&(1, "one".to_string()))?;
///     label.get_facts()
/// }
/// ```
pub struct Handler<'p, M: ProgramExports, D, T> {
    program: &'p Program<M>,
    fact: Fact<D, T>,
}

impl<M: ProgramExports, D: DirectionMarker, T: FactValue> Handler<'_, M, D, T> {
    pub fn relation(&self) -> &Relation {
        self.fact.relation()
    }
}

impl<M: ProgramExports, D: Insert, T: FactValue> Handler<'_, M, D, T> {
    pub fn add_fact(&self, fact: &T) -> Result<()> {
        self.program.add_fact(self.fact.relation(), &fact.to_values())
    }

    pub fn add_facts(&self, facts: &[T]) -> Result<()> {
        let rows: Vec<Vec<Value>> = facts.iter().map(FactValue::to_values).collect();
        self.program.add_facts(self.fact.relation(), &rows)
    }
}

impl<M: ProgramExports, D: Retrieve, T: FactValue> Handler<'_, M, D, T> {
    pub fn get_facts(&self) -> Result<Vec<T>> {
        self.program
            .get_facts(self.fact.relation())?
            .into_iter()
            .map(T::from_values)
            .collect()
    }
}

/// Declare a struct holding one typed handler per relation, plus `run()`.
///
/// ```no_run
/// use eclair_wasm_bindings::{eclair_program, with_program, ModuleConfig, WasmInstance};
///
/// eclair_program! {
///     pub struct Path {
///         edge: Input(u32, u32),
///         reachable: Output(u32, u32),
///     }
/// }
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let bytes = std::fs::read("path.wasm")?;
///     let instance = WasmInstance::from_binary(&bytes, &ModuleConfig::default())?;
///     let reachable = with_program(instance, |program| {
///         let path = Path::new(program)?;
///         path.edge.add_fact(&(1, 2))?;
///         path.edge.add_fact(&(2, 3))?;
///         path.run()?;
///         path.reachable.get_facts()
///     })?;
///     println!("{:?}", reachable);
///     Ok(())
/// }
/// ```
///
/// Each relation is named after its field, so a repeated name does not compile:
///
/// ```compile_fail
/// eclair_wasm_bindings::eclair_program! {
///     struct Twice {
///         edge: Input(u32, u32),
///         edge: Input(u32, u32),
///     }
/// }
/// ```
///
/// and neither does inserting into an OUTPUT field:
///
/// ```compile_fail
/// use eclair_wasm_bindings::{eclair_program, Program, ProgramExports, Result};
///
/// eclair_program! {
///     struct Path {
///         edge: Input(u32, u32),
///         reachable: Output(u32, u32),
///     }
/// }
///
/// fn insert<M: ProgramExports>(program: &Program<M>) -> Result<()> {
///     Path::new(program)?.reachable.add_fact(&(1, 2))
/// }
/// ```
#[macro_export]
macro_rules! eclair_program {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($field:ident : $dir:ident ( $($column:ty),+ $(,)? )),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name<'p, M: $crate::ProgramExports> {
            program: &'p $crate::Program<M>,
            $(pub $field: $crate::Handler<'p, M, $crate::$dir, ($($column,)+)>,)+
        }

        impl<'p, M: $crate::ProgramExports> $name<'p, M> {
            pub fn new(program: &'p $crate::Program<M>) -> $crate::Result<Self> {
                Ok($name {
                    program,
                    $($field: program.handler($crate::Fact::new(stringify!($field))?),)+
                })
            }

            /// Declarations of every relation in this program, in order.
            pub fn relations(&self) -> Vec<$crate::Relation> {
                vec![$(self.$field.relation().clone()),+]
            }

            pub fn run(&self) -> $crate::Result<()> {
                self.program.run()
            }
        }
    };
}
