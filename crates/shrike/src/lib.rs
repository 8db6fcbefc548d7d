//! Compiler of grammar files into shift/reduce automata, and a driver that
//! runs input programs against them.

pub mod automaton;
pub mod conflicts;
pub mod driver;
pub mod first_sets;
pub mod grammar;
pub mod scanner;
pub mod syntax;
pub mod types;
pub mod util;

use crate::{automaton::Automaton, conflicts::ConflictError, grammar::Grammar};

/// Build the automaton of `grammar` and check it for conflicts.
pub fn compile(grammar: &Grammar) -> Result<Automaton, ConflictError> {
    let mut automaton = Automaton::build(grammar);
    conflicts::check(grammar, &mut automaton)?;
    Ok(automaton)
}
