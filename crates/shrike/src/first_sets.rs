//! Calculation of the terminals that may begin a rule.

use crate::{
    grammar::{Grammar, RuleID, SymbolID, TerminalSet},
    types::{Map, Set},
};

static EMPTY: TerminalSet = TerminalSet::new();

/// The one-level FIRST set of every rule.
///
/// For each rule, the leading symbol of every alternative is collected;
/// a leading rule reference is followed into that rule's alternatives
/// unless it has already been visited. Empty alternatives contribute
/// nothing and do not make the following symbol visible.
#[derive(Debug)]
pub struct FirstSets {
    map: Map<RuleID, TerminalSet>,
}

impl FirstSets {
    pub fn new(grammar: &Grammar) -> Self {
        let map = grammar
            .rules
            .keys()
            .map(|&id| (id, leading_terminals(grammar, id)))
            .collect();
        Self { map }
    }

    /// `First(rule)`
    pub fn get(&self, rule: RuleID) -> &TerminalSet {
        self.map.get(&rule).unwrap_or(&EMPTY)
    }
}

fn leading_terminals(grammar: &Grammar, rule: RuleID) -> TerminalSet {
    let mut first = TerminalSet::new();

    let mut visited = Set::default();
    visited.insert(rule);
    let mut stack: Vec<&[SymbolID]> = grammar
        .rule(rule)
        .productions()
        .iter()
        .map(|p| &p[..])
        .collect();

    while let Some(production) = stack.pop() {
        match production.first() {
            None => continue,
            Some(SymbolID::T(t)) => {
                first.insert(*t);
            }
            Some(SymbolID::N(n)) => {
                // 左再帰で無限ループにならないよう、一度見た rule は辿らない
                if visited.insert(*n) {
                    stack.extend(grammar.rule(*n).productions().iter().map(|p| &p[..]));
                }
            }
        }
    }

    first
}
