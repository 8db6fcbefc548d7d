//! Shift/reduce driver running an input program against the automaton.

use crate::{
    automaton::{Automaton, ItemCore, NodeID},
    grammar::{Grammar, RuleID, TerminalID},
    scanner::{ScanError, Scanner, TokenKind},
    util::display_fn,
};
use std::fmt;

/// A single decision taken by the driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    /// Consume a token and move to `to`.
    Shift {
        from: NodeID,
        to: NodeID,
        terminal: TerminalID,
    },

    /// Pop one state for every symbol in the body of a completed item.
    Reduce { node: NodeID, item: ItemCore },

    /// Follow the edge labelled with the reduced rule.
    Goto { from: NodeID, to: NodeID, rule: RuleID },

    Accept { node: NodeID },
}

impl Step {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Self::Shift { from, to, terminal } => {
                write!(f, "shift {} ({} -> {})", g.terminal(*terminal), from, to)
            }
            Self::Reduce { node, item } => {
                let len = item.production(g).len();
                write!(f, "reduce {} in {} (pop {})", item.display(g), node, len)
            }
            Self::Goto { from, to, rule } => {
                write!(f, "goto {} ({} -> {})", g.rule(*rule).name(), from, to)
            }
            Self::Accept { node } => write!(f, "accept in {}", node),
        })
    }
}

/// The result of a successful run.
#[derive(Debug)]
pub struct ParseOutcome {
    /// The accepting state reached at the end of input.
    pub accept: NodeID,
    /// Number of tokens consumed, not counting the end of input.
    pub shifted: usize,
    pub trace: Vec<Step>,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("no action in state {node} for {symbol:?}")]
    NoAction { node: NodeID, symbol: String },

    #[error("input ended in state {node}, which does not accept")]
    Incomplete { node: NodeID },

    #[error("state {node} has no goto for {rule}")]
    MissingGoto { node: NodeID, rule: String },

    #[error("state stack exhausted while reducing in state {node}")]
    StackUnderflow { node: NodeID },

    #[error("from scanner: {}", _0)]
    Scan(
        #[from]
        #[source]
        ScanError,
    ),
}

/// The driver, borrowing a grammar and its checked automaton.
///
/// The automaton must have passed [`crate::conflicts::check`], which marks
/// the accepting states; a driver over an unchecked automaton never accepts.
#[derive(Debug)]
pub struct Parser<'a> {
    grammar: &'a Grammar,
    automaton: &'a Automaton,
}

impl<'a> Parser<'a> {
    pub fn new(grammar: &'a Grammar, automaton: &'a Automaton) -> Self {
        Self { grammar, automaton }
    }

    /// Scan and parse an input program.
    pub fn parse(&self, input: &str) -> Result<ParseOutcome, ParseError> {
        let mut scanner = Scanner::new(input)?;
        self.run(&mut scanner)
    }

    pub fn run(&self, scanner: &mut Scanner<'_>) -> Result<ParseOutcome, ParseError> {
        let span = tracing::trace_span!("parse");
        let _entered = span.enter();

        let g = self.grammar;
        let mut state_stack: Vec<NodeID> = vec![];
        let mut current = self.automaton.start();
        let mut trace = vec![];
        let mut shifted = 0;

        loop {
            let token = scanner.peek();
            let symbol = token.symbol();
            let node = self.automaton.node(current);
            let terminal = g.terminal_by_name(symbol);

            if token.kind == TokenKind::End && self.accepts(current, state_stack.len()) {
                tracing::debug!("accept in state {}", current);
                trace.push(Step::Accept { node: current });
                return Ok(ParseOutcome {
                    accept: current,
                    shifted,
                    trace,
                });
            }

            let shift = terminal.and_then(|t| Some((t, node.edge(t.into())?)));
            if let Some((terminal, next)) = shift {
                tracing::debug!("shift {} ({} -> {})", symbol, current, next);
                trace.push(Step::Shift {
                    from: current,
                    to: next,
                    terminal,
                });
                state_stack.push(current);
                current = next;
                scanner.advance()?;
                shifted += 1;
                continue;
            }

            let reduce = terminal.and_then(|t| node.reductions(g, t).next());
            let Some(item) = reduce else {
                return Err(match token.kind {
                    TokenKind::End => ParseError::Incomplete { node: current },
                    _ => ParseError::NoAction {
                        node: current,
                        symbol: symbol.to_owned(),
                    },
                });
            };

            tracing::debug!("reduce {} in state {}", item.display(g), current);
            trace.push(Step::Reduce {
                node: current,
                item,
            });
            for _ in 0..item.production(g).len() {
                current = state_stack
                    .pop()
                    .ok_or(ParseError::StackUnderflow { node: current })?;
            }

            let next = self
                .automaton
                .node(current)
                .edge(item.rule.into())
                .ok_or_else(|| ParseError::MissingGoto {
                    node: current,
                    rule: g.rule(item.rule).name().to_owned(),
                })?;
            trace.push(Step::Goto {
                from: current,
                to: next,
                rule: item.rule,
            });
            state_stack.push(current);
            current = next;
        }
    }

    // Reducing the start rule here would pop every state off the stack,
    // leaving nothing but the implicit `start -> PROGRAM . $` step.
    fn accepts(&self, current: NodeID, depth: usize) -> bool {
        let g = self.grammar;
        let node = self.automaton.node(current);
        node.is_accept()
            && node
                .reductions(g, TerminalID::EOI)
                .any(|item| item.rule == g.start_rule && item.production(g).len() == depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflicts;

    fn compile(source: &str) -> (Grammar, Automaton) {
        let grammar = Grammar::from_str(source).unwrap();
        let mut automaton = Automaton::build(&grammar);
        conflicts::check(&grammar, &mut automaton).unwrap();
        (grammar, automaton)
    }

    const FUNCTION: &str = "\
atoms: identifier, statements;
PROGRAM = 'fn' + identifier + statements;
";

    #[test]
    fn accepts_single_function() {
        let (grammar, automaton) = compile(FUNCTION);
        let parser = Parser::new(&grammar, &automaton);
        let outcome = parser.parse("fn foo { return 1; }").unwrap();
        for step in &outcome.trace {
            eprintln!("{}", step.display(&grammar));
        }

        assert_eq!(outcome.shifted, 3);
        assert!(automaton.node(outcome.accept).is_accept());
        assert!(matches!(outcome.trace.last(), Some(Step::Accept { .. })));
        let shifts = outcome
            .trace
            .iter()
            .filter(|step| matches!(step, Step::Shift { .. }))
            .count();
        assert_eq!(shifts, 3);
    }

    #[test]
    fn rejects_missing_keyword() {
        let (grammar, automaton) = compile(FUNCTION);
        let err = Parser::new(&grammar, &automaton)
            .parse("foo { }")
            .unwrap_err();
        match err {
            ParseError::NoAction { node, symbol } => {
                assert_eq!(node, automaton.start());
                assert_eq!(symbol, "identifier");
            }
            err => panic!("unexpected error: {err}"),
        }
    }

    #[test]
    fn rejects_truncated_input() {
        let (grammar, automaton) = compile(FUNCTION);
        let parser = Parser::new(&grammar, &automaton);
        assert!(matches!(
            parser.parse("fn foo"),
            Err(ParseError::Incomplete { .. })
        ));
        assert!(matches!(
            parser.parse("fn foo ;"),
            Err(ParseError::NoAction { symbol, .. }) if symbol == ";"
        ));
        assert!(matches!(
            parser.parse("fn foo { {"),
            Err(ParseError::Scan(ScanError::MalformedBlock { offset: 7 }))
        ));
    }

    #[test]
    fn reduces_recursive_rules() {
        let (grammar, automaton) = compile(
            "\
atoms: identifier, statements;
PROGRAM = FUNCTION + PROGRAM | FUNCTION;
FUNCTION = 'fn' + identifier + statements;
",
        );
        let parser = Parser::new(&grammar, &automaton);
        let outcome = parser.parse("fn a { } fn b { x; }").unwrap();
        assert_eq!(outcome.shifted, 6);

        let reduced: Vec<String> = outcome
            .trace
            .iter()
            .filter_map(|step| match step {
                Step::Reduce { item, .. } => Some(grammar.rule(item.rule).name().to_owned()),
                _ => None,
            })
            .collect();
        assert_eq!(reduced, ["FUNCTION", "FUNCTION", "PROGRAM"]);

        // trailing tokens after a complete program are rejected.
        assert!(matches!(
            parser.parse("fn a { } b"),
            Err(ParseError::NoAction { .. })
        ));
    }

    #[test]
    fn nested_accept_state_is_not_final() {
        let (grammar, automaton) = compile("S = 'a' + S + 'b' | 'a';");
        let parser = Parser::new(&grammar, &automaton);
        assert_eq!(parser.parse("a a b").unwrap().shifted, 3);
        assert_eq!(parser.parse("a").unwrap().shifted, 1);
        assert!(parser.parse("a a").is_err());
        assert!(parser.parse("a b").is_err());
    }
}
