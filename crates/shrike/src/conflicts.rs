//! Detection of inconsistent actions in the automaton.

use crate::{
    automaton::{Automaton, NodeID},
    grammar::{Grammar, TerminalID},
};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConflictError {
    #[error("shift/reduce conflict in state {node} on {terminal} (reduce: {reduce})")]
    ShiftReduce {
        node: NodeID,
        terminal: String,
        reduce: String,
    },

    #[error("reduce/reduce conflict in state {node} on {terminal} ({first} / {second})")]
    ReduceReduce {
        node: NodeID,
        terminal: String,
        first: String,
        second: String,
    },
}

impl ConflictError {
    pub fn node(&self) -> NodeID {
        match self {
            Self::ShiftReduce { node, .. } | Self::ReduceReduce { node, .. } => *node,
        }
    }

    /// The name of the lookahead terminal with more than one action.
    pub fn terminal(&self) -> &str {
        match self {
            Self::ShiftReduce { terminal, .. } | Self::ReduceReduce { terminal, .. } => terminal,
        }
    }
}

/// Check every state against every terminal of the grammar, and mark the
/// accepting states.
pub fn check(g: &Grammar, automaton: &mut Automaton) -> Result<(), ConflictError> {
    let vocabulary: Vec<TerminalID> = g.terminals.keys().copied().collect();
    check_with_vocabulary(g, automaton, &vocabulary)
}

/// Same as [`check`], but only the terminals in `vocabulary` are inspected.
pub fn check_with_vocabulary(
    g: &Grammar,
    automaton: &mut Automaton,
    vocabulary: &[TerminalID],
) -> Result<(), ConflictError> {
    let span = tracing::trace_span!("check_conflicts");
    let _entered = span.enter();

    let mut accepts = vec![];
    for node in automaton.nodes() {
        for &terminal in vocabulary {
            let shift = node.edge(terminal.into());
            let mut reduces = node.reductions(g, terminal);

            let Some(reduce) = reduces.next() else {
                continue;
            };
            if shift.is_some() {
                return Err(ConflictError::ShiftReduce {
                    node: node.id(),
                    terminal: g.terminal(terminal).to_string(),
                    reduce: reduce.display(g).to_string(),
                });
            }
            if let Some(second) = reduces.next() {
                return Err(ConflictError::ReduceReduce {
                    node: node.id(),
                    terminal: g.terminal(terminal).to_string(),
                    first: reduce.display(g).to_string(),
                    second: second.display(g).to_string(),
                });
            }
        }

        let accept = node
            .reductions(g, TerminalID::EOI)
            .any(|core| core.rule == g.start_rule);
        if accept {
            tracing::debug!("state {} accepts", node.id());
            accepts.push(node.id());
        }
    }

    for id in accepts {
        automaton.set_accept(id, true);
    }

    Ok(())
}
