//! The shift/reduce automaton: items, states and their construction.

use crate::{
    first_sets::FirstSets,
    grammar::{Grammar, RuleID, SymbolID, TerminalID, TerminalSet},
    types::{Map, Queue, Set},
    util::{display_fn, join},
};
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeID {
    raw: usize,
}

impl NodeID {
    const fn new(raw: usize) -> Self {
        Self { raw }
    }

    /// The stable index assigned to this state during construction.
    pub const fn index(self) -> usize {
        self.raw
    }
}

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.raw)
    }
}

/// A dotted production, i.e. an item without its lookahead set.
// X: Y1 Y2 ... Yn という構文規則に marker 位置を付与したもの
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemCore {
    pub rule: RuleID,
    /// Index of the alternative within the rule.
    pub production: usize,
    /// Number of symbols matched so far.
    pub marker: usize,
}

impl ItemCore {
    pub fn production<'g>(&self, g: &'g Grammar) -> &'g [SymbolID] {
        g.rule(self.rule).production(self.production)
    }

    /// The symbol immediately following the dot, if any.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        self.production(g).get(self.marker).copied()
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        self.marker >= self.production(g).len()
    }

    fn shifted(&self) -> Self {
        Self {
            marker: self.marker + 1,
            ..*self
        }
    }

    // `"NAME -> a . 'b' c"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let production = self.production(g);
            write!(f, "{} ->", g.rule(self.rule).name())?;
            for (i, symbol) in production.iter().enumerate() {
                if i == self.marker {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_display(*symbol))?;
            }
            if self.marker == production.len() {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// The items of a state, each core mapped to its lookahead set.
///
/// Both levels are ordered, so two item sets compare (and hash) equal
/// exactly when they contain the same items, however they were derived.
pub type ItemSet = BTreeMap<ItemCore, TerminalSet>;

/// A state of the automaton.
#[derive(Debug)]
pub struct Node {
    id: NodeID,
    items: ItemSet,
    edges: Map<SymbolID, NodeID>,
    accept: bool,
}

impl Node {
    pub fn id(&self) -> NodeID {
        self.id
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    /// The goto/shift transitions, one per symbol that follows a dot.
    pub fn edges(&self) -> impl Iterator<Item = (SymbolID, NodeID)> + '_ {
        self.edges.iter().map(|(symbol, target)| (*symbol, *target))
    }

    pub fn edge(&self, symbol: SymbolID) -> Option<NodeID> {
        self.edges.get(&symbol).copied()
    }

    /// Whether the state completes the start rule with the end of input as lookahead.
    pub fn is_accept(&self) -> bool {
        self.accept
    }

    /// The completed items that may be reduced on `lookahead`.
    pub fn reductions<'a>(
        &'a self,
        g: &'a Grammar,
        lookahead: TerminalID,
    ) -> impl Iterator<Item = ItemCore> + 'a {
        self.items
            .iter()
            .filter(move |(core, lookaheads)| {
                core.is_complete(g) && lookaheads.contains(&lookahead)
            })
            .map(|(core, _)| *core)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "#### State {}", self.id)?;
            if self.accept {
                f.write_str(" (accept)")?;
            }
            writeln!(f)?;

            writeln!(f, "## items")?;
            for (core, lookaheads) in &self.items {
                let lookaheads = lookaheads.iter().map(|t| g.terminal(*t));
                writeln!(f, "- {}  [{}]", core.display(g), join(lookaheads, " "))?;
            }

            if !self.edges.is_empty() {
                writeln!(f, "## edges")?;
                for (symbol, target) in &self.edges {
                    writeln!(f, "- {} => {}", g.symbol_display(*symbol), target)?;
                }
            }
            Ok(())
        })
    }
}

/// The complete state graph derived from a grammar.
#[derive(Debug)]
pub struct Automaton {
    nodes: Vec<Node>,
}

impl Automaton {
    /// Build every state reachable from the closure of the start rule's productions.
    pub fn build(grammar: &Grammar) -> Self {
        let span = tracing::trace_span!("build_automaton");
        let _entered = span.enter();

        let mut builder = AutomatonBuilder::new(grammar);
        builder.populate_nodes();
        builder.finish()
    }

    pub fn start(&self) -> NodeID {
        NodeID::START
    }

    pub fn node(&self, id: NodeID) -> &Node {
        &self.nodes[id.raw]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn set_accept(&mut self, id: NodeID, accept: bool) {
        self.nodes[id.raw].accept = accept;
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, node) in self.nodes.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                write!(f, "{}", node.display(g))?;
            }
            Ok(())
        })
    }
}

impl NodeID {
    const START: Self = Self::new(0);
}

/// The seed items of the start state: every production of the start rule,
/// with the dot at the beginning and the end of input as lookahead.
pub fn start_items(grammar: &Grammar) -> ItemSet {
    let rule = grammar.rule(grammar.start_rule);
    (0..rule.productions().len())
        .map(|production| {
            let core = ItemCore {
                rule: rule.id(),
                production,
                marker: 0,
            };
            let lookaheads: TerminalSet = Some(TerminalID::EOI).into_iter().collect();
            (core, lookaheads)
        })
        .collect()
}

/// Expand `items` in place to its closure.
///
/// For every item `[X -> ... . Y beta]` with `Y` a rule, an item
/// `[Y -> . gamma]` is added for each alternative of `Y`. Its lookahead is
/// `{b}` if `beta` starts with a terminal `b`, `First(Z)` if `beta` starts with
/// a rule `Z`, and the lookahead of the expanded item if `beta` is empty.
/// Items with the same core are merged by unioning their lookaheads, and the
/// expansion repeats until neither the items nor any lookahead set grows.
pub fn expand_closure(grammar: &Grammar, first_sets: &FirstSets, items: &mut ItemSet) {
    let mut changed = true;
    while changed {
        changed = false;

        // 候補の抽出
        let mut added: Map<ItemCore, TerminalSet> = Map::default();
        for (core, lookaheads) in &*items {
            // [X -> ... . Y beta]
            let (y_symbol, beta) = match &core.production(grammar)[core.marker..] {
                [SymbolID::N(y_symbol), beta @ ..] => (*y_symbol, beta),
                _ => continue,
            };

            let new_lookaheads: TerminalSet = match beta.first() {
                Some(SymbolID::T(t)) => Some(*t).into_iter().collect(),
                Some(SymbolID::N(z)) => first_sets.get(*z).clone(),
                None => lookaheads.clone(),
            };

            for production in 0..grammar.rule(y_symbol).productions().len() {
                added
                    .entry(ItemCore {
                        rule: y_symbol,
                        production,
                        marker: 0,
                    })
                    .or_default()
                    .extend(new_lookaheads.iter().copied());
            }
        }

        for (core, lookaheads) in added {
            let slot = items.entry(core).or_insert_with(|| {
                tracing::trace!("closure: add {:?}", core);
                changed = true;
                TerminalSet::new()
            });
            let before = slot.len();
            slot.extend(lookaheads);
            if slot.len() > before {
                tracing::trace!("closure: lookaheads of {:?} grew to {}", core, slot.len());
                changed = true;
            }
        }
    }
}

/// Group the items that can move their dot over the same symbol, and move it.
///
/// The returned item sets are not closed yet.
pub fn extract_transitions(grammar: &Grammar, items: &ItemSet) -> Map<SymbolID, ItemSet> {
    let mut item_sets: Map<SymbolID, ItemSet> = Map::default();
    for (core, lookaheads) in items {
        // marker が終わりまで到達していれば無視する
        let Some(label) = core.next_symbol(grammar) else {
            continue;
        };
        item_sets
            .entry(label)
            .or_default()
            .entry(core.shifted())
            .or_default()
            .extend(lookaheads.iter().copied());
    }
    item_sets
}

// === AutomatonBuilder ===

#[derive(Debug)]
struct AutomatonBuilder<'g> {
    grammar: &'g Grammar,
    first_sets: FirstSets,
    // every distinct closure seen so far; the index is the NodeID.
    states: Set<ItemSet>,
    edges: Vec<Map<SymbolID, NodeID>>,
    pending: Queue<NodeID>,
}

impl<'g> AutomatonBuilder<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let first_sets = FirstSets::new(grammar);
        let mut builder = Self {
            grammar,
            first_sets,
            states: Set::default(),
            edges: vec![],
            pending: Queue::default(),
        };

        let mut items = start_items(grammar);
        expand_closure(grammar, &builder.first_sets, &mut items);
        let start = builder.register(items);
        debug_assert_eq!(start, NodeID::START);

        builder
    }

    /// Return the state equal to `items`, registering it if it is new.
    fn register(&mut self, items: ItemSet) -> NodeID {
        let (index, inserted) = self.states.insert_full(items);
        let id = NodeID::new(index);
        if inserted {
            tracing::debug!("registered state {}", id);
            self.edges.push(Map::default());
            self.pending.push(id);
        } else {
            tracing::trace!("reuse state {}", id);
        }
        id
    }

    fn populate_nodes(&mut self) {
        // 新規にノードが生成されなくなるまで繰り返す
        while let Some(id) = self.pending.pop() {
            let transitions = match self.states.get_index(id.raw) {
                Some(items) => extract_transitions(self.grammar, items),
                None => continue,
            };

            let mut edges = Map::default();
            for (symbol, mut items) in transitions {
                expand_closure(self.grammar, &self.first_sets, &mut items);
                let target = self.register(items);
                edges.insert(symbol, target);
            }
            self.edges[id.raw] = edges;
        }
    }

    fn finish(self) -> Automaton {
        let nodes = self
            .states
            .into_iter()
            .zip(self.edges)
            .enumerate()
            .map(|(index, (items, edges))| Node {
                id: NodeID::new(index),
                items,
                edges,
                accept: false,
            })
            .collect();
        Automaton { nodes }
    }
}
