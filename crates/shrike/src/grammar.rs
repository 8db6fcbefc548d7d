//! Grammar types.

use crate::{
    syntax::{self as s, SyntaxError},
    types::Map,
    util::display_fn,
};
use std::{collections::BTreeSet, fmt, fs, io, marker::PhantomData, path::Path};

/// The rule used as the start symbol when none is given explicitly.
pub const DEFAULT_START_RULE: &str = "PROGRAM";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}

impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }
}

/// A sorted set of terminals, used as the lookahead set of an item.
pub type TerminalSet = BTreeSet<TerminalID>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TerminalKind {
    EndOfInput,
    /// Declared in an `atoms:` section.
    Atom,
    /// Written as a quoted literal in some production.
    Literal,
}

#[derive(Debug)]
pub struct Terminal {
    id: TerminalID,
    name: String,
    kind: TerminalKind,
}

impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }

    /// The symbol name matched against scanned tokens.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TerminalKind {
        self.kind
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TerminalKind::Literal => write!(f, "'{}'", self.name),
            _ => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleID {
    raw: u16,
}

impl RuleID {
    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(RuleID),
}

impl From<TerminalID> for SymbolID {
    fn from(id: TerminalID) -> Self {
        Self::T(id)
    }
}

impl From<RuleID> for SymbolID {
    fn from(id: RuleID) -> Self {
        Self::N(id)
    }
}

/// A named nonterminal together with its alternative production bodies.
#[derive(Debug)]
pub struct Rule {
    id: RuleID,
    name: String,
    productions: Vec<Vec<SymbolID>>,
}

impl Rule {
    pub fn id(&self) -> RuleID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn productions(&self) -> &[Vec<SymbolID>] {
        &self.productions[..]
    }

    pub fn production(&self, index: usize) -> &[SymbolID] {
        &self.productions[index][..]
    }

    // `"NAME = a + 'b' | c"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} =", self.name)?;
            for (i, production) in self.productions.iter().enumerate() {
                if i > 0 {
                    f.write_str(" |")?;
                }
                if production.is_empty() {
                    f.write_str(" ''")?;
                }
                for (j, symbol) in production.iter().enumerate() {
                    if j > 0 {
                        f.write_str(" +")?;
                    }
                    write!(f, " {}", g.symbol_display(*symbol))?;
                }
            }
            Ok(())
        })
    }
}

/// The grammar definition used to derive the automaton.
///
/// Rules live in an arena keyed by `RuleID`; productions refer to other rules
/// only through these keys, so forward and recursive references need no
/// special treatment.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, Terminal>,
    pub rules: Map<RuleID, Rule>,
    pub atoms: Vec<TerminalID>,
    pub start_rule: RuleID,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## atoms:")?;
        for atom in &self.atoms {
            writeln!(f, "{}", self.terminals[atom])?;
        }

        writeln!(f, "\n## literals:")?;
        for literal in self.literals() {
            writeln!(f, "{}", literal)?;
        }

        writeln!(f, "\n## rules:")?;
        for rule in self.rules.values() {
            write!(f, "{}", rule.display(self))?;
            if rule.id() == self.start_rule {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarError> {
        let source = fs::read_to_string(path).map_err(GrammarError::IO)?;
        Self::from_str(&source)
    }

    pub fn from_file_with_start(
        path: impl AsRef<Path>,
        start: &str,
    ) -> Result<Grammar, GrammarError> {
        let source = fs::read_to_string(path).map_err(GrammarError::IO)?;
        Self::from_str_with_start(&source, start)
    }

    /// Load a grammar whose start rule is `PROGRAM`, or the first defined
    /// rule if there is no such rule.
    pub fn from_str(source: &str) -> Result<Grammar, GrammarError> {
        let grammar = crate::syntax::parse(source)?;
        Grammar::define(|g| define_grammar_from_syntax(g, grammar, None))
    }

    pub fn from_str_with_start(source: &str, start: &str) -> Result<Grammar, GrammarError> {
        let grammar = crate::syntax::parse(source)?;
        Grammar::define(|g| define_grammar_from_syntax(g, grammar, Some(start)))
    }

    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let span = tracing::trace_span!("define_grammar");
        let _entered = span.enter();

        let mut def = GrammarDef {
            terminals: Map::default(),
            rules: Map::default(),
            atoms: vec![],
            start: None,
            next_terminal_id: TerminalID::OFFSET,
            next_rule_id: 0,
            _marker: PhantomData,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Terminal {
                id: TerminalID::EOI,
                name: "$".into(),
                kind: TerminalKind::EndOfInput,
            },
        );

        f(&mut def)?;

        def.end()
    }

    pub fn rule(&self, id: RuleID) -> &Rule {
        &self.rules[&id]
    }

    pub fn terminal(&self, id: TerminalID) -> &Terminal {
        &self.terminals[&id]
    }

    pub fn rule_by_name(&self, name: &str) -> Option<RuleID> {
        self.rules
            .values()
            .find(|rule| rule.name == name)
            .map(|rule| rule.id)
    }

    /// Look up the terminal matched by a scanned symbol name (`$` for the end of input).
    pub fn terminal_by_name(&self, name: &str) -> Option<TerminalID> {
        self.terminals
            .values()
            .find(|terminal| terminal.name == name)
            .map(|terminal| terminal.id)
    }

    /// Every quoted literal used by the productions, in order of first use.
    pub fn literals(&self) -> impl Iterator<Item = &Terminal> + '_ {
        self.terminals
            .values()
            .filter(|terminal| terminal.kind == TerminalKind::Literal)
    }

    /// The name of a symbol, as used for edge labels and in the parse trace.
    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => &self.terminals[&t].name,
            SymbolID::N(n) => &self.rules[&n].name,
        }
    }

    pub fn symbol_display(&self, symbol: SymbolID) -> impl fmt::Display + '_ {
        display_fn(move |f| match symbol {
            SymbolID::T(t) => write!(f, "{}", self.terminals[&t]),
            SymbolID::N(n) => f.write_str(&self.rules[&n].name),
        })
    }
}

fn define_grammar_from_syntax(
    g: &mut GrammarDef<'_>,
    grammar: s::ast::Grammar,
    start: Option<&str>,
) -> Result<(), GrammarError> {
    // Declare every name first so that productions may refer to rules
    // defined further down the file.
    let mut rules = vec![];
    for stmt in &grammar.stmts {
        match stmt {
            s::ast::Stmt::Atoms(desc) => {
                for name in &desc.names {
                    g.atom(name)?;
                }
            }
            s::ast::Stmt::Rule(desc) => {
                let id = g.rule(&desc.name)?;
                rules.push((id, desc));
            }
        }
    }

    for (id, desc) in rules {
        for alternative in &desc.alternatives {
            let mut production = Vec::with_capacity(alternative.elems.len());
            for elem in &alternative.elems {
                let symbol = match elem {
                    s::ast::Elem::Literal(text) => SymbolID::T(g.literal(text)?),
                    s::ast::Elem::Ident(name) => g.lookup(name).ok_or_else(|| {
                        GrammarError::UnknownSymbol {
                            rule: desc.name.clone(),
                            symbol: name.clone(),
                            line: desc.line,
                        }
                    })?,
                };
                production.push(symbol);
            }
            g.production(id, production)?;
        }
    }

    if let Some(name) = start {
        let start = g
            .rules
            .values()
            .find(|rule| rule.name == name)
            .map(|rule| rule.id)
            .ok_or_else(|| GrammarError::UnknownStartRule { name: name.into() })?;
        g.start_rule(start);
    }

    Ok(())
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef<'def> {
    terminals: Map<TerminalID, Terminal>,
    rules: Map<RuleID, Rule>,
    atoms: Vec<TerminalID>,
    start: Option<RuleID>,
    next_terminal_id: u16,
    next_rule_id: u16,
    _marker: PhantomData<&'def mut ()>,
}

impl<'def> GrammarDef<'def> {
    /// Declare an atom, i.e. a terminal symbol referenced by its bare name.
    ///
    /// Declaring the same atom twice is harmless.
    pub fn atom(&mut self, name: &str) -> Result<TerminalID, GrammarError> {
        if self.rules.values().any(|rule| rule.name == name) {
            return Err(GrammarError::NameClash { name: name.into() });
        }
        if let Some(&id) = self
            .atoms
            .iter()
            .find(|id| self.terminals[*id].name == name)
        {
            return Ok(id);
        }
        let id = self.intern(name, TerminalKind::Atom);
        self.atoms.push(id);
        Ok(id)
    }

    /// Obtain the terminal corresponding to a quoted literal.
    ///
    /// `$` is reserved for the end of input and cannot be a literal.
    pub fn literal(&mut self, text: &str) -> Result<TerminalID, GrammarError> {
        if text == self.terminals[&TerminalID::EOI].name {
            return Err(GrammarError::NameClash { name: text.into() });
        }
        Ok(self.intern(text, TerminalKind::Literal))
    }

    fn intern(&mut self, name: &str, kind: TerminalKind) -> TerminalID {
        if let Some(terminal) = self.terminals.values().find(|t| t.name == name) {
            return terminal.id;
        }

        let id = TerminalID::new(self.next_terminal_id);
        self.next_terminal_id += 1;
        self.terminals.insert(
            id,
            Terminal {
                id,
                name: name.into(),
                kind,
            },
        );
        id
    }

    /// Declare a rule. Its productions are added with [`GrammarDef::production`].
    pub fn rule(&mut self, name: &str) -> Result<RuleID, GrammarError> {
        if self.rules.values().any(|rule| rule.name == name) {
            return Err(GrammarError::DuplicateRule { name: name.into() });
        }
        if self.atoms.iter().any(|id| self.terminals[id].name == name) {
            return Err(GrammarError::NameClash { name: name.into() });
        }

        let id = RuleID::new(self.next_rule_id);
        self.next_rule_id += 1;
        self.rules.insert(
            id,
            Rule {
                id,
                name: name.into(),
                productions: vec![],
            },
        );

        Ok(id)
    }

    /// Add an alternative production body to the specified rule.
    pub fn production<I>(&mut self, rule: RuleID, symbols: I) -> Result<(), GrammarError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let production: Vec<SymbolID> = symbols.into_iter().collect();
        let rule = self
            .rules
            .get_mut(&rule)
            .ok_or_else(|| GrammarError::Other {
                msg: "production added to an undeclared rule".into(),
            })?;
        if rule.productions.contains(&production) {
            return Err(GrammarError::DuplicateProduction {
                rule: rule.name.clone(),
            });
        }
        rule.productions.push(production);
        Ok(())
    }

    /// Specify the start rule of this grammar.
    pub fn start_rule(&mut self, rule: RuleID) {
        self.start.replace(rule);
    }

    /// Resolve a bare name to a rule or a declared atom.
    fn lookup(&self, name: &str) -> Option<SymbolID> {
        if let Some(rule) = self.rules.values().find(|rule| rule.name == name) {
            return Some(SymbolID::N(rule.id));
        }
        self.atoms
            .iter()
            .find(|id| self.terminals[*id].name == name)
            .map(|id| SymbolID::T(*id))
    }

    fn end(mut self) -> Result<Grammar, GrammarError> {
        // 指定されていない場合は PROGRAM、それもなければ最初に定義された rule を用いる
        let start_rule = match self.start.take() {
            Some(start) => start,
            None => self
                .rules
                .values()
                .find(|rule| rule.name == DEFAULT_START_RULE)
                .or_else(|| self.rules.values().next())
                .map(|rule| rule.id)
                .ok_or(GrammarError::EmptyGrammar)?,
        };

        Ok(Grammar {
            terminals: self.terminals,
            rules: self.rules,
            atoms: self.atoms,
            start_rule,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("Syntax error: {}", _0)]
    Syntax(
        #[from]
        #[source]
        SyntaxError,
    ),

    #[error("line {}: missing rule or atom `{}' referenced by `{}'", line, symbol, rule)]
    UnknownSymbol {
        rule: String,
        symbol: String,
        line: usize,
    },

    #[error("the rule `{}' is defined more than once", name)]
    DuplicateRule { name: String },

    #[error("`{}' is already used by a symbol of another kind", name)]
    NameClash { name: String },

    #[error("duplicate production detected in `{}'", rule)]
    DuplicateProduction { rule: String },

    #[error("unknown start rule: `{}'", name)]
    UnknownStartRule { name: String },

    #[error("the grammar defines no rules")]
    EmptyGrammar,

    #[error("Other error: {}", msg)]
    Other { msg: String },
}
