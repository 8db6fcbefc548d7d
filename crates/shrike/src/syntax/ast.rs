#[derive(Debug)]
pub struct Grammar {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Stmt {
    Atoms(AtomsDesc),
    Rule(RuleDesc),
}

/// `atoms: a, b, c`
#[derive(Debug)]
pub struct AtomsDesc {
    pub names: Vec<String>,
    pub line: usize,
}

/// `name = alt1 | alt2 | ...`
#[derive(Debug)]
pub struct RuleDesc {
    pub name: String,
    pub alternatives: Vec<Alternative>,
    pub line: usize,
}

/// One `+`-joined symbol sequence. Empty when the alternative only consists of `''`.
#[derive(Debug)]
pub struct Alternative {
    pub elems: Vec<Elem>,
}

#[derive(Debug, PartialEq)]
pub enum Elem {
    /// A reference to a rule or an atom.
    Ident(String),
    /// The content of a single-quoted literal, without quotes.
    Literal(String),
}
