//! Syntax support for the textual grammar format.
//!
//! ```text
//! // comment lines are ignored
//! atoms: identifier, statements;
//! PROGRAM = 'fn' + identifier + ARGS + statements;
//! ARGS = '(' + ')' | '';
//! ```

pub mod ast;
pub mod lexer;

use self::{
    ast::Stmt,
    lexer::{Keyword, Lexer, Token},
};
use crate::util::strip_comment_lines;

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("line {}: invalid token: {}", line, message)]
    Lexer { line: usize, message: String },

    #[error("line {}: expected {}, found {}", line, expected, found)]
    Unexpected {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {}: malformed atom declaration: {}", line, message)]
    MalformedAtoms { line: usize, message: String },
}

/// Parse the grammar source into its syntax tree.
///
/// Comment lines are removed before tokenizing.
pub fn parse(source: &str) -> Result<ast::Grammar, SyntaxError> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let source = strip_comment_lines(source);
    let mut tokens = vec![];
    for res in Lexer::new(&source) {
        let (start, token, _end) = res.map_err(|err| SyntaxError::Lexer {
            line: err.location.line as usize + 1,
            message: format!("{:?}", err.kind),
        })?;
        tokens.push((start.line as usize + 1, token));
    }

    let mut parser = StmtParser { tokens, pos: 0 };
    let mut stmts = vec![];
    loop {
        // stray separators are empty statements.
        while parser.eat(Token::Semicolon) {}
        let Some((line, token)) = parser.peek() else {
            break;
        };
        let stmt = match token {
            Token::Kw(Keyword::Atoms) => Stmt::Atoms(parser.atoms_desc(line)?),
            Token::Ident(..) => Stmt::Rule(parser.rule_desc(line)?),
            token => {
                return Err(SyntaxError::Unexpected {
                    line,
                    expected: "a rule definition or an `atoms:' declaration",
                    found: describe(Some(token)),
                })
            }
        };
        tracing::trace!("parsed statement: {:?}", stmt);
        stmts.push(stmt);

        // the final statement may omit its terminator.
        if !parser.eat(Token::Semicolon) && parser.peek().is_some() {
            return Err(parser.unexpected("`;'"));
        }
    }

    Ok(ast::Grammar { stmts })
}

struct StmtParser<'input> {
    tokens: Vec<(usize, Token<'input>)>,
    pos: usize,
}

impl<'input> StmtParser<'input> {
    fn peek(&self) -> Option<(usize, Token<'input>)> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<(usize, Token<'input>)> {
        let next = self.peek()?;
        self.pos += 1;
        Some(next)
    }

    fn eat(&mut self, expected: Token<'_>) -> bool {
        match self.peek() {
            Some((_, token)) if token == expected => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn line(&self) -> usize {
        match self.peek() {
            Some((line, _)) => line,
            None => self.tokens.last().map_or(1, |(line, _)| *line),
        }
    }

    fn unexpected(&self, expected: &'static str) -> SyntaxError {
        SyntaxError::Unexpected {
            line: self.line(),
            expected,
            found: describe(self.peek().map(|(_, t)| t)),
        }
    }

    // atoms: NAME (, NAME)* [,]
    fn atoms_desc(&mut self, line: usize) -> Result<ast::AtomsDesc, SyntaxError> {
        self.bump();
        if !self.eat(Token::Colon) {
            return Err(SyntaxError::MalformedAtoms {
                line,
                message: format!("expected `:' after `atoms', found {}", self.found()),
            });
        }

        let mut names = vec![];
        loop {
            match self.peek() {
                Some((_, Token::Ident(name))) => {
                    self.pos += 1;
                    names.push(name.to_owned());
                }
                _ => {
                    return Err(SyntaxError::MalformedAtoms {
                        line,
                        message: format!("expected an atom name, found {}", self.found()),
                    })
                }
            }
            if !self.eat(Token::Comma) {
                break;
            }
            // trailing comma
            if matches!(self.peek(), None | Some((_, Token::Semicolon))) {
                break;
            }
        }

        Ok(ast::AtomsDesc { names, line })
    }

    // NAME = ALT (| ALT)*
    fn rule_desc(&mut self, line: usize) -> Result<ast::RuleDesc, SyntaxError> {
        let name = match self.bump() {
            Some((_, Token::Ident(name))) => name.to_owned(),
            _ => return Err(self.unexpected("a rule name")),
        };
        if !self.eat(Token::Eq) {
            return Err(self.unexpected("`='"));
        }

        let mut alternatives = vec![self.alternative()?];
        while self.eat(Token::VertBar) {
            alternatives.push(self.alternative()?);
        }

        Ok(ast::RuleDesc {
            name,
            alternatives,
            line,
        })
    }

    // ELEM (+ ELEM)*
    fn alternative(&mut self) -> Result<ast::Alternative, SyntaxError> {
        let mut elems = vec![];
        loop {
            match self.peek() {
                Some((_, Token::Ident(name))) => elems.push(ast::Elem::Ident(name.to_owned())),
                // `''` stands for nothing.
                Some((_, Token::Literal(""))) => (),
                Some((_, Token::Literal(text))) => {
                    elems.push(ast::Elem::Literal(text.to_owned()))
                }
                _ => return Err(self.unexpected("a symbol name or a quoted literal")),
            }
            self.pos += 1;
            if !self.eat(Token::Plus) {
                break;
            }
        }
        Ok(ast::Alternative { elems })
    }

    fn found(&self) -> String {
        describe(self.peek().map(|(_, t)| t))
    }
}

fn describe(token: Option<Token<'_>>) -> String {
    match token {
        None => "end of input".into(),
        Some(Token::Eq) => "`='".into(),
        Some(Token::Colon) => "`:'".into(),
        Some(Token::Comma) => "`,'".into(),
        Some(Token::Semicolon) => "`;'".into(),
        Some(Token::VertBar) => "`|'".into(),
        Some(Token::Plus) => "`+'".into(),
        Some(Token::Kw(Keyword::Atoms)) => "keyword `atoms'".into(),
        Some(Token::Ident(name)) => format!("identifier `{}'", name),
        Some(Token::Literal(text)) => format!("literal '{}'", text),
    }
}
