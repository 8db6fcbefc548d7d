//! Tokenizer for the input programs checked against a compiled grammar.

use std::fmt;

/// Symbol name of the end of input.
pub const END_SYMBOL: &str = "$";
/// Symbol name of a brace-delimited statement block.
pub const STATEMENTS_SYMBOL: &str = "statements";
/// Symbol name of an identifier.
pub const IDENTIFIER_SYMBOL: &str = "identifier";

const SPACES: &[u8] = b" \t\n\r\x0B";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    End,
    /// A balanced `{ ... }` region, scanned as one token.
    Statements,
    Identifier,
    /// Punctuation, `->` or the keyword `fn`.
    Literal,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Token<'input> {
    pub kind: TokenKind,
    pub text: &'input str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset just past the last character.
    pub end: usize,
}

impl<'input> Token<'input> {
    /// The grammar symbol name this token is matched against.
    pub fn symbol(&self) -> &'input str {
        match self.kind {
            TokenKind::End => END_SYMBOL,
            TokenKind::Statements => STATEMENTS_SYMBOL,
            TokenKind::Identifier => IDENTIFIER_SYMBOL,
            TokenKind::Literal => self.text,
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::End => f.write_str(END_SYMBOL),
            TokenKind::Literal => write!(f, "'{}'", self.text),
            _ => write!(f, "{} {:?}", self.symbol(), self.text),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScanError {
    #[error("unbalanced statement block starting at offset {offset}")]
    MalformedBlock { offset: usize },
}

/// A scanner with one token of lookahead.
///
/// The first token is scanned on construction; [`Scanner::peek`] returns it
/// and [`Scanner::advance`] moves on to the next one. Once the input is
/// exhausted, the scanner keeps returning the end token.
#[derive(Debug)]
pub struct Scanner<'input> {
    input: &'input str,
    pos: usize,
    current: Token<'input>,
}

impl<'input> Scanner<'input> {
    pub fn new(input: &'input str) -> Result<Self, ScanError> {
        let mut scanner = Self {
            input,
            pos: 0,
            current: Token {
                kind: TokenKind::End,
                text: "",
                start: 0,
                end: 0,
            },
        };
        scanner.current = scanner.scan()?;
        Ok(scanner)
    }

    pub fn peek(&self) -> Token<'input> {
        self.current
    }

    /// Commit the current token and scan the next one, which is returned.
    pub fn advance(&mut self) -> Result<Token<'input>, ScanError> {
        self.current = self.scan()?;
        Ok(self.current)
    }

    /// Scan the remaining input, up to and including the end token.
    pub fn tokenize(mut self) -> Result<Vec<Token<'input>>, ScanError> {
        let mut tokens = vec![self.current];
        while self.current.kind != TokenKind::End {
            tokens.push(self.advance()?);
        }
        Ok(tokens)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'input> {
        Token {
            kind,
            text: &self.input[start..self.pos],
            start,
            end: self.pos,
        }
    }

    fn scan(&mut self) -> Result<Token<'input>, ScanError> {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && SPACES.contains(&bytes[self.pos]) {
            self.pos += 1;
        }

        let start = self.pos;
        let Some(&c) = bytes.get(self.pos) else {
            return Ok(self.token(TokenKind::End, start));
        };

        match c {
            b'{' => {
                self.skip_block(start)?;
                Ok(self.token(TokenKind::Statements, start))
            }
            c if is_identifier_start(c) => {
                self.pos += 1;
                while self.pos < bytes.len() && is_identifier_char(bytes[self.pos]) {
                    self.pos += 1;
                }
                // `fn` is the only reserved word.
                let kind = match &self.input[start..self.pos] {
                    "fn" => TokenKind::Literal,
                    _ => TokenKind::Identifier,
                };
                Ok(self.token(kind, start))
            }
            b'-' => {
                self.pos += 1;
                if bytes.get(self.pos) == Some(&b'>') {
                    self.pos += 1;
                }
                Ok(self.token(TokenKind::Literal, start))
            }
            _ => {
                // a single character, which may span several bytes.
                let len = self.input[start..].chars().next().map_or(1, char::len_utf8);
                self.pos += len;
                Ok(self.token(TokenKind::Literal, start))
            }
        }
    }

    fn skip_block(&mut self, start: usize) -> Result<(), ScanError> {
        let bytes = self.input.as_bytes();
        self.pos += 1;
        let mut depth = 1usize;
        loop {
            let Some(&c) = bytes.get(self.pos) else {
                return Err(ScanError::MalformedBlock { offset: start });
            };
            self.pos += 1;
            match c {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'"' | b'\'' => self.skip_quoted(c),
                _ => (),
            }
        }
    }

    // An unterminated quote runs to the end of input, which then fails the
    // enclosing block.
    fn skip_quoted(&mut self, quote: u8) {
        let bytes = self.input.as_bytes();
        while let Some(&c) = bytes.get(self.pos) {
            self.pos += 1;
            if c == quote {
                return;
            }
            if c == b'\\' {
                self.pos += 1;
            }
        }
        self.pos = self.pos.min(bytes.len());
    }
}

fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_identifier_char(c: u8) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(input: &str) -> Vec<&str> {
        Scanner::new(input)
            .and_then(Scanner::tokenize)
            .unwrap()
            .iter()
            .map(|token| token.symbol())
            .collect()
    }

    #[test]
    fn smoketest() {
        assert_eq!(
            symbols("fn foo(a: int) -> int { return a; }"),
            [
                "fn",
                "identifier",
                "(",
                "identifier",
                ":",
                "identifier",
                ")",
                "->",
                "identifier",
                "statements",
                "$"
            ]
        );
    }

    #[test]
    fn block_is_a_single_token() {
        let input = r#"{ a "}" b }"#;
        let tokens = Scanner::new(input).and_then(Scanner::tokenize).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Statements);
        assert_eq!(tokens[0].text, input);
        assert_eq!((tokens[0].start, tokens[0].end), (0, input.len()));
        assert_eq!(tokens[1].kind, TokenKind::End);
    }

    #[test]
    fn nested_blocks_and_escapes() {
        let input = r#"{ if x { y('{', "\"}") } } z"#;
        let tokens = Scanner::new(input).and_then(Scanner::tokenize).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Statements);
        assert_eq!(tokens[0].text, &input[..input.len() - 2]);
        assert_eq!(tokens[1].text, "z");
    }

    #[test]
    fn unbalanced_block() {
        let mut scanner = Scanner::new("fn f { {").unwrap();
        assert_eq!(scanner.advance().unwrap().symbol(), "identifier");
        assert!(matches!(
            scanner.advance(),
            Err(ScanError::MalformedBlock { offset: 5 })
        ));

        assert!(matches!(
            Scanner::new(r#"{ "}"#),
            Err(ScanError::MalformedBlock { offset: 0 })
        ));
    }

    #[test]
    fn keywords_and_arrows() {
        assert_eq!(
            symbols("fn fnord - -> _x1\x0B"),
            ["fn", "identifier", "-", "->", "identifier", "$"]
        );
        assert_eq!(symbols("a-"), ["identifier", "-", "$"]);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut scanner = Scanner::new("  a b").unwrap();
        assert_eq!(scanner.peek().text, "a");
        assert_eq!(scanner.peek().text, "a");
        assert_eq!(scanner.advance().unwrap().text, "b");
        assert_eq!(scanner.advance().unwrap().kind, TokenKind::End);
        assert_eq!(scanner.advance().unwrap().kind, TokenKind::End);
        assert_eq!(symbols(""), ["$"]);
    }
}
