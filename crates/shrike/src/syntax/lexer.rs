//! Lexer implementation.

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Token<'input> {
    Eq,
    Colon,
    Comma,
    Semicolon,
    VertBar,
    Plus,
    Kw(Keyword),
    Ident(&'input str),
    /// Quoted literal, without the surrounding quotes.
    Literal(&'input str),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Keyword {
    Atoms,
}

lexgen::lexer! {
    pub Lexer -> Token<'input>;

    let whitespace = [' ' '\t' '\n' '\r'];
    let ident = ($$XID_Start | '_') $$XID_Continue*;

    rule Init {
        $whitespace+,
        '\'' => |lexer| {
            lexer.switch(LexerRule::Literal)
        },
        "=" = Token::Eq,
        ":" = Token::Colon,
        "," = Token::Comma,
        ";" = Token::Semicolon,
        "|" = Token::VertBar,
        "+" = Token::Plus,
        "atoms" = Token::Kw(Keyword::Atoms),
        $ident => |lexer| {
            let token = Token::Ident(lexer.match_());
            lexer.return_(token)
        },
    }

    // `;`, `|` and `+` lose their meaning between quotes.
    rule Literal {
        '\'' => |lexer| {
            let quoted = lexer.match_();
            let token = Token::Literal(&quoted[1..quoted.len() - 1]);
            lexer.switch_and_return(LexerRule::Init, token)
        },
        _ => |lexer| lexer.continue_(),
    }
}
