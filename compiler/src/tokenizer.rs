use std::collections::VecDeque;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::ReflectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Ws,
    CppComment,
    DocComment,
    CComment,
    KwTypedef,
    KwStruct,
    KwNs,
    KwEnum,
    KwClass,
    KwBasetype,
    Id,
    Lt,
    Gt,
    Lbrace,
    Rbrace,
    Semi,
    Comma,
    Qual,
    Lparen,
    Rparen,
    Assign,
    Uint,
    Eof,
}

impl TokenKind {
    /// Tokens dropped by the filtering stage.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Ws | TokenKind::CppComment | TokenKind::CComment)
    }

    /// Tokens that receive the pending doc comment.
    pub fn is_documentable(self) -> bool {
        matches!(
            self,
            TokenKind::Semi
                | TokenKind::KwNs
                | TokenKind::KwStruct
                | TokenKind::KwTypedef
                | TokenKind::KwEnum
                | TokenKind::KwBasetype
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Ws         => "WS",
            TokenKind::CppComment => "CPP_COMMENT",
            TokenKind::DocComment => "DOC_COMMENT",
            TokenKind::CComment   => "C_COMMENT",
            TokenKind::KwTypedef  => "KW_TYPEDEF",
            TokenKind::KwStruct   => "KW_STRUCT",
            TokenKind::KwNs       => "KW_NS",
            TokenKind::KwEnum     => "KW_ENUM",
            TokenKind::KwClass    => "KW_CLASS",
            TokenKind::KwBasetype => "KW_BASETYPE",
            TokenKind::Id         => "ID",
            TokenKind::Lt         => "LT",
            TokenKind::Gt         => "GT",
            TokenKind::Lbrace     => "LBRACE",
            TokenKind::Rbrace     => "RBRACE",
            TokenKind::Semi       => "SEMI",
            TokenKind::Comma      => "COMMA",
            TokenKind::Qual       => "QUAL",
            TokenKind::Lparen     => "LPAREN",
            TokenKind::Rparen     => "RPAREN",
            TokenKind::Assign     => "ASSIGN",
            TokenKind::Uint       => "UINT",
            TokenKind::Eof        => "EOF",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword that introduces an opaque base type declaration.
pub const BASETYPE_KEYWORD: &str = "KOINOS_BASETYPE";

lazy_static! {
    /// Token patterns in priority order. The first pattern that matches at the
    /// current position wins; keywords must stay ahead of `Id`.
    static ref TOKEN_TABLE: Vec<(TokenKind, Regex)> = {
        let uint = concat!(
            r"(?:0[bB][01](?:'?[01])*",
            r"|0[xX][0-9a-fA-F](?:'?[0-9a-fA-F])*",
            r"|0(?:'?[0-7])*",
            r"|[1-9](?:'?[0-9])*)",
        );
        let basetype = format!(r"{}\b", BASETYPE_KEYWORD);

        [
            (TokenKind::Ws,         r"\s+"),
            (TokenKind::CppComment, r"//[^\n]*(?:\n|$)"),
            (TokenKind::DocComment, r"(?s)/\*\*.*?\*/"),
            (TokenKind::CComment,   r"(?s)/\*.*?\*/"),
            (TokenKind::KwTypedef,  r"typedef\b"),
            (TokenKind::KwStruct,   r"struct\b"),
            (TokenKind::KwNs,       r"namespace\b"),
            (TokenKind::KwEnum,     r"enum\b"),
            (TokenKind::KwClass,    r"class\b"),
            (TokenKind::KwBasetype, basetype.as_str()),
            (TokenKind::Id,         r"[_a-zA-Z][_a-zA-Z0-9]*"),
            (TokenKind::Lt,         r"<"),
            (TokenKind::Gt,         r">"),
            (TokenKind::Lbrace,     r"\{"),
            (TokenKind::Rbrace,     r"\}"),
            (TokenKind::Semi,       r";"),
            (TokenKind::Comma,      r","),
            (TokenKind::Qual,       r"::"),
            (TokenKind::Lparen,     r"\("),
            (TokenKind::Rparen,     r"\)"),
            (TokenKind::Assign,     r"="),
            (TokenKind::Uint,       uint),
        ]
        .into_iter()
        .map(|(kind, pattern)| {
            let anchored = format!("^(?:{})", pattern);
            (kind, Regex::new(&anchored).unwrap())
        })
        .collect()
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind:   TokenKind,
    pub text:   String,
    pub doc:    String,
    pub line:   usize,
    pub column: usize,
}

impl Token {
    fn eof(line: usize, column: usize) -> Self {
        Token {
            kind:   TokenKind::Eof,
            text:   String::new(),
            doc:    String::new(),
            line,
            column,
        }
    }
}

/// Lazy raw token stream. Yields every token, trivia included, then a single
/// EOF token, then stops. A position no pattern matches yields a `LexError`
/// and ends the stream.
pub struct Lexer<'a> {
    text:   &'a str,
    pos:    usize,
    line:   usize,
    column: usize,
    done:   bool,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Lexer { text, pos: 0, line: 1, column: 1, done: false }
    }

    fn advance(&mut self, part: &str) {
        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            self.line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                self.column = last_line_part.len() + 1;
            }
        } else {
            self.column += part.len();
        }
        self.pos += part.len();
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, ReflectError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let text = self.text;
        let rest = &text[self.pos..];
        if rest.is_empty() {
            self.done = true;
            return Some(Ok(Token::eof(self.line, self.column)));
        }

        for (kind, regex) in TOKEN_TABLE.iter() {
            if let Some(mat) = regex.find(rest) {
                if mat.end() == 0 {
                    continue;
                }
                let token = Token {
                    kind:   *kind,
                    text:   mat.as_str().to_string(),
                    doc:    String::new(),
                    line:   self.line,
                    column: self.column,
                };
                self.advance(mat.as_str());
                return Some(Ok(token));
            }
        }

        self.done = true;
        Some(Err(ReflectError::LexError {
            position: self.pos,
            line:     self.line,
            column:   self.column,
        }))
    }
}

/// Tokenizes the whole buffer, trivia included. Used by tooling that wants
/// the raw stream; the parser goes through [`TokenStream`].
pub fn tokenize(text: &str) -> Result<Vec<Token>, ReflectError> {
    let tokens: Vec<Token> = Lexer::new(text).collect::<Result<_, _>>()?;
    debug!(tokens = tokens.len(), "tokenized");
    Ok(tokens)
}

/// Drops whitespace and comments, and moves the most recent doc comment onto
/// the next documentable token.
pub struct DocFilter<I> {
    inner:   I,
    pending: String,
}

impl<I> DocFilter<I> {
    pub fn new(inner: I) -> Self {
        DocFilter { inner, pending: String::new() }
    }
}

impl<I> Iterator for DocFilter<I>
where
    I: Iterator<Item = Result<Token, ReflectError>>,
{
    type Item = Result<Token, ReflectError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut tok = match self.inner.next()? {
                Ok(tok) => tok,
                Err(e) => return Some(Err(e)),
            };
            if tok.kind == TokenKind::DocComment {
                self.pending = tok.text;
                continue;
            }
            if tok.kind.is_trivia() {
                continue;
            }
            if tok.kind.is_documentable() {
                tok.doc = std::mem::take(&mut self.pending);
            }
            return Some(Ok(tok));
        }
    }
}

/// Multi-lookahead cursor over the filtered token stream. Once the underlying
/// stream is exhausted it keeps producing EOF.
pub struct TokenStream<'a> {
    source:  DocFilter<Lexer<'a>>,
    peekbuf: VecDeque<Token>,
    last:    (usize, usize),
}

impl<'a> TokenStream<'a> {
    pub fn new(text: &'a str) -> Self {
        TokenStream {
            source:  DocFilter::new(Lexer::new(text)),
            peekbuf: VecDeque::new(),
            last:    (1, 1),
        }
    }

    fn fill(&mut self, n: usize) -> Result<(), ReflectError> {
        while self.peekbuf.len() < n {
            let tok = match self.source.next() {
                Some(tok) => tok?,
                None => Token::eof(self.last.0, self.last.1),
            };
            self.last = (tok.line, tok.column);
            trace!(kind = %tok.kind, text = %tok.text, "token");
            self.peekbuf.push_back(tok);
        }
        Ok(())
    }

    pub fn peek(&mut self, offset: usize) -> Result<&Token, ReflectError> {
        self.fill(offset + 1)?;
        Ok(&self.peekbuf[offset])
    }

    pub fn read(&mut self) -> Result<Token, ReflectError> {
        self.fill(1)?;
        match self.peekbuf.pop_front() {
            Some(tok) => Ok(tok),
            None => Ok(Token::eof(self.last.0, self.last.1)),
        }
    }
}
