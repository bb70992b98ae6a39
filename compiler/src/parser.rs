use koinos_reflect_schema::{
    BaseType, Decl, EnumClass, EnumEntry, Field, Fqn, IntLiteral, Namespace, Struct, Targ,
    Toplevel, Typedef, Typeref,
};
use tracing::debug;

use crate::{
    error::ReflectError,
    tokenizer::{Token, TokenKind, TokenStream},
};

/// Deepest `<...>` nesting accepted in a type reference. Every level adds two
/// levels of JSON nesting, and the schema must stay well inside serde_json's
/// default recursion limit to decode again.
pub const MAX_TARG_DEPTH: usize = 32;

/// Recursive-descent parser over the filtered token stream. There is no error
/// recovery: the first unexpected token aborts the parse.
pub struct Parser<'a> {
    tokens:     TokenStream<'a>,
    targ_depth: usize,
}

fn error_at(tok: &Token, msg: String) -> ReflectError {
    ReflectError::ParseError {
        msg,
        line:   tok.line,
        column: tok.column,
    }
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str) -> Self {
        Parser { tokens: TokenStream::new(text), targ_depth: 0 }
    }

    pub fn parse(mut self) -> Result<Toplevel, ReflectError> {
        let decls = self.parse_decls()?;
        self.expect(TokenKind::Eof)?;
        debug!(decls = decls.len(), "parsed top level");
        Ok(Toplevel { decls })
    }

    fn peek_kind(&mut self, offset: usize) -> Result<TokenKind, ReflectError> {
        Ok(self.tokens.peek(offset)?.kind)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ReflectError> {
        let tok = self.tokens.read()?;
        if tok.kind != expected {
            let msg = format!("expected {}, found {}", expected, tok.kind);
            return Err(error_at(&tok, msg));
        }
        Ok(tok)
    }

    fn parse_decls(&mut self) -> Result<Vec<Decl>, ReflectError> {
        let mut decls = Vec::new();
        loop {
            match self.peek_kind(0)? {
                TokenKind::Rbrace | TokenKind::Eof => break,
                TokenKind::Semi => {
                    self.expect(TokenKind::Semi)?;
                }
                _ => decls.push(self.parse_decl()?),
            }
        }
        Ok(decls)
    }

    fn parse_decl(&mut self) -> Result<Decl, ReflectError> {
        match self.peek_kind(0)? {
            TokenKind::KwTypedef  => Ok(Decl::Typedef(self.parse_typedef()?)),
            TokenKind::KwStruct   => Ok(Decl::Struct(self.parse_struct()?)),
            TokenKind::KwNs       => Ok(Decl::Namespace(self.parse_namespace()?)),
            TokenKind::KwEnum     => Ok(Decl::EnumClass(self.parse_enum_class()?)),
            TokenKind::KwBasetype => Ok(Decl::BaseType(self.parse_basetype()?)),
            other => {
                let tok = self.tokens.peek(0)?;
                Err(error_at(tok, format!("cannot parse declaration starting with {}", other)))
            }
        }
    }

    fn parse_namespace(&mut self) -> Result<Namespace, ReflectError> {
        let kw = self.expect(TokenKind::KwNs)?;
        let name = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::Lbrace)?;
        let decls = self.parse_decls()?;
        self.expect(TokenKind::Rbrace)?;
        Ok(Namespace { name: name.text, decls, doc: kw.doc })
    }

    fn parse_typedef(&mut self) -> Result<Typedef, ReflectError> {
        let kw = self.expect(TokenKind::KwTypedef)?;
        let tref = self.parse_typeref()?;
        let name = self.expect(TokenKind::Id)?;
        let semi = self.expect(TokenKind::Semi)?;
        Ok(Typedef { name: name.text, tref, doc: pick_doc(kw.doc, semi.doc) })
    }

    fn parse_struct(&mut self) -> Result<Struct, ReflectError> {
        let kw = self.expect(TokenKind::KwStruct)?;
        let name = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::Lbrace)?;

        let mut fields = Vec::new();
        loop {
            match self.peek_kind(0)? {
                TokenKind::Rbrace => break,
                TokenKind::Semi => {
                    self.expect(TokenKind::Semi)?;
                }
                _ => {
                    let tref = self.parse_typeref()?;
                    let fname = self.expect(TokenKind::Id)?;
                    let fsemi = self.expect(TokenKind::Semi)?;
                    fields.push(Field { name: fname.text, tref, doc: fsemi.doc });
                }
            }
        }

        self.expect(TokenKind::Rbrace)?;
        let semi = self.expect(TokenKind::Semi)?;
        Ok(Struct { name: name.text, fields, doc: pick_doc(kw.doc, semi.doc) })
    }

    fn parse_enum_class(&mut self) -> Result<EnumClass, ReflectError> {
        let kw = self.expect(TokenKind::KwEnum)?;
        self.expect(TokenKind::KwClass)?;
        let name = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::Lbrace)?;

        let mut entries: Vec<EnumEntry> = Vec::new();
        let mut next_value: Option<u64> = Some(0);
        while self.peek_kind(0)? != TokenKind::Rbrace {
            if !entries.is_empty() {
                self.expect(TokenKind::Comma)?;
            }
            let ename = self.expect(TokenKind::Id)?;
            let value = if self.peek_kind(0)? == TokenKind::Assign {
                self.expect(TokenKind::Assign)?;
                self.parse_int_literal()?.value
            } else {
                match next_value {
                    Some(value) => value,
                    None => {
                        let msg = format!("implicit value of enum entry {} overflows", ename.text);
                        return Err(error_at(&ename, msg));
                    }
                }
            };
            next_value = value.checked_add(1);
            entries.push(EnumEntry { name: ename.text, value, doc: String::new() });
        }

        self.expect(TokenKind::Rbrace)?;
        let semi = self.expect(TokenKind::Semi)?;
        Ok(EnumClass { name: name.text, entries, doc: pick_doc(kw.doc, semi.doc) })
    }

    fn parse_basetype(&mut self) -> Result<BaseType, ReflectError> {
        let kw = self.expect(TokenKind::KwBasetype)?;
        self.expect(TokenKind::Lparen)?;
        let name = self.parse_qualname()?;
        self.expect(TokenKind::Rparen)?;
        Ok(BaseType { name, doc: kw.doc })
    }

    fn parse_qualname(&mut self) -> Result<Fqn, ReflectError> {
        let mut result = vec![self.expect(TokenKind::Id)?.text];
        while self.peek_kind(0)? == TokenKind::Qual {
            self.expect(TokenKind::Qual)?;
            result.push(self.expect(TokenKind::Id)?.text);
        }
        Ok(result)
    }

    fn parse_maybe_targs(&mut self) -> Result<Option<Vec<Targ>>, ReflectError> {
        if self.peek_kind(0)? != TokenKind::Lt {
            return Ok(None);
        }
        let lt = self.expect(TokenKind::Lt)?;
        if self.targ_depth == MAX_TARG_DEPTH {
            let msg = format!("template arguments nested deeper than {}", MAX_TARG_DEPTH);
            return Err(error_at(&lt, msg));
        }

        self.targ_depth += 1;
        let targs = self.parse_targ_list();
        self.targ_depth -= 1;
        targs.map(Some)
    }

    fn parse_targ_list(&mut self) -> Result<Vec<Targ>, ReflectError> {
        let mut result = Vec::new();
        if self.peek_kind(0)? == TokenKind::Gt {
            self.expect(TokenKind::Gt)?;
            return Ok(result);
        }

        result.push(self.parse_targ()?);
        while self.peek_kind(0)? != TokenKind::Gt {
            self.expect(TokenKind::Comma)?;
            result.push(self.parse_targ()?);
        }
        self.expect(TokenKind::Gt)?;
        Ok(result)
    }

    fn parse_targ(&mut self) -> Result<Targ, ReflectError> {
        if self.peek_kind(0)? == TokenKind::Uint {
            return Ok(Targ::IntLiteral(self.parse_int_literal()?));
        }
        Ok(Targ::Typeref(self.parse_typeref()?))
    }

    fn parse_typeref(&mut self) -> Result<Typeref, ReflectError> {
        let name = self.parse_qualname()?;
        let targs = self.parse_maybe_targs()?;
        Ok(Typeref { name, targs })
    }

    fn parse_int_literal(&mut self) -> Result<IntLiteral, ReflectError> {
        let tok = self.expect(TokenKind::Uint)?;
        match parse_uint(&tok.text) {
            Some(value) => Ok(IntLiteral { value }),
            None => Err(error_at(&tok, format!("integer literal {} out of range", tok.text))),
        }
    }
}

/// The keyword carries the doc comment written before the declaration; the
/// closing `;` only has one when the comment sits inside the body.
fn pick_doc(keyword_doc: String, semi_doc: String) -> String {
    if keyword_doc.is_empty() {
        semi_doc
    } else {
        keyword_doc
    }
}

/// Parses an unsigned literal: `0b` binary, `0x` hex, leading-zero octal,
/// otherwise decimal. Digit separators (`'`) are ignored. Returns `None` on
/// overflow or malformed digits.
pub fn parse_uint(text: &str) -> Option<u64> {
    let digits = text.replace('\'', "").to_ascii_lowercase();
    if digits == "0" {
        Some(0)
    } else if let Some(bin) = digits.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else if let Some(hex) = digits.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = digits.strip_prefix('0') {
        u64::from_str_radix(oct, 8).ok()
    } else {
        digits.parse::<u64>().ok()
    }
}

pub fn parse(text: &str) -> Result<Toplevel, ReflectError> {
    Parser::new(text).parse()
}
