//! Textual type annotations and their translation into descriptors.
//!
//! This is the crate's translation boundary: external annotations arrive as
//! text and must become [`TypeDescriptor`] values before any check runs.
//! The grammar is deliberately small:
//!
//! ```text
//! annotation := atom ("|" atom)*
//! atom       := "any" | "none" | "bool" | "int" | "float" | "str" | "bytes"
//!             | "list" ["[" annotation "]"]
//!             | "set"  ["[" annotation "]"]
//!             | "map"  ["[" annotation "," annotation "]"]
//!             | "tuple" ["[" tuple-items "]"]
//!             | "type" "[" annotation "]"
//!             | "literal" "[" const ("," const)* "]"
//!             | "$" IDENT
//!             | [IDENT] "{" [field ("," field)* [","]] "}"
//!             | IDENT
//! field      := IDENT ["?"] ":" annotation
//! const      := STRING | INT | FLOAT | "true" | "false" | "null"
//! ```
//!
//! An identifier that is not a reserved type name parses as an
//! [`TypeDescriptor::Alias`] - a forward reference resolved at check time.
//! That is the textual route to recursive descriptors:
//! `int | list[Nested]` bound to the name `Nested` refers to itself.
//!
//! `TypeDescriptor`'s `Display` emits this grammar back, so descriptors
//! round-trip through text. Extensions and bound type variables are
//! API-only and have no parseable form.

use std::fmt;

use crate::descriptor::{LeafType, RecordType, TypeDescriptor};
use crate::value::Value;

/// Error from reading a textual annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    offset: usize,
    message: String,
}

impl ParseError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        ParseError {
            offset,
            message: message.into(),
        }
    }

    /// Byte offset into the source where the error was noticed.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Translate a textual annotation into a descriptor.
///
/// ```
/// use conform::{parse_annotation, LeafType, TypeDescriptor};
///
/// let t = parse_annotation("map[str, int | none]").unwrap();
/// assert_eq!(
///     t,
///     TypeDescriptor::map(
///         TypeDescriptor::Leaf(LeafType::Str),
///         TypeDescriptor::union([
///             TypeDescriptor::Leaf(LeafType::Int),
///             TypeDescriptor::None,
///         ]),
///     )
/// );
/// ```
pub fn parse_annotation(source: &str) -> Result<TypeDescriptor, ParseError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    let descriptor = parser.union_type()?;
    parser.expect_end()?;
    Ok(descriptor)
}

// ============================================================================
// LEXER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Dollar,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Question,
    Pipe,
    Ellipsis,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "'{name}'"),
            Token::Str(_) => f.write_str("string constant"),
            Token::Int(_) => f.write_str("integer constant"),
            Token::Float(_) => f.write_str("float constant"),
            Token::Dollar => f.write_str("'$'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::Comma => f.write_str("','"),
            Token::Colon => f.write_str("':'"),
            Token::Question => f.write_str("'?'"),
            Token::Pipe => f.write_str("'|'"),
            Token::Ellipsis => f.write_str("'...'"),
        }
    }
}

fn lex(source: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let start = pos;
        let byte = bytes[pos];
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            b'$' => {
                tokens.push((Token::Dollar, start));
                pos += 1;
            }
            b'[' => {
                tokens.push((Token::LBracket, start));
                pos += 1;
            }
            b']' => {
                tokens.push((Token::RBracket, start));
                pos += 1;
            }
            b'{' => {
                tokens.push((Token::LBrace, start));
                pos += 1;
            }
            b'}' => {
                tokens.push((Token::RBrace, start));
                pos += 1;
            }
            b',' => {
                tokens.push((Token::Comma, start));
                pos += 1;
            }
            b':' => {
                tokens.push((Token::Colon, start));
                pos += 1;
            }
            b'?' => {
                tokens.push((Token::Question, start));
                pos += 1;
            }
            b'|' => {
                tokens.push((Token::Pipe, start));
                pos += 1;
            }
            b'.' => {
                if bytes[pos..].starts_with(b"...") {
                    tokens.push((Token::Ellipsis, start));
                    pos += 3;
                } else {
                    return Err(ParseError::new(start, "stray '.' (expected '...')"));
                }
            }
            b'"' => {
                let (token, next) = lex_string(source, pos)?;
                tokens.push((token, start));
                pos = next;
            }
            b'-' | b'0'..=b'9' => {
                let (token, next) = lex_number(source, pos)?;
                tokens.push((token, start));
                pos = next;
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let mut end = pos + 1;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                tokens.push((Token::Ident(source[pos..end].to_string()), start));
                pos = end;
            }
            other => {
                return Err(ParseError::new(
                    start,
                    format!("unexpected character '{}'", other as char),
                ))
            }
        }
    }
    Ok(tokens)
}

fn lex_string(source: &str, open: usize) -> Result<(Token, usize), ParseError> {
    let bytes = source.as_bytes();
    let mut out = String::new();
    let mut pos = open + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => return Ok((Token::Str(out), pos + 1)),
            b'\\' => {
                let escape = bytes
                    .get(pos + 1)
                    .ok_or_else(|| ParseError::new(pos, "unterminated escape"))?;
                match escape {
                    b'"' => out.push('"'),
                    b'\\' => out.push('\\'),
                    b'n' => out.push('\n'),
                    b't' => out.push('\t'),
                    b'r' => out.push('\r'),
                    other => {
                        return Err(ParseError::new(
                            pos,
                            format!("unknown escape '\\{}'", *other as char),
                        ))
                    }
                }
                pos += 2;
            }
            _ => {
                // Step over one full UTF-8 scalar, not one byte. Escapes and
                // delimiters are ASCII, so `pos` is always on a boundary.
                match source[pos..].chars().next() {
                    Some(ch) => {
                        out.push(ch);
                        pos += ch.len_utf8();
                    }
                    Option::None => break,
                }
            }
        }
    }
    Err(ParseError::new(open, "unterminated string constant"))
}

fn lex_number(source: &str, start: usize) -> Result<(Token, usize), ParseError> {
    let bytes = source.as_bytes();
    let mut pos = start;
    if bytes[pos] == b'-' {
        pos += 1;
    }
    let digits_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == digits_start {
        return Err(ParseError::new(start, "expected digits after '-'"));
    }
    let mut is_float = false;
    if pos < bytes.len() && bytes[pos] == b'.' && !bytes[pos..].starts_with(b"...") {
        is_float = true;
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        is_float = true;
        pos += 1;
        if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
            pos += 1;
        }
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    let text = &source[start..pos];
    let token = if is_float {
        Token::Float(
            text.parse()
                .map_err(|_| ParseError::new(start, format!("bad float constant '{text}'")))?,
        )
    } else {
        Token::Int(
            text.parse()
                .map_err(|_| ParseError::new(start, format!("bad integer constant '{text}'")))?,
        )
    };
    Ok((token, pos))
}

// ============================================================================
// PARSER
// ============================================================================

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end, |(_, offset)| *offset)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {token}")))
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(self.unexpected("expected end of annotation"))
        }
    }

    fn unexpected(&self, wanted: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::new(self.offset(), format!("{wanted}, found {token}")),
            Option::None => ParseError::new(self.end, format!("{wanted}, found end of input")),
        }
    }

    fn union_type(&mut self) -> Result<TypeDescriptor, ParseError> {
        let first = self.atom()?;
        if self.peek() != Some(&Token::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(&Token::Pipe) {
            members.push(self.atom()?);
        }
        Ok(TypeDescriptor::Union(members))
    }

    fn atom(&mut self) -> Result<TypeDescriptor, ParseError> {
        match self.peek().cloned() {
            Some(Token::Dollar) => {
                self.pos += 1;
                match self.peek().cloned() {
                    Some(Token::Ident(name)) => {
                        self.pos += 1;
                        Ok(TypeDescriptor::type_var(name))
                    }
                    _ => Err(self.unexpected("expected type variable name after '$'")),
                }
            }
            Some(Token::LBrace) => {
                self.pos += 1;
                self.record_fields(Option::None)
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                self.named_atom(name)
            }
            _ => Err(self.unexpected("expected a type")),
        }
    }

    fn named_atom(&mut self, name: String) -> Result<TypeDescriptor, ParseError> {
        match name.as_str() {
            "any" => Ok(TypeDescriptor::Any),
            "none" => Ok(TypeDescriptor::None),
            "bool" => Ok(TypeDescriptor::Leaf(LeafType::Bool)),
            "int" => Ok(TypeDescriptor::Leaf(LeafType::Int)),
            "float" => Ok(TypeDescriptor::Leaf(LeafType::Float)),
            "str" => Ok(TypeDescriptor::Leaf(LeafType::Str)),
            "bytes" => Ok(TypeDescriptor::Leaf(LeafType::Bytes)),
            "list" => self.collection(LeafType::List, true),
            "set" => self.collection(LeafType::Set, false),
            "map" => {
                if !self.eat(&Token::LBracket) {
                    return Ok(TypeDescriptor::Leaf(LeafType::Map));
                }
                let key = self.union_type()?;
                self.expect(&Token::Comma)?;
                let value = self.union_type()?;
                self.expect(&Token::RBracket)?;
                Ok(TypeDescriptor::map(key, value))
            }
            "tuple" => {
                if !self.eat(&Token::LBracket) {
                    return Ok(TypeDescriptor::Leaf(LeafType::Tuple));
                }
                self.tuple_items()
            }
            "type" => {
                self.expect(&Token::LBracket)?;
                let bound = self.union_type()?;
                self.expect(&Token::RBracket)?;
                Ok(TypeDescriptor::subtype_of(bound))
            }
            "literal" => {
                self.expect(&Token::LBracket)?;
                let mut values = vec![self.constant()?];
                while self.eat(&Token::Comma) {
                    values.push(self.constant()?);
                }
                self.expect(&Token::RBracket)?;
                Ok(TypeDescriptor::Literal(values))
            }
            _ => {
                if self.eat(&Token::LBrace) {
                    self.record_fields(Some(name))
                } else {
                    // Unknown identifier: a forward reference, resolved
                    // through the alias context at check time.
                    Ok(TypeDescriptor::Alias(name))
                }
            }
        }
    }

    fn collection(&mut self, bare: LeafType, ordered: bool) -> Result<TypeDescriptor, ParseError> {
        if !self.eat(&Token::LBracket) {
            return Ok(TypeDescriptor::Leaf(bare));
        }
        let item = self.union_type()?;
        self.expect(&Token::RBracket)?;
        Ok(TypeDescriptor::Collection {
            item: Box::new(item),
            ordered,
        })
    }

    fn tuple_items(&mut self) -> Result<TypeDescriptor, ParseError> {
        if self.eat(&Token::RBracket) {
            return Ok(TypeDescriptor::FixedTuple(Vec::new()));
        }
        let mut items = vec![self.union_type()?];
        while self.eat(&Token::Comma) {
            if self.eat(&Token::Ellipsis) {
                self.expect(&Token::RBracket)?;
                return match (items.pop(), items.is_empty()) {
                    (Some(item), true) => Ok(TypeDescriptor::variadic_tuple(item)),
                    _ => Err(ParseError::new(
                        self.offset(),
                        "variadic tuples take exactly one item type before '...'",
                    )),
                };
            }
            items.push(self.union_type()?);
        }
        self.expect(&Token::RBracket)?;
        Ok(TypeDescriptor::FixedTuple(items))
    }

    fn record_fields(&mut self, name: Option<String>) -> Result<TypeDescriptor, ParseError> {
        let mut record = match name {
            Some(name) => RecordType::named(name),
            Option::None => RecordType::new(),
        };
        loop {
            if self.eat(&Token::RBrace) {
                return Ok(TypeDescriptor::Record(record));
            }
            let field_name = match self.peek().cloned() {
                Some(Token::Ident(field_name)) => {
                    self.pos += 1;
                    field_name
                }
                _ => return Err(self.unexpected("expected field name")),
            };
            let required = !self.eat(&Token::Question);
            self.expect(&Token::Colon)?;
            let field_t = self.union_type()?;
            record = if required {
                record.field(field_name, field_t)
            } else {
                record.optional(field_name, field_t)
            };
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBrace)?;
                return Ok(TypeDescriptor::Record(record));
            }
        }
    }

    fn constant(&mut self) -> Result<Value, ParseError> {
        let value = match self.peek() {
            Some(Token::Str(s)) => Value::Str(s.clone()),
            Some(Token::Int(n)) => Value::Int(*n),
            Some(Token::Float(n)) => Value::Float(*n),
            Some(Token::Ident(word)) => match word.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                _ => return Err(self.unexpected("expected a constant")),
            },
            _ => return Err(self.unexpected("expected a constant")),
        };
        self.pos += 1;
        Ok(value)
    }
}
