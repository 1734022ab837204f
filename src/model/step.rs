//! ISO 10303-21 ("STEP physical file") reader for `.ifc` models.
//!
//! `ifc_lite_core::EntityScanner` walks the DATA section and yields each
//! instance's id, type and byte range. The attribute list of every scanned
//! instance is decoded here into [`Attr`] values, which keep typed
//! parameters and the INTEGER/REAL distinction that table cells render.
//! Entities are kept in id order, and an inverse index from element id to
//! the relations that define it is built once.

use super::schema::{self, SchemaFamily};
use super::step_element::StepElement;
use crate::error::{FieldError, ModelError};
use ifc_lite_core::EntityScanner;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// One attribute value of a STEP entity instance
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    /// `$`
    Null,
    /// `*`
    Derived,
    Integer(i64),
    Real(f64),
    String(String),
    /// `.NAME.` without the dots
    Enum(String),
    /// `#id`
    Ref(u64),
    List(Vec<Attr>),
    /// Typed parameter such as `IFCLABEL('x')`
    Typed(String, Box<Attr>),
    /// `"0FF"` binary literal, kept verbatim
    Binary(String),
}

impl Attr {
    pub fn is_null(&self) -> bool {
        matches!(self, Attr::Null | Attr::Derived)
    }

    /// Strip any typed-parameter wrappers
    pub fn untyped(&self) -> &Attr {
        match self {
            Attr::Typed(_, inner) => inner.untyped(),
            other => other,
        }
    }

    pub fn as_ref_id(&self) -> Option<u64> {
        match self.untyped() {
            Attr::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.untyped() {
            Attr::String(s) | Attr::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.untyped() {
            Attr::Real(v) => Some(*v),
            Attr::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Attr]> {
        match self.untyped() {
            Attr::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A decoded `#id = TYPE(...)` instance
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: u64,
    /// Type keyword as written in the file (upper case)
    pub type_name: String,
    pub attrs: Vec<Attr>,
}

impl Entity {
    /// Attribute at `index`, `None` when out of range or unset
    pub fn attr(&self, index: usize) -> Option<&Attr> {
        self.attrs.get(index).filter(|a| !a.is_null())
    }

    pub fn is_a(&self, type_name: &str) -> bool {
        self.type_name.eq_ignore_ascii_case(type_name)
    }

    /// Text of a string/enum attribute
    pub fn text(&self, index: usize) -> Option<String> {
        self.attr(index).and_then(Attr::as_str).map(str::to_string)
    }
}

/// A fully parsed STEP model held in memory
#[derive(Debug, Clone)]
pub struct StepModel {
    schema: String,
    entities: BTreeMap<u64, Entity>,
    defined_by: HashMap<u64, Vec<u64>>,
    content_digest: String,
}

impl StepModel {
    /// Read and parse a model file.
    ///
    /// Any failure here is fatal for the caller: no partial model is returned.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path).map_err(|e| ModelError::ReadFailed {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let content = String::from_utf8_lossy(&bytes);

        let model = Self::parse(&content)?;
        tracing::info!(
            "Parsed {} ({} entities, schema {})",
            path.display(),
            model.len(),
            model.schema()
        );
        Ok(model)
    }

    /// Parse model text
    pub fn parse(content: &str) -> Result<Self, ModelError> {
        let data_start = data_section_start(content).ok_or(ModelError::MissingSection("DATA"))?;
        let schema = header_schema(&content[..data_start])?;

        let mut entities = BTreeMap::new();
        let mut scanner = EntityScanner::new(content);
        while let Some((id, type_name, start, end)) = scanner.next_entity() {
            let id = id as u64;
            let Some(attrs) = decode_record(content, start, end)? else {
                tracing::debug!("Skipping complex entity instance #{}", id);
                continue;
            };
            let entity = Entity {
                id,
                type_name: type_name.trim().to_ascii_uppercase(),
                attrs,
            };
            if entities.insert(id, entity).is_some() {
                return Err(ModelError::DuplicateEntity(id));
            }
        }

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let content_digest = format!("{:x}", hasher.finalize());

        let mut model = Self {
            schema: schema.unwrap_or_default(),
            entities,
            defined_by: HashMap::new(),
            content_digest,
        };
        model.index_relations();
        Ok(model)
    }

    fn index_relations(&mut self) {
        for entity in self.entities.values() {
            if !(entity.is_a("IFCRELDEFINESBYPROPERTIES") || entity.is_a("IFCRELDEFINESBYTYPE")) {
                continue;
            }
            let Some(related) = entity.attr(4).and_then(Attr::as_list) else {
                continue;
            };
            for object in related.iter().filter_map(Attr::as_ref_id) {
                self.defined_by.entry(object).or_default().push(entity.id);
            }
        }
    }

    /// Schema identifier from `FILE_SCHEMA`, e.g. `IFC4`
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn schema_family(&self) -> SchemaFamily {
        SchemaFamily::from_identifier(&self.schema)
    }

    /// Sha256 hex digest of the parsed text
    pub fn content_digest(&self) -> &str {
        &self.content_digest
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, id: u64) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Follow a reference attribute to its entity
    pub fn resolve(
        &self,
        attr: Option<&Attr>,
        what: &'static str,
    ) -> Result<&Entity, FieldError> {
        let attr = attr.ok_or(FieldError::Absent(what))?;
        let id = attr
            .as_ref_id()
            .ok_or_else(|| FieldError::Malformed(format!("{} is not a reference", what)))?;
        self.entity(id).ok_or(FieldError::Dangling(id))
    }

    /// Entities of exactly this type, in id order
    pub fn by_type(&self, type_name: &str) -> impl Iterator<Item = &Entity> {
        let type_name = type_name.to_string();
        self.entities.values().filter(move |e| e.is_a(&type_name))
    }

    /// All product-kind entities in id order
    pub fn products(&self) -> impl Iterator<Item = StepElement<'_>> {
        let types = schema::hierarchy(self.schema_family());
        self.entities
            .values()
            .filter(move |e| types.is_product(&e.type_name))
            .map(move |e| StepElement::new(self, e))
    }

    /// Elements of a category and all of its subtypes, in id order.
    /// `IfcWall` also selects `IfcWallStandardCase`, `IfcElement` every
    /// physical element.
    pub fn elements_of(&self, category: &str) -> Vec<StepElement<'_>> {
        let types = schema::hierarchy(self.schema_family());
        self.entities
            .values()
            .filter(|e| types.is_subtype_of(&e.type_name, category))
            .map(|e| StepElement::new(self, e))
            .collect()
    }

    /// Ids of the relations defining `id`, ascending
    pub(crate) fn relations_of(&self, id: u64) -> &[u64] {
        self.defined_by.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Keyword(String),
    Hash(u64),
    Str(String),
    Enum(String),
    Integer(i64),
    Real(f64),
    Binary(String),
    Dollar,
    Star,
    LParen,
    RParen,
    Comma,
    Eq,
    Semi,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            src: content.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> ModelError {
        ModelError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn tokenize(mut self) -> Result<Vec<Spanned>, ModelError> {
        let mut tokens = Vec::new();
        while let Some(b) = self.peek_at(0) {
            let line = self.line;
            let token = match b {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                    continue;
                }
                b' ' | b'\t' | b'\r' => {
                    self.pos += 1;
                    continue;
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    self.skip_comment()?;
                    continue;
                }
                b'(' => self.single(Token::LParen),
                b')' => self.single(Token::RParen),
                b',' => self.single(Token::Comma),
                b'=' => self.single(Token::Eq),
                b';' => self.single(Token::Semi),
                b'$' => self.single(Token::Dollar),
                b'*' => self.single(Token::Star),
                b'#' => self.hash()?,
                b'\'' => self.string()?,
                b'"' => self.binary()?,
                b'.' => self.enumeration()?,
                b'0'..=b'9' | b'-' | b'+' => self.number()?,
                b if b.is_ascii_alphabetic() || b == b'_' || b == b'!' => self.keyword(),
                other => return Err(self.error(format!("unexpected character '{}'", other as char))),
            };
            tokens.push(Spanned { token, line });
        }
        Ok(tokens)
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn skip_comment(&mut self) -> Result<(), ModelError> {
        self.pos += 2;
        loop {
            match self.peek_at(0) {
                None => return Err(self.error("unterminated comment")),
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.pos += 2;
                    return Ok(());
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while self.peek_at(0).is_some_and(&pred) {
            self.pos += 1;
        }
        // Only ASCII bytes satisfy the predicates used here
        std::str::from_utf8(&src[start..self.pos]).unwrap_or_default()
    }

    fn hash(&mut self) -> Result<Token, ModelError> {
        self.pos += 1;
        let digits = self.take_while(|b| b.is_ascii_digit());
        digits
            .parse()
            .map(Token::Hash)
            .map_err(|_| self.error("expected entity id after '#'"))
    }

    fn keyword(&mut self) -> Token {
        let word = self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'!');
        Token::Keyword(word.to_ascii_uppercase())
    }

    fn enumeration(&mut self) -> Result<Token, ModelError> {
        self.pos += 1;
        let name = self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        if self.peek_at(0) != Some(b'.') {
            return Err(self.error("unterminated enumeration"));
        }
        self.pos += 1;
        Ok(Token::Enum(name.to_string()))
    }

    fn binary(&mut self) -> Result<Token, ModelError> {
        self.pos += 1;
        let hex = self.take_while(|b| b.is_ascii_hexdigit());
        if self.peek_at(0) != Some(b'"') {
            return Err(self.error("unterminated binary literal"));
        }
        self.pos += 1;
        Ok(Token::Binary(hex.to_string()))
    }

    fn number(&mut self) -> Result<Token, ModelError> {
        let start = self.pos;
        if matches!(self.peek_at(0), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        self.take_while(|b| b.is_ascii_digit());
        let mut real = false;
        if self.peek_at(0) == Some(b'.') {
            real = true;
            self.pos += 1;
            self.take_while(|b| b.is_ascii_digit());
        }
        if matches!(self.peek_at(0), Some(b'E' | b'e')) {
            real = true;
            self.pos += 1;
            if matches!(self.peek_at(0), Some(b'-' | b'+')) {
                self.pos += 1;
            }
            self.take_while(|b| b.is_ascii_digit());
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or_default();

        if !real && let Ok(value) = text.parse::<i64>() {
            return Ok(Token::Integer(value));
        }
        // `1.` and `1.E3` are valid STEP reals
        let normalized = text.replacen(".E", ".0E", 1).replacen(".e", ".0e", 1);
        normalized
            .trim_end_matches('.')
            .parse::<f64>()
            .map(Token::Real)
            .map_err(|_| self.error(format!("invalid number '{}'", text)))
    }

    fn string(&mut self) -> Result<Token, ModelError> {
        self.pos += 1;
        let mut raw = Vec::new();
        loop {
            match self.peek_at(0) {
                None => return Err(self.error("unterminated string")),
                Some(b'\'') if self.peek_at(1) == Some(b'\'') => {
                    raw.push(b'\'');
                    self.pos += 2;
                }
                Some(b'\'') => {
                    self.pos += 1;
                    break;
                }
                Some(b) => {
                    if b == b'\n' {
                        self.line += 1;
                    }
                    raw.push(b);
                    self.pos += 1;
                }
            }
        }
        let raw = String::from_utf8_lossy(&raw);
        Ok(Token::Str(decode_string(&raw)))
    }
}

/// Decode STEP string control directives (`\X2\`, `\X4\`, `\X\`, `\S\`, `\\`)
fn decode_string(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    let hex_at = |start: usize, len: usize| -> Option<u32> {
        let s: String = chars.get(start..start + len)?.iter().collect();
        u32::from_str_radix(&s, 16).ok()
    };

    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let rest: String = chars[i..chars.len().min(i + 4)].iter().collect();
        if rest.starts_with("\\\\") {
            out.push('\\');
            i += 2;
        } else if rest == "\\X2\\" || rest == "\\X4\\" {
            let width = if rest == "\\X2\\" { 4 } else { 8 };
            i += 4;
            let mut units = Vec::new();
            while i < chars.len() && chars[i] != '\\' {
                match hex_at(i, width) {
                    Some(unit) => units.push(unit),
                    None => break,
                }
                i += width;
            }
            if width == 4 {
                let utf16: Vec<u16> = units.iter().map(|u| *u as u16).collect();
                out.push_str(&String::from_utf16_lossy(&utf16));
            } else {
                out.extend(units.into_iter().filter_map(char::from_u32));
            }
            // closing \X0\
            if chars.get(i..i + 4).is_some_and(|c| c.iter().collect::<String>() == "\\X0\\") {
                i += 4;
            }
        } else if rest.starts_with("\\X\\") {
            match hex_at(i + 3, 2).and_then(char::from_u32) {
                Some(c) => {
                    out.push(c);
                    i += 5;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            }
        } else if rest.starts_with("\\S\\") && i + 3 < chars.len() {
            let base = chars[i + 3] as u32;
            out.push(char::from_u32(base + 128).unwrap_or(chars[i + 3]));
            i += 4;
        } else {
            out.push('\\');
            i += 1;
        }
    }
    out
}

// ============================================================================
// Decoding
// ============================================================================

/// Byte offset of the `DATA` section keyword, skipping strings and comments
fn data_section_start(content: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\'' {
                        if bytes.get(i + 1) == Some(&b'\'') {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let close = content.get(i + 2..)?.find("*/")?;
                i += close + 3;
            }
            b'D' | b'd' if is_data_keyword(bytes, i) => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn is_data_keyword(bytes: &[u8], at: usize) -> bool {
    let word = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'-';
    if !bytes.get(at..at + 4).is_some_and(|w| w.eq_ignore_ascii_case(b"DATA")) {
        return false;
    }
    if at > 0 && word(bytes[at - 1]) {
        return false;
    }
    bytes[at + 4..]
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| matches!(b, b';' | b'('))
}

/// `FILE_SCHEMA` identifier from the header text
fn header_schema(header: &str) -> Result<Option<String>, ModelError> {
    let tokens = Lexer::new(header).tokenize()?;
    let mut parser = Parser::new(&tokens);
    while let Some(token) = parser.next() {
        if let Token::Keyword(name) = token
            && parser.peek() == Some(&Token::LParen)
        {
            parser.pos += 1;
            let params = parser.list()?;
            if name == "FILE_SCHEMA" {
                return Ok(first_string(&params));
            }
        }
    }
    Ok(None)
}

/// Decode the attribute list of the instance scanned at `start..end`.
/// Complex instances (`#id = (A(...) B(...));`) yield `None`.
fn decode_record(content: &str, start: usize, end: usize) -> Result<Option<Vec<Attr>>, ModelError> {
    let record = content.get(start..end).ok_or_else(|| ModelError::Syntax {
        line: line_at(content, start),
        message: format!("instance range {}..{} is not valid text", start, end),
    })?;

    let body = match record.find('=') {
        Some(eq) if record[..eq].trim_start().starts_with('#') => record[eq + 1..].trim_start(),
        _ => record.trim_start(),
    };
    if body.starts_with('(') {
        return Ok(None);
    }
    let open = body.find('(').ok_or_else(|| ModelError::Syntax {
        line: line_at(content, start),
        message: "expected '(' after entity type".to_string(),
    })?;

    let args = &body[open + 1..];
    let args_start = start + record.len() - args.len();
    decode_args(args).map(Some).map_err(|e| match e {
        ModelError::Syntax { line, message } => ModelError::Syntax {
            line: line_at(content, args_start) + line - 1,
            message,
        },
        other => other,
    })
}

/// Parse `a, b, ...)` with an optional trailing `;`
fn decode_args(args: &str) -> Result<Vec<Attr>, ModelError> {
    let tokens = Lexer::new(args).tokenize()?;
    let mut parser = Parser::new(&tokens);
    let attrs = parser.list()?;
    if parser.peek() == Some(&Token::Semi) {
        parser.pos += 1;
    }
    if let Some(extra) = parser.peek() {
        return Err(parser.error(format!("unexpected token {:?} after attributes", extra)));
    }
    Ok(attrs)
}

fn line_at(content: &str, offset: usize) -> usize {
    let bytes = content.as_bytes();
    bytes[..offset.min(bytes.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Spanned]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn error(&self, message: impl Into<String>) -> ModelError {
        ModelError::Syntax {
            line: self.line(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos).map(|t| &t.token);
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ModelError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(self.error(format!("expected {:?}, found {:?}", expected, token))),
            None => Err(self.error(format!("expected {:?}, found end of input", expected))),
        }
    }

    /// Items up to and including the closing paren (opening paren consumed)
    fn list(&mut self) -> Result<Vec<Attr>, ModelError> {
        let mut items = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.value()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(items),
                Some(other) => {
                    return Err(self.error(format!("expected ',' or ')', found {:?}", other)));
                }
                None => return Err(self.error("unexpected end of input in list")),
            }
        }
    }

    fn value(&mut self) -> Result<Attr, ModelError> {
        let attr = match self.next() {
            Some(Token::Dollar) => Attr::Null,
            Some(Token::Star) => Attr::Derived,
            Some(Token::Integer(v)) => Attr::Integer(*v),
            Some(Token::Real(v)) => Attr::Real(*v),
            Some(Token::Str(s)) => Attr::String(s.clone()),
            Some(Token::Enum(e)) => Attr::Enum(e.clone()),
            Some(Token::Hash(id)) => Attr::Ref(*id),
            Some(Token::Binary(b)) => Attr::Binary(b.clone()),
            Some(Token::LParen) => Attr::List(self.list()?),
            Some(Token::Keyword(name)) => {
                self.expect(&Token::LParen)?;
                let inner = self.value()?;
                self.expect(&Token::RParen)?;
                Attr::Typed(name.clone(), Box::new(inner))
            }
            Some(other) => return Err(self.error(format!("unexpected token {:?}", other))),
            None => return Err(self.error("unexpected end of input")),
        };
        Ok(attr)
    }
}

fn first_string(params: &[Attr]) -> Option<String> {
    params.iter().find_map(|p| match p {
        Attr::String(s) => Some(s.clone()),
        Attr::List(items) => first_string(items),
        _ => None,
    })
}
