//! Legacy flat-file pair records
//!
//! A record is `Name op value`, where the value is a bare word, a quoted
//! string (`"..."`, `'...'` or `` `...` ``) or, for structural
//! attributes, a braced child list such as `Group = { A = 1, B = "x" }`.
//! Records are separated by newlines or commas; `#` starts a comment.
//!
//! The fixed-size record fields limit the name to 255 bytes and the
//! value text to 1023 bytes.

use crate::arena::{Arena, ListId, PairId, ScopeId};
use crate::dict::{Attr, DictionaryService};
use crate::error::{PairError, PairResult};
use crate::token::{Operator, Quote};
use crate::value::quote_str;
use std::fmt;

/// Maximum size of the left operand in bytes
pub const MAX_LHS_LEN: usize = 255;

/// Maximum size of the right operand in bytes
pub const MAX_RHS_LEN: usize = 1023;

/// One legacy record with its operand text unescaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPair {
    lhs: String,
    op: Operator,
    rhs: String,
    quote: Quote,
}

impl RawPair {
    pub fn new(
        lhs: impl Into<String>,
        op: Operator,
        rhs: impl Into<String>,
        quote: Quote,
    ) -> PairResult<Self> {
        let (lhs, rhs) = (lhs.into(), rhs.into());
        check_len("lhs", &lhs, MAX_LHS_LEN)?;
        check_len("rhs", &rhs, MAX_RHS_LEN)?;
        Ok(RawPair { lhs, op, rhs, quote })
    }

    /// Parse exactly one record
    pub fn parse(text: &str) -> PairResult<Self> {
        let mut records = Lexer::new(text).records()?;
        match (records.pop(), records.is_empty()) {
            (Some(record), true) => Ok(record),
            (None, _) => Err(PairError::Syntax("empty record".to_string())),
            (Some(_), false) => Err(PairError::Syntax(format!(
                "expected one record, found {}",
                records.len() + 1
            ))),
        }
    }

    /// Parse every record in a multi-line or comma separated block
    pub fn parse_all(text: &str) -> PairResult<Vec<Self>> {
        Lexer::new(text).records()
    }

    pub fn lhs(&self) -> &str {
        &self.lhs
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn rhs(&self) -> &str {
        &self.rhs
    }

    pub fn quote(&self) -> Quote {
        self.quote
    }

    /// Whether the right operand is a braced child list
    pub fn is_nested(&self) -> bool {
        self.quote == Quote::None && self.rhs.starts_with('{')
    }
}

impl fmt::Display for RawPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.lhs,
            self.op,
            quote_str(&self.rhs, self.quote)
        )
    }
}

fn check_len(field: &'static str, text: &str, max: usize) -> PairResult<()> {
    if text.len() > max {
        return Err(PairError::FieldTooLong {
            field,
            len: text.len(),
            max,
        });
    }
    Ok(())
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_blanks(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '#' => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn skip_separators(&mut self) {
        loop {
            self.skip_blanks();
            match self.peek() {
                Some('\n') | Some(',') => {
                    self.bump();
                }
                _ => break,
            }
        }
    }

    fn error(&self, what: &str) -> PairError {
        let near: String = self.rest().chars().take(16).collect();
        PairError::Syntax(format!("{} at byte {} near {:?}", what, self.pos, near))
    }

    fn records(&mut self) -> PairResult<Vec<RawPair>> {
        let mut records = Vec::new();
        loop {
            self.skip_separators();
            if self.peek().is_none() {
                return Ok(records);
            }
            records.push(self.record()?);
            self.skip_blanks();
            match self.peek() {
                None | Some('\n') | Some(',') => {}
                Some(_) => return Err(self.error("expected end of record")),
            }
        }
    }

    fn record(&mut self) -> PairResult<RawPair> {
        let lhs = self.name()?;
        self.skip_blanks();
        let (op, len) = Operator::scan(self.rest())
            .ok_or_else(|| self.error("expected operator"))?;
        self.pos += len;
        self.skip_blanks();
        let (rhs, quote) = match self.peek() {
            Some('{') => (self.braced()?, Quote::None),
            Some(c) => match Quote::from_delimiter(c) {
                Some(quote) => (self.quoted(c)?, quote),
                None => (self.bare()?, Quote::None),
            },
            None => return Err(self.error("expected value")),
        };
        RawPair::new(lhs, op, rhs, quote)
    }

    fn name(&mut self) -> PairResult<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected attribute name"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn bare(&mut self) -> PairResult<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !matches!(c, ',' | '#' | '{' | '}'))
        {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected value"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn quoted(&mut self, delim: char) -> PairResult<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == delim => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some(c) if c == '\\' || c == delim => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    /// Braced text kept verbatim, braces included
    ///
    /// Quote characters open a string only at the start of an operand, so
    /// a bare word such as `O'Brien` passes through unchanged.
    fn braced(&mut self) -> PairResult<String> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut prev = ' ';
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unterminated braces"));
            };
            if Quote::from_delimiter(c).is_some() && opens_operand(prev) {
                self.quoted(c)?;
                prev = c;
                continue;
            }
            self.bump();
            prev = c;
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.input[start..self.pos].to_string());
                    }
                }
                _ => {}
            }
        }
    }
}

/// Whether a quote following `prev` starts a new operand rather than
/// continuing a bare word
fn opens_operand(prev: char) -> bool {
    prev.is_whitespace() || matches!(prev, '{' | ',' | '=' | '~' | '*' | '<' | '>')
}

impl Arena {
    /// Build an unlinked pair in `scope` from a legacy record
    ///
    /// Backtick operands are kept as expansion text and leave the value at
    /// its default. Existence operators (`=*`, `!*`) ignore the operand.
    pub fn pair_from_raw(
        &mut self,
        scope: ScopeId,
        dict: &dyn DictionaryService,
        raw: &RawPair,
    ) -> PairResult<PairId> {
        self.pair_from_raw_in(scope, dict, raw, None)
    }

    fn pair_from_raw_in(
        &mut self,
        scope: ScopeId,
        dict: &dyn DictionaryService,
        raw: &RawPair,
        context: Option<&Attr>,
    ) -> PairResult<PairId> {
        let da = resolve(dict, &raw.lhs, context)?;
        let pair = self.pair_alloc(scope, &da)?;
        if let Err(e) = self.fill_from_raw(scope, dict, raw, pair, &da) {
            self.release_pair(pair);
            return Err(e);
        }
        Ok(pair)
    }

    fn fill_from_raw(
        &mut self,
        scope: ScopeId,
        dict: &dyn DictionaryService,
        raw: &RawPair,
        pair: PairId,
        da: &Attr,
    ) -> PairResult<()> {
        self.pair_mut(pair)?.set_op(raw.op);
        if raw.quote == Quote::Backtick {
            self.pair_mut(pair)?.set_xlat(Some(raw.rhs.clone()));
            return Ok(());
        }
        if da.is_structural() {
            let inner = raw
                .rhs
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .filter(|_| raw.quote == Quote::None)
                .ok_or_else(|| PairError::Syntax(format!("{} requires a braced value", da)))?;
            let children = self.children(pair)?;
            for record in Lexer::new(inner).records()? {
                let child = self.pair_from_raw_in(scope, dict, &record, Some(da))?;
                self.append(children, child)?;
            }
            return Ok(());
        }
        if matches!(raw.op, Operator::CmpTrue | Operator::CmpFalse) {
            return Ok(());
        }
        self.value_mut(pair)?.set_from_str(&raw.rhs, false)
    }

    /// Convert a pair to a legacy record
    ///
    /// Fails with `FieldTooLong` when the name or the printed value does
    /// not fit the record.
    pub fn pair_to_raw(&self, pair: PairId) -> PairResult<RawPair> {
        let p = self.pair(pair)?;
        let operand = self.pair_operand(pair)?;
        RawPair::new(
            self.pair_name(p.da(), None),
            p.op(),
            operand.text,
            operand.quote,
        )
    }

    /// Parse a block of records and append the pairs to `list`
    ///
    /// Either every record is appended or, on failure, none are.
    pub fn list_from_str(
        &mut self,
        scope: ScopeId,
        dict: &dyn DictionaryService,
        list: ListId,
        text: &str,
    ) -> PairResult<usize> {
        self.list_head_ref(list)?;
        let records = RawPair::parse_all(text)?;
        let mut pairs = Vec::with_capacity(records.len());
        for record in &records {
            match self.pair_from_raw(scope, dict, record) {
                Ok(pair) => pairs.push(pair),
                Err(e) => {
                    for pair in pairs {
                        self.release_pair(pair);
                    }
                    return Err(e);
                }
            }
        }
        for &pair in &pairs {
            self.append(list, pair)?;
        }
        Ok(pairs.len())
    }
}

/// Names inside braces are relative to the enclosing attribute; dotted
/// absolute names are accepted everywhere
fn resolve(dict: &dyn DictionaryService, name: &str, context: Option<&Attr>) -> PairResult<Attr> {
    context
        .and_then(|ctx| dict.attr_by_name(&format!("{}.{}", ctx.full_name(), name)))
        .or_else(|| dict.attr_by_name(name))
        .ok_or_else(|| PairError::UnknownAttribute(name.to_string()))
}
