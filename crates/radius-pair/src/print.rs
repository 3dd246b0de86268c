//! Human-readable rendering of pairs and lists

use crate::arena::{Arena, ListId, PairId};
use crate::dict::Attr;
use crate::error::PairResult;
use crate::pair::Payload;
use crate::token::Quote;
use crate::value::{Value, quote_str};
use tracing::debug;

/// Unquoted right operand of a pair and the quoting it prints with
pub(crate) struct Operand {
    pub(crate) text: String,
    pub(crate) quote: Quote,
}

impl Operand {
    fn render(&self) -> String {
        quote_str(&self.text, self.quote)
    }
}

impl Arena {
    /// Attribute name as written inside `context`'s braces, or the full
    /// dotted path at the top level
    pub(crate) fn pair_name(&self, da: &Attr, context: Option<&Attr>) -> String {
        match context {
            Some(ctx) if da.parent() == Some(ctx) => da.name().to_string(),
            _ => da.full_name().to_string(),
        }
    }

    /// Right operand of `pair`: expansion source, value, or braced children
    pub(crate) fn pair_operand(&self, pair: PairId) -> PairResult<Operand> {
        let p = self.pair(pair)?;
        if let Some(xlat) = p.xlat() {
            return Ok(Operand {
                text: xlat.to_string(),
                quote: Quote::Backtick,
            });
        }
        let operand = match p.payload() {
            Payload::Children(children) => Operand {
                text: self.braced(*children, p.da())?,
                quote: Quote::None,
            },
            Payload::Value(vb) => match (vb.enum_name(), vb.value()) {
                (Some(name), _) => Operand {
                    text: name.to_string(),
                    quote: Quote::None,
                },
                (None, Value::String(s)) => Operand {
                    text: s.to_string(),
                    quote: Quote::Double,
                },
                (None, other) => Operand {
                    text: other.to_string(),
                    quote: Quote::None,
                },
            },
        };
        Ok(operand)
    }

    fn braced(&self, children: ListId, parent: &Attr) -> PairResult<String> {
        let mut items = Vec::with_capacity(self.list_len(children));
        for child in self.iter(children) {
            items.push(self.print_in(child, Some(parent))?);
        }
        if items.is_empty() {
            return Ok("{ }".to_string());
        }
        Ok(format!("{{ {} }}", items.join(", ")))
    }

    fn print_in(&self, pair: PairId, context: Option<&Attr>) -> PairResult<String> {
        let p = self.pair(pair)?;
        let operand = self.pair_operand(pair)?;
        Ok(format!(
            "{} {} {}",
            self.pair_name(p.da(), context),
            p.op(),
            operand.render()
        ))
    }

    /// Render `pair` as `Name op value`, nesting children in braces
    pub fn pair_print(&self, pair: PairId) -> PairResult<String> {
        self.print_in(pair, None)
    }

    /// Render only the value of `pair`, quoting strings with `quote`
    pub fn print_value_quoted(&self, pair: PairId, quote: Quote) -> PairResult<String> {
        let p = self.pair(pair)?;
        match p.payload() {
            Payload::Children(children) => self.braced(*children, p.da()),
            Payload::Value(vb) => Ok(match vb.enum_name() {
                Some(name) => name.to_string(),
                None => vb.value().print_quoted(quote),
            }),
        }
    }

    /// Log every pair of `list` at debug level, one line each
    pub fn list_log(&self, list: ListId, prefix: &str) {
        for pair in self.iter(list) {
            match self.pair_print(pair) {
                Ok(line) => debug!("{}{}", prefix, line),
                Err(e) => debug!(error = %e, "{}<unprintable pair>", prefix),
            }
        }
    }
}
