use super::{Value, ValueBox};
use crate::token::Quote;
use chrono::{DateTime, SecondsFormat};
use std::fmt;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => f.write_str(if *b { "yes" } else { "no" }),
            Value::Uint8(v) => write!(f, "{}", v),
            Value::Uint16(v) => write!(f, "{}", v),
            Value::Uint32(v) => write!(f, "{}", v),
            Value::Uint64(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Ipv4Addr(v) => write!(f, "{}", v),
            Value::Ipv4Prefix(v) => write!(f, "{}/{}", v.network(), v.prefix()),
            Value::Ipv6Addr(v) => write!(f, "{}", v),
            Value::Ipv6Prefix(v) => write!(f, "{}/{}", v.network(), v.prefix()),
            Value::Ifid(v) => {
                for (i, word) in v.chunks(2).enumerate() {
                    if i > 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{:02x}{:02x}", word[0], word[1])?;
                }
                Ok(())
            }
            Value::Ether(v) => {
                for (i, octet) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{:02x}", octet)?;
                }
                Ok(())
            }
            Value::Date(t) => {
                let secs = t.0.div_euclid(1_000_000_000);
                let nanos = t.0.rem_euclid(1_000_000_000) as u32;
                match DateTime::from_timestamp(secs, nanos) {
                    Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                    None => write!(f, "{}", secs),
                }
            }
            Value::TimeDelta(d) => {
                let sign = if d.0 < 0 { "-" } else { "" };
                let abs = d.0.unsigned_abs();
                let secs = abs / 1_000_000_000;
                let nanos = abs % 1_000_000_000;
                if nanos == 0 {
                    write!(f, "{}{}s", sign, secs)
                } else {
                    let frac = format!("{:09}", nanos);
                    write!(f, "{}{}.{}s", sign, secs, frac.trim_end_matches('0'))
                }
            }
            Value::Octets(b) => {
                f.write_str("0x")?;
                for byte in b.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::String(s) => f.write_str(s),
        }
    }
}

impl Value {
    /// Render the value for the legacy textual form
    ///
    /// Only string values are quoted; every other type prints bare
    /// regardless of `quote`.
    pub fn print_quoted(&self, quote: Quote) -> String {
        match self {
            Value::String(s) => quote_str(s, quote),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ValueBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.enum_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.value()),
        }
    }
}

/// Wrap `s` in `quote`, escaping the quote character, backslashes and
/// control characters
pub(crate) fn quote_str(s: &str, quote: Quote) -> String {
    let Some(delim) = quote.delimiter() else {
        return s.to_string();
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}
