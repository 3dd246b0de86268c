//! Pair value storage
//!
//! A [`Value`] holds exactly one scalar or buffer variant, selected by the
//! owning attribute's [`ValueType`]. A [`ValueBox`] wraps it with the taint
//! flag and the optional enum descriptor used to render symbolic names.

mod buffer;
mod parse;
mod print;
mod setters;
mod types;

pub use buffer::Buffer;
pub use types::ValueType;

pub(crate) use print::quote_str;

use crate::dict::Attr;
use crate::error::{PairError, PairResult};
use crate::token::Operator;
use ipnetwork::{Ipv4Network, Ipv6Network};
use std::cmp::Ordering;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Absolute time, nanoseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UnixTime(pub i64);

impl UnixTime {
    pub fn from_secs(secs: i64) -> Self {
        UnixTime(secs.saturating_mul(1_000_000_000))
    }

    pub fn as_nanos(self) -> i64 {
        self.0
    }
}

/// Signed time interval in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeDelta(pub i64);

impl TimeDelta {
    pub fn from_secs(secs: i64) -> Self {
        TimeDelta(secs.saturating_mul(1_000_000_000))
    }

    pub fn from_millis(millis: i64) -> Self {
        TimeDelta(millis.saturating_mul(1_000_000))
    }

    pub fn as_nanos(self) -> i64 {
        self.0
    }
}

/// A single leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Ipv4Addr(Ipv4Addr),
    Ipv4Prefix(Ipv4Network),
    Ipv6Addr(Ipv6Addr),
    Ipv6Prefix(Ipv6Network),
    Ifid([u8; 8]),
    Ether([u8; 6]),
    Date(UnixTime),
    TimeDelta(TimeDelta),
    Octets(Buffer<[u8]>),
    String(Buffer<str>),
}

impl Value {
    /// Zero value for a leaf type, `None` for structural types
    pub fn default_for(ty: ValueType) -> Option<Value> {
        let value = match ty {
            ValueType::Bool => Value::Bool(false),
            ValueType::Uint8 => Value::Uint8(0),
            ValueType::Uint16 => Value::Uint16(0),
            ValueType::Uint32 => Value::Uint32(0),
            ValueType::Uint64 => Value::Uint64(0),
            ValueType::Int8 => Value::Int8(0),
            ValueType::Int16 => Value::Int16(0),
            ValueType::Int32 => Value::Int32(0),
            ValueType::Int64 => Value::Int64(0),
            ValueType::Float32 => Value::Float32(0.0),
            ValueType::Float64 => Value::Float64(0.0),
            ValueType::Ipv4Addr => Value::Ipv4Addr(Ipv4Addr::UNSPECIFIED),
            ValueType::Ipv4Prefix => {
                Value::Ipv4Prefix(Ipv4Network::new(Ipv4Addr::UNSPECIFIED, 0).ok()?)
            }
            ValueType::Ipv6Addr => Value::Ipv6Addr(Ipv6Addr::UNSPECIFIED),
            ValueType::Ipv6Prefix => {
                Value::Ipv6Prefix(Ipv6Network::new(Ipv6Addr::UNSPECIFIED, 0).ok()?)
            }
            ValueType::Ifid => Value::Ifid([0; 8]),
            ValueType::Ether => Value::Ether([0; 6]),
            ValueType::Date => Value::Date(UnixTime::default()),
            ValueType::TimeDelta => Value::TimeDelta(TimeDelta::default()),
            ValueType::Octets => Value::Octets(Buffer::Owned(Vec::new())),
            ValueType::String => Value::String(Buffer::Owned(String::new())),
            ValueType::Tlv
            | ValueType::Struct
            | ValueType::Vsa
            | ValueType::Vendor
            | ValueType::Group => return None,
        };
        Some(value)
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Uint8(_) => ValueType::Uint8,
            Value::Uint16(_) => ValueType::Uint16,
            Value::Uint32(_) => ValueType::Uint32,
            Value::Uint64(_) => ValueType::Uint64,
            Value::Int8(_) => ValueType::Int8,
            Value::Int16(_) => ValueType::Int16,
            Value::Int32(_) => ValueType::Int32,
            Value::Int64(_) => ValueType::Int64,
            Value::Float32(_) => ValueType::Float32,
            Value::Float64(_) => ValueType::Float64,
            Value::Ipv4Addr(_) => ValueType::Ipv4Addr,
            Value::Ipv4Prefix(_) => ValueType::Ipv4Prefix,
            Value::Ipv6Addr(_) => ValueType::Ipv6Addr,
            Value::Ipv6Prefix(_) => ValueType::Ipv6Prefix,
            Value::Ifid(_) => ValueType::Ifid,
            Value::Ether(_) => ValueType::Ether,
            Value::Date(_) => ValueType::Date,
            Value::TimeDelta(_) => ValueType::TimeDelta,
            Value::Octets(_) => ValueType::Octets,
            Value::String(_) => ValueType::String,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::String(Buffer::Owned(value.into()))
    }

    pub fn octets(value: impl Into<Vec<u8>>) -> Self {
        Value::Octets(Buffer::Owned(value.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Octets(b) => Some(b),
            Value::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// False only for variable-length values borrowing a shared source
    pub fn is_owned(&self) -> bool {
        match self {
            Value::Octets(b) => b.is_owned(),
            Value::String(s) => s.is_owned(),
            _ => true,
        }
    }

    /// Copy that never shares buffer storage with `self`
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Octets(b) => Value::Octets(b.deep_copy()),
            Value::String(s) => Value::String(s.deep_copy()),
            other => other.clone(),
        }
    }

    /// Compare two values of the same type
    pub fn cmp_checked(&self, other: &Value) -> PairResult<Ordering> {
        cmp_same(self, other).ok_or_else(|| {
            PairError::mismatch(self.value_type().name(), other.value_type().name())
        })
    }

    /// Total order across all values, ordering by type first
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match cmp_same(self, other) {
            Some(ordering) => ordering,
            None => self.value_type().cmp(&other.value_type()),
        }
    }

    /// Apply a comparison operator with `self` on the left
    ///
    /// Assignment operators compare as equality. Regex and existence
    /// operators are not value comparisons and fail with `TypeMismatch`.
    pub fn cmp_op(&self, op: Operator, other: &Value) -> PairResult<bool> {
        let ordering = self.cmp_checked(other)?;
        let result = match op {
            Operator::CmpEq | Operator::Eq | Operator::Set | Operator::Add | Operator::Sub => {
                ordering == Ordering::Equal
            }
            Operator::Ne => ordering != Ordering::Equal,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Ge => ordering != Ordering::Less,
            Operator::RegEq | Operator::RegNe | Operator::CmpTrue | Operator::CmpFalse => {
                return Err(PairError::mismatch("comparison operator", op.as_str()));
            }
        };
        Ok(result)
    }
}

fn cmp_same(a: &Value, b: &Value) -> Option<Ordering> {
    let ordering = match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Uint8(a), Value::Uint8(b)) => a.cmp(b),
        (Value::Uint16(a), Value::Uint16(b)) => a.cmp(b),
        (Value::Uint32(a), Value::Uint32(b)) => a.cmp(b),
        (Value::Uint64(a), Value::Uint64(b)) => a.cmp(b),
        (Value::Int8(a), Value::Int8(b)) => a.cmp(b),
        (Value::Int16(a), Value::Int16(b)) => a.cmp(b),
        (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
        (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
        (Value::Float32(a), Value::Float32(b)) => a.total_cmp(b),
        (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
        (Value::Ipv4Addr(a), Value::Ipv4Addr(b)) => a.cmp(b),
        (Value::Ipv4Prefix(a), Value::Ipv4Prefix(b)) => {
            (a.network(), a.prefix()).cmp(&(b.network(), b.prefix()))
        }
        (Value::Ipv6Addr(a), Value::Ipv6Addr(b)) => a.cmp(b),
        (Value::Ipv6Prefix(a), Value::Ipv6Prefix(b)) => {
            (a.network(), a.prefix()).cmp(&(b.network(), b.prefix()))
        }
        (Value::Ifid(a), Value::Ifid(b)) => a.cmp(b),
        (Value::Ether(a), Value::Ether(b)) => a.cmp(b),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        (Value::TimeDelta(a), Value::TimeDelta(b)) => a.cmp(b),
        (Value::Octets(a), Value::Octets(b)) => (**a).cmp(&**b),
        (Value::String(a), Value::String(b)) => (**a).cmp(&**b),
        _ => return None,
    };
    Some(ordering)
}

/// A leaf value with its provenance flag and enum descriptor
#[derive(Debug, Clone)]
pub struct ValueBox {
    value: Value,
    tainted: bool,
    enumv: Option<Attr>,
}

impl ValueBox {
    pub fn new(value: Value, tainted: bool) -> Self {
        ValueBox {
            value,
            tainted,
            enumv: None,
        }
    }

    /// Zero value for the attribute's type, carrying it as enum descriptor
    /// when the attribute defines symbolic values
    pub(crate) fn for_attr(da: &Attr) -> Option<Self> {
        let value = Value::default_for(da.value_type())?;
        Some(ValueBox {
            value,
            tainted: false,
            enumv: da.has_enums().then(|| da.clone()),
        })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    pub fn is_tainted(&self) -> bool {
        self.tainted
    }

    /// Set or explicitly clear the provenance flag
    pub fn set_tainted(&mut self, tainted: bool) {
        self.tainted = tainted;
    }

    pub fn enumv(&self) -> Option<&Attr> {
        self.enumv.as_ref()
    }

    /// Copy that shares no buffers with `self`, keeping taint and enum
    pub fn deep_copy(&self) -> ValueBox {
        ValueBox {
            value: self.value.deep_copy(),
            tainted: self.tainted,
            enumv: self.enumv.clone(),
        }
    }

    pub(crate) fn check_type(&self, expected: ValueType) -> PairResult<()> {
        if self.value_type() != expected {
            return Err(PairError::mismatch(
                expected.name(),
                self.value_type().name(),
            ));
        }
        Ok(())
    }
}

impl PartialEq for ValueBox {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.tainted == other.tainted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_for_structural_is_none() {
        assert!(Value::default_for(ValueType::Group).is_none());
        assert_eq!(
            Value::default_for(ValueType::Uint32),
            Some(Value::Uint32(0))
        );
    }

    #[test]
    fn test_cmp_checked_rejects_mixed_types() {
        let a = Value::Uint32(1);
        let b = Value::string("1");
        assert!(matches!(
            a.cmp_checked(&b),
            Err(PairError::TypeMismatch { .. })
        ));
        assert_eq!(a.total_cmp(&b), Ordering::Less);
    }

    #[test]
    fn test_cmp_op() {
        let five = Value::Uint32(5);
        let six = Value::Uint32(6);
        assert!(five.cmp_op(Operator::Lt, &six).unwrap());
        assert!(five.cmp_op(Operator::Le, &five).unwrap());
        assert!(!five.cmp_op(Operator::CmpEq, &six).unwrap());
        assert!(five.cmp_op(Operator::Ne, &six).unwrap());
        assert!(six.cmp_op(Operator::Ge, &five).unwrap());
        assert!(five.cmp_op(Operator::RegEq, &six).is_err());
    }

    #[test]
    fn test_deep_copy_drops_sharing() {
        let shared: std::sync::Arc<str> = std::sync::Arc::from("borrowed");
        let value = Value::String(Buffer::Shared(shared));
        assert!(!value.is_owned());
        let copy = value.deep_copy();
        assert!(copy.is_owned());
        assert_eq!(copy, value);
    }
}
