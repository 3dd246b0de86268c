use super::{Buffer, TimeDelta, UnixTime, Value, ValueType};
use crate::dict::Attr;
use crate::error::{PairError, PairResult};
use chrono::DateTime;
use ipnetwork::{Ipv4Network, Ipv6Network};
use std::net::{Ipv4Addr, Ipv6Addr};

impl Value {
    /// Parse text into a value of type `ty`
    ///
    /// When `enumv` is given, symbolic names defined on it are tried before
    /// the literal syntax of the type. Out-of-range integers fail with
    /// `Overflow`, never truncate.
    pub fn parse(ty: ValueType, text: &str, enumv: Option<&Attr>) -> PairResult<Value> {
        if let Some(value) = enumv.and_then(|da| da.enum_value(text)) {
            if value.value_type() == ty {
                return Ok(value.clone());
            }
        }

        let trimmed = text.trim();
        let value = match ty {
            ValueType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "yes" | "true" | "1" => Value::Bool(true),
                "no" | "false" | "0" => Value::Bool(false),
                _ => return Err(invalid(ty, text)),
            },
            ValueType::Uint8 => Value::Uint8(parse_int(ty, trimmed)?),
            ValueType::Uint16 => Value::Uint16(parse_int(ty, trimmed)?),
            ValueType::Uint32 => Value::Uint32(parse_int(ty, trimmed)?),
            ValueType::Uint64 => Value::Uint64(parse_int(ty, trimmed)?),
            ValueType::Int8 => Value::Int8(parse_int(ty, trimmed)?),
            ValueType::Int16 => Value::Int16(parse_int(ty, trimmed)?),
            ValueType::Int32 => Value::Int32(parse_int(ty, trimmed)?),
            ValueType::Int64 => Value::Int64(parse_int(ty, trimmed)?),
            ValueType::Float32 => {
                Value::Float32(trimmed.parse().map_err(|_| invalid(ty, text))?)
            }
            ValueType::Float64 => {
                Value::Float64(trimmed.parse().map_err(|_| invalid(ty, text))?)
            }
            ValueType::Ipv4Addr => {
                Value::Ipv4Addr(trimmed.parse::<Ipv4Addr>().map_err(|_| invalid(ty, text))?)
            }
            ValueType::Ipv4Prefix => Value::Ipv4Prefix(
                trimmed
                    .parse::<Ipv4Network>()
                    .map_err(|_| invalid(ty, text))?,
            ),
            ValueType::Ipv6Addr => {
                Value::Ipv6Addr(trimmed.parse::<Ipv6Addr>().map_err(|_| invalid(ty, text))?)
            }
            ValueType::Ipv6Prefix => Value::Ipv6Prefix(
                trimmed
                    .parse::<Ipv6Network>()
                    .map_err(|_| invalid(ty, text))?,
            ),
            ValueType::Ifid => Value::Ifid(parse_ifid(trimmed).ok_or_else(|| invalid(ty, text))?),
            ValueType::Ether => {
                Value::Ether(parse_ether(trimmed).ok_or_else(|| invalid(ty, text))?)
            }
            ValueType::Date => Value::Date(parse_date(trimmed)?),
            ValueType::TimeDelta => Value::TimeDelta(parse_time_delta(trimmed)?),
            ValueType::Octets => match trimmed.strip_prefix("0x") {
                Some(hex) => Value::Octets(Buffer::Owned(
                    decode_hex(hex).ok_or_else(|| invalid(ty, text))?,
                )),
                None => Value::Octets(Buffer::Owned(text.as_bytes().to_vec())),
            },
            ValueType::String => Value::String(Buffer::Owned(text.to_string())),
            ValueType::Tlv
            | ValueType::Struct
            | ValueType::Vsa
            | ValueType::Vendor
            | ValueType::Group => {
                return Err(PairError::mismatch("leaf type", ty.name()));
            }
        };
        Ok(value)
    }
}

fn invalid(ty: ValueType, text: &str) -> PairError {
    PairError::InvalidFormat {
        ty: ty.name(),
        input: text.to_string(),
    }
}

fn parse_int<T: TryFrom<i128>>(ty: ValueType, text: &str) -> PairResult<T> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u128::from_str_radix(hex, 16),
        None => digits.parse::<u128>(),
    };
    let magnitude = match magnitude {
        Ok(m) => m,
        Err(e) if matches!(e.kind(), std::num::IntErrorKind::PosOverflow) => {
            return Err(overflow(ty, text));
        }
        Err(_) => return Err(invalid(ty, text)),
    };
    let wide = i128::try_from(magnitude).map_err(|_| overflow(ty, text))?;
    let wide = if negative { -wide } else { wide };
    T::try_from(wide).map_err(|_| overflow(ty, text))
}

fn overflow(ty: ValueType, text: &str) -> PairError {
    PairError::Overflow {
        ty: ty.name(),
        input: text.to_string(),
    }
}

pub(crate) fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

fn parse_ifid(text: &str) -> Option<[u8; 8]> {
    let mut out = [0u8; 8];
    let groups: Vec<&str> = text.split(':').collect();
    if groups.len() != 4 {
        return None;
    }
    for (i, group) in groups.iter().enumerate() {
        let word = u16::from_str_radix(group, 16).ok()?;
        out[i * 2..i * 2 + 2].copy_from_slice(&word.to_be_bytes());
    }
    Some(out)
}

fn parse_ether(text: &str) -> Option<[u8; 6]> {
    let mut out = [0u8; 6];
    let octets: Vec<&str> = text.split([':', '-']).collect();
    if octets.len() != 6 {
        return None;
    }
    for (slot, octet) in out.iter_mut().zip(octets) {
        if octet.is_empty() || octet.len() > 2 {
            return None;
        }
        *slot = u8::from_str_radix(octet, 16).ok()?;
    }
    Some(out)
}

fn parse_date(text: &str) -> PairResult<UnixTime> {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = parse_int(ValueType::Date, text)?;
        return secs
            .checked_mul(1_000_000_000)
            .map(UnixTime)
            .ok_or_else(|| overflow(ValueType::Date, text));
    }
    let parsed = DateTime::parse_from_rfc3339(text).map_err(|_| invalid(ValueType::Date, text))?;
    parsed
        .timestamp_nanos_opt()
        .map(UnixTime)
        .ok_or_else(|| overflow(ValueType::Date, text))
}

/// Accepts a decimal number with an optional `ns`, `us`, `ms`, `s`, `m`
/// or `h` suffix; bare numbers are seconds
fn parse_time_delta(text: &str) -> PairResult<TimeDelta> {
    let ty = ValueType::TimeDelta;
    let split = text
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let scale: i128 = match unit {
        "ns" => 1,
        "us" => 1_000,
        "ms" => 1_000_000,
        "" | "s" => 1_000_000_000,
        "m" => 60_000_000_000,
        "h" => 3_600_000_000_000,
        _ => return Err(invalid(ty, text)),
    };

    let (negative, number) = match number.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, number),
    };
    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid(ty, text));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(ty, text));
    }

    let whole: i128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow(ty, text))?
    };
    let mut nanos = whole.checked_mul(scale).ok_or_else(|| overflow(ty, text))?;
    let mut place = scale;
    for digit in frac.bytes() {
        place /= 10;
        if place == 0 {
            break;
        }
        nanos += i128::from(digit - b'0') * place;
    }
    if negative {
        nanos = -nanos;
    }
    i64::try_from(nanos)
        .map(TimeDelta)
        .map_err(|_| overflow(ty, text))
}
