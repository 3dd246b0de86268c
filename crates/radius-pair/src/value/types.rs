use serde::{Deserialize, Serialize};

/// Value types a dictionary attribute can declare
///
/// Leaf types carry a scalar or buffer value. Structural types (`Tlv`,
/// `Struct`, `Vsa`, `Vendor`, `Group`) carry a nested list of child pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ValueType {
    Bool = 1,
    Uint8 = 2,
    Uint16 = 3,
    Uint32 = 4,
    Uint64 = 5,
    Int8 = 6,
    Int16 = 7,
    Int32 = 8,
    Int64 = 9,
    Float32 = 10,
    Float64 = 11,
    Ipv4Addr = 12,
    Ipv4Prefix = 13,
    Ipv6Addr = 14,
    Ipv6Prefix = 15,
    Ifid = 16,
    Ether = 17,
    Date = 18,
    #[serde(rename = "time_delta")]
    TimeDelta = 19,
    Octets = 20,
    String = 21,
    Tlv = 30,
    Struct = 31,
    Vsa = 32,
    Vendor = 33,
    Group = 34,
}

impl ValueType {
    /// Dictionary spelling of the type
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Uint8 => "uint8",
            ValueType::Uint16 => "uint16",
            ValueType::Uint32 => "uint32",
            ValueType::Uint64 => "uint64",
            ValueType::Int8 => "int8",
            ValueType::Int16 => "int16",
            ValueType::Int32 => "int32",
            ValueType::Int64 => "int64",
            ValueType::Float32 => "float32",
            ValueType::Float64 => "float64",
            ValueType::Ipv4Addr => "ipv4addr",
            ValueType::Ipv4Prefix => "ipv4prefix",
            ValueType::Ipv6Addr => "ipv6addr",
            ValueType::Ipv6Prefix => "ipv6prefix",
            ValueType::Ifid => "ifid",
            ValueType::Ether => "ether",
            ValueType::Date => "date",
            ValueType::TimeDelta => "time_delta",
            ValueType::Octets => "octets",
            ValueType::String => "string",
            ValueType::Tlv => "tlv",
            ValueType::Struct => "struct",
            ValueType::Vsa => "vsa",
            ValueType::Vendor => "vendor",
            ValueType::Group => "group",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "bool" => ValueType::Bool,
            "uint8" => ValueType::Uint8,
            "uint16" => ValueType::Uint16,
            "uint32" | "integer" => ValueType::Uint32,
            "uint64" => ValueType::Uint64,
            "int8" => ValueType::Int8,
            "int16" => ValueType::Int16,
            "int32" => ValueType::Int32,
            "int64" => ValueType::Int64,
            "float32" => ValueType::Float32,
            "float64" => ValueType::Float64,
            "ipv4addr" | "ipaddr" => ValueType::Ipv4Addr,
            "ipv4prefix" => ValueType::Ipv4Prefix,
            "ipv6addr" => ValueType::Ipv6Addr,
            "ipv6prefix" => ValueType::Ipv6Prefix,
            "ifid" => ValueType::Ifid,
            "ether" => ValueType::Ether,
            "date" => ValueType::Date,
            "time_delta" => ValueType::TimeDelta,
            "octets" => ValueType::Octets,
            "string" => ValueType::String,
            "tlv" => ValueType::Tlv,
            "struct" => ValueType::Struct,
            "vsa" => ValueType::Vsa,
            "vendor" => ValueType::Vendor,
            "group" => ValueType::Group,
            _ => return None,
        };
        Some(ty)
    }

    /// Whether pairs of this type own a child list instead of a value
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ValueType::Tlv
                | ValueType::Struct
                | ValueType::Vsa
                | ValueType::Vendor
                | ValueType::Group
        )
    }

    /// Variable-length types backed by a [`Buffer`](super::Buffer)
    pub fn is_variable_length(self) -> bool {
        matches!(self, ValueType::Octets | ValueType::String)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
