pub mod codec;
mod literal;
mod types;

pub use codec::{ValueEncoder, encode_value, write_value_table};
pub use literal::{default_value_for_type, value_from_literal};
pub use types::ValueType;

use std::fmt;
use std::hash::{Hash, Hasher};

// Tag byte of a serialized FlowValue.
pub const FLOW_VALUE_TYPE_UNDEFINED: u8 = 0;
pub const FLOW_VALUE_TYPE_NULL: u8 = 1;
pub const FLOW_VALUE_TYPE_BOOLEAN: u8 = 2;
pub const FLOW_VALUE_TYPE_INT8: u8 = 3;
pub const FLOW_VALUE_TYPE_UINT8: u8 = 4;
pub const FLOW_VALUE_TYPE_INT16: u8 = 5;
pub const FLOW_VALUE_TYPE_UINT16: u8 = 6;
pub const FLOW_VALUE_TYPE_INT32: u8 = 7;
pub const FLOW_VALUE_TYPE_UINT32: u8 = 8;
pub const FLOW_VALUE_TYPE_INT64: u8 = 9;
pub const FLOW_VALUE_TYPE_UINT64: u8 = 10;
pub const FLOW_VALUE_TYPE_FLOAT: u8 = 11;
pub const FLOW_VALUE_TYPE_DOUBLE: u8 = 12;
pub const FLOW_VALUE_TYPE_STRING_ASSET: u8 = 14;
pub const FLOW_VALUE_TYPE_ARRAY_ASSET: u8 = 16;
pub const FLOW_VALUE_TYPE_DATE: u8 = 21;

/// Size of a serialized FlowValue record at its point of use.
pub const FLOW_VALUE_SIZE: usize = 16;

/// A runtime value as the flow VM sees it.
///
/// Arrays and structs carry the name of their declared type so the diagnostic map and the
/// type table can refer to it.
#[derive(Debug, Clone)]
pub enum FlowValue {
    Undefined,
    Null,
    Boolean(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    /// Milliseconds since the Unix epoch.
    Date(f64),
    String(String),
    Array {
        value_type: String,
        elements: Vec<FlowValue>,
    },
    Struct {
        value_type: String,
        fields: Vec<(String, FlowValue)>,
    },
}

impl FlowValue {
    /// The tag byte written in front of the value.
    pub fn tag(&self) -> u8 {
        match self {
            FlowValue::Undefined => FLOW_VALUE_TYPE_UNDEFINED,
            FlowValue::Null => FLOW_VALUE_TYPE_NULL,
            FlowValue::Boolean(_) => FLOW_VALUE_TYPE_BOOLEAN,
            FlowValue::Int8(_) => FLOW_VALUE_TYPE_INT8,
            FlowValue::UInt8(_) => FLOW_VALUE_TYPE_UINT8,
            FlowValue::Int16(_) => FLOW_VALUE_TYPE_INT16,
            FlowValue::UInt16(_) => FLOW_VALUE_TYPE_UINT16,
            FlowValue::Int32(_) => FLOW_VALUE_TYPE_INT32,
            FlowValue::UInt32(_) => FLOW_VALUE_TYPE_UINT32,
            FlowValue::Int64(_) => FLOW_VALUE_TYPE_INT64,
            FlowValue::UInt64(_) => FLOW_VALUE_TYPE_UINT64,
            FlowValue::Float(_) => FLOW_VALUE_TYPE_FLOAT,
            FlowValue::Double(_) => FLOW_VALUE_TYPE_DOUBLE,
            FlowValue::Date(_) => FLOW_VALUE_TYPE_DATE,
            FlowValue::String(_) => FLOW_VALUE_TYPE_STRING_ASSET,
            FlowValue::Array { .. } | FlowValue::Struct { .. } => FLOW_VALUE_TYPE_ARRAY_ASSET,
        }
    }

    /// Name of the value type, as used by the value-type table.
    pub fn type_name(&self) -> &str {
        match self {
            FlowValue::Undefined => "undefined",
            FlowValue::Null => "null",
            FlowValue::Boolean(_) => "boolean",
            FlowValue::Int8(_)
            | FlowValue::UInt8(_)
            | FlowValue::Int16(_)
            | FlowValue::UInt16(_)
            | FlowValue::Int32(_)
            | FlowValue::UInt32(_)
            | FlowValue::Int64(_)
            | FlowValue::UInt64(_) => "integer",
            FlowValue::Float(_) => "float",
            FlowValue::Double(_) => "double",
            FlowValue::Date(_) => "date",
            FlowValue::String(_) => "string",
            FlowValue::Array { value_type, .. } | FlowValue::Struct { value_type, .. } => {
                value_type
            }
        }
    }
}

// Constants are de-duplicated by value, so FlowValue has to be usable as a map key.
// Floats compare and hash by their bit pattern: `0.0` and `-0.0` differ, `NaN` equals itself.
impl PartialEq for FlowValue {
    fn eq(&self, other: &Self) -> bool {
        use FlowValue::*;
        match (self, other) {
            (Undefined, Undefined) | (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Int8(a), Int8(b)) => a == b,
            (UInt8(a), UInt8(b)) => a == b,
            (Int16(a), Int16(b)) => a == b,
            (UInt16(a), UInt16(b)) => a == b,
            (Int32(a), Int32(b)) => a == b,
            (UInt32(a), UInt32(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (UInt64(a), UInt64(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) | (Date(a), Date(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (
                Array {
                    value_type: a,
                    elements: x,
                },
                Array {
                    value_type: b,
                    elements: y,
                },
            ) => a == b && x == y,
            (
                Struct {
                    value_type: a,
                    fields: x,
                },
                Struct {
                    value_type: b,
                    fields: y,
                },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

impl Eq for FlowValue {}

impl Hash for FlowValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            FlowValue::Undefined | FlowValue::Null => {}
            FlowValue::Boolean(b) => b.hash(state),
            FlowValue::Int8(v) => v.hash(state),
            FlowValue::UInt8(v) => v.hash(state),
            FlowValue::Int16(v) => v.hash(state),
            FlowValue::UInt16(v) => v.hash(state),
            FlowValue::Int32(v) => v.hash(state),
            FlowValue::UInt32(v) => v.hash(state),
            FlowValue::Int64(v) => v.hash(state),
            FlowValue::UInt64(v) => v.hash(state),
            FlowValue::Float(v) => v.to_bits().hash(state),
            FlowValue::Double(v) | FlowValue::Date(v) => v.to_bits().hash(state),
            FlowValue::String(s) => s.hash(state),
            FlowValue::Array {
                value_type,
                elements,
            } => {
                value_type.hash(state);
                elements.hash(state);
            }
            FlowValue::Struct { value_type, fields } => {
                value_type.hash(state);
                fields.hash(state);
            }
        }
    }
}

impl fmt::Display for FlowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowValue::Undefined => write!(f, "undefined"),
            FlowValue::Null => write!(f, "null"),
            FlowValue::Boolean(b) => write!(f, "{}", b),
            FlowValue::Int8(v) => write!(f, "{}", v),
            FlowValue::UInt8(v) => write!(f, "{}", v),
            FlowValue::Int16(v) => write!(f, "{}", v),
            FlowValue::UInt16(v) => write!(f, "{}", v),
            FlowValue::Int32(v) => write!(f, "{}", v),
            FlowValue::UInt32(v) => write!(f, "{}", v),
            FlowValue::Int64(v) => write!(f, "{}", v),
            FlowValue::UInt64(v) => write!(f, "{}", v),
            FlowValue::Float(v) => write!(f, "{}", v),
            FlowValue::Double(v) => write!(f, "{}", v),
            FlowValue::Date(v) => write!(f, "date({})", v),
            FlowValue::String(s) => write!(f, "{:?}", s),
            FlowValue::Array { elements, .. } => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            FlowValue::Struct { fields, .. } => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
