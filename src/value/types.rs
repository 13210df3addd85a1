use std::fmt;

/// A declared value type, parsed from the type strings used in project files
/// (`"integer"`, `"enum:Mode"`, `"array:struct:Point"`, …).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Undefined,
    Null,
    Boolean,
    Int8,
    UInt8,
    Int16,
    UInt16,
    /// `"integer"` and `"int32"`.
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    /// Encoded as a double holding milliseconds since the Unix epoch.
    Date,
    String,
    Any,
    Enum(String),
    Array(Box<ValueType>),
    Struct(String),
}

impl ValueType {
    /// Parses a declared type. Returns `None` for types this emitter cannot encode.
    pub fn parse(source: &str) -> Option<Self> {
        let source = source.trim();
        if let Some(element) = source.strip_prefix("array:") {
            return ValueType::parse(element).map(|t| ValueType::Array(Box::new(t)));
        }
        if let Some(name) = source.strip_prefix("struct:") {
            return (!name.is_empty()).then(|| ValueType::Struct(name.to_string()));
        }
        if let Some(name) = source.strip_prefix("enum:") {
            return (!name.is_empty()).then(|| ValueType::Enum(name.to_string()));
        }
        let parsed = match source {
            "undefined" => ValueType::Undefined,
            "null" => ValueType::Null,
            "boolean" => ValueType::Boolean,
            "int8" => ValueType::Int8,
            "uint8" => ValueType::UInt8,
            "int16" => ValueType::Int16,
            "uint16" => ValueType::UInt16,
            "integer" | "int32" => ValueType::Int32,
            "uint32" => ValueType::UInt32,
            "int64" => ValueType::Int64,
            "uint64" => ValueType::UInt64,
            "float" => ValueType::Float,
            "double" => ValueType::Double,
            "date" => ValueType::Date,
            "string" => ValueType::String,
            "any" => ValueType::Any,
            _ => return None,
        };
        Some(parsed)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Undefined => write!(f, "undefined"),
            ValueType::Null => write!(f, "null"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Int8 => write!(f, "int8"),
            ValueType::UInt8 => write!(f, "uint8"),
            ValueType::Int16 => write!(f, "int16"),
            ValueType::UInt16 => write!(f, "uint16"),
            ValueType::Int32 => write!(f, "integer"),
            ValueType::UInt32 => write!(f, "uint32"),
            ValueType::Int64 => write!(f, "int64"),
            ValueType::UInt64 => write!(f, "uint64"),
            ValueType::Float => write!(f, "float"),
            ValueType::Double => write!(f, "double"),
            ValueType::Date => write!(f, "date"),
            ValueType::String => write!(f, "string"),
            ValueType::Any => write!(f, "any"),
            ValueType::Enum(name) => write!(f, "enum:{}", name),
            ValueType::Array(element) => write!(f, "array:{}", element),
            ValueType::Struct(name) => write!(f, "struct:{}", name),
        }
    }
}
