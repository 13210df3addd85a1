use super::{FlowValue, ValueType};
use crate::error::ValueError;
use crate::project::StructureDefinition;
use serde_json::Value as Literal;

/// Converts a constant literal into a `FlowValue` of the declared type.
///
/// `null` is accepted for every type. Struct literals are laid out following the structure
/// definition; fields missing from the literal take the default for their type.
pub fn value_from_literal(
    value_type: &ValueType,
    literal: &Literal,
    structures: &[StructureDefinition],
) -> Result<FlowValue, ValueError> {
    if literal.is_null() {
        return Ok(match value_type {
            ValueType::Undefined => FlowValue::Undefined,
            _ => FlowValue::Null,
        });
    }

    let value = match value_type {
        ValueType::Undefined => FlowValue::Undefined,
        ValueType::Null => FlowValue::Null,
        ValueType::Boolean => FlowValue::Boolean(
            literal
                .as_bool()
                .ok_or_else(|| mismatch(value_type, literal))?,
        ),
        ValueType::Int8 => FlowValue::Int8(integer(value_type, literal)?),
        ValueType::UInt8 => FlowValue::UInt8(integer(value_type, literal)?),
        ValueType::Int16 => FlowValue::Int16(integer(value_type, literal)?),
        ValueType::UInt16 => FlowValue::UInt16(integer(value_type, literal)?),
        ValueType::Int32 | ValueType::Enum(_) => FlowValue::Int32(integer(value_type, literal)?),
        ValueType::UInt32 => FlowValue::UInt32(integer(value_type, literal)?),
        ValueType::Int64 => FlowValue::Int64(integer(value_type, literal)?),
        ValueType::UInt64 => FlowValue::UInt64(
            literal
                .as_u64()
                .ok_or_else(|| mismatch(value_type, literal))?,
        ),
        ValueType::Float => FlowValue::Float(
            literal
                .as_f64()
                .ok_or_else(|| mismatch(value_type, literal))? as f32,
        ),
        ValueType::Double => FlowValue::Double(
            literal
                .as_f64()
                .ok_or_else(|| mismatch(value_type, literal))?,
        ),
        ValueType::Date => FlowValue::Date(
            literal
                .as_f64()
                .ok_or_else(|| mismatch(value_type, literal))?,
        ),
        ValueType::String => FlowValue::String(
            literal
                .as_str()
                .ok_or_else(|| mismatch(value_type, literal))?
                .to_string(),
        ),
        ValueType::Any => infer_value(literal),
        ValueType::Array(element_type) => {
            let items = literal
                .as_array()
                .ok_or_else(|| mismatch(value_type, literal))?;
            let elements = items
                .iter()
                .map(|item| value_from_literal(element_type, item, structures))
                .collect::<Result<Vec<_>, _>>()?;
            FlowValue::Array {
                value_type: value_type.to_string(),
                elements,
            }
        }
        ValueType::Struct(name) => {
            let object = literal
                .as_object()
                .ok_or_else(|| mismatch(value_type, literal))?;
            let structure = structures
                .iter()
                .find(|s| &s.name == name)
                .ok_or_else(|| ValueError::UnknownStructure(name.clone()))?;
            let mut fields = Vec::with_capacity(structure.fields.len());
            for field in &structure.fields {
                let field_type = ValueType::parse(&field.value_type)
                    .ok_or_else(|| ValueError::UnknownType(field.value_type.clone()))?;
                let value = match object.get(&field.name) {
                    Some(field_literal) => {
                        value_from_literal(&field_type, field_literal, structures)?
                    }
                    None => default_value_for_type(&field_type),
                };
                fields.push((field.name.clone(), value));
            }
            FlowValue::Struct {
                value_type: value_type.to_string(),
                fields,
            }
        }
    };
    Ok(value)
}

/// The value a variable or struct field takes when nothing else is given.
pub fn default_value_for_type(value_type: &ValueType) -> FlowValue {
    match value_type {
        ValueType::Undefined => FlowValue::Undefined,
        ValueType::Boolean => FlowValue::Boolean(false),
        ValueType::Int8 => FlowValue::Int8(0),
        ValueType::UInt8 => FlowValue::UInt8(0),
        ValueType::Int16 => FlowValue::Int16(0),
        ValueType::UInt16 => FlowValue::UInt16(0),
        ValueType::Int32 | ValueType::Enum(_) => FlowValue::Int32(0),
        ValueType::UInt32 => FlowValue::UInt32(0),
        ValueType::Int64 => FlowValue::Int64(0),
        ValueType::UInt64 => FlowValue::UInt64(0),
        ValueType::Float => FlowValue::Float(0.0),
        ValueType::Double => FlowValue::Double(0.0),
        ValueType::Date => FlowValue::Date(0.0),
        ValueType::String => FlowValue::String(String::new()),
        ValueType::Null | ValueType::Any | ValueType::Array(_) | ValueType::Struct(_) => {
            FlowValue::Null
        }
    }
}

/// Literal typing for untyped (`any`) values: integral numbers inside the 32-bit range
/// become `int32`, every other number `double`.
fn infer_value(literal: &Literal) -> FlowValue {
    match literal {
        Literal::Null => FlowValue::Null,
        Literal::Bool(b) => FlowValue::Boolean(*b),
        Literal::Number(n) => match n.as_i64() {
            Some(i) if i > i32::MIN as i64 && i < i32::MAX as i64 => FlowValue::Int32(i as i32),
            _ => FlowValue::Double(n.as_f64().unwrap_or(0.0)),
        },
        Literal::String(s) => FlowValue::String(s.clone()),
        Literal::Array(items) => FlowValue::Array {
            value_type: "array:any".to_string(),
            elements: items.iter().map(infer_value).collect(),
        },
        Literal::Object(object) => FlowValue::Struct {
            value_type: "any".to_string(),
            fields: object
                .iter()
                .map(|(key, value)| (key.clone(), infer_value(value)))
                .collect(),
        },
    }
}

fn integer<T: TryFrom<i64>>(value_type: &ValueType, literal: &Literal) -> Result<T, ValueError> {
    let raw = match literal.as_i64() {
        Some(i) => i,
        None => match literal.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => f as i64,
            _ => return Err(mismatch(value_type, literal)),
        },
    };
    T::try_from(raw).map_err(|_| mismatch(value_type, literal))
}

fn mismatch(value_type: &ValueType, literal: &Literal) -> ValueError {
    ValueError::Mismatch {
        expected: value_type.to_string(),
        found: literal.to_string(),
    }
}
