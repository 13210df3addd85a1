mod common;

use common::{read_f64, read_i32, read_u32};
use flowpack::project::{FieldDefinition, StructureDefinition};
use flowpack::value::{
    FLOW_VALUE_SIZE, FLOW_VALUE_TYPE_DATE, FlowValue, ValueEncoder, ValueType, default_value_for_type, encode_value,
    value_from_literal, write_value_table,
};
use flowpack::writer::AssetWriter;
use serde_json::json;

fn encoded(value: &FlowValue) -> Vec<u8> {
    let mut writer = AssetWriter::new();
    encode_value(&mut writer, value).unwrap();
    writer.finish().unwrap()
}

fn point_structure() -> StructureDefinition {
    StructureDefinition {
        name: "Point".to_string(),
        fields: vec![
            FieldDefinition {
                name: "y".to_string(),
                value_type: "integer".to_string(),
            },
            FieldDefinition {
                name: "x".to_string(),
                value_type: "integer".to_string(),
            },
        ],
        system: false,
    }
}

#[test]
fn test_every_record_is_sixteen_bytes() {
    let values = vec![
        FlowValue::Undefined,
        FlowValue::Null,
        FlowValue::Boolean(true),
        FlowValue::Int8(-1),
        FlowValue::UInt16(7),
        FlowValue::Int32(-5),
        FlowValue::UInt64(u64::MAX),
        FlowValue::Float(1.5),
        FlowValue::Double(2.25),
        FlowValue::String("text".to_string()),
        FlowValue::Array {
            value_type: "array:integer".to_string(),
            elements: vec![FlowValue::Int32(1)],
        },
        FlowValue::Struct {
            value_type: "struct:Point".to_string(),
            fields: vec![("x".to_string(), FlowValue::Int32(1))],
        },
    ];

    let mut writer = AssetWriter::new();
    let mut encoder = ValueEncoder::new();
    for value in &values {
        let before = writer.offset();
        encoder.encode(&mut writer, value).unwrap();
        assert_eq!(writer.offset() - before, FLOW_VALUE_SIZE, "{:?}", value);
    }
    assert!(encoder.has_pending());
    encoder.flush(&mut writer).unwrap();
    assert!(writer.finish().is_ok());
}

#[test]
fn test_scalar_payloads() {
    let bytes = encoded(&FlowValue::Int32(-5));
    assert_eq!(bytes.len(), 16);
    assert_eq!(bytes[0], FlowValue::Int32(0).tag());
    assert_eq!(read_i32(&bytes, 8), -5);
    assert_eq!(read_u32(&bytes, 12), 0);

    let bytes = encoded(&FlowValue::Double(2.25));
    assert_eq!(read_f64(&bytes, 8), 2.25);

    let bytes = encoded(&FlowValue::Int64(-1));
    assert_eq!(&bytes[8..16], &[0xFF; 8]);

    let bytes = encoded(&FlowValue::Boolean(true));
    assert_eq!(read_u32(&bytes, 8), 1);
    assert_eq!(&bytes[1..8], &[0; 7]);
}

#[test]
fn test_date_payload() {
    let bytes = encoded(&FlowValue::Date(1_700_000_000_000.0));
    assert_eq!(bytes.len(), 16);
    assert_eq!(bytes[0], FLOW_VALUE_TYPE_DATE);
    assert_eq!(read_f64(&bytes, 8), 1_700_000_000_000.0);

    assert_eq!(ValueType::parse("date"), Some(ValueType::Date));
    assert_eq!(ValueType::Date.to_string(), "date");
    assert_eq!(default_value_for_type(&ValueType::Date), FlowValue::Date(0.0));
    assert_eq!(
        value_from_literal(&ValueType::Date, &json!(86_400_000), &[]).unwrap(),
        FlowValue::Date(86_400_000.0)
    );
    assert!(value_from_literal(&ValueType::Date, &json!("yesterday"), &[]).is_err());
}

#[test]
fn test_floats_compare_by_bit_pattern() {
    use std::collections::HashSet;

    assert_ne!(FlowValue::Double(0.0), FlowValue::Double(-0.0));
    assert_eq!(FlowValue::Double(f64::NAN), FlowValue::Double(f64::NAN));
    assert_eq!(FlowValue::Float(f32::NAN), FlowValue::Float(f32::NAN));
    assert_ne!(FlowValue::Double(1.0), FlowValue::Date(1.0));

    let constants: HashSet<FlowValue> = [
        FlowValue::Double(f64::NAN),
        FlowValue::Double(f64::NAN),
        FlowValue::Double(0.0),
        FlowValue::Double(-0.0),
    ]
    .into_iter()
    .collect();
    assert_eq!(constants.len(), 3);
}

#[test]
fn test_string_payload() {
    let bytes = encoded(&FlowValue::String("hi".to_string()));
    assert_eq!(read_u32(&bytes, 8), 16);
    assert_eq!(read_u32(&bytes, 12), 0);
    assert_eq!(read_u32(&bytes, 16), 2);
    assert_eq!(&bytes[20..23], b"hi\0");
    assert_eq!(bytes.len(), 24);
}

#[test]
fn test_array_payload() {
    let value = FlowValue::Array {
        value_type: "array:any".to_string(),
        elements: vec![FlowValue::Int32(3), FlowValue::String("s".to_string())],
    };
    let bytes = encoded(&value);

    let body = read_u32(&bytes, 8) as usize;
    assert_eq!(body, 16);
    assert_eq!(read_u32(&bytes, body), 2);
    assert_eq!(read_u32(&bytes, body + 4), 0);
    assert_eq!(read_i32(&bytes, body + 16), 3);

    // The nested string body follows the array body.
    let string_record = body + 8 + 16;
    let string_body = read_u32(&bytes, string_record + 8) as usize;
    assert_eq!(string_body, body + 8 + 32);
    assert_eq!(read_u32(&bytes, string_body), 1);
}

#[test]
fn test_struct_fields_are_sorted_by_name() {
    let forward = FlowValue::Struct {
        value_type: "struct:Pair".to_string(),
        fields: vec![
            ("a".to_string(), FlowValue::Int32(1)),
            ("b".to_string(), FlowValue::Int32(2)),
        ],
    };
    let reversed = FlowValue::Struct {
        value_type: "struct:Pair".to_string(),
        fields: vec![
            ("b".to_string(), FlowValue::Int32(2)),
            ("a".to_string(), FlowValue::Int32(1)),
        ],
    };

    let bytes = encoded(&reversed);
    assert_eq!(bytes, encoded(&forward));

    let body = read_u32(&bytes, 8) as usize;
    assert_eq!(read_i32(&bytes, body + 8 + 8), 1);
    assert_eq!(read_i32(&bytes, body + 8 + 16 + 8), 2);
}

#[test]
fn test_value_table_keeps_fixed_stride() {
    let values = vec![
        FlowValue::String("first".to_string()),
        FlowValue::Int32(2),
        FlowValue::String("third".to_string()),
    ];
    let mut writer = AssetWriter::new();
    writer.write_u32(0xFFFF_FFFF);
    write_value_table(&mut writer, &values).unwrap();
    let bytes = writer.finish().unwrap();

    assert_eq!(read_u32(&bytes, 4), 3);
    let records = 8;
    assert_eq!(read_i32(&bytes, records + 16 + 8), 2);
    let first = read_u32(&bytes, records + 8) as usize;
    let third = read_u32(&bytes, records + 32 + 8) as usize;
    assert_eq!(first, records + 48);
    assert_eq!(&bytes[first + 4..first + 9], b"first");
    assert_eq!(&bytes[third + 4..third + 9], b"third");
}

#[test]
fn test_literal_conversion() {
    let structures = vec![point_structure()];

    let point = value_from_literal(
        &ValueType::Struct("Point".to_string()),
        &json!({ "x": 4 }),
        &structures,
    )
    .unwrap();
    assert_eq!(
        point,
        FlowValue::Struct {
            value_type: "struct:Point".to_string(),
            fields: vec![
                ("y".to_string(), FlowValue::Int32(0)),
                ("x".to_string(), FlowValue::Int32(4)),
            ],
        }
    );

    assert_eq!(
        value_from_literal(&ValueType::Enum("Mode".to_string()), &json!(2), &[]).unwrap(),
        FlowValue::Int32(2)
    );
    assert_eq!(
        value_from_literal(&ValueType::Any, &json!(1.5), &[]).unwrap(),
        FlowValue::Double(1.5)
    );
    assert_eq!(
        value_from_literal(&ValueType::UInt8, &json!(null), &[]).unwrap(),
        FlowValue::Null
    );
    assert!(value_from_literal(&ValueType::UInt8, &json!(300), &[]).is_err());
    assert!(value_from_literal(&ValueType::String, &json!(1), &[]).is_err());
    assert!(value_from_literal(&ValueType::Struct("Missing".to_string()), &json!({}), &[]).is_err());
}

#[test]
fn test_value_types() {
    assert_eq!(ValueType::parse("int32"), Some(ValueType::Int32));
    assert_eq!(
        ValueType::parse("array:struct:Point"),
        Some(ValueType::Array(Box::new(ValueType::Struct("Point".to_string()))))
    );
    assert_eq!(ValueType::parse("struct:"), None);
    assert_eq!(ValueType::parse("object:Widget"), None);
    assert_eq!(ValueType::Int32.to_string(), "integer");
    assert_eq!(default_value_for_type(&ValueType::String), FlowValue::String(String::new()));
    assert_eq!(default_value_for_type(&ValueType::Enum("Mode".to_string())), FlowValue::Int32(0));
}
