//! Binary encoding of `FlowValue`s.
//!
//! Every value occupies exactly 16 bytes where it is used:
//!
//! ```text
//! u8 tag | u8 unit | u16 options | u32 reserved | 8-byte union
//! ```
//!
//! Strings, arrays and structs keep only an offset in the union. Their bodies are written
//! out of line once the enclosing record (or table of records) is complete, so tables of
//! values keep a fixed 16-byte stride the VM can index directly.

use std::collections::VecDeque;

use itertools::Itertools;

use super::FlowValue;
use crate::error::WriterError;
use crate::writer::{AssetWriter, PatchHandle};

/// Alignment of value tables and array/struct bodies.
pub const FLOW_VALUE_ALIGNMENT: usize = 8;

/// An out-of-line body waiting to be written.
enum Payload<'v> {
    String(&'v str),
    Elements(Vec<&'v FlowValue>),
}

/// Encodes values and keeps track of the bodies that still have to be written.
///
/// Call [`ValueEncoder::flush`] once the surrounding records are written; it writes all
/// queued bodies, including the bodies of nested elements, and resolves their slots.
#[derive(Default)]
pub struct ValueEncoder<'v> {
    pending: VecDeque<(PatchHandle, Payload<'v>)>,
}

impl<'v> ValueEncoder<'v> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Whether bodies are still waiting for `flush`.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Writes the 16-byte record of `value` at the cursor.
    pub fn encode(&mut self, writer: &mut AssetWriter, value: &'v FlowValue) -> Result<(), WriterError> {
        writer.write_u8(value.tag());
        writer.write_u8(0); // unit
        writer.write_u16(0); // options
        writer.write_u32(0); // reserved

        match value {
            FlowValue::Undefined | FlowValue::Null => writer.write_u64(0),
            FlowValue::Boolean(b) => {
                writer.write_u32(u32::from(*b));
                writer.write_u32(0);
            }
            FlowValue::Int8(v) => write_low_i32(writer, i32::from(*v)),
            FlowValue::Int16(v) => write_low_i32(writer, i32::from(*v)),
            FlowValue::Int32(v) => write_low_i32(writer, *v),
            FlowValue::UInt8(v) => write_low_u32(writer, u32::from(*v)),
            FlowValue::UInt16(v) => write_low_u32(writer, u32::from(*v)),
            FlowValue::UInt32(v) => write_low_u32(writer, *v),
            FlowValue::Int64(v) => writer.write_i64(*v),
            FlowValue::UInt64(v) => writer.write_u64(*v),
            FlowValue::Float(v) => {
                writer.write_f32(*v);
                writer.write_u32(0);
            }
            FlowValue::Double(v) | FlowValue::Date(v) => writer.write_f64(*v),
            FlowValue::String(s) => {
                let handle = writer.reserve_offset();
                writer.write_u32(0);
                self.pending.push_back((handle, Payload::String(s)));
            }
            FlowValue::Array { elements, .. } => {
                let handle = writer.reserve_offset();
                writer.write_u32(0);
                self.pending
                    .push_back((handle, Payload::Elements(elements.iter().collect())));
            }
            FlowValue::Struct { fields, .. } => {
                // The VM has no key table: fields are addressed by their sorted position.
                let elements = fields
                    .iter()
                    .sorted_by(|(a, _), (b, _)| a.cmp(b))
                    .map(|(_, value)| value)
                    .collect();
                let handle = writer.reserve_offset();
                writer.write_u32(0);
                self.pending.push_back((handle, Payload::Elements(elements)));
            }
        }
        Ok(())
    }

    /// Writes every queued body and resolves its slot.
    pub fn flush(&mut self, writer: &mut AssetWriter) -> Result<(), WriterError> {
        while let Some((handle, payload)) = self.pending.pop_front() {
            match payload {
                Payload::String(s) => {
                    writer.align(4)?;
                    let start = writer.offset();
                    writer.write_string(s)?;
                    writer.resolve(handle, start)?;
                }
                Payload::Elements(elements) => {
                    writer.align(FLOW_VALUE_ALIGNMENT)?;
                    let start = writer.offset();
                    let count = u32::try_from(elements.len())
                        .map_err(|_| WriterError::LengthOverflow(elements.len()))?;
                    writer.write_u32(count);
                    writer.write_u32(0); // reserved
                    for element in elements {
                        self.encode(writer, element)?;
                    }
                    writer.resolve(handle, start)?;
                }
            }
        }
        Ok(())
    }
}

/// Encodes a single value followed by its out-of-line bodies.
pub fn encode_value(writer: &mut AssetWriter, value: &FlowValue) -> Result<(), WriterError> {
    let mut encoder = ValueEncoder::new();
    encoder.encode(writer, value)?;
    encoder.flush(writer)
}

/// Writes an 8-byte aligned array of values (variables, constants), then the bodies of
/// every string, array and struct in it.
pub fn write_value_table(writer: &mut AssetWriter, values: &[FlowValue]) -> Result<(), WriterError> {
    writer.write_array_header(values.len(), FLOW_VALUE_ALIGNMENT)?;
    let mut encoder = ValueEncoder::new();
    for value in values {
        encoder.encode(writer, value)?;
    }
    encoder.flush(writer)
}

fn write_low_i32(writer: &mut AssetWriter, value: i32) {
    writer.write_i32(value);
    writer.write_u32(0);
}

fn write_low_u32(writer: &mut AssetWriter, value: u32) {
    writer.write_u32(value);
    writer.write_u32(0);
}
