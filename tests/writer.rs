mod common;

use common::{read_u16, read_u32};
use flowpack::error::WriterError;
use flowpack::writer::AssetWriter;

#[test]
fn test_primitives_are_little_endian() {
    let mut writer = AssetWriter::new();
    writer.write_u16(0x0102);
    writer.write_i16(-2);
    writer.write_u32(0x0A0B0C0D);
    writer.write_f32(1.5);

    let bytes = writer.finish().unwrap();
    assert_eq!(&bytes[0..2], &[0x02, 0x01]);
    assert_eq!(&bytes[2..4], &[0xFE, 0xFF]);
    assert_eq!(&bytes[4..8], &[0x0D, 0x0C, 0x0B, 0x0A]);
    assert_eq!(&bytes[8..12], &1.5f32.to_le_bytes());
}

#[test]
fn test_object_offset_points_at_produced_content() {
    let mut writer = AssetWriter::new();
    writer.write_u8(7);

    let start = writer
        .write_object_offset(8, |w| -> Result<usize, WriterError> {
            let start = w.offset();
            w.write_u32(0xCAFE);
            Ok(start)
        })
        .unwrap();

    let bytes = writer.finish().unwrap();
    // Slot aligned to 4, content aligned to 8.
    assert_eq!(start, 8);
    assert_eq!(read_u32(&bytes, 4), 8);
    assert_eq!(read_u32(&bytes, 8), 0xCAFE);
}

#[test]
fn test_nested_object_offsets() {
    let mut writer = AssetWriter::new();
    writer
        .write_object_offset(4, |w| -> Result<(), WriterError> {
            w.write_u32(1);
            w.write_object_offset(4, |w| -> Result<(), WriterError> {
                w.write_u32(2);
                Ok(())
            })?;
            w.write_u32(3);
            Ok(())
        })
        .unwrap();

    let bytes = writer.finish().unwrap();
    let outer = read_u32(&bytes, 0) as usize;
    assert_eq!(outer, 4);
    assert_eq!(read_u32(&bytes, outer), 1);
    let inner = read_u32(&bytes, outer + 4) as usize;
    assert_eq!(inner, 12);
    assert_eq!(read_u32(&bytes, inner), 2);
    assert_eq!(read_u32(&bytes, inner + 4), 3);
}

#[test]
fn test_reserve_and_resolve_explicitly() {
    let mut writer = AssetWriter::new();
    let handle = writer.reserve_offset();
    assert_eq!(handle.position(), 0);
    assert_eq!(writer.pending_patches(), 1);

    writer.write_u32(0);
    let target = writer.offset();
    writer.write_string("abc").unwrap();
    writer.resolve(handle, target).unwrap();
    assert_eq!(writer.pending_patches(), 0);

    let bytes = writer.finish().unwrap();
    assert_eq!(read_u32(&bytes, 0), 8);
    assert_eq!(read_u32(&bytes, 8), 3);
    assert_eq!(&bytes[12..16], b"abc\0");
}

#[test]
fn test_finish_fails_while_patches_are_pending() {
    let mut writer = AssetWriter::new();
    let _handle = writer.reserve_offset();
    assert_eq!(writer.finish(), Err(WriterError::UnresolvedPatches(1)));
}

#[test]
fn test_resolve_rejects_target_past_the_end() {
    let mut writer = AssetWriter::new();
    let handle = writer.reserve_offset();
    assert_eq!(
        writer.resolve(handle, 100),
        Err(WriterError::TargetOutOfRange { target: 100, len: 4 })
    );
}

#[test]
fn test_string_is_nul_terminated_and_padded() {
    let mut writer = AssetWriter::new();
    writer.write_string("hello").unwrap();
    let bytes = writer.finish().unwrap();

    assert_eq!(read_u32(&bytes, 0), 5);
    assert_eq!(&bytes[4..10], b"hello\0");
    assert_eq!(bytes.len(), 12);
}

#[test]
fn test_array_pads_to_element_alignment() {
    let mut writer = AssetWriter::new();
    writer.write_u8(1);
    writer
        .write_array(&[10u64, 20], 8, |w, &item, _| -> Result<(), WriterError> {
            w.write_u64(item);
            Ok(())
        })
        .unwrap();

    let bytes = writer.finish().unwrap();
    assert_eq!(read_u32(&bytes, 4), 2);
    assert_eq!(&bytes[8..16], &10u64.to_le_bytes());
    assert_eq!(&bytes[16..24], &20u64.to_le_bytes());
}

#[test]
fn test_number_array_is_packed() {
    let mut writer = AssetWriter::new();
    writer
        .write_number_array(&[1u16, 2, 3], |w, &item, _| -> Result<(), WriterError> {
            w.write_u16(item);
            Ok(())
        })
        .unwrap();

    let bytes = writer.finish().unwrap();
    assert_eq!(bytes.len(), 10);
    assert_eq!(read_u32(&bytes, 0), 3);
    assert_eq!(read_u16(&bytes, 4), 1);
    assert_eq!(read_u16(&bytes, 8), 3);
}

#[test]
fn test_invalid_alignment() {
    let mut writer = AssetWriter::new();
    assert_eq!(writer.align(3), Err(WriterError::InvalidAlignment(3)));
    assert_eq!(writer.align(0), Err(WriterError::InvalidAlignment(0)));
}

#[test]
fn test_rollback() {
    let mut writer = AssetWriter::new();
    writer.write_u32(1);
    let mark = writer.offset();
    writer.write_u32(2);
    writer.rollback(mark).unwrap();
    assert_eq!(writer.offset(), 4);

    let handle = writer.reserve_offset();
    writer.resolve(handle, 0).unwrap();
    assert_eq!(writer.finish().unwrap(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn test_rollback_discards_pending_slots() {
    let mut writer = AssetWriter::new();
    writer.write_u32(1);
    let mark = writer.offset();

    let result: Result<(), WriterError> = writer.write_object_offset(8, |w| {
        let _inner = w.reserve_offset();
        w.write_u32(7);
        Err(WriterError::LengthOverflow(0))
    });
    assert!(result.is_err());
    assert_eq!(writer.pending_patches(), 2);

    writer.rollback(mark).unwrap();
    assert_eq!(writer.pending_patches(), 0);
    assert_eq!(writer.finish().unwrap(), vec![1, 0, 0, 0]);
}

#[test]
fn test_resolving_a_rolled_back_slot_fails() {
    let mut writer = AssetWriter::new();
    let handle = writer.reserve_offset();
    writer.rollback(0).unwrap();
    assert_eq!(writer.resolve(handle, 0), Err(WriterError::UnknownPatch(0)));
}
