//! Append-only binary writer with forward references.
//!
//! Everything the emitter produces ends up in one [`AssetWriter`]. Values are written
//! little-endian at the current cursor; the writer never aligns on its own except in the
//! compound writers documented below. Data whose position is not known yet is referenced
//! through a [`PatchHandle`]: reserve a 4-byte slot, write the data later, then resolve the
//! handle with the absolute offset the data landed at.

use crate::error::WriterError;

mod patch;

pub use patch::PatchHandle;

/// Width of every offset slot.
pub const OFFSET_SLOT_SIZE: usize = 4;

/// Default element alignment for `write_array`.
pub const DEFAULT_ARRAY_ALIGNMENT: usize = 4;

/// A growing byte buffer plus the bookkeeping for unresolved offset slots.
#[derive(Debug, Default)]
pub struct AssetWriter {
    buffer: Vec<u8>,
    /// Positions of reserved slots that have not been resolved yet.
    pending: Vec<usize>,
}

impl AssetWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current write cursor (absolute offset from the start of the buffer).
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Number of reserved slots still waiting for `resolve`.
    pub fn pending_patches(&self) -> usize {
        self.pending.len()
    }

    /// Read-only view of everything written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    // --- Primitive writers ---

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a `u32` byte length, the UTF-8 bytes and a NUL terminator, then pads to 4.
    pub fn write_string(&mut self, value: &str) -> Result<(), WriterError> {
        let len = u32::try_from(value.len()).map_err(|_| WriterError::LengthOverflow(value.len()))?;
        self.write_u32(len);
        self.write_bytes(value.as_bytes());
        self.write_u8(0);
        self.align(4)
    }

    /// Inserts zero bytes until the cursor is a multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<(), WriterError> {
        if alignment == 0 || !alignment.is_power_of_two() {
            return Err(WriterError::InvalidAlignment(alignment));
        }
        let padding = (alignment - self.buffer.len() % alignment) % alignment;
        self.buffer.resize(self.buffer.len() + padding, 0);
        Ok(())
    }

    // --- Forward references ---

    /// Reserves a zeroed 4-byte offset slot at the cursor.
    ///
    /// The returned handle must be passed to [`AssetWriter::resolve`] before the buffer is
    /// finished; `finish` fails while any handle is outstanding.
    #[must_use = "a reserved slot must be resolved before the buffer is finished"]
    pub fn reserve_offset(&mut self) -> PatchHandle {
        let position = self.buffer.len();
        self.buffer.extend_from_slice(&[0; OFFSET_SLOT_SIZE]);
        self.pending.push(position);
        PatchHandle::new(position)
    }

    /// Patches the slot behind `handle` with the absolute offset `target`.
    pub fn resolve(&mut self, handle: PatchHandle, target: usize) -> Result<(), WriterError> {
        let position = handle.position();
        let slot = self
            .pending
            .iter()
            .position(|&p| p == position)
            .ok_or(WriterError::UnknownPatch(position))?;
        if position + OFFSET_SLOT_SIZE > self.buffer.len() {
            return Err(WriterError::PatchOutOfRange {
                position,
                len: self.buffer.len(),
            });
        }
        if target > self.buffer.len() {
            return Err(WriterError::TargetOutOfRange {
                target,
                len: self.buffer.len(),
            });
        }
        let value = u32::try_from(target).map_err(|_| WriterError::OffsetOverflow(target))?;
        self.buffer[position..position + OFFSET_SLOT_SIZE].copy_from_slice(&value.to_le_bytes());
        self.pending.swap_remove(slot);
        Ok(())
    }

    /// Reserves a slot, runs `producer` and patches the slot with the offset the produced
    /// content started at.
    ///
    /// The content lands directly after the slot (plus padding up to `alignment`), so the
    /// caller's own record ends at the slot. Nesting is allowed.
    pub fn write_object_offset<T, E, F>(&mut self, alignment: usize, producer: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<WriterError>,
    {
        self.align(4)?;
        let handle = self.reserve_offset();
        self.align(alignment)?;
        let start = self.offset();
        let result = producer(self)?;
        self.resolve(handle, start)?;
        Ok(result)
    }

    /// `write_object_offset` with the default 4-byte alignment, used for tables that only
    /// exist behind an offset.
    pub fn write_future_array<T, E, F>(&mut self, producer: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<WriterError>,
    {
        self.write_object_offset(4, producer)
    }

    // --- Compound writers ---

    /// Writes `u32` length, pads to `alignment`, then encodes every item in order.
    pub fn write_array<I, E, F>(
        &mut self,
        items: &[I],
        alignment: usize,
        mut encode: F,
    ) -> Result<(), E>
    where
        F: FnMut(&mut Self, &I, usize) -> Result<(), E>,
        E: From<WriterError>,
    {
        self.write_array_header(items.len(), alignment)?;
        for (index, item) in items.iter().enumerate() {
            encode(self, item, index)?;
        }
        Ok(())
    }

    /// Writes `u32` length followed by tightly packed items (no padding between them).
    pub fn write_number_array<I, E, F>(&mut self, items: &[I], mut encode: F) -> Result<(), E>
    where
        F: FnMut(&mut Self, &I, usize) -> Result<(), E>,
        E: From<WriterError>,
    {
        self.align(4)?;
        self.write_len(items.len())?;
        for (index, item) in items.iter().enumerate() {
            encode(self, item, index)?;
        }
        Ok(())
    }

    /// The part of `write_array` that precedes the items: pad to 4, `u32` length, pad to
    /// `alignment`. For callers that drive the items themselves.
    pub fn write_array_header(&mut self, len: usize, alignment: usize) -> Result<(), WriterError> {
        self.align(4)?;
        self.write_len(len)?;
        self.align(alignment)
    }

    fn write_len(&mut self, len: usize) -> Result<(), WriterError> {
        let len = u32::try_from(len).map_err(|_| WriterError::LengthOverflow(len))?;
        self.write_u32(len);
        Ok(())
    }

    // --- Marks ---

    /// Drops everything written after `mark`.
    ///
    /// Used to discard a partially written record. Slots reserved after `mark` are truncated
    /// with it and stop being pending; resolving their handles afterwards is an error.
    pub fn rollback(&mut self, mark: usize) -> Result<(), WriterError> {
        if mark > self.buffer.len() {
            return Err(WriterError::TargetOutOfRange {
                target: mark,
                len: self.buffer.len(),
            });
        }
        self.pending.retain(|&p| p + OFFSET_SLOT_SIZE <= mark);
        self.buffer.truncate(mark);
        Ok(())
    }

    /// Consumes the writer and returns the finished buffer.
    pub fn finish(self) -> Result<Vec<u8>, WriterError> {
        if !self.pending.is_empty() {
            return Err(WriterError::UnresolvedPatches(self.pending.len()));
        }
        Ok(self.buffer)
    }
}
