/// A reserved 4-byte offset slot waiting to be patched.
///
/// Handles are deliberately neither `Clone` nor `Copy`: resolving consumes the handle, so a
/// slot can be patched exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reserved slot must be resolved before the buffer is finished"]
pub struct PatchHandle {
    position: usize,
}

impl PatchHandle {
    pub(super) fn new(position: usize) -> Self {
        Self { position }
    }

    /// Absolute position of the slot inside the buffer.
    pub fn position(&self) -> usize {
        self.position
    }
}
