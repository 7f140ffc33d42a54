//! The message slot and the stored form of a write.

use std::fmt::Write as _;

use bytes::{Bytes, BytesMut};

/// Capacity of the message slot, in bytes.
pub const SLOT_CAPACITY: usize = 256;

/// Stored form of a write: the caller's bytes followed by ` (<n> letters)`,
/// where `<n>` is the number of bytes supplied, cut to [`SLOT_CAPACITY`].
pub fn compose(input: &[u8]) -> Bytes {
    if input.len() >= SLOT_CAPACITY {
        return Bytes::copy_from_slice(&input[..SLOT_CAPACITY]);
    }

    let mut out = BytesMut::with_capacity(SLOT_CAPACITY);
    out.extend_from_slice(input);
    // fmt::Write for BytesMut only grows the buffer.
    let _ = write!(out, " ({} letters)", input.len());
    out.truncate(SLOT_CAPACITY);
    out.freeze()
}

/// Fixed-capacity buffer holding the most recent write until it is read.
///
/// `len` counts the leading bytes of `buf` that are pending; it never exceeds
/// [`SLOT_CAPACITY`].
#[derive(Clone)]
pub struct MessageSlot {
    buf: [u8; SLOT_CAPACITY],
    len: usize,
}

impl Default for MessageSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSlot {
    pub const fn new() -> Self {
        Self {
            buf: [0; SLOT_CAPACITY],
            len: 0,
        }
    }

    /// Replace the pending message with the stored form of `input`.
    ///
    /// Returns the number of bytes now pending.
    pub fn store(&mut self, input: &[u8]) -> usize {
        let message = compose(input);
        self.buf[..message.len()].copy_from_slice(&message);
        self.len = message.len();
        self.len
    }

    /// The pending bytes.
    pub fn pending(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark the slot drained.
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl std::fmt::Debug for MessageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSlot")
            .field("len", &self.len)
            .field("pending", &String::from_utf8_lossy(self.pending()))
            .finish()
    }
}
