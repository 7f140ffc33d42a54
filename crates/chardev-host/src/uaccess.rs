//! Copies between driver memory and caller-supplied buffers.

use bytes::BytesMut;

/// A failed copy to caller memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyFault {
    /// Bytes that could not be copied.
    pub not_copied: usize,
}

/// Caller-supplied destination of a read.
///
/// A copy either lands completely or faults; on fault the destination must be
/// left as it was.
pub trait UserSlice {
    /// Requested length, in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `src` to the start of the destination.
    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), CopyFault>;
}

impl UserSlice for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), CopyFault> {
        if src.len() > <[u8]>::len(self) {
            return Err(CopyFault {
                not_copied: src.len() - <[u8]>::len(self),
            });
        }
        self[..src.len()].copy_from_slice(src);
        Ok(())
    }
}

impl<const N: usize> UserSlice for [u8; N] {
    fn len(&self) -> usize {
        N
    }

    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), CopyFault> {
        self.as_mut_slice().copy_to_user(src)
    }
}

/// Simulated caller memory for reads.
///
/// Holds up to `capacity` bytes. An inaccessible buffer stands in for a bad
/// user pointer: every non-empty copy into it faults.
#[derive(Debug, Clone)]
pub struct UserBuffer {
    data: BytesMut,
    capacity: usize,
    accessible: bool,
}

impl UserBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            capacity,
            accessible: true,
        }
    }

    /// A buffer whose memory cannot be written.
    pub fn inaccessible(capacity: usize) -> Self {
        Self {
            accessible: false,
            ..Self::new(capacity)
        }
    }

    /// Bytes written by the last successful copy.
    pub fn filled(&self) -> &[u8] {
        &self.data
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl UserSlice for UserBuffer {
    fn len(&self) -> usize {
        self.capacity
    }

    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), CopyFault> {
        if !self.accessible && !src.is_empty() {
            return Err(CopyFault {
                not_copied: src.len(),
            });
        }
        if src.len() > self.capacity {
            return Err(CopyFault {
                not_copied: src.len() - self.capacity,
            });
        }
        self.data.clear();
        self.data.extend_from_slice(src);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_copy_fits() {
        let mut dest = [0u8; 8];
        dest.copy_to_user(b"abc").unwrap();
        assert_eq!(&dest[..3], b"abc");
        assert_eq!(&dest[3..], &[0u8; 5]);
    }

    #[test]
    fn slice_copy_too_long_faults_untouched() {
        let mut dest = [7u8; 2];
        let fault = dest.as_mut_slice().copy_to_user(b"abcde").unwrap_err();
        assert_eq!(fault.not_copied, 3);
        assert_eq!(dest, [7u8; 2]);
    }

    #[test]
    fn inaccessible_buffer_faults() {
        let mut dest = UserBuffer::inaccessible(64);
        let fault = dest.copy_to_user(b"hello").unwrap_err();
        assert_eq!(fault.not_copied, 5);
        assert!(dest.filled().is_empty());

        // Nothing to copy, nothing to fault on.
        dest.copy_to_user(b"").unwrap();
    }

    #[test]
    fn user_buffer_replaces_previous_content() {
        let mut dest = UserBuffer::new(16);
        dest.copy_to_user(b"first").unwrap();
        dest.copy_to_user(b"2nd").unwrap();
        assert_eq!(dest.filled(), b"2nd");
        assert_eq!(dest.capacity(), 16);
    }
}
