use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chardev_host::{FileOperations, UserSlice};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ExchangeError, Result};
use crate::slot::MessageSlot;

/// Driver state behind the device node: one message slot shared by every
/// caller, plus a count of opens.
///
/// Reads and writes take the slot lock for their whole transition, so a
/// read always sees one complete write and concurrent writes never mix.
#[derive(Debug, Default)]
pub struct MessageExchange {
    slot: Mutex<MessageSlot>,
    opens: AtomicU64,
}

impl MessageExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an open. Any number of callers may hold the device open.
    ///
    /// Returns the number of opens so far, including this one.
    pub fn open(&self) -> u64 {
        let opens = self.opens.fetch_add(1, Ordering::Relaxed) + 1;
        info!(opens, "device has been opened");
        opens
    }

    /// Copy the pending message into `dest` and drain the slot.
    ///
    /// Returns the number of bytes copied; zero when nothing is pending. If
    /// the copy faults the message stays pending.
    pub fn read_into(&self, dest: &mut dyn UserSlice) -> Result<usize> {
        let mut slot = self.slot.lock();
        let pending = slot.len();
        match dest.copy_to_user(slot.pending()) {
            Ok(()) => {
                slot.clear();
                info!(sent = pending, "sent characters to the user");
                Ok(pending)
            }
            Err(fault) => {
                warn!(
                    pending,
                    requested = dest.len(),
                    not_copied = fault.not_copied,
                    "failed to send characters to the user"
                );
                Err(ExchangeError::Fault {
                    pending,
                    not_copied: fault.not_copied,
                })
            }
        }
    }

    /// Store `input` followed by its length annotation, replacing whatever
    /// was pending.
    ///
    /// Always returns `input.len()`, even when the stored message had to be
    /// cut to the slot capacity.
    pub fn write(&self, input: &[u8]) -> usize {
        let stored = self.slot.lock().store(input);
        info!(received = input.len(), stored, "received characters from the user");
        if stored < input.len() {
            debug!(dropped = input.len() - stored, "message truncated to slot capacity");
        }
        input.len()
    }

    pub fn release(&self) {
        info!("device successfully closed");
    }

    /// Opens recorded since the exchange was created.
    pub fn open_count(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }

    /// Bytes waiting to be read.
    pub fn pending_len(&self) -> usize {
        self.slot.lock().len()
    }

    /// Copy of the pending message; does not drain the slot.
    pub fn peek(&self) -> Bytes {
        Bytes::copy_from_slice(self.slot.lock().pending())
    }
}

impl FileOperations for MessageExchange {
    fn open(&self) -> chardev_host::Result<()> {
        MessageExchange::open(self);
        Ok(())
    }

    fn read(&self, buf: &mut dyn UserSlice, _pos: &mut i64) -> chardev_host::Result<usize> {
        self.read_into(buf).map_err(Into::into)
    }

    fn write(&self, data: &[u8], _pos: &mut i64) -> chardev_host::Result<usize> {
        Ok(MessageExchange::write(self, data))
    }

    fn release(&self) -> chardev_host::Result<()> {
        MessageExchange::release(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chardev_host::{HostError, UserBuffer};

    use super::*;
    use crate::slot::{compose, SLOT_CAPACITY};

    fn read_all(exchange: &MessageExchange) -> Vec<u8> {
        let mut buf = UserBuffer::new(SLOT_CAPACITY);
        exchange.read_into(&mut buf).expect("read should succeed");
        buf.filled().to_vec()
    }

    #[test]
    fn hello_round_trip() {
        let exchange = MessageExchange::new();
        assert_eq!(exchange.write(b"hello"), 5);
        assert_eq!(exchange.pending_len(), 17);
        assert_eq!(exchange.peek().as_ref(), b"hello (5 letters)");

        let mut buf = UserBuffer::new(SLOT_CAPACITY);
        assert_eq!(exchange.read_into(&mut buf).unwrap(), 17);
        assert_eq!(buf.filled(), b"hello (5 letters)");
        assert_eq!(exchange.pending_len(), 0);
    }

    #[test]
    fn read_without_write_is_empty() {
        let exchange = MessageExchange::new();
        let mut buf = UserBuffer::new(SLOT_CAPACITY);
        assert_eq!(exchange.read_into(&mut buf).unwrap(), 0);
        assert!(buf.filled().is_empty());
    }

    #[test]
    fn second_read_is_empty() {
        let exchange = MessageExchange::new();
        exchange.write(b"once");
        assert_eq!(read_all(&exchange), b"once (4 letters)");
        assert!(read_all(&exchange).is_empty());
    }

    #[test]
    fn write_then_read_returns_annotated_input() {
        let exchange = MessageExchange::new();
        for len in [0usize, 1, 9, 10, 99, 100, 241] {
            let input: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
            assert_eq!(exchange.write(&input), len);

            let mut expected = input.clone();
            expected.extend_from_slice(format!(" ({len} letters)").as_bytes());
            assert_eq!(read_all(&exchange), expected, "len {len}");
            assert!(read_all(&exchange).is_empty(), "len {len}");
        }
    }

    #[test]
    fn later_write_replaces_unread_message() {
        let exchange = MessageExchange::new();
        exchange.write(b"first");
        exchange.write(b"second");
        assert_eq!(read_all(&exchange), b"second (6 letters)");
    }

    #[test]
    fn overflow_is_truncated_and_reports_requested_length() {
        let exchange = MessageExchange::new();
        let input = vec![b'z'; 300];
        assert_eq!(exchange.write(&input), 300);
        assert_eq!(exchange.pending_len(), SLOT_CAPACITY);

        let read = read_all(&exchange);
        assert_eq!(read.len(), SLOT_CAPACITY);
        assert_eq!(read.as_slice(), &input[..SLOT_CAPACITY]);
    }

    #[test]
    fn open_counts_every_call() {
        let exchange = MessageExchange::new();
        for n in 1..=5 {
            assert_eq!(exchange.open(), n);
        }
        assert_eq!(exchange.open_count(), 5);
        exchange.release();
        assert_eq!(exchange.open_count(), 5);
    }

    #[test]
    fn open_and_release_leave_slot_alone() {
        let exchange = MessageExchange::new();
        exchange.write(b"kept");
        exchange.open();
        exchange.release();
        assert_eq!(exchange.peek().as_ref(), b"kept (4 letters)");
    }

    #[test]
    fn fault_leaves_message_pending() {
        let exchange = MessageExchange::new();
        exchange.write(b"hello");

        let mut bad = UserBuffer::inaccessible(SLOT_CAPACITY);
        let err = exchange.read_into(&mut bad).unwrap_err();
        assert_eq!(
            err,
            ExchangeError::Fault {
                pending: 17,
                not_copied: 17
            }
        );
        assert_eq!(err.errno(), -libc::EFAULT);
        assert_eq!(exchange.pending_len(), 17);

        // The caller may retry with a good buffer.
        assert_eq!(read_all(&exchange), b"hello (5 letters)");
    }

    #[test]
    fn short_destination_faults() {
        let exchange = MessageExchange::new();
        exchange.write(b"hello");

        let mut small = [0u8; 4];
        let err = exchange.read_into(&mut small).unwrap_err();
        assert!(matches!(err, ExchangeError::Fault { not_copied: 13, .. }));
        assert_eq!(exchange.pending_len(), 17);
    }

    #[test]
    fn file_operations_surface() {
        let exchange = MessageExchange::new();
        let fops: &dyn FileOperations = &exchange;
        let mut pos = 42;

        fops.open().unwrap();
        assert_eq!(fops.write(b"abc", &mut pos).unwrap(), 3);

        let mut bad = UserBuffer::inaccessible(64);
        let err = fops.read(&mut bad, &mut pos).unwrap_err();
        assert_eq!(err, HostError::Fault { not_copied: 15 });
        assert_eq!(err.errno(), -libc::EFAULT);

        let mut buf = UserBuffer::new(64);
        assert_eq!(fops.read(&mut buf, &mut pos).unwrap(), 15);
        assert_eq!(buf.filled(), b"abc (3 letters)");
        fops.release().unwrap();

        assert_eq!(pos, 42, "position is passed through untouched");
        assert_eq!(exchange.open_count(), 1);
    }

    #[test]
    fn concurrent_writes_never_mix() {
        let exchange = Arc::new(MessageExchange::new());
        let a = compose(b"a");
        let bb = compose(b"bb");

        thread::scope(|s| {
            for input in [&b"a"[..], &b"bb"[..]] {
                let exchange = &exchange;
                s.spawn(move || {
                    for _ in 0..500 {
                        exchange.write(input);
                    }
                });
            }
            let exchange = &exchange;
            let (a, bb) = (&a, &bb);
            s.spawn(move || {
                for _ in 0..500 {
                    let got = read_all(exchange);
                    assert!(
                        got.is_empty() || got == a.as_ref() || got == bb.as_ref(),
                        "torn read: {:?}",
                        String::from_utf8_lossy(&got)
                    );
                }
            });
        });

        let last = exchange.peek();
        assert!(last.is_empty() || last == a || last == bb);
    }

    #[test]
    fn concurrent_opens_are_counted() {
        let exchange = Arc::new(MessageExchange::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let exchange = Arc::clone(&exchange);
                thread::spawn(move || {
                    for _ in 0..100 {
                        exchange.open();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("opener should finish");
        }
        assert_eq!(exchange.open_count(), 800);
    }
}
