//! Single-slot message exchange behind the chardev device node.
//!
//! Every caller shares one 256-byte slot:
//! - a write replaces the slot with the caller's bytes plus a
//!   ` (<n> letters)` annotation, cut to capacity,
//! - a read copies the pending message out and drains the slot,
//! - open and release only count and log.
//!
//! [`MessageExchange`] implements [`chardev_host::FileOperations`] so it can
//! be bound to a major number directly.

pub mod error;
pub mod exchange;
pub mod slot;

pub use error::{ExchangeError, Result};
pub use exchange::MessageExchange;
pub use slot::{compose, MessageSlot, SLOT_CAPACITY};
