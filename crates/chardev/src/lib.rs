//! Single-slot message character device driver.
//!
//! chardev exposes one device node through which callers exchange a short
//! text message with the kernel: a write stores the message together with
//! its length, the next read returns it and empties the slot.
//!
//! # Crate Structure
//!
//! - [`host`]: Host kernel surface and the simulated kernel
//! - [`registrar`]: Ordered registration and teardown of the device
//! - [`exchange`]: The message slot and its file operations
//! - [`driver`]: Module load/unload tying the two together

/// Re-export host types.
pub mod host {
    pub use chardev_host::*;
}

/// Re-export registrar types.
pub mod registrar {
    pub use chardev_registrar::*;
}

/// Re-export exchange types.
pub mod exchange {
    pub use chardev_exchange::*;
}

pub mod driver;

pub use driver::ChardevModule;
