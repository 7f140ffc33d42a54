//! Ordered acquisition and teardown of the chardev host resources.
//!
//! Registration takes three steps, each feeding the next:
//! 1. allocate a dynamic major number (binding the device's file operations),
//! 2. register the device class,
//! 3. create the device node `(major, 0)` under that class.
//!
//! Either all three succeed and a [`Registration`] is returned, or whatever
//! was acquired is released in reverse order and a [`RegistrationError`]
//! names the failing step.

mod guard;

pub mod error;
pub mod registration;

pub use error::{RegistrationError, Result};
pub use registration::{
    DeviceConfig, Registration, DEFAULT_CLASS_NAME, DEFAULT_DEVICE_NAME, DEVICE_MINOR,
};
