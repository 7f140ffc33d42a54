//! Host kernel surface for the chardev driver.
//!
//! The driver never talks to a kernel directly. It consumes:
//! - the character-device registration API ([`HostKernel`]),
//! - caller memory through [`UserSlice`],
//!
//! and exposes its device-node I/O entry points as [`FileOperations`].
//!
//! [`sim::SimKernel`] is an in-memory implementation of the host used by the
//! CLI and the tests.

pub mod error;
pub mod handle;
pub mod sim;
pub mod traits;
pub mod uaccess;

pub use error::{HostError, Result};
pub use handle::{ClassHandle, DeviceNumber, Major, NodeHandle};
pub use sim::{FaultPlan, HostCall, HostStep, OpenFile, SimConfig, SimKernel};
pub use traits::{FileOperations, HostKernel};
pub use uaccess::{CopyFault, UserBuffer, UserSlice};
