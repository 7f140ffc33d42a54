use std::sync::Arc;

use crate::error::Result;
use crate::handle::{ClassHandle, DeviceNumber, Major, NodeHandle};
use crate::uaccess::UserSlice;

/// The I/O entry points a driver exposes through its device node.
///
/// The host invokes these from any caller thread, concurrently. `pos` is the
/// caller's opaque position cursor; drivers that do not seek leave it alone.
pub trait FileOperations: Send + Sync {
    /// Called for every open of the device node.
    fn open(&self) -> Result<()>;

    /// Copy pending data into `buf`; `buf.len()` is the requested length.
    fn read(&self, buf: &mut dyn UserSlice, pos: &mut i64) -> Result<usize>;

    /// Accept `data` from the caller and return how many bytes were taken.
    fn write(&self, data: &[u8], pos: &mut i64) -> Result<usize>;

    /// Called once when an open file is closed.
    fn release(&self) -> Result<()>;
}

/// Character-device registration API of the host kernel.
///
/// Acquisition calls return owned handles; the matching release calls consume
/// them and cannot fail.
pub trait HostKernel: Send + Sync {
    /// Dynamically allocate a major number and bind `fops` to it.
    fn allocate_major(&self, name: &str, fops: Arc<dyn FileOperations>) -> Result<Major>;

    /// Register a device class.
    fn create_class(&self, name: &str) -> Result<ClassHandle>;

    /// Create the device node `name` for `devt` under `class`.
    fn create_device_node(
        &self,
        class: &ClassHandle,
        devt: DeviceNumber,
        name: &str,
    ) -> Result<NodeHandle>;

    fn destroy_device_node(&self, class: &ClassHandle, node: NodeHandle);

    fn unregister_class(&self, class: ClassHandle);

    fn release_major(&self, major: Major);
}
