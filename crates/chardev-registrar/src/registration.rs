use std::sync::Arc;

use chardev_host::{ClassHandle, DeviceNumber, FileOperations, HostKernel, Major, NodeHandle};
use tracing::{debug, error, info};

use crate::error::{RegistrationError, Result};
use crate::guard::Rollback;

/// Default device name; the node appears as `/dev/chardev`.
pub const DEFAULT_DEVICE_NAME: &str = "chardev";
/// Default device class name.
pub const DEFAULT_CLASS_NAME: &str = "chard";
/// Minor number of the single device node.
pub const DEVICE_MINOR: u32 = 0;

/// Names the device is registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub device_name: String,
    pub class_name: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            class_name: DEFAULT_CLASS_NAME.to_string(),
        }
    }
}

impl DeviceConfig {
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = name.into();
        self
    }

    /// Path of the device node once registered.
    pub fn device_path(&self) -> String {
        format!("/dev/{}", self.device_name)
    }
}

struct Parts {
    major: Major,
    class: ClassHandle,
    node: NodeHandle,
}

/// The three host resources backing the device: major number, class and
/// device node.
///
/// Only [`Registration::initialize`] creates one, and only when all three
/// were acquired. Teardown happens once, either through
/// [`Registration::teardown`] or on drop.
pub struct Registration<H: HostKernel + ?Sized> {
    host: Arc<H>,
    parts: Option<Parts>,
}

impl<H: HostKernel + ?Sized> Registration<H> {
    /// Acquire major number, class and device node, in that order.
    ///
    /// On failure, everything acquired so far is released in reverse order
    /// before the error is returned.
    pub fn initialize(
        host: &Arc<H>,
        config: &DeviceConfig,
        fops: Arc<dyn FileOperations>,
    ) -> Result<Self> {
        let device = config.device_name.as_str();
        let class_name = config.class_name.as_str();

        let major = host.allocate_major(device, fops).map_err(|source| {
            error!(device, %source, "failed to register a major number");
            RegistrationError::AllocationExhausted {
                device: device.to_string(),
                source,
            }
        })?;
        info!(device, major = major.number(), "registered with major number");
        let major = Rollback::new(major, |major| {
            debug!(major = major.number(), "rolling back major number");
            host.release_major(major);
        });

        let class = host.create_class(class_name).map_err(|source| {
            error!(class = class_name, %source, "failed to register device class");
            RegistrationError::ClassRegistrationFailed {
                class: class_name.to_string(),
                source,
            }
        })?;
        info!(class = class_name, "device class registered");
        let class = Rollback::new(class, |class| {
            debug!(class = class.name(), "rolling back device class");
            host.unregister_class(class);
        });

        let devt = DeviceNumber::new(major.get().number(), DEVICE_MINOR);
        let node = host
            .create_device_node(class.get(), devt, device)
            .map_err(|source| {
                error!(device, %devt, %source, "failed to create the device node");
                RegistrationError::NodeCreationFailed {
                    device: device.to_string(),
                    source,
                }
            })?;
        info!(path = %node.path(), %devt, "device node created");

        Ok(Self {
            host: Arc::clone(host),
            parts: Some(Parts {
                major: major.commit(),
                class: class.commit(),
                node,
            }),
        })
    }

    pub fn major(&self) -> Option<u32> {
        self.parts.as_ref().map(|p| p.major.number())
    }

    pub fn devt(&self) -> Option<DeviceNumber> {
        self.parts.as_ref().map(|p| p.node.devt())
    }

    pub fn device_path(&self) -> Option<String> {
        self.parts.as_ref().map(|p| p.node.path())
    }

    pub fn class_name(&self) -> Option<&str> {
        self.parts.as_ref().map(|p| p.class.name())
    }

    /// Destroy the device node, unregister the class, release the major.
    pub fn teardown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(Parts { major, class, node }) = self.parts.take() else {
            return;
        };
        let path = node.path();
        self.host.destroy_device_node(&class, node);
        self.host.unregister_class(class);
        let number = major.number();
        self.host.release_major(major);
        info!(%path, major = number, "device unregistered");
    }
}

impl<H: HostKernel + ?Sized> Drop for Registration<H> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<H: HostKernel + ?Sized> std::fmt::Debug for Registration<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("major", &self.major())
            .field("device_path", &self.device_path())
            .finish()
    }
}
