//! Module load and unload.

use std::sync::Arc;

use chardev_exchange::MessageExchange;
use chardev_host::{DeviceNumber, FileOperations, HostKernel};
use chardev_registrar::{DeviceConfig, Registration, RegistrationError, DEVICE_MINOR};
use tracing::info;

/// A loaded chardev module: the exchange state and the registration that
/// makes it reachable.
///
/// The exchange is created at load and lives until the module is unloaded;
/// the host holds a second reference for as long as the major is registered.
pub struct ChardevModule<H: HostKernel + ?Sized> {
    exchange: Arc<MessageExchange>,
    registration: Registration<H>,
    devt: DeviceNumber,
    device_path: String,
}

impl<H: HostKernel + ?Sized> ChardevModule<H> {
    /// Create the exchange state and register the device with `host`.
    ///
    /// On error nothing stays registered; [`RegistrationError::errno`] is the
    /// value the module loader reports.
    pub fn load(host: Arc<H>, config: &DeviceConfig) -> Result<Self, RegistrationError> {
        info!(device = %config.device_name, "initializing the chardev module");

        let exchange = Arc::new(MessageExchange::new());
        let fops: Arc<dyn FileOperations> = exchange.clone();
        let registration = Registration::initialize(&host, config, fops)?;

        let major = registration.major().unwrap_or_default();
        Ok(Self {
            exchange,
            registration,
            devt: DeviceNumber::new(major, DEVICE_MINOR),
            device_path: config.device_path(),
        })
    }

    /// Tear the device down and drop the exchange state.
    pub fn unload(self) {
        let Self {
            registration,
            device_path,
            ..
        } = self;
        registration.teardown();
        info!(path = %device_path, "goodbye from the chardev module");
    }

    pub fn exchange(&self) -> &MessageExchange {
        &self.exchange
    }

    pub fn devt(&self) -> DeviceNumber {
        self.devt
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

impl<H: HostKernel + ?Sized> std::fmt::Debug for ChardevModule<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChardevModule")
            .field("devt", &self.devt)
            .field("device_path", &self.device_path)
            .field("registration", &self.registration)
            .finish()
    }
}
