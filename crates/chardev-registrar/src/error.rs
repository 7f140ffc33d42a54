use chardev_host::HostError;

/// Errors that abort device registration.
///
/// Each variant names the step that failed. Resources acquired by earlier
/// steps have already been released when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// No major number could be allocated for the device.
    #[error("failed to register a major number for {device}: {source}")]
    AllocationExhausted { device: String, source: HostError },

    /// The device class could not be registered.
    #[error("failed to register device class {class}: {source}")]
    ClassRegistrationFailed { class: String, source: HostError },

    /// The device node could not be created.
    #[error("failed to create device node {device}: {source}")]
    NodeCreationFailed { device: String, source: HostError },
}

impl RegistrationError {
    /// The host error behind this failure.
    pub fn host_error(&self) -> &HostError {
        match self {
            RegistrationError::AllocationExhausted { source, .. }
            | RegistrationError::ClassRegistrationFailed { source, .. }
            | RegistrationError::NodeCreationFailed { source, .. } => source,
        }
    }

    /// Negative errno handed to the module loader.
    pub fn errno(&self) -> i32 {
        self.host_error().errno()
    }
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
