/// Errors reported by the host kernel to the driver, and by the driver back
/// through the device-node I/O surface.
///
/// Every variant maps onto a negative errno via [`HostError::errno`], which is
/// what the module loader and user-level callers ultimately see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// No dynamic major number is left to hand out.
    #[error("no free major number for {name}")]
    MajorsExhausted { name: String },

    /// A class or device node with the same name is already registered.
    #[error("{kind} {name:?} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    /// The path does not resolve to a registered device node.
    #[error("no such device: {0}")]
    NoDevice(String),

    /// A copy to or from caller memory failed.
    #[error("bad address ({not_copied} bytes not copied)")]
    Fault { not_copied: usize },

    /// Any other failure, carried as a raw errno.
    #[error("host kernel error (errno {0})")]
    Errno(i32),
}

impl HostError {
    /// Build an error from a (positive or negative) errno value.
    pub fn from_errno(errno: i32) -> Self {
        let errno = errno.abs();
        match errno {
            libc::EFAULT => HostError::Fault { not_copied: 0 },
            libc::ENOENT => HostError::NoDevice(String::new()),
            other => HostError::Errno(other),
        }
    }

    /// The negative errno the kernel would return for this error.
    pub fn errno(&self) -> i32 {
        let positive = match self {
            HostError::MajorsExhausted { .. } => libc::EBUSY,
            HostError::AlreadyExists { .. } => libc::EEXIST,
            HostError::NoDevice(_) => libc::ENOENT,
            HostError::Fault { .. } => libc::EFAULT,
            HostError::Errno(errno) => *errno,
        };
        -positive
    }
}

pub type Result<T> = std::result::Result<T, HostError>;
