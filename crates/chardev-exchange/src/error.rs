use chardev_host::HostError;

/// Errors reported to callers of the exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    /// The pending message could not be copied to the caller's buffer.
    /// The message stays pending.
    #[error("bad address: {not_copied} of {pending} pending bytes could not be copied")]
    Fault { pending: usize, not_copied: usize },
}

impl ExchangeError {
    /// Negative errno returned through the device node.
    pub fn errno(&self) -> i32 {
        match self {
            ExchangeError::Fault { .. } => -libc::EFAULT,
        }
    }
}

impl From<ExchangeError> for HostError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::Fault { not_copied, .. } => HostError::Fault { not_copied },
        }
    }
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
