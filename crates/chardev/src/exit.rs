use std::fmt;

use chardev_host::HostError;
use chardev_registrar::RegistrationError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const REGISTRATION_FAILED: i32 = 3;
pub const NO_DEVICE: i32 = 4;
pub const BAD_ADDRESS: i32 = 14;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn host_error(context: &str, err: HostError) -> CliError {
    let code = match &err {
        HostError::Fault { .. } => BAD_ADDRESS,
        HostError::NoDevice(_) => NO_DEVICE,
        HostError::MajorsExhausted { .. } | HostError::AlreadyExists { .. } => FAILURE,
        HostError::Errno(_) => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err} (errno {})", err.errno()))
}

pub fn registration_error(context: &str, err: RegistrationError) -> CliError {
    CliError::new(
        REGISTRATION_FAILED,
        format!("{context}: {err} (errno {})", err.errno()),
    )
}
