use chardev_exchange::SLOT_CAPACITY;
use chardev_host::HostStep;
use chardev_registrar::DeviceConfig;
use clap::{Args, Subcommand, ValueEnum};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod exchange;
pub mod lifecycle;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the driver, write and read back each message, then unload.
    Exchange(ExchangeArgs),
    /// Load and unload the driver and print every host call made.
    Lifecycle(LifecycleArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, config: &DeviceConfig, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Exchange(args) => exchange::run(args, config, format),
        Command::Lifecycle(args) => lifecycle::run(args, config, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ExchangeArgs {
    /// Messages to write, one round trip each.
    #[arg(required = true)]
    pub messages: Vec<String>,
    /// Size of the destination buffer handed to read.
    #[arg(long, value_name = "BYTES", default_value_t = SLOT_CAPACITY)]
    pub buffer_size: usize,
    /// Read a second time after each round trip to show the slot is drained.
    #[arg(long)]
    pub reread: bool,
}

/// Registration step to fail during load.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FailAt {
    Allocate,
    Class,
    Node,
}

impl FailAt {
    pub fn step(self) -> HostStep {
        match self {
            FailAt::Allocate => HostStep::AllocateMajor,
            FailAt::Class => HostStep::CreateClass,
            FailAt::Node => HostStep::CreateDeviceNode,
        }
    }

    /// Errno the host reports when no explicit one is given.
    pub fn default_errno(self) -> i32 {
        match self {
            FailAt::Allocate => libc::EBUSY,
            FailAt::Class | FailAt::Node => libc::ENOMEM,
        }
    }
}

#[derive(Args, Debug)]
pub struct LifecycleArgs {
    /// Make the host fail this step of the load.
    #[arg(long, value_name = "STEP")]
    pub fail_at: Option<FailAt>,
    /// Positive errno for the injected failure.
    #[arg(long, requires = "fail_at")]
    pub errno: Option<i32>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
