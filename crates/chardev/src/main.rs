mod cmd;
mod exit;
mod logging;
mod output;

use chardev_registrar::{DeviceConfig, DEFAULT_CLASS_NAME, DEFAULT_DEVICE_NAME};
use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "chardev",
    version,
    about = "Single-slot message character device on a simulated host kernel"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Name the device registers under; the node is /dev/<NAME>.
    #[arg(
        long,
        value_name = "NAME",
        env = "CHARDEV_DEVICE_NAME",
        default_value = DEFAULT_DEVICE_NAME,
        global = true
    )]
    device_name: String,

    /// Device class name.
    #[arg(
        long,
        value_name = "NAME",
        env = "CHARDEV_CLASS_NAME",
        default_value = DEFAULT_CLASS_NAME,
        global = true
    )]
    class_name: String,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn device_config(&self) -> DeviceConfig {
        DeviceConfig::default()
            .with_device_name(self.device_name.clone())
            .with_class_name(self.class_name.clone())
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let config = cli.device_config();
    let result = cmd::run(cli.command, &config, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exchange_subcommand() {
        let cli = Cli::try_parse_from(["chardev", "exchange", "hello", "world"])
            .expect("exchange args should parse");

        match cli.command {
            Command::Exchange(args) => assert_eq!(args.messages, ["hello", "world"]),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.device_name, DEFAULT_DEVICE_NAME);
        assert_eq!(cli.class_name, DEFAULT_CLASS_NAME);
    }

    #[test]
    fn exchange_requires_a_message() {
        let err = Cli::try_parse_from(["chardev", "exchange"])
            .expect_err("missing message should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_lifecycle_fault() {
        let cli = Cli::try_parse_from(["chardev", "lifecycle", "--fail-at", "node"])
            .expect("lifecycle args should parse");
        match cli.command {
            Command::Lifecycle(args) => {
                assert_eq!(args.fail_at, Some(cmd::FailAt::Node));
                assert_eq!(args.errno, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_fault_step() {
        let err = Cli::try_parse_from(["chardev", "lifecycle", "--fail-at", "open"])
            .expect_err("unknown step should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn names_are_global_flags() {
        let cli = Cli::try_parse_from([
            "chardev",
            "lifecycle",
            "--device-name",
            "mydev",
            "--class-name",
            "mycls",
        ])
        .expect("global flags should parse after the subcommand");

        let config = cli.device_config();
        assert_eq!(config.device_name, "mydev");
        assert_eq!(config.class_name, "mycls");
        assert_eq!(config.device_path(), "/dev/mydev");
    }
}
