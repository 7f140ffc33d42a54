use std::sync::Arc;

use chardev::ChardevModule;
use chardev_host::{OpenFile, SimKernel, UserBuffer};
use chardev_registrar::DeviceConfig;
use tracing::debug;

use crate::cmd::ExchangeArgs;
use crate::exit::{host_error, registration_error, CliResult, SUCCESS};
use crate::output::{print_exchange, OutputFormat, RoundTrip};

pub fn run(args: ExchangeArgs, config: &DeviceConfig, format: OutputFormat) -> CliResult<i32> {
    let kernel = Arc::new(SimKernel::new());
    let module = ChardevModule::load(kernel.clone(), config)
        .map_err(|err| registration_error("load failed", err))?;

    let outcome = kernel
        .open(module.device_path())
        .map_err(|err| host_error("open failed", err))
        .and_then(|file| session(file, &args));

    let devt = module.devt().to_string();
    let opens = module.exchange().open_count();
    let device = module.device_path().to_string();
    module.unload();

    let rounds = outcome?;
    print_exchange(&device, devt, opens, &rounds, format);
    Ok(SUCCESS)
}

fn session(mut file: OpenFile, args: &ExchangeArgs) -> CliResult<Vec<RoundTrip>> {
    let mut rounds = Vec::with_capacity(args.messages.len());
    for message in &args.messages {
        let written = file
            .write(message.as_bytes())
            .map_err(|err| host_error("write failed", err))?;

        let mut buf = UserBuffer::new(args.buffer_size);
        let received_len = file
            .read(&mut buf)
            .map_err(|err| host_error("read failed", err))?;
        let received = String::from_utf8_lossy(&buf.filled()[..received_len]).into_owned();

        let reread_len = if args.reread {
            let mut again = UserBuffer::new(args.buffer_size);
            Some(
                file.read(&mut again)
                    .map_err(|err| host_error("read failed", err))?,
            )
        } else {
            None
        };

        debug!(written, received_len, "round trip complete");
        rounds.push(RoundTrip {
            sent: message.clone(),
            written,
            received,
            received_len,
            reread_len,
        });
    }

    file.close().map_err(|err| host_error("close failed", err))?;
    Ok(rounds)
}
