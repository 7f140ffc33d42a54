use chardev_exchange::SLOT_CAPACITY;
use chardev_registrar::{DEFAULT_CLASS_NAME, DEFAULT_DEVICE_NAME};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("chardev {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: chardev");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("CHARDEV_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("CHARDEV_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("default_device: /dev/{DEFAULT_DEVICE_NAME}");
    println!("default_class: {DEFAULT_CLASS_NAME}");
    println!("slot_capacity: {SLOT_CAPACITY}");
    println!("host: simulated");

    Ok(SUCCESS)
}
