use std::sync::Arc;

use chardev::ChardevModule;
use chardev_host::{FaultPlan, SimKernel};
use chardev_registrar::DeviceConfig;

use crate::cmd::LifecycleArgs;
use crate::exit::{registration_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_lifecycle, JournalEntry, LifecycleReport, OutputFormat};

pub fn run(args: LifecycleArgs, config: &DeviceConfig, format: OutputFormat) -> CliResult<i32> {
    let mut plan = FaultPlan::new();
    if let Some(fail_at) = args.fail_at {
        let errno = args.errno.unwrap_or_else(|| fail_at.default_errno());
        if errno <= 0 {
            return Err(CliError::new(
                USAGE,
                format!("--errno must be a positive errno value, got {errno}"),
            ));
        }
        plan = plan.fail_next(fail_at.step(), errno);
    }

    let kernel = Arc::new(SimKernel::new().with_faults(plan));
    let loaded = ChardevModule::load(kernel.clone(), config);

    let (major, failure) = match loaded {
        Ok(module) => {
            let major = module.devt().major;
            module.unload();
            (Some(major), None)
        }
        Err(err) => (None, Some(err)),
    };

    let leaked = kernel.registered_majors().len()
        + kernel.class_names().len()
        + kernel.device_nodes().len();

    let report = LifecycleReport {
        loaded: major.is_some(),
        major,
        error: failure.as_ref().map(ToString::to_string),
        errno: failure.as_ref().map(|err| err.errno()),
        leaked,
        journal: kernel.journal().iter().map(JournalEntry::from).collect(),
    };
    print_lifecycle(&report, format);

    if let Some(err) = failure {
        return Err(registration_error("load failed", err));
    }
    if leaked > 0 {
        return Err(CliError::new(
            FAILURE,
            format!("{leaked} host resource(s) still registered after unload"),
        ));
    }
    Ok(SUCCESS)
}
