pub mod clocks;
pub mod dqs_sweep;
pub mod init_ddr;
pub mod memtest;
pub mod reset;
pub mod steps;

use anyhow::Context as _;
use lpc32xx_init::{RecordingInterface, TargetInterface};

use crate::{config::Config, openocd::OpenOcdInterface};

/// Everything a subcommand needs besides its own arguments.
pub struct Context {
    pub config: Config,
    pub dry_run: bool,
}

impl Context {
    /// Connect to the target, or to a recorder for dry runs.
    pub fn open_target(&self) -> anyhow::Result<Target> {
        if self.dry_run {
            tracing::info!("Dry run, no target is accessed");
            return Ok(Target::DryRun(RecordingInterface::new()));
        }

        let openocd = &self.config.openocd;
        let interface = OpenOcdInterface::connect(&openocd.host, openocd.port, openocd.timeout)
            .context("Failed to open the OpenOCD TCL-RPC connection")?;

        Ok(Target::OpenOcd(interface))
    }
}

/// The interface commands run against.
pub enum Target {
    OpenOcd(OpenOcdInterface),
    DryRun(RecordingInterface),
}

impl Target {
    pub fn interface(&mut self) -> &mut dyn TargetInterface {
        match self {
            Target::OpenOcd(interface) => interface,
            Target::DryRun(interface) => interface,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Target::DryRun(_))
    }

    /// Print what a dry run would have sent.
    pub fn finish(self) {
        if let Target::DryRun(recorder) = self {
            for operation in recorder.operations() {
                println!("{operation}");
            }
        }
    }
}
