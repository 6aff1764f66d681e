mod cmd;
mod config;
mod openocd;
mod util;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Parser;

use crate::cmd::Context;
use crate::config::Configs;
use crate::util::logging::{setup_logging, LevelFilter};

#[derive(clap::Parser)]
#[clap(
    name = "lpc32xx-init",
    about = "Brings LPC32xx boards into a known state through OpenOCD",
    version
)]
struct Cli {
    /// Config file merged over `lpc32xx-init.toml` and `.lpc32xx-init.toml`
    #[clap(long, global = true, value_name = "PATH", help_heading = "CONFIGURATION")]
    config: Option<PathBuf>,

    /// Log level, overrides the config file and `RUST_LOG`
    #[clap(long, global = true, value_enum, help_heading = "LOG CONFIGURATION")]
    log_level: Option<LevelFilter>,
    /// Also write every log record as JSON to this file
    #[clap(long, global = true, help_heading = "LOG CONFIGURATION")]
    log_file: Option<PathBuf>,

    /// Print the accesses instead of sending them to OpenOCD
    #[clap(long, global = true)]
    dry_run: bool,

    /// Host of the OpenOCD TCL-RPC server
    #[clap(long, global = true, help_heading = "OPENOCD CONFIGURATION")]
    host: Option<String>,
    /// Port of the OpenOCD TCL-RPC server
    #[clap(long, global = true, help_heading = "OPENOCD CONFIGURATION")]
    port: Option<u16>,

    #[clap(subcommand)]
    subcommand: Subcommand,
}

impl Cli {
    fn run(self, context: &Context) -> Result<()> {
        match self.subcommand {
            Subcommand::Reset(cmd) => cmd.run(context),
            Subcommand::InitDdr(cmd) => cmd.run(context),
            Subcommand::Clocks(cmd) => cmd.run(context),
            Subcommand::Memtest(cmd) => cmd.run(context),
            Subcommand::DqsSweep(cmd) => cmd.run(context),
            Subcommand::Steps(cmd) => cmd.run(context),
        }
    }
}

#[derive(clap::Subcommand)]
enum Subcommand {
    /// Reset and halt the target, then run the bring-up of the script
    Reset(cmd::reset::Cmd),
    /// Run only the DDR bring-up, without resetting the core
    InitDdr(cmd::init_ddr::Cmd),
    /// Read the clock registers and print the resulting frequencies
    Clocks(cmd::clocks::Cmd),
    /// Write and verify patterns in DDR
    Memtest(cmd::memtest::Cmd),
    /// Sweep the DQSIN delay and program the middle of the working range
    DqsSweep(cmd::dqs_sweep::Cmd),
    /// List the accesses a script issues
    Steps(cmd::steps::Cmd),
}

fn main() -> Result<()> {
    let matches = Cli::parse();

    let mut configs = Configs::new(Path::new("."));
    if let Some(path) = &matches.config {
        configs.merge(path.clone())?;
    }
    let mut config = configs
        .extract()
        .context("Failed to load configuration.")?;

    if let Some(host) = &matches.host {
        config.openocd.host = host.clone();
    }
    if let Some(port) = matches.port {
        config.openocd.port = port;
    }

    let log_path = matches.log_file.clone();
    let _logger_guard = setup_logging(
        log_path.as_deref(),
        matches.log_level.or(config.general.log_level),
    )?;

    let context = Context {
        config,
        dry_run: matches.dry_run,
    };

    matches.run(&context)
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::Cli;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }
}
