use anyhow::{bail, Context as _};
use colored::Colorize;
use lpc32xx_init::{clocks::ClockTree, ScriptKind};

use super::Context;

#[derive(clap::Parser)]
pub struct Cmd {
    /// The target script to take the bring-up from, instead of the configured one
    #[clap(long)]
    script: Option<ScriptKind>,

    /// Read back and print the resulting clocks
    #[clap(long)]
    clocks: bool,
}

impl Cmd {
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let script = self
            .script
            .unwrap_or(context.config.general.script)
            .create();

        if script.memory_sequence().is_none() {
            bail!("The {} script does not bring up memory", script.name());
        }

        let mut target = context.open_target()?;

        script
            .init_memory(target.interface())
            .context("DDR bring-up failed")?;

        if self.clocks && !target.is_dry_run() {
            let clocks = ClockTree::read(target.interface(), context.config.board.oscillator_hz)?;
            println!("{clocks}");
        }

        let dry_run = target.is_dry_run();
        target.finish();

        if !dry_run {
            println!("{} DDR initialized", "Done".green().bold());
        }

        Ok(())
    }
}
