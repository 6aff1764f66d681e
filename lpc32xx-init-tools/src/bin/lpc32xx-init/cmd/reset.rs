use anyhow::Context as _;
use colored::Colorize;
use lpc32xx_init::ScriptKind;

use super::Context;

#[derive(clap::Parser)]
pub struct Cmd {
    /// The target script to run, instead of the configured one
    #[clap(long)]
    script: Option<ScriptKind>,
}

impl Cmd {
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let script = self
            .script
            .unwrap_or(context.config.general.script)
            .create();

        let mut target = context.open_target()?;

        script
            .reset(target.interface())
            .with_context(|| format!("The {} reset failed", script.name()))?;

        let dry_run = target.is_dry_run();
        target.finish();

        if !dry_run {
            println!(
                "{} target halted by the {} script",
                "Reset".green().bold(),
                script.name()
            );
        }

        Ok(())
    }
}
