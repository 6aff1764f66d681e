use anyhow::bail;
use colored::Colorize;
use lpc32xx_init::{
    memtest::MemoryTest,
    registers::{DDR_BASE, DDR_SIZE},
};

use super::Context;
use crate::util::parse_u32;

#[derive(clap::Parser)]
pub struct Cmd {
    /// Start of the tested range
    #[clap(long, value_parser = parse_u32, default_value_t = DDR_BASE)]
    base: u32,

    /// Size of the tested range in bytes
    #[clap(long, value_parser = parse_u32, default_value_t = DDR_SIZE)]
    size: u32,

    /// Number of sections, instead of the configured count
    #[clap(long, value_parser = parse_u32)]
    sections: Option<u32>,

    /// Section offset, instead of the configured seed
    #[clap(long, value_parser = parse_u32)]
    seed: Option<u32>,

    /// Print the report as JSON
    #[clap(long)]
    json: bool,
}

impl Cmd {
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let test = MemoryTest {
            base: self.base,
            size: self.size,
            sections: self.sections.unwrap_or(context.config.memtest.sections),
        };
        let seed = self.seed.unwrap_or(context.config.memtest.seed);

        let mut target = context.open_target()?;
        let report = test.run(target.interface(), seed)?;
        let dry_run = target.is_dry_run();
        target.finish();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if report.passed() {
            println!("{} {report}", "Memory test".green().bold());
        } else {
            println!("{} {report}", "Memory test".red().bold());
        }

        // Nothing is backing the recorder, a failure says nothing.
        if !report.passed() && !dry_run {
            bail!("The memory test failed");
        }

        Ok(())
    }
}
