use colored::Colorize;
use lpc32xx_init::{calibration::sweep_dqsin_delay, memtest::MemoryTest};

use super::Context;
use crate::util::parse_u32;

#[derive(clap::Parser)]
pub struct Cmd {
    /// Sections tested at each delay, instead of the configured count
    #[clap(long, value_parser = parse_u32)]
    sections: Option<u32>,

    /// Print the results as JSON
    #[clap(long)]
    json: bool,
}

impl Cmd {
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let test = MemoryTest {
            sections: self.sections.unwrap_or(context.config.memtest.sections),
            ..MemoryTest::default()
        };

        let mut target = context.open_target()?;
        let calibration = sweep_dqsin_delay(target.interface(), &test)?;
        target.finish();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&calibration)?);
            return Ok(());
        }

        for (delay, passed) in &calibration.results {
            let result = if *passed {
                "pass".green()
            } else {
                "fail".red()
            };
            println!("{delay:>5}  {result}");
        }

        match &calibration.window {
            Some(window) => println!(
                "Delays {}..={} pass, DQSIN delay set to {}",
                window.start(),
                window.end(),
                calibration.selected.to_string().bold()
            ),
            None => println!(
                "{} no delay passed, DQSIN delay set to {}",
                "Warning:".yellow().bold(),
                calibration.selected
            ),
        }

        Ok(())
    }
}
