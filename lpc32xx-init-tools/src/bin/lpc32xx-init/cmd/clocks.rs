use lpc32xx_init::clocks::ClockTree;

use super::Context;

#[derive(clap::Parser)]
pub struct Cmd {
    /// Print the clocks as JSON
    #[clap(long)]
    json: bool,
}

impl Cmd {
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let mut target = context.open_target()?;

        let clocks = ClockTree::read(target.interface(), context.config.board.oscillator_hz)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&clocks)?);
        } else {
            println!("{clocks}");
        }

        target.finish();

        Ok(())
    }
}
