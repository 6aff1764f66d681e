use colored::Colorize;
use lpc32xx_init::{ScriptKind, Sequence};

use super::Context;

#[derive(clap::Parser)]
pub struct Cmd {
    /// The target script to list, instead of the configured one
    #[clap(long)]
    script: Option<ScriptKind>,

    /// Only list the memory bring-up
    #[clap(long)]
    memory: bool,

    /// Print the sequence as JSON
    #[clap(long)]
    json: bool,
}

impl Cmd {
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let script = self
            .script
            .unwrap_or(context.config.general.script)
            .create();

        let sequence = if self.memory {
            script
                .memory_sequence()
                .unwrap_or_else(|| Sequence::new("no memory bring-up"))
        } else {
            script.reset_sequence()
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&sequence)?);
        } else {
            print_sequence(&sequence);
        }

        Ok(())
    }
}

fn print_sequence(sequence: &Sequence) {
    println!("{}", sequence.name().bold());

    let mut index = 0;
    for phase in sequence.phases() {
        println!("  {}", phase.name.cyan());
        for step in &phase.steps {
            println!("  {index:>4}  {step}");
            index += 1;
        }
    }
}
