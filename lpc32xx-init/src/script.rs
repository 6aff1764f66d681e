//! Target scripts invoked by the host debugger when it resets the board.

use std::{fmt::Debug, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    coprocessor::SYSTEM_CONTROL,
    ddr,
    registers::{emc, StaticConfig},
    Error, Sequence, Step, SystemControl, TargetInterface,
};

/// Boot-mode flag passed to [`TargetInterface::halt_and_hold`].
pub const RESET_MODE: u32 = 1;

/// Hardware index of the EmbeddedICE debug comms data register.
pub const ICE_COMMS_DATA: u8 = 5;

/// A target script, called by the host debugger at well defined points.
///
/// Scripts are plain data: the default methods run the sequences they
/// describe, so a script only has to say what it issues.
pub trait TargetScript: Send + Sync + Debug {
    /// Name used on the command line and in config files.
    fn name(&self) -> &'static str;

    /// Everything issued when the host resets the target.
    fn reset_sequence(&self) -> Sequence;

    /// Memory bring-up that can be run on its own, if the script has one.
    fn memory_sequence(&self) -> Option<Sequence> {
        None
    }

    /// Reset hook: bring the target into a halted, known state.
    fn reset(&self, interface: &mut dyn TargetInterface) -> Result<(), Error> {
        tracing::info!("Resetting target with the {} script", self.name());
        self.reset_sequence().run(interface)
    }

    /// Run the memory bring-up without resetting the core.
    fn init_memory(&self, interface: &mut dyn TargetInterface) -> Result<(), Error> {
        match self.memory_sequence() {
            Some(sequence) => sequence.run(interface),
            None => {
                tracing::warn!("The {} script has no memory bring-up", self.name());
                Ok(())
            }
        }
    }
}

/// Halt the core, turn off its caches and drain stale debug comms data.
///
/// A normal (not service) boot may have run the user program, which can leave
/// the caches on and data in the comms channel.
fn halt_and_clean(name: &'static str) -> Sequence {
    Sequence::new(name)
        .phase("halt", &[Step::HaltAndHold { mode: RESET_MODE }])
        .phase(
            "disable caches",
            &[Step::ClearCoprocessorBits {
                register: SYSTEM_CONTROL,
                mask: SystemControl::cache_mask(),
            }],
        )
        .phase(
            "clear debug comms",
            &[Step::ReadIceBreaker {
                index: ICE_COMMS_DATA,
            }],
        )
}

/// Orion1040 loader: full DDR bring-up followed by NOR flash access.
#[derive(Debug)]
pub struct Orion1040(());

impl Orion1040 {
    /// Create the script.
    pub fn create() -> Arc<dyn TargetScript> {
        Arc::new(Self(()))
    }
}

impl TargetScript for Orion1040 {
    fn name(&self) -> &'static str {
        "orion1040"
    }

    fn reset_sequence(&self) -> Sequence {
        // DDR is brought up on every reset, after a service boot it was never
        // configured and after a normal boot it has to be re-synchronized.
        halt_and_clean("Orion1040 reset")
            .then(ddr::bring_up())
            .phase(
                "static memory",
                &[Step::write(
                    emc::STATIC_CONFIG0,
                    StaticConfig::nor_flash_16bit().into(),
                )],
            )
    }

    fn memory_sequence(&self) -> Option<Sequence> {
        Some(ddr::bring_up())
    }
}

/// NOR flash loader: only halts the core and cleans up after a normal boot.
///
/// Static memory is left as the boot ROM configured it.
#[derive(Debug)]
pub struct NorLoader(());

impl NorLoader {
    /// Create the script.
    pub fn create() -> Arc<dyn TargetScript> {
        Arc::new(Self(()))
    }
}

impl TargetScript for NorLoader {
    fn name(&self) -> &'static str {
        "nor-loader"
    }

    fn reset_sequence(&self) -> Sequence {
        halt_and_clean("NOR loader reset")
    }
}

/// Selects one of the built in scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptKind {
    /// See [`Orion1040`].
    #[default]
    Orion1040,
    /// See [`NorLoader`].
    NorLoader,
}

impl ScriptKind {
    /// All built in scripts.
    pub const ALL: [ScriptKind; 2] = [ScriptKind::Orion1040, ScriptKind::NorLoader];

    /// Instantiate the selected script.
    pub fn create(self) -> Arc<dyn TargetScript> {
        match self {
            ScriptKind::Orion1040 => Orion1040::create(),
            ScriptKind::NorLoader => NorLoader::create(),
        }
    }
}

impl FromStr for ScriptKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScriptKind::ALL
            .into_iter()
            .find(|kind| kind.create().name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownScript(s.to_string()))
    }
}

impl std::fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.create().name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn script_names_round_trip() {
        for kind in ScriptKind::ALL {
            assert_eq!(kind.to_string().parse::<ScriptKind>().unwrap(), kind);
        }

        assert!(matches!(
            "lpc3180".parse::<ScriptKind>(),
            Err(Error::UnknownScript(name)) if name == "lpc3180"
        ));
    }

    #[test]
    fn nor_loader_has_no_memory_bring_up() {
        assert!(NorLoader::create().memory_sequence().is_none());
        assert!(Orion1040::create().memory_sequence().is_some());
    }

    #[test]
    fn orion_reset_embeds_ddr_bring_up() {
        let reset = Orion1040::create().reset_sequence();
        let ddr = ddr::bring_up();

        let reset_steps: Vec<_> = reset.steps().copied().collect();
        let ddr_steps: Vec<_> = ddr.steps().copied().collect();

        assert_eq!(&reset_steps[3..3 + ddr_steps.len()], ddr_steps.as_slice());
        assert_eq!(reset_steps.len(), 3 + ddr_steps.len() + 1);
    }
}
