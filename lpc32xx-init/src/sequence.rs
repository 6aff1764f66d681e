//! Bring-up steps and the interpreter running them.

use std::{fmt, time::Duration};

use serde::Serialize;

use crate::{
    coprocessor::SYSTEM_CONTROL, registers, CoprocessorRegister, Error, SystemControl,
    TargetInterface,
};

/// A single access issued to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    /// Reset the CPU and keep it stopped.
    HaltAndHold {
        /// Host specific boot-mode flag.
        mode: u32,
    },
    /// Write `value` to `address`.
    Write {
        /// Register address.
        address: u32,
        /// Value written.
        value: u32,
    },
    /// Read `address` and throw the value away. Used where the read itself has a side effect.
    Read {
        /// Address read.
        address: u32,
    },
    /// Wait before the next step.
    Delay(Duration),
    /// Read `from` and write the same value to `to`.
    CopyWord {
        /// Source register.
        from: u32,
        /// Destination register.
        to: u32,
    },
    /// Read a coprocessor register, clear `mask` and write it back.
    ClearCoprocessorBits {
        /// The register to modify.
        register: CoprocessorRegister,
        /// Bits cleared, all others are written back unchanged.
        mask: u32,
    },
    /// Read an ICE-breaker register and throw the value away.
    ReadIceBreaker {
        /// Hardware index of the register.
        index: u8,
    },
}

impl Step {
    /// Shorthand for [`Step::Write`].
    pub const fn write(address: u32, value: u32) -> Self {
        Step::Write { address, value }
    }

    /// Shorthand for [`Step::Read`].
    pub const fn read(address: u32) -> Self {
        Step::Read { address }
    }

    /// Shorthand for a [`Step::Delay`] in milliseconds.
    pub const fn delay_ms(millis: u64) -> Self {
        Step::Delay(Duration::from_millis(millis))
    }

    /// Issue this step to the target.
    pub fn execute(&self, interface: &mut dyn TargetInterface) -> Result<(), Error> {
        tracing::trace!("{self}");

        match *self {
            Step::HaltAndHold { mode } => interface.halt_and_hold(mode)?,
            Step::Write { address, value } => interface.write_word_32(address, value)?,
            Step::Read { address } => {
                let value = interface.read_word_32(address)?;
                tracing::trace!("{address:#010x} read {value:#010x}");
            }
            Step::Delay(duration) => interface.delay(duration)?,
            Step::CopyWord { from, to } => {
                let value = interface.read_word_32(from)?;
                tracing::debug!("{} = {value:#010x}", Register(from));
                interface.write_word_32(to, value)?;
            }
            Step::ClearCoprocessorBits { register, mask } => {
                let value = interface.read_coprocessor(register)?;
                if register == SYSTEM_CONTROL {
                    tracing::debug!("{:?}", SystemControl::from(value));
                }
                tracing::debug!("{register}: {value:#010x}, clearing {mask:#010x}");
                interface.write_coprocessor(register, value & !mask)?;
            }
            Step::ReadIceBreaker { index } => {
                interface.read_ice_breaker(index)?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::HaltAndHold { mode } => write!(f, "halt and hold (mode {mode})"),
            Step::Write { address, value } => {
                write!(f, "write {} = {value:#010x}", Register(*address))
            }
            Step::Read { address } => write!(f, "read {}", Register(*address)),
            Step::Delay(duration) => write!(f, "delay {} ms", duration.as_millis()),
            Step::CopyWord { from, to } => {
                write!(f, "copy {} -> {}", Register(*from), Register(*to))
            }
            Step::ClearCoprocessorBits { register, mask } => {
                write!(f, "clear {mask:#010x} in {register}")
            }
            Step::ReadIceBreaker { index } => write!(f, "read ICE-breaker register {index}"),
        }
    }
}

/// Formats an address with its register name when it has one.
struct Register(u32);

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match registers::name(self.0) {
            Some(name) => write!(f, "{name} @ {:#010x}", self.0),
            None => write!(f, "{:#010x}", self.0),
        }
    }
}

/// A named group of steps that has to complete before the next group starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phase {
    /// Short description, used for logging.
    pub name: &'static str,
    /// The steps, in order.
    pub steps: Vec<Step>,
}

/// An ordered list of phases run against a [`TargetInterface`].
///
/// A sequence holds no state of its own: running it twice issues the same
/// accesses twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    name: &'static str,
    phases: Vec<Phase>,
}

impl Sequence {
    /// Create an empty sequence.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            phases: Vec::new(),
        }
    }

    /// Append a phase.
    pub fn phase(mut self, name: &'static str, steps: &[Step]) -> Self {
        self.phases.push(Phase {
            name,
            steps: steps.to_vec(),
        });
        self
    }

    /// Append all phases of `other`.
    pub fn then(mut self, other: Sequence) -> Self {
        self.phases.extend(other.phases);
        self
    }

    /// The name of this sequence.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The phases of this sequence.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// All steps, in the order they are issued.
    pub fn steps(&self) -> impl Iterator<Item = &Step> + '_ {
        self.phases.iter().flat_map(|phase| phase.steps.iter())
    }

    /// Issue every step to the target, stopping at the first error.
    pub fn run(&self, interface: &mut dyn TargetInterface) -> Result<(), Error> {
        tracing::info!("Running {}", self.name);

        for phase in &self.phases {
            tracing::debug!("{}: {}", self.name, phase.name);
            for step in &phase.steps {
                step.execute(interface)?;
            }
        }

        interface.flush()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{coprocessor::SYSTEM_CONTROL, Operation, RecordingInterface};

    #[test]
    fn copy_word_writes_back_what_was_read() {
        let mut interface = RecordingInterface::new().with_read_value(0x4000_4070, 0x0000_0123);

        Step::CopyWord {
            from: 0x4000_4070,
            to: 0x4000_406C,
        }
        .execute(&mut interface)
        .unwrap();

        assert_eq!(
            interface.operations(),
            &[
                Operation::ReadWord32 {
                    address: 0x4000_4070,
                    value: 0x0000_0123
                },
                Operation::WriteWord32 {
                    address: 0x4000_406C,
                    value: 0x0000_0123
                },
            ]
        );
    }

    #[test]
    fn clear_coprocessor_bits_keeps_other_bits() {
        let mut interface = RecordingInterface::new().with_coprocessor_value(0x0005_317F);

        Step::ClearCoprocessorBits {
            register: SYSTEM_CONTROL,
            mask: 0x1005,
        }
        .execute(&mut interface)
        .unwrap();

        assert_eq!(
            interface.operations()[1],
            Operation::WriteCoprocessor {
                register: SYSTEM_CONTROL,
                value: 0x0005_217A
            }
        );
    }

    #[test]
    fn phases_run_in_order() {
        let first = Sequence::new("first").phase("a", &[Step::write(0x10, 1)]);
        let second = Sequence::new("second")
            .phase("b", &[Step::delay_ms(2)])
            .phase("c", &[Step::read(0x20)]);

        let sequence = first.then(second);
        assert_eq!(sequence.name(), "first");
        assert_eq!(sequence.phases().len(), 3);

        let mut interface = RecordingInterface::new();
        sequence.run(&mut interface).unwrap();

        assert_eq!(
            interface.operations(),
            &[
                Operation::WriteWord32 {
                    address: 0x10,
                    value: 1
                },
                Operation::Delay {
                    duration: Duration::from_millis(2)
                },
                Operation::ReadWord32 {
                    address: 0x20,
                    value: RecordingInterface::SENTINEL
                },
            ]
        );
    }

    #[test]
    fn steps_display_register_names() {
        assert_eq!(
            Step::write(0x3108_0200, 0x81).to_string(),
            "write EMCStaticConfig0 @ 0x31080200 = 0x00000081"
        );
        assert_eq!(
            Step::read(0x8000_0031).to_string(),
            "read 0x80000031"
        );
        assert_eq!(Step::delay_ms(10).to_string(), "delay 10 ms");
        assert_eq!(
            Step::ClearCoprocessorBits {
                register: SYSTEM_CONTROL,
                mask: 0x1005
            }
            .to_string(),
            "clear 0x00001005 in p15, 0, c1, c0, 0"
        );
    }
}
