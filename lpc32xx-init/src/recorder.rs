//! A [`TargetInterface`] that records accesses instead of talking to hardware.
//!
//! Used by the tests and for dry runs of the CLI.

use std::{collections::HashMap, fmt, time::Duration};

use serde::Serialize;

use crate::{CoprocessorRegister, Error, TargetInterface};

/// One access seen by a [`RecordingInterface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// The CPU was reset and stopped.
    HaltAndHold {
        /// Boot-mode flag passed by the script.
        mode: u32,
    },
    /// A 32-bit read and the value returned.
    ReadWord32 {
        /// Address read.
        address: u32,
        /// Value returned to the script.
        value: u32,
    },
    /// A 32-bit write.
    WriteWord32 {
        /// Address written.
        address: u32,
        /// Value written.
        value: u32,
    },
    /// A settle delay.
    Delay {
        /// Requested duration.
        #[serde(serialize_with = "serialize_millis")]
        duration: Duration,
    },
    /// A coprocessor read and the value returned.
    ReadCoprocessor {
        /// Register read.
        register: CoprocessorRegister,
        /// Value returned to the script.
        value: u32,
    },
    /// A coprocessor write.
    WriteCoprocessor {
        /// Register written.
        register: CoprocessorRegister,
        /// Value written.
        value: u32,
    },
    /// An ICE-breaker register read and the value returned.
    ReadIceBreaker {
        /// Hardware index of the register.
        index: u8,
        /// Value returned to the script.
        value: u32,
    },
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u128(duration.as_millis())
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::HaltAndHold { mode } => write!(f, "halt-and-hold {mode}"),
            Operation::ReadWord32 { address, value } => {
                write!(f, "read  {address:#010x} -> {value:#010x}")
            }
            Operation::WriteWord32 { address, value } => {
                write!(f, "write {address:#010x} <- {value:#010x}")
            }
            Operation::Delay { duration } => write!(f, "delay {} ms", duration.as_millis()),
            Operation::ReadCoprocessor { register, value } => {
                write!(f, "mrc   {register} -> {value:#010x}")
            }
            Operation::WriteCoprocessor { register, value } => {
                write!(f, "mcr   {register} <- {value:#010x}")
            }
            Operation::ReadIceBreaker { index, value } => {
                write!(f, "ice   {index} -> {value:#010x}")
            }
        }
    }
}

/// Records every access and answers reads without any hardware attached.
///
/// Reads return, in order of preference: a value set with
/// [`RecordingInterface::with_read_value`], the last value written to the same
/// address when [`RecordingInterface::remembering_writes`] is enabled, or the
/// sentinel.
#[derive(Debug, Clone)]
pub struct RecordingInterface {
    operations: Vec<Operation>,
    sentinel: u32,
    read_values: HashMap<u32, u32>,
    coprocessor_value: Option<u32>,
    ice_breaker_value: Option<u32>,
    memory: Option<HashMap<u32, u32>>,
}

impl RecordingInterface {
    /// The value returned for reads nobody configured, what a floating bus reads.
    pub const SENTINEL: u32 = 0xFFFF_FFFF;

    /// Create an empty recorder answering every read with [`Self::SENTINEL`].
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            sentinel: Self::SENTINEL,
            read_values: HashMap::new(),
            coprocessor_value: None,
            ice_breaker_value: None,
            memory: None,
        }
    }

    /// Answer unconfigured reads with `sentinel` instead.
    pub fn with_sentinel(mut self, sentinel: u32) -> Self {
        self.sentinel = sentinel;
        self
    }

    /// Always answer reads of `address` with `value`.
    pub fn with_read_value(mut self, address: u32, value: u32) -> Self {
        self.read_values.insert(address, value);
        self
    }

    /// Answer coprocessor reads with `value`.
    pub fn with_coprocessor_value(mut self, value: u32) -> Self {
        self.coprocessor_value = Some(value);
        self
    }

    /// Answer ICE-breaker reads with `value`.
    pub fn with_ice_breaker_value(mut self, value: u32) -> Self {
        self.ice_breaker_value = Some(value);
        self
    }

    /// Let reads return the last value written to the same address, like RAM.
    pub fn remembering_writes(mut self) -> Self {
        self.memory = Some(HashMap::new());
        self
    }

    /// Everything recorded so far.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Take the recorded operations, leaving the recorder empty.
    pub fn take_operations(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.operations)
    }
}

impl Default for RecordingInterface {
    fn default() -> Self {
        RecordingInterface::new()
    }
}

impl TargetInterface for RecordingInterface {
    fn halt_and_hold(&mut self, mode: u32) -> Result<(), Error> {
        self.operations.push(Operation::HaltAndHold { mode });
        Ok(())
    }

    fn read_word_32(&mut self, address: u32) -> Result<u32, Error> {
        let value = self
            .read_values
            .get(&address)
            .or_else(|| self.memory.as_ref().and_then(|memory| memory.get(&address)))
            .copied()
            .unwrap_or(self.sentinel);

        self.operations
            .push(Operation::ReadWord32 { address, value });
        Ok(value)
    }

    fn write_word_32(&mut self, address: u32, value: u32) -> Result<(), Error> {
        if let Some(memory) = self.memory.as_mut() {
            memory.insert(address, value);
        }

        self.operations
            .push(Operation::WriteWord32 { address, value });
        Ok(())
    }

    fn delay(&mut self, duration: Duration) -> Result<(), Error> {
        self.operations.push(Operation::Delay { duration });
        Ok(())
    }

    fn read_coprocessor(&mut self, register: CoprocessorRegister) -> Result<u32, Error> {
        let value = self.coprocessor_value.unwrap_or(self.sentinel);
        self.operations
            .push(Operation::ReadCoprocessor { register, value });
        Ok(value)
    }

    fn write_coprocessor(
        &mut self,
        register: CoprocessorRegister,
        value: u32,
    ) -> Result<(), Error> {
        self.operations
            .push(Operation::WriteCoprocessor { register, value });
        Ok(())
    }

    fn read_ice_breaker(&mut self, index: u8) -> Result<u32, Error> {
        let value = self.ice_breaker_value.unwrap_or(self.sentinel);
        self.operations
            .push(Operation::ReadIceBreaker { index, value });
        Ok(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_prefer_configured_values() {
        let mut interface = RecordingInterface::new()
            .with_sentinel(0xA5A5_A5A5)
            .with_read_value(0x100, 7)
            .remembering_writes();

        interface.write_word_32(0x100, 1).unwrap();
        interface.write_word_32(0x200, 2).unwrap();

        assert_eq!(interface.read_word_32(0x100).unwrap(), 7);
        assert_eq!(interface.read_word_32(0x200).unwrap(), 2);
        assert_eq!(interface.read_word_32(0x300).unwrap(), 0xA5A5_A5A5);
    }

    #[test]
    fn writes_are_not_remembered_by_default() {
        let mut interface = RecordingInterface::new();

        interface.write_word_32(0x100, 1).unwrap();
        assert_eq!(
            interface.read_word_32(0x100).unwrap(),
            RecordingInterface::SENTINEL
        );
    }

    #[test]
    fn operations_serialize_to_json() {
        let mut interface = RecordingInterface::new();
        interface.delay(Duration::from_millis(10)).unwrap();
        interface.write_word_32(0x3108_0200, 0x81).unwrap();

        let json = serde_json::to_string(interface.operations()).unwrap();
        assert_eq!(
            json,
            r#"[{"op":"delay","duration":10},{"op":"write_word32","address":822608384,"value":129}]"#
        );

        assert!(interface.take_operations().len() == 2);
        assert!(interface.operations().is_empty());
    }
}
