//! CP15 access for the ARM926EJ-S core.
//!
//! Host debuggers name a coprocessor register by an MRC/MCR style instruction
//! word, e.g. `0xEE010F00` for the system control register. The register
//! number fields are decoded here so that other hosts (like OpenOCD, which
//! takes the fields separately) can be driven with the same identifier.

use bitfield::bitfield;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A coprocessor register, identified by the fields of an MRC/MCR instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoprocessorRegister {
    /// Coprocessor number (`p0`..`p15`).
    pub coprocessor: u8,
    /// First opcode.
    pub opcode1: u8,
    /// Primary register (`CRn`).
    pub crn: u8,
    /// Additional register (`CRm`).
    pub crm: u8,
    /// Second opcode.
    pub opcode2: u8,
}

/// CP15 c1, the system control register.
pub const SYSTEM_CONTROL: CoprocessorRegister = CoprocessorRegister::from_encoded(0xEE01_0F00);

impl CoprocessorRegister {
    /// Decode the register fields of an instruction word.
    ///
    /// The condition, direction and transfer register fields are ignored.
    pub const fn from_encoded(instruction: u32) -> Self {
        Self {
            coprocessor: ((instruction >> 8) & 0xf) as u8,
            opcode1: ((instruction >> 21) & 0x7) as u8,
            crn: ((instruction >> 16) & 0xf) as u8,
            crm: (instruction & 0xf) as u8,
            opcode2: ((instruction >> 5) & 0x7) as u8,
        }
    }
}

impl TryFrom<u32> for CoprocessorRegister {
    type Error = Error;

    fn try_from(instruction: u32) -> Result<Self, Self::Error> {
        // cond = AL and the coprocessor instruction class
        if instruction >> 24 != 0xEE {
            return Err(Error::InvalidCoprocessorEncoding(instruction));
        }

        Ok(Self::from_encoded(instruction))
    }
}

impl std::fmt::Display for CoprocessorRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "p{}, {}, c{}, c{}, {}",
            self.coprocessor, self.opcode1, self.crn, self.crm, self.opcode2
        )
    }
}

bitfield! {
    /// The CP15 c1 control register of the ARM926EJ-S.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct SystemControl(u32);
    impl Debug;

    /// Instruction cache enable.
    pub i, set_i: 12;
    /// Location of the exception vectors.
    pub v, set_v: 13;
    /// Round robin cache replacement.
    pub rr, set_rr: 14;
    /// Data cache enable.
    pub c, set_c: 2;
    /// Alignment fault checking.
    pub a, set_a: 1;
    /// MMU enable.
    pub m, set_m: 0;
}

impl SystemControl {
    /// The MMU, data cache and instruction cache enable bits.
    ///
    /// A normal boot may have let the user program set them before the
    /// debugger took over.
    pub fn cache_mask() -> u32 {
        let mut mask = SystemControl(0);
        mask.set_m(true);
        mask.set_c(true);
        mask.set_i(true);
        mask.0
    }
}

impl From<u32> for SystemControl {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
