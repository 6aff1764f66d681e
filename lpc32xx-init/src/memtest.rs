//! DDR spot check run through the debug interface.
//!
//! Testing every word of the device over JTAG takes far too long, so the test
//! writes and verifies small sections spread evenly over the device.

use std::fmt;

use serde::Serialize;

use crate::{
    registers::{DDR_BASE, DDR_SIZE},
    Error, TargetInterface,
};

/// Words written and verified per section.
pub const WORDS_PER_SECTION: u32 = 32;

/// The data written to a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    /// A single cleared bit moving through the word.
    WalkingZeros,
    /// A single set bit moving through the word.
    WalkingOnes,
    /// The inverted address of each word.
    InverseAddress,
    /// The address of each word.
    Address,
    /// `0x55AA55AA`
    Checkerboard,
    /// `0xAA55AA55`
    InverseCheckerboard,
}

impl Pattern {
    /// All patterns, in the order they are run.
    pub const ALL: [Pattern; 6] = [
        Pattern::WalkingZeros,
        Pattern::WalkingOnes,
        Pattern::InverseAddress,
        Pattern::Address,
        Pattern::Checkerboard,
        Pattern::InverseCheckerboard,
    ];

    /// The value stored in word `index` of a section, found at `address`.
    pub fn value(self, address: u32, index: u32) -> u32 {
        match self {
            Pattern::WalkingZeros => !(1 << (index % 32)),
            Pattern::WalkingOnes => 1 << (index % 32),
            Pattern::InverseAddress => !address,
            Pattern::Address => address,
            Pattern::Checkerboard => 0x55AA_55AA,
            Pattern::InverseCheckerboard => 0xAA55_AA55,
        }
    }
}

/// A word that did not read back what was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub pattern: Pattern,
    pub address: u32,
    pub expected: u32,
    pub actual: u32,
}

/// Outcome of a [`MemoryTest`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryTestReport {
    /// Sections completely verified.
    pub sections_passed: u32,
    /// The first failure, the test stops there.
    pub mismatch: Option<Mismatch>,
}

impl MemoryTestReport {
    pub fn passed(&self) -> bool {
        self.mismatch.is_none()
    }
}

impl fmt::Display for MemoryTestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mismatch {
            None => write!(f, "passed, {} sections verified", self.sections_passed),
            Some(mismatch) => write!(
                f,
                "failed after {} sections: {:?} at {:#010x}, expected {:#010x}, read {:#010x}",
                self.sections_passed,
                mismatch.pattern,
                mismatch.address,
                mismatch.expected,
                mismatch.actual
            ),
        }
    }
}

/// Write/verify test over a memory range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryTest {
    pub base: u32,
    pub size: u32,
    /// Number of sections the range is split into.
    pub sections: u32,
}

impl Default for MemoryTest {
    /// The DDR on the Orion1040, split into 256 sections.
    fn default() -> Self {
        Self {
            base: DDR_BASE,
            size: DDR_SIZE,
            sections: 256,
        }
    }
}

impl MemoryTest {
    /// Start address of every section tested with `seed`.
    ///
    /// The seed moves all sections up so that a run never sees the data of a
    /// previous run with another seed. Sections that would reach past the end
    /// of the range are dropped.
    ///
    /// Fails for ranges smaller than one section or reaching past 4 GiB.
    pub fn section_addresses(&self, seed: u32) -> Result<impl Iterator<Item = u32>, Error> {
        let base = self.base as u64;
        let section_size = WORDS_PER_SECTION as u64 * 4;

        if (self.size as u64) < section_size || base + self.size as u64 > 1 << 32 {
            return Err(Error::InvalidMemoryRange {
                base: self.base,
                size: self.size,
            });
        }

        let end = base + self.size as u64 - section_size;
        let stride = (self.size / 4 / self.sections.max(1)).max(1) as u64 * 4;
        let first = base + (seed as u64 * 0x4000 + seed as u64 * 4) * 4;

        Ok((0..)
            .map(move |section| first + section * stride)
            .take_while(move |&address| address <= end)
            .map(|address| address as u32))
    }

    /// Run every pattern on every section.
    ///
    /// A mismatch ends the test and is returned in the report, errors from the
    /// interface are returned as errors.
    pub fn run(
        &self,
        interface: &mut dyn TargetInterface,
        seed: u32,
    ) -> Result<MemoryTestReport, Error> {
        let sections = self.section_addresses(seed)?;

        tracing::debug!(
            "Testing {} sections in {:#010x}..{:#010x}, seed {seed}",
            self.sections,
            self.base,
            self.base as u64 + self.size as u64
        );

        let mut report = MemoryTestReport {
            sections_passed: 0,
            mismatch: None,
        };

        for section in sections {
            for pattern in Pattern::ALL {
                if let Some(mismatch) = test_section(interface, section, pattern)? {
                    tracing::debug!("Memory test failed: {mismatch:x?}");
                    report.mismatch = Some(mismatch);
                    return Ok(report);
                }
            }

            report.sections_passed += 1;
        }

        Ok(report)
    }
}

fn test_section(
    interface: &mut dyn TargetInterface,
    section: u32,
    pattern: Pattern,
) -> Result<Option<Mismatch>, Error> {
    let words = (0..WORDS_PER_SECTION).map(move |index| (index, section + index * 4));

    for (index, address) in words.clone() {
        interface.write_word_32(address, pattern.value(address, index))?;
    }

    for (index, address) in words {
        let expected = pattern.value(address, index);
        let actual = interface.read_word_32(address)?;

        if actual != expected {
            return Ok(Some(Mismatch {
                pattern,
                address,
                expected,
                actual,
            }));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::*;
    use crate::{Operation, RecordingInterface};

    #[test_case(Pattern::WalkingZeros, 0x8000_0000, 1 => 0xFFFF_FFFD)]
    #[test_case(Pattern::WalkingOnes, 0x8000_0000, 31 => 0x8000_0000)]
    #[test_case(Pattern::InverseAddress, 0x8000_0010, 4 => 0x7FFF_FFEF)]
    #[test_case(Pattern::Address, 0x8000_0010, 4 => 0x8000_0010)]
    #[test_case(Pattern::Checkerboard, 0x8000_0000, 0 => 0x55AA_55AA)]
    #[test_case(Pattern::InverseCheckerboard, 0x8000_0000, 0 => 0xAA55_AA55)]
    fn pattern_values(pattern: Pattern, address: u32, index: u32) -> u32 {
        pattern.value(address, index)
    }

    #[test]
    fn sections_cover_the_device() {
        let test = MemoryTest::default();
        let sections: Vec<_> = test.section_addresses(0).unwrap().collect();

        assert_eq!(sections.len(), 256);
        assert_eq!(sections[0], DDR_BASE);
        assert_eq!(sections[1], DDR_BASE + 0x2_0000);
        assert_eq!(sections[255], DDR_BASE + 255 * 0x2_0000);
    }

    #[test]
    fn seed_moves_the_sections() {
        let test = MemoryTest::default();

        assert_eq!(test.section_addresses(1).unwrap().next(), Some(DDR_BASE + 0x1_0010));
        // sections pushed past the end are dropped
        assert_eq!(test.section_addresses(30).unwrap().count(), 241);
    }

    #[test]
    fn sections_stay_below_4_gib() {
        let test = MemoryTest {
            base: 0xFFF0_0000,
            size: 0x10_0000,
            sections: 16,
        };
        let sections: Vec<_> = test.section_addresses(0).unwrap().collect();

        assert_eq!(sections.len(), 16);
        assert_eq!(sections[15], 0xFFFF_0000);
    }

    #[test_case(0xFFFF_0000, 0x10_0000; "wraps past 4 GiB")]
    #[test_case(0xFFFF_FF80, 0x100; "ends past 4 GiB")]
    #[test_case(DDR_BASE, 0; "empty")]
    #[test_case(DDR_BASE, 4 * WORDS_PER_SECTION - 4; "smaller than a section")]
    fn invalid_ranges_are_rejected(base: u32, size: u32) {
        let test = MemoryTest {
            base,
            size,
            sections: 16,
        };
        let mut interface = RecordingInterface::new().remembering_writes();

        assert!(matches!(
            test.section_addresses(0),
            Err(Error::InvalidMemoryRange { .. })
        ));
        assert!(matches!(
            test.run(&mut interface, 0),
            Err(Error::InvalidMemoryRange { base: b, size: s }) if b == base && s == size
        ));
        assert!(interface.operations().is_empty());
    }

    #[test]
    fn range_ending_at_4_gib_is_accepted() {
        let test = MemoryTest {
            base: 0xFFFF_FF80,
            size: 4 * WORDS_PER_SECTION,
            sections: 1,
        };
        let mut interface = RecordingInterface::new().remembering_writes();

        let report = test.run(&mut interface, 0).unwrap();

        assert!(report.passed());
        assert_eq!(report.sections_passed, 1);
    }

    #[test]
    fn working_memory_passes() {
        let test = MemoryTest {
            sections: 4,
            ..MemoryTest::default()
        };
        let mut interface = RecordingInterface::new().remembering_writes();

        let report = test.run(&mut interface, 0).unwrap();

        assert!(report.passed());
        assert_eq!(report.sections_passed, 4);

        let accesses = 4 * Pattern::ALL.len() * WORDS_PER_SECTION as usize * 2;
        assert_eq!(interface.operations().len(), accesses);
    }

    #[test]
    fn stuck_word_is_reported() {
        let test = MemoryTest {
            sections: 4,
            ..MemoryTest::default()
        };
        let mut interface = RecordingInterface::new()
            .remembering_writes()
            .with_read_value(DDR_BASE + 0x2_0004, 0);

        let report = test.run(&mut interface, 0).unwrap();

        pretty_assertions::assert_eq!(
            report,
            MemoryTestReport {
                sections_passed: 1,
                mismatch: Some(Mismatch {
                    pattern: Pattern::WalkingZeros,
                    address: DDR_BASE + 0x2_0004,
                    expected: 0xFFFF_FFFD,
                    actual: 0,
                }),
            }
        );
        assert_eq!(
            interface.operations().last(),
            Some(&Operation::ReadWord32 {
                address: DDR_BASE + 0x2_0004,
                value: 0
            })
        );
    }

    #[test]
    fn unbacked_memory_fails_first_word() {
        let report = MemoryTest::default()
            .run(&mut RecordingInterface::new(), 0)
            .unwrap();

        assert!(!report.passed());
        assert_eq!(report.sections_passed, 0);
    }
}
