//! DQSIN delay calibration.
//!
//! The bring-up starts DDR with a DQSIN delay of 15, which works on most
//! boards. The sweep below finds the range of delays for which the memory test
//! passes on this board and settles in the middle of it.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::{
    memtest::MemoryTest,
    registers::{clkpwr, SdramClkCtrl},
    Error, TargetInterface,
};

/// Calibration sensitivity matching each DQSIN delay.
pub const DQS_TO_SENSITIVITY: [u8; 32] = [
    7, 5, 4, 4, 3, 3, 3, 2, 2, 2, 2, 2, 2, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0,
];

/// Delays tried by the sweep. Most parts fail at 2 and below and somewhere above 20.
pub const SWEEP_RANGE: RangeInclusive<u8> = 1..=30;

/// Delay programmed when no delay passes, the bring-up default.
pub const FALLBACK_DQSIN_DELAY: u8 = 15;

/// Program a DQSIN delay and its calibration sensitivity, keeping the other bits.
pub fn set_dqsin_delay(interface: &mut dyn TargetInterface, delay: u8) -> Result<(), Error> {
    let delay = delay & 0x1F;

    let mut value = SdramClkCtrl(interface.read_word_32(clkpwr::SDRAMCLK_CTRL)?);
    value.set_dqsin_delay(delay);
    value.set_sensitivity(DQS_TO_SENSITIVITY[usize::from(delay)]);

    tracing::trace!("DQSIN delay {delay}: {value:?}");
    interface.write_word_32(clkpwr::SDRAMCLK_CTRL, value.0)
}

/// Result of a delay sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DqsinCalibration {
    /// Every delay tried and whether the memory test passed.
    pub results: Vec<(u8, bool)>,
    /// The first range of consecutive passing delays.
    pub window: Option<RangeInclusive<u8>>,
    /// The delay left programmed.
    pub selected: u8,
}

impl DqsinCalibration {
    /// Pick a delay from sweep results.
    pub fn from_results(results: Vec<(u8, bool)>) -> Self {
        let window = first_window(&results);
        let selected = window
            .as_ref()
            .map(|window| ((*window.start() as u16 + *window.end() as u16) / 2) as u8)
            .unwrap_or(FALLBACK_DQSIN_DELAY);

        Self {
            results,
            window,
            selected,
        }
    }

    pub fn passed(&self) -> bool {
        self.window.is_some()
    }
}

fn first_window(results: &[(u8, bool)]) -> Option<RangeInclusive<u8>> {
    let mut passing = results
        .iter()
        .skip_while(|(_, passed)| !passed)
        .take_while(|(_, passed)| *passed)
        .map(|(delay, _)| *delay);

    let start = passing.next()?;
    let end = passing.last().unwrap_or(start);

    Some(start..=end)
}

/// Sweep the DQSIN delay over [`SWEEP_RANGE`], running `test` at every delay.
///
/// The delay is used as the memory test seed so that each run writes to fresh
/// locations. The selected delay is programmed before returning.
pub fn sweep_dqsin_delay(
    interface: &mut dyn TargetInterface,
    test: &MemoryTest,
) -> Result<DqsinCalibration, Error> {
    let mut results = Vec::with_capacity(SWEEP_RANGE.len());

    for delay in SWEEP_RANGE {
        set_dqsin_delay(interface, delay)?;
        let report = test.run(interface, delay as u32)?;
        tracing::debug!("DQSIN delay {delay}: {report}");
        results.push((delay, report.passed()));
    }

    let calibration = DqsinCalibration::from_results(results);

    match &calibration.window {
        Some(window) => tracing::info!(
            "DQSIN delays {}..={} pass, using {}",
            window.start(),
            window.end(),
            calibration.selected
        ),
        None => tracing::warn!(
            "No DQSIN delay passed the memory test, falling back to {}",
            calibration.selected
        ),
    }

    set_dqsin_delay(interface, calibration.selected)?;
    interface.flush()?;

    Ok(calibration)
}
