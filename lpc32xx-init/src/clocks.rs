//! Clock rates derived from the clock and power registers.

use serde::Serialize;

use crate::{
    registers::{clkpwr, HclkDivCtrl, HclkPllCtrl, PwrCtrl, SysclkCtrl},
    Error, TargetInterface,
};

/// Main oscillator fitted to the Orion1040.
pub const ORION_OSCILLATOR_HZ: u32 = 12_500_000;

/// Output of the 397x PLL fed by the 32.768 kHz RTC crystal.
const PLL397_HZ: u64 = 32_768 * 397;

/// The clock rates of an LPC32xx, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockTree {
    pub sys_clock: u32,
    pub pll_locked: bool,
    pub arm_clock: u32,
    pub hclk: u32,
    pub periph_clock: u32,
    /// `None` while the DDR clock is stopped.
    pub ddr_clock: Option<u32>,
}

impl ClockTree {
    /// Derive the clock rates from raw register values.
    pub fn from_registers(
        oscillator_hz: u32,
        sysclk: SysclkCtrl,
        pll: HclkPllCtrl,
        div: HclkDivCtrl,
        pwr: PwrCtrl,
    ) -> Self {
        let sys_clock = if sysclk.pll397() {
            PLL397_HZ
        } else {
            oscillator_hz as u64
        };

        // In direct run mode everything runs from SYSCLK.
        if !pwr.normal_run() {
            let sys_clock = sys_clock as u32;
            return Self {
                sys_clock,
                pll_locked: pll.locked(),
                arm_clock: sys_clock,
                hclk: sys_clock,
                periph_clock: sys_clock,
                ddr_clock: None,
            };
        }

        let arm_clock = pll_output(sys_clock, pll);

        let hclk = arm_clock >> div.hclk().min(2);
        let periph_clock = arm_clock / (div.periph() as u64 + 1);
        let ddr_clock = match div.ddram_clk() {
            1 => Some(arm_clock),
            2 => Some(arm_clock / 2),
            _ => None,
        };

        Self {
            sys_clock: sys_clock as u32,
            pll_locked: pll.locked(),
            arm_clock: arm_clock as u32,
            hclk: hclk as u32,
            periph_clock: periph_clock as u32,
            ddr_clock: ddr_clock.map(|clock| clock as u32),
        }
    }

    /// Read the clock configuration from the target.
    pub fn read(interface: &mut dyn TargetInterface, oscillator_hz: u32) -> Result<Self, Error> {
        let sysclk = SysclkCtrl(interface.read_word_32(clkpwr::SYSCLK_CTRL)?);
        let pll = HclkPllCtrl(interface.read_word_32(clkpwr::HCLKPLL_CTRL)?);
        let div = HclkDivCtrl(interface.read_word_32(clkpwr::HCLKDIV_CTRL)?);
        let pwr = PwrCtrl(interface.read_word_32(clkpwr::PWR_CTRL)?);

        tracing::debug!("{sysclk:?}");
        tracing::debug!("{pll:?}");
        tracing::debug!("{div:?}");
        tracing::debug!("{pwr:?}");

        Ok(Self::from_registers(oscillator_hz, sysclk, pll, div, pwr))
    }
}

fn pll_output(input: u64, pll: HclkPllCtrl) -> u64 {
    if !pll.power() {
        return 0;
    }

    let post_divider = 2u64 << pll.p();

    if pll.bypass() {
        return if pll.direct() {
            input
        } else {
            input / post_divider
        };
    }

    let cco = input * (pll.m() as u64 + 1) / (pll.n() as u64 + 1);

    if pll.direct() || pll.feedback() {
        cco
    } else {
        cco / post_divider
    }
}

impl std::fmt::Display for ClockTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn mhz(hz: u32) -> f64 {
            hz as f64 / 1_000_000.0
        }

        writeln!(f, "SYSCLK: {:.3} MHz", mhz(self.sys_clock))?;
        writeln!(
            f,
            "ARM:    {:.3} MHz (PLL {})",
            mhz(self.arm_clock),
            if self.pll_locked { "locked" } else { "not locked" }
        )?;
        writeln!(f, "HCLK:   {:.3} MHz", mhz(self.hclk))?;
        writeln!(f, "PERIPH: {:.3} MHz", mhz(self.periph_clock))?;
        match self.ddr_clock {
            Some(clock) => write!(f, "DDR:    {:.3} MHz", mhz(clock)),
            None => write!(f, "DDR:    stopped"),
        }
    }
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::*;
    use crate::RecordingInterface;

    #[test]
    fn orion_clocks_after_bring_up() {
        let clocks = ClockTree::from_registers(
            ORION_OSCILLATOR_HZ,
            SysclkCtrl(0x140),
            // lock bit set by hardware
            HclkPllCtrl(0x0001_401F),
            HclkDivCtrl(0xBD),
            PwrCtrl(0x4),
        );

        assert_eq!(
            clocks,
            ClockTree {
                sys_clock: 12_500_000,
                pll_locked: true,
                arm_clock: 200_000_000,
                hclk: 100_000_000,
                periph_clock: 12_500_000,
                ddr_clock: Some(200_000_000),
            }
        );
    }

    #[test_case(0x0; "after reset")]
    #[test_case(0x1; "stop bit only")]
    fn direct_run_uses_sysclk(pwr: u32) {
        let clocks = ClockTree::from_registers(
            ORION_OSCILLATOR_HZ,
            SysclkCtrl(0x140),
            HclkPllCtrl(0x0001_401F),
            HclkDivCtrl(0xBD),
            PwrCtrl(pwr),
        );

        assert_eq!(clocks.arm_clock, ORION_OSCILLATOR_HZ);
        assert_eq!(clocks.hclk, ORION_OSCILLATOR_HZ);
        assert_eq!(clocks.ddr_clock, None);
    }

    #[test]
    fn post_divider_applies_without_direct_output() {
        // M = 16, N = 1, P = 1 -> 12.5 MHz * 16 / 4
        let mut pll = HclkPllCtrl(0);
        pll.set_power(true);
        pll.set_m(15);
        pll.set_p(1);

        assert_eq!(pll_output(12_500_000, pll), 50_000_000);
    }

    #[test]
    fn read_from_target() {
        let mut interface = RecordingInterface::new()
            .with_read_value(clkpwr::SYSCLK_CTRL, 0x140)
            .with_read_value(clkpwr::HCLKPLL_CTRL, 0x0001_401F)
            .with_read_value(clkpwr::HCLKDIV_CTRL, 0xBD)
            .with_read_value(clkpwr::PWR_CTRL, 0x4);

        let clocks = ClockTree::read(&mut interface, ORION_OSCILLATOR_HZ).unwrap();
        assert_eq!(clocks.arm_clock, 200_000_000);
        assert_eq!(interface.operations().len(), 4);
        assert_eq!(
            clocks.to_string(),
            "SYSCLK: 12.500 MHz\n\
             ARM:    200.000 MHz (PLL locked)\n\
             HCLK:   100.000 MHz\n\
             PERIPH: 12.500 MHz\n\
             DDR:    200.000 MHz"
        );
    }
}
