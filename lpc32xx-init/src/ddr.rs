//! DDR bring-up for the LPC32xx external memory controller.
//!
//! Clocks have to be stable before the SDRAM clock block is reset, the AHB
//! ports have to be enabled before the SDRAM is sequenced, so the phases below
//! must run in the order given. All values are the ones recommended for a
//! 16-bit, 512 Mb (32M x 16) low power DDR device at the Orion1040 clocks.

use crate::{
    registers::{clkpwr, emc, DDR_BASE},
    Sequence, Step,
};

/// Time given to the HCLK PLL to lock.
pub const PLL_LOCK_DELAY_MS: u64 = 10;

/// Device dependent EMC settings. Timings are in EMC clock cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdrTiming {
    /// `EMCDynamicConfig0`: device type, density and organization.
    pub dynamic_config: u32,
    /// `EMCDynamicRasCas0`: RAS and CAS latency.
    pub ras_cas: u32,
    /// `EMCDynamicReadConfig`: read data capture strategy.
    pub read_config: u32,
    pub t_rp: u32,
    pub t_ras: u32,
    pub t_srex: u32,
    pub t_wr: u32,
    pub t_rc: u32,
    pub t_rfc: u32,
    pub t_xsr: u32,
    pub t_rrd: u32,
    pub t_mrd: u32,
    pub t_cdlr: u32,
    /// Refresh timer used to burst auto-refresh cycles during init.
    pub init_refresh: u32,
    /// Refresh timer for normal operation.
    pub refresh: u32,
    /// Read that loads the mode register while the controller issues MODE.
    ///
    /// The SDRAM latches the row address, so the offset encodes the register value.
    pub mode_register_load: u32,
    /// Read that loads the extended mode register.
    pub extended_mode_register_load: u32,
}

/// 512 Mb low power DDR, 32M x 16, CAS 3, burst length 2.
pub const LPDDR_32M16: DdrTiming = DdrTiming {
    dynamic_config: 0x0000_1886,
    ras_cas: 0x0000_0302,
    read_config: 0x0000_0111,
    // 18 ns
    t_rp: 3,
    // 42 ns
    t_ras: 5,
    // no tSREX in the datasheet, tXSR (120 ns) is used
    t_srex: 13,
    // 15 ns
    t_wr: 2,
    // 60 ns
    t_rc: 7,
    // 97.5 ns
    t_rfc: 8,
    // 120 ns
    t_xsr: 13,
    // 12 ns
    t_rrd: 2,
    // 2 tCK
    t_mrd: 1,
    t_cdlr: 2,
    init_refresh: 0x0000_0002,
    refresh: 0x0000_0030,
    mode_register_load: DDR_BASE + 0x31,
    extended_mode_register_load: DDR_BASE + (1 << 14),
};

/// PLL to 200 MHz from the 12.5 MHz oscillator, HCLK = ARM / 2, PERIPH = ARM / 16.
const CLOCK_SETUP: &[Step] = &[
    Step::write(clkpwr::PWR_CTRL, 0x0000_0000),
    Step::write(clkpwr::HCLKPLL_CTRL, 0x0000_0000),
    Step::write(clkpwr::SYSCLK_CTRL, 0x0000_0140),
    Step::write(clkpwr::HCLKPLL_CTRL, 0x0001_401E),
    Step::delay_ms(PLL_LOCK_DELAY_MS),
    Step::write(clkpwr::HCLKDIV_CTRL, 0x0000_00BD),
    Step::write(clkpwr::PWR_CTRL, 0x0000_0004),
];

/// DMA, instruction and data ports.
const AHB_ENABLE: &[Step] = &[
    Step::write(emc::AHB_CONTROL0, 0x0000_0001),
    Step::write(emc::AHB_CONTROL3, 0x0000_0001),
    Step::write(emc::AHB_CONTROL4, 0x0000_0001),
    Step::write(emc::AHB_TIMEOUT0, 0x0000_0064),
    Step::write(emc::AHB_TIMEOUT3, 0x0000_0190),
    Step::write(emc::AHB_TIMEOUT4, 0x0000_0190),
];

const CLOCK_CALIBRATION: &[Step] = &[
    Step::write(clkpwr::SDRAMCLK_CTRL, 0x0008_0000),
    // DDR, sensitivity 7, command delay 15, DQSIN delay 15, calibrated delays
    Step::write(clkpwr::SDRAMCLK_CTRL, 0x0003_DE3E),
    Step::write(clkpwr::SDRAMCLK_CTRL, 0x0003_DF3E),
    Step::write(clkpwr::SDRAMCLK_CTRL, 0x0003_DE3E),
    Step::delay_ms(1),
    Step::CopyWord {
        from: clkpwr::DDR_LAP_COUNT,
        to: clkpwr::DDR_LAP_NOM,
    },
];

const RECALIBRATION: &[Step] = &[
    Step::write(clkpwr::SDRAMCLK_CTRL, 0x0003_DD3E),
    Step::write(clkpwr::SDRAMCLK_CTRL, 0x0003_DC3E),
    Step::delay_ms(1),
];

fn controller_steps(timing: &DdrTiming) -> [Step; 15] {
    [
        Step::write(emc::CONTROL, 0x0000_0001),
        // little endian
        Step::write(emc::CONFIG, 0x0000_0000),
        Step::write(emc::DYNAMIC_CONFIG0, timing.dynamic_config),
        Step::write(emc::DYNAMIC_RAS_CAS0, timing.ras_cas),
        Step::write(emc::DYNAMIC_READ_CONFIG, timing.read_config),
        Step::write(emc::DYNAMIC_T_RP, timing.t_rp),
        Step::write(emc::DYNAMIC_T_RAS, timing.t_ras),
        Step::write(emc::DYNAMIC_T_SREX, timing.t_srex),
        Step::write(emc::DYNAMIC_T_WR, timing.t_wr),
        Step::write(emc::DYNAMIC_T_RC, timing.t_rc),
        Step::write(emc::DYNAMIC_T_RFC, timing.t_rfc),
        Step::write(emc::DYNAMIC_T_XSR, timing.t_xsr),
        Step::write(emc::DYNAMIC_T_RRD, timing.t_rrd),
        Step::write(emc::DYNAMIC_T_MRD, timing.t_mrd),
        Step::write(emc::DYNAMIC_T_CDLR, timing.t_cdlr),
    ]
}

fn sdram_init_steps(timing: &DdrTiming) -> [Step; 11] {
    [
        // NOP, clock and clock enable forced on
        Step::write(emc::DYNAMIC_CONTROL, 0x0000_0183),
        Step::delay_ms(1),
        // PRECHARGE ALL
        Step::write(emc::DYNAMIC_CONTROL, 0x0000_0103),
        Step::write(emc::DYNAMIC_REFRESH, timing.init_refresh),
        Step::delay_ms(1),
        Step::write(emc::DYNAMIC_REFRESH, timing.refresh),
        // MODE
        Step::write(emc::DYNAMIC_CONTROL, 0x0000_0083),
        Step::read(timing.mode_register_load),
        Step::write(emc::DYNAMIC_CONTROL, 0x0000_0083),
        Step::read(timing.extended_mode_register_load),
        // NORMAL, clocks automatic
        Step::write(emc::DYNAMIC_CONTROL, 0x0000_0000),
    ]
}

/// The DDR bring-up for the Orion1040 memory.
pub fn bring_up() -> Sequence {
    bring_up_with(&LPDDR_32M16)
}

/// The DDR bring-up for another device on the same clocks.
pub fn bring_up_with(timing: &DdrTiming) -> Sequence {
    Sequence::new("DDR bring-up")
        .phase("clock setup", CLOCK_SETUP)
        .phase("AHB port enable", AHB_ENABLE)
        .phase("DDR clock calibration", CLOCK_CALIBRATION)
        .phase("EMC timing", &controller_steps(timing))
        .phase("SDRAM initialization", &sdram_init_steps(timing))
        .phase("DDR clock recalibration", RECALIBRATION)
}
