//! LPC32xx register map used by the bring-up.
//!
//! Register names follow the LPC32x0 user manual (UM10326). Only registers the
//! scripts touch are listed.

use bitfield::bitfield;

/// Start of the DDR SDRAM on dynamic chip select 0.
pub const DDR_BASE: u32 = 0x8000_0000;

/// Size of the 512 Mb DDR device fitted to the Orion1040.
pub const DDR_SIZE: u32 = 32 * 1024 * 1024;

/// Clock and power control block.
pub mod clkpwr {
    /// HCLK divider settings.
    pub const HCLKDIV_CTRL: u32 = 0x4000_4040;
    /// Start-up, run and stop mode control.
    pub const PWR_CTRL: u32 = 0x4000_4044;
    /// SYSCLK source and bad phase settings.
    pub const SYSCLK_CTRL: u32 = 0x4000_4050;
    /// ARM and HCLK PLL control.
    pub const HCLKPLL_CTRL: u32 = 0x4000_4058;
    /// SDRAM clock, DDR delays and calibration.
    pub const SDRAMCLK_CTRL: u32 = 0x4000_4068;
    /// Nominal DDR ring oscillator count.
    pub const DDR_LAP_NOM: u32 = 0x4000_406C;
    /// Measured DDR ring oscillator count.
    pub const DDR_LAP_COUNT: u32 = 0x4000_4070;
}

/// External memory controller (ARM PL175 derivative).
pub mod emc {
    pub const CONTROL: u32 = 0x3108_0000;
    pub const CONFIG: u32 = 0x3108_0008;
    pub const DYNAMIC_CONTROL: u32 = 0x3108_0020;
    pub const DYNAMIC_REFRESH: u32 = 0x3108_0024;
    pub const DYNAMIC_READ_CONFIG: u32 = 0x3108_0028;
    pub const DYNAMIC_T_RP: u32 = 0x3108_0030;
    pub const DYNAMIC_T_RAS: u32 = 0x3108_0034;
    pub const DYNAMIC_T_SREX: u32 = 0x3108_0038;
    pub const DYNAMIC_T_WR: u32 = 0x3108_0044;
    pub const DYNAMIC_T_RC: u32 = 0x3108_0048;
    pub const DYNAMIC_T_RFC: u32 = 0x3108_004C;
    pub const DYNAMIC_T_XSR: u32 = 0x3108_0050;
    pub const DYNAMIC_T_RRD: u32 = 0x3108_0054;
    pub const DYNAMIC_T_MRD: u32 = 0x3108_0058;
    pub const DYNAMIC_T_CDLR: u32 = 0x3108_005C;
    pub const DYNAMIC_CONFIG0: u32 = 0x3108_0100;
    pub const DYNAMIC_RAS_CAS0: u32 = 0x3108_0104;
    pub const STATIC_CONFIG0: u32 = 0x3108_0200;
    /// AHB port 0, DMA.
    pub const AHB_CONTROL0: u32 = 0x3108_0400;
    pub const AHB_TIMEOUT0: u32 = 0x3108_0408;
    /// AHB port 3, ARM instruction fetches.
    pub const AHB_CONTROL3: u32 = 0x3108_0460;
    pub const AHB_TIMEOUT3: u32 = 0x3108_0468;
    /// AHB port 4, ARM data accesses.
    pub const AHB_CONTROL4: u32 = 0x3108_0480;
    pub const AHB_TIMEOUT4: u32 = 0x3108_0488;
}

/// Look up the user manual name of a register, for logs and step listings.
pub fn name(address: u32) -> Option<&'static str> {
    let name = match address {
        clkpwr::HCLKDIV_CTRL => "HCLKDIV_CTRL",
        clkpwr::PWR_CTRL => "PWR_CTRL",
        clkpwr::SYSCLK_CTRL => "SYSCLK_CTRL",
        clkpwr::HCLKPLL_CTRL => "HCLKPLL_CTRL",
        clkpwr::SDRAMCLK_CTRL => "SDRAMCLK_CTRL",
        clkpwr::DDR_LAP_NOM => "DDR_LAP_NOM",
        clkpwr::DDR_LAP_COUNT => "DDR_LAP_COUNT",
        emc::CONTROL => "EMCControl",
        emc::CONFIG => "EMCConfig",
        emc::DYNAMIC_CONTROL => "EMCDynamicControl",
        emc::DYNAMIC_REFRESH => "EMCDynamicRefresh",
        emc::DYNAMIC_READ_CONFIG => "EMCDynamicReadConfig",
        emc::DYNAMIC_T_RP => "EMCDynamicTRP",
        emc::DYNAMIC_T_RAS => "EMCDynamicTRAS",
        emc::DYNAMIC_T_SREX => "EMCDynamicTSREX",
        emc::DYNAMIC_T_WR => "EMCDynamicTWR",
        emc::DYNAMIC_T_RC => "EMCDynamicTRC",
        emc::DYNAMIC_T_RFC => "EMCDynamicTRFC",
        emc::DYNAMIC_T_XSR => "EMCDynamicTXSR",
        emc::DYNAMIC_T_RRD => "EMCDynamicTRRD",
        emc::DYNAMIC_T_MRD => "EMCDynamicTMRD",
        emc::DYNAMIC_T_CDLR => "EMCDynamicTCDLR",
        emc::DYNAMIC_CONFIG0 => "EMCDynamicConfig0",
        emc::DYNAMIC_RAS_CAS0 => "EMCDynamicRasCas0",
        emc::STATIC_CONFIG0 => "EMCStaticConfig0",
        emc::AHB_CONTROL0 => "EMCAHBControl0",
        emc::AHB_TIMEOUT0 => "EMCAHBTimeOut0",
        emc::AHB_CONTROL3 => "EMCAHBControl3",
        emc::AHB_TIMEOUT3 => "EMCAHBTimeOut3",
        emc::AHB_CONTROL4 => "EMCAHBControl4",
        emc::AHB_TIMEOUT4 => "EMCAHBTimeOut4",
        _ => return None,
    };

    Some(name)
}

bitfield! {
    /// HCLKPLL_CTRL, the PLL feeding the ARM core and HCLK.
    #[derive(Copy, Clone)]
    pub struct HclkPllCtrl(u32);
    impl Debug;
    /// PLL powered up.
    pub power, set_power: 16;
    /// Bypass the PLL, feeding the post divider with the input clock.
    pub bypass, set_bypass: 15;
    /// Take the output straight from the CCO, skipping the post divider.
    pub direct, set_direct: 14;
    /// Feedback taken from the post divider output instead of the CCO.
    pub feedback, set_feedback: 13;
    /// Post divider, divides by `2 * 2^p`.
    pub u8, p, set_p: 12, 11;
    /// Pre divider, divides by `n + 1`.
    pub u8, n, set_n: 10, 9;
    /// Feedback divider, multiplies by `m + 1`.
    pub u8, m, set_m: 8, 1;
    /// PLL lock status, read only.
    pub locked, _: 0;
}

bitfield! {
    /// HCLKDIV_CTRL, dividers derived from the ARM clock.
    #[derive(Copy, Clone)]
    pub struct HclkDivCtrl(u32);
    impl Debug;
    /// DDR clock: `0` stopped, otherwise the ARM clock divided by this value.
    pub u8, ddram_clk, set_ddram_clk: 8, 7;
    /// Peripheral clock divider, divides by `periph + 1`.
    pub u8, periph, set_periph: 6, 2;
    /// HCLK divider, divides by `2^hclk`.
    pub u8, hclk, set_hclk: 1, 0;
}

bitfield! {
    /// PWR_CTRL, run mode selection.
    #[derive(Copy, Clone)]
    pub struct PwrCtrl(u32);
    impl Debug;
    /// `true` in normal run mode (clocks from the PLL), `false` in direct run mode.
    pub normal_run, set_normal_run: 2;
}

bitfield! {
    /// SYSCLK_CTRL, the SYSCLK source.
    #[derive(Copy, Clone)]
    pub struct SysclkCtrl(u32);
    impl Debug;
    /// Bad phase cycles before switching SYSCLK sources.
    pub u16, bad_phase, set_bad_phase: 11, 2;
    /// SYSCLK taken from the 397x PLL instead of the main oscillator.
    pub pll397, set_pll397: 0;
}

bitfield! {
    /// SDRAMCLK_CTRL, SDRAM clocking and the DDR delay lines.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct SdramClkCtrl(u32);
    impl Debug;
    /// Reset the SDRAM controller and its delay lines.
    pub reset, set_reset: 19;
    /// Command delay.
    pub u8, cmd_delay, set_cmd_delay: 18, 14;
    /// Calibration sensitivity.
    pub u8, sensitivity, set_sensitivity: 12, 10;
    /// Use the calibrated delay values.
    pub calibrated_delays, set_calibrated_delays: 9;
    /// Start a manual calibration.
    pub calibrate, set_calibrate: 8;
    /// DQS input delay.
    pub u8, dqsin_delay, set_dqsin_delay: 6, 2;
    /// DDR SDRAM instead of SDR SDRAM.
    pub ddr_select, set_ddr_select: 1;
    /// Stop all clocks to the SDRAM block.
    pub clocks_disabled, set_clocks_disabled: 0;
}

/// The SDRAM initialization command issued by `EMCDynamicControl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdramCommand {
    Normal,
    Mode,
    PrechargeAll,
    Nop,
}

bitfield! {
    /// EMCDynamicControl.
    #[derive(Copy, Clone)]
    pub struct DynamicControl(u32);
    impl Debug;
    u8, sdram_init, _: 8, 7;
    /// Drive the memory clock all the time.
    pub clock_running, set_clock_running: 1;
    /// Keep clock enable high all the time.
    pub clock_enable_high, set_clock_enable_high: 0;
}

impl DynamicControl {
    /// The SDRAM command this value issues.
    pub fn command(&self) -> SdramCommand {
        match self.sdram_init() {
            0 => SdramCommand::Normal,
            1 => SdramCommand::Mode,
            2 => SdramCommand::PrechargeAll,
            _ => SdramCommand::Nop,
        }
    }
}

bitfield! {
    /// EMCStaticConfig0.
    #[derive(Copy, Clone)]
    pub struct StaticConfig(u32);
    impl Debug;
    /// Byte lane state: `true` drives the byte lane selects low on reads.
    pub byte_lane, set_byte_lane: 7;
    /// Chip select active high.
    pub chip_select_high, set_chip_select_high: 6;
    /// Asynchronous page mode.
    pub page_mode, set_page_mode: 3;
    /// Memory width: `0` 8-bit, `1` 16-bit, `2` 32-bit.
    pub u8, memory_width, set_memory_width: 1, 0;
}

impl StaticConfig {
    /// 16-bit NOR flash, byte lane selects low on reads.
    pub fn nor_flash_16bit() -> Self {
        let mut config = StaticConfig(0);
        config.set_memory_width(1);
        config.set_byte_lane(true);
        config
    }
}

impl From<StaticConfig> for u32 {
    fn from(config: StaticConfig) -> Self {
        config.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn calibration_values_decode() {
        let baseline = SdramClkCtrl(0x0003_DE3E);
        assert!(baseline.ddr_select());
        assert!(baseline.calibrated_delays());
        assert!(!baseline.calibrate());
        assert_eq!(baseline.dqsin_delay(), 15);
        assert_eq!(baseline.sensitivity(), 7);
        assert_eq!(baseline.cmd_delay(), 15);

        let calibrating = SdramClkCtrl(0x0003_DF3E);
        assert!(calibrating.calibrate());

        assert!(SdramClkCtrl(0x0008_0000).reset());
    }

    #[test]
    fn sdram_commands_decode() {
        assert_eq!(DynamicControl(0x183).command(), SdramCommand::Nop);
        assert_eq!(DynamicControl(0x103).command(), SdramCommand::PrechargeAll);
        assert_eq!(DynamicControl(0x083).command(), SdramCommand::Mode);
        assert_eq!(DynamicControl(0x000).command(), SdramCommand::Normal);

        let nop = DynamicControl(0x183);
        assert!(nop.clock_running());
        assert!(nop.clock_enable_high());
    }

    #[test]
    fn nor_flash_static_config() {
        let config = StaticConfig::nor_flash_16bit();
        assert_eq!(u32::from(config), 0x81);
        assert_eq!(config.memory_width(), 1);
        assert!(config.byte_lane());
        assert!(!config.page_mode());
    }

    #[test]
    fn register_names() {
        assert_eq!(name(0x3108_0200), Some("EMCStaticConfig0"));
        assert_eq!(name(0x4000_4070), Some("DDR_LAP_COUNT"));
        assert_eq!(name(DDR_BASE), None);
    }
}
