use std::time::Duration;

use crate::{CoprocessorRegister, Error};

/// Register level access to the target, supplied by the host debugger.
///
/// The scripts assume exclusive access to the target for as long as they run;
/// implementations do not need to lock anything on their behalf. Failures are
/// returned as [`Error::Interface`] and are passed up unchanged.
pub trait TargetInterface {
    /// Reset the CPU and keep it stopped.
    ///
    /// `mode` is the host specific boot-mode flag. The LPC32xx scripts always
    /// pass `1`.
    fn halt_and_hold(&mut self, mode: u32) -> Result<(), Error>;

    /// Read a 32-bit word from `address`.
    fn read_word_32(&mut self, address: u32) -> Result<u32, Error>;

    /// Write a 32-bit word to `address`.
    fn write_word_32(&mut self, address: u32, value: u32) -> Result<(), Error>;

    /// Wait for `duration` before issuing the next access.
    fn delay(&mut self, duration: Duration) -> Result<(), Error>;

    /// Read a coprocessor register by executing an MRC on the halted core.
    fn read_coprocessor(&mut self, register: CoprocessorRegister) -> Result<u32, Error>;

    /// Write a coprocessor register by executing an MCR on the halted core.
    fn write_coprocessor(&mut self, register: CoprocessorRegister, value: u32)
        -> Result<(), Error>;

    /// Read an EmbeddedICE (ICE-breaker) register by its hardware index.
    fn read_ice_breaker(&mut self, index: u8) -> Result<u32, Error>;

    /// Make sure all previously issued writes reached the target.
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
