//! # Target scripts for NXP LPC32xx boards
//!
//! A host debugger calls into these scripts when it resets an LPC3230 based
//! board (the Orion1040) so that the CPU is halted with its caches off, the
//! clocks run from the PLL, DDR SDRAM is initialized and the NOR flash on
//! static bank 0 is readable.
//!
//! The scripts only need a [`TargetInterface`], which the host provides. The
//! bring-up itself is data: ordered [`Step`] tables interpreted by a
//! [`Sequence`].
//!
//! ## Resetting the board
//!
//! ```
//! # use lpc32xx_init::Error;
//! use lpc32xx_init::{RecordingInterface, ScriptKind};
//!
//! // Any `TargetInterface` works here, the recorder just logs what would be sent.
//! let mut interface = RecordingInterface::new();
//!
//! let script = ScriptKind::Orion1040.create();
//! script.reset(&mut interface)?;
//!
//! assert!(!interface.operations().is_empty());
//! # Ok::<(), Error>(())
//! ```
//!
//! ## Running only the DDR bring-up
//!
//! ```
//! # use lpc32xx_init::Error;
//! use lpc32xx_init::{ddr, RecordingInterface};
//!
//! let mut interface = RecordingInterface::new();
//! ddr::bring_up().run(&mut interface)?;
//! # Ok::<(), Error>(())
//! ```

pub mod calibration;
pub mod clocks;
pub mod coprocessor;
pub mod ddr;
mod error;
#[warn(missing_docs)]
mod interface;
pub mod memtest;
#[warn(missing_docs)]
mod recorder;
pub mod registers;
#[warn(missing_docs)]
pub mod script;
#[warn(missing_docs)]
mod sequence;

pub use crate::coprocessor::{CoprocessorRegister, SystemControl};
pub use crate::error::Error;
pub use crate::interface::TargetInterface;
pub use crate::recorder::{Operation, RecordingInterface};
pub use crate::script::{ScriptKind, TargetScript};
pub use crate::sequence::{Sequence, Step};
