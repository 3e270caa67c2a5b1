//! # CMSIS-DAP flashing engine for PSoC6
//!
//! This crate talks to an Infineon PSoC6 microcontroller through a CMSIS-DAP
//! debug probe: it brings up the debug port, acquires the target, invokes the
//! on-die SROM bootloader API over the IPC hardware channel, and erases,
//! programs and verifies flash.
//!
//! The transport is any HID-like device exchanging fixed-size reports; the
//! [`probe::DapDevice`] trait is implemented for [`hidapi::HidDevice`] out of
//! the box, and device discovery/VID-PID filtering is left to the caller.
//!
//! ## Programming a device
//!
//! ```no_run
//! use psoc6_flash::probe::CmsisDap;
//! use psoc6_flash::psoc6::{AccessPort, AcquireMode, Psoc6Programmer};
//! use psoc6_flash::target;
//!
//! # fn main() -> Result<(), psoc6_flash::Error> {
//! let api = hidapi::HidApi::new().unwrap();
//! let device = api.open(0x0D28, 0x0204).unwrap();
//!
//! let probe = CmsisDap::new(Box::new(device))?;
//! let profile = target::from_family_id(0x102)?;
//! let mut programmer = Psoc6Programmer::new(probe, profile);
//!
//! programmer.acquire(AcquireMode::Reset, true, AccessPort::Auto)?;
//!
//! let image = vec![0u8; 512];
//! let base = profile.flash_base;
//! programmer.erase_flash(base, base + image.len() as u32)?;
//! programmer.program_flash(&image, base)?;
//! programmer.verify_flash(&image, base)?;
//! # Ok(())
//! # }
//! ```

pub mod architecture;
mod error;
pub mod probe;
mod progress;
pub mod psoc6;
pub mod target;

pub use error::{Error, PollOperation, ProtocolError};
pub use progress::{FlashProgress, ProgressEvent};
