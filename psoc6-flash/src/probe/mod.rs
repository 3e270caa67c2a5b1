//! Probe transport: the byte-stream device abstraction and the CMSIS-DAP
//! report layer built on top of it.

pub mod cmsisdap;

pub use cmsisdap::CmsisDap;

use cmsisdap::commands::SendError;

/// The wire protocol between probe and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireProtocol {
    /// Serial Wire Debug.
    Swd,
    /// JTAG.
    Jtag,
}

impl std::fmt::Display for WireProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireProtocol::Swd => f.write_str("SWD"),
            WireProtocol::Jtag => f.write_str("JTAG"),
        }
    }
}

/// An open connection to a CMSIS-DAP device, as a raw report stream.
///
/// The core never opens or enumerates devices itself; the caller performs
/// VID/PID filtering and hands over an exclusively owned handle. One report
/// is written, then one report is read back, strictly in order. Implemented
/// for [`hidapi::HidDevice`]; any HID-like fixed-report-size byte stream can
/// implement it.
pub trait DapDevice: Send {
    /// Write one report, returning the number of bytes written.
    fn write_report(&mut self, buf: &[u8]) -> Result<usize, SendError>;

    /// Read one report into `buf`, returning the number of bytes read.
    fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, SendError>;
}

impl DapDevice for hidapi::HidDevice {
    fn write_report(&mut self, buf: &[u8]) -> Result<usize, SendError> {
        Ok(self.write(buf)?)
    }

    fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, SendError> {
        // A timeout is reported as zero bytes read, not as an error.
        match self.read_timeout(buf, 100)? {
            0 => Err(SendError::Timeout),
            n => Ok(n),
        }
    }
}
