//! CMSIS-DAP command encoding and the request/response exchange.

pub mod general;
pub mod jtag;
pub mod swd;
pub mod swj;
pub mod transfer;

use crate::probe::DapDevice;
use std::str::Utf8Error;

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Error in the USB HID access")]
    HidApi(#[from] hidapi::HidError),
    #[error("Error in the device access")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Not enough data in response from probe")]
    NotEnoughData,
    #[error("Status can only be 0x00 or 0xFF")]
    InvalidResponseStatus,
    #[error("Connecting to target failed, received: {0:#x}")]
    ConnectResponseError(u8),
    #[error("Command ID in response ({0:#04x}) does not match sent command ID")]
    CommandIdMismatch(u8),
    /// String in response is not valid UTF-8.
    ///
    /// Strings are required to be UTF-8 encoded by the
    /// CMSIS-DAP specification.
    #[error("String in response is not valid UTF-8")]
    InvalidString(#[from] Utf8Error),
    #[error("Unexpected answer to command")]
    UnexpectedAnswer,
    #[error("Too much data provided for SWJ Sequence command")]
    TooMuchData,
    #[error("Timeout in USB communication")]
    Timeout,
}

/// HID report id prepended to every outbound report.
pub(crate) const REPORT_ID: u8 = 0x00;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Status {
    DapOk = 0x00,
    DapError = 0xFF,
}

impl Status {
    pub fn from_byte(value: u8) -> Result<Self, SendError> {
        match value {
            0x00 => Ok(Status::DapOk),
            0xFF => Ok(Status::DapError),
            _ => Err(SendError::InvalidResponseStatus),
        }
    }
}

/// Command ID for CMSIS-DAP commands.
///
/// The command ID is always sent as the first byte of every command and is
/// echoed as the first byte of every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    Info = 0x00,
    Led = 0x01,
    Connect = 0x02,
    Disconnect = 0x03,
    TransferConfigure = 0x04,
    Transfer = 0x05,
    TransferBlock = 0x06,
    TransferAbort = 0x07,
    WriteAbort = 0x08,
    Delay = 0x09,
    ResetTarget = 0x0A,
    SwjPins = 0x10,
    SwjClock = 0x11,
    SwjSequence = 0x12,
    SwdConfigure = 0x13,
    JtagSequence = 0x14,
    JtagConfigure = 0x15,
    JtagIdcode = 0x16,
}

pub(crate) trait Request {
    const COMMAND_ID: CommandId;

    type Response;

    /// Convert the request to bytes, which can be sent to the probe.
    /// Returns the amount of bytes written to the buffer.
    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError>;

    /// Parse the response to this request from the bytes following the
    /// echoed command ID.
    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError>;
}

/// Exchange one command with the probe.
///
/// One outbound report is written: report id, command id, request payload,
/// zero-padded to the full report size. One inbound report is read back and
/// the report id is stripped before the response is parsed.
pub(crate) fn send_command<R: Request>(
    device: &mut dyn DapDevice,
    report_size: usize,
    request: &R,
) -> Result<R::Response, SendError> {
    let mut buffer = vec![0; report_size + 1];

    buffer[0] = REPORT_ID;
    buffer[1] = R::COMMAND_ID as u8;
    let size = request.to_bytes(&mut buffer[2..])? + 2;
    debug_assert!(size <= buffer.len());

    device.write_report(&buffer)?;
    trace_buffer("Transmit buffer", &buffer);

    let bytes_read = device.read_report(&mut buffer)?;
    if bytes_read < 2 {
        return Err(SendError::NotEnoughData);
    }

    // Strip the report id.
    let response = &buffer[1..bytes_read];
    trace_buffer("Receive buffer", response);

    if response[0] == R::COMMAND_ID as u8 {
        request.parse_response(&response[1..])
    } else {
        Err(SendError::CommandIdMismatch(response[0]))
    }
}

/// Trace log a buffer, including only the first trailing zero.
///
/// The CMSIS-DAP USB buffers contain many trailing zeros required by the
/// fixed report size, which make the trace output very long and difficult
/// to read.
fn trace_buffer(name: &str, buf: &[u8]) {
    if tracing::enabled!(tracing::Level::TRACE) {
        let len = buf.len();
        let cut = len + 1 - buf.iter().rev().position(|&x| x != 0).unwrap_or(len);
        let end = len.min(cut.max(1));
        tracing::trace!("{}: {:02X?}...", name, &buf[..end]);
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::{Request, SendError};

    /// Encode a request into the full command frame (command id + payload),
    /// without the report id.
    pub(crate) fn encode<R: Request>(request: &R) -> Result<Vec<u8>, SendError> {
        let mut buffer = vec![0u8; 64];
        buffer[0] = R::COMMAND_ID as u8;
        let size = request.to_bytes(&mut buffer[1..])?;
        buffer.truncate(1 + size);
        Ok(buffer)
    }
}
