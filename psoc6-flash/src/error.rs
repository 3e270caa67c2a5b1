use crate::probe::cmsisdap::commands::SendError;
use thiserror::Error;

/// All the ways a programming session can fail.
#[derive(Error, Debug)]
pub enum Error {
    /// The USB transport returned a short or malformed report, or the
    /// underlying device I/O failed. The device handle should be considered
    /// invalid and reopened by the caller.
    #[error("An error occurred in the CMSIS-DAP transport")]
    Transport(#[from] SendError),
    /// The probe or target answered, but not with what the protocol requires.
    #[error("A DAP protocol error occurred")]
    Protocol(#[from] ProtocolError),
    /// A bounded polling loop ran out of budget.
    #[error("Timed out while polling for {0}")]
    Timeout(PollOperation),
    /// Flash readback did not match the expected image.
    #[error("Flash verification failed at address {address:#010x}")]
    Verification {
        /// First mismatching target address.
        address: u32,
    },
    /// The SROM checksum call disagreed with the expected value.
    #[error("Flash checksum mismatch: expected {expected:#09x}, computed {actual:#09x}")]
    ChecksumMismatch {
        /// 28-bit checksum the caller expected.
        expected: u32,
        /// 28-bit checksum the target computed.
        actual: u32,
    },
    /// A register access was attempted before the debug port was initialized.
    #[error("The debug port has not been initialized")]
    NotInitialized,
    /// The AP scan finished without finding a single usable access port.
    #[error("No usable access port was found during the AP scan")]
    NoAccessPort,
    /// The family id does not name a known PSoC6 family.
    #[error("Unknown PSoC6 family id {0:#06x}")]
    UnknownFamily(u16),
    /// Test-mode acquisition wrote the test-mode bit but it did not latch.
    #[error("The test mode bit did not latch")]
    TestModeNotSet,
    /// Test-mode acquisition found the core executing outside boot code.
    #[error("Program counter {pc:#010x} is outside ROM and flash")]
    PcOutsideBootCode {
        /// Program counter read back from the core.
        pc: u32,
    },
    /// The core did not report the halted state after a halt request.
    #[error("The CPU did not halt")]
    CoreNotHalted,
    /// The operation exists in the programming specification but is not
    /// supported by this crate.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

/// Protocol-level failures: the report arrived, its contents are wrong.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The acknowledgement nibble of a transfer did not match the wire
    /// protocol in use (0x01 for SWD, 0x02 for JTAG).
    #[error("ACK mismatch: expected {expected:#04x}, got {actual:#04x}")]
    AckMismatch {
        /// Acknowledgement value the active protocol requires.
        expected: u8,
        /// Acknowledgement value found in the response.
        actual: u8,
    },
    /// The response was well-framed but too short for the data it must carry.
    #[error("Response to {0} is too short")]
    ShortResponse(&'static str),
    /// The probe reported the DAP_ERROR status byte.
    #[error("The probe responded with an error status")]
    ErrorResponse,
}

/// The polling loops that can exhaust their time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOperation {
    /// Line reset and IDCODE probing during the handshake.
    Handshake,
    /// Waiting for an IPC channel lock to reach the expected state.
    IpcLock,
    /// Waiting for an SROM API call to report success.
    SromStatus,
    /// Waiting for the CPU to halt after a reset.
    CoreHalt,
}

impl std::fmt::Display for PollOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PollOperation::Handshake => "the DAP handshake",
            PollOperation::IpcLock => "the IPC lock status",
            PollOperation::SromStatus => "the SROM API status",
            PollOperation::CoreHalt => "the CPU halt status",
        };
        f.write_str(name)
    }
}
