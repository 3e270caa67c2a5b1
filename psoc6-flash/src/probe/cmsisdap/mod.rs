//! CMSIS-DAP probe: report framing and one typed method per probe command.

pub mod commands;

use crate::error::{Error, ProtocolError};
use crate::probe::{DapDevice, WireProtocol};

use commands::general::connect::{ConnectRequest, ConnectResponse};
use commands::general::delay::DelayRequest;
use commands::general::disconnect::DisconnectRequest;
use commands::general::info::{self, Capabilities};
use commands::general::led::{Led, LedRequest};
use commands::general::reset::ResetRequest;
use commands::jtag;
use commands::swd;
use commands::swj::clock::SWJClockRequest;
use commands::swj::pins::{Pins, SWJPinsRequest};
use commands::swj::sequence::SequenceRequest;
use commands::transfer::abort::WriteAbortRequest;
use commands::transfer::configure::ConfigureRequest;
use commands::transfer::{TransferBlockRequest, TransferBlockResponse, TransferRequest, TransferResponse};
use commands::{send_command, Request, SendError, Status};

/// Report size assumed until the probe states its own.
const DEFAULT_PACKET_SIZE: u16 = 64;

/// Smallest report size the driver operates with. Keeps room for the report
/// id, the block transfer header and at least one data word, so no command
/// encoder can run out of buffer and no chunk size can reach zero.
const MINIMUM_PACKET_SIZE: u16 = 16;

/// A CMSIS-DAP probe attached through a [`DapDevice`] report stream.
///
/// Construction negotiates the report size and collects the probe's identity
/// strings. Every other method maps to exactly one probe command.
pub struct CmsisDap {
    device: Box<dyn DapDevice>,
    packet_size: u16,
    packet_count: u8,
    capabilities: Capabilities,
    vendor_name: Option<String>,
    product_name: Option<String>,
    serial_number: Option<String>,
    firmware_version: Option<String>,
}

impl std::fmt::Debug for CmsisDap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsisDap")
            .field("packet_size", &self.packet_size)
            .field("packet_count", &self.packet_count)
            .field("capabilities", &self.capabilities)
            .field("vendor_name", &self.vendor_name)
            .field("product_name", &self.product_name)
            .field("serial_number", &self.serial_number)
            .field("firmware_version", &self.firmware_version)
            .finish()
    }
}

impl CmsisDap {
    /// Take ownership of an opened device and query its properties.
    pub fn new(device: Box<dyn DapDevice>) -> Result<Self, Error> {
        let mut probe = Self {
            device,
            packet_size: DEFAULT_PACKET_SIZE,
            packet_count: 1,
            capabilities: Capabilities::default(),
            vendor_name: None,
            product_name: None,
            serial_number: None,
            firmware_version: None,
        };

        // The size query itself still runs with the default report size.
        let reported = probe.send(&info::PacketSizeCommand {})?;
        if reported < MINIMUM_PACKET_SIZE {
            tracing::warn!(
                "Probe reports an unusable packet size of {reported}, \
                 clamping to {MINIMUM_PACKET_SIZE}"
            );
        }
        probe.packet_size = reported.max(MINIMUM_PACKET_SIZE);
        tracing::debug!("Probe report packet size: {}", probe.packet_size);

        probe.packet_count = probe.send(&info::PacketCountCommand {})?;
        probe.capabilities = probe.send(&info::CapabilitiesCommand {})?;
        tracing::debug!("Probe capabilities: {:?}", probe.capabilities);

        probe.vendor_name = probe.send(&info::VendorNameCommand {})?;
        probe.product_name = probe.send(&info::ProductNameCommand {})?;
        probe.serial_number = probe.send(&info::SerialNumberCommand {})?;
        probe.firmware_version = probe.send(&info::FirmwareVersionCommand {})?;
        tracing::info!(
            "Probe: {} {} (serial {}, firmware {})",
            probe.vendor_name.as_deref().unwrap_or("<unknown vendor>"),
            probe.product_name.as_deref().unwrap_or("<unknown product>"),
            probe.serial_number.as_deref().unwrap_or("-"),
            probe.firmware_version.as_deref().unwrap_or("-"),
        );

        Ok(probe)
    }

    fn send<R: Request>(&mut self, request: &R) -> Result<R::Response, SendError> {
        send_command(&mut *self.device, self.packet_size as usize, request)
    }

    /// Negotiated HID report size in bytes.
    pub fn packet_size(&self) -> u16 {
        self.packet_size
    }

    /// Maximum number of outstanding reports the probe buffers.
    pub fn packet_count(&self) -> u8 {
        self.packet_count
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    /// Number of data words that fit in one block transfer report next to
    /// the report id and the block header.
    pub fn block_word_capacity(&self) -> usize {
        (self.packet_size as usize - 5) / 4
    }

    /// Connect the probe to the target with the given wire protocol.
    pub fn connect(&mut self, protocol: WireProtocol) -> Result<(), Error> {
        let request = match protocol {
            WireProtocol::Swd => ConnectRequest::UseSwd,
            WireProtocol::Jtag => ConnectRequest::UseJtag,
        };
        let expected = match protocol {
            WireProtocol::Swd => ConnectResponse::SuccessfulInitForSwd,
            WireProtocol::Jtag => ConnectResponse::SuccessfulInitForJtag,
        };
        let response = self.send(&request)?;
        if response != expected {
            tracing::warn!("Probe refused {protocol} connection: {response:?}");
            return Err(ProtocolError::ErrorResponse.into());
        }
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<(), Error> {
        let response = self.send(&DisconnectRequest)?;
        succeeded(response.0)
    }

    pub fn transfer_configure(&mut self, config: ConfigureRequest) -> Result<(), Error> {
        let response = self.send(&config)?;
        succeeded(response.0)
    }

    /// Set the SWD/JTAG clock frequency in Hz.
    pub fn set_swj_clock(&mut self, clock_speed_hz: u32) -> Result<(), Error> {
        let response = self.send(&SWJClockRequest { clock_speed_hz })?;
        succeeded(response.0)
    }

    /// Clock out a raw SWDIO/TMS bit sequence, LSB of each byte first.
    pub fn swj_sequence(&mut self, data: &[u8]) -> Result<(), Error> {
        let request = SequenceRequest::new(data)?;
        let response = self.send(&request)?;
        succeeded(response.0)
    }

    /// Drive the SWJ pins and read all pin states back.
    pub fn swj_pins(&mut self, request: SWJPinsRequest) -> Result<Pins, Error> {
        Ok(self.send(&request)?)
    }

    pub fn swd_configure(&mut self, config: swd::configure::ConfigureRequest) -> Result<(), Error> {
        let response = self.send(&config)?;
        succeeded(response.0)
    }

    pub fn jtag_configure(&mut self, ir_lengths: Vec<u8>) -> Result<(), Error> {
        let response = self.send(&jtag::configure::ConfigureRequest { ir_lengths })?;
        succeeded(response.0)
    }

    /// Clock out a raw TDI sequence with TMS held fixed.
    pub fn jtag_sequence(&mut self, data: &[u8]) -> Result<(), Error> {
        let request = jtag::sequence::SequenceRequest::new(data)?;
        let response = self.send(&request)?;
        succeeded(response.0)
    }

    /// Read the JTAG IDCODE of the device at `jtag_index` on the chain.
    pub fn jtag_idcode(&mut self, jtag_index: u8) -> Result<u32, Error> {
        let response = self.send(&jtag::idcode::IdcodeRequest { jtag_index })?;
        succeeded(response.status)?;
        Ok(response.idcode)
    }

    /// Run the probe's device-specific reset sequence, if it has one.
    ///
    /// Returns whether the probe actually implements such a sequence.
    pub fn reset_target(&mut self) -> Result<bool, Error> {
        let response = self.send(&ResetRequest)?;
        succeeded(response.status)?;
        Ok(response.execute == 1)
    }

    pub fn set_led(&mut self, led: Led, on: bool) -> Result<(), Error> {
        let response = self.send(&LedRequest { led, on })?;
        succeeded(response.0)
    }

    /// Ask the probe to wait `delay_us` microseconds before the next command.
    pub fn delay(&mut self, delay_us: u16) -> Result<(), Error> {
        let response = self.send(&DelayRequest { delay_us })?;
        succeeded(response.0)
    }

    /// Write the DP ABORT register, bypassing a stuck transfer.
    pub fn write_abort(&mut self, abort: u32) -> Result<(), Error> {
        let response = self.send(&WriteAbortRequest { dap_index: 0, abort })?;
        succeeded(response.0)
    }

    /// Execute a batch of single-word transfers.
    pub fn transfer(&mut self, request: &TransferRequest) -> Result<TransferResponse, Error> {
        Ok(self.send(request)?)
    }

    /// Execute a block transfer against one register.
    pub fn transfer_block(
        &mut self,
        request: &TransferBlockRequest,
    ) -> Result<TransferBlockResponse, Error> {
        Ok(self.send(request)?)
    }
}

fn succeeded(status: Status) -> Result<(), Error> {
    match status {
        Status::DapOk => Ok(()),
        Status::DapError => Err(ProtocolError::ErrorResponse.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A device whose info responses claim an absurdly small report size.
    struct TinyReportDevice {
        response: Option<Vec<u8>>,
    }

    impl DapDevice for TinyReportDevice {
        fn write_report(&mut self, buf: &[u8]) -> Result<usize, SendError> {
            // buf[0] is the report id, buf[1] the command, buf[2] the info id.
            self.response = Some(match (buf[1], buf.get(2)) {
                (0x00, Some(0xFF)) => vec![0x00, 2, 2, 0],
                (0x00, Some(0xFE)) => vec![0x00, 1, 1],
                (0x00, Some(0xF0)) => vec![0x00, 1, 0x01],
                _ => vec![0x00, 0x00],
            });
            Ok(buf.len())
        }

        fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, SendError> {
            let response = self.response.take().ok_or(SendError::Timeout)?;
            buf[0] = 0x00;
            buf[1..1 + response.len()].copy_from_slice(&response);
            Ok(1 + response.len())
        }
    }

    #[test]
    fn undersized_report_size_is_clamped() {
        let probe = CmsisDap::new(Box::new(TinyReportDevice { response: None }))
            .expect("probe discovery");
        assert_eq!(probe.packet_size(), MINIMUM_PACKET_SIZE);
        assert!(probe.block_word_capacity() >= 1);
    }
}
