use super::super::{CommandId, Request, SendError};

use scroll::{Pread, LE};

macro_rules! info_command {
    ($id:expr, $name:ident, $response_type:ty) => {
        #[derive(Clone, Copy, Default, Debug)]
        pub struct $name {}

        impl Request for $name {
            const COMMAND_ID: CommandId = CommandId::Info;

            type Response = $response_type;

            fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
                buffer[0] = $id;
                Ok(1)
            }

            fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
                ParseFromResponse::from_response(buffer)
            }
        }
    };
}

info_command!(0x01, VendorNameCommand, Option<String>);
info_command!(0x02, ProductNameCommand, Option<String>);
info_command!(0x03, SerialNumberCommand, Option<String>);
info_command!(0x04, ProtocolVersionCommand, Option<String>);
info_command!(0x05, TargetDeviceVendorCommand, Option<String>);
info_command!(0x06, TargetDeviceNameCommand, Option<String>);
info_command!(0x07, TargetBoardVendorCommand, Option<String>);
info_command!(0x08, TargetBoardNameCommand, Option<String>);
info_command!(0x09, FirmwareVersionCommand, Option<String>);
info_command!(0xF0, CapabilitiesCommand, Capabilities);
info_command!(0xFE, PacketCountCommand, u8);
info_command!(0xFF, PacketSizeCommand, u16);

trait ParseFromResponse: Sized {
    fn from_response(buffer: &[u8]) -> Result<Self, SendError>;
}

impl ParseFromResponse for Option<String> {
    /// Create a String out of the received buffer.
    ///
    /// The length of the string, including its zero terminator, is read from
    /// the first byte of the buffer. A zero length means no string.
    fn from_response(buffer: &[u8]) -> Result<Self, SendError> {
        if buffer.is_empty() {
            return Err(SendError::NotEnoughData);
        }
        match buffer[0] as usize {
            0 => Ok(None),
            n => {
                if buffer.len() < 1 + n {
                    return Err(SendError::NotEnoughData);
                }
                let res = std::str::from_utf8(&buffer[1..1 + n])?;
                Ok(Some(res.trim_end_matches('\0').to_owned()))
            }
        }
    }
}

impl ParseFromResponse for u8 {
    fn from_response(buffer: &[u8]) -> Result<Self, SendError> {
        if buffer.len() < 2 || buffer[0] != 1 {
            Err(SendError::UnexpectedAnswer)
        } else {
            Ok(buffer[1])
        }
    }
}

impl ParseFromResponse for u16 {
    fn from_response(buffer: &[u8]) -> Result<Self, SendError> {
        if buffer.len() < 3 || buffer[0] != 2 {
            Err(SendError::UnexpectedAnswer)
        } else {
            buffer.pread_with(1, LE).map_err(|_| SendError::NotEnoughData)
        }
    }
}

/// Capabilities of a CMSIS-DAP probe.
#[derive(Copy, Clone, Debug, Default)]
pub struct Capabilities {
    pub swd_implemented: bool,
    pub jtag_implemented: bool,
    pub swo_uart_implemented: bool,
    pub swo_manchester_implemented: bool,
    pub atomic_commands_implemented: bool,
    pub test_domain_timer_implemented: bool,
}

impl ParseFromResponse for Capabilities {
    fn from_response(buffer: &[u8]) -> Result<Self, SendError> {
        // The response can contain one or two info bytes; only the first
        // byte is described by the specification, so only that is parsed.
        if buffer.len() >= 2 && buffer[0] > 0 {
            Ok(Capabilities {
                swd_implemented: buffer[1] & 0x01 > 0,
                jtag_implemented: buffer[1] & 0x02 > 0,
                swo_uart_implemented: buffer[1] & 0x04 > 0,
                swo_manchester_implemented: buffer[1] & 0x08 > 0,
                atomic_commands_implemented: buffer[1] & 0x10 > 0,
                test_domain_timer_implemented: buffer[1] & 0x20 > 0,
            })
        } else {
            Err(SendError::UnexpectedAnswer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::cmsisdap::commands::test_util::encode;

    #[test]
    fn info_request_frame() {
        assert_eq!(encode(&PacketSizeCommand {}).unwrap(), vec![0x00, 0xFF]);
        assert_eq!(encode(&VendorNameCommand {}).unwrap(), vec![0x00, 0x01]);
    }

    #[test]
    fn parse_packet_size() {
        let cmd = PacketSizeCommand {};
        assert_eq!(cmd.parse_response(&[0x02, 0x40, 0x00]).unwrap(), 64);
    }

    #[test]
    fn parse_string_with_terminator() {
        let cmd = ProductNameCommand {};
        let response = [0x05, b'D', b'A', b'P', b'!', 0x00];
        assert_eq!(cmd.parse_response(&response).unwrap().unwrap(), "DAP!");
    }

    #[test]
    fn parse_missing_string() {
        let cmd = SerialNumberCommand {};
        assert_eq!(cmd.parse_response(&[0x00]).unwrap(), None);
    }
}
