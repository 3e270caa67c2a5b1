use super::super::{CommandId, Request, SendError, Status};

use scroll::{Pread, LE};

/// Read the JTAG IDCODE of one device on the scan chain.
#[derive(Debug, Clone, Copy)]
pub struct IdcodeRequest {
    /// Zero-based index of the device on the JTAG chain.
    pub jtag_index: u8,
}

impl Request for IdcodeRequest {
    const COMMAND_ID: CommandId = CommandId::JtagIdcode;

    type Response = IdcodeResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        buffer[0] = self.jtag_index;
        Ok(1)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.len() < 5 {
            return Err(SendError::NotEnoughData);
        }
        let status = Status::from_byte(buffer[0])?;
        let idcode = buffer
            .pread_with(1, LE)
            .map_err(|_| SendError::NotEnoughData)?;
        Ok(IdcodeResponse { status, idcode })
    }
}

#[derive(Debug)]
pub struct IdcodeResponse {
    pub(crate) status: Status,
    pub idcode: u32,
}
