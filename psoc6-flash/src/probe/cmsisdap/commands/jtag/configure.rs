use super::super::{CommandId, Request, SendError, Status};

/// Configure the JTAG scan chain: IR length per device, device 0 first.
#[derive(Debug, Clone)]
pub struct ConfigureRequest {
    pub ir_lengths: Vec<u8>,
}

impl Request for ConfigureRequest {
    const COMMAND_ID: CommandId = CommandId::JtagConfigure;

    type Response = ConfigureResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        if self.ir_lengths.len() + 1 > buffer.len() {
            return Err(SendError::TooMuchData);
        }
        buffer[0] = self.ir_lengths.len() as u8;
        buffer[1..1 + self.ir_lengths.len()].copy_from_slice(&self.ir_lengths);
        Ok(1 + self.ir_lengths.len())
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.is_empty() {
            return Err(SendError::NotEnoughData);
        }
        Ok(ConfigureResponse(Status::from_byte(buffer[0])?))
    }
}

#[derive(Debug)]
pub struct ConfigureResponse(pub(crate) Status);
