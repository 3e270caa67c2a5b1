use super::super::{CommandId, Request, SendError, Status};

/// Configure the SWD turnaround period and data phase behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigureRequest {
    /// Turnaround clock period: 0 = 1 cycle .. 3 = 4 cycles.
    pub turnaround: u8,
    /// Always generate a data phase, even on WAIT/FAULT.
    pub always_data_phase: bool,
}

impl Request for ConfigureRequest {
    const COMMAND_ID: CommandId = CommandId::SwdConfigure;

    type Response = ConfigureResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        buffer[0] = (self.turnaround & 0x03) | (u8::from(self.always_data_phase) << 2);
        Ok(1)
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
