use super::super::{CommandId, Request, SendError, Status};

/// Ask the probe itself to wait before processing the next command.
#[derive(Debug, Clone, Copy)]
pub struct DelayRequest {
    /// Delay in microseconds.
    pub delay_us: u16,
}

impl Request for DelayRequest {
    const COMMAND_ID: CommandId = CommandId::Delay;

    type Response = DelayResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        use scroll::{Pwrite, LE};

        buffer
            .pwrite_with(self.delay_us, 0, LE)
            .map_err(|_| SendError::NotEnoughData)?;
        Ok(2)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.is_empty() {
            return Err(SendError::NotEnoughData);
        }
        Ok(DelayResponse(Status::from_byte(buffer[0])?))
    }
}

#[derive(Debug)]
pub struct DelayResponse(pub(crate) Status);
