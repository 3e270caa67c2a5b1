use super::super::{CommandId, Request, SendError, Status};

/// Host-status LED on the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    /// Lit while the probe is connected to a target.
    Connect = 0x00,
    /// Lit while a transfer is running.
    Running = 0x01,
}

#[derive(Debug, Clone, Copy)]
pub struct LedRequest {
    pub led: Led,
    pub on: bool,
}

impl Request for LedRequest {
    const COMMAND_ID: CommandId = CommandId::Led;

    type Response = LedResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        buffer[0] = self.led as u8;
        buffer[1] = self.on as u8;
        Ok(2)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.is_empty() {
            return Err(SendError::NotEnoughData);
        }
        Ok(LedResponse(Status::from_byte(buffer[0])?))
    }
}

#[derive(Debug)]
pub struct LedResponse(pub(crate) Status);
