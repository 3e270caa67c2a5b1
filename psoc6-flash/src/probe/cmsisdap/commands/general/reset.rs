use super::super::{CommandId, Request, SendError, Status};

#[derive(Debug, Clone, Copy)]
pub struct ResetRequest;

impl Request for ResetRequest {
    const COMMAND_ID: CommandId = CommandId::ResetTarget;

    type Response = ResetResponse;

    fn to_bytes(&self, _buffer: &mut [u8]) -> Result<usize, SendError> {
        Ok(0)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.len() < 2 {
            return Err(SendError::NotEnoughData);
        }
        Ok(ResetResponse {
            status: Status::from_byte(buffer[0])?,
            // 1 if the probe implements a device-specific reset sequence.
            execute: buffer[1],
        })
    }
}

#[derive(Debug)]
pub struct ResetResponse {
    pub(crate) status: Status,
    pub(crate) execute: u8,
}
