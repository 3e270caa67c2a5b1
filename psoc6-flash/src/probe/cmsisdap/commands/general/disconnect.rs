use super::super::{CommandId, Request, SendError, Status};

#[derive(Debug, Clone, Copy)]
pub struct DisconnectRequest;

impl Request for DisconnectRequest {
    const COMMAND_ID: CommandId = CommandId::Disconnect;

    type Response = DisconnectResponse;

    fn to_bytes(&self, _buffer: &mut [u8]) -> Result<usize, SendError> {
        Ok(0)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.is_empty() {
            return Err(SendError::NotEnoughData);
        }
        Ok(DisconnectResponse(Status::from_byte(buffer[0])?))
    }
}

#[derive(Debug)]
pub struct DisconnectResponse(pub(crate) Status);
