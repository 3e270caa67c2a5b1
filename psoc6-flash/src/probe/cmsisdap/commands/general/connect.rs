use super::super::{CommandId, Request, SendError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectRequest {
    UseDefaultPort = 0x00,
    UseSwd = 0x01,
    UseJtag = 0x02,
}

impl Request for ConnectRequest {
    const COMMAND_ID: CommandId = CommandId::Connect;

    type Response = ConnectResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        buffer[0] = *self as u8;
        Ok(1)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.is_empty() {
            return Err(SendError::NotEnoughData);
        }
        match buffer[0] {
            0 => Ok(ConnectResponse::InitFailed),
            1 => Ok(ConnectResponse::SuccessfulInitForSwd),
            2 => Ok(ConnectResponse::SuccessfulInitForJtag),
            other => Err(SendError::ConnectResponseError(other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectResponse {
    InitFailed = 0x00,
    SuccessfulInitForSwd = 0x01,
    SuccessfulInitForJtag = 0x02,
}
