use super::super::{CommandId, Request, SendError, Status};

use scroll::{Pwrite, LE};

/// Write an abort request to the DP ABORT register.
///
/// Unlike a regular transfer, this write goes through even when a previous
/// transfer is stuck on a WAIT response.
#[derive(Clone, Copy, Debug)]
pub struct WriteAbortRequest {
    /// Zero-based device index of the selected JTAG device. For SWD mode
    /// the value is ignored.
    pub dap_index: u8,
    /// Value written to the ABORT register.
    pub abort: u32,
}

impl Request for WriteAbortRequest {
    const COMMAND_ID: CommandId = CommandId::WriteAbort;

    type Response = WriteAbortResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        buffer[0] = self.dap_index;
        buffer
            .pwrite_with(self.abort, 1, LE)
            .map_err(|_| SendError::NotEnoughData)?;
        Ok(5)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.is_empty() {
            return Err(SendError::NotEnoughData);
        }
        Ok(WriteAbortResponse(Status::from_byte(buffer[0])?))
    }
}

#[derive(Debug)]
pub struct WriteAbortResponse(pub(crate) Status);
