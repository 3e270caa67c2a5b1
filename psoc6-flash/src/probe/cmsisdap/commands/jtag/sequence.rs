use super::super::{CommandId, Request, SendError, Status};

/// Generate a raw TDI sequence with fixed TMS, capturing nothing.
///
/// Each info byte describes up to 64 TCK cycles; this command only carries
/// pre-built sequence bytes, mirroring the probe firmware's expectations.
#[derive(Debug, Clone)]
pub struct SequenceRequest {
    sequences: Vec<u8>,
}

impl SequenceRequest {
    pub(crate) fn new(sequences: &[u8]) -> Result<Self, SendError> {
        if sequences.len() > 255 {
            return Err(SendError::TooMuchData);
        }
        Ok(Self {
            sequences: sequences.to_vec(),
        })
    }
}

impl Request for SequenceRequest {
    const COMMAND_ID: CommandId = CommandId::JtagSequence;

    type Response = SequenceResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        if self.sequences.len() + 1 > buffer.len() {
            return Err(SendError::TooMuchData);
        }
        buffer[0] = self.sequences.len() as u8;
        buffer[1..1 + self.sequences.len()].copy_from_slice(&self.sequences);
        Ok(1 + self.sequences.len())
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.is_empty() {
            return Err(SendError::NotEnoughData);
        }
        Ok(SequenceResponse(Status::from_byte(buffer[0])?))
    }
}

#[derive(Debug)]
pub struct SequenceResponse(pub(crate) Status);
