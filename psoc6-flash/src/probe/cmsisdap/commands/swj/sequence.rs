//! Implementation of the DAP_SWJ_SEQUENCE command.

use super::super::{CommandId, Request, SendError, Status};

#[derive(Clone, Copy, Debug)]
pub struct SequenceRequest {
    bit_count: u8,
    data: [u8; 32],
    len: usize,
}

impl SequenceRequest {
    /// Build a sequence from whole bytes, clocked LSB first.
    ///
    /// A sequence longer than 32 bytes cannot be expressed in one command.
    pub(crate) fn new(data: &[u8]) -> Result<SequenceRequest, SendError> {
        if data.len() > 32 {
            return Err(SendError::TooMuchData);
        }

        // A bit count of zero means 256 bits.
        let bit_count = match data.len() {
            32 => 0,
            x => (x * 8) as u8,
        };

        let mut owned_data = [0u8; 32];
        owned_data[..data.len()].copy_from_slice(data);

        Ok(SequenceRequest {
            bit_count,
            data: owned_data,
            len: data.len(),
        })
    }
}

impl Request for SequenceRequest {
    const COMMAND_ID: CommandId = CommandId::SwjSequence;

    type Response = SequenceResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        buffer[0] = self.bit_count;
        buffer[1..(1 + self.len)].copy_from_slice(&self.data[..self.len]);
        Ok(1 + self.len)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::cmsisdap::commands::test_util::encode;

    #[test]
    fn sixteen_byte_line_reset_sequence() {
        let seq = [
            0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x9E, 0xE7, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFF, 0x00,
        ];
        let frame = encode(&SequenceRequest::new(&seq).unwrap()).unwrap();
        assert_eq!(frame[0], 0x12);
        // 16 bytes = 128 clocks.
        assert_eq!(frame[1], 0x80);
        assert_eq!(&frame[2..], &seq);
    }
}
