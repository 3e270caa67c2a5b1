use super::super::{CommandId, Request, SendError, Status};

#[derive(Debug, Clone, Copy)]
pub struct SWJClockRequest {
    /// Clock frequency for SWD and JTAG, in Hz.
    pub clock_speed_hz: u32,
}

impl Request for SWJClockRequest {
    const COMMAND_ID: CommandId = CommandId::SwjClock;

    type Response = SWJClockResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        use scroll::{Pwrite, LE};

        buffer
            .pwrite_with(self.clock_speed_hz, 0, LE)
            .map_err(|_| SendError::NotEnoughData)?;
        Ok(4)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.is_empty() {
            return Err(SendError::NotEnoughData);
        }
        Ok(SWJClockResponse(Status::from_byte(buffer[0])?))
    }
}

#[derive(Debug)]
pub struct SWJClockResponse(pub(crate) Status);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::cmsisdap::commands::test_util::encode;

    #[test]
    fn clock_is_little_endian() {
        let frame = encode(&SWJClockRequest {
            clock_speed_hz: 2_000_000,
        })
        .unwrap();
        assert_eq!(frame, vec![0x11, 0x80, 0x84, 0x1E, 0x00]);
    }
}
