use super::super::{CommandId, Request, SendError, Status};

use scroll::{Pwrite, LE};

/// Set SWD/JTAG transfer parameters for following transfers.
#[derive(Clone, Copy, Debug)]
pub struct ConfigureRequest {
    /// Number of extra idle cycles after each transfer.
    pub idle_cycles: u8,
    /// Number of transfer retries after WAIT response.
    pub wait_retry: u16,
    /// Number of retries on reads with value match in DAP_Transfer.
    pub match_retry: u16,
}

impl Request for ConfigureRequest {
    const COMMAND_ID: CommandId = CommandId::TransferConfigure;

    type Response = ConfigureResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        buffer[0] = self.idle_cycles;
        buffer
            .pwrite_with(self.wait_retry, 1, LE)
            .map_err(|_| SendError::NotEnoughData)?;
        buffer
            .pwrite_with(self.match_retry, 3, LE)
            .map_err(|_| SendError::NotEnoughData)?;
        Ok(5)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::cmsisdap::commands::test_util::encode;
    use pretty_assertions::assert_eq;

    #[test]
    fn configure_frame() {
        let request = ConfigureRequest {
            idle_cycles: 0,
            wait_retry: 0x0040,
            match_retry: 0,
        };
        assert_eq!(
            encode(&request).unwrap(),
            vec![0x04, 0x00, 0x40, 0x00, 0x00, 0x00]
        );
    }
}
