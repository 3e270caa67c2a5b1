pub mod abort;
pub mod configure;

use super::{CommandId, Request, SendError};
use crate::architecture::arm::dp;
use scroll::{Pread, Pwrite, LE};

/// Acknowledgement values found in transfer responses.
///
/// SWD reports OK as 0x01; JTAG reports OK (or FAULT) as 0x02. The driver
/// compares the raw acknowledgement byte against the value its wire protocol
/// requires.
pub mod ack {
    /// SWD OK.
    pub const SWD_OK: u8 = 0x01;
    /// JTAG OK/FAULT.
    pub const JTAG_OK: u8 = 0x02;
}

/// Read/write single and multiple registers.
///
/// The DAP_Transfer command reads or writes data to CoreSight registers.
/// Each register is accessed with a single 32-bit read or write. The
/// requests execute in order on the probe, and the response carries data
/// words in the order of the read requests, but may be shorter in case of a
/// communication failure.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Zero-based device index of the selected JTAG device. For SWD mode
    /// the value is ignored.
    pub dap_index: u8,
    transfers: Vec<(u8, Option<u32>)>,
}

impl TransferRequest {
    pub fn empty() -> Self {
        Self {
            dap_index: 0,
            transfers: Vec::new(),
        }
    }

    pub fn read(selector: u8) -> Self {
        let mut req = Self::empty();
        req.add_read(selector);
        req
    }

    pub fn write(selector: u8, data: u32) -> Self {
        let mut req = Self::empty();
        req.add_write(selector, data);
        req
    }

    pub fn add_read(&mut self, selector: u8) {
        tracing::trace!("transfer += {}", dp::selector_name(selector));
        self.transfers.push((selector, None));
    }

    pub fn add_write(&mut self, selector: u8, data: u32) {
        tracing::trace!("transfer += {} = {data:#010x}", dp::selector_name(selector));
        self.transfers.push((selector, Some(data)));
    }

    /// Number of requests in this command.
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}

impl Request for TransferRequest {
    const COMMAND_ID: CommandId = CommandId::Transfer;

    type Response = TransferResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        // A single transfer command carries at most 255 requests.
        if self.transfers.len() > 255 {
            return Err(SendError::TooMuchData);
        }

        if buffer.len() < 2 {
            return Err(SendError::TooMuchData);
        }
        buffer[0] = self.dap_index;
        buffer[1] = self.transfers.len() as u8;
        let mut size = 2;

        for (selector, data) in &self.transfers {
            // The whole batch has to fit into one report payload.
            let needed = if dp::carries_data(*selector) { 5 } else { 1 };
            if buffer.len() < size + needed {
                return Err(SendError::TooMuchData);
            }
            buffer[size] = *selector;
            size += 1;
            if dp::carries_data(*selector) {
                buffer
                    .pwrite_with(data.unwrap_or(0), size, LE)
                    .map_err(|_| SendError::NotEnoughData)?;
                size += 4;
            }
        }

        Ok(size)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.len() < 2 {
            return Err(SendError::NotEnoughData);
        }
        let count = buffer[0];
        if count as usize > self.transfers.len() {
            tracing::error!("Transfer count larger than requested number of transfers");
            return Err(SendError::UnexpectedAnswer);
        }
        let ack = buffer[1];

        // One data word per executed plain read. Failed transfers produce no
        // data, and only the last executed transfer can have failed.
        let executed = &self.transfers[..count as usize];
        let mut offset = 2;
        let mut data = Vec::new();
        for (selector, _) in executed {
            if !dp::carries_data(*selector) {
                if buffer.len() < offset + 4 {
                    break;
                }
                data.push(
                    buffer
                        .pread_with(offset, LE)
                        .map_err(|_| SendError::NotEnoughData)?,
                );
                offset += 4;
            }
        }

        Ok(TransferResponse { count, ack, data })
    }
}

/// Response to a [`TransferRequest`].
#[derive(Debug, Clone)]
pub struct TransferResponse {
    /// Number of requests the probe executed.
    pub count: u8,
    /// Raw acknowledgement byte of the last executed transfer, including
    /// the protocol-error and value-mismatch bits.
    pub ack: u8,
    /// One word per executed read request, in request order.
    pub data: Vec<u32>,
}

/// Transfer a block of 32-bit words to or from a single register.
#[derive(Debug, Clone)]
pub struct TransferBlockRequest {
    /// Zero-based device index of the selected JTAG device. For SWD mode
    /// the value is ignored.
    dap_index: u8,
    /// Number of word transfers.
    word_count: u16,
    /// The transfer request selector, shared by every word.
    selector: u8,
    /// Words to write; empty for reads.
    data: Vec<u32>,
}

impl TransferBlockRequest {
    pub(crate) fn write_request(selector: u8, data: Vec<u32>) -> Self {
        TransferBlockRequest {
            dap_index: 0,
            word_count: data.len() as u16,
            selector,
            data,
        }
    }

    pub(crate) fn read_request(selector: u8, word_count: u16) -> Self {
        TransferBlockRequest {
            dap_index: 0,
            word_count,
            selector,
            data: Vec::new(),
        }
    }

    fn is_read(&self) -> bool {
        self.selector & 0x02 != 0
    }
}

impl Request for TransferBlockRequest {
    const COMMAND_ID: CommandId = CommandId::TransferBlock;

    type Response = TransferBlockResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        buffer[0] = self.dap_index;
        buffer
            .pwrite_with(self.word_count, 1, LE)
            .map_err(|_| SendError::NotEnoughData)?;
        buffer[3] = self.selector;

        let mut size = 4;
        for word in &self.data {
            buffer
                .pwrite_with(*word, size, LE)
                .map_err(|_| SendError::NotEnoughData)?;
            size += 4;
        }

        Ok(size)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.len() < 3 {
            return Err(SendError::NotEnoughData);
        }
        let word_count: u16 = buffer
            .pread_with(0, LE)
            .map_err(|_| SendError::NotEnoughData)?;
        let ack = buffer[2];

        // Only reads carry data back; writes just acknowledge.
        let mut data = Vec::new();
        if self.is_read() {
            if buffer.len() < 3 + word_count as usize * 4 {
                return Err(SendError::NotEnoughData);
            }
            for i in 0..word_count as usize {
                data.push(
                    buffer
                        .pread_with(3 + i * 4, LE)
                        .map_err(|_| SendError::NotEnoughData)?,
                );
            }
        }

        Ok(TransferBlockResponse {
            word_count,
            ack,
            data,
        })
    }
}

/// Response to a [`TransferBlockRequest`].
#[derive(Debug, Clone)]
pub struct TransferBlockResponse {
    /// Number of words the probe transferred.
    pub word_count: u16,
    /// Raw acknowledgement byte.
    pub ack: u8,
    /// Words read back; empty for writes.
    pub data: Vec<u32>,
}
