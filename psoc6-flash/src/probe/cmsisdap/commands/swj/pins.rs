use super::super::{CommandId, Request, SendError};

bitfield::bitfield! {
    /// The SWJ pin mask, both for selecting pins and for their values.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct Pins(u8);
    impl Debug;
    pub nreset, set_nreset: 7;
    pub ntrst, set_ntrst: 5;
    pub tdo, set_tdo: 3;
    pub tdi, set_tdi: 2;
    pub swdio_tms, set_swdio_tms: 1;
    pub swclk_tck, set_swclk_tck: 0;
}

/// Set or read the state of the SWJ pins.
#[derive(Debug, Clone, Copy)]
pub struct SWJPinsRequest {
    /// The values the pins selected in `select` are driven to.
    pub(crate) output: Pins,
    /// A mask selecting the pins that are driven.
    pub(crate) select: Pins,
    /// Time in microseconds to wait for the pins to settle before reading
    /// them back.
    pub(crate) wait: u32,
}

impl SWJPinsRequest {
    pub fn new(output: Pins, select: Pins, wait: u32) -> Self {
        Self {
            output,
            select,
            wait,
        }
    }

    /// Drive the nRESET pin to `level` while keeping nTRST deasserted.
    pub fn nreset(level: bool) -> Self {
        let mut output = Pins(0);
        output.set_nreset(level);
        output.set_ntrst(true);
        let mut select = Pins(0);
        select.set_nreset(true);
        select.set_ntrst(true);

        Self {
            output,
            select,
            wait: 0,
        }
    }
}

impl Request for SWJPinsRequest {
    const COMMAND_ID: CommandId = CommandId::SwjPins;

    type Response = SWJPinsResponse;

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, SendError> {
        use scroll::{Pwrite, LE};

        buffer[0] = self.output.0;
        buffer[1] = self.select.0;
        buffer
            .pwrite_with(self.wait, 2, LE)
            .map_err(|_| SendError::NotEnoughData)?;
        Ok(6)
    }

    fn parse_response(&self, buffer: &[u8]) -> Result<Self::Response, SendError> {
        if buffer.is_empty() {
            return Err(SendError::NotEnoughData);
        }
        Ok(Pins(buffer[0]))
    }
}

pub type SWJPinsResponse = Pins;
