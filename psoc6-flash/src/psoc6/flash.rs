//! Flash erase, program and verify algorithms.
//!
//! Application flash is programmed through the program-row SROM call with
//! row data staged into scratch SRAM by chunked block transfers. Auxiliary
//! and supervisory flash use the slower write-row call with the row staged
//! word by word.

use super::ipc::srom_code_with_params;
use super::Psoc6Programmer;
use crate::architecture::arm::dp;
use crate::error::{Error, ProtocolError};
use crate::probe::cmsisdap::commands::transfer::{TransferBlockRequest, TransferRequest};
use crate::progress::ProgressEvent;
use crate::target::SromOpcodes;

/// Rows per erase subsector.
const SUBSECTOR_ROWS: u32 = 8;
/// Rows per erase sector.
const SECTOR_ROWS: u32 = 512;

impl Psoc6Programmer {
    /// Erase `[start, end)` of application flash, row aligned.
    ///
    /// A request covering the whole flash becomes a single erase-all call;
    /// anything else is walked with the largest erase granularity that fits
    /// at the current position: sector, subsector, then single rows.
    pub fn erase_flash(&mut self, start: u32, end: u32) -> Result<(), Error> {
        let profile = self.profile;
        let row_size = profile.row_size;
        let subsector_size = row_size * SUBSECTOR_ROWS;
        let sector_size = row_size * SECTOR_ROWS;

        let mut start = start & !(row_size - 1);
        let end = (end + row_size - 1) & !(row_size - 1);

        self.progress.emit(ProgressEvent::StartedErasing);

        if start == profile.flash_base && end - start >= profile.flash_size {
            tracing::info!("Erasing the whole application flash");
            self.call_srom_api(profile.srom.erase_all)?;
            self.progress.emit(ProgressEvent::FinishedErasing);
            return Ok(());
        }

        while start < end {
            let remaining = end - start;
            let (opcode, step) = if start % sector_size == 0 && remaining >= sector_size {
                (profile.srom.erase_sector, sector_size)
            } else if start % subsector_size == 0 && remaining >= subsector_size {
                (profile.srom.erase_subsector, subsector_size)
            } else {
                (profile.srom.erase_row, row_size)
            };

            let scratch = profile.sram_scratch();
            self.write_io(scratch, opcode)?;
            self.write_io(scratch + 0x04, start)?;
            self.call_srom_api(opcode)?;

            start += step;
            self.progress.emit(ProgressEvent::Erased {
                address: start,
                end,
            });
        }

        self.progress.emit(ProgressEvent::FinishedErasing);
        Ok(())
    }

    /// Program pre-erased application flash row by row.
    pub fn program_flash(&mut self, data: &[u8], start_addr: u32) -> Result<(), Error> {
        let profile = self.profile;
        let row_size = profile.row_size;
        let scratch = profile.sram_scratch();
        let total_rows = data.len() as u32 / row_size;

        self.progress.emit(ProgressEvent::StartedProgramming);
        tracing::info!("Programming {total_rows} rows at {start_addr:#010x}");

        for row in 0..total_rows {
            let row_addr = start_addr + row * row_size;
            let row_offset = (row * row_size) as usize;

            // Argument block: opcode, data size/location word, destination,
            // pointer to the row data staged right behind the block.
            self.write_io(scratch, profile.srom.program_row)?;
            self.write_io(scratch + 0x04, 6 | (1 << 8))?;
            self.write_io(scratch + 0x08, row_addr)?;
            self.write_io(scratch + 0x0C, scratch + 0x10)?;

            self.transfer_block(
                scratch + 0x10,
                &data[row_offset..row_offset + row_size as usize],
            )?;

            self.call_srom_api(profile.srom.program_row)?;
            self.progress.emit(ProgressEvent::RowProgrammed { row, total_rows });
        }

        self.progress.emit(ProgressEvent::FinishedProgramming);
        Ok(())
    }

    /// Write a buffer into target memory with auto-incrementing block
    /// transfers, chunked to the report size.
    ///
    /// The tail is zero-padded to a word boundary.
    pub fn transfer_block(&mut self, base_addr: u32, data: &[u8]) -> Result<(), Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        let chunk_bytes = self.probe.block_word_capacity() * 4;
        let padded_len = (data.len() + 3) & !3;

        let mut offset = 0;
        while offset < padded_len {
            let chunk_len = chunk_bytes.min(padded_len - offset);

            self.block_setup(0x2300_0012, base_addr + offset as u32)?;

            let mut words = Vec::with_capacity(chunk_len / 4);
            for word_offset in (offset..offset + chunk_len).step_by(4) {
                let mut word_bytes = [0u8; 4];
                for (i, byte) in word_bytes.iter_mut().enumerate() {
                    *byte = data.get(word_offset + i).copied().unwrap_or(0);
                }
                words.push(u32::from_le_bytes(word_bytes));
            }

            let request = TransferBlockRequest::write_request(dp::write::DRW, words);
            let response = self.probe.transfer_block(&request)?;
            if response.ack != self.expected_ack() {
                return Err(ProtocolError::AckMismatch {
                    expected: self.expected_ack(),
                    actual: response.ack,
                }
                .into());
            }

            offset += chunk_len;
        }
        Ok(())
    }

    /// Read `length` bytes of target memory with auto-incrementing block
    /// transfers, chunked to the report size.
    pub fn transfer_block_read(&mut self, base_addr: u32, length: usize) -> Result<Vec<u8>, Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        let chunk_bytes = self.probe.block_word_capacity() * 4;
        let padded_len = (length + 3) & !3;
        let mut buffer = Vec::with_capacity(padded_len);

        let mut offset = 0;
        while offset < padded_len {
            let chunk_len = chunk_bytes.min(padded_len - offset);

            self.block_setup(0x2300_0052, base_addr + offset as u32)?;

            let request = TransferBlockRequest::read_request(dp::read::DRW, (chunk_len / 4) as u16);
            let response = self.probe.transfer_block(&request)?;
            if response.ack != self.expected_ack() {
                return Err(ProtocolError::AckMismatch {
                    expected: self.expected_ack(),
                    actual: response.ack,
                }
                .into());
            }
            if response.data.len() < chunk_len / 4 {
                return Err(ProtocolError::ShortResponse("a block read").into());
            }
            for word in &response.data[..chunk_len / 4] {
                buffer.extend_from_slice(&word.to_le_bytes());
            }

            offset += chunk_len;
        }

        buffer.truncate(length);
        Ok(buffer)
    }

    /// Configure CSW for auto-increment and aim TAR, in one command.
    fn block_setup(&mut self, csw: u32, tar: u32) -> Result<(), Error> {
        let mut setup = TransferRequest::empty();
        setup.add_write(dp::write::CSW, csw);
        setup.add_write(dp::write::TAR, tar);
        let response = self.probe.transfer(&setup)?;
        if response.ack != self.expected_ack() {
            return Err(ProtocolError::AckMismatch {
                expected: self.expected_ack(),
                actual: response.ack,
            }
            .into());
        }
        Ok(())
    }

    /// Compare application flash word by word against `data`.
    pub fn verify_flash(&mut self, data: &[u8], start_addr: u32) -> Result<(), Error> {
        let row_size = self.profile.row_size;
        let total_rows = data.len() as u32 / row_size;

        for row in 0..total_rows {
            let row_offset = row * row_size;
            let row_addr = start_addr + row_offset;

            for i in (0..row_size).step_by(4) {
                let word = self.read_io(row_addr + i)?;
                let offset = (row_offset + i) as usize;
                let expected = u32::from_le_bytes([
                    data[offset],
                    data[offset + 1],
                    data[offset + 2],
                    data[offset + 3],
                ]);
                if word != expected {
                    return Err(Error::Verification {
                        address: row_addr + i,
                    });
                }
            }
        }
        Ok(())
    }

    /// Run the SROM checksum over the whole application flash and compare
    /// its 28-bit result.
    pub fn verify_checksum(&mut self, expected: u32) -> Result<(), Error> {
        // Bit 21 selects the whole flash instead of a single row.
        let opcode = self.profile.srom.checksum | (1 << 21);
        let result = self.call_srom_api(opcode)?;
        let actual = result & SromOpcodes::CHECKSUM_DATA_MSK;

        if actual != expected {
            return Err(Error::ChecksumMismatch { expected, actual });
        }
        Ok(())
    }

    /// Program a non-application region (auxiliary or supervisory flash)
    /// row by row with the write-row call, staging each row word by word.
    pub fn program_flash_generic(&mut self, data: &[u8], base_addr: u32) -> Result<(), Error> {
        let profile = self.profile;
        let row_size = profile.row_size;
        let scratch = profile.sram_scratch();
        let total_rows = data.len() as u32 / row_size;

        for row in 0..total_rows {
            let row_addr = base_addr + row * row_size;
            self.write_io(scratch, profile.srom.write_row)?;
            self.write_io(scratch + 0x04, 6 | (1 << 8))?;
            self.write_io(scratch + 0x08, row_addr)?;
            self.write_io(scratch + 0x0C, scratch + 0x10)?;

            for i in (0..row_size).step_by(4) {
                let offset = (row * row_size + i) as usize;
                let word = u32::from_le_bytes([
                    data[offset],
                    data[offset + 1],
                    data[offset + 2],
                    data[offset + 3],
                ]);
                self.write_io(scratch + 0x10 + i, word)?;
            }

            self.call_srom_api(profile.srom.write_row)?;
        }
        Ok(())
    }

    /// Verify a non-application region word by word.
    pub fn verify_flash_generic(&mut self, data: &[u8], base_addr: u32) -> Result<(), Error> {
        self.verify_flash(data, base_addr)
    }

    /// Erase one row of a non-application region.
    pub fn erase_row(&mut self, addr: u32) -> Result<(), Error> {
        let profile = self.profile;
        let scratch = profile.sram_scratch();
        let addr = addr & !(profile.row_size - 1);
        self.write_io(scratch, profile.srom.erase_row)?;
        self.write_io(scratch + 0x04, addr)?;
        self.call_srom_api(profile.srom.erase_row)?;
        Ok(())
    }

    /// Read one eFuse byte.
    pub fn read_fuse(&mut self, addr: u32) -> Result<u8, Error> {
        let opcode = srom_code_with_params(self.profile.srom.read_fuse, addr & 0xFFFF);
        let result = self.call_srom_api(opcode)?;
        Ok((result & 0xFF) as u8)
    }
}
