//! A simulated CMSIS-DAP probe wired to a simulated PSoC6 target.
//!
//! The mock implements the report protocol one level below the crate: it
//! parses outbound command frames, keeps DP/AP and memory state, emulates
//! the MEM-AP read pipeline (DRW returns stale data, RDBUFF completes the
//! read) and executes SROM calls when the IPC notify register is written.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use psoc6_flash::architecture::arm::dp;
use psoc6_flash::probe::cmsisdap::commands::SendError;
use psoc6_flash::probe::{CmsisDap, DapDevice};
use psoc6_flash::psoc6::Psoc6Programmer;
use psoc6_flash::target::TargetProfile;

const CPUID_ADDR: u32 = 0xE000_ED00;
const DCRSR_ADDR: u32 = 0xE000_EDF4;
const DCRDR_ADDR: u32 = 0xE000_EDF8;

const STATUS_SUCCESS: u32 = 0xA000_0000;

pub struct MockState {
    profile: &'static TargetProfile,
    /// IDCODE the debug port answers with.
    pub idcode: u32,
    /// AP indices that expose an ARM core.
    pub arm_aps: Vec<u8>,
    /// Program counter reported through DCRSR/DCRDR.
    pub pc: u32,
    pub family_id: u16,
    pub silicon_id: u16,
    pub revision_id: u8,
    pub protection: u8,

    /// Sparse target memory; absent words read as zero (erased flash).
    mem: HashMap<u32, u32>,
    select_ap: u8,
    csw: u32,
    tar: u32,
    /// MEM-AP read pipeline latch.
    latch: u32,

    /// Number of IDCODE reads observed.
    pub idcode_reads: u32,
    /// Every SROM call id, in order.
    pub srom_calls: Vec<u32>,
    /// Largest word count seen in a single block transfer.
    pub max_block_words: usize,
}

impl MockState {
    fn new(profile: &'static TargetProfile) -> Self {
        Self {
            profile,
            idcode: 0x6BA0_2477,
            arm_aps: vec![0],
            pc: 0x0000_1000,
            family_id: profile.family_id,
            silicon_id: 0xE453,
            revision_id: 0x12,
            protection: 0x02,
            mem: HashMap::new(),
            select_ap: 0,
            csw: 0,
            tar: 0,
            latch: 0,
            idcode_reads: 0,
            srom_calls: Vec::new(),
            max_block_words: 0,
        }
    }

    /// The checksum the simulated SROM computes over application flash.
    pub fn flash_checksum(&self) -> u32 {
        let base = self.profile.flash_base;
        let end = base + self.profile.flash_size;
        let sum: u64 = self
            .mem
            .iter()
            .filter(|(addr, _)| (base..end).contains(addr))
            .map(|(_, word)| word.to_le_bytes().iter().map(|&b| u64::from(b)).sum::<u64>())
            .sum();
        (sum as u32) & 0x0FFF_FFFF
    }

    fn auto_increment(&self) -> bool {
        self.csw & 0x10 != 0
    }

    fn mem_read(&mut self, addr: u32) -> u32 {
        if addr == CPUID_ADDR {
            if self.arm_aps.contains(&self.select_ap) {
                return 0x410F_C241;
            }
            return 0;
        }
        self.mem.get(&addr).copied().unwrap_or(0)
    }

    fn mem_write(&mut self, addr: u32, value: u32) {
        let profile = self.profile;
        let ipc = profile.ipc_struct(2);

        if addr == DCRSR_ADDR && value == 0x0000_000F {
            let pc = self.pc;
            self.mem.insert(DCRDR_ADDR, pc);
        } else if addr == ipc + profile.ipc_acquire_offset {
            // Acquisition always succeeds immediately.
            self.mem.insert(addr, 0x8000_0000 | value);
            return;
        } else if addr == ipc + profile.ipc_notify_offset {
            self.run_srom();
            return;
        }
        self.mem.insert(addr, value);
    }

    fn run_srom(&mut self) {
        let profile = self.profile;
        let data_reg = profile.ipc_struct(2) + profile.ipc_data_offset;
        let data = self.mem_read(data_reg);
        let scratch = profile.sram_scratch();

        if data == scratch {
            // Argument block staged in scratch SRAM.
            let opcode = self.mem_read(scratch);
            self.srom_calls.push(opcode);
            let srom = profile.srom;

            if opcode == srom.program_row || opcode == srom.write_row {
                let dest = self.mem_read(scratch + 0x08);
                let src = self.mem_read(scratch + 0x0C);
                for i in (0..profile.row_size).step_by(4) {
                    let word = self.mem_read(src + i);
                    self.mem.insert(dest + i, word);
                }
            } else if opcode == srom.erase_row
                || opcode == srom.erase_subsector
                || opcode == srom.erase_sector
            {
                let addr = self.mem_read(scratch + 0x04);
                let rows = if opcode == srom.erase_sector {
                    512
                } else if opcode == srom.erase_subsector {
                    8
                } else {
                    1
                };
                self.erase(addr, profile.row_size * rows);
            }
            self.mem.insert(scratch, STATUS_SUCCESS);
        } else {
            // The data register carries the call id itself.
            self.srom_calls.push(data);
            let srom = profile.srom;
            let result = if data == srom.erase_all {
                self.erase(profile.flash_base, profile.flash_size);
                STATUS_SUCCESS
            } else if data & 0xFF00_0001 == srom.checksum {
                STATUS_SUCCESS | self.flash_checksum()
            } else if data & 0xFF00_00FF == srom.silicon_id {
                match (data >> 8) & 0xFF {
                    0 => {
                        STATUS_SUCCESS
                            | (u32::from(self.revision_id) << 16)
                            | u32::from(self.family_id)
                    }
                    _ => {
                        STATUS_SUCCESS
                            | (u32::from(self.protection) << 16)
                            | u32::from(self.silicon_id)
                    }
                }
            } else {
                STATUS_SUCCESS
            };
            self.mem.insert(data_reg, result);
        }
    }

    fn erase(&mut self, start: u32, len: u32) {
        self.mem.retain(|addr, _| !(start..start + len).contains(addr));
    }

    fn handle_transfer(&mut self, payload: &[u8]) -> Vec<u8> {
        let count = payload[1];
        let mut offset = 2;
        let mut data = Vec::new();

        for _ in 0..count {
            let selector = payload[offset];
            offset += 1;
            let value = if dp::carries_data(selector) {
                let word = u32::from_le_bytes([
                    payload[offset],
                    payload[offset + 1],
                    payload[offset + 2],
                    payload[offset + 3],
                ]);
                offset += 4;
                Some(word)
            } else {
                None
            };

            match (selector, value) {
                (dp::read::IDCODE, _) => {
                    self.idcode_reads += 1;
                    data.push(self.idcode);
                }
                (dp::read::CTRLSTAT, _) => data.push(0xF000_0000),
                (dp::read::RDBUFF, _) => data.push(self.latch),
                (dp::read::DRW, _) => {
                    // Pipelined: answer with the stale latch, then load.
                    data.push(self.latch);
                    self.latch = self.mem_read(self.tar);
                    if self.auto_increment() {
                        self.tar += 4;
                    }
                }
                (dp::write::ABORT, Some(_)) | (dp::write::CTRLSTAT, Some(_)) => {}
                (dp::write::SELECT, Some(value)) => self.select_ap = (value >> 24) as u8,
                (dp::write::CSW, Some(value)) => self.csw = value,
                (dp::write::TAR, Some(value)) => self.tar = value,
                (dp::write::DRW, Some(value)) => {
                    self.mem_write(self.tar, value);
                    if self.auto_increment() {
                        self.tar += 4;
                    }
                }
                _ => {}
            }
        }

        let mut response = vec![0x05, count, 0x01];
        for word in data {
            response.extend_from_slice(&word.to_le_bytes());
        }
        response
    }

    fn handle_transfer_block(&mut self, payload: &[u8]) -> Vec<u8> {
        let count = u16::from_le_bytes([payload[1], payload[2]]) as usize;
        let selector = payload[3];
        self.max_block_words = self.max_block_words.max(count);

        let mut response = vec![0x06, payload[1], payload[2], 0x01];
        if selector == dp::write::DRW {
            for i in 0..count {
                let offset = 4 + i * 4;
                let word = u32::from_le_bytes([
                    payload[offset],
                    payload[offset + 1],
                    payload[offset + 2],
                    payload[offset + 3],
                ]);
                self.mem_write(self.tar, word);
                self.tar += 4;
            }
        } else {
            for _ in 0..count {
                let word = self.mem_read(self.tar);
                self.tar += 4;
                response.extend_from_slice(&word.to_le_bytes());
            }
        }
        response
    }

    fn handle_command(&mut self, frame: &[u8]) -> Vec<u8> {
        let command = frame[0];
        let payload = &frame[1..];
        match command {
            // Info: packet size 64, one packet, SWD only, no strings.
            0x00 => match payload[0] {
                0xFF => vec![0x00, 2, 64, 0],
                0xFE => vec![0x00, 1, 1],
                0xF0 => vec![0x00, 1, 0x01],
                _ => vec![0x00, 0x00],
            },
            // Connect: SWD granted.
            0x02 => vec![0x02, 0x01],
            // Pins: echo the requested output levels back.
            0x10 => vec![0x10, payload[0]],
            0x05 => self.handle_transfer(payload),
            0x06 => self.handle_transfer_block(payload),
            // Everything else just acknowledges.
            _ => vec![command, 0x00],
        }
    }
}

pub struct MockDapDevice {
    state: Arc<Mutex<MockState>>,
    response: Option<Vec<u8>>,
}

impl DapDevice for MockDapDevice {
    fn write_report(&mut self, buf: &[u8]) -> Result<usize, SendError> {
        // Strip the report id before dispatching.
        let mut state = self.state.lock().unwrap();
        self.response = Some(state.handle_command(&buf[1..]));
        Ok(buf.len())
    }

    fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, SendError> {
        let response = self.response.take().ok_or(SendError::Timeout)?;
        buf[0] = 0x00;
        buf[1..1 + response.len()].copy_from_slice(&response);
        Ok(1 + response.len())
    }
}

/// Build a programmer over a fresh simulated target, applying `configure`
/// to the simulation before the probe is opened.
pub fn programmer_with(
    profile: &'static TargetProfile,
    configure: impl FnOnce(&mut MockState),
) -> (Psoc6Programmer, Arc<Mutex<MockState>>) {
    let state = Arc::new(Mutex::new(MockState::new(profile)));
    configure(&mut state.lock().unwrap());

    let device = MockDapDevice {
        state: Arc::clone(&state),
        response: None,
    };
    let probe = CmsisDap::new(Box::new(device)).expect("probe discovery against the mock");
    (Psoc6Programmer::new(probe, profile), state)
}

/// A programmer with the default simulation.
pub fn programmer(profile: &'static TargetProfile) -> (Psoc6Programmer, Arc<Mutex<MockState>>) {
    programmer_with(profile, |_| {})
}
