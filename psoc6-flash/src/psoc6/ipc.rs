//! IPC channel handling and the SROM system-call protocol.
//!
//! Every flash operation funnels into [`Psoc6Programmer::call_srom_api`]:
//! acquire the debugger IPC channel, deposit the call id (or a pointer to an
//! argument block staged in scratch SRAM), notify the SROM, and poll for the
//! success status nibble.

use std::thread;
use std::time::Duration;

use super::Psoc6Programmer;
use crate::error::{Error, PollOperation};
use crate::target::SromOpcodes;

/// IPC channel reserved for an external debugger.
pub(crate) const IPC_CHANNEL_DAP: u8 = 2;

/// Budget for every IPC/SROM polling loop, in 1 ms steps.
const POLL_BUDGET_MS: u32 = 1000;

/// Identity and life-cycle data reported by the silicon-id SROM call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiliconInfo {
    /// Family id, used to select a [`crate::target::TargetProfile`].
    pub family_id: u16,
    /// Part-specific silicon id.
    pub silicon_id: u16,
    /// Silicon revision.
    pub revision_id: u8,
    /// Life-cycle protection state.
    pub protection: ProtectionState,
}

/// Life-cycle stage of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionState {
    Virgin,
    Normal,
    Secure,
    Dead,
    /// A value outside the documented life-cycle stages.
    Unknown(u8),
}

impl From<u8> for ProtectionState {
    fn from(value: u8) -> Self {
        match value {
            0x01 => ProtectionState::Virgin,
            0x02 => ProtectionState::Normal,
            0x03 => ProtectionState::Secure,
            0x04 => ProtectionState::Dead,
            other => ProtectionState::Unknown(other),
        }
    }
}

/// Combine an SROM opcode with a parameter in bits [15:8].
pub(crate) fn srom_code_with_params(opcode: u32, param: u32) -> u32 {
    opcode | (param << 8)
}

impl Psoc6Programmer {
    /// Try to acquire an IPC channel within the polling budget.
    ///
    /// Running out of budget is a normal outcome (`Ok(false)`), not an
    /// error: the channel may legitimately be held by target firmware. A
    /// failed bus probe read means the debug port dropped; it is brought
    /// back up and the attempt continues.
    pub(crate) fn ipc_acquire(&mut self, channel: u8) -> Result<bool, Error> {
        let acquire_addr = self.profile.ipc_struct(channel) + self.profile.ipc_acquire_offset;
        let probe_addr = self.profile.ppu_probe_addr;

        for _ in 0..POLL_BUDGET_MS {
            if self.read_io(probe_addr).is_err() {
                let ap = self.ap;
                self.init_debug_port(ap)?;
                continue;
            }
            self.write_io(acquire_addr, 1)?;
            let status = self.read_io(acquire_addr)?;
            if status & 0x8000_0000 != 0 {
                return Ok(true);
            }
            thread::sleep(Duration::from_millis(1));
        }
        tracing::warn!("IPC channel {channel} could not be acquired");
        Ok(false)
    }

    /// Poll the lock status of an IPC channel until it matches.
    pub(crate) fn ipc_poll_lock_status(
        &mut self,
        channel: u8,
        expect_locked: bool,
    ) -> Result<(), Error> {
        let lock_addr = self.profile.ipc_struct(channel) + self.profile.ipc_lock_status_offset;

        for _ in 0..POLL_BUDGET_MS {
            let status = self.read_io(lock_addr)?;
            let locked = status & 0x8000_0000 != 0;
            if locked == expect_locked {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(1));
        }
        Err(Error::Timeout(PollOperation::IpcLock))
    }

    /// Poll `addr` until its status nibble reports success.
    fn poll_srom_status(&mut self, addr: u32) -> Result<u32, Error> {
        for _ in 0..POLL_BUDGET_MS {
            let data = self.read_io(addr)?;
            if data & SromOpcodes::STATUS_MSK == SromOpcodes::STATUS_SUCCESS {
                return Ok(data);
            }
            thread::sleep(Duration::from_millis(1));
        }
        Err(Error::Timeout(PollOperation::SromStatus))
    }

    /// Execute one SROM API call and return its result word.
    ///
    /// Bit 0 of `call_id_and_params` selects the argument convention: clear
    /// means the argument block was staged in scratch SRAM beforehand and
    /// the IPC data register carries its address, set means the word itself
    /// is the single argument. The result is read back from the same place
    /// the arguments lived.
    pub(crate) fn call_srom_api(&mut self, call_id_and_params: u32) -> Result<u32, Error> {
        let profile = self.profile;
        let ipc_addr = profile.ipc_struct(IPC_CHANNEL_DAP);
        let intr_mask_addr = profile.ipc_intr_struct + profile.ipc_intr_mask_offset;
        let intr_mask_dap = 1u32 << (16 + u32::from(IPC_CHANNEL_DAP));
        let data_in_ram = call_id_and_params & SromOpcodes::DATA_LOCATION_MSK == 0;

        tracing::debug!("SROM call {call_id_and_params:#010x} (args in RAM: {data_in_ram})");
        if !self.ipc_acquire(IPC_CHANNEL_DAP)? {
            return Err(Error::Timeout(PollOperation::IpcLock));
        }

        let data = if data_in_ram {
            profile.sram_scratch()
        } else {
            call_id_and_params
        };
        self.write_io(ipc_addr + profile.ipc_data_offset, data)?;

        // Route the release interrupt to the debugger channel, restoring the
        // firmware's routing afterwards.
        let intr_mask_initial = self.read_io(intr_mask_addr)?;
        let overridden = intr_mask_initial != intr_mask_dap;
        if overridden {
            self.write_io(intr_mask_addr, intr_mask_dap)?;
        }

        self.write_io(ipc_addr + profile.ipc_notify_offset, 1)?;
        self.ipc_poll_lock_status(IPC_CHANNEL_DAP, false)?;

        let result_addr = if data_in_ram {
            profile.sram_scratch()
        } else {
            ipc_addr + profile.ipc_data_offset
        };
        let result = self.poll_srom_status(result_addr);

        if overridden {
            self.write_io(intr_mask_addr, intr_mask_initial)?;
        }
        result
    }

    /// Query family, silicon and revision ids and the life-cycle state.
    pub fn silicon_info(&mut self) -> Result<SiliconInfo, Error> {
        let opcode = self.profile.srom.silicon_id;
        let out0 = self.call_srom_api(srom_code_with_params(opcode, 0))?;
        let out1 = self.call_srom_api(srom_code_with_params(opcode, 1))?;

        let info = SiliconInfo {
            family_id: (out0 & 0xFFFF) as u16,
            silicon_id: (out1 & 0xFFFF) as u16,
            revision_id: ((out0 >> 16) & 0xFF) as u8,
            protection: ProtectionState::from(((out1 >> 16) & 0x0F) as u8),
        };
        tracing::info!(
            "Silicon: family {:#06x}, id {:#06x}, revision {:#04x}, {:?}",
            info.family_id,
            info.silicon_id,
            info.revision_id,
            info.protection
        );
        Ok(info)
    }
}
