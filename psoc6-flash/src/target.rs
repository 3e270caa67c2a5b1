//! Per-family memory maps and SROM opcode tables.
//!
//! Every PSoC6 family shares the programming flow; only addresses and sizes
//! differ. The differences are pure data, so families are plain `const`
//! profiles in a lookup table rather than a type hierarchy.

use crate::Error;

/// SROM API opcodes and result masks, per Infineon programming
/// specification 002-15554.
///
/// Bit 0 of an opcode selects where the call arguments live: 0 means the
/// argument block sits in scratch SRAM, 1 means the single parameter word is
/// passed directly through the IPC data register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SromOpcodes {
    /// Silicon-ID query.
    pub silicon_id: u32,
    /// WriteRow: erase + program one row (no pre-erase assumption).
    pub write_row: u32,
    /// ProgramRow: program one pre-erased row.
    pub program_row: u32,
    /// EraseRow: erase a single row.
    pub erase_row: u32,
    /// EraseAll: erase the entire application flash.
    pub erase_all: u32,
    /// EraseSector: erase 512 rows.
    pub erase_sector: u32,
    /// EraseSubsector: erase 8 rows.
    pub erase_subsector: u32,
    /// Checksum over a flash region.
    pub checksum: u32,
    /// BlowFuse: program one eFuse bit.
    pub blow_fuse: u32,
    /// ReadFuse: read one eFuse byte.
    pub read_fuse: u32,
    /// GenerateHash of the boot code.
    pub generate_hash: u32,
    /// CheckFactoryHash against the stored value.
    pub check_factory_hash: u32,
    /// TransitionToSecure life-cycle change.
    pub transition_to_secure: u32,
}

impl SromOpcodes {
    /// Mask selecting the data-location bit of an opcode word.
    pub const DATA_LOCATION_MSK: u32 = 0x0000_0001;
    /// Mask selecting the status nibble of an SROM result word.
    pub const STATUS_MSK: u32 = 0xF000_0000;
    /// Status nibble value reported on success.
    pub const STATUS_SUCCESS: u32 = 0xA000_0000;
    /// Mask selecting the 28-bit checksum payload of a checksum result.
    pub const CHECKSUM_DATA_MSK: u32 = 0x0FFF_FFFF;
}

const SROM: SromOpcodes = SromOpcodes {
    silicon_id: 0x0000_0001,
    write_row: 0x0500_0100,
    program_row: 0x0600_0100,
    erase_row: 0x1C00_0100,
    erase_all: 0x0A00_0001,
    erase_sector: 0x1400_0100,
    erase_subsector: 0x1D00_0100,
    checksum: 0x0B00_0001,
    blow_fuse: 0x0100_0001,
    read_fuse: 0x0300_0001,
    generate_hash: 0x1E00_0000,
    check_factory_hash: 0x2700_0001,
    transition_to_secure: 0x2F00_0000,
};

/// The memory map and protocol constants of one PSoC6 family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetProfile {
    /// Family name as printed by Infineon tooling.
    pub name: &'static str,
    /// Family id as reported by the silicon-id SROM call.
    pub family_id: u16,

    /// Base address of the boot ROM.
    pub rom_base: u32,
    /// Size of the boot ROM.
    pub rom_size: u32,
    /// Base address of SRAM.
    pub sram_base: u32,
    /// Base address of application flash.
    pub flash_base: u32,
    /// Size of application flash.
    pub flash_size: u32,
    /// Base address of auxiliary flash.
    pub aux_flash_base: u32,
    /// Size of auxiliary flash.
    pub aux_flash_size: u32,
    /// Base address of supervisory flash.
    pub sflash_base: u32,
    /// Size of supervisory flash.
    pub sflash_size: u32,
    /// Smallest programmable/erasable flash unit in bytes.
    pub row_size: u32,

    /// Base address of IPC_STRUCT[0].
    pub ipc_struct_base: u32,
    /// Stride between IPC structures.
    pub ipc_struct_size: u32,
    /// Offset of the ACQUIRE register within an IPC structure.
    pub ipc_acquire_offset: u32,
    /// Offset of the NOTIFY register within an IPC structure.
    pub ipc_notify_offset: u32,
    /// Offset of the DATA register within an IPC structure.
    pub ipc_data_offset: u32,
    /// Offset of the LOCK_STATUS register within an IPC structure.
    pub ipc_lock_status_offset: u32,
    /// Base address of the IPC interrupt structure used by the debugger.
    pub ipc_intr_struct: u32,
    /// Offset of the interrupt mask register within the interrupt structure.
    pub ipc_intr_mask_offset: u32,

    /// A peripheral protection unit register readable whenever the bus is up;
    /// used as the probe read before acquiring an IPC channel.
    pub ppu_probe_addr: u32,
    /// Vector-table base shadow register of the CM0+ core.
    pub vtbase_cm0: u32,
    /// Vector-table base shadow register of the CM4 core.
    pub vtbase_cm4: u32,
    /// SRSS test-mode register.
    pub test_mode_addr: u32,
    /// Test-mode enable mask within the test-mode register.
    pub test_mode_msk: u32,

    /// SROM opcode table for this family.
    pub srom: SromOpcodes,
}

impl TargetProfile {
    /// Scratch area in SRAM used to stage SROM argument blocks and row data.
    pub fn sram_scratch(&self) -> u32 {
        self.sram_base + 0x3000
    }

    /// Address of IPC_STRUCT[`channel`].
    pub fn ipc_struct(&self, channel: u8) -> u32 {
        self.ipc_struct_base + self.ipc_struct_size * u32::from(channel)
    }
}

const PSOC6_COMMON: TargetProfile = TargetProfile {
    name: "",
    family_id: 0,
    rom_base: 0x0000_0000,
    rom_size: 0x0001_0000,
    sram_base: 0x0800_0000,
    flash_base: 0x1000_0000,
    flash_size: 0x0004_0000,
    aux_flash_base: 0x1400_0000,
    aux_flash_size: 0x0002_0000,
    sflash_base: 0x1600_0000,
    sflash_size: 0x0000_8000,
    row_size: 512,
    ipc_struct_base: 0x4022_0000,
    ipc_struct_size: 0x20,
    ipc_acquire_offset: 0x00,
    ipc_notify_offset: 0x08,
    ipc_data_offset: 0x0C,
    ipc_lock_status_offset: 0x1C,
    ipc_intr_struct: 0x4022_1000,
    ipc_intr_mask_offset: 0x08,
    ppu_probe_addr: 0x4001_0100,
    vtbase_cm0: 0x4020_1120,
    vtbase_cm4: 0x4020_0200,
    test_mode_addr: 0x4026_0100,
    test_mode_msk: 0x8000_0000,
    srom: SROM,
};

/// PSoC 6 BLE (CY8C63xx) family.
pub const PSOC6ABLE2: TargetProfile = TargetProfile {
    name: "PSOC6ABLE2",
    family_id: 0x100,
    rom_size: 0x0002_0000,
    flash_size: 0x0010_0000,
    ipc_struct_base: 0x4023_0000,
    ipc_intr_struct: 0x4023_1000,
    ipc_lock_status_offset: 0x10,
    ppu_probe_addr: 0x4001_4100,
    vtbase_cm0: 0x4021_02B0,
    vtbase_cm4: 0x4021_02C0,
    ..PSOC6_COMMON
};

/// PSoC 6A 2M (CY8C62x8/62xA) family.
pub const PSOC6A2M: TargetProfile = TargetProfile {
    name: "PSOC6A2M",
    family_id: 0x102,
    flash_size: 0x0020_0000,
    ..PSOC6_COMMON
};

/// PSoC 6A 512K (CY8C62x5) family.
pub const PSOC6A512K: TargetProfile = TargetProfile {
    name: "PSOC6A512K",
    family_id: 0x105,
    flash_size: 0x0008_0000,
    ..PSOC6_COMMON
};

/// PSoC 6A 256K (CY8C62x4) family.
pub const PSOC6A256K: TargetProfile = TargetProfile {
    name: "PSOC6A256K",
    family_id: 0x10E,
    flash_size: 0x0004_0000,
    ..PSOC6_COMMON
};

/// All supported families.
pub static FAMILIES: [&TargetProfile; 4] = [&PSOC6ABLE2, &PSOC6A2M, &PSOC6A512K, &PSOC6A256K];

/// Look up the profile for a family id as reported by the silicon-id call.
pub fn from_family_id(family_id: u16) -> Result<&'static TargetProfile, Error> {
    FAMILIES
        .iter()
        .find(|profile| profile.family_id == family_id)
        .copied()
        .ok_or(Error::UnknownFamily(family_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_lookup() {
        assert_eq!(from_family_id(0x100).unwrap().name, "PSOC6ABLE2");
        assert_eq!(from_family_id(0x102).unwrap().flash_size, 0x0020_0000);
        assert_eq!(from_family_id(0x105).unwrap().flash_size, 0x0008_0000);
        assert_eq!(from_family_id(0x10E).unwrap().flash_size, 0x0004_0000);
    }

    #[test]
    fn unknown_family_is_a_configuration_error() {
        assert!(matches!(from_family_id(0x1234), Err(Error::UnknownFamily(0x1234))));
    }

    #[test]
    fn able2_overrides() {
        let profile = from_family_id(0x100).unwrap();
        assert_eq!(profile.ipc_struct_base, 0x4023_0000);
        assert_eq!(profile.ipc_lock_status_offset, 0x10);
        assert_eq!(profile.ipc_struct(2), 0x4023_0040);
        assert_eq!(profile.rom_size, 0x0002_0000);
    }

    #[test]
    fn scratch_sits_in_sram() {
        assert_eq!(PSOC6A2M.sram_scratch(), 0x0800_3000);
    }
}
