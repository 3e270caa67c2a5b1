mod common;

use common::{programmer, programmer_with};
use pretty_assertions::assert_eq;
use psoc6_flash::psoc6::{AccessPort, AcquireMode, ProtectionState};
use psoc6_flash::target::PSOC6A2M;
use psoc6_flash::{Error, PollOperation};

fn test_image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 13) as u8).collect()
}

#[test]
fn acquire_and_read_silicon_info() {
    let (mut programmer, _state) = programmer(&PSOC6A2M);

    programmer
        .acquire(AcquireMode::Reset, true, AccessPort::Auto)
        .unwrap();

    let info = programmer.silicon_info().unwrap();
    assert_eq!(info.family_id, 0x102);
    assert_eq!(info.silicon_id, 0xE453);
    assert_eq!(info.revision_id, 0x12);
    assert_eq!(info.protection, ProtectionState::Normal);
}

#[test]
fn acquire_rejects_pc_outside_boot_code() {
    let (mut programmer, _state) = programmer_with(&PSOC6A2M, |state| {
        state.pc = 0x0800_4000; // SRAM, neither ROM nor flash
    });

    let result = programmer.acquire(AcquireMode::Reset, true, AccessPort::Auto);
    assert!(matches!(
        result,
        Err(Error::PcOutsideBootCode { pc: 0x0800_4000 })
    ));
}

#[test]
fn power_cycle_acquisition_is_not_implemented() {
    let (mut programmer, _state) = programmer(&PSOC6A2M);

    let result = programmer.acquire(AcquireMode::PowerCycle, true, AccessPort::Auto);
    assert!(matches!(result, Err(Error::NotImplemented(_))));
}

#[test]
fn auto_attach_without_usable_ap_fails() {
    let (mut programmer, _state) = programmer_with(&PSOC6A2M, |state| {
        state.arm_aps.clear();
    });

    let result = programmer.attach(AccessPort::Auto);
    assert!(matches!(result, Err(Error::NoAccessPort)));
}

#[test]
fn handshake_times_out_after_300_attempts() {
    let (mut programmer, state) = programmer_with(&PSOC6A2M, |state| {
        state.idcode = 0x2BA0_1477; // not a PSoC6 debug port
    });

    let result = programmer.handshake();
    assert!(matches!(
        result,
        Err(Error::Timeout(PollOperation::Handshake))
    ));
    assert_eq!(state.lock().unwrap().idcode_reads, 300);
}

#[test]
fn partial_erase_uses_row_granularity() {
    let (mut programmer, state) = programmer(&PSOC6A2M);
    programmer.attach(AccessPort::Sys).unwrap();

    let base = PSOC6A2M.flash_base;
    programmer.erase_flash(base, base + 1024).unwrap();

    let state = state.lock().unwrap();
    let calls = &state.srom_calls;
    let row_calls = calls.iter().filter(|&&c| c == PSOC6A2M.srom.erase_row).count();
    assert_eq!(row_calls, 2);
    assert!(!calls.contains(&PSOC6A2M.srom.erase_subsector));
    assert!(!calls.contains(&PSOC6A2M.srom.erase_sector));
    assert!(!calls.contains(&PSOC6A2M.srom.erase_all));
}

#[test]
fn subsector_aligned_erase_uses_one_subsector_call() {
    let (mut programmer, state) = programmer(&PSOC6A2M);
    programmer.attach(AccessPort::Sys).unwrap();

    let base = PSOC6A2M.flash_base;
    programmer.erase_flash(base, base + 4096).unwrap();

    let state = state.lock().unwrap();
    let calls = &state.srom_calls;
    let subsector_calls = calls
        .iter()
        .filter(|&&c| c == PSOC6A2M.srom.erase_subsector)
        .count();
    assert_eq!(subsector_calls, 1);
    assert!(!calls.contains(&PSOC6A2M.srom.erase_row));
}

#[test]
fn whole_flash_erase_is_a_single_erase_all() {
    let (mut programmer, state) = programmer(&PSOC6A2M);
    programmer.attach(AccessPort::Sys).unwrap();

    let base = PSOC6A2M.flash_base;
    programmer.erase_flash(base, base + PSOC6A2M.flash_size).unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.srom_calls, vec![PSOC6A2M.srom.erase_all]);
}

#[test]
fn program_verify_round_trip() {
    let (mut programmer, _state) = programmer(&PSOC6A2M);
    programmer.attach(AccessPort::Sys).unwrap();

    let base = PSOC6A2M.flash_base;
    let image = test_image(1024);

    programmer.erase_flash(base, base + image.len() as u32).unwrap();
    programmer.program_flash(&image, base).unwrap();
    programmer.verify_flash(&image, base).unwrap();
}

#[test]
fn verification_reports_the_first_mismatching_address() {
    let (mut programmer, _state) = programmer(&PSOC6A2M);
    programmer.attach(AccessPort::Sys).unwrap();

    let base = PSOC6A2M.flash_base;
    let image = test_image(1024);
    programmer.erase_flash(base, base + image.len() as u32).unwrap();
    programmer.program_flash(&image, base).unwrap();

    let mut reference = image.clone();
    reference[702] ^= 0xFF;

    let result = programmer.verify_flash(&reference, base);
    // Byte 702 lives in the word at offset 700.
    assert!(matches!(
        result,
        Err(Error::Verification { address }) if address == base + 700
    ));
}

#[test]
fn checksum_verification() {
    let (mut programmer, state) = programmer(&PSOC6A2M);
    programmer.attach(AccessPort::Sys).unwrap();

    let base = PSOC6A2M.flash_base;
    let image = test_image(512);
    programmer.program_flash(&image, base).unwrap();

    let expected = state.lock().unwrap().flash_checksum();
    let image_sum: u32 = image.iter().map(|&b| u32::from(b)).sum();
    assert_eq!(expected, image_sum & 0x0FFF_FFFF);

    programmer.verify_checksum(expected).unwrap();

    let result = programmer.verify_checksum(expected ^ 1);
    assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));
}

#[test]
fn block_transfer_round_trips_and_respects_chunk_capacity() {
    let (mut programmer, state) = programmer(&PSOC6A2M);
    programmer.attach(AccessPort::Sys).unwrap();

    let data = test_image(2048);
    let addr = PSOC6A2M.sram_base + 0x8000;

    programmer.transfer_block(addr, &data).unwrap();
    let read_back = programmer.transfer_block_read(addr, data.len()).unwrap();
    assert_eq!(read_back, data);

    // 64-byte reports fit 14 words next to the 5-byte header.
    assert!(state.lock().unwrap().max_block_words <= 14);
}

#[test]
fn read_io_discards_the_pipeline_dummy_word() {
    let (mut programmer, _state) = programmer(&PSOC6A2M);
    programmer.attach(AccessPort::Sys).unwrap();

    let a = PSOC6A2M.sram_base + 0x100;
    let b = PSOC6A2M.sram_base + 0x200;
    programmer.write_io(a, 0xAAAA_5555).unwrap();
    programmer.write_io(b, 0x1234_ABCD).unwrap();

    // Back-to-back reads; a decoder using the first returned word would see
    // the stale value of the previous access here.
    assert_eq!(programmer.read_io(a).unwrap(), 0xAAAA_5555);
    assert_eq!(programmer.read_io(b).unwrap(), 0x1234_ABCD);
    assert_eq!(programmer.read_io(a).unwrap(), 0xAAAA_5555);
}

#[test]
fn memory_access_requires_an_initialized_debug_port() {
    let (mut programmer, _state) = programmer(&PSOC6A2M);

    let result = programmer.read_io(0xE000_ED00);
    assert!(matches!(result, Err(Error::NotInitialized)));
}

#[test]
fn generic_flash_programming_round_trip() {
    let (mut programmer, _state) = programmer(&PSOC6A2M);
    programmer.attach(AccessPort::Sys).unwrap();

    let base = PSOC6A2M.aux_flash_base;
    let image = test_image(512);

    programmer.program_flash_generic(&image, base).unwrap();
    programmer.verify_flash_generic(&image, base).unwrap();
}
