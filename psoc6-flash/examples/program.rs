//! Flash an Intel HEX image onto a PSoC6 device through the first CMSIS-DAP
//! probe found.
//!
//! Usage: `program <firmware.hex> [family-id]`

use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use ihex::Record;

use psoc6_flash::probe::CmsisDap;
use psoc6_flash::psoc6::{AccessPort, AcquireMode, Psoc6Programmer};
use psoc6_flash::{target, FlashProgress, ProgressEvent};

// CMSIS-DAP probes in HID mode, e.g. a DAPLink or a KitProg3.
const USB_VID: u16 = 0x0D28;
const USB_PID: u16 = 0x0204;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let mut args = std::env::args().skip(1);
    let hex_path = args.next().ok_or_else(|| anyhow!("usage: program <firmware.hex> [family-id]"))?;
    let family_id = match args.next() {
        Some(raw) => u16::from_str_radix(raw.trim_start_matches("0x"), 16)
            .context("family id must be hexadecimal, e.g. 0x102")?,
        None => 0x102,
    };

    let profile = target::from_family_id(family_id)?;
    let (base, image) = load_image(&hex_path)?;
    println!(
        "Loaded {} bytes at {base:#010x} for {}",
        image.len(),
        profile.name
    );

    let api = hidapi::HidApi::new().context("initializing hidapi")?;
    let device = api
        .open(USB_VID, USB_PID)
        .context("no CMSIS-DAP probe found")?;
    let probe = CmsisDap::new(Box::new(device))?;

    let mut programmer = Psoc6Programmer::new(probe, profile);
    programmer.set_progress(FlashProgress::new(|event| match event {
        ProgressEvent::Erased { address, end } => {
            print!("\rErasing... {address:#010x} / {end:#010x}")
        }
        ProgressEvent::FinishedErasing => println!("\rErase done.                          "),
        ProgressEvent::RowProgrammed { row, total_rows } => {
            print!("\rProgramming row {}/{total_rows}", row + 1)
        }
        ProgressEvent::FinishedProgramming => println!("\rProgramming done.          "),
        _ => {}
    }));

    let start = Instant::now();
    programmer.acquire(AcquireMode::Reset, true, AccessPort::Auto)?;

    let info = programmer.silicon_info()?;
    println!(
        "Silicon: family {:#06x}, id {:#06x}, rev {:#04x}, {:?}",
        info.family_id, info.silicon_id, info.revision_id, info.protection
    );
    if info.family_id != profile.family_id {
        bail!(
            "connected device reports family {:#06x}, expected {:#06x}",
            info.family_id,
            profile.family_id
        );
    }

    programmer.erase_flash(base, base + image.len() as u32)?;
    programmer.program_flash(&image, base)?;
    programmer.verify_flash(&image, base)?;

    println!("Flashed and verified in {:.1?}.", start.elapsed());
    Ok(())
}

/// Flatten an Intel HEX file into one contiguous, row-padded image.
fn load_image(path: &str) -> Result<(u32, Vec<u8>)> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;

    let mut chunks: Vec<(u32, Vec<u8>)> = Vec::new();
    let mut upper: u32 = 0;
    for record in ihex::Reader::new(&text) {
        match record? {
            Record::ExtendedLinearAddress(address) => upper = u32::from(address) << 16,
            Record::Data { offset, value } => {
                chunks.push((upper + u32::from(offset), value));
            }
            Record::EndOfFile => break,
            _ => {}
        }
    }
    chunks.sort_by_key(|(address, _)| *address);
    let (base, _) = *chunks.first().ok_or_else(|| anyhow!("no data records in {path}"))?;

    let end = chunks
        .iter()
        .map(|(address, data)| address + data.len() as u32)
        .max()
        .unwrap_or(base);
    let mut image = vec![0u8; (end - base) as usize];
    for (address, data) in &chunks {
        let offset = (address - base) as usize;
        image[offset..offset + data.len()].copy_from_slice(data);
    }

    // Pad to a whole number of rows.
    let row = 512;
    image.resize(image.len().div_ceil(row) * row, 0);
    Ok((base, image))
}
