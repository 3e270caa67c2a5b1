//! PSoC6 programming session: debug-port driver, handshake and target
//! acquisition.
//!
//! A [`Psoc6Programmer`] owns a probe and a family profile for the lifetime
//! of one session. All higher layers (IPC, SROM calls, flash algorithms in
//! the sibling modules) are built on the two memory primitives here,
//! [`Psoc6Programmer::write_io`] and [`Psoc6Programmer::read_io`].

pub mod flash;
pub mod ipc;

pub use ipc::{ProtectionState, SiliconInfo};

use std::thread;
use std::time::Duration;

use crate::architecture::arm::{core, dp};
use crate::error::{Error, PollOperation, ProtocolError};
use crate::probe::cmsisdap::commands::swj::pins::SWJPinsRequest;
use crate::probe::cmsisdap::commands::transfer::configure::ConfigureRequest;
use crate::probe::cmsisdap::commands::transfer::{ack, TransferRequest, TransferResponse};
use crate::probe::{CmsisDap, WireProtocol};
use crate::progress::FlashProgress;
use crate::target::TargetProfile;

/// DP IDCODE of the PSoC6 SWD debug port.
const SWD_IDCODE: u32 = 0x6BA0_2477;
/// TAP IDCODE of the PSoC6 JTAG debug port.
const JTAG_IDCODE: u32 = 0x6BA0_0477;

/// Maximum number of one-millisecond handshake attempts.
const HANDSHAKE_ATTEMPTS: u32 = 300;

/// Default SWD/JTAG clock in Hz.
const DEFAULT_CLOCK_HZ: u32 = 2_000_000;

/// Line reset plus JTAG-to-SWD select sequence, clocked LSB first.
const JTAG_TO_SWD: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x9E, 0xE7, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x00,
];

/// Access-port selection for [`Psoc6Programmer::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPort {
    /// AP 0, the system access port.
    Sys,
    /// AP 1, the CM0+ core.
    Cm0,
    /// AP 2, the CM4 core.
    Cm4,
    /// Scan APs 0..=2 and use the first one with a readable ARM core.
    Auto,
}

impl AccessPort {
    fn index(self) -> Option<u8> {
        match self {
            AccessPort::Sys => Some(0),
            AccessPort::Cm0 => Some(1),
            AccessPort::Cm4 => Some(2),
            AccessPort::Auto => None,
        }
    }
}

/// How the target is brought into a known state before attaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    /// Toggle the external reset line.
    Reset,
    /// Power-cycle the target.
    PowerCycle,
}

/// One programming session against a PSoC6 target.
pub struct Psoc6Programmer {
    probe: CmsisDap,
    profile: &'static TargetProfile,
    protocol: WireProtocol,
    clock_speed_hz: u32,
    /// AP index selected by the last debug-port init.
    ap: u8,
    /// Whether the debug port is up; gates all target memory access.
    initialized: bool,
    progress: FlashProgress,
}

impl Psoc6Programmer {
    /// Create a session over an opened probe for the given family.
    pub fn new(probe: CmsisDap, profile: &'static TargetProfile) -> Self {
        Self {
            probe,
            profile,
            protocol: WireProtocol::Swd,
            clock_speed_hz: DEFAULT_CLOCK_HZ,
            ap: 0,
            initialized: false,
            progress: FlashProgress::no_op(),
        }
    }

    /// Replace the progress handler for following erase/program calls.
    pub fn set_progress(&mut self, progress: FlashProgress) {
        self.progress = progress;
    }

    /// Set the SWD/JTAG clock used from the next handshake on.
    pub fn set_clock_speed(&mut self, clock_speed_hz: u32) {
        self.clock_speed_hz = clock_speed_hz;
    }

    /// The family profile this session was created with.
    pub fn profile(&self) -> &'static TargetProfile {
        self.profile
    }

    /// Give the probe back, ending the session.
    pub fn into_probe(self) -> CmsisDap {
        self.probe
    }

    fn expected_ack(&self) -> u8 {
        match self.protocol {
            WireProtocol::Swd => ack::SWD_OK,
            WireProtocol::Jtag => ack::JTAG_OK,
        }
    }

    fn check_ack(&self, response: &TransferResponse) -> Result<(), Error> {
        let expected = self.expected_ack();
        if response.ack != expected {
            return Err(ProtocolError::AckMismatch {
                expected,
                actual: response.ack,
            }
            .into());
        }
        Ok(())
    }

    /// Write a DP or AP register directly.
    fn write_dap(&mut self, selector: u8, data: u32) -> Result<(), Error> {
        let request = TransferRequest::write(selector, data);
        let response = self.probe.transfer(&request)?;
        self.check_ack(&response)
    }

    /// Read a DP or AP register directly.
    fn read_dap(&mut self, selector: u8) -> Result<u32, Error> {
        let request = TransferRequest::read(selector);
        let response = self.probe.transfer(&request)?;
        self.check_ack(&response)?;
        response
            .data
            .first()
            .copied()
            .ok_or_else(|| ProtocolError::ShortResponse("a DAP register read").into())
    }

    /// Write one word of target memory: TAR and DRW in a single command.
    pub fn write_io(&mut self, addr: u32, data: u32) -> Result<(), Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        let mut request = TransferRequest::empty();
        request.add_write(dp::write::TAR, addr);
        request.add_write(dp::write::DRW, data);
        let response = self.probe.transfer(&request)?;
        self.check_ack(&response)
    }

    /// Read one word of target memory.
    ///
    /// The MEM-AP read pipeline is one transfer behind: the DRW read only
    /// starts the access and returns stale data, the following RDBUFF read
    /// delivers the word. Both run in a single command and the first word
    /// is discarded.
    pub fn read_io(&mut self, addr: u32) -> Result<u32, Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        let mut request = TransferRequest::empty();
        request.add_write(dp::write::TAR, addr);
        request.add_read(dp::read::DRW);
        request.add_read(dp::read::RDBUFF);
        let response = self.probe.transfer(&request)?;
        self.check_ack(&response)?;
        if response.data.len() < 2 {
            return Err(ProtocolError::ShortResponse("a target memory read").into());
        }
        Ok(response.data[1])
    }

    /// Bring up the wire protocol and match the debug port's IDCODE.
    ///
    /// Retries the whole connect/configure/line-reset/IDCODE cycle once per
    /// millisecond; a target still in reset answers nothing for a while.
    pub fn handshake(&mut self) -> Result<(), Error> {
        let expected_id = match self.protocol {
            WireProtocol::Swd => SWD_IDCODE,
            WireProtocol::Jtag => JTAG_IDCODE,
        };

        for attempt in 0..HANDSHAKE_ATTEMPTS {
            match self.try_handshake(expected_id) {
                Ok(()) => {
                    tracing::debug!("Handshake succeeded after {} attempt(s)", attempt + 1);
                    return Ok(());
                }
                Err(Error::NotImplemented(what)) => return Err(Error::NotImplemented(what)),
                Err(error) => {
                    tracing::trace!("Handshake attempt {attempt} failed: {error}");
                }
            }
            thread::sleep(Duration::from_millis(1));
        }
        Err(Error::Timeout(PollOperation::Handshake))
    }

    fn try_handshake(&mut self, expected_id: u32) -> Result<(), Error> {
        self.probe.connect(self.protocol)?;
        self.probe.transfer_configure(ConfigureRequest {
            idle_cycles: 0,
            wait_retry: 0x0040,
            match_retry: 0,
        })?;
        self.probe.set_swj_clock(self.clock_speed_hz)?;
        match self.protocol {
            WireProtocol::Swd => self.probe.swj_sequence(&JTAG_TO_SWD)?,
            WireProtocol::Jtag => {
                return Err(Error::NotImplemented("the SWD-to-JTAG switch sequence"))
            }
        }

        let id = self.read_dap(dp::read::IDCODE)?;
        if id != expected_id {
            tracing::trace!("IDCODE {id:#010x} does not match {expected_id:#010x}");
            return Err(ProtocolError::ErrorResponse.into());
        }
        Ok(())
    }

    /// Handshake, power up the debug domains and select an access port.
    pub fn init_debug_port(&mut self, ap: u8) -> Result<(), Error> {
        self.initialized = false;
        self.handshake()?;

        match self.protocol {
            WireProtocol::Swd => {
                // Clear all sticky error flags before powering up.
                self.write_dap(dp::write::ABORT, 0x0000_001E)?;
                self.write_dap(dp::write::CTRLSTAT, 0x5000_0000)?;
            }
            WireProtocol::Jtag => {
                self.write_dap(dp::write::CTRLSTAT, 0x5000_0032)?;
            }
        }
        self.write_dap(dp::write::SELECT, u32::from(ap) << 24)?;
        // 32-bit accesses, no auto-increment.
        self.write_dap(dp::write::CSW, 0x2300_0002)?;

        self.ap = ap;
        self.initialized = true;
        Ok(())
    }

    /// Probe APs 0..=2 and return those that expose an ARM core.
    ///
    /// An AP that fails to initialize or answer the CPUID read is skipped
    /// and never retried.
    pub fn scan_access_ports(&mut self) -> Result<Vec<u8>, Error> {
        let mut found = Vec::new();
        for ap in 0..=2 {
            match self.probe_access_port(ap) {
                Ok(true) => found.push(ap),
                Ok(false) => tracing::debug!("AP {ap}: CPUID is not an ARM core"),
                Err(error) => tracing::debug!("AP {ap} skipped: {error}"),
            }
        }
        tracing::info!("Usable access ports: {found:?}");
        Ok(found)
    }

    fn probe_access_port(&mut self, ap: u8) -> Result<bool, Error> {
        self.init_debug_port(ap)?;
        let cpuid = self.read_io(core::CPUID)?;
        Ok(cpuid & core::CPUID_IMPLEMENTER_MSK == core::CPUID_IMPLEMENTER_ARM)
    }

    /// Initialize the debug port on the requested or first usable AP.
    ///
    /// Returns the AP index actually attached to.
    pub fn attach(&mut self, ap: AccessPort) -> Result<u8, Error> {
        let ap = match ap.index() {
            Some(index) => index,
            None => *self
                .scan_access_ports()?
                .first()
                .ok_or(Error::NoAccessPort)?,
        };
        self.init_debug_port(ap)?;
        Ok(ap)
    }

    /// Pulse the external reset line low for 10 ms.
    pub fn toggle_xres(&mut self) -> Result<(), Error> {
        self.initialized = false;
        self.probe.swj_pins(SWJPinsRequest::nreset(false))?;
        thread::sleep(Duration::from_millis(10));
        self.probe.swj_pins(SWJPinsRequest::nreset(true))?;
        Ok(())
    }

    /// Reset the target and attach while its boot code still runs.
    ///
    /// With `test_mode` set, the SRSS test-mode bit keeps the boot code
    /// parked; the program counter is then required to sit inside ROM or
    /// application flash. Without it, the reset vector is patched through
    /// the breakpoint unit and the core is parked on an idle loop in SRAM.
    pub fn acquire(
        &mut self,
        mode: AcquireMode,
        test_mode: bool,
        ap: AccessPort,
    ) -> Result<(), Error> {
        match mode {
            AcquireMode::Reset => self.toggle_xres()?,
            AcquireMode::PowerCycle => {
                return Err(Error::NotImplemented("power-cycle acquisition"))
            }
        }
        // Give the boot code time to configure the debug pins.
        thread::sleep(Duration::from_millis(100));

        let ap = self.attach(ap)?;

        if test_mode {
            self.acquire_test_mode()
        } else {
            self.acquire_halt_and_patch(ap)
        }
    }

    fn acquire_test_mode(&mut self) -> Result<(), Error> {
        let profile = self.profile;
        self.write_io(profile.test_mode_addr, profile.test_mode_msk)?;
        let readback = self.read_io(profile.test_mode_addr)?;
        if readback & profile.test_mode_msk == 0 {
            return Err(Error::TestModeNotSet);
        }

        self.write_io(core::DCRSR, core::REG_PC)?;
        let pc = self.read_io(core::DCRDR)?;
        let in_rom = (profile.rom_base..profile.rom_base + profile.rom_size).contains(&pc);
        let in_flash = (profile.flash_base..profile.flash_base + profile.flash_size).contains(&pc);
        if !in_rom && !in_flash {
            return Err(Error::PcOutsideBootCode { pc });
        }
        tracing::debug!("Acquired in test mode, PC = {pc:#010x}");
        Ok(())
    }

    fn acquire_halt_and_patch(&mut self, ap: u8) -> Result<(), Error> {
        let profile = self.profile;
        let vtbase_addr = if ap == 2 {
            profile.vtbase_cm4
        } else {
            profile.vtbase_cm0
        };

        let vtbase = self.read_io(vtbase_addr)? & 0xFFFF_0000;
        // An unprogrammed part has no vector table to patch; the core is
        // already parked in the boot code.
        if vtbase == 0 || vtbase == 0xFFFF_0000 {
            return Ok(());
        }
        let reset_vector = self.read_io(vtbase + 4)?;
        if reset_vector == 0 {
            return Ok(());
        }

        self.write_io(core::DHCSR, core::DHCSR_HALT)?;
        let dhcsr = self.read_io(core::DHCSR)?;
        if dhcsr & core::DHCSR_HALTED_MSK != core::DHCSR_HALTED_MSK {
            return Err(Error::CoreNotHalted);
        }

        // Breakpoint on the reset handler.
        self.write_io(core::FP_CTRL, 0x0000_0003)?;
        let comparator = (reset_vector & 0x1FFF_FFFC) | 0xC000_0001;
        self.write_io(core::FP_COMP0, comparator)?;

        // The reset request can drop the debug connection mid-transfer, so
        // its outcome is deliberately ignored.
        if let Err(error) = self.write_io(core::AIRCR, core::AIRCR_SYSRESETREQ) {
            tracing::trace!("Reset request tore down the line: {error}");
        }

        self.init_debug_port(ap)?;

        let mut halted = false;
        for _ in 0..110 {
            let dhcsr = self.read_io(core::DHCSR)?;
            if dhcsr & core::DHCSR_HALTED_MSK == core::DHCSR_HALTED_MSK {
                halted = true;
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        if !halted {
            return Err(Error::Timeout(PollOperation::CoreHalt));
        }

        // Park the core on `b .` in SRAM and point SP at a sane stack.
        let loop_addr = profile.sram_base + 0x300;
        self.write_io(loop_addr, 0xE7FE_E7FE)?;
        self.write_io(core::DCRDR, loop_addr | 1)?;
        self.write_io(core::DCRSR, core::REG_WRITE | core::REG_PC)?;
        self.write_io(core::DCRDR, profile.sram_base + 0xFFF0)?;
        self.write_io(core::DCRSR, core::REG_WRITE | core::REG_SP)?;

        self.write_io(core::DCRSR, core::REG_XPSR)?;
        let psr = self.read_io(core::DCRDR)?;
        self.write_io(core::DCRDR, psr | core::XPSR_THUMB)?;
        self.write_io(core::DCRSR, core::REG_WRITE | core::REG_XPSR)?;

        // Disarm the breakpoint unit and let the core run into the loop.
        self.write_io(core::FP_CTRL, 0x0000_0002)?;
        self.write_io(core::DHCSR, core::DHCSR_RUN)?;
        tracing::debug!("Acquired by halt-and-patch on AP {ap}");
        Ok(())
    }
}
