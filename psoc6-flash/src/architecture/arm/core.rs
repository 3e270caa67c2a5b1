//! Architectural Cortex-M debug registers.
//!
//! These addresses are fixed by the ARMv7-M architecture and shared by all
//! PSoC6 families; they are deliberately not part of [`crate::target`].

/// CPUID base register.
pub const CPUID: u32 = 0xE000_ED00;
/// Application Interrupt and Reset Control Register.
pub const AIRCR: u32 = 0xE000_ED0C;
/// Debug Halting Control and Status Register.
pub const DHCSR: u32 = 0xE000_EDF0;
/// Debug Core Register Selector Register.
pub const DCRSR: u32 = 0xE000_EDF4;
/// Debug Core Register Data Register.
pub const DCRDR: u32 = 0xE000_EDF8;
/// Flash Patch and Breakpoint unit control register.
pub const FP_CTRL: u32 = 0xE000_2000;
/// Flash Patch comparator 0.
pub const FP_COMP0: u32 = 0xE000_2008;

/// CPUID implementer field value for ARM.
pub const CPUID_IMPLEMENTER_ARM: u32 = 0x4100_0000;
/// Mask of the CPUID implementer field.
pub const CPUID_IMPLEMENTER_MSK: u32 = 0xFF00_0000;

/// DHCSR write: debug key, C_HALT | C_DEBUGEN.
pub const DHCSR_HALT: u32 = 0xA05F_0003;
/// DHCSR write: debug key, C_DEBUGEN only (run).
pub const DHCSR_RUN: u32 = 0xA05F_0001;
/// DHCSR read mask: C_HALT | C_DEBUGEN both visible.
pub const DHCSR_HALTED_MSK: u32 = 0x0000_0003;

/// AIRCR write: vector key, SYSRESETREQ.
pub const AIRCR_SYSRESETREQ: u32 = 0x05FA_0004;

/// DCRSR selector for the program counter (DebugReturnAddress).
pub const REG_PC: u32 = 0x0000_000F;
/// DCRSR selector for xPSR.
pub const REG_XPSR: u32 = 0x0000_0010;
/// DCRSR selector for the main stack pointer.
pub const REG_SP: u32 = 0x0000_0011;
/// DCRSR write-request flag, combined with a register selector.
pub const REG_WRITE: u32 = 0x0001_0000;

/// Thumb state bit in xPSR; must stay set when rewriting the PSR.
pub const XPSR_THUMB: u32 = 0x0100_0000;
