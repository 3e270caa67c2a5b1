//! ARM debug interface definitions: DP/AP register selectors and the
//! architectural Cortex-M debug registers.

pub mod core;
pub mod dp;
