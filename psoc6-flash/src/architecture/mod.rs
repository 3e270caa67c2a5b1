//! Architecture-level register definitions.

pub mod arm;
