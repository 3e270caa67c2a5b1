pub mod configure;
pub mod idcode;
pub mod sequence;
