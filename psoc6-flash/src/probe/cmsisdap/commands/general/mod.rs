pub mod connect;
pub mod delay;
pub mod disconnect;
pub mod info;
pub mod led;
pub mod reset;
