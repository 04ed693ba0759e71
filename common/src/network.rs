pub mod device;
pub mod subnet;
