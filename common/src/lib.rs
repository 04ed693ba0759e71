//! Shared models for `sweepr`: scan configuration, the error taxonomy, subnet
//! arithmetic and the result types handed back to callers.

pub mod config;
pub mod error;
pub mod log;
pub mod network;

pub use error::ScanError;
