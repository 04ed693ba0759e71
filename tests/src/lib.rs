//! Integration tests for the discovery engine.
//!
//! [`utils`] provides a simulated ICMP network that plugs into the engine
//! through its transport seam, so the real ping manager and scanner run
//! without raw socket privileges.

pub mod utils;

#[cfg(test)]
mod discovery;
#[cfg(test)]
mod net;
