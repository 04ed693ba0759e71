//! # sweepr discovery engine
//!
//! Finds live hosts on a /24 network with ICMP Echo probes.
//!
//! * [`discovery`] resolves the machine's own routable address.
//! * [`scanner`] drives one [`ping::PingManager`] per candidate host in
//!   bounded batches and aggregates the responders.
//! * [`transport`] and [`resolver`] are the seams to the socket layer and the
//!   system resolver.

pub mod discovery;
pub mod ping;
pub mod resolver;
pub mod scanner;
pub mod transport;

pub use ping::PingManager;
pub use scanner::SubnetScanner;
