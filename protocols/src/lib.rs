//! Wire codecs used by the discovery engine.
//!
//! * [`checksum`]: the RFC 1071 Internet checksum.
//! * [`icmp`]: ICMPv4 Echo Request framing and reply parsing.

pub mod checksum;
pub mod icmp;

pub use checksum::checksum;
