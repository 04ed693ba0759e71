//! ICMPv4 Echo framing.
//!
//! Outgoing probes are bare ICMP messages (the kernel prepends the IPv4
//! header). Incoming data from a raw ICMP socket is a whole IPv4 datagram, so
//! [`parse_reply`] skips the IP header before reading the ICMP message.

use std::net::Ipv4Addr;
use std::time::{SystemTime, UNIX_EPOCH};

use pnet::packet::icmp::IcmpPacket;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::EchoRequestPacket;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use thiserror::Error;

use sweepr_common::ScanError;

use crate::checksum::checksum;

pub const ICMP_HDR_LEN: usize = 8;
pub const ECHO_PAYLOAD_LEN: usize = 32;
pub const ECHO_REQUEST_LEN: usize = ICMP_HDR_LEN + ECHO_PAYLOAD_LEN;
pub const IPV4_MIN_HDR_LEN: usize = 20;
pub const MIN_REPLY_LEN: usize = IPV4_MIN_HDR_LEN + ICMP_HDR_LEN;

const TIMESTAMP_LEN: usize = 8;

const TYPE_ECHO_REPLY: u8 = 0;
const TYPE_DESTINATION_UNREACHABLE: u8 = 3;
const TYPE_ECHO_REQUEST: u8 = 8;
const TYPE_TIME_EXCEEDED: u8 = 11;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("icmp reply too short: {len} bytes")]
    TooShort { len: usize },

    #[error("invalid ip header length {header_len} in a {len} byte icmp reply")]
    InvalidHeaderLength { header_len: usize, len: usize },
}

impl From<ParseError> for ScanError {
    fn from(_: ParseError) -> Self {
        ScanError::SystemError
    }
}

/// Identifier and sequence number pair carried by Echo messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EchoId {
    pub identifier: u16,
    pub sequence: u16,
}

impl EchoId {
    pub fn new(identifier: u16, sequence: u16) -> Self {
        Self { identifier, sequence }
    }
}

/// The Echo Request quoted back inside an ICMP error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotedProbe {
    pub destination: Ipv4Addr,
    pub echo: EchoId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    EchoReply(EchoId),
    DestinationUnreachable { code: u8, quoted: Option<QuotedProbe> },
    TimeExceeded { code: u8, quoted: Option<QuotedProbe> },
    Other { icmp_type: u8, code: u8 },
}

/// A classified ICMP message together with the address that sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedReply {
    pub source: Ipv4Addr,
    pub kind: ReplyKind,
}

impl ParsedReply {
    /// Maps the message onto the scan error taxonomy.
    ///
    /// Only an Echo Reply is a success. Unreachable and unknown types are a
    /// [`ScanError::SystemError`], time exceeded is [`ScanError::TimeoutExceeded`].
    pub fn status(&self) -> Result<EchoId, ScanError> {
        match self.kind {
            ReplyKind::EchoReply(echo) => Ok(echo),
            ReplyKind::DestinationUnreachable { .. } => Err(ScanError::SystemError),
            ReplyKind::TimeExceeded { .. } => Err(ScanError::TimeoutExceeded),
            ReplyKind::Other { .. } => Err(ScanError::SystemError),
        }
    }

    /// Correlates this message with the outstanding probe `echo` sent to `target`.
    ///
    /// Returns `None` when the message belongs to someone else: another host,
    /// another identifier, an earlier sequence number, or unrelated ICMP traffic.
    pub fn answers(&self, target: Ipv4Addr, echo: EchoId) -> Option<Result<(), ScanError>> {
        match self.kind {
            ReplyKind::EchoReply(reply) => {
                (self.source == target && reply == echo).then_some(Ok(()))
            }
            ReplyKind::DestinationUnreachable { quoted, .. }
            | ReplyKind::TimeExceeded { quoted, .. } => {
                let quoted = quoted?;
                (quoted.destination == target && quoted.echo == echo)
                    .then(|| self.status().map(|_| ()))
            }
            ReplyKind::Other { .. } => None,
        }
    }
}

/// Builds an ICMP Echo Request stamped with the current wall-clock time.
pub fn build_echo_request(identifier: u16, sequence: u16) -> Vec<u8> {
    build_echo_request_at(identifier, sequence, unix_nanos())
}

/// Builds a 40 byte ICMP Echo Request.
///
/// Layout: type 8, code 0, checksum, identifier, sequence (all big-endian),
/// then an 8 byte big-endian `timestamp` and a pattern whose byte at frame
/// offset `i` equals `i & 0xff`. The checksum covers the whole frame.
pub fn build_echo_request_at(identifier: u16, sequence: u16, timestamp: u64) -> Vec<u8> {
    let mut frame: Vec<u8> = Vec::with_capacity(ECHO_REQUEST_LEN);
    frame.extend_from_slice(&[TYPE_ECHO_REQUEST, 0, 0, 0]);
    frame.extend_from_slice(&identifier.to_be_bytes());
    frame.extend_from_slice(&sequence.to_be_bytes());
    frame.extend_from_slice(&timestamp.to_be_bytes());

    let pattern_start: usize = ICMP_HDR_LEN + TIMESTAMP_LEN;
    frame.extend((pattern_start..ECHO_REQUEST_LEN).map(|offset| (offset & 0xff) as u8));

    let csum: u16 = checksum(&frame);
    frame[2..4].copy_from_slice(&csum.to_be_bytes());
    frame
}

/// Parses a raw IPv4 datagram received on an ICMP socket.
pub fn parse_reply(frame: &[u8]) -> Result<ParsedReply, ParseError> {
    let len: usize = frame.len();
    if len < MIN_REPLY_LEN {
        return Err(ParseError::TooShort { len });
    }

    let header_len: usize = usize::from(frame[0] & 0x0f) * 4;
    if header_len < IPV4_MIN_HDR_LEN || len < header_len + ICMP_HDR_LEN {
        return Err(ParseError::InvalidHeaderLength { header_len, len });
    }

    let ip = Ipv4Packet::new(frame).ok_or(ParseError::TooShort { len })?;
    let icmp_bytes: &[u8] = &frame[header_len..];
    let icmp = IcmpPacket::new(icmp_bytes).ok_or(ParseError::TooShort { len })?;
    let icmp_type: u8 = icmp.get_icmp_type().0;
    let code: u8 = icmp.get_icmp_code().0;

    let kind: ReplyKind = match icmp_type {
        TYPE_ECHO_REPLY if code == 0 => {
            let echo = EchoReplyPacket::new(icmp_bytes).ok_or(ParseError::TooShort { len })?;
            ReplyKind::EchoReply(EchoId::new(
                echo.get_identifier(),
                echo.get_sequence_number(),
            ))
        }
        TYPE_DESTINATION_UNREACHABLE => ReplyKind::DestinationUnreachable {
            code,
            quoted: quoted_probe(icmp_bytes),
        },
        TYPE_TIME_EXCEEDED => ReplyKind::TimeExceeded {
            code,
            quoted: quoted_probe(icmp_bytes),
        },
        _ => ReplyKind::Other { icmp_type, code },
    };

    Ok(ParsedReply {
        source: ip.get_source(),
        kind,
    })
}

/// Extracts the Echo Request an error message quotes: the original IPv4
/// header plus at least the first 8 bytes of its ICMP message.
fn quoted_probe(icmp_bytes: &[u8]) -> Option<QuotedProbe> {
    let inner: &[u8] = icmp_bytes.get(ICMP_HDR_LEN..)?;
    let ip = Ipv4Packet::new(inner)?;
    if ip.get_next_level_protocol() != IpNextHeaderProtocols::Icmp {
        return None;
    }

    let header_len: usize = usize::from(ip.get_header_length()) * 4;
    let request = EchoRequestPacket::new(inner.get(header_len..)?)?;
    if request.get_icmp_type().0 != TYPE_ECHO_REQUEST {
        return None;
    }

    Some(QuotedProbe {
        destination: ip.get_destination(),
        echo: EchoId::new(request.get_identifier(), request.get_sequence_number()),
    })
}

fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
