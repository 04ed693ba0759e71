use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pnet::datalink::{MacAddr, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use pnet::packet::icmp::echo_reply::MutableEchoReplyPacket;
use pnet::packet::icmp::{IcmpCode, IcmpTypes};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::{self, MutableIpv4Packet};
use std::net::Ipv6Addr;
use tokio::time::Instant;

use sweepr_common::ScanError;
use sweepr_core::transport::{IcmpTransport, TransportFactory};
use sweepr_protocols::checksum;

pub const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 100);

/// How a simulated host reacts to an Echo Request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behaviour {
    /// Answers after `delay`.
    Reply { delay: Duration },
    /// Answers the previous sequence number first, then the current one.
    StaleThenReply,
    /// The local router reports the host unreachable.
    Unreachable,
}

#[derive(Debug, Default)]
pub struct NetworkStats {
    pub opened: AtomicUsize,
    pub sent: AtomicUsize,
    /// Every `open()` call, failed ones included.
    pub open_calls: AtomicUsize,
}

impl NetworkStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

/// A /24 where only the configured hosts react; every other probe is dropped.
#[derive(Debug, Clone, Default)]
pub struct SimulatedNetwork {
    hosts: Arc<HashMap<Ipv4Addr, Behaviour>>,
    stats: Arc<NetworkStats>,
    deny: bool,
    fail_open: Option<usize>,
}

impl SimulatedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opening a socket on this network fails like a missing `CAP_NET_RAW`.
    pub fn without_privilege() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    /// The `call`-th `open()`, counted from 1, fails like an exhausted fd table.
    pub fn fail_open_call(mut self, call: usize) -> Self {
        self.fail_open = Some(call);
        self
    }

    pub fn reply(self, ip: Ipv4Addr) -> Self {
        self.with(ip, Behaviour::Reply { delay: Duration::ZERO })
    }

    pub fn reply_after(self, ip: Ipv4Addr, delay: Duration) -> Self {
        self.with(ip, Behaviour::Reply { delay })
    }

    pub fn with(mut self, ip: Ipv4Addr, behaviour: Behaviour) -> Self {
        Arc::make_mut(&mut self.hosts).insert(ip, behaviour);
        self
    }

    pub fn stats(&self) -> Arc<NetworkStats> {
        Arc::clone(&self.stats)
    }
}

impl TransportFactory for SimulatedNetwork {
    type Transport = SimulatedSocket;

    fn open(&self) -> Result<SimulatedSocket, ScanError> {
        if self.deny {
            return Err(ScanError::PermissionDenied);
        }
        let call = self.stats.open_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_open == Some(call) {
            return Err(ScanError::SystemError);
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(SimulatedSocket {
            hosts: Arc::clone(&self.hosts),
            stats: Arc::clone(&self.stats),
            inbox: VecDeque::new(),
        })
    }
}

pub struct SimulatedSocket {
    hosts: Arc<HashMap<Ipv4Addr, Behaviour>>,
    stats: Arc<NetworkStats>,
    inbox: VecDeque<(Instant, Vec<u8>)>,
}

#[async_trait]
impl IcmpTransport for SimulatedSocket {
    async fn send_to(&mut self, frame: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        self.stats.sent.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();

        match self.hosts.get(&destination) {
            Some(Behaviour::Reply { delay }) => {
                self.inbox.push_back((now + *delay, echo_reply(destination, frame, 0)));
            }
            Some(Behaviour::StaleThenReply) => {
                self.inbox.push_back((now, echo_reply(destination, frame, 1)));
                self.inbox.push_back((now, echo_reply(destination, frame, 0)));
            }
            Some(Behaviour::Unreachable) => {
                self.inbox.push_back((now, host_unreachable(destination, frame)));
            }
            None => {}
        }
        Ok(frame.len())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some((ready_at, packet)) = self.inbox.pop_front() else {
            return std::future::pending().await;
        };
        tokio::time::sleep_until(ready_at).await;
        buf[..packet.len()].copy_from_slice(&packet);
        Ok(packet.len())
    }
}

/// The Echo Reply `host` sends for `request`, with its sequence number
/// lowered by `sequence_lag`.
pub fn echo_reply(host: Ipv4Addr, request: &[u8], sequence_lag: u16) -> Vec<u8> {
    let mut icmp = request.to_vec();
    {
        let mut reply = MutableEchoReplyPacket::new(&mut icmp).unwrap();
        let sequence = reply.get_sequence_number().wrapping_sub(sequence_lag);
        reply.set_icmp_type(IcmpTypes::EchoReply);
        reply.set_icmp_code(IcmpCode::new(0));
        reply.set_sequence_number(sequence);
        reply.set_checksum(0);
    }
    let csum = checksum(&icmp);
    icmp[2..4].copy_from_slice(&csum.to_be_bytes());
    ipv4_datagram(host, LOCAL_IP, &icmp)
}

/// A Destination Unreachable from the local router quoting `request` to `host`.
pub fn host_unreachable(host: Ipv4Addr, request: &[u8]) -> Vec<u8> {
    let quoted = ipv4_datagram(LOCAL_IP, host, &request[..8]);
    let mut icmp = vec![IcmpTypes::DestinationUnreachable.0, 1, 0, 0, 0, 0, 0, 0];
    icmp.extend_from_slice(&quoted);
    let csum = checksum(&icmp);
    icmp[2..4].copy_from_slice(&csum.to_be_bytes());
    ipv4_datagram(LOCAL_IP, LOCAL_IP, &icmp)
}

pub fn ipv4_datagram(source: Ipv4Addr, destination: Ipv4Addr, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 20 + payload.len()];
    {
        let mut packet = MutableIpv4Packet::new(&mut buf).unwrap();
        packet.set_version(4);
        packet.set_header_length(5);
        packet.set_total_length((20 + payload.len()) as u16);
        packet.set_ttl(64);
        packet.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
        packet.set_source(source);
        packet.set_destination(destination);
        packet.set_payload(payload);
        let csum = ipv4::checksum(&packet.to_immutable());
        packet.set_checksum(csum);
    }
    buf
}

/*************************************************************
                  Mock interfaces for testing
**************************************************************/

pub fn ni(name: &str, index: u32, mac: Option<MacAddr>, ips: &[IpNetwork], flags: u32) -> NetworkInterface {
    NetworkInterface {
        name: name.into(),
        description: "".into(),
        index,
        mac,
        ips: ips.to_vec(),
        flags,
    }
}

pub fn v4(a: u8, b: u8, c: u8, d: u8, p: u8) -> IpNetwork {
    IpNetwork::V4(Ipv4Network::new(Ipv4Addr::new(a, b, c, d), p).unwrap())
}

pub fn v6(s: &str, p: u8) -> IpNetwork {
    IpNetwork::V6(Ipv6Network::new(s.parse::<Ipv6Addr>().unwrap(), p).unwrap())
}
