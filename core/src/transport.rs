//! # ICMP Transport
//!
//! The socket seam of the engine. A [`TransportFactory`] opens one
//! [`IcmpTransport`] per probe; production code uses a raw `ICMPV4` socket,
//! tests plug in a simulated network.

use std::io::{self, Read};
use std::net::{Ipv4Addr, SocketAddrV4};

use async_trait::async_trait;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::io::unix::AsyncFd;
use tracing::{debug, error};

use sweepr_common::ScanError;

/// A bidirectional ICMPv4 endpoint.
#[async_trait]
pub trait IcmpTransport: Send {
    /// Sends a bare ICMP message to `destination`, returning the bytes written.
    async fn send_to(&mut self, frame: &[u8], destination: Ipv4Addr) -> io::Result<usize>;

    /// Receives one whole IPv4 datagram, IP header included.
    ///
    /// May wait forever. Callers bound it with a deadline.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

pub trait TransportFactory: Send + Sync + 'static {
    type Transport: IcmpTransport + 'static;

    /// Opens a new endpoint.
    ///
    /// Missing privilege must surface as [`ScanError::PermissionDenied`].
    fn open(&self) -> Result<Self::Transport, ScanError>;
}

/// Opens raw `ICMPV4` sockets. Needs root or `CAP_NET_RAW`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSocketFactory;

impl TransportFactory for RawSocketFactory {
    type Transport = RawIcmpSocket;

    fn open(&self) -> Result<RawIcmpSocket, ScanError> {
        RawIcmpSocket::open().map_err(|e| {
            let err = ScanError::from_socket_error(&e);
            error!("failed to open raw icmp socket: {e}");
            err
        })
    }
}

/// Receive buffer requested for every raw socket.
///
/// Each raw ICMP socket gets a copy of every ICMP datagram the host receives,
/// so a full batch of 254 probes lands in every socket of that batch.
pub const SOCKET_RECV_BUFFER: usize = 4 << 20;

/// A non-blocking raw ICMP socket registered with the tokio reactor.
#[derive(Debug)]
pub struct RawIcmpSocket {
    inner: AsyncFd<Socket>,
}

impl RawIcmpSocket {
    pub fn open() -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        socket.set_nonblocking(true)?;
        // The kernel caps the size at net.core.rmem_max; a smaller buffer still works.
        if let Err(e) = socket.set_recv_buffer_size(SOCKET_RECV_BUFFER) {
            debug!("could not grow the receive buffer: {e}");
        }
        debug!("opened raw icmp socket");
        Ok(Self {
            inner: AsyncFd::new(socket)?,
        })
    }

    /// The receive buffer size the kernel actually granted.
    pub fn recv_buffer_size(&self) -> io::Result<usize> {
        self.inner.get_ref().recv_buffer_size()
    }
}

#[async_trait]
impl IcmpTransport for RawIcmpSocket {
    async fn send_to(&mut self, frame: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        let addr = SockAddr::from(SocketAddrV4::new(destination, 0));
        loop {
            let mut guard = self.inner.writable().await?;
            match guard.try_io(|fd| fd.get_ref().send_to(frame, &addr)) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.inner.readable().await?;
            match guard.try_io(|fd| {
                let mut socket: &Socket = fd.get_ref();
                socket.read(buf)
            }) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }
}
