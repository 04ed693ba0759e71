//! # Ping Manager
//!
//! Sends ICMP Echo Requests to a single target and waits for the matching
//! reply, retrying on loss.
//!
//! A raw ICMP socket sees every ICMP datagram delivered to the host, so a reply
//! only counts when its source, identifier and sequence number all match the
//! outstanding probe. Everything else is dropped and the receive continues
//! until the same deadline.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace, warn};

use sweepr_common::ScanError;
use sweepr_common::config::{self, DEFAULT_RETRY_COUNT, DEFAULT_TIMEOUT};
use sweepr_common::network::device::PingResult;
use sweepr_protocols::icmp::{self, EchoId};

use crate::transport::{IcmpTransport, RawSocketFactory, TransportFactory};

pub const ALL_ATTEMPTS_FAILED: &str = "all ping attempts failed or timed out";

/// Large enough for any IPv4 datagram carrying an ICMP error with a full quote.
const RECV_BUFFER_SIZE: usize = 1_500;

/// Lifecycle of the most recent probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Idle,
    Sending,
    AwaitingReply,
    Success,
    /// The last attempt ran out of time. The next attempt, if any, starts from here.
    TimedOut,
    /// The last attempt was refused: short send, send error or an ICMP error.
    Failed,
}

/// Outcome of one attempt.
enum Attempt {
    Replied(Duration),
    TimedOut,
    Failed,
}

pub struct PingManager<F: TransportFactory = RawSocketFactory> {
    factory: Arc<F>,
    transport: Option<F::Transport>,
    timeout: Duration,
    retry_count: usize,
    identifier: u16,
    sequence: u16,
    state: ProbeState,
}

impl PingManager<RawSocketFactory> {
    pub fn new() -> Self {
        Self::with_factory(Arc::new(RawSocketFactory))
    }
}

impl Default for PingManager<RawSocketFactory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: TransportFactory> PingManager<F> {
    pub fn with_factory(factory: Arc<F>) -> Self {
        Self {
            factory,
            transport: None,
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            identifier: std::process::id() as u16,
            sequence: rand::random(),
            state: ProbeState::Idle,
        }
    }

    /// Overrides the Echo identifier (the truncated process id by default).
    pub fn with_identifier(mut self, identifier: u16) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.set_timeout(timeout);
        self
    }

    pub fn with_retry_count(mut self, retry_count: usize) -> Self {
        self.set_retry_count(retry_count);
        self
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_retry_count(&mut self, retry_count: usize) {
        self.retry_count = config::at_least_one("retry_count", retry_count);
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_count(&self) -> usize {
        self.retry_count
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Opens the socket unless it is already open.
    pub fn init(&mut self) -> Result<(), ScanError> {
        if self.transport.is_none() {
            self.transport = Some(self.factory.open()?);
        }
        Ok(())
    }

    /// Releases the socket. The next [`ping`](Self::ping) opens a new one.
    pub fn close(&mut self) {
        self.transport = None;
    }

    /// Probes `target` up to `retry_count` times.
    ///
    /// Only socket acquisition errors are returned as `Err`. Lost probes,
    /// send failures and ICMP errors end up in an unsuccessful [`PingResult`].
    pub async fn ping(&mut self, target: Ipv4Addr) -> Result<PingResult, ScanError> {
        self.init()?;
        let Some(mut transport) = self.transport.take() else {
            return Err(ScanError::SystemError);
        };

        let mut result = PingResult::failed(target, ALL_ATTEMPTS_FAILED);
        for attempt in 1..=self.retry_count {
            match self.attempt(&mut transport, target, attempt).await {
                Attempt::Replied(elapsed) => {
                    self.state = ProbeState::Success;
                    debug!(ip = %target, attempt, "reply after {:.3} ms", elapsed.as_secs_f64() * 1_000.0);
                    result = PingResult::succeeded(target, elapsed);
                    break;
                }
                Attempt::TimedOut => {
                    self.state = ProbeState::TimedOut;
                    debug!(ip = %target, attempt, "no reply within {:?}", self.timeout);
                }
                Attempt::Failed => self.state = ProbeState::Failed,
            }
        }

        self.transport = Some(transport);
        Ok(result)
    }

    async fn attempt(
        &mut self,
        transport: &mut F::Transport,
        target: Ipv4Addr,
        attempt: usize,
    ) -> Attempt {
        let echo = EchoId::new(self.identifier, self.next_sequence());
        let frame: Vec<u8> = icmp::build_echo_request(echo.identifier, echo.sequence);

        self.state = ProbeState::Sending;
        let send_time = Instant::now();
        let deadline = send_time + self.timeout;

        match timeout_at(deadline, transport.send_to(&frame, target)).await {
            Err(_elapsed) => {
                debug!(ip = %target, attempt, "send did not complete within {:?}", self.timeout);
                return Attempt::TimedOut;
            }
            Ok(Ok(written)) if written == frame.len() => {}
            Ok(Ok(written)) => {
                warn!(ip = %target, attempt, "short send: {written} of {} bytes", frame.len());
                return Attempt::Failed;
            }
            Ok(Err(e)) => {
                warn!(ip = %target, attempt, "send failed: {e}");
                return Attempt::Failed;
            }
        }

        self.state = ProbeState::AwaitingReply;
        trace!(ip = %target, sequence = echo.sequence, "echo request sent");

        let mut buf = [0u8; RECV_BUFFER_SIZE];
        loop {
            let received: usize = match timeout_at(deadline, transport.recv(&mut buf)).await {
                Err(_elapsed) => return Attempt::TimedOut,
                Ok(Ok(len)) => len,
                Ok(Err(e)) => {
                    // A failing receive cannot recover before the deadline.
                    warn!(ip = %target, attempt, "receive failed: {e}");
                    return Attempt::Failed;
                }
            };

            let reply = match icmp::parse_reply(&buf[..received]) {
                Ok(reply) => reply,
                Err(e) => {
                    trace!("discarding datagram: {e}");
                    continue;
                }
            };

            match reply.answers(target, echo) {
                Some(Ok(())) => return Attempt::Replied(send_time.elapsed()),
                Some(Err(err)) => {
                    debug!(ip = %target, attempt, "probe answered with an icmp error: {err}");
                    return Attempt::Failed;
                }
                None => trace!(source = %reply.source, "discarding unrelated icmp message"),
            }
        }
    }

    fn next_sequence(&mut self) -> u16 {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        sequence
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
