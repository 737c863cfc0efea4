//! Byte transports underneath [`crate::protocol::BinaryProtocol`].
//!
//! [`UdpTransport`] is the unreliable datagram layer.  One logical message is
//! assembled with [`Transport::write`] and sent as exactly one datagram by
//! [`Transport::flush`]; replies are read back out of the most recently
//! accepted datagram.  Reliability is recovered at message granularity:
//!
//! ```text
//!   flush ──▶ send_to(peer) ───────────────┐
//!                                          │ last_sent kept
//!   read ──▶ recv_from ──timeout──▶ retransmit(last_sent) ──▶ recv_from …
//!              │                            (max_retries times)
//!              ├─ from ≠ peer   → discard, keep waiting
//!              ├─ incoming loss → discard, keep waiting
//!              └─ accepted      → buffered, served by cursor
//! ```
//!
//! [`MemoryTransport`] keeps everything in a `Vec<u8>` and is used to encode
//! or decode messages without a socket.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use crate::error::{ProtocolError, Result, TransportError};
use crate::simulator::LossSimulator;

/// Maximum UDP payload size; also the default receive buffer size.
pub const MAX_DATAGRAM: usize = 65_535;

/// A byte-oriented message transport.
pub trait Transport {
    fn is_open(&self) -> bool;

    fn open(&mut self) -> Result<()>;

    fn close(&mut self);

    /// Read up to `buf.len()` bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Fill `buf` completely.  A read that yields zero bytes means the
    /// stream ended and is reported as [`TransportError::EndOfFile`].
    fn read_all(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut have = 0;
        while have < buf.len() {
            let n = self.read(&mut buf[have..])?;
            if n == 0 {
                return Err(TransportError::EndOfFile.into());
            }
            have += n;
        }
        Ok(())
    }

    /// Append to the outbound message.  Nothing is transmitted.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Transmit the outbound message.
    fn flush(&mut self) -> Result<()>;

    /// Toggle listen mode (blocking receives with no timeout).
    fn set_listen(&mut self, _listen: bool) -> Result<()> {
        Ok(())
    }

    /// Throw away whatever is left of the current inbound message.
    fn discard_inbound(&mut self) {}
}

// ---------------------------------------------------------------------------
// UdpTransport
// ---------------------------------------------------------------------------

/// Counters describing what the transport has done so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransportStats {
    /// Every flush or retransmit, whether or not the datagram left the host.
    pub send_attempts: u64,
    /// Datagrams actually handed to the socket.
    pub datagrams_sent: u64,
    /// Datagrams accepted from the peer.
    pub datagrams_received: u64,
    /// Sends swallowed by the loss simulator.
    pub outgoing_dropped: u64,
    /// Receives swallowed by the loss simulator.
    pub incoming_dropped: u64,
    /// Timeout-triggered resends of the last message.
    pub retransmits: u64,
    /// Datagrams ignored because they came from someone other than the peer.
    pub foreign_discarded: u64,
}

/// Datagram transport bound to a single, fixed peer.
#[derive(Debug)]
pub struct UdpTransport {
    peer: SocketAddr,
    local: Option<SocketAddr>,
    socket: Option<UdpSocket>,
    /// `None` blocks indefinitely.
    timeout: Option<Duration>,
    max_retries: u32,
    max_datagram: usize,
    write_buf: Vec<u8>,
    last_sent: Option<Vec<u8>>,
    read_buf: Option<Vec<u8>>,
    read_pos: usize,
    listen: bool,
    /// Retransmissions spent on the outstanding message.
    retries_used: u32,
    /// End of the current receive attempt, carried across reads so that
    /// discarding a datagram above this layer does not restart the clock.
    deadline: Option<Instant>,
    simulator: LossSimulator,
    stats: TransportStats,
}

impl UdpTransport {
    /// A closed transport that will talk to `peer` once opened.
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            local: None,
            socket: None,
            timeout: None,
            max_retries: 0,
            max_datagram: MAX_DATAGRAM,
            write_buf: Vec::new(),
            last_sent: None,
            read_buf: None,
            read_pos: 0,
            listen: false,
            retries_used: 0,
            deadline: None,
            simulator: LossSimulator::default(),
            stats: TransportStats::default(),
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Local address to bind on [`Transport::open`].  Defaults to the
    /// unspecified address of the peer's family with an ephemeral port.
    pub fn set_local_addr(&mut self, addr: SocketAddr) {
        self.local = Some(addr);
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotOpen)?;
        Ok(socket.local_addr()?)
    }

    /// Set the per-receive timeout.  `None` (or a zero duration) blocks
    /// indefinitely.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self.deadline = None;
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Number of retransmissions allowed after the initial send.
    pub fn set_max_retries(&mut self, retries: u32) {
        self.max_retries = retries;
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Largest message that will be sent.  Receives always use a buffer of
    /// [`MAX_DATAGRAM`] bytes so an oversized reply is never cut short.
    pub fn set_max_datagram(&mut self, size: usize) {
        self.max_datagram = size.max(1);
    }

    pub fn max_datagram(&self) -> usize {
        self.max_datagram
    }

    pub fn set_simulator(&mut self, simulator: LossSimulator) {
        self.simulator = simulator;
    }

    pub fn simulator_mut(&mut self) -> &mut LossSimulator {
        &mut self.simulator
    }

    pub fn stats(&self) -> TransportStats {
        self.stats
    }

    pub fn is_listening(&self) -> bool {
        self.listen
    }

    /// Send the previously flushed message again, byte for byte.
    pub fn retransmit(&mut self) -> Result<()> {
        let buf = self
            .last_sent
            .take()
            .ok_or(TransportError::NothingToRetransmit)?;
        self.stats.retransmits += 1;
        let result = self.transmit(&buf);
        self.last_sent = Some(buf);
        result
    }

    fn transmit(&mut self, buf: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotOpen)?;
        if buf.len() > self.max_datagram {
            return Err(TransportError::MessageTooLarge {
                size: buf.len(),
                max: self.max_datagram,
            }
            .into());
        }

        self.stats.send_attempts += 1;
        if self.simulator.drop_outgoing() {
            self.stats.outgoing_dropped += 1;
            log::warn!("[udp] outgoing datagram dropped ({} bytes)", buf.len());
            return Ok(());
        }

        socket.send_to(buf, self.peer)?;
        self.stats.datagrams_sent += 1;
        log::debug!("[udp] → {} bytes to {}", buf.len(), self.peer);
        Ok(())
    }

    /// Block until a datagram from the peer is accepted into `read_buf`.
    ///
    /// Each attempt waits at most `timeout` in total; foreign or dropped
    /// datagrams do not extend the deadline.  The attempt deadline and the
    /// retries spent belong to the outstanding message, not to this call:
    /// a later read for the same message resumes them.  After `max_retries`
    /// retransmissions the message is given up.
    fn receive_datagram(&mut self) -> Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            if self.listen {
                self.deadline = None;
            } else if self.deadline.is_none() {
                self.deadline = self.timeout.map(|t| Instant::now() + t);
            }
            let deadline = self.deadline;

            loop {
                let socket = self.socket.as_ref().ok_or(TransportError::NotOpen)?;
                let wait = match deadline {
                    Some(d) => {
                        let left = d.saturating_duration_since(Instant::now());
                        if left.is_zero() {
                            break;
                        }
                        Some(left)
                    }
                    None => None,
                };
                socket.set_read_timeout(wait)?;

                match socket.recv_from(&mut buf) {
                    Ok((n, from)) => {
                        if from != self.peer {
                            self.stats.foreign_discarded += 1;
                            log::debug!("[udp] ← {n} bytes from {from} ignored (not peer)");
                            continue;
                        }
                        if self.simulator.drop_incoming() {
                            self.stats.incoming_dropped += 1;
                            log::warn!("[udp] incoming datagram dropped ({n} bytes)");
                            continue;
                        }
                        if n > self.max_datagram {
                            log::warn!(
                                "[udp] ← {n} bytes exceeds configured limit of {}",
                                self.max_datagram
                            );
                        }
                        self.stats.datagrams_received += 1;
                        log::debug!("[udp] ← {n} bytes from {from}");
                        buf.truncate(n);
                        self.read_buf = Some(buf);
                        self.read_pos = 0;
                        return Ok(());
                    }
                    Err(e) if is_timeout(&e) => break,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(TransportError::Io(e).into()),
                }
            }

            if self.retries_used >= self.max_retries {
                let attempts = self.retries_used + 1;
                self.reset_attempt();
                log::warn!(
                    "[udp] no reply from {} after {attempts} attempt(s); aborting",
                    self.peer
                );
                return Err(TransportError::RetriesExhausted { attempts }.into());
            }
            self.retries_used += 1;
            self.deadline = None;
            log::warn!(
                "[udp] receive timed out, retransmitting ({}/{})",
                self.retries_used,
                self.max_retries
            );
            self.retransmit()?;
        }
    }

    /// Start a fresh retry budget and deadline.
    fn reset_attempt(&mut self) {
        self.retries_used = 0;
        self.deadline = None;
    }

    fn clear_inbound(&mut self) {
        self.read_buf = None;
        self.read_pos = 0;
    }
}

/// Read timeouts surface as `WouldBlock` on Unix and `TimedOut` on Windows.
fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

impl Transport for UdpTransport {
    fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn open(&mut self) -> Result<()> {
        if self.socket.is_some() {
            return Err(TransportError::AlreadyOpen.into());
        }
        let local = self.local.unwrap_or_else(|| match self.peer {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        });
        let socket = UdpSocket::bind(local)?;
        socket.set_read_timeout(self.timeout)?;
        log::debug!("[udp] bound {} for peer {}", socket.local_addr()?, self.peer);
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        self.socket = None;
        self.write_buf.clear();
        self.clear_inbound();
        self.reset_attempt();
    }

    /// Serve bytes from the current datagram, receiving one first if none
    /// is buffered.  Asking for more than the datagram still holds is a
    /// framing fault.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.read_buf.is_none() {
            self.receive_datagram()?;
        }
        let Some(data) = self.read_buf.as_deref() else {
            return Err(TransportError::EndOfFile.into());
        };

        let available = data.len() - self.read_pos;
        if buf.len() > available {
            return Err(ProtocolError::Truncated {
                requested: buf.len(),
                available,
            }
            .into());
        }
        buf.copy_from_slice(&data[self.read_pos..self.read_pos + buf.len()]);
        self.read_pos += buf.len();
        Ok(buf.len())
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.write_buf.extend_from_slice(buf);
        Ok(())
    }

    /// Send the outbound buffer as one datagram (or lose it, per the
    /// simulator).  Either way it becomes the retransmit candidate and the
    /// buffers are reset for the next exchange.
    fn flush(&mut self) -> Result<()> {
        if self.socket.is_none() {
            return Err(TransportError::NotOpen.into());
        }
        let buf = std::mem::take(&mut self.write_buf);
        let result = self.transmit(&buf);
        self.last_sent = Some(buf);
        self.clear_inbound();
        self.reset_attempt();
        result
    }

    /// Entering listen mode drops any stale inbound or outbound bytes so a
    /// multi-reply conversation starts clean.
    fn set_listen(&mut self, listen: bool) -> Result<()> {
        if listen {
            self.clear_inbound();
            self.write_buf.clear();
            self.reset_attempt();
        }
        self.listen = listen;
        if let Some(socket) = &self.socket {
            socket.set_read_timeout(if listen { None } else { self.timeout })?;
        }
        Ok(())
    }

    fn discard_inbound(&mut self) {
        self.clear_inbound();
    }
}

// ---------------------------------------------------------------------------
// MemoryTransport
// ---------------------------------------------------------------------------

/// In-memory transport: writes append to a buffer, reads consume it from a
/// cursor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryTransport {
    buf: Vec<u8>,
    pos: usize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, including bytes already read.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Bytes not yet consumed by reads.
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl From<Vec<u8>> for MemoryTransport {
    fn from(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }
}

impl Transport for MemoryTransport {
    fn is_open(&self) -> bool {
        true
    }

    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) {}

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let src = self.remaining();
        let n = src.len().min(buf.len());
        buf[..n].copy_from_slice(&src[..n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn discard_inbound(&mut self) {
        self.pos = self.buf.len();
    }
}
