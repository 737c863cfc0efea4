//! Shared helpers for the loopback integration tests.
//!
//! [`FakeServer`] is a plain `std::net::UdpSocket` on an ephemeral loopback
//! port that decodes calls with the crate's own codec and answers with
//! whatever the test scripts.  Every blocking receive has a timeout so a
//! broken test fails instead of hanging.

#![allow(dead_code)]

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use flight_rpc::protocol::{BinaryProtocol, WireDecode, WireEncode};
use flight_rpc::transport::{MemoryTransport, Transport, UdpTransport};
use flight_rpc::types::{MessageHeader, MessageType};

/// Upper bound on any single wait inside a test.
pub const TEST_WAIT: Duration = Duration::from_secs(5);

pub fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

/// Open a client transport on loopback talking to `peer`.
pub fn client_transport(peer: SocketAddr, timeout: Duration, retries: u32) -> UdpTransport {
    let mut t = UdpTransport::new(peer);
    t.set_local_addr(loopback());
    t.set_timeout(Some(timeout));
    t.set_max_retries(retries);
    t.open().expect("open client transport");
    t
}

/// One decoded request.
pub struct Call {
    pub header: MessageHeader,
    pub from: SocketAddr,
    pub raw: Vec<u8>,
    body: BinaryProtocol<MemoryTransport>,
}

impl Call {
    pub fn args<A: WireDecode>(&mut self) -> A {
        A::decode(&mut self.body).expect("decode call arguments")
    }
}

pub struct FakeServer {
    socket: UdpSocket,
}

impl FakeServer {
    pub fn bind() -> Self {
        let socket = UdpSocket::bind(loopback()).expect("bind fake server");
        socket.set_read_timeout(Some(TEST_WAIT)).unwrap();
        Self { socket }
    }

    pub fn addr(&self) -> SocketAddr {
        self.socket.local_addr().unwrap()
    }

    /// Receive one datagram as raw bytes.
    pub fn recv_raw(&self) -> (Vec<u8>, SocketAddr) {
        let mut buf = vec![0u8; 65_535];
        let (n, from) = self.socket.recv_from(&mut buf).expect("fake server recv");
        buf.truncate(n);
        (buf, from)
    }

    /// Receive one datagram and decode its message header.
    pub fn recv_call(&self) -> Call {
        let (buf, from) = self.recv_raw();
        let mut body = BinaryProtocol::new(MemoryTransport::from(buf.clone()));
        let header = body.read_message_begin().expect("decode call header");
        assert_eq!(header.kind, MessageType::Call);
        Call {
            header,
            from,
            raw: buf,
            body,
        }
    }

    /// Send one message to `to`.
    pub fn send<V: WireEncode>(
        &self,
        to: SocketAddr,
        name: &str,
        kind: MessageType,
        seq_id: i32,
        body: &V,
    ) {
        let mut p = BinaryProtocol::new(MemoryTransport::new());
        p.write_message_begin(name, kind, seq_id).unwrap();
        body.encode(&mut p).unwrap();
        p.flush().unwrap();
        self.socket
            .send_to(p.transport().bytes(), to)
            .expect("fake server send");
    }

    /// Answer `call` with a message of `kind`.
    pub fn reply<V: WireEncode>(&self, call: &Call, kind: MessageType, body: &V) {
        self.send(call.from, &call.header.name, kind, call.header.seq_id, body);
    }

    /// Count datagrams arriving within `wait`.
    pub fn count_arrivals(&self, wait: Duration) -> usize {
        self.socket.set_read_timeout(Some(wait)).unwrap();
        let mut buf = vec![0u8; 65_535];
        let mut n = 0;
        while self.socket.recv_from(&mut buf).is_ok() {
            n += 1;
        }
        self.socket.set_read_timeout(Some(TEST_WAIT)).unwrap();
        n
    }

    pub fn send_raw(&self, to: SocketAddr, bytes: &[u8]) {
        self.socket.send_to(bytes, to).expect("fake server send");
    }
}
