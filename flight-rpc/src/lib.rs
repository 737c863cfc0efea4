//! `flight-rpc` — request/reply RPC client over UDP.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────────────────────────────┐
//!  │  FlightClient  (call ids, CALL/REPLY │
//!  │  /EXCEPTION, decoupled monitor)      │
//!  └────┬─────────────────────────▲───────┘
//!       │ args structs            │ result structs
//!  ┌────▼─────────────────────────┴───────┐
//!  │  BinaryProtocol  (big-endian codec,  │
//!  │  self-terminating structs, skip)     │
//!  └────┬─────────────────────────▲───────┘
//!       │ write / flush           │ read
//!  ┌────▼─────────────────────────┴───────┐
//!  │  UdpTransport  (one message = one    │
//!  │  datagram, timeout + retransmit,     │
//!  │  peer filtering, synthetic loss)     │
//!  └──────────────────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`types`]      — type tags, message kinds, header records
//! - [`error`]      — application / transport / protocol fault kinds
//! - [`protocol`]   — wire codec and the struct encode/decode traits
//! - [`exception`]  — the application exception struct
//! - [`transport`]  — UDP and in-memory transports
//! - [`simulator`]  — synthetic packet loss for testing
//! - [`flight`]     — per-operation argument and result structs
//! - [`client`]     — call driver
//! - [`config`]     — environment-driven client configuration
//! - [`shell`]      — interactive command shell

pub mod client;
pub mod config;
pub mod error;
pub mod exception;
pub mod flight;
pub mod protocol;
pub mod shell;
pub mod simulator;
pub mod transport;
pub mod types;

pub use client::FlightClient;
pub use error::{Error, ProtocolError, Result, TransportError};
pub use exception::ApplicationException;
pub use protocol::{BinaryProtocol, WireDecode, WireEncode};
pub use transport::{MemoryTransport, Transport, UdpTransport};
