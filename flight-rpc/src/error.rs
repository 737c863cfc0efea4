//! Fault taxonomy for RPC calls.
//!
//! Every failure a call can produce falls into one of three kinds, and the
//! kind decides what the caller should do about it:
//!
//! | Kind            | Variant              | Meaning                                   |
//! |-----------------|----------------------|-------------------------------------------|
//! | Application     | [`Error::Application`] | The server answered with an EXCEPTION.  |
//! | Transport       | [`Error::Transport`]   | The network failed (timeouts, I/O).     |
//! | Protocol        | [`Error::Protocol`]    | Bytes did not frame as expected.        |
//!
//! Application faults are routine and recoverable; the other two abort the
//! in-flight call.  Synthetic packet loss is never an error by itself: it is
//! absorbed by the retry loop and only surfaces as
//! [`TransportError::RetriesExhausted`].

use thiserror::Error;

use crate::exception::ApplicationException;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error returned by every fallible operation in this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The server replied with an EXCEPTION message.
    #[error("application error: {0}")]
    Application(ApplicationException),
    /// The datagram layer failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// The byte stream did not match the wire format.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn is_application(&self) -> bool {
        matches!(self, Error::Application(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }
}

impl From<ApplicationException> for Error {
    fn from(e: ApplicationException) -> Self {
        Error::Application(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(TransportError::Io(e))
    }
}

/// Failures of the unreliable datagram layer.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("socket not open")]
    NotOpen,
    #[error("socket already open")]
    AlreadyOpen,
    /// No reply from the peer after the initial send plus every retry.
    #[error("no reply from server after {attempts} attempt(s)")]
    RetriesExhausted { attempts: u32 },
    /// A read returned no bytes.
    #[error("end of stream")]
    EndOfFile,
    #[error("message of {size} bytes exceeds datagram limit of {max} bytes")]
    MessageTooLarge { size: usize, max: usize },
    #[error("retransmit requested before anything was sent")]
    NothingToRetransmit,
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Framing faults: the bytes on the wire do not describe a valid message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A value extends past the end of the received datagram.
    #[error("read of {requested} bytes with only {available} left in datagram")]
    Truncated { requested: usize, available: usize },
    #[error("unknown field type tag {0}")]
    UnknownType(u8),
    #[error("invalid message type {0}")]
    InvalidMessageType(u8),
    #[error("negative size {0}")]
    NegativeSize(i32),
    #[error("size {0} does not fit in a 32-bit length prefix")]
    SizeLimit(usize),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("struct nesting too deep")]
    DepthLimit,
    /// A REPLY arrived without its mandatory result field.
    #[error("{0} reply is missing its result")]
    MissingResult(&'static str),
    /// The peer sent a CALL where a REPLY or EXCEPTION was expected.
    #[error("unexpected CALL message {0:?} in reply position")]
    UnexpectedCall(String),
    /// Seat updates were requested before any `monitorSeats` call was sent.
    #[error("no monitorSeats call outstanding")]
    NoMonitorCall,
}

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("drop rate {0} is outside [0.0, 1.0]")]
    LossRate(f64),
    #[error("cannot resolve server address {0}")]
    Resolve(String),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_kind_predicates() {
        let app = Error::from(ApplicationException::new("flight not found"));
        assert!(app.is_application());
        assert!(!app.is_transport());

        let transport = Error::from(TransportError::RetriesExhausted { attempts: 3 });
        assert!(transport.is_transport());

        let proto = Error::from(ProtocolError::UnknownType(42));
        assert!(proto.is_protocol());
    }

    #[test]
    fn io_errors_are_transport_faults() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(Error::from(io).is_transport());
    }

    #[test]
    fn display_carries_server_message() {
        let e = Error::from(ApplicationException::new("not enough seats"));
        assert_eq!(e.to_string(), "application error: not enough seats");
    }
}
