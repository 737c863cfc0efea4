//! Application exception carried by EXCEPTION messages.

use std::fmt;

use crate::error::Result;
use crate::protocol::{BinaryProtocol, WireDecode, WireEncode};
use crate::transport::Transport;
use crate::types::TType;

/// Server-reported failure: `{1: string message}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationException {
    pub message: String,
}

impl ApplicationException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ApplicationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApplicationException {}

impl WireEncode for ApplicationException {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        if !self.message.is_empty() {
            oprot.write_field_begin(TType::String, 1)?;
            oprot.write_string(&self.message)?;
        }
        oprot.write_field_stop()
    }
}

impl WireDecode for ApplicationException {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        let mut out = Self::default();
        iprot.read_struct(|p, f| {
            if (f.id, f.ttype) != (1, TType::String) {
                return Ok(false);
            }
            out.message = p.read_string()?;
            Ok(true)
        })?;
        Ok(out)
    }
}
