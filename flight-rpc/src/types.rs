//! Wire constants: field type tags, message kinds and the small header
//! records produced while decoding.

use std::fmt;

use crate::error::ProtocolError;

/// Type tag preceding every field, list and value on the wire.
///
/// `Stop` is a sentinel that terminates a struct's field sequence and is
/// never followed by a field id.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TType {
    Stop = 0,
    Void = 1,
    Bool = 2,
    Byte = 3,
    Float = 4,
    I16 = 5,
    I32 = 6,
    String = 7,
    Struct = 8,
    List = 9,
}

impl TType {
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => TType::Stop,
            1 => TType::Void,
            2 => TType::Bool,
            3 => TType::Byte,
            4 => TType::Float,
            5 => TType::I16,
            6 => TType::I32,
            7 => TType::String,
            8 => TType::Struct,
            9 => TType::List,
            other => return Err(ProtocolError::UnknownType(other)),
        })
    }
}

impl fmt::Display for TType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TType::Stop => "STOP",
            TType::Void => "VOID",
            TType::Bool => "BOOL",
            TType::Byte => "BYTE",
            TType::Float => "FLOAT",
            TType::I16 => "I16",
            TType::I32 => "I32",
            TType::String => "STRING",
            TType::Struct => "STRUCT",
            TType::List => "LIST",
        };
        f.write_str(name)
    }
}

/// Kind byte carried in every message header.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Call = 1,
    Reply = 2,
    Exception = 3,
}

impl MessageType {
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageType::Call),
            2 => Ok(MessageType::Reply),
            3 => Ok(MessageType::Exception),
            other => Err(ProtocolError::InvalidMessageType(other)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Call => f.write_str("CALL"),
            MessageType::Reply => f.write_str("REPLY"),
            MessageType::Exception => f.write_str("EXCEPTION"),
        }
    }
}

/// Decoded message header: `{name, kind, seq_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Operation name, e.g. `"getFlight"`.
    pub name: String,
    pub kind: MessageType,
    /// Sender-assigned call id.
    pub seq_id: i32,
}

/// Decoded field header.  A `Stop` header always has `id == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub ttype: TType,
    pub id: i16,
}

impl FieldHeader {
    pub fn is_stop(&self) -> bool {
        self.ttype == TType::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttype_tags_match_wire_values() {
        for tag in 0u8..=9 {
            let t = TType::try_from(tag).unwrap();
            assert_eq!(t.to_u8(), tag);
        }
        assert_eq!(TType::String.to_u8(), 7);
        assert_eq!(TType::List.to_u8(), 9);
    }

    #[test]
    fn unknown_ttype_is_protocol_fault() {
        assert_eq!(TType::try_from(10), Err(ProtocolError::UnknownType(10)));
        assert_eq!(TType::try_from(0xFF), Err(ProtocolError::UnknownType(0xFF)));
    }

    #[test]
    fn message_type_round_trip() {
        assert_eq!(MessageType::try_from(1), Ok(MessageType::Call));
        assert_eq!(MessageType::try_from(2), Ok(MessageType::Reply));
        assert_eq!(MessageType::try_from(3), Ok(MessageType::Exception));
        assert_eq!(
            MessageType::try_from(0),
            Err(ProtocolError::InvalidMessageType(0))
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(TType::Struct.to_string(), "STRUCT");
        assert_eq!(MessageType::Exception.to_string(), "EXCEPTION");
    }
}
