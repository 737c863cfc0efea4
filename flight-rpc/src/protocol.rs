//! Binary wire codec.
//!
//! Pure encode/decode of primitives and self-describing struct framing.  No
//! socket logic lives here: bytes go to and come from whatever
//! [`Transport`] the protocol wraps.
//!
//! # Wire format
//!
//! All multi-byte integers and floats are **big-endian**.
//!
//! ```text
//!  bool    1 byte, 0 or 1
//!  byte    1 signed byte
//!  i16     2 bytes signed
//!  i32     4 bytes signed
//!  float   4 bytes IEEE-754 single precision
//!  binary  i32 length, then that many bytes
//!  string  binary of the UTF-8 bytes
//!  list    1 byte element tag, i32 count, elements back to back
//!  struct  { 1 byte tag, i16 field id, value }*  then a lone STOP byte (0)
//!  message string name, 1 byte kind, i32 call id, then one struct
//! ```
//!
//! Structs are self-terminating: a decoder never knows the field count in
//! advance and loops on tags until STOP.  Fields it does not recognise must
//! still be consumed, which is what [`BinaryProtocol::skip`] is for.

use crate::error::{ProtocolError, Result};
use crate::transport::{Transport, MAX_DATAGRAM};
use crate::types::{FieldHeader, MessageHeader, MessageType, TType};

/// Maximum struct/list nesting followed by [`BinaryProtocol::skip`].
pub const MAX_SKIP_DEPTH: usize = 64;

/// A value that serialises itself as a struct.
pub trait WireEncode {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()>;
}

/// A value that deserialises itself from a struct.
pub trait WireDecode: Sized {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self>;
}

/// Binary protocol over a transport.
#[derive(Debug)]
pub struct BinaryProtocol<T> {
    trans: T,
}

impl<T: Transport> BinaryProtocol<T> {
    pub fn new(trans: T) -> Self {
        Self { trans }
    }

    pub fn transport(&self) -> &T {
        &self.trans
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.trans
    }

    pub fn into_inner(self) -> T {
        self.trans
    }

    /// Hand the assembled message to the transport.
    pub fn flush(&mut self) -> Result<()> {
        self.trans.flush()
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    pub fn write_message_begin(&mut self, name: &str, kind: MessageType, seq_id: i32) -> Result<()> {
        self.write_string(name)?;
        self.write_u8(kind.to_u8())?;
        self.write_i32(seq_id)
    }

    pub fn write_field_begin(&mut self, ttype: TType, id: i16) -> Result<()> {
        self.write_u8(ttype.to_u8())?;
        self.write_i16(id)
    }

    pub fn write_field_stop(&mut self) -> Result<()> {
        self.write_u8(TType::Stop.to_u8())
    }

    pub fn write_list_begin(&mut self, elem: TType, size: usize) -> Result<()> {
        self.write_u8(elem.to_u8())?;
        self.write_i32(to_i32_len(size)?)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    pub fn write_byte(&mut self, value: i8) -> Result<()> {
        self.trans.write(&value.to_be_bytes())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.trans.write(&value.to_be_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.trans.write(&value.to_be_bytes())
    }

    pub fn write_float(&mut self, value: f32) -> Result<()> {
        self.trans.write(&value.to_be_bytes())
    }

    pub fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        self.write_i32(to_i32_len(value.len())?)?;
        self.trans.write(value)
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_binary(value.as_bytes())
    }

    /// Write a complete `list<string>`.
    pub fn write_string_list(&mut self, values: &[String]) -> Result<()> {
        self.write_list_begin(TType::String, values.len())?;
        for v in values {
            self.write_string(v)?;
        }
        Ok(())
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.trans.write(&[value])
    }

    // -----------------------------------------------------------------------
    // Decoding
    // -----------------------------------------------------------------------

    pub fn read_message_begin(&mut self) -> Result<MessageHeader> {
        let name = self.read_string()?;
        let kind = MessageType::try_from(self.read_u8()?)?;
        let seq_id = self.read_i32()?;
        Ok(MessageHeader { name, kind, seq_id })
    }

    /// Read the next field header.  STOP carries no field id.
    pub fn read_field_begin(&mut self) -> Result<FieldHeader> {
        let ttype = TType::try_from(self.read_u8()?)?;
        if ttype == TType::Stop {
            return Ok(FieldHeader { ttype, id: 0 });
        }
        let id = self.read_i16()?;
        Ok(FieldHeader { ttype, id })
    }

    /// Decode a struct body up to and including its STOP byte.
    ///
    /// `on_field` sees every field header and returns `false` for the ones
    /// it does not recognise; those are skipped so the stream stays aligned.
    pub fn read_struct(
        &mut self,
        mut on_field: impl FnMut(&mut Self, FieldHeader) -> Result<bool>,
    ) -> Result<()> {
        loop {
            let field = self.read_field_begin()?;
            if field.is_stop() {
                return Ok(());
            }
            if !on_field(self, field)? {
                self.skip(field.ttype)?;
            }
        }
    }

    pub fn read_list_begin(&mut self) -> Result<(TType, usize)> {
        let elem = TType::try_from(self.read_u8()?)?;
        let size = self.read_size()?;
        Ok((elem, size))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_byte(&mut self) -> Result<i8> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_float(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    pub fn read_binary(&mut self) -> Result<Vec<u8>> {
        let len = self.read_size()?;
        let mut buf = vec![0u8; len];
        self.trans.read_all(&mut buf)?;
        Ok(buf)
    }

    pub fn read_string(&mut self) -> Result<String> {
        String::from_utf8(self.read_binary()?).map_err(|_| ProtocolError::InvalidUtf8.into())
    }

    /// Read a `list<elem>` with `read_elem`.  A list declaring a different
    /// element type is consumed and yields no elements.
    pub fn read_list_of<V>(
        &mut self,
        elem: TType,
        mut read_elem: impl FnMut(&mut Self) -> Result<V>,
    ) -> Result<Vec<V>> {
        let (actual, size) = self.read_list_begin()?;
        if actual != elem {
            for _ in 0..size {
                self.skip(actual)?;
            }
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(size.min(1024));
        for _ in 0..size {
            out.push(read_elem(self)?);
        }
        Ok(out)
    }

    pub fn read_string_list(&mut self) -> Result<Vec<String>> {
        self.read_list_of(TType::String, |p| p.read_string())
    }

    /// Consume one value of type `ttype` without interpreting it.
    pub fn skip(&mut self, ttype: TType) -> Result<()> {
        self.skip_depth(ttype, 0)
    }

    fn skip_depth(&mut self, ttype: TType, depth: usize) -> Result<()> {
        if depth >= MAX_SKIP_DEPTH {
            return Err(ProtocolError::DepthLimit.into());
        }
        match ttype {
            // STOP is a struct terminator, never a value.
            TType::Stop => return Err(ProtocolError::UnknownType(TType::Stop.to_u8()).into()),
            TType::Void => {}
            TType::Bool | TType::Byte => {
                self.read_u8()?;
            }
            TType::I16 => {
                self.read_i16()?;
            }
            TType::I32 | TType::Float => {
                self.read_i32()?;
            }
            TType::String => {
                self.read_binary()?;
            }
            TType::Struct => loop {
                let field = self.read_field_begin()?;
                if field.is_stop() {
                    break;
                }
                self.skip_depth(field.ttype, depth + 1)?;
            },
            TType::List => {
                let (elem, size) = self.read_list_begin()?;
                for _ in 0..size {
                    self.skip_depth(elem, depth + 1)?;
                }
            }
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.trans.read_all(&mut buf)?;
        Ok(buf)
    }

    /// Length or count prefix: non-negative and no larger than a datagram.
    fn read_size(&mut self) -> Result<usize> {
        let size = self.read_i32()?;
        if size < 0 {
            return Err(ProtocolError::NegativeSize(size).into());
        }
        let size = size as usize;
        if size > MAX_DATAGRAM {
            return Err(ProtocolError::SizeLimit(size).into());
        }
        Ok(size)
    }
}

fn to_i32_len(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| ProtocolError::SizeLimit(len).into())
}
