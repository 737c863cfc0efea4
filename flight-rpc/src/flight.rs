//! Argument and result structs for the flight information service.
//!
//! Every operation takes one argument struct and answers with one result
//! struct (or an [`crate::exception::ApplicationException`]).  All types
//! implement both directions of the codec so the same definitions can drive
//! a stand-in server.
//!
//! | Operation           | Arguments                               | Result                     |
//! |---------------------|-----------------------------------------|----------------------------|
//! | `getFlight`         | 1:id                                    | {1: Flight}                |
//! | `reserve`           | 1:id 2:seats                            | {}                         |
//! | `monitorSeats`      | 1:id 2:durationMs                       | stream of {1: i32 seats}   |
//! | `newFlight`         | 1:id 2:from 3:to 4:time 5:seats 6:fare  | {}                         |
//! | `findFlights`       | 1:from 2:to                             | {1: list<string> ids}      |
//! | `findDestinations`  | 1:from                                  | {1: list<string>}          |

use crate::error::{ProtocolError, Result};
use crate::protocol::{BinaryProtocol, WireDecode, WireEncode};
use crate::transport::Transport;
use crate::types::TType;

pub const GET_FLIGHT: &str = "getFlight";
pub const RESERVE: &str = "reserve";
pub const MONITOR_SEATS: &str = "monitorSeats";
pub const NEW_FLIGHT: &str = "newFlight";
pub const FIND_FLIGHTS: &str = "findFlights";
pub const FIND_DESTINATIONS: &str = "findDestinations";

fn write_string_field<T: Transport>(oprot: &mut BinaryProtocol<T>, id: i16, value: &str) -> Result<()> {
    oprot.write_field_begin(TType::String, id)?;
    oprot.write_string(value)
}

fn write_i32_field<T: Transport>(oprot: &mut BinaryProtocol<T>, id: i16, value: i32) -> Result<()> {
    oprot.write_field_begin(TType::I32, id)?;
    oprot.write_i32(value)
}

// ---------------------------------------------------------------------------
// Flight
// ---------------------------------------------------------------------------

/// A flight record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flight {
    pub id: String,
    pub from: String,
    pub to: String,
    /// Departure time, free-form.
    pub time: String,
    pub available_seats: i32,
    pub fare: f32,
}

impl Flight {
    /// Fields 1..=6 without the terminating STOP, shared with
    /// [`NewFlightArgs`].
    fn encode_fields<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        write_string_field(oprot, 1, &self.id)?;
        write_string_field(oprot, 2, &self.from)?;
        write_string_field(oprot, 3, &self.to)?;
        write_string_field(oprot, 4, &self.time)?;
        write_i32_field(oprot, 5, self.available_seats)?;
        oprot.write_field_begin(TType::Float, 6)?;
        oprot.write_float(self.fare)
    }

    fn decode_fields<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        let mut out = Self::default();
        iprot.read_struct(|p, f| {
            match (f.id, f.ttype) {
                (1, TType::String) => out.id = p.read_string()?,
                (2, TType::String) => out.from = p.read_string()?,
                (3, TType::String) => out.to = p.read_string()?,
                (4, TType::String) => out.time = p.read_string()?,
                (5, TType::I32) => out.available_seats = p.read_i32()?,
                (6, TType::Float) => out.fare = p.read_float()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(out)
    }
}

impl WireEncode for Flight {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        self.encode_fields(oprot)?;
        oprot.write_field_stop()
    }
}

impl WireDecode for Flight {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        Self::decode_fields(iprot)
    }
}

// ---------------------------------------------------------------------------
// getFlight
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetFlightArgs {
    pub id: String,
}

impl WireEncode for GetFlightArgs {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        write_string_field(oprot, 1, &self.id)?;
        oprot.write_field_stop()
    }
}

impl WireDecode for GetFlightArgs {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        let mut out = Self::default();
        iprot.read_struct(|p, f| {
            if (f.id, f.ttype) != (1, TType::String) {
                return Ok(false);
            }
            out.id = p.read_string()?;
            Ok(true)
        })?;
        Ok(out)
    }
}

/// `{1: Flight}`; the flight is mandatory in a REPLY.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetFlightResult {
    pub flight: Option<Flight>,
}

impl GetFlightResult {
    pub fn into_flight(self) -> Result<Flight> {
        self.flight
            .ok_or_else(|| ProtocolError::MissingResult(GET_FLIGHT).into())
    }
}

impl WireEncode for GetFlightResult {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        if let Some(flight) = &self.flight {
            oprot.write_field_begin(TType::Struct, 1)?;
            flight.encode(oprot)?;
        }
        oprot.write_field_stop()
    }
}

impl WireDecode for GetFlightResult {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        let mut out = Self::default();
        iprot.read_struct(|p, f| {
            if (f.id, f.ttype) != (1, TType::Struct) {
                return Ok(false);
            }
            out.flight = Some(Flight::decode(p)?);
            Ok(true)
        })?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// reserve / newFlight acknowledgements
// ---------------------------------------------------------------------------

/// The empty result struct: a lone STOP byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ack;

impl WireEncode for Ack {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        oprot.write_field_stop()
    }
}

impl WireDecode for Ack {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        iprot.read_struct(|_, _| Ok(false))?;
        Ok(Ack)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReserveArgs {
    pub id: String,
    pub seats: i32,
}

impl WireEncode for ReserveArgs {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        write_string_field(oprot, 1, &self.id)?;
        write_i32_field(oprot, 2, self.seats)?;
        oprot.write_field_stop()
    }
}

impl WireDecode for ReserveArgs {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        let mut out = Self::default();
        iprot.read_struct(|p, f| {
            match (f.id, f.ttype) {
                (1, TType::String) => out.id = p.read_string()?,
                (2, TType::I32) => out.seats = p.read_i32()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(out)
    }
}

/// `newFlight` arguments: the six flight fields written flat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFlightArgs {
    pub flight: Flight,
}

impl WireEncode for NewFlightArgs {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        self.flight.encode(oprot)
    }
}

impl WireDecode for NewFlightArgs {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        Ok(Self {
            flight: Flight::decode(iprot)?,
        })
    }
}

// ---------------------------------------------------------------------------
// monitorSeats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSeatsArgs {
    pub id: String,
    pub duration_ms: i32,
}

impl WireEncode for MonitorSeatsArgs {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        write_string_field(oprot, 1, &self.id)?;
        write_i32_field(oprot, 2, self.duration_ms)?;
        oprot.write_field_stop()
    }
}

impl WireDecode for MonitorSeatsArgs {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        let mut out = Self::default();
        iprot.read_struct(|p, f| {
            match (f.id, f.ttype) {
                (1, TType::String) => out.id = p.read_string()?,
                (2, TType::I32) => out.duration_ms = p.read_i32()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(out)
    }
}

/// One pushed seat count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSeatsResult {
    pub seats: Option<i32>,
}

impl MonitorSeatsResult {
    pub fn into_seats(self) -> Result<i32> {
        self.seats
            .ok_or_else(|| ProtocolError::MissingResult(MONITOR_SEATS).into())
    }
}

impl WireEncode for MonitorSeatsResult {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        if let Some(seats) = self.seats {
            write_i32_field(oprot, 1, seats)?;
        }
        oprot.write_field_stop()
    }
}

impl WireDecode for MonitorSeatsResult {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        let mut out = Self::default();
        iprot.read_struct(|p, f| {
            if (f.id, f.ttype) != (1, TType::I32) {
                return Ok(false);
            }
            out.seats = Some(p.read_i32()?);
            Ok(true)
        })?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// findFlights / findDestinations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindFlightsArgs {
    pub from: String,
    pub to: String,
}

impl WireEncode for FindFlightsArgs {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        write_string_field(oprot, 1, &self.from)?;
        write_string_field(oprot, 2, &self.to)?;
        oprot.write_field_stop()
    }
}

impl WireDecode for FindFlightsArgs {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        let mut out = Self::default();
        iprot.read_struct(|p, f| {
            match (f.id, f.ttype) {
                (1, TType::String) => out.from = p.read_string()?,
                (2, TType::String) => out.to = p.read_string()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(out)
    }
}

/// `{1: list<string>}` shared by `findFlights` (flight ids) and
/// `findDestinations` (airport names).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringListResult {
    pub values: Vec<String>,
}

impl WireEncode for StringListResult {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        oprot.write_field_begin(TType::List, 1)?;
        oprot.write_string_list(&self.values)?;
        oprot.write_field_stop()
    }
}

impl WireDecode for StringListResult {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        let mut out = Self::default();
        iprot.read_struct(|p, f| {
            if (f.id, f.ttype) != (1, TType::List) {
                return Ok(false);
            }
            out.values = p.read_string_list()?;
            Ok(true)
        })?;
        Ok(out)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindDestinationsArgs {
    pub from: String,
}

impl WireEncode for FindDestinationsArgs {
    fn encode<T: Transport>(&self, oprot: &mut BinaryProtocol<T>) -> Result<()> {
        write_string_field(oprot, 1, &self.from)?;
        oprot.write_field_stop()
    }
}

impl WireDecode for FindDestinationsArgs {
    fn decode<T: Transport>(iprot: &mut BinaryProtocol<T>) -> Result<Self> {
        let mut out = Self::default();
        iprot.read_struct(|p, f| {
            if (f.id, f.ttype) != (1, TType::String) {
                return Ok(false);
            }
            out.from = p.read_string()?;
            Ok(true)
        })?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transport::MemoryTransport;

    fn sample() -> Flight {
        Flight {
            id: "SQ321".into(),
            from: "Singapore".into(),
            to: "London".into(),
            time: "2026-10-19 23:55".into(),
            available_seats: 42,
            fare: 1234.5,
        }
    }

    fn encode<V: WireEncode>(value: &V) -> BinaryProtocol<MemoryTransport> {
        let mut p = BinaryProtocol::new(MemoryTransport::new());
        value.encode(&mut p).unwrap();
        p
    }

    #[test]
    fn flight_wire_layout() {
        let p = encode(&sample());
        let bytes = p.transport().bytes();
        // STRING id 1, length 5, "SQ321"
        assert_eq!(&bytes[..12], &[7, 0, 1, 0, 0, 0, 5, b'S', b'Q', b'3', b'2', b'1']);
        // ... I32 id 5 = 42, FLOAT id 6 = 1234.5, STOP
        let tail = &bytes[bytes.len() - 15..];
        assert_eq!(&tail[..7], &[6, 0, 5, 0, 0, 0, 42]);
        assert_eq!(&tail[7..10], &[4, 0, 6]);
        assert_eq!(&tail[10..14], &1234.5f32.to_be_bytes());
        assert_eq!(tail[14], 0);
    }

    #[test]
    fn get_flight_result_nests_flight() {
        let mut p = encode(&GetFlightResult {
            flight: Some(sample()),
        });
        assert_eq!(&p.transport().bytes()[..3], &[8, 0, 1]);
        let decoded = GetFlightResult::decode(&mut p).unwrap();
        assert_eq!(decoded.into_flight().unwrap(), sample());
    }

    #[test]
    fn get_flight_result_without_flight_is_missing_result() {
        let mut p = encode(&GetFlightResult::default());
        let err = GetFlightResult::decode(&mut p)
            .unwrap()
            .into_flight()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::MissingResult("getFlight"))
        ));
    }

    #[test]
    fn new_flight_args_are_flat_flight_fields() {
        let args = NewFlightArgs { flight: sample() };
        let mut p = encode(&args);
        assert_eq!(p.transport().bytes(), encode(&sample()).transport().bytes());
        assert_eq!(NewFlightArgs::decode(&mut p).unwrap(), args);
    }

    #[test]
    fn ack_is_single_stop_and_tolerates_fields() {
        assert_eq!(encode(&Ack).transport().bytes(), &[0]);

        let mut p = BinaryProtocol::new(MemoryTransport::new());
        p.write_field_begin(TType::I32, 3).unwrap();
        p.write_i32(1).unwrap();
        p.write_field_stop().unwrap();
        assert_eq!(Ack::decode(&mut p).unwrap(), Ack);
        assert!(p.transport().remaining().is_empty());
    }

    #[test]
    fn reserve_args_layout() {
        let p = encode(&ReserveArgs {
            id: "A1".into(),
            seats: 3,
        });
        assert_eq!(
            p.transport().bytes(),
            &[7, 0, 1, 0, 0, 0, 2, b'A', b'1', 6, 0, 2, 0, 0, 0, 3, 0]
        );
    }

    #[test]
    fn args_round_trip_through_server_side_decode() {
        let mut p = encode(&MonitorSeatsArgs {
            id: "MH1".into(),
            duration_ms: 5_000,
        });
        assert_eq!(
            MonitorSeatsArgs::decode(&mut p).unwrap(),
            MonitorSeatsArgs {
                id: "MH1".into(),
                duration_ms: 5_000
            }
        );

        let mut p = encode(&FindDestinationsArgs {
            from: "Singapore".into(),
        });
        assert_eq!(FindDestinationsArgs::decode(&mut p).unwrap().from, "Singapore");
    }

    #[test]
    fn string_list_result_round_trip() {
        let result = StringListResult {
            values: vec!["SQ1".into(), "SQ2".into()],
        };
        let mut p = encode(&result);
        assert_eq!(StringListResult::decode(&mut p).unwrap(), result);
    }

    #[test]
    fn monitor_push_requires_seats() {
        let mut p = encode(&MonitorSeatsResult { seats: Some(7) });
        assert_eq!(MonitorSeatsResult::decode(&mut p).unwrap().into_seats().unwrap(), 7);

        let mut p = encode(&MonitorSeatsResult::default());
        assert!(MonitorSeatsResult::decode(&mut p)
            .unwrap()
            .into_seats()
            .unwrap_err()
            .is_protocol());
    }
}
