//! Call driver: request/reply and decoupled push-reply calls.
//!
//! A standard call is one unit:
//!
//! ```text
//!   send:  header(op, CALL, id) + args struct ──flush──▶ one datagram
//!   recv:  header ─┬─ EXCEPTION → ApplicationException → Err(Application)
//!                  ├─ REPLY     → result struct       → Ok(result)
//!                  └─ CALL      → Err(Protocol)
//! ```
//!
//! Only one call may be outstanding per client.  Reply ids are checked
//! against the outstanding call: a mismatching reply is a late duplicate
//! (typically the answer to a retransmitted request) and is discarded while
//! the receive keeps waiting.  Reply operation names are not checked.
//!
//! `monitorSeats` is decoupled: [`FlightClient::send_monitor_seats`] issues
//! the call once and [`FlightClient::recv_monitor_seats`] may then be called
//! any number of times, each call blocking in listen mode for one push.  The
//! stream has no terminator; the caller decides when to stop.

use crate::error::{Error, ProtocolError, Result};
use crate::exception::ApplicationException;
use crate::flight::{
    Ack, FindDestinationsArgs, FindFlightsArgs, Flight, GetFlightArgs, GetFlightResult,
    MonitorSeatsArgs, MonitorSeatsResult, NewFlightArgs, ReserveArgs, StringListResult,
    FIND_DESTINATIONS, FIND_FLIGHTS, GET_FLIGHT, MONITOR_SEATS, NEW_FLIGHT, RESERVE,
};
use crate::protocol::{BinaryProtocol, WireDecode, WireEncode};
use crate::transport::Transport;
use crate::types::MessageType;

/// Client for the flight information service.
#[derive(Debug)]
pub struct FlightClient<T> {
    proto: BinaryProtocol<T>,
    /// Next call id to hand out.
    next_seq_id: i32,
    /// Id of the most recent `monitorSeats` call, if any.
    monitor_seq_id: Option<i32>,
}

impl<T: Transport> FlightClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            proto: BinaryProtocol::new(transport),
            next_seq_id: 0,
            monitor_seq_id: None,
        }
    }

    pub fn transport(&self) -> &T {
        self.proto.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.proto.transport_mut()
    }

    pub fn into_transport(self) -> T {
        self.proto.into_inner()
    }

    /// The id the next call will carry.
    pub fn next_seq_id(&self) -> i32 {
        self.next_seq_id
    }

    fn alloc_seq_id(&mut self) -> i32 {
        let id = self.next_seq_id;
        self.next_seq_id = self.next_seq_id.wrapping_add(1);
        id
    }

    // -----------------------------------------------------------------------
    // Generic halves
    // -----------------------------------------------------------------------

    /// Write and flush one CALL message, returning its id.
    pub fn send_call<A: WireEncode>(&mut self, name: &str, args: &A) -> Result<i32> {
        let seq_id = self.alloc_seq_id();
        self.proto.write_message_begin(name, MessageType::Call, seq_id)?;
        args.encode(&mut self.proto)?;
        self.proto.flush()?;
        log::debug!("[rpc] → {name} id={seq_id}");
        Ok(seq_id)
    }

    /// Read the reply to call `seq_id`.
    pub fn recv_reply<R: WireDecode>(&mut self, name: &str, seq_id: i32) -> Result<R> {
        loop {
            let header = self.proto.read_message_begin()?;
            if header.seq_id != seq_id {
                log::warn!(
                    "[rpc] discarding stale {} id={} while waiting for {name} id={seq_id}",
                    header.kind,
                    header.seq_id
                );
                self.proto.transport_mut().discard_inbound();
                continue;
            }

            match header.kind {
                MessageType::Exception => {
                    let e = ApplicationException::decode(&mut self.proto)?;
                    log::debug!("[rpc] ← {name} id={seq_id} EXCEPTION {e}");
                    return Err(Error::Application(e));
                }
                MessageType::Reply => {
                    let result = R::decode(&mut self.proto)?;
                    log::debug!("[rpc] ← {name} id={seq_id} REPLY");
                    return Ok(result);
                }
                MessageType::Call => {
                    return Err(ProtocolError::UnexpectedCall(header.name).into());
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // getFlight
    // -----------------------------------------------------------------------

    pub fn get_flight(&mut self, id: &str) -> Result<Flight> {
        let seq_id = self.send_get_flight(id)?;
        self.recv_get_flight(seq_id)
    }

    pub fn send_get_flight(&mut self, id: &str) -> Result<i32> {
        self.send_call(GET_FLIGHT, &GetFlightArgs { id: id.to_owned() })
    }

    pub fn recv_get_flight(&mut self, seq_id: i32) -> Result<Flight> {
        self.recv_reply::<GetFlightResult>(GET_FLIGHT, seq_id)?
            .into_flight()
    }

    // -----------------------------------------------------------------------
    // reserve
    // -----------------------------------------------------------------------

    pub fn reserve(&mut self, id: &str, seats: i32) -> Result<()> {
        let seq_id = self.send_reserve(id, seats)?;
        self.recv_reserve(seq_id)
    }

    pub fn send_reserve(&mut self, id: &str, seats: i32) -> Result<i32> {
        let args = ReserveArgs {
            id: id.to_owned(),
            seats,
        };
        self.send_call(RESERVE, &args)
    }

    pub fn recv_reserve(&mut self, seq_id: i32) -> Result<()> {
        self.recv_reply::<Ack>(RESERVE, seq_id).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // newFlight
    // -----------------------------------------------------------------------

    pub fn new_flight(&mut self, flight: &Flight) -> Result<()> {
        let seq_id = self.send_new_flight(flight)?;
        self.recv_new_flight(seq_id)
    }

    pub fn send_new_flight(&mut self, flight: &Flight) -> Result<i32> {
        let args = NewFlightArgs {
            flight: flight.clone(),
        };
        self.send_call(NEW_FLIGHT, &args)
    }

    pub fn recv_new_flight(&mut self, seq_id: i32) -> Result<()> {
        self.recv_reply::<Ack>(NEW_FLIGHT, seq_id).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // findFlights / findDestinations
    // -----------------------------------------------------------------------

    /// Ids of all flights from `from` to `to`.
    pub fn find_flights(&mut self, from: &str, to: &str) -> Result<Vec<String>> {
        let seq_id = self.send_find_flights(from, to)?;
        self.recv_find_flights(seq_id)
    }

    pub fn send_find_flights(&mut self, from: &str, to: &str) -> Result<i32> {
        let args = FindFlightsArgs {
            from: from.to_owned(),
            to: to.to_owned(),
        };
        self.send_call(FIND_FLIGHTS, &args)
    }

    pub fn recv_find_flights(&mut self, seq_id: i32) -> Result<Vec<String>> {
        Ok(self.recv_reply::<StringListResult>(FIND_FLIGHTS, seq_id)?.values)
    }

    /// Every destination reachable from `from`.
    pub fn find_destinations(&mut self, from: &str) -> Result<Vec<String>> {
        let seq_id = self.send_find_destinations(from)?;
        self.recv_find_destinations(seq_id)
    }

    pub fn send_find_destinations(&mut self, from: &str) -> Result<i32> {
        let args = FindDestinationsArgs {
            from: from.to_owned(),
        };
        self.send_call(FIND_DESTINATIONS, &args)
    }

    pub fn recv_find_destinations(&mut self, seq_id: i32) -> Result<Vec<String>> {
        Ok(self
            .recv_reply::<StringListResult>(FIND_DESTINATIONS, seq_id)?
            .values)
    }

    // -----------------------------------------------------------------------
    // monitorSeats (decoupled)
    // -----------------------------------------------------------------------

    /// Register interest in seat updates for `id` over `duration_ms`.
    pub fn send_monitor_seats(&mut self, id: &str, duration_ms: i32) -> Result<i32> {
        let args = MonitorSeatsArgs {
            id: id.to_owned(),
            duration_ms,
        };
        let seq_id = self.send_call(MONITOR_SEATS, &args)?;
        self.monitor_seq_id = Some(seq_id);
        Ok(seq_id)
    }

    /// Block (with no timeout) for the next seat-count push.
    ///
    /// Listen mode is switched on for exactly this receive and switched off
    /// again afterwards, whatever the outcome.  Does not resend the request.
    pub fn recv_monitor_seats(&mut self) -> Result<i32> {
        let seq_id = self.monitor_seq_id.ok_or(ProtocolError::NoMonitorCall)?;

        self.proto.transport_mut().set_listen(true)?;
        let result = self
            .recv_reply::<MonitorSeatsResult>(MONITOR_SEATS, seq_id)
            .and_then(MonitorSeatsResult::into_seats);
        if let Err(e) = self.proto.transport_mut().set_listen(false) {
            log::warn!("[rpc] failed to leave listen mode: {e}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use crate::types::TType;

    /// Build the bytes of one reply message.
    fn reply_bytes<V: WireEncode>(kind: MessageType, seq_id: i32, body: &V) -> Vec<u8> {
        let mut p = BinaryProtocol::new(MemoryTransport::new());
        p.write_message_begin("ignored", kind, seq_id).unwrap();
        body.encode(&mut p).unwrap();
        p.into_inner().into_bytes()
    }

    #[test]
    fn seq_ids_start_at_zero_and_increase() {
        let mut client = FlightClient::new(MemoryTransport::new());
        assert_eq!(client.send_get_flight("A").unwrap(), 0);
        assert_eq!(client.send_reserve("A", 1).unwrap(), 1);
        assert_eq!(client.send_find_destinations("A").unwrap(), 2);
        assert_eq!(client.next_seq_id(), 3);
    }

    #[test]
    fn call_encodes_header_then_args() {
        let mut client = FlightClient::new(MemoryTransport::new());
        client.send_find_flights("A", "B").unwrap();

        let mut server = BinaryProtocol::new(client.into_transport());
        let header = server.read_message_begin().unwrap();
        assert_eq!(header.name, "findFlights");
        assert_eq!(header.kind, MessageType::Call);
        assert_eq!(header.seq_id, 0);
        let args = FindFlightsArgs::decode(&mut server).unwrap();
        assert_eq!((args.from.as_str(), args.to.as_str()), ("A", "B"));
    }

    #[test]
    fn exception_reply_becomes_application_error() {
        let bytes = reply_bytes(
            MessageType::Exception,
            0,
            &ApplicationException::new("flight doesn't have enough available seats"),
        );
        let mut client = FlightClient::new(MemoryTransport::from(bytes));
        let err = client.recv_reserve(0).unwrap_err();
        match err {
            Error::Application(e) => {
                assert_eq!(e.message, "flight doesn't have enough available seats")
            }
            other => panic!("expected application error, got {other:?}"),
        }
    }

    #[test]
    fn stale_reply_is_discarded() {
        // A memory buffer holds one "datagram"; discarding the stale reply
        // exhausts it, so the receive ends with EndOfFile rather than
        // accepting the wrong answer.
        let bytes = reply_bytes(MessageType::Reply, 4, &Ack);
        let mut client = FlightClient::new(MemoryTransport::from(bytes));
        let err = client.recv_reserve(5).unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn call_in_reply_position_is_protocol_fault() {
        let bytes = reply_bytes(MessageType::Call, 0, &Ack);
        let mut client = FlightClient::new(MemoryTransport::from(bytes));
        let err = client.recv_reserve(0).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnexpectedCall(_))
        ));
    }

    #[test]
    fn void_reply_consumes_stop() {
        let mut bytes = reply_bytes(MessageType::Reply, 0, &Ack);
        bytes.push(TType::I32.to_u8());
        let mut client = FlightClient::new(MemoryTransport::from(bytes));
        client.recv_new_flight(0).unwrap();
        assert_eq!(client.transport().remaining(), &[TType::I32.to_u8()]);
    }

    #[test]
    fn monitor_receive_requires_monitor_call() {
        let bytes = reply_bytes(MessageType::Reply, 0, &MonitorSeatsResult { seats: Some(3) });
        let mut client = FlightClient::new(MemoryTransport::from(bytes));
        client.send_reserve("SQ1", 1).unwrap();
        let err = client.recv_monitor_seats().unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::NoMonitorCall)));
    }

    /// Refuses to leave listen mode; everything else is in-memory.
    struct StuckListener {
        inner: MemoryTransport,
        listening: bool,
    }

    impl Transport for StuckListener {
        fn is_open(&self) -> bool {
            true
        }

        fn open(&mut self) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) {}

        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.inner.read(buf)
        }

        fn write(&mut self, buf: &[u8]) -> Result<()> {
            self.inner.write(buf)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn set_listen(&mut self, listen: bool) -> Result<()> {
            if self.listening && !listen {
                return Err(crate::error::TransportError::NotOpen.into());
            }
            self.listening = listen;
            Ok(())
        }
    }

    #[test]
    fn failed_listen_restore_keeps_decoded_push() {
        let bytes = reply_bytes(MessageType::Reply, 7, &MonitorSeatsResult { seats: Some(12) });
        let mut client = FlightClient::new(StuckListener {
            inner: MemoryTransport::from(bytes),
            listening: false,
        });
        client.monitor_seq_id = Some(7);
        assert_eq!(client.recv_monitor_seats().unwrap(), 12);
        assert!(client.transport().listening);
    }

    #[test]
    fn monitor_pushes_decode_in_sequence() {
        let mut bytes = Vec::new();
        for seats in [10, 9, 8] {
            bytes.extend(reply_bytes(
                MessageType::Reply,
                0,
                &MonitorSeatsResult { seats: Some(seats) },
            ));
        }
        let mut client = FlightClient::new(MemoryTransport::from(bytes));
        client.monitor_seq_id = Some(0);
        assert_eq!(client.recv_monitor_seats().unwrap(), 10);
        assert_eq!(client.recv_monitor_seats().unwrap(), 9);
        assert_eq!(client.recv_monitor_seats().unwrap(), 8);
    }
}
