//! Line-oriented command shell over a [`FlightClient`].
//!
//! Each input line is split on whitespace and parsed with `clap`, so every
//! command gets argument checking and `--help` for free.  Application faults
//! are printed and the shell carries on; so are transport and framing
//! faults, which abort only the command that hit them.

use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use crate::client::FlightClient;
use crate::error::Error;
use crate::flight::Flight;
use crate::transport::Transport;

pub const PROMPT: &str = "(flight) ";
pub const INTRO: &str = "Welcome to the flight info shell. Type help to list commands.";

#[derive(Parser, Debug, PartialEq)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

/// One shell command.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Get flight by id.
    Get { id: String },
    /// Reserve seats on a flight.
    Reserve { id: String, seats: i32 },
    /// Watch the seat count of a flight for a while.
    #[command(alias = "monitor_seats")]
    MonitorSeats { id: String, duration_ms: i32 },
    /// Create a new flight entry.
    New {
        id: String,
        from: String,
        to: String,
        time: String,
        seats: i32,
        fare: f32,
    },
    /// Find flight ids between two places.
    #[command(alias = "find_flights")]
    FindFlights { from: String, to: String },
    /// List destinations reachable from a place.
    #[command(alias = "find_destinations")]
    FindDestinations { from: String },
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
}

impl Command {
    /// Parse one input line.  `Ok(None)` for a blank line; `Err` carries
    /// clap's rendered usage or help text.
    pub fn parse_line(line: &str) -> Result<Option<Self>, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(None);
        }
        Line::try_parse_from(words)
            .map(|l| Some(l.command))
            .map_err(|e| e.render().to_string())
    }
}

/// Interactive shell driving one client.
pub struct Shell<T, W> {
    client: FlightClient<T>,
    out: W,
}

impl<T: Transport, W: Write> Shell<T, W> {
    pub fn new(client: FlightClient<T>, out: W) -> Self {
        Self { client, out }
    }

    pub fn into_parts(self) -> (FlightClient<T>, W) {
        (self.client, self.out)
    }

    /// Read commands until EOF or `quit`.
    pub fn run<R: BufRead>(&mut self, input: R) -> std::io::Result<()> {
        writeln!(self.out, "{INTRO}")?;
        write!(self.out, "{PROMPT}")?;
        self.out.flush()?;

        for line in input.lines() {
            let line = line?;
            match Command::parse_line(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(cmd)) => self.execute(cmd)?,
                Err(usage) => write!(self.out, "{usage}")?,
            }
            write!(self.out, "{PROMPT}")?;
            self.out.flush()?;
        }
        writeln!(self.out)
    }

    /// Run one command, printing its outcome.
    pub fn execute(&mut self, cmd: Command) -> std::io::Result<()> {
        match cmd {
            Command::Get { id } => match self.client.get_flight(&id) {
                Ok(flight) => self.print_flight(&flight),
                Err(e) => self.report(e),
            },
            Command::Reserve { id, seats } => {
                let outcome = self.client.reserve(&id, seats);
                self.ok_or_report(outcome)
            }
            Command::MonitorSeats { id, duration_ms } => self.monitor(&id, duration_ms),
            Command::New {
                id,
                from,
                to,
                time,
                seats,
                fare,
            } => {
                let flight = Flight {
                    id,
                    from,
                    to,
                    time,
                    available_seats: seats,
                    fare,
                };
                let outcome = self.client.new_flight(&flight);
                self.ok_or_report(outcome)
            }
            Command::FindFlights { from, to } => match self.client.find_flights(&from, &to) {
                Ok(ids) => self.print_lines(&ids),
                Err(e) => self.report(e),
            },
            Command::FindDestinations { from } => match self.client.find_destinations(&from) {
                Ok(places) => self.print_lines(&places),
                Err(e) => self.report(e),
            },
            Command::Quit => Ok(()),
        }
    }

    /// Send the monitor call once, then print pushes until the deadline.
    fn monitor(&mut self, id: &str, duration_ms: i32) -> std::io::Result<()> {
        if let Err(e) = self.client.send_monitor_seats(id, duration_ms) {
            return self.report(e);
        }

        let deadline = Instant::now() + Duration::from_millis(duration_ms.max(0) as u64);
        while Instant::now() < deadline {
            match self.client.recv_monitor_seats() {
                Ok(seats) => writeln!(self.out, "available seats: {seats}")?,
                Err(Error::Application(e)) => writeln!(self.out, "{e}")?,
                Err(e) => return self.report(e),
            }
        }
        Ok(())
    }

    fn print_flight(&mut self, flight: &Flight) -> std::io::Result<()> {
        writeln!(self.out, "flight id: {}", flight.id)?;
        writeln!(self.out, "from: {}", flight.from)?;
        writeln!(self.out, "to: {}", flight.to)?;
        writeln!(self.out, "time: {}", flight.time)?;
        writeln!(self.out, "num available seats: {}", flight.available_seats)?;
        writeln!(self.out, "ticket fare: {}", flight.fare)
    }

    fn print_lines(&mut self, lines: &[String]) -> std::io::Result<()> {
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn ok_or_report(&mut self, outcome: Result<(), Error>) -> std::io::Result<()> {
        match outcome {
            Ok(()) => writeln!(self.out, "ok"),
            Err(e) => self.report(e),
        }
    }

    fn report(&mut self, e: Error) -> std::io::Result<()> {
        match e {
            Error::Application(e) => writeln!(self.out, "{e}"),
            other => {
                log::error!("[shell] {other}");
                writeln!(self.out, "error: {other}")
            }
        }
    }
}
