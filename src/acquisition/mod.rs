//! Serial acquisition subsystem - talks to the sensor MCU.
//!
//! The MCU understands three ASCII commands, written as raw bytes with no
//! terminator:
//!
//! 1. `init_start` - run the baseline sweep, answer with a 7-line block.
//! 2. `start` - arm the post-hold sweep; the 7-line block follows once the
//!    hold period is over, without a further command.
//! 3. `temp` - answer with one `temperature[&humidity]` line.
//!
//! A sweep block is six comma-separated data lines (phase/magnitude for
//! three channel pairs) followed by one `temperature&humidity` line.
//!
//! Reads are cooperative: [`AcquisitionChannel::try_read_block`] never
//! blocks, it drains whatever the transport already buffered and hands out
//! a block only once every line of it is complete.

pub mod line_reader;
pub mod parse;
#[cfg(feature = "device")]
pub mod port;

pub use line_reader::LineReader;
pub use parse::{parse_ambient, parse_channel, sanitize_line, Ambient, SweepCapture};

use crate::error::Error;
use core::fmt;
use std::io;
use tracing::{debug, info};

/// Data lines in a sweep block.
pub const SWEEP_CHANNELS: usize = 6;

/// Lines in a full sweep block (six data lines + ambient line).
pub const SWEEP_BLOCK_LINES: usize = SWEEP_CHANNELS + 1;

/// One of the six sweep data lines, in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Phase1,
    Magnitude1,
    Phase2,
    Magnitude2,
    Phase3,
    Magnitude3,
}

impl Channel {
    /// All channels in wire (and CSV column) order.
    pub const ALL: [Channel; SWEEP_CHANNELS] = [
        Channel::Phase1,
        Channel::Magnitude1,
        Channel::Phase2,
        Channel::Magnitude2,
        Channel::Phase3,
        Channel::Magnitude3,
    ];

    /// Position of this channel in the sweep block.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Phase1 => "phase1",
            Channel::Magnitude1 => "magnitude1",
            Channel::Phase2 => "phase2",
            Channel::Magnitude2 => "magnitude2",
            Channel::Phase3 => "phase3",
            Channel::Magnitude3 => "magnitude3",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Commands understood by the sensor MCU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the baseline sweep.
    InitStart,
    /// Start the hold period; the post-hold sweep follows on its own.
    Start,
    /// Read ambient temperature and humidity.
    Temp,
}

impl Command {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Command::InitStart => b"init_start",
            Command::Start => b"start",
            Command::Temp => b"temp",
        }
    }
}

/// Response shapes the screen state machine waits for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    /// Answer to `init_start`.
    InitialSweep,
    /// Sweep sent after the hold countdown.
    PostHoldSweep,
    /// Answer to `temp`.
    Temperature,
}

impl Protocol {
    /// Number of lines in a complete response.
    pub const fn line_count(self) -> usize {
        match self {
            Protocol::InitialSweep | Protocol::PostHoldSweep => SWEEP_BLOCK_LINES,
            Protocol::Temperature => 1,
        }
    }
}

/// The two sweeps of a measurement cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapturePhase {
    /// Baseline, taken before contact.
    Initial,
    /// Taken after holding the probe in contact.
    Normal,
}

impl CapturePhase {
    pub const fn protocol(self) -> Protocol {
        match self {
            CapturePhase::Initial => Protocol::InitialSweep,
            CapturePhase::Normal => Protocol::PostHoldSweep,
        }
    }
}

/// Byte-level access to the serial link.
///
/// Implementations must never block in [`Transport::read_available`].
pub trait Transport {
    /// Write the whole buffer.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Append already-received bytes to `out` and return how many were added.
    /// Returns `Ok(0)` when nothing is pending.
    fn read_available(&mut self, out: &mut Vec<u8>) -> io::Result<usize>;

    /// Drop everything received but not yet read.
    fn discard_input(&mut self) -> io::Result<()>;
}

/// Exclusive owner of the serial link and its partially received lines.
pub struct AcquisitionChannel<T> {
    transport: T,
    reader: LineReader,
    scratch: Vec<u8>,
}

impl<T: Transport> AcquisitionChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            reader: LineReader::new(),
            scratch: Vec::new(),
        }
    }

    /// Send a command to the MCU.
    pub fn send(&mut self, command: Command) -> Result<(), Error> {
        info!("serial: -> {:?}", command);
        self.transport
            .write_all(command.as_bytes())
            .map_err(Error::Serial)
    }

    /// Return exactly `line_count` lines once they have all arrived.
    ///
    /// `Ok(None)` means the response is still incomplete; call again later.
    /// Lines beyond `line_count` stay buffered for the next call.
    pub fn try_read_block(&mut self, line_count: usize) -> Result<Option<Vec<String>>, Error> {
        self.scratch.clear();
        let received = self
            .transport
            .read_available(&mut self.scratch)
            .map_err(Error::Serial)?;
        if received > 0 {
            self.reader.push_bytes(&self.scratch);
            debug!(
                "serial: {} bytes in, {}/{} lines ready",
                received,
                self.reader.complete_lines(),
                line_count
            );
        }
        Ok(self.reader.take_lines(line_count))
    }

    /// Forget any buffered response, both ours and the OS driver's.
    pub fn discard_input(&mut self) -> Result<(), Error> {
        self.reader.clear();
        self.transport.discard_input().map_err(Error::Serial)
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Give the transport back (used on shutdown).
    pub fn into_transport(self) -> T {
        self.transport
    }
}
