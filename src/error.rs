//! Unified error type for aminic.
//!
//! Transport and storage failures carry the underlying `io::Error`.
//! Everything that makes a sweep unanalysable is a [`MalformedCapture`],
//! which the screen state machine turns into the failure screen.

use crate::acquisition::Channel;
use core::fmt;
use std::io;

/// Top-level error type used across the application.
#[derive(Debug)]
pub enum Error {
    /// Writing to or reading from the sensor serial link failed.
    Serial(io::Error),

    /// Writing a capture artifact failed.
    Storage(io::Error),

    /// A sweep response could not be turned into an analysable capture.
    Capture(MalformedCapture),

    /// Smoothing parameters are unusable (even window or order too high).
    InvalidFilter { window: usize, order: usize },
}

/// Reasons a sweep cannot be analysed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MalformedCapture {
    /// The response block did not have the expected number of lines.
    WrongLineCount { expected: usize, found: usize },

    /// A data line was empty.
    EmptyChannel { channel: Channel },

    /// A token was neither a finite number nor a sentinel.
    InvalidToken { channel: Channel, token: String },

    /// A channel's sample count differs from the first channel's.
    LengthMismatch {
        channel: Channel,
        expected: usize,
        found: usize,
    },

    /// Initial and normal captures have different sample counts.
    CaptureSizeMismatch { initial: usize, normal: usize },

    /// Fewer samples than the smoothing window.
    TooShort { samples: usize, window: usize },

    /// The post-hold capture arrived without a baseline.
    MissingBaseline,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Serial(e) => write!(f, "serial link: {e}"),
            Error::Storage(e) => write!(f, "capture storage: {e}"),
            Error::Capture(e) => write!(f, "malformed capture: {e}"),
            Error::InvalidFilter { window, order } => {
                write!(f, "invalid smoothing filter (window {window}, order {order})")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Serial(e) | Error::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for MalformedCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedCapture::WrongLineCount { expected, found } => {
                write!(f, "expected {expected} lines, got {found}")
            }
            MalformedCapture::EmptyChannel { channel } => write!(f, "{channel} is empty"),
            MalformedCapture::InvalidToken { channel, token } => {
                write!(f, "{channel}: bad value {token:?}")
            }
            MalformedCapture::LengthMismatch {
                channel,
                expected,
                found,
            } => write!(f, "{channel} has {found} samples, expected {expected}"),
            MalformedCapture::CaptureSizeMismatch { initial, normal } => {
                write!(f, "initial sweep has {initial} samples, normal has {normal}")
            }
            MalformedCapture::TooShort { samples, window } => {
                write!(f, "{samples} samples is shorter than the {window}-sample window")
            }
            MalformedCapture::MissingBaseline => f.write_str("no initial sweep"),
        }
    }
}

// Convenience conversions

impl From<MalformedCapture> for Error {
    fn from(e: MalformedCapture) -> Self {
        Error::Capture(e)
    }
}
