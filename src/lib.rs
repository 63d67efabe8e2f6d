//! Library interface for aminic.
//!
//! Everything that can be tested on the host lives here: button
//! debouncing, the sensor serial protocol, sweep analysis, the screen
//! state machine, screen text and CSV persistence. The device binary
//! (`src/main.rs`, feature `device`) only wires these to the GPIO chip
//! and the serial port.
//!
//! Usage: `cargo test` (no hardware required)

// ═══════════════════════════════════════════════════════════════════════════
// Pure logic (host-testable)
// ═══════════════════════════════════════════════════════════════════════════

pub mod acquisition;
pub mod analysis;
pub mod config;
pub mod error;
pub mod storage;
pub mod ui;

// ═══════════════════════════════════════════════════════════════════════════
// Hardware glue (device builds only)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(feature = "device")]
pub mod device;

pub use error::{Error, MalformedCapture};
