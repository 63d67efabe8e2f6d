//! Application-wide constants and compile-time configuration.
//!
//! All hardware line assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place. The device
//! binary can override a few of them from the command line.

// GPIO line assignments (BCM numbering on gpiochip0)
//
// All four buttons are active-low and rely on pull-ups:
//
//   Button OK      → GPIO22
//   Button DOWN    → GPIO17
//   Button LEFT    → GPIO23
//   Button RIGHT   → GPIO27

/// GPIO character device holding the button lines.
pub const GPIO_CHIP: &str = "/dev/gpiochip0";

pub const OK_GPIO: u32 = 22;
pub const DOWN_GPIO: u32 = 17;
pub const LEFT_GPIO: u32 = 23;
pub const RIGHT_GPIO: u32 = 27;

/// Interval between two reads of the button lines (ms).
pub const BUTTON_POLL_MS: u64 = 10;

/// Minimum spacing between two accepted presses (ms).
///
/// Confirm and menu navigation are slower than the directional keys,
/// which are used for repeat navigation.
pub const OK_DEBOUNCE_MS: u64 = 500;
pub const DOWN_DEBOUNCE_MS: u64 = 500;
pub const LEFT_DEBOUNCE_MS: u64 = 300;
pub const RIGHT_DEBOUNCE_MS: u64 = 300;

// Serial link to the sensor MCU

pub const SERIAL_PORT: &str = "/dev/ttyACM0";
pub const SERIAL_BAUD: u32 = 9600;

/// Read/write timeout handed to the OS driver (ms).
pub const SERIAL_TIMEOUT_MS: u64 = 1000;

/// Interval between two readiness checks while a response is awaited (ms).
pub const SERIAL_POLL_MS: u64 = 50;

/// Longest response line we buffer. Sweep lines carry a few hundred
/// samples, so this is generous.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

// Screen timing

/// How long the boot splash stays up (ms).
pub const BOOT_SPLASH_MS: u64 = 5000;

/// How long the "Turning off..." screen stays up before returning home (ms).
pub const BLANK_SCREEN_MS: u64 = 2000;

/// Loading bar tick period (ms) and increment per tick (permille, 2.5 %).
pub const PROGRESS_TICK_MS: u64 = 1000;
pub const PROGRESS_STEP_PERMILLE: u16 = 25;
pub const PROGRESS_FULL_PERMILLE: u16 = 1000;

/// Hold countdown start value (s) and tick period (ms).
pub const COUNTDOWN_START: u8 = 45;
pub const COUNTDOWN_TICK_MS: u64 = 1000;

// Signal analysis

/// Savitzky-Golay window length (samples, odd).
pub const SMOOTHING_WINDOW: usize = 31;

/// Savitzky-Golay polynomial order.
pub const SMOOTHING_ORDER: usize = 3;

// Capture artifacts

/// Directory receiving the per-capture CSV files.
pub const DATA_DIR: &str = "/home/raspi/internship";

/// Suffix shared by both capture files (`init_…`, `normal_…`).
pub const CAPTURE_FILE_SUFFIX: &str = "phaseAndMagnitudeData.csv";

/// Timer periods used by the screen state machine.
///
/// Defaults come from the constants above; tests and the command line
/// can shorten them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub boot_splash_ms: u64,
    pub blank_screen_ms: u64,
    pub progress_tick_ms: u64,
    pub progress_step_permille: u16,
    pub countdown_start: u8,
    pub countdown_tick_ms: u64,
    pub serial_poll_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            boot_splash_ms: BOOT_SPLASH_MS,
            blank_screen_ms: BLANK_SCREEN_MS,
            progress_tick_ms: PROGRESS_TICK_MS,
            progress_step_permille: PROGRESS_STEP_PERMILLE,
            countdown_start: COUNTDOWN_START,
            countdown_tick_ms: COUNTDOWN_TICK_MS,
            serial_poll_ms: SERIAL_POLL_MS,
        }
    }
}
