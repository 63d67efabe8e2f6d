//! User interface subsystem - screen state machine + physical buttons.
//!
//! The device loop polls the buttons every few milliseconds, feeds the
//! accepted presses to the [`machine::Controller`], lets it run whatever
//! timers and serial polls are due, and renders the current screen.
//!
//! ## Components
//!
//! - **Buttons**: 4 active-low switches, polled and debounced per line
//! - **Bindings**: which action each button triggers on the current screen
//! - **Scheduler**: epoch-keyed timers that die with the screen that set them
//! - **Machine**: screens, transitions, acquisition and analysis sequencing
//! - **Display**: text content of each screen

pub mod bindings;
pub mod buttons;
pub mod display;
pub mod input_logic;
pub mod machine;
pub mod scheduler;


use crate::acquisition::Ambient;
use crate::analysis::QualityResult;
use crate::config::{
    DOWN_DEBOUNCE_MS, DOWN_GPIO, LEFT_DEBOUNCE_MS, LEFT_GPIO, OK_DEBOUNCE_MS, OK_GPIO,
    RIGHT_DEBOUNCE_MS, RIGHT_GPIO,
};
use crate::error::MalformedCapture;

/// Physical buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Ok,
    Down,
    Left,
    Right,
}

impl ButtonId {
    pub const ALL: [ButtonId; 4] = [ButtonId::Ok, ButtonId::Down, ButtonId::Left, ButtonId::Right];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Minimum spacing between two accepted presses (ms).
    pub const fn debounce_ms(self) -> u64 {
        match self {
            ButtonId::Ok => OK_DEBOUNCE_MS,
            ButtonId::Down => DOWN_DEBOUNCE_MS,
            ButtonId::Left => LEFT_DEBOUNCE_MS,
            ButtonId::Right => RIGHT_DEBOUNCE_MS,
        }
    }

    /// GPIO line offset on the button chip.
    pub const fn gpio_line(self) -> u32 {
        match self {
            ButtonId::Ok => OK_GPIO,
            ButtonId::Down => DOWN_GPIO,
            ButtonId::Left => LEFT_GPIO,
            ButtonId::Right => RIGHT_GPIO,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ButtonId::Ok => "ok",
            ButtonId::Down => "down",
            ButtonId::Left => "left",
            ButtonId::Right => "right",
        }
    }
}

/// A debounced press (releases are not reported).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: ButtonId,
    /// Monotonic time of the press (ms).
    pub at_ms: u64,
}

/// Entries of the home menu, in focus order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HomeItem {
    NewMeasurement,
    Temperature,
    TurnOff,
}

impl HomeItem {
    pub const ALL: [HomeItem; 3] = [HomeItem::NewMeasurement, HomeItem::Temperature, HomeItem::TurnOff];

    pub fn label(self) -> &'static str {
        match self {
            HomeItem::NewMeasurement => "New Measurement",
            HomeItem::Temperature => "Temperature",
            HomeItem::TurnOff => "TURN OFF",
        }
    }

    /// Next entry, wrapping back to the top.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&i| i == self).unwrap_or(0);
        Self::ALL[input_logic::cycle_next(idx, Self::ALL.len())]
    }
}

/// Screens (views) the UI can be in, with the data each one shows.
#[derive(Clone, Debug, PartialEq)]
pub enum Screen {
    /// Splash shown after power-up.
    Boot,
    /// Main menu.
    Home { focus: HomeItem },
    /// "Turning off..." pause before returning home.
    Blank,
    /// Baseline sweep: cosmetic progress bar, then capture.
    Loading {
        progress_permille: u16,
        capturing: bool,
    },
    /// Instructions before the hold.
    Examination,
    /// Hold countdown, then post-hold capture.
    Countdown { remaining: u8, capturing: bool },
    /// Quality score.
    MeasurementResult {
        result: QualityResult,
        back_focused: bool,
    },
    /// A capture could not be analysed.
    MeasurementFailed {
        reason: MalformedCapture,
        back_focused: bool,
    },
    /// Waiting for the `temp` answer.
    TemperatureLoading,
    /// Ambient reading.
    TemperatureResult { ambient: Ambient, back_focused: bool },
}

/// Data-free tag of a [`Screen`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenState {
    Boot,
    Home,
    Blank,
    Loading,
    Examination,
    Countdown,
    MeasurementResult,
    MeasurementFailed,
    TemperatureLoading,
    TemperatureResult,
}

impl Screen {
    pub fn state(&self) -> ScreenState {
        match self {
            Screen::Boot => ScreenState::Boot,
            Screen::Home { .. } => ScreenState::Home,
            Screen::Blank => ScreenState::Blank,
            Screen::Loading { .. } => ScreenState::Loading,
            Screen::Examination => ScreenState::Examination,
            Screen::Countdown { .. } => ScreenState::Countdown,
            Screen::MeasurementResult { .. } => ScreenState::MeasurementResult,
            Screen::MeasurementFailed { .. } => ScreenState::MeasurementFailed,
            Screen::TemperatureLoading => ScreenState::TemperatureLoading,
            Screen::TemperatureResult { .. } => ScreenState::TemperatureResult,
        }
    }

    pub fn home() -> Self {
        Screen::Home {
            focus: HomeItem::NewMeasurement,
        }
    }
}
