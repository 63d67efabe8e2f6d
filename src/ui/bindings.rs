//! Button → action table for the current screen.
//!
//! A binding is built from the screen it belongs to and replaced as a
//! whole on every transition, so a press can never reach an action of a
//! screen that is gone.

use super::{ButtonId, Screen};

/// What a bound button asks the state machine to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Move menu focus to the next entry.
    FocusNext,
    /// Activate the focused control.
    Confirm,
    /// Move focus to the BACK control.
    FocusBack,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandlerBinding {
    slots: [Option<Action>; 4],
}

impl HandlerBinding {
    /// No button does anything.
    pub const fn empty() -> Self {
        Self { slots: [None; 4] }
    }

    pub fn with(mut self, button: ButtonId, action: Action) -> Self {
        self.slots[button.index()] = Some(action);
        self
    }

    pub fn action_for(&self, button: ButtonId) -> Option<Action> {
        self.slots[button.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// The binding set a screen installs when it becomes current.
    pub fn for_screen(screen: &Screen) -> Self {
        match screen {
            Screen::Home { .. } => Self::empty()
                .with(ButtonId::Down, Action::FocusNext)
                .with(ButtonId::Ok, Action::Confirm),
            Screen::Examination => Self::empty().with(ButtonId::Ok, Action::Confirm),
            Screen::MeasurementResult { .. }
            | Screen::MeasurementFailed { .. }
            | Screen::TemperatureResult { .. } => Self::empty()
                .with(ButtonId::Left, Action::FocusBack)
                .with(ButtonId::Ok, Action::Confirm),
            Screen::Boot
            | Screen::Blank
            | Screen::Loading { .. }
            | Screen::Countdown { .. }
            | Screen::TemperatureLoading => Self::empty(),
        }
    }
}
