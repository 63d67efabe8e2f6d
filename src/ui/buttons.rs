//! GPIO button input with per-line debouncing.
//!
//! Four physical buttons (active-low with pull-up):
//!   - OK    - confirm the focused control
//!   - DOWN  - move menu focus
//!   - LEFT  - focus BACK on result screens
//!   - RIGHT - wired, currently unbound
//!
//! The lines are sampled on a fixed short period. A press is the
//! idle→pressed edge, and it is accepted only if the same button's previous
//! accepted press is at least its debounce threshold old. Releases are
//! not reported.

use super::{ButtonEvent, ButtonId};
use embedded_hal::digital::InputPin;
use heapless::Vec;
use tracing::{info, trace};

#[derive(Clone, Copy, Debug, Default)]
struct LineState {
    /// Last sampled level was "pressed" (low).
    pressed: bool,
    last_accepted_ms: Option<u64>,
}

/// Edge detection and debounce bookkeeping for the four lines.
///
/// State is kept per button regardless of which screen is active, so a
/// press swallowed by one screen still counts for debouncing on the next.
#[derive(Clone, Debug, Default)]
pub struct Debouncer {
    lines: [LineState; 4],
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            lines: [LineState {
                pressed: false,
                last_accepted_ms: None,
            }; 4],
        }
    }

    /// Feed one sample of `button`.
    ///
    /// `pressed` is `None` when the line could not be read; the level is
    /// then taken as unchanged. Returns `true` for an accepted press.
    pub fn update(&mut self, button: ButtonId, pressed: Option<bool>, now_ms: u64) -> bool {
        let line = &mut self.lines[button.index()];
        let Some(pressed) = pressed else {
            return false;
        };

        let falling_edge = pressed && !line.pressed;
        line.pressed = pressed;
        if !falling_edge {
            return false;
        }

        let settled = line
            .last_accepted_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= button.debounce_ms());
        if settled {
            line.last_accepted_ms = Some(now_ms);
        } else {
            trace!("Button: {} bounce ignored", button.name());
        }
        settled
    }
}

/// The four button lines plus their debouncer.
pub struct ButtonPad<P> {
    /// Indexed by [`ButtonId::index`].
    pins: [P; 4],
    debouncer: Debouncer,
}

impl<P: InputPin> ButtonPad<P> {
    /// `pins` must be in [`ButtonId::ALL`] order: OK, DOWN, LEFT, RIGHT.
    pub fn new(pins: [P; 4]) -> Self {
        Self {
            pins,
            debouncer: Debouncer::new(),
        }
    }

    /// Sample every line once and return the accepted presses.
    ///
    /// A failed read never aborts the poll; that line just keeps its
    /// previous level for this tick.
    pub fn poll(&mut self, now_ms: u64) -> Vec<ButtonEvent, 4> {
        let mut events = Vec::new();
        for button in ButtonId::ALL {
            let pressed = match self.pins[button.index()].is_low() {
                Ok(low) => Some(low),
                Err(_) => {
                    trace!("Button: {} read failed", button.name());
                    None
                }
            };
            if self.debouncer.update(button, pressed, now_ms) {
                info!("Button: {}", button.name());
                // At most one event per button per poll, so this never overflows.
                let _ = events.push(ButtonEvent {
                    button,
                    at_ms: now_ms,
                });
            }
        }
        events
    }

    /// Hand the lines back (used on shutdown).
    pub fn into_pins(self) -> [P; 4] {
        self.pins
    }
}
